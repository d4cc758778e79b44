//! End-to-end pipeline tests for `SqliteWarehouse` against an in-memory
//! database and JSON fixtures in a temporary directory.

use std::{fs, path::Path};

use sparkify_core::{
  config::{ClusterConfig, Config, IamRoleConfig, StorageConfig},
  model::{StagingEvent, StagingSong},
  pipeline::{EtlOptions, reset_schema, run_etl},
  table::Table,
  warehouse::Warehouse,
};
use tempfile::TempDir;

use crate::{Error, SqliteWarehouse};

async fn warehouse() -> SqliteWarehouse {
  let wh = SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse");
  reset_schema(&wh).await.expect("schema");
  wh
}

/// A source tree with `log_data/` and `song_data/` directories.
struct Fixtures {
  dir: TempDir,
}

impl Fixtures {
  fn new(events: &[StagingEvent], songs: &[StagingSong]) -> Self {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("log_data/2018/11");
    let song_dir = dir.path().join("song_data/A/B");
    fs::create_dir_all(&log_dir).unwrap();
    fs::create_dir_all(&song_dir).unwrap();

    let lines: Vec<String> = events
      .iter()
      .map(|e| serde_json::to_string(e).unwrap())
      .collect();
    fs::write(log_dir.join("2018-11-01-events.json"), lines.join("\n")).unwrap();

    for (i, song) in songs.iter().enumerate() {
      fs::write(
        song_dir.join(format!("TR{i:04}.json")),
        serde_json::to_string(song).unwrap(),
      )
      .unwrap();
    }

    Self { dir }
  }

  fn path(&self, rel: &str) -> String {
    self.dir.path().join(rel).to_string_lossy().into_owned()
  }

  fn config(&self) -> Config {
    Config {
      cluster:  ClusterConfig {
        host:        "localhost".into(),
        db_name:     "dwh".into(),
        db_user:     "dwh".into(),
        db_password: "unused".into(),
        db_port:     5439,
        ssl:         false,
      },
      iam_role: IamRoleConfig { arn: "arn:aws:iam::0:role/local".into() },
      s3:       StorageConfig {
        log_data:      self.path("log_data"),
        log_jsonpath:  None,
        song_data:     self.path("song_data"),
        song_jsonpath: None,
        region:        "us-west-2".into(),
      },
    }
  }
}

fn play(user_id: i64, level: &str, ts: i64) -> StagingEvent {
  StagingEvent {
    artist:          Some("Des'ree".into()),
    auth:            Some("Logged In".into()),
    first_name:      Some("Kaylee".into()),
    gender:          Some("F".into()),
    item_in_session: Some(1),
    last_name:       Some("Summers".into()),
    length:          Some(246.30812),
    level:           Some(level.into()),
    location:        Some("Phoenix-Mesa-Scottsdale, AZ".into()),
    method:          Some("PUT".into()),
    page:            Some("NextSong".into()),
    registration:    Some(1540344794796.0),
    session_id:      139,
    song:            Some("You Gotta Be".into()),
    status:          Some(200),
    ts,
    user_agent:      Some("Mozilla/5.0".into()),
    user_id:         Some(user_id),
  }
}

fn catalog_song() -> StagingSong {
  StagingSong {
    song_id:          Some("SOTNHIP12AB0183131".into()),
    artist_id:        Some("ARD0S291187B9B7BF5".into()),
    artist_latitude:  None,
    artist_longitude: None,
    artist_location:  Some("London, England".into()),
    artist_name:      Some("Des'ree".into()),
    duration:         Some(246.30812),
    num_songs:        Some(1),
    title:            Some("You Gotta Be".into()),
    year:             Some(1994),
  }
}

const TS: i64 = 1541106106796; // 2018-11-01 21:01:46 UTC

async fn count(wh: &SqliteWarehouse, table: Table) -> u64 {
  wh.row_count(table).await.unwrap()
}

// ─── Schema manager ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_schema_twice_succeeds() {
  let wh = warehouse().await;
  let report = reset_schema(&wh).await.unwrap();
  assert_eq!(report.steps.len(), 14);

  for table in Table::CREATE_ORDER {
    assert_eq!(count(&wh, table).await, 0, "{table}");
  }
}

#[tokio::test]
async fn reset_schema_clears_populated_tables() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);
  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();
  assert_eq!(count(&wh, Table::Songplays).await, 1);

  reset_schema(&wh).await.unwrap();
  for table in Table::CREATE_ORDER {
    assert_eq!(count(&wh, table).await, 0, "{table}");
  }
}

// ─── Load and transform ──────────────────────────────────────────────────────

#[tokio::test]
async fn one_play_yields_one_row_per_table() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);

  let report = run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();
  assert_eq!(report.rows("copy staging_events"), Some(1));
  assert_eq!(report.rows("copy staging_songs"), Some(1));
  assert_eq!(report.rows("insert songplays"), Some(1));

  for table in [Table::Songplays, Table::Users, Table::Songs, Table::Artists, Table::Time] {
    assert_eq!(count(&wh, table).await, 1, "{table}");
  }

  let plays = wh.songplays().await.unwrap();
  let sp = &plays[0];
  assert_eq!(sp.user_id, 8);
  assert_eq!(sp.level, "free");
  assert_eq!(sp.song_id, "SOTNHIP12AB0183131");
  assert_eq!(sp.artist_id, "ARD0S291187B9B7BF5");
  assert_eq!(sp.session_id, 139);
  assert_eq!(sp.start_time.to_string(), "2018-11-01 21:01:46");

  let time = &wh.time_rows().await.unwrap()[0];
  assert_eq!(time.start_time, sp.start_time);
  assert_eq!(time.hour, Some(21));
  assert_eq!(time.day, Some(1));
  assert_eq!(time.week, Some(44));
  assert_eq!(time.month, Some(11));
  assert_eq!(time.year, Some(2018));
  assert_eq!(time.weekday, Some(4));

  let artist = &wh.artists().await.unwrap()[0];
  assert_eq!(artist.name.as_deref(), Some("Des'ree"));
  assert_eq!(artist.location.as_deref(), Some("London, England"));

  let song = &wh.songs().await.unwrap()[0];
  assert_eq!(song.year, 1994);
}

#[tokio::test]
async fn song_without_id_never_reaches_songs() {
  let wh = warehouse().await;
  let mut song = catalog_song();
  song.song_id = None;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[song]);

  let err = run_etl(&wh, &fx.config(), EtlOptions::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)), "{err}");

  // The events copy committed; the songs copy rolled back.
  assert_eq!(count(&wh, Table::StagingEvents).await, 1);
  assert_eq!(count(&wh, Table::StagingSongs).await, 0);
  assert_eq!(count(&wh, Table::Songs).await, 0);
}

#[tokio::test]
async fn non_play_event_produces_no_fact() {
  let wh = warehouse().await;
  let mut event = play(8, "free", TS);
  event.page = Some("Home".into());
  let fx = Fixtures::new(&[event], &[catalog_song()]);

  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();

  assert_eq!(count(&wh, Table::Songplays).await, 0);
  assert_eq!(count(&wh, Table::Time).await, 0);
  assert_eq!(count(&wh, Table::Users).await, 0);
  assert_eq!(count(&wh, Table::Songs).await, 1);
  assert_eq!(count(&wh, Table::Artists).await, 1);
}

#[tokio::test]
async fn fact_requires_title_and_duration_match() {
  let wh = warehouse().await;
  let mut other_take = play(8, "free", TS);
  other_take.length = Some(200.0);
  let mut other_song = play(8, "free", TS + 60_000);
  other_song.song = Some("Life".into());
  let fx = Fixtures::new(&[other_take, other_song], &[catalog_song()]);

  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();
  assert_eq!(count(&wh, Table::Songplays).await, 0);
  assert_eq!(count(&wh, Table::Users).await, 1);
}

#[tokio::test]
async fn latest_level_wins_for_a_user() {
  let wh = warehouse().await;
  let fx = Fixtures::new(
    &[play(8, "free", TS), play(8, "paid", TS + 946_000)],
    &[catalog_song()],
  );

  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();

  let users = wh.users().await.unwrap();
  assert_eq!(users.len(), 1);
  assert_eq!(users[0].level.as_deref(), Some("paid"));
  assert_eq!(count(&wh, Table::Songplays).await, 2);
  assert_eq!(count(&wh, Table::Time).await, 2);
}

#[tokio::test]
async fn week_is_the_iso_week() {
  let wh = warehouse().await;
  let fx = Fixtures::new(
    &[
      play(8, "free", 1546257600000), // Mon 2018-12-31, week 1 of 2019
      play(8, "free", 1560340800000), // Wed 2019-06-12, year starts on a Tuesday
      play(8, "free", 1609502400000), // Fri 2021-01-01, week 53 of 2020
    ],
    &[catalog_song()],
  );

  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();

  let weeks: Vec<_> = wh
    .time_rows()
    .await
    .unwrap()
    .iter()
    .map(|t| (t.start_time.to_string(), t.week))
    .collect();
  assert_eq!(
    weeks,
    [
      ("2018-12-31 12:00:00".to_owned(), Some(1)),
      ("2019-06-12 12:00:00".to_owned(), Some(24)),
      ("2021-01-01 12:00:00".to_owned(), Some(53)),
    ]
  );
}

#[tokio::test]
async fn logged_out_events_are_staged_but_not_played() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[], &[catalog_song()]);
  fs::write(
    Path::new(&fx.path("log_data/2018/11")).join("2018-11-02-events.json"),
    r#"{"artist":"Des'ree","auth":"Logged Out","length":246.30812,"page":"NextSong","sessionId":7,"song":"You Gotta Be","ts":1541106106796,"userId":""}"#,
  )
  .unwrap();

  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();
  assert_eq!(count(&wh, Table::StagingEvents).await, 1);
  assert_eq!(count(&wh, Table::Users).await, 0);
  assert_eq!(count(&wh, Table::Songplays).await, 0);
}

#[tokio::test]
async fn jsonpaths_manifest_maps_columns_by_position() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[], &[catalog_song()]);

  let keys = [
    "artist", "auth", "firstName", "gender", "itemInSession", "lastName", "length",
    "level", "location", "method", "page", "registration", "sessionId", "song",
    "status", "ts", "userAgent", "userId",
  ];
  let paths: Vec<String> = keys
    .iter()
    .map(|k| match *k {
      "song" => "$.track.title".to_owned(),
      other => format!("$['{other}']"),
    })
    .collect();
  let manifest = fx.path("log_json_path.json");
  fs::write(&manifest, serde_json::json!({ "jsonpaths": paths }).to_string()).unwrap();
  fs::write(
    Path::new(&fx.path("log_data/2018/11")).join("2018-11-01-events.json"),
    r#"{"artist":"Des'ree","firstName":"Kaylee","length":246.30812,"level":"free","page":"NextSong","sessionId":139,"track":{"title":"You Gotta Be"},"ts":1541106106796,"userId":"8"}"#,
  )
  .unwrap();

  let mut config = fx.config();
  config.s3.log_jsonpath = Some(manifest);
  run_etl(&wh, &config, EtlOptions::default()).await.unwrap();

  assert_eq!(count(&wh, Table::Songplays).await, 1);
  let users = wh.users().await.unwrap();
  assert_eq!(users[0].user_id, 8);
  assert_eq!(users[0].first_name.as_deref(), Some("Kaylee"));
}

#[tokio::test]
async fn object_store_sources_are_rejected() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);
  let mut config = fx.config();
  config.s3.log_data = "s3://udacity-dend/log_data".into();

  let err = run_etl(&wh, &config, EtlOptions::default()).await.unwrap_err();
  assert!(matches!(err, Error::UnsupportedSource(_)));
}

#[tokio::test]
async fn unreadable_manifest_fails_the_copy() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);
  let mut config = fx.config();
  config.s3.log_jsonpath = Some(fx.path("missing_json_path.json"));

  let err = run_etl(&wh, &config, EtlOptions::default()).await.unwrap_err();
  assert!(matches!(&err, Error::Io { path, .. } if path.ends_with("missing_json_path.json")), "{err}");
  assert_eq!(count(&wh, Table::StagingEvents).await, 0);
}

// ─── Re-running ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn rerunning_transform_violates_primary_keys() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);
  run_etl(&wh, &fx.config(), EtlOptions::default()).await.unwrap();

  let err = run_etl(&wh, &fx.config(), EtlOptions { skip_load: true })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Database(_)));
  assert!(err.to_string().contains("UNIQUE constraint failed"), "{err}");

  // Nothing past the failing users insert ran.
  assert_eq!(count(&wh, Table::Users).await, 1);
  assert_eq!(count(&wh, Table::Songplays).await, 1);
}

#[tokio::test]
async fn transform_only_uses_existing_staging_rows() {
  let wh = warehouse().await;
  let fx = Fixtures::new(&[play(8, "free", TS)], &[catalog_song()]);
  run_etl(&wh, &fx.config(), EtlOptions { skip_load: true }).await.unwrap();

  for table in Table::CREATE_ORDER {
    assert_eq!(count(&wh, table).await, 0, "{table}");
  }
}
