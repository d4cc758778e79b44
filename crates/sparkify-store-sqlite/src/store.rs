//! [`SqliteWarehouse`], the SQLite implementation of [`Warehouse`].

use std::path::Path;

use sparkify_core::{
  copy::CopyJob,
  model::{Artist, Song, Songplay, TimeRow, User},
  sql::{Dialect, Statement},
  table::Table,
  warehouse::Warehouse,
};
use tracing::debug;

use crate::{
  Result,
  encode::{RawSongplay, RawTimeRow, encode_cell},
  load::read_rows,
};

/// Connection setup; foreign keys are off by default in SQLite.
const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// A warehouse backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let wh = Self { conn };
    wh.init().await?;
    Ok(wh)
  }

  /// Open an in-memory warehouse.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let wh = Self { conn };
    wh.init().await?;
    Ok(wh)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the underlying connection.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  pub async fn users(&self) -> Result<Vec<User>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, first_name, last_name, gender, level FROM users ORDER BY user_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(User {
              user_id:    row.get(0)?,
              first_name: row.get(1)?,
              last_name:  row.get(2)?,
              gender:     row.get(3)?,
              level:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  pub async fn songs(&self) -> Result<Vec<Song>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT song_id, title, artist_id, year, duration FROM songs ORDER BY song_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Song {
              song_id:   row.get(0)?,
              title:     row.get(1)?,
              artist_id: row.get(2)?,
              year:      row.get(3)?,
              duration:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  pub async fn artists(&self) -> Result<Vec<Artist>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT artist_id, name, location, latitude, longitude FROM artists ORDER BY artist_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(Artist {
              artist_id: row.get(0)?,
              name:      row.get(1)?,
              location:  row.get(2)?,
              latitude:  row.get(3)?,
              longitude: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  pub async fn time_rows(&self) -> Result<Vec<TimeRow>> {
    let raws: Vec<RawTimeRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT start_time, hour, day, week, month, year, weekday
           FROM time ORDER BY start_time",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawTimeRow {
              start_time: row.get(0)?,
              hour:       row.get(1)?,
              day:        row.get(2)?,
              week:       row.get(3)?,
              month:      row.get(4)?,
              year:       row.get(5)?,
              weekday:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTimeRow::into_time_row).collect()
  }

  pub async fn songplays(&self) -> Result<Vec<Songplay>> {
    let raws: Vec<RawSongplay> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT songplay_id, start_time, user_id, level, song_id, artist_id,
                  session_id, location, user_agent
           FROM songplays ORDER BY songplay_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSongplay {
              songplay_id: row.get(0)?,
              start_time:  row.get(1)?,
              user_id:     row.get(2)?,
              level:       row.get(3)?,
              song_id:     row.get(4)?,
              artist_id:   row.get(5)?,
              session_id:  row.get(6)?,
              location:    row.get(7)?,
              user_agent:  row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSongplay::into_songplay).collect()
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = crate::Error;

  fn dialect(&self) -> Dialect {
    Dialect::Sqlite
  }

  async fn execute(&self, statement: &Statement) -> Result<u64> {
    let sql = statement.sql.clone();
    let rows = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, [])?))
      .await?;
    Ok(rows as u64)
  }

  /// Reads the job's files up front on the blocking pool, then inserts every
  /// row in one transaction. A rejected row rolls the whole copy back.
  async fn copy(&self, job: &CopyJob) -> Result<u64> {
    let source = job.clone();
    let rows = tokio::task::spawn_blocking(move || read_rows(&source)).await??;
    debug!(table = %job.table, rows = rows.len(), "read source records");

    let columns: Vec<&str> = job.table.columns().iter().map(|c| c.name).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
      "INSERT INTO {} ({}) VALUES ({})",
      job.table,
      columns.join(", "),
      placeholders.join(", "),
    );

    let loaded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(&sql)?;
          for row in &rows {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_cell)))?;
          }
        }
        tx.commit()?;
        Ok(rows.len() as u64)
      })
      .await?;
    Ok(loaded)
  }

  async fn row_count(&self, table: Table) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(count as u64)
  }
}
