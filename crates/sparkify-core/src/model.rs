//! Row types for the staging, dimension and fact tables.
//!
//! Staging rows double as the JSON shape of the source files: log events use
//! camelCase keys, catalog records use snake_case.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ─── Staging ─────────────────────────────────────────────────────────────────

/// One user-activity log line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagingEvent {
  pub artist:          Option<String>,
  pub auth:            Option<String>,
  pub first_name:      Option<String>,
  pub gender:          Option<String>,
  pub item_in_session: Option<i64>,
  pub last_name:       Option<String>,
  pub length:          Option<f64>,
  pub level:           Option<String>,
  pub location:        Option<String>,
  pub method:          Option<String>,
  pub page:            Option<String>,
  pub registration:    Option<f64>,
  pub session_id:      i64,
  pub song:            Option<String>,
  pub status:          Option<i64>,
  /// Epoch milliseconds.
  pub ts:              i64,
  pub user_agent:      Option<String>,
  pub user_id:         Option<i64>,
}

/// One song-catalog record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagingSong {
  pub song_id:          Option<String>,
  pub artist_id:        Option<String>,
  pub artist_latitude:  Option<f64>,
  pub artist_longitude: Option<f64>,
  pub artist_location:  Option<String>,
  pub artist_name:      Option<String>,
  pub duration:         Option<f64>,
  pub num_songs:        Option<i64>,
  pub title:            Option<String>,
  pub year:             Option<i64>,
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    i64,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub gender:     Option<String>,
  pub level:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
  pub song_id:   String,
  pub title:     String,
  pub artist_id: String,
  pub year:      i64,
  pub duration:  f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
  pub artist_id: String,
  pub name:      Option<String>,
  pub location:  Option<String>,
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

/// A play timestamp decomposed into calendar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRow {
  pub start_time: NaiveDateTime,
  pub hour:       Option<i64>,
  pub day:        Option<i64>,
  pub week:       Option<i64>,
  pub month:      Option<i64>,
  pub year:       Option<i64>,
  /// 0 = Sunday.
  pub weekday:    Option<i64>,
}

// ─── Fact ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Songplay {
  pub songplay_id: i64,
  pub start_time:  NaiveDateTime,
  pub user_id:     i64,
  pub level:       String,
  pub song_id:     String,
  pub artist_id:   String,
  pub session_id:  i64,
  pub location:    Option<String>,
  pub user_agent:  Option<String>,
}
