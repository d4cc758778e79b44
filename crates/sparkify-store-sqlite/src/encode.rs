//! Conversions between core row types and SQLite storage classes.
//!
//! Timestamps are stored as `YYYY-MM-DD HH:MM:SS` text, the format SQLite's
//! `datetime()` produces.

use chrono::NaiveDateTime;
use rusqlite::types::Value;
use sparkify_core::{
  copy::Cell,
  model::{Songplay, TimeRow},
};

use crate::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── Cells ───────────────────────────────────────────────────────────────────

pub fn encode_cell(cell: &Cell) -> Value {
  match cell {
    Cell::Null     => Value::Null,
    Cell::Int(i)   => Value::Integer(*i),
    Cell::Float(f) => Value::Real(*f),
    Cell::Text(s)  => Value::Text(s.clone()),
  }
}

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn decode_timestamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `time` row straight from SQLite, before timestamp parsing.
pub struct RawTimeRow {
  pub start_time: String,
  pub hour:       Option<i64>,
  pub day:        Option<i64>,
  pub week:       Option<i64>,
  pub month:      Option<i64>,
  pub year:       Option<i64>,
  pub weekday:    Option<i64>,
}

impl RawTimeRow {
  pub fn into_time_row(self) -> Result<TimeRow> {
    Ok(TimeRow {
      start_time: decode_timestamp(&self.start_time)?,
      hour:       self.hour,
      day:        self.day,
      week:       self.week,
      month:      self.month,
      year:       self.year,
      weekday:    self.weekday,
    })
  }
}

/// A `songplays` row straight from SQLite, before timestamp parsing.
pub struct RawSongplay {
  pub songplay_id: i64,
  pub start_time:  String,
  pub user_id:     i64,
  pub level:       String,
  pub song_id:     String,
  pub artist_id:   String,
  pub session_id:  i64,
  pub location:    Option<String>,
  pub user_agent:  Option<String>,
}

impl RawSongplay {
  pub fn into_songplay(self) -> Result<Songplay> {
    Ok(Songplay {
      songplay_id: self.songplay_id,
      start_time:  decode_timestamp(&self.start_time)?,
      user_id:     self.user_id,
      level:       self.level,
      song_id:     self.song_id,
      artist_id:   self.artist_id,
      session_id:  self.session_id,
      location:    self.location,
      user_agent:  self.user_agent,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_sqlite_datetime_text() {
    let ts = decode_timestamp("2018-11-01 21:01:46").unwrap();
    assert_eq!(ts.to_string(), "2018-11-01 21:01:46");
    assert!(decode_timestamp("2018-11-01T21:01:46Z").is_err());
  }

  #[test]
  fn cells_map_to_storage_classes() {
    assert_eq!(encode_cell(&Cell::Null), Value::Null);
    assert_eq!(encode_cell(&Cell::Int(7)), Value::Integer(7));
    assert_eq!(encode_cell(&Cell::Text("x".into())), Value::Text("x".into()));
  }
}
