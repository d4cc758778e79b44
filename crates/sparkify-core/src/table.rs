//! The seven warehouse tables and their column definitions.
//!
//! Column lists are plain data so that every dialect renders DDL from the same
//! source, and the SQLite bulk copy can map JSON records onto staging columns
//! without a second copy of the schema.

use std::fmt;

// ─── Column types ────────────────────────────────────────────────────────────

/// Logical column type. Rendered per dialect by [`crate::sql`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
  Varchar,
  Integer,
  BigInt,
  Float,
  Timestamp,
  /// Auto-incrementing surrogate key.
  Identity,
}

impl ColumnType {
  /// Whether JSON values for this column are read as numbers.
  pub fn is_numeric(self) -> bool {
    matches!(
      self,
      ColumnType::Integer | ColumnType::BigInt | ColumnType::Float | ColumnType::Identity
    )
  }
}

/// A single column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
  pub name:        &'static str,
  pub ty:          ColumnType,
  pub nullable:    bool,
  pub primary_key: bool,
  pub sort_key:    bool,
  pub dist_key:    bool,
  pub references:  Option<(Table, &'static str)>,
}

impl Column {
  const fn new(name: &'static str, ty: ColumnType) -> Self {
    Self {
      name,
      ty,
      nullable: false,
      primary_key: false,
      sort_key: false,
      dist_key: false,
      references: None,
    }
  }

  const fn null(mut self) -> Self {
    self.nullable = true;
    self
  }

  const fn primary(mut self) -> Self {
    self.primary_key = true;
    self
  }

  const fn sort(mut self) -> Self {
    self.sort_key = true;
    self
  }

  const fn dist(mut self) -> Self {
    self.dist_key = true;
    self
  }

  const fn refs(mut self, table: Table, column: &'static str) -> Self {
    self.references = Some((table, column));
    self
  }
}

/// Redshift distribution style for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
  /// Let the engine decide.
  Auto,
  /// Full copy on every node; used for small dimensions.
  All,
  /// Distributed on the column flagged `dist_key`.
  Key,
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Every table the pipeline manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
  StagingEvents,
  StagingSongs,
  Users,
  Songs,
  Artists,
  Time,
  Songplays,
}

use ColumnType::{BigInt, Float, Identity, Integer, Timestamp, Varchar};

const STAGING_EVENTS: &[Column] = &[
  Column::new("artist",        Varchar).null(),
  Column::new("auth",          Varchar).null(),
  Column::new("firstName",     Varchar).null(),
  Column::new("gender",        Varchar).null(),
  Column::new("itemInSession", Integer).null(),
  Column::new("lastName",      Varchar).null(),
  Column::new("length",        Float).null(),
  Column::new("level",         Varchar).null(),
  Column::new("location",      Varchar).null(),
  Column::new("method",        Varchar).null(),
  Column::new("page",          Varchar).null(),
  Column::new("registration",  Float).null(),
  Column::new("sessionId",     Integer),
  Column::new("song",          Varchar).null(),
  Column::new("status",        Integer).null(),
  Column::new("ts",            BigInt),
  Column::new("userAgent",     Varchar).null(),
  Column::new("userId",        Integer).null(),
];

const STAGING_SONGS: &[Column] = &[
  Column::new("song_id",          Varchar),
  Column::new("artist_id",        Varchar),
  Column::new("artist_latitude",  Float).null(),
  Column::new("artist_longitude", Float).null(),
  Column::new("artist_location",  Varchar).null(),
  Column::new("artist_name",      Varchar).null(),
  Column::new("duration",         Float).null(),
  Column::new("num_songs",        Integer).null(),
  Column::new("title",            Varchar).null(),
  Column::new("year",             Integer).null(),
];

const USERS: &[Column] = &[
  Column::new("user_id",    Integer).primary().sort(),
  Column::new("first_name", Varchar).null(),
  Column::new("last_name",  Varchar).null(),
  Column::new("gender",     Varchar).null(),
  Column::new("level",      Varchar).null(),
];

const SONGS: &[Column] = &[
  Column::new("song_id",   Varchar).primary().sort(),
  Column::new("title",     Varchar),
  Column::new("artist_id", Varchar),
  Column::new("year",      Integer),
  Column::new("duration",  Float),
];

const ARTISTS: &[Column] = &[
  Column::new("artist_id", Varchar).primary().sort(),
  Column::new("name",      Varchar).null(),
  Column::new("location",  Varchar).null(),
  Column::new("latitude",  Float).null(),
  Column::new("longitude", Float).null(),
];

const TIME: &[Column] = &[
  Column::new("start_time", Timestamp).primary().sort(),
  Column::new("hour",       Integer).null(),
  Column::new("day",        Integer).null(),
  Column::new("week",       Integer).null(),
  Column::new("month",      Integer).null(),
  Column::new("year",       Integer).null(),
  Column::new("weekday",    Integer).null(),
];

const SONGPLAYS: &[Column] = &[
  Column::new("songplay_id", Identity).primary().sort(),
  Column::new("start_time",  Timestamp).refs(Table::Time, "start_time"),
  Column::new("user_id",     Integer).refs(Table::Users, "user_id"),
  Column::new("level",       Varchar),
  Column::new("song_id",     Varchar).refs(Table::Songs, "song_id"),
  Column::new("artist_id",   Varchar).dist().refs(Table::Artists, "artist_id"),
  Column::new("session_id",  Integer),
  Column::new("location",    Varchar).null(),
  Column::new("user_agent",  Varchar).null(),
];

impl Table {
  /// Creation order: every referenced table precedes the tables that
  /// reference it.
  pub const CREATE_ORDER: [Table; 7] = [
    Table::StagingEvents,
    Table::StagingSongs,
    Table::Users,
    Table::Songs,
    Table::Artists,
    Table::Time,
    Table::Songplays,
  ];

  /// The reverse of [`Table::CREATE_ORDER`].
  pub fn drop_order() -> impl Iterator<Item = Table> {
    Self::CREATE_ORDER.into_iter().rev()
  }

  pub fn name(self) -> &'static str {
    match self {
      Table::StagingEvents => "staging_events",
      Table::StagingSongs  => "staging_songs",
      Table::Users         => "users",
      Table::Songs         => "songs",
      Table::Artists       => "artists",
      Table::Time          => "time",
      Table::Songplays     => "songplays",
    }
  }

  pub fn columns(self) -> &'static [Column] {
    match self {
      Table::StagingEvents => STAGING_EVENTS,
      Table::StagingSongs  => STAGING_SONGS,
      Table::Users         => USERS,
      Table::Songs         => SONGS,
      Table::Artists       => ARTISTS,
      Table::Time          => TIME,
      Table::Songplays     => SONGPLAYS,
    }
  }

  pub fn distribution(self) -> Distribution {
    match self {
      Table::Users | Table::Artists => Distribution::All,
      Table::Songplays => Distribution::Key,
      _ => Distribution::Auto,
    }
  }

  /// Tables this table declares foreign keys to.
  pub fn dependencies(self) -> impl Iterator<Item = Table> {
    self.columns().iter().filter_map(|c| c.references.map(|(t, _)| t))
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dependencies_are_created_first() {
    for (i, table) in Table::CREATE_ORDER.iter().enumerate() {
      for dep in table.dependencies() {
        let pos = Table::CREATE_ORDER.iter().position(|t| *t == dep).unwrap();
        assert!(pos < i, "{dep} must be created before {table}");
      }
    }
  }

  #[test]
  fn drop_order_reverses_create_order() {
    let dropped: Vec<_> = Table::drop_order().collect();
    assert_eq!(dropped.first(), Some(&Table::Songplays));
    assert_eq!(dropped.last(), Some(&Table::StagingEvents));
    assert_eq!(dropped.len(), 7);
  }

  #[test]
  fn staging_mandatory_columns() {
    let required: Vec<_> = Table::StagingEvents
      .columns()
      .iter()
      .filter(|c| !c.nullable)
      .map(|c| c.name)
      .collect();
    assert_eq!(required, ["sessionId", "ts"]);

    let required: Vec<_> = Table::StagingSongs
      .columns()
      .iter()
      .filter(|c| !c.nullable)
      .map(|c| c.name)
      .collect();
    assert_eq!(required, ["song_id", "artist_id"]);
  }

  #[test]
  fn fact_table_references_every_dimension() {
    let deps: Vec<_> = Table::Songplays.dependencies().collect();
    assert_eq!(deps, [Table::Time, Table::Users, Table::Songs, Table::Artists]);
    assert!(Table::Users.dependencies().next().is_none());
  }
}
