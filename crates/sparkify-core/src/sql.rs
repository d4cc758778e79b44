//! SQL text for the schema manager and the transformer.
//!
//! All statements are built from [`Table`] definitions and rendered for a
//! [`Dialect`]. Nothing here touches a connection.

use std::fmt::Write as _;

use crate::table::{Column, ColumnType, Distribution, Table};

// ─── Dialect ─────────────────────────────────────────────────────────────────

/// The SQL flavour a warehouse speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
  Redshift,
  Sqlite,
}

impl Dialect {
  fn column_type(self, ty: ColumnType) -> &'static str {
    match (self, ty) {
      (Dialect::Redshift, ColumnType::Varchar)   => "VARCHAR",
      (Dialect::Redshift, ColumnType::Integer)   => "INTEGER",
      (Dialect::Redshift, ColumnType::BigInt)    => "BIGINT",
      (Dialect::Redshift, ColumnType::Float)     => "FLOAT",
      (Dialect::Redshift, ColumnType::Timestamp) => "TIMESTAMP",
      (Dialect::Redshift, ColumnType::Identity)  => "INTEGER IDENTITY(0,1)",
      (Dialect::Sqlite, ColumnType::Varchar | ColumnType::Timestamp) => "TEXT",
      (Dialect::Sqlite, ColumnType::Integer | ColumnType::BigInt) => "INTEGER",
      (Dialect::Sqlite, ColumnType::Float)       => "REAL",
      (Dialect::Sqlite, ColumnType::Identity)    => "INTEGER PRIMARY KEY AUTOINCREMENT",
    }
  }

  /// Wall-clock timestamp `ms / 1000` seconds after the Unix epoch.
  fn epoch_millis(self, column: &str) -> String {
    match self {
      Dialect::Redshift => format!("TIMESTAMP 'epoch' + {column}/1000 * INTERVAL '1 second'"),
      Dialect::Sqlite   => format!("datetime({column} / 1000, 'unixepoch')"),
    }
  }

  /// Integer calendar field of a timestamp expression.
  fn extract(self, field: TimeField, expr: &str) -> String {
    match self {
      Dialect::Redshift => format!("EXTRACT({} FROM {expr})", field.redshift()),
      Dialect::Sqlite   => match field.strftime() {
        Some(spec) => format!("CAST(strftime('{spec}', {expr}) AS INTEGER)"),
        // ISO week: day of year of the Thursday in the same Monday-based week.
        None => format!(
          "(CAST(strftime('%j', date({expr}, '-3 days', 'weekday 4')) AS INTEGER) - 1) / 7 + 1"
        ),
      },
    }
  }
}

#[derive(Debug, Clone, Copy)]
enum TimeField {
  Hour,
  Day,
  Week,
  Month,
  Year,
  Weekday,
}

impl TimeField {
  const ALL: [TimeField; 6] = [
    TimeField::Hour,
    TimeField::Day,
    TimeField::Week,
    TimeField::Month,
    TimeField::Year,
    TimeField::Weekday,
  ];

  fn column(self) -> &'static str {
    match self {
      TimeField::Hour    => "hour",
      TimeField::Day     => "day",
      TimeField::Week    => "week",
      TimeField::Month   => "month",
      TimeField::Year    => "year",
      TimeField::Weekday => "weekday",
    }
  }

  fn redshift(self) -> &'static str {
    self.column()
  }

  /// SQLite `strftime` format, if one yields the field directly. The bundled
  /// SQLite has no ISO week specifier.
  fn strftime(self) -> Option<&'static str> {
    match self {
      TimeField::Hour    => Some("%H"),
      TimeField::Day     => Some("%d"),
      TimeField::Week    => None,
      TimeField::Month   => Some("%m"),
      TimeField::Year    => Some("%Y"),
      TimeField::Weekday => Some("%w"),
    }
  }
}

// ─── Statement ───────────────────────────────────────────────────────────────

/// One SQL statement plus a short label used in progress logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
  pub label: String,
  pub sql:   String,
}

impl Statement {
  pub fn new(label: impl Into<String>, sql: impl Into<String>) -> Self {
    Self { label: label.into(), sql: sql.into() }
  }
}

/// Quote `value` as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
  format!("'{}'", value.replace('\'', "''"))
}

// ─── Schema manager ──────────────────────────────────────────────────────────

pub fn drop_table(table: Table) -> Statement {
  Statement::new(
    format!("drop table {table}"),
    format!("DROP TABLE IF EXISTS {table}"),
  )
}

/// `DROP TABLE IF EXISTS` for every table, fact table first.
pub fn drop_statements() -> Vec<Statement> {
  Table::drop_order().map(drop_table).collect()
}

pub fn create_table(table: Table, dialect: Dialect) -> Statement {
  let columns = table.columns();
  let width = columns.iter().map(|c| c.name.len()).max().unwrap_or(0);

  let mut lines: Vec<String> = columns
    .iter()
    .map(|c| column_definition(c, width, dialect))
    .collect();

  let keys: Vec<&str> = columns
    .iter()
    .filter(|c| c.primary_key && !(dialect == Dialect::Sqlite && c.ty == ColumnType::Identity))
    .map(|c| c.name)
    .collect();
  if !keys.is_empty() {
    lines.push(format!("PRIMARY KEY ({})", keys.join(", ")));
  }

  let mut sql = format!("CREATE TABLE IF NOT EXISTS {table}\n(\n    {}\n)", lines.join(",\n    "));
  if dialect == Dialect::Redshift {
    match table.distribution() {
      Distribution::All  => sql.push_str("\nDISTSTYLE ALL"),
      Distribution::Key  => sql.push_str("\nDISTSTYLE KEY"),
      Distribution::Auto => {}
    }
  }

  Statement::new(format!("create table {table}"), sql)
}

fn column_definition(column: &Column, width: usize, dialect: Dialect) -> String {
  let mut def = format!("{:<width$}  {}", column.name, dialect.column_type(column.ty));

  if !(dialect == Dialect::Sqlite && column.ty == ColumnType::Identity) {
    def.push_str(if column.nullable { " NULL" } else { " NOT NULL" });
  }
  if dialect == Dialect::Redshift {
    if column.sort_key {
      def.push_str(" SORTKEY");
    }
    if column.dist_key {
      def.push_str(" DISTKEY");
    }
  }
  if let Some((table, target)) = column.references {
    let _ = write!(def, " REFERENCES {table}({target})");
  }
  def
}

/// `CREATE TABLE IF NOT EXISTS` for every table in dependency order.
pub fn create_statements(dialect: Dialect) -> Vec<Statement> {
  Table::CREATE_ORDER
    .into_iter()
    .map(|t| create_table(t, dialect))
    .collect()
}

// ─── Transformer ─────────────────────────────────────────────────────────────

/// Users seen on `NextSong` events. A user appears once; the row from their
/// most recent event wins, so a subscription level change keeps the latest.
fn user_insert() -> Statement {
  Statement::new(
    "insert users",
    "INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT ste.userId    AS user_id,
           ste.firstName AS first_name,
           ste.lastName  AS last_name,
           ste.gender    AS gender,
           ste.level     AS level,
           ROW_NUMBER() OVER (PARTITION BY ste.userId ORDER BY ste.ts DESC) AS seen
    FROM staging_events ste
    WHERE ste.page = 'NextSong'
      AND ste.userId IS NOT NULL
) latest
WHERE seen = 1",
  )
}

fn song_insert() -> Statement {
  Statement::new(
    "insert songs",
    "INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT DISTINCT sts.song_id   AS song_id,
                sts.title     AS title,
                sts.artist_id AS artist_id,
                sts.year      AS year,
                sts.duration  AS duration
FROM staging_songs sts
WHERE sts.song_id IS NOT NULL",
  )
}

/// One row per artist id. Catalog records for the same artist may disagree on
/// location; the record with the lowest song id is kept.
fn artist_insert() -> Statement {
  Statement::new(
    "insert artists",
    "INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, name, location, latitude, longitude
FROM (
    SELECT sts.artist_id        AS artist_id,
           sts.artist_name      AS name,
           sts.artist_location  AS location,
           sts.artist_latitude  AS latitude,
           sts.artist_longitude AS longitude,
           ROW_NUMBER() OVER (PARTITION BY sts.artist_id ORDER BY sts.song_id) AS seen
    FROM staging_songs sts
    WHERE sts.artist_id IS NOT NULL
) first_seen
WHERE seen = 1",
  )
}

fn time_insert(dialect: Dialect) -> Statement {
  let fields: Vec<String> = TimeField::ALL
    .iter()
    .map(|f| format!("{} AS {}", dialect.extract(*f, "start_time"), f.column()))
    .collect();

  Statement::new(
    "insert time",
    format!(
      "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT start_time,
       {}
FROM (
    SELECT DISTINCT {} AS start_time
    FROM staging_events ste
    WHERE ste.page = 'NextSong'
) played",
      fields.join(",\n       "),
      dialect.epoch_millis("ste.ts"),
    ),
  )
}

fn songplay_insert(dialect: Dialect) -> Statement {
  Statement::new(
    "insert songplays",
    format!(
      "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT DISTINCT {} AS start_time,
       ste.userId    AS user_id,
       ste.level     AS level,
       sts.song_id   AS song_id,
       sts.artist_id AS artist_id,
       ste.sessionId AS session_id,
       ste.location  AS location,
       ste.userAgent AS user_agent
FROM staging_events ste
JOIN staging_songs sts
  ON ste.artist = sts.artist_name
 AND ste.song   = sts.title
 AND ste.length = sts.duration
WHERE ste.page = 'NextSong'
  AND ste.userId IS NOT NULL",
      dialect.epoch_millis("ste.ts"),
    ),
  )
}

/// Transform statements in execution order: dimensions, then the fact table.
pub fn insert_statements(dialect: Dialect) -> Vec<Statement> {
  vec![
    user_insert(),
    song_insert(),
    artist_insert(),
    time_insert(dialect),
    songplay_insert(dialect),
  ]
}
