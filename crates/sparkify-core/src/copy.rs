//! Bulk-copy jobs that move JSON files into the staging tables.
//!
//! A [`CopyJob`] describes what to load; each warehouse decides how. Redshift
//! renders it into a `COPY` statement. Engines without a native bulk copy use
//! [`RecordMapper`] and [`coerce`] to turn JSON records into rows.

use serde::Deserialize;
use serde_json::Value;

use crate::{
  Error, Result,
  config::Config,
  sql::{Statement, quote_literal},
  table::{Column, ColumnType, Table},
};

// ─── Jobs ────────────────────────────────────────────────────────────────────

/// How JSON keys are matched to staging columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
  /// Top-level keys matched to column names, ignoring case.
  Auto,
  /// Location of a JSONPaths manifest; its n-th expression feeds the n-th
  /// column.
  Paths(String),
}

/// One bulk copy from a storage location into a staging table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyJob {
  pub table:  Table,
  pub source: String,
  pub role:   String,
  pub region: String,
  pub format: JsonFormat,
}

impl CopyJob {
  pub fn label(&self) -> String {
    format!("copy {}", self.table)
  }

  /// The Redshift `COPY` statement for this job.
  pub fn to_redshift(&self) -> Statement {
    let format = match &self.format {
      JsonFormat::Auto           => quote_literal("auto"),
      JsonFormat::Paths(manifest) => quote_literal(manifest),
    };
    let sql = format!(
      "COPY {}\nFROM {}\nCREDENTIALS {}\nCOMPUPDATE OFF REGION {}\nFORMAT AS JSON {}",
      self.table,
      quote_literal(&self.source),
      quote_literal(&format!("aws_iam_role={}", self.role)),
      quote_literal(&self.region),
      format,
    );
    Statement::new(self.label(), sql)
  }
}

/// The two staging loads described by `config`, events first.
pub fn copy_jobs(config: &Config) -> [CopyJob; 2] {
  let s3 = &config.s3;
  let job = |table, source: &str, manifest: &Option<String>| CopyJob {
    table,
    source: source.to_owned(),
    role: config.iam_role.arn.clone(),
    region: s3.region.clone(),
    format: manifest
      .clone()
      .map_or(JsonFormat::Auto, JsonFormat::Paths),
  };

  [
    job(Table::StagingEvents, &s3.log_data, &s3.log_jsonpath),
    job(Table::StagingSongs, &s3.song_data, &s3.song_jsonpath),
  ]
}

// ─── JSONPaths ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
  Key(String),
  Index(usize),
}

/// A single JSONPaths expression such as `$['userId']` or `$.song.title`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
  segments: Vec<Segment>,
}

impl JsonPath {
  pub fn parse(expr: &str) -> Result<Self> {
    let invalid = || Error::InvalidJsonPath(expr.to_owned());
    let mut rest = expr.trim().strip_prefix('$').ok_or_else(invalid)?;
    let mut segments = Vec::new();

    while !rest.is_empty() {
      if let Some(after) = rest.strip_prefix('.') {
        let end = after.find(['.', '[']).unwrap_or(after.len());
        if end == 0 {
          return Err(invalid());
        }
        segments.push(Segment::Key(after[..end].to_owned()));
        rest = &after[end..];
      } else if let Some(after) = rest.strip_prefix('[') {
        let inner = after.trim_start();
        // A quoted key runs to its closing quote and may itself contain `]`.
        let (segment, tail) = match inner.chars().next() {
          Some(quote @ ('\'' | '"')) => {
            let body = &inner[1..];
            let end = body.find(quote).ok_or_else(invalid)?;
            (Segment::Key(body[..end].to_owned()), &body[end + 1..])
          }
          _ => {
            let close = inner.find(']').ok_or_else(invalid)?;
            let index = inner[..close].trim().parse().map_err(|_| invalid())?;
            (Segment::Index(index), &inner[close..])
          }
        };
        segments.push(segment);
        rest = tail.trim_start().strip_prefix(']').ok_or_else(invalid)?;
      } else {
        return Err(invalid());
      }
    }

    if segments.is_empty() {
      return Err(invalid());
    }
    Ok(Self { segments })
  }

  /// The value at this path, if every step exists.
  pub fn extract<'a>(&self, record: &'a Value) -> Option<&'a Value> {
    self.segments.iter().try_fold(record, |v, seg| match seg {
      Segment::Key(k)   => v.get(k.as_str()),
      Segment::Index(i) => v.get(*i),
    })
  }
}

#[derive(Deserialize)]
struct Manifest {
  jsonpaths: Vec<String>,
}

/// Parse a JSONPaths manifest document.
pub fn parse_manifest(text: &str) -> Result<Vec<JsonPath>> {
  let manifest: Manifest = serde_json::from_str(text)?;
  manifest.jsonpaths.iter().map(|p| JsonPath::parse(p)).collect()
}

// ─── Record mapping ──────────────────────────────────────────────────────────

/// Maps JSON records onto the columns of one staging table.
#[derive(Debug, Clone)]
pub enum RecordMapper {
  Auto(&'static [Column]),
  Paths(&'static [Column], Vec<JsonPath>),
}

impl RecordMapper {
  /// Mapper for `table`. `manifest` holds the parsed JSONPaths for
  /// [`JsonFormat::Paths`]; it must have one expression per column.
  pub fn new(table: Table, manifest: Option<Vec<JsonPath>>) -> Result<Self> {
    let columns = table.columns();
    match manifest {
      None => Ok(RecordMapper::Auto(columns)),
      Some(paths) if paths.len() == columns.len() => Ok(RecordMapper::Paths(columns, paths)),
      Some(paths) => Err(Error::ManifestColumns {
        table,
        expected: columns.len(),
        found:    paths.len(),
      }),
    }
  }

  pub fn columns(&self) -> &'static [Column] {
    match self {
      RecordMapper::Auto(c) | RecordMapper::Paths(c, _) => *c,
    }
  }

  /// One cell per column, in column order.
  pub fn map(&self, record: &Value) -> Result<Vec<Cell>> {
    let Value::Object(object) = record else {
      return Err(Error::NotAnObject);
    };

    match self {
      RecordMapper::Auto(columns) => columns
        .iter()
        .map(|c| {
          let value = object
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(c.name))
            .map(|(_, v)| v);
          coerce(c, value)
        })
        .collect(),
      RecordMapper::Paths(columns, paths) => columns
        .iter()
        .zip(paths)
        .map(|(c, p)| coerce(c, p.extract(record)))
        .collect(),
    }
  }
}

/// A value ready to bind into a staging row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Null,
  Int(i64),
  Float(f64),
  Text(String),
}

/// Convert a JSON value to the storage class of `column`.
///
/// Missing values, JSON `null` and blank strings in numeric columns become
/// [`Cell::Null`]; nullability itself is left to the engine.
pub fn coerce(column: &Column, value: Option<&Value>) -> Result<Cell> {
  let bad = |v: &Value| Error::Coerce {
    column: column.name,
    value:  v.to_string(),
  };

  let Some(value) = value else {
    return Ok(Cell::Null);
  };

  let cell = match (column.ty, value) {
    (_, Value::Null) => Cell::Null,

    (ColumnType::Varchar | ColumnType::Timestamp, Value::String(s)) => Cell::Text(s.clone()),
    (ColumnType::Varchar | ColumnType::Timestamp, Value::Number(n)) => Cell::Text(n.to_string()),
    (ColumnType::Varchar | ColumnType::Timestamp, Value::Bool(b)) => Cell::Text(b.to_string()),

    (ty, Value::String(s)) if ty.is_numeric() && s.trim().is_empty() => Cell::Null,

    (ColumnType::Float, Value::Number(n)) => Cell::Float(n.as_f64().ok_or_else(|| bad(value))?),
    (ColumnType::Float, Value::String(s)) => {
      Cell::Float(s.trim().parse().map_err(|_| bad(value))?)
    }

    (ty @ (ColumnType::Integer | ColumnType::BigInt | ColumnType::Identity), Value::Number(n)) => {
      let int = n.as_i64().or_else(|| {
        n.as_f64()
          .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
          .map(|f| f as i64)
      });
      match int {
        Some(i) if fits(ty, i) => Cell::Int(i),
        _ => return Err(bad(value)),
      }
    }
    (ty @ (ColumnType::Integer | ColumnType::BigInt | ColumnType::Identity), Value::String(s)) => {
      match s.trim().parse::<i64>() {
        Ok(i) if fits(ty, i) => Cell::Int(i),
        _ => return Err(bad(value)),
      }
    }

    _ => return Err(bad(value)),
  };
  Ok(cell)
}

/// `INTEGER` columns are 32-bit on the cluster.
fn fits(ty: ColumnType, value: i64) -> bool {
  match ty {
    ColumnType::BigInt => true,
    _ => i32::try_from(value).is_ok(),
  }
}
