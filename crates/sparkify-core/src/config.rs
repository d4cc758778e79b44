//! Operator configuration read from `dwh.cfg`.
//!
//! The file is INI-shaped with `[CLUSTER]`, `[IAM_ROLE]` and `[S3]` sections.
//! Section and key names are accepted in either case, and string values may
//! be wrapped in single quotes.

use std::{fmt, path::Path};

use config::{File, FileFormat};
use serde::{Deserialize, Deserializer};

use crate::Result;

pub const DEFAULT_PATH: &str = "dwh.cfg";
pub const DEFAULT_REGION: &str = "us-west-2";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  #[serde(alias = "CLUSTER")]
  pub cluster:  ClusterConfig,
  #[serde(alias = "IAM_ROLE")]
  pub iam_role: IamRoleConfig,
  #[serde(alias = "S3")]
  pub s3:       StorageConfig,
}

/// Connection parameters for the cluster.
#[derive(Clone, Deserialize)]
pub struct ClusterConfig {
  #[serde(alias = "HOST", deserialize_with = "unquoted")]
  pub host:        String,
  #[serde(alias = "DB_NAME", deserialize_with = "unquoted")]
  pub db_name:     String,
  #[serde(alias = "DB_USER", deserialize_with = "unquoted")]
  pub db_user:     String,
  #[serde(alias = "DB_PASSWORD", deserialize_with = "unquoted")]
  pub db_password: String,
  #[serde(alias = "DB_PORT")]
  pub db_port:     u16,
  #[serde(alias = "SSL", default = "default_ssl")]
  pub ssl:         bool,
}

impl fmt::Debug for ClusterConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ClusterConfig")
      .field("host", &self.host)
      .field("db_name", &self.db_name)
      .field("db_user", &self.db_user)
      .field("db_password", &"<redacted>")
      .field("db_port", &self.db_port)
      .field("ssl", &self.ssl)
      .finish()
  }
}

/// The role the warehouse assumes to read the storage locations.
#[derive(Debug, Clone, Deserialize)]
pub struct IamRoleConfig {
  #[serde(alias = "ARN", deserialize_with = "unquoted")]
  pub arn: String,
}

/// Source locations of the two input datasets.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
  #[serde(alias = "LOG_DATA", deserialize_with = "unquoted")]
  pub log_data:      String,
  #[serde(alias = "LOG_JSONPATH", default, deserialize_with = "unquoted_opt")]
  pub log_jsonpath:  Option<String>,
  #[serde(alias = "SONG_DATA", deserialize_with = "unquoted")]
  pub song_data:     String,
  #[serde(alias = "SONG_JSONPATH", default, deserialize_with = "unquoted_opt")]
  pub song_jsonpath: Option<String>,
  #[serde(alias = "REGION", default = "default_region", deserialize_with = "unquoted")]
  pub region:        String,
}

impl Config {
  /// Read and parse the configuration file at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let settings = config::Config::builder()
      .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini))
      .build()?;
    Ok(settings.try_deserialize()?)
  }

  /// Parse configuration from INI text.
  pub fn from_ini_str(text: &str) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(File::from_str(text, FileFormat::Ini))
      .build()?;
    Ok(settings.try_deserialize()?)
  }
}

fn default_ssl() -> bool {
  true
}

fn default_region() -> String {
  DEFAULT_REGION.to_owned()
}

fn strip_quotes(raw: &str) -> String {
  let trimmed = raw.trim();
  trimmed
    .strip_prefix('\'')
    .and_then(|s| s.strip_suffix('\''))
    .unwrap_or(trimmed)
    .to_owned()
}

fn unquoted<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
  String::deserialize(d).map(|s| strip_quotes(&s))
}

fn unquoted_opt<'de, D: Deserializer<'de>>(
  d: D,
) -> std::result::Result<Option<String>, D::Error> {
  Ok(
    Option::<String>::deserialize(d)?
      .map(|s| strip_quotes(&s))
      .filter(|s| !s.is_empty()),
  )
}
