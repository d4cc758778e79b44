//! Local stand-in for a bulk copy: reads JSON files from disk and maps each
//! record onto the staging columns.

use std::{
  fs,
  path::{Path, PathBuf},
};

use serde_json::Value;
use sparkify_core::copy::{Cell, CopyJob, JsonFormat, RecordMapper, parse_manifest};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Resolve a copy source to a local path. `file://` prefixes are accepted;
/// any other URL scheme is rejected.
pub fn local_path(source: &str) -> Result<PathBuf> {
  if let Some(rest) = source.strip_prefix("file://") {
    return Ok(PathBuf::from(rest));
  }
  if source.contains("://") {
    return Err(Error::UnsupportedSource(source.to_owned()));
  }
  Ok(PathBuf::from(source))
}

/// Every `.json` file at or below `root`, sorted by path.
pub fn source_files(root: &Path) -> Result<Vec<PathBuf>> {
  if root.is_file() {
    return Ok(vec![root.to_path_buf()]);
  }

  let mut files = Vec::new();
  for entry in WalkDir::new(root) {
    let entry = entry?;
    if entry.file_type().is_file()
      && entry.path().extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
    {
      files.push(entry.into_path());
    }
  }

  if files.is_empty() {
    return Err(Error::NoSourceFiles(root.to_path_buf()));
  }
  files.sort();
  Ok(files)
}

fn read(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
}

fn mapper(job: &CopyJob) -> Result<RecordMapper> {
  let manifest = match &job.format {
    JsonFormat::Auto => None,
    JsonFormat::Paths(location) => Some(parse_manifest(&read(&local_path(location)?)?)?),
  };
  Ok(RecordMapper::new(job.table, manifest)?)
}

/// Read every record the job covers, in file order, as rows of cells.
pub fn read_rows(job: &CopyJob) -> Result<Vec<Vec<Cell>>> {
  let mapper = mapper(job)?;
  let files = source_files(&local_path(&job.source)?)?;

  let mut rows = Vec::new();
  for path in files {
    let text = read(&path)?;
    let records = serde_json::Deserializer::from_str(&text).into_iter::<Value>();
    for (index, record) in records.enumerate() {
      let row = record
        .map_err(sparkify_core::Error::from)
        .and_then(|r| mapper.map(&r))
        .map_err(|source| Error::Record { path: path.clone(), index, source })?;
      rows.push(row);
    }
  }
  Ok(rows)
}
