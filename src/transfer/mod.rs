//! Import/export boundary between the SQLite store and flat documents. The
//! store is always the source of truth; these helpers only move a `Snapshot`
//! in or out of it.

pub mod csv_dir;
pub mod json;

use std::path::Path;

use tracing::info;

use crate::db::{RecordStore, Snapshot};
use crate::error::Result;

pub(crate) const LOG_TARGET: &str = "school_records::transfer";

/// On-disk layout chosen from the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// A single JSON document.
    Json,
    /// A directory with one CSV file per collection.
    CsvDir,
}

impl Format {
    /// `.json` files are JSON documents; anything else is a CSV directory.
    pub fn for_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Format::Json
        } else {
            Format::CsvDir
        }
    }
}

/// Write the whole store to `path` and return the format used.
pub fn export(store: &RecordStore, path: &Path) -> Result<Format> {
    let snapshot = store.snapshot()?;
    let format = Format::for_path(path);
    match format {
        Format::Json => json::write(path, &snapshot)?,
        Format::CsvDir => csv_dir::write_dir(path, &snapshot)?,
    }
    info!(target: LOG_TARGET, path = %path.display(), ?format, "store exported");
    Ok(format)
}

/// Read a document from `path` and replay it into `store`. Parse failures
/// surface as `PersistenceFormat`; record-level problems keep their own
/// variants and roll the import back.
pub fn import(store: &mut RecordStore, path: &Path) -> Result<Snapshot> {
    let snapshot = match Format::for_path(path) {
        Format::Json => json::read(path)?,
        Format::CsvDir => csv_dir::read_dir(path)?,
    };
    store.restore(&snapshot)?;
    info!(target: LOG_TARGET, path = %path.display(), "store imported");
    Ok(snapshot)
}
