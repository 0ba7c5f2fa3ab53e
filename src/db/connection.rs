use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{info, warn};

use super::LOG_TARGET;
use crate::error::{RecordError, Result};

/// Schema for the four collections. `PRAGMA foreign_keys = ON` is issued on
/// every connection so the cascade and set-null rules below actually fire.
const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        age INTEGER NOT NULL CHECK (age >= 0),
        email TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS instructors (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        age INTEGER NOT NULL CHECK (age >= 0),
        email TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS courses (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        instructor_id TEXT,
        FOREIGN KEY(instructor_id) REFERENCES instructors(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS registrations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id TEXT NOT NULL,
        course_id TEXT NOT NULL,
        UNIQUE(student_id, course_id),
        FOREIGN KEY(student_id) REFERENCES students(id) ON DELETE CASCADE,
        FOREIGN KEY(course_id) REFERENCES courses(id) ON DELETE CASCADE
    );
";

/// The single authoritative owner of all school records. Every public
/// operation is one call that either fully applies or leaves the tables
/// untouched.
///
/// The store is single-threaded: it owns a plain `rusqlite::Connection` and is
/// not `Sync`. Sharing it between users would need a lock around each call.
pub struct RecordStore {
    pub(super) conn: Connection,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open (or create) the database file at `path`, creating parent
    /// directories as needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| RecordError::io(parent, err))?;
        }

        let conn = Connection::open(path)?;
        let store = Self::init(conn, Some(path.to_path_buf()))?;
        info!(target: LOG_TARGET, path = %path.display(), "record store opened");
        Ok(store)
    }

    /// Fresh store that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path })
    }

    /// Location of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write a consistent copy of the whole database to `dest`. The copy is
    /// built in a sibling `.partial` file and renamed over `dest`, so an
    /// earlier backup survives a failed one. `dest` must not be the store's
    /// own database file.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        if self.is_own_file(dest) {
            warn!(target: LOG_TARGET, dest = %dest.display(), "backup rejected: target is the live database");
            return Err(RecordError::io(
                dest,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "backup target is the live database",
                ),
            ));
        }

        let Some(file_name) = dest.file_name() else {
            return Err(RecordError::io(
                dest,
                io::Error::new(io::ErrorKind::InvalidInput, "backup target has no file name"),
            ));
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| RecordError::io(parent, err))?;
        }

        let mut partial_name = file_name.to_os_string();
        partial_name.push(".partial");
        let partial = dest.with_file_name(partial_name);
        if partial.exists() {
            fs::remove_file(&partial).map_err(|err| RecordError::io(&partial, err))?;
        }

        let target = partial.to_string_lossy().into_owned();
        if let Err(err) = self.conn.execute("VACUUM INTO ?1", [&target]) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }
        fs::rename(&partial, dest).map_err(|err| RecordError::io(dest, err))?;

        info!(target: LOG_TARGET, dest = %dest.display(), "database backup written");
        Ok(())
    }

    /// Whether `candidate` names the file this store has open.
    fn is_own_file(&self, candidate: &Path) -> bool {
        let Some(own) = self.path.as_deref() else {
            return false;
        };
        match (fs::canonicalize(own), fs::canonicalize(candidate)) {
            (Ok(own), Ok(candidate)) => own == candidate,
            _ => own == candidate,
        }
    }
}
