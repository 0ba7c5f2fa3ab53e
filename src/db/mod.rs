//! Persistence module split across logical submodules. `RecordStore` owns the
//! SQLite connection; each submodule contributes the free functions that run
//! its queries plus the `impl RecordStore` block exposing them.

mod connection;
mod courses;
mod people;
mod registrations;
mod reports;
mod snapshot;

use std::os::raw::c_int;

use rusqlite::{ffi, Error as SqlError, ErrorCode};

pub use connection::RecordStore;
pub use snapshot::{CourseRecord, PersonRecord, RegistrationRecord, Snapshot};

/// Tracing target for every record store event.
pub(crate) const LOG_TARGET: &str = "school_records::store";

/// Extended SQLite result code of a constraint violation, if that is what
/// `err` is.
fn constraint_code(err: &SqlError) -> Option<c_int> {
    match err {
        SqlError::SqliteFailure(inner, _) if inner.code == ErrorCode::ConstraintViolation => {
            Some(inner.extended_code)
        }
        _ => None,
    }
}

fn is_primary_key_violation(err: &SqlError) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
}

fn is_unique_violation(err: &SqlError) -> bool {
    constraint_code(err) == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
}

/// Build a case-insensitive `LIKE` pattern for a substring search. Wildcards
/// typed by the user are escaped so `50%` matches literally. Queries using
/// the pattern must declare `ESCAPE '\'`.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.trim().to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Treat a blank optional reference the same as an absent one. Any other
/// value is kept as given.
fn normalize_ref(reference: Option<&str>) -> Option<&str> {
    reference.filter(|value| !value.trim().is_empty())
}
