//! Error types shared by the record store, the validators and the
//! import/export adapters. Each failure mode is its own variant so front ends
//! can react to it (or at least word the message) without string matching.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the library layers.
pub type Result<T> = std::result::Result<T, RecordError>;

/// The collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Instructor,
    Course,
    Registration,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Student => "Student",
            EntityKind::Instructor => "Instructor",
            EntityKind::Course => "Course",
            EntityKind::Registration => "Registration",
        };
        f.write_str(label)
    }
}

/// Field-level validation failures raised before anything touches SQLite.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Age cannot be negative (got {age}).")]
    NegativeAge { age: i64 },

    #[error("Age {age} is out of range.")]
    AgeOutOfRange { age: i64 },

    #[error("Invalid email format: '{email}'.")]
    InvalidEmail { email: String },

    #[error("{field} is required.")]
    Blank { field: &'static str },
}

/// Every outcome the record store and its adapters can report.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} ID {id} already exists.")]
    DuplicateKey { entity: EntityKind, id: String },

    #[error("{entity} ID {id} not found.")]
    NotFound { entity: EntityKind, id: String },

    #[error("{entity} ID {id} does not exist.")]
    UnknownReference { entity: EntityKind, id: String },

    #[error("Student {student_id} is already registered for course {course_id}.")]
    DuplicateRegistration {
        student_id: String,
        course_id: String,
    },

    #[error("Malformed document {}: {message}", path.display())]
    PersistenceFormat { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl RecordError {
    pub(crate) fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        RecordError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn unknown_reference(entity: EntityKind, id: impl Into<String>) -> Self {
        RecordError::UnknownReference {
            entity,
            id: id.into(),
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, message: impl fmt::Display) -> Self {
        RecordError::PersistenceFormat {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RecordError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for failures caused by the caller's input rather than the
    /// environment. Forms stay open for correction only on user errors.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, RecordError::Io { .. } | RecordError::Storage(_))
    }
}
