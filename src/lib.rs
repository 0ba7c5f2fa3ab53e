//! Core library surface for the School Records TUI application.
//!
//! The record store, its validators and the JSON/CSV transfer adapters are
//! usable without the terminal front end; the `bin` target wires them to the
//! Ratatui UI.
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod transfer;
pub mod ui;
pub mod validation;

/// The persistence layer and its document form.
pub use db::{RecordStore, Snapshot};

pub use error::{EntityKind, RecordError, ValidationError};

pub use models::{Course, Instructor, JoinedRegistration, Person, Registration, Student, Summary};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
