//! Ratatui front-end split into state, forms, list screens and the terminal
//! driver.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
