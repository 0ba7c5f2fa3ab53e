//! Binary entry point that glues the SQLite-backed record store to the TUI:
//! load settings, start file logging, open the database and drive the Ratatui
//! event loop until the user exits.
use anyhow::Context;
use school_records::config::Settings;
use school_records::{logging, run_app, App, RecordStore};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    logging::init(&settings)?;

    let store = RecordStore::open(&settings.database).with_context(|| {
        format!(
            "failed to open database '{}'",
            settings.database.display()
        )
    })?;

    let mut app = App::new(store, settings.export_path.clone())?;
    let result = run_app(&mut app);
    match &result {
        Ok(()) => info!("session ended"),
        Err(err) => error!(error = %err, "session aborted"),
    }
    result
}
