//! Application settings loaded from `school-records.toml` inside the data
//! directory. On first start a commented default file is written; edit it and
//! restart to change paths or the log level.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".school-records";
/// Config file name stored inside the application data directory.
pub const CONFIG_FILE_NAME: &str = "school-records.toml";
const DB_FILE_NAME: &str = "school.sqlite";
const LOG_FILE_NAME: &str = "school-records.log";
const EXPORT_FILE_NAME: &str = "export.json";

/// Settings as they appear in the TOML file. Relative paths are resolved
/// against the data directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
}

/// Fully resolved settings used by the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub export_path: PathBuf,
}

impl Settings {
    /// Load settings from the default data directory under the user's home,
    /// writing the default config file first if it is missing.
    pub fn load() -> Result<Self> {
        let data_dir = default_data_dir()?;
        fs::create_dir_all(&data_dir).context("failed to create data directory")?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        write_default_if_missing(&config_path)?;
        Self::from_file(&data_dir, &config_path)
    }

    /// Read and resolve a config file against `data_dir`.
    pub fn from_file(data_dir: &Path, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let file: FileSettings = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        Self::resolve(data_dir, file)
    }

    /// Fill defaults and validate the log level.
    pub fn resolve(data_dir: &Path, file: FileSettings) -> Result<Self> {
        let resolve_path = |value: Option<PathBuf>, default: &str| match value {
            Some(path) if path.is_absolute() => path,
            Some(path) => data_dir.join(path),
            None => data_dir.join(default),
        };

        let log_level = match file.log_level.as_deref() {
            Some(level) => parse_level(level)?,
            None => LevelFilter::INFO,
        };

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            database: resolve_path(file.database, DB_FILE_NAME),
            log_file: resolve_path(file.log_file, LOG_FILE_NAME),
            log_level,
            export_path: resolve_path(file.export_path, EXPORT_FILE_NAME),
        })
    }
}

/// Parse one of `off`, `error`, `warn`, `info`, `debug`, `trace`.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(LevelFilter::OFF),
        "error" => Ok(LevelFilter::ERROR),
        "warn" => Ok(LevelFilter::WARN),
        "info" => Ok(LevelFilter::INFO),
        "debug" => Ok(LevelFilter::DEBUG),
        "trace" => Ok(LevelFilter::TRACE),
        other => bail!(
            "Invalid log level '{other}' in {CONFIG_FILE_NAME}. Expected off, error, warn, info, debug or trace."
        ),
    }
}

/// Default config file content with comments.
pub fn default_toml() -> &'static str {
    r#"# School Records configuration
#
# Paths may be absolute or relative to this directory.

# SQLite database holding all records.
# database = "school.sqlite"

# Log file. The terminal is used by the UI, so logs never go to stdout.
# log_file = "school-records.log"

# One of: off, error, warn, info, debug, trace (default: info)
log_level = "info"

# Default path offered by the export/import prompts.
# A path ending in .json is a JSON document; anything else is a CSV directory.
# export_path = "export.json"
"#
}

/// Write the default config file if it does not already exist.
pub fn write_default_if_missing(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::write(path, default_toml()).with_context(|| {
            format!("failed to write default config file '{}'", path.display())
        })?;
    }
    Ok(())
}

fn default_data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_live_in_data_dir() {
        let settings = Settings::resolve(Path::new("/data"), FileSettings::default()).unwrap();
        assert_eq!(settings.database, PathBuf::from("/data/school.sqlite"));
        assert_eq!(settings.log_file, PathBuf::from("/data/school-records.log"));
        assert_eq!(settings.export_path, PathBuf::from("/data/export.json"));
        assert_eq!(settings.log_level, LevelFilter::INFO);
    }

    #[test]
    fn default_file_parses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        write_default_if_missing(&path).unwrap();

        let settings = Settings::from_file(dir.path(), &path).unwrap();
        assert_eq!(settings.database, dir.path().join("school.sqlite"));
    }

    #[test]
    fn existing_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "log_level = \"debug\"\n").unwrap();

        write_default_if_missing(&path).unwrap();
        let settings = Settings::from_file(dir.path(), &path).unwrap();
        assert_eq!(settings.log_level, LevelFilter::DEBUG);
    }

    #[test]
    fn relative_and_absolute_paths() {
        let dir = TempDir::new().unwrap();
        let absolute = dir.path().join("elsewhere.sqlite");
        let file = FileSettings {
            database: Some(absolute.clone()),
            export_path: Some(PathBuf::from("exports")),
            ..FileSettings::default()
        };

        let settings = Settings::resolve(Path::new("/data"), file).unwrap();
        assert_eq!(settings.database, absolute);
        assert_eq!(settings.export_path, PathBuf::from("/data/exports"));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let file = FileSettings {
            log_level: Some("loud".into()),
            ..FileSettings::default()
        };
        assert!(Settings::resolve(Path::new("/data"), file).is_err());
        assert_eq!(parse_level(" WARN ").unwrap(), LevelFilter::WARN);
    }
}
