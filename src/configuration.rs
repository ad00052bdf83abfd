//! Connection configuration.
//!
//! A [`Configuration`] can be built programmatically (public fields,
//! `Default` for the usual values) or loaded from an INI file or string,
//! optionally from one named section. Loading goes through the `config`
//! crate and serde; the INI keys are the field names (`hostname`,
//! `engine`, `database`, `username`, `password`, `error_reporting`,
//! `error_log`, `log_queries`, `query_mode`).

use std::ops::BitOr;
use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat};
use serde::Deserialize;

use crate::error::{QbindError, Result};

/// Bitmask deciding what happens when a driver-phase failure is reported:
/// any combination of echoing, appending to a log file and re-raising.
/// [`ErrorReporting::IGNORE`] (zero) suppresses all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub struct ErrorReporting(u8);

impl ErrorReporting {
    /// Swallow failures entirely.
    pub const IGNORE: ErrorReporting = ErrorReporting(0);
    /// Echo a formatted message to stderr.
    pub const ECHO: ErrorReporting = ErrorReporting(1);
    /// Re-raise the failure to the caller.
    pub const RAISE: ErrorReporting = ErrorReporting(2);
    /// Append the formatted message to the configured error log file.
    pub const LOG_FILE: ErrorReporting = ErrorReporting(4);

    pub fn contains(&self, mode: ErrorReporting) -> bool {
        mode.0 != 0 && self.0 & mode.0 == mode.0
    }

    pub fn is_ignore(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ErrorReporting {
    fn default() -> Self {
        ErrorReporting::RAISE
    }
}

impl BitOr for ErrorReporting {
    type Output = ErrorReporting;
    fn bitor(self, rhs: ErrorReporting) -> ErrorReporting {
        ErrorReporting(self.0 | rhs.0)
    }
}

impl TryFrom<u8> for ErrorReporting {
    type Error = String;
    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        // the valid range is the union of all mode bits
        let max = ErrorReporting::ECHO | ErrorReporting::RAISE | ErrorReporting::LOG_FILE;
        if value <= max.0 {
            Ok(ErrorReporting(value))
        } else {
            Err(format!(
                "Invalid value provided for configuration value \"ErrorReporting\" ({}).",
                value
            ))
        }
    }
}

/// Which placeholder grammar the connection parses: basic `{...}` markers
/// or classic `%...` markers. Applied uniformly to every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u8")]
pub enum QueryDialect {
    #[default]
    Basic,
    Classic,
}

impl TryFrom<u8> for QueryDialect {
    type Error = String;
    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(QueryDialect::Basic),
            1 => Ok(QueryDialect::Classic),
            _ => Err(format!(
                "Invalid value provided for configuration value \"QueryMode\" ({}).",
                value
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub hostname: String,
    /// Engine identifier selecting the driver; `sqlite` is bundled.
    pub engine: String,
    /// Database name; for SQLite this is the file path, with an empty
    /// value or `:memory:` selecting an in-memory database.
    pub database: String,
    pub username: String,
    pub password: String,
    pub error_reporting: ErrorReporting,
    /// Required whenever the [`ErrorReporting::LOG_FILE`] bit is set.
    pub error_log: Option<PathBuf>,
    /// Whether a query log is maintained on the connection.
    pub log_queries: bool,
    pub query_mode: QueryDialect,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            engine: "sqlite".to_string(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            error_reporting: ErrorReporting::default(),
            error_log: None,
            log_queries: true,
            query_mode: QueryDialect::default(),
        }
    }
}

impl Configuration {
    /// Loads a configuration from an INI file, optionally from one named
    /// section of it.
    pub fn from_file(path: &Path, section: Option<&str>) -> Result<Configuration> {
        let path = path.to_str().ok_or_else(|| {
            QbindError::Config(format!("Configuration path is not valid UTF-8: {:?}", path))
        })?;
        let loaded = Config::builder()
            .add_source(File::new(path, FileFormat::Ini))
            .build()?;
        Self::deserialize_section(loaded, section)
    }

    /// Loads a configuration from an INI string, optionally from one named
    /// section of it.
    pub fn from_ini_str(ini: &str, section: Option<&str>) -> Result<Configuration> {
        if ini.trim().is_empty() {
            return Err(QbindError::Config(
                "Configuration string not available".to_string(),
            ));
        }
        let loaded = Config::builder()
            .add_source(File::from_str(ini, FileFormat::Ini))
            .build()?;
        Self::deserialize_section(loaded, section)
    }

    fn deserialize_section(loaded: Config, section: Option<&str>) -> Result<Configuration> {
        let configuration: Configuration = match section {
            Some(section) => loaded.get(section)?,
            None => loaded.try_deserialize()?,
        };
        configuration.validate()?;
        Ok(configuration)
    }

    /// Construction-time validation. The bitmask and dialect ranges are
    /// enforced by their `TryFrom` impls during deserialization; this
    /// checks the cross-field rule: file logging needs a log path.
    pub fn validate(&self) -> Result<()> {
        if self.error_reporting.contains(ErrorReporting::LOG_FILE)
            && self
                .error_log
                .as_ref()
                .map_or(true, |path| path.as_os_str().is_empty())
        {
            return Err(QbindError::Config(
                "Invalid configuration: error file logging, but no error file provided.".to_string(),
            ));
        }
        Ok(())
    }
}
