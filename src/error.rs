use thiserror::Error;

#[derive(Error, Debug)]
pub enum QbindError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("The specified parameter location is invalid ({0}).")]
    OutOfBounds(usize),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Driver error: {0}")]
    Driver(String),
}

impl QbindError {
    /// Parse-phase failures surface directly from `query()` and are never
    /// routed through the error-reporting policy.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            QbindError::InvalidArgument(_) | QbindError::OutOfBounds(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, QbindError>;

// Helper conversions
impl From<rusqlite::Error> for QbindError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Driver(e.to_string())
    }
}

impl From<config::ConfigError> for QbindError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
