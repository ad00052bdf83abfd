use std::fmt;
use std::panic::Location;
use std::time::Duration;

// used for timestamps on log entries
use chrono::{DateTime, Utc};

/// One query log record. An entry is appended per execution phase:
/// connection establishment, a failed execution attempt, and the
/// completion of each query. `message` is `None` for a successful phase
/// and carries the error text otherwise.
#[derive(Debug, Clone)]
pub struct LogEntry {
    message: Option<String>,
    duration: Duration,
    query: Option<String>,
    origin: &'static Location<'static>,
    at: DateTime<Utc>,
}

impl LogEntry {
    pub(crate) fn new(
        message: Option<String>,
        duration: Duration,
        query: Option<String>,
        origin: &'static Location<'static>,
    ) -> Self {
        Self {
            message,
            duration,
            query,
            origin,
            at: Utc::now(),
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
    pub fn duration(&self) -> Duration {
        self.duration
    }
    /// The original query text, or `None` for non-query phases such as
    /// connection establishment.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
    /// The call site that triggered this phase.
    pub fn origin(&self) -> &'static Location<'static> {
        self.origin
    }
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Query: {}\nDuration: {} ms",
            self.query.as_deref().unwrap_or("-"),
            self.duration.as_millis()
        )?;
        if let Some(message) = &self.message {
            write!(f, "\nMessage: {}", message)?;
        }
        Ok(())
    }
}
