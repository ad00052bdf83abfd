//! The connection façade: parse → validate → rewrite → bind → execute.

use std::fs::OpenOptions;
use std::io::Write;
use std::panic::Location;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::configuration::{Configuration, ErrorReporting};
use crate::driver::{Driver, SqliteDriver};
use crate::error::{QbindError, Result};
use crate::log::LogEntry;
use crate::result::QueryResult;
use crate::template;
use crate::value::Value;
use crate::valuetype::{ValueType, escape_markup};

/// A hook invoked with the in-flight [`QueryResult`], before or after
/// execution. The after-hook runs even when execution fails. A hook must
/// not issue queries on the database it is attached to.
pub type QueryHook = Box<dyn for<'c> FnMut(&mut QueryResult<'c>)>;

/// One logical connection. Queries run sequentially and synchronously: a
/// `query()` call fully completes before control returns. A `Database` is
/// not meant to be shared across threads; use one instance per thread.
pub struct Database {
    configuration: Configuration,
    driver: Box<dyn Driver>,
    log: Mutex<Vec<LogEntry>>,
    total_time: Mutex<Duration>,
    query_count: Mutex<u64>,
    before_hook: Mutex<Option<QueryHook>>,
    after_hook: Mutex<Option<QueryHook>>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("configuration", &self.configuration)
            .field("driver", &"<driver>")
            .field("log", &self.log)
            .field("total_time", &self.total_time)
            .field("query_count", &self.query_count)
            .field(
                "before_hook",
                &self.before_hook.lock().map(|h| h.is_some()).unwrap_or(false),
            )
            .field(
                "after_hook",
                &self.after_hook.lock().map(|h| h.is_some()).unwrap_or(false),
            )
            .finish()
    }
}

impl Database {
    /// Validates the configuration, opens the engine-selected driver and
    /// records the connection-establishment log entry.
    ///
    /// Unlike driver failures during queries, a connection failure always
    /// surfaces as `Err` (there is no half-connected database to return),
    /// though echo and log-file reporting still apply first.
    #[track_caller]
    pub fn connect(configuration: Configuration) -> Result<Database> {
        let origin = Location::caller();
        configuration.validate()?;
        let start = Instant::now();
        let driver: Box<dyn Driver> = match configuration.engine.to_lowercase().as_str() {
            "sqlite" => match SqliteDriver::open(&configuration.database) {
                Ok(driver) => Box::new(driver),
                Err(e) => {
                    error!(database = %configuration.database, "connection failed: {e}");
                    report(&configuration, &e, origin);
                    return Err(e);
                }
            },
            other => {
                return Err(QbindError::Config(format!(
                    "Unsupported engine \"{}\".",
                    other
                )));
            }
        };
        let database = Database::assemble(configuration, driver);
        let duration = start.elapsed();
        database.add_time(duration);
        database.add_to_log(
            Some("Connection established".to_string()),
            duration,
            None,
            origin,
        );
        info!(
            engine = %database.configuration.engine,
            database = %database.configuration.database,
            "connection established"
        );
        Ok(database)
    }

    /// Wires an explicitly constructed driver to a configuration, for
    /// drivers other than the bundled one (or for tests).
    #[track_caller]
    pub fn with_driver(configuration: Configuration, driver: Box<dyn Driver>) -> Result<Database> {
        let origin = Location::caller();
        configuration.validate()?;
        let database = Database::assemble(configuration, driver);
        database.add_to_log(
            Some("Connection established".to_string()),
            Duration::ZERO,
            None,
            origin,
        );
        Ok(database)
    }

    fn assemble(configuration: Configuration, driver: Box<dyn Driver>) -> Database {
        Database {
            configuration,
            driver,
            log: Mutex::new(Vec::new()),
            total_time: Mutex::new(Duration::ZERO),
            query_count: Mutex::new(0),
            before_hook: Mutex::new(None),
            after_hook: Mutex::new(None),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Parses a query template under the configured dialect, binds the
    /// given arguments and executes the statement.
    ///
    /// Parse-phase failures (`InvalidArgument`, `OutOfBounds`) return
    /// `Err` before any driver interaction, regardless of the
    /// error-reporting policy. Driver-phase failures are captured into the
    /// returned [`QueryResult`] and routed through the policy; only the
    /// raise bit turns them into `Err`.
    #[track_caller]
    pub fn query<'conn>(&'conn self, template: &str, args: Vec<Value>) -> Result<QueryResult<'conn>> {
        let origin = Location::caller();

        // clean the template
        let mut template = template.trim();
        if let Some(stripped) = template.strip_suffix(';') {
            template = stripped;
        }
        if template.is_empty() {
            return Err(QbindError::InvalidArgument("No query provided.".to_string()));
        }

        let parsed = template::parse(self.configuration.query_mode, template, args)?;
        let mut result = QueryResult::from_parsed(parsed);
        self.run(&mut result, origin)?;
        Ok(result)
    }

    /// Starts a transaction. No implicit nesting or savepoints.
    #[track_caller]
    pub fn start_transaction(&self) -> Result<()> {
        self.transaction_outcome(self.driver.begin_transaction(), Location::caller())
    }

    #[track_caller]
    pub fn commit_transaction(&self) -> Result<()> {
        self.transaction_outcome(self.driver.commit(), Location::caller())
    }

    #[track_caller]
    pub fn rollback_transaction(&self) -> Result<()> {
        self.transaction_outcome(self.driver.rollback(), Location::caller())
    }

    /// Sets the hook invoked with the in-flight result before execution.
    pub fn set_before_hook<F>(&self, hook: F)
    where
        F: for<'c> FnMut(&mut QueryResult<'c>) + 'static,
    {
        *self.before_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Sets the hook invoked after execution, also on failure.
    pub fn set_after_hook<F>(&self, hook: F)
    where
        F: for<'c> FnMut(&mut QueryResult<'c>) + 'static,
    {
        *self.after_hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// The query execution log gathered so far.
    pub fn log(&self) -> Vec<LogEntry> {
        self.log.lock().unwrap().clone()
    }

    /// How many queries have executed successfully.
    pub fn query_count(&self) -> u64 {
        *self.query_count.lock().unwrap()
    }

    /// Total time spent connecting and executing, across all queries.
    pub fn total_time(&self) -> Duration {
        *self.total_time.lock().unwrap()
    }

    // ------------- execution -------------

    fn run<'conn>(
        &'conn self,
        result: &mut QueryResult<'conn>,
        origin: &'static Location<'static>,
    ) -> Result<()> {
        let start = Instant::now();

        if let Some(hook) = self.before_hook.lock().unwrap().as_mut() {
            hook(result);
        }

        if let Err(e) = self.execute(result) {
            self.add_to_log(
                Some(e.to_string()),
                start.elapsed(),
                Some(result.original_query.clone()),
                origin,
            );
            error!(query = %result.original_query, "query failed: {e}");
            result.error = Some(e);
        } else {
            *self.query_count.lock().unwrap() += 1;
        }

        // the after-hook is not skipped by a failure
        if let Some(hook) = self.after_hook.lock().unwrap().as_mut() {
            hook(result);
        }

        result.success = result.error.is_none();

        // one duration covers prepare + bind + execute and is recorded
        // once, regardless of outcome
        let duration = start.elapsed();
        self.add_time(duration);
        self.add_to_log(None, duration, Some(result.original_query.clone()), origin);

        if let Some(failure) = result.take_error() {
            if report(&self.configuration, &failure, origin) {
                return Err(failure);
            }
            result.error = Some(failure);
        }
        Ok(())
    }

    fn execute<'conn>(&'conn self, result: &mut QueryResult<'conn>) -> Result<()> {
        debug!(query = %result.query, parameters = result.parameters.len(), "executing");
        let mut statement = self.driver.prepare(&result.query)?;
        for (index, parameter) in result.parameters.iter().enumerate() {
            let kind = parameter.value_type().bind_kind();
            // escaped strings are escaped at bind time; everything else
            // binds as-is
            if parameter.value_type() == ValueType::EscapedString {
                let escaped = Value::Text(escape_markup(&parameter.value().lexical()));
                statement.bind(index + 1, &escaped, kind)?;
            } else {
                statement.bind(index + 1, parameter.value(), kind)?;
            }
        }
        statement.execute()?;
        result.number_of_rows = statement.row_count();
        result.insert_id = Some(self.driver.last_insert_id()?);
        result.statement = Some(statement);
        Ok(())
    }

    // transaction failures go through the same reporting policy as
    // queries; without the raise bit they are swallowed
    fn transaction_outcome(
        &self,
        outcome: Result<()>,
        origin: &'static Location<'static>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(e) => {
                if report(&self.configuration, &e, origin) {
                    Err(e)
                } else {
                    Ok(())
                }
            }
        }
    }

    // ------------- bookkeeping -------------

    fn add_time(&self, duration: Duration) {
        *self.total_time.lock().unwrap() += duration;
    }

    fn add_to_log(
        &self,
        message: Option<String>,
        duration: Duration,
        query: Option<String>,
        origin: &'static Location<'static>,
    ) {
        if self.configuration.log_queries {
            self.log
                .lock()
                .unwrap()
                .push(LogEntry::new(message, duration, query, origin));
        }
    }
}

/// Applies the error-reporting policy to one failure: echo and/or append
/// to the error log file. Returns whether the raise bit asks the caller to
/// propagate. Ignore suppresses everything.
fn report(
    configuration: &Configuration,
    failure: &QbindError,
    origin: &'static Location<'static>,
) -> bool {
    let reporting = configuration.error_reporting;
    if reporting.is_ignore() {
        return false;
    }

    let message = format!(
        "{}\nFile: {}\nLine Number: {}",
        failure,
        origin.file(),
        origin.line()
    );

    if reporting.contains(ErrorReporting::ECHO) {
        eprintln!("{message}");
    }

    if reporting.contains(ErrorReporting::LOG_FILE) {
        if let Some(path) = &configuration.error_log {
            let appended = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut file| writeln!(file, "{message}"));
            if let Err(io) = appended {
                warn!(path = %path.display(), "could not append to error log: {io}");
            }
        }
    }

    reporting.contains(ErrorReporting::RAISE)
}
