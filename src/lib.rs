//! Qbind – typed-placeholder query templating over a relational driver.
//!
//! Qbind sits between application code and a database driver. A query is
//! written as a template carrying typed placeholders, either in the basic
//! dialect (`{type}` / `{location:type}`) or the classic dialect
//! (`%type`). Each substituted value is validated against its declared
//! type code, the template is rewritten into a driver-ready parameterized
//! statement (list values expand into `(?,?,...)` groups), the values are
//! bound positionally, and the execution outcome comes back as a
//! [`result::QueryResult`] exposing row count, insert id, lazy row access
//! and diagnostics.
//!
//! ## Modules
//! * [`database`] – The [`database::Database`] connection façade: connect,
//!   `query()`, transactions, hooks, query log and error-reporting policy.
//! * [`configuration`] – Connection settings, loadable from INI files or
//!   strings, including the error-reporting bitmask and dialect selector.
//! * [`template`] – The two placeholder parsers and the statement
//!   rewriter.
//! * [`valuetype`] – The closed registry of type codes, their validation
//!   rules and driver bind kinds.
//! * [`value`] – The [`value::Value`] enum carried through the pipeline,
//!   plus the [`values!`] construction macro.
//! * [`driver`] – The driver capability traits and the bundled SQLite
//!   implementation.
//! * [`result`] – The per-query result object with its row cursor.
//! * [`log`] – Query log entries.
//! * [`error`] – The crate error type.
//!
//! ## Type codes
//! `d` signed integer, `ud` unsigned integer, `f` signed decimal, `uf`
//! unsigned decimal, `s` string, `es` escaped string, `b` binary, and the
//! list forms `l`/`ls`, `les`, `ld`, `lud`, `lf`, `luf` whose elements
//! validate against the corresponding scalar code.
//!
//! ## Quick Start
//! ```
//! use qbind::configuration::Configuration;
//! use qbind::database::Database;
//! use qbind::values;
//!
//! let config = Configuration::default(); // in-memory SQLite
//! let db = Database::connect(config).unwrap();
//! db.query("CREATE TABLE foo (bar INTEGER, blah TEXT)", values![]).unwrap();
//! let result = db
//!     .query(
//!         "INSERT INTO foo (bar, blah) VALUES ({0:ud}, {1:s})",
//!         values![42, "hello"],
//!     )
//!     .unwrap();
//! assert!(result.success());
//! assert_eq!(result.row_count(), 1);
//!
//! let mut selected = db
//!     .query("SELECT blah FROM foo WHERE bar={0:ud}", values![42])
//!     .unwrap();
//! let row = selected.fetch_row().unwrap().unwrap();
//! assert_eq!(row.get("blah").unwrap().lexical(), "hello");
//! ```

pub mod configuration;
pub mod database;
pub mod driver;
pub mod error;
pub mod log;
pub mod result;
pub mod template;
pub mod value;
pub mod valuetype;
