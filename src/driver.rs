//! The driver capability boundary.
//!
//! The pipeline consumes a database driver through two small traits:
//! [`Driver`] hands out prepared statements and carries the connection-wide
//! operations (last insert id, transaction control), and
//! [`PreparedStatement`] takes positional binds, executes, and yields rows.
//! The bundled implementation sits on rusqlite; anything else can be
//! plugged in through [`Database::with_driver`](crate::database::Database::with_driver).

use std::collections::VecDeque;
use std::sync::Arc;

// used for the bundled driver implementation
use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::error::{QbindError, Result};
use crate::value::Value;

/// How a bound parameter is handed to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    /// Bind as an integer.
    Integer,
    /// Bind as text, sized to the value's length.
    Text,
    /// Bind as an opaque BLOB payload.
    LargeBinary,
}

/// One materialized result row: column names shared across the result set,
/// cell values owned per row.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    /// Cell lookup by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let position = self.columns.iter().position(|c| c == column)?;
        self.values.get(position)
    }
    /// Cell lookup by column position.
    pub fn value(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A prepared, bindable, executable statement.
pub trait PreparedStatement {
    /// Binds one value at a 1-based marker position.
    fn bind(&mut self, position: usize, value: &Value, kind: BindKind) -> Result<()>;
    /// Executes the statement with whatever has been bound.
    fn execute(&mut self) -> Result<()>;
    /// Rows affected (DML) or produced (queries) by the execution.
    fn row_count(&self) -> usize;
    /// Fetches the next row of a query-shaped statement, if any.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// The connection-level capabilities the pipeline relies on.
pub trait Driver {
    fn prepare<'conn>(&'conn self, sql: &str) -> Result<Box<dyn PreparedStatement + 'conn>>;
    fn last_insert_id(&self) -> Result<i64>;
    fn begin_transaction(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;
}

// ------------- SQLite -------------

/// The bundled [`Driver`] implementation on rusqlite.
pub struct SqliteDriver {
    connection: Connection,
}

impl SqliteDriver {
    /// Opens a database file, or an in-memory database when the name is
    /// empty or the customary `:memory:`.
    pub fn open(database: &str) -> Result<SqliteDriver> {
        let connection = if database.is_empty() || database == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(database)?
        };
        Ok(SqliteDriver { connection })
    }

    pub fn open_in_memory() -> Result<SqliteDriver> {
        Ok(SqliteDriver {
            connection: Connection::open_in_memory()?,
        })
    }
}

impl Driver for SqliteDriver {
    fn prepare<'conn>(&'conn self, sql: &str) -> Result<Box<dyn PreparedStatement + 'conn>> {
        let statement = self.connection.prepare(sql)?;
        Ok(Box::new(SqliteStatement {
            statement,
            columns: Arc::from(Vec::new()),
            rows: VecDeque::new(),
            row_count: 0,
        }))
    }

    fn last_insert_id(&self) -> Result<i64> {
        Ok(self.connection.last_insert_rowid())
    }

    fn begin_transaction(&self) -> Result<()> {
        self.connection.execute_batch("BEGIN")?;
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.connection.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.connection.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

pub struct SqliteStatement<'conn> {
    statement: rusqlite::Statement<'conn>,
    columns: Arc<[String]>,
    rows: VecDeque<Row>,
    row_count: usize,
}

impl PreparedStatement for SqliteStatement<'_> {
    fn bind(&mut self, position: usize, value: &Value, kind: BindKind) -> Result<()> {
        // NULL stays NULL under every bind kind
        if value.is_null() {
            self.statement
                .raw_bind_parameter(position, rusqlite::types::Null)?;
            return Ok(());
        }
        match kind {
            BindKind::Integer => {
                let integer = value.lexical().parse::<i64>().map_err(|_| {
                    QbindError::Driver(format!("cannot bind '{}' as an integer", value))
                })?;
                self.statement.raw_bind_parameter(position, integer)?;
            }
            BindKind::Text => {
                self.statement
                    .raw_bind_parameter(position, value.lexical().into_owned())?;
            }
            BindKind::LargeBinary => {
                self.statement.raw_bind_parameter(position, value.bytes())?;
            }
        }
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        if self.statement.column_count() > 0 {
            // Query-shaped: SQLite reports no affected-row count for
            // cursors, so the result set is materialized here and its
            // length serves as the row count.
            self.columns = Arc::from(
                self.statement
                    .column_names()
                    .into_iter()
                    .map(String::from)
                    .collect::<Vec<_>>(),
            );
            let columns = Arc::clone(&self.columns);
            let buffered = &mut self.rows;
            let mut rows = self.statement.raw_query();
            while let Some(row) = rows.next()? {
                let mut values = Vec::with_capacity(columns.len());
                for position in 0..columns.len() {
                    values.push(materialize(row.get_ref(position)?));
                }
                buffered.push_back(Row::new(Arc::clone(&columns), values));
            }
            drop(rows);
            self.row_count = self.rows.len();
        } else {
            self.row_count = self.statement.raw_execute()?;
        }
        Ok(())
    }

    fn row_count(&self) -> usize {
        self.row_count
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}

fn materialize(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
