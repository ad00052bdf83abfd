//! The per-query handshake object.

use std::fmt;

use crate::driver::{PreparedStatement, Row};
use crate::error::{QbindError, Result};
use crate::template::{BoundParameter, ParsedQuery};
use crate::value::Value;

/// Everything one `query()` invocation produced: the rewritten statement,
/// the bound parameters, the execution outcome, and a lazy row surface
/// over the executed statement.
///
/// Row access is a stateful forward cursor ([`fetch_row`](Self::fetch_row))
/// with cached random access on top ([`row`](Self::row)): positional reads
/// beyond what has been fetched scan forward, caching every row on the
/// way, since the underlying engines cannot reposition a cursor
/// absolutely. A failed result (`success() == false`) has no usable rows —
/// check before consuming. The statement handle is released on
/// [`free`](Self::free) or when the result is dropped.
pub struct QueryResult<'conn> {
    pub(crate) query: String,
    pub(crate) original_query: String,
    pub(crate) original_parameters: Vec<Value>,
    pub(crate) parameters: Vec<BoundParameter>,
    pub(crate) success: bool,
    pub(crate) number_of_rows: usize,
    pub(crate) insert_id: Option<i64>,
    pub(crate) error: Option<QbindError>,
    pub(crate) statement: Option<Box<dyn PreparedStatement + 'conn>>,
    fetched: Vec<Row>,
    cursor: usize,
}

impl fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResult")
            .field("query", &self.query)
            .field("original_query", &self.original_query)
            .field("original_parameters", &self.original_parameters)
            .field("parameters", &self.parameters)
            .field("success", &self.success)
            .field("number_of_rows", &self.number_of_rows)
            .field("insert_id", &self.insert_id)
            .field("error", &self.error)
            .field("statement", &self.statement.as_ref().map(|_| "<statement>"))
            .field("fetched", &self.fetched)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl<'conn> QueryResult<'conn> {
    pub(crate) fn from_parsed(parsed: ParsedQuery) -> Self {
        Self {
            query: parsed.query,
            original_query: parsed.original_query,
            original_parameters: parsed.original_parameters,
            parameters: parsed.parameters,
            success: false,
            number_of_rows: 0,
            insert_id: None,
            error: None,
            statement: None,
            fetched: Vec::new(),
            cursor: 0,
        }
    }

    /// The rewritten, driver-ready statement text.
    pub fn query(&self) -> &str {
        &self.query
    }
    /// The template exactly as the caller passed it (after trimming).
    pub fn original_query(&self) -> &str {
        &self.original_query
    }
    pub fn original_parameters(&self) -> &[Value] {
        &self.original_parameters
    }
    /// The parameters in the order they were bound.
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }
    pub fn success(&self) -> bool {
        self.success
    }
    pub fn row_count(&self) -> usize {
        self.number_of_rows
    }
    /// The last insert id reported by the connection after execution.
    pub fn insert_id(&self) -> Option<i64> {
        self.insert_id
    }
    /// The captured driver failure, when execution did not succeed.
    pub fn error(&self) -> Option<&QbindError> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<QbindError> {
        self.error.take()
    }

    /// Fetches the next row, advancing the cursor. Returns `None` once the
    /// result set is exhausted (or immediately on a failed result).
    pub fn fetch_row(&mut self) -> Result<Option<Row>> {
        if self.cursor < self.fetched.len() {
            let row = self.fetched[self.cursor].clone();
            self.cursor += 1;
            return Ok(Some(row));
        }
        match self.pull()? {
            Some(row) => {
                self.cursor += 1;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    /// Random access by row position. Rows between the cache and the
    /// requested position are fetched (and cached) on the way; the
    /// forward cursor is left untouched.
    pub fn row(&mut self, position: usize) -> Result<Option<Row>> {
        while self.fetched.len() <= position {
            if self.pull()?.is_none() {
                break;
            }
        }
        Ok(self.fetched.get(position).cloned())
    }

    /// Fetches whatever remains of the result set and returns every row.
    pub fn rows(&mut self) -> Result<&[Row]> {
        while self.pull()?.is_some() {}
        Ok(&self.fetched)
    }

    /// Releases the statement cursor. Further fetches only serve what was
    /// already cached.
    pub fn free(&mut self) {
        self.statement = None;
    }

    // pulls one row from the statement into the cache
    fn pull(&mut self) -> Result<Option<Row>> {
        let Some(statement) = self.statement.as_mut() else {
            return Ok(None);
        };
        match statement.next_row()? {
            Some(row) => {
                self.fetched.push(row.clone());
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}
