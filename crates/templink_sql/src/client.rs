//! The database client contract and its test double.

use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

/// Result type for client operations.
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised by a client or by statement rendering.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Driver-level failure.
    #[error("client error: {message}")]
    Client {
        /// Driver diagnostic.
        message: String,
        /// Whether the statement can be retried.
        retryable: bool,
    },

    /// A render call would have produced a statement without columns.
    #[error("refusing to render statement with empty column list for {table}")]
    EmptyColumnList {
        /// The table the statement targeted.
        table: &'static str,
    },

    /// A fetched row did not have the expected shape.
    #[error("unexpected row shape: {0}")]
    RowShape(String),
}

impl SqlError {
    /// Creates a retryable client error.
    pub fn retryable(message: impl Into<String>) -> Self {
        SqlError::Client {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a fatal client error.
    pub fn fatal(message: impl Into<String>) -> Self {
        SqlError::Client {
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether re-dispatching may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SqlError::Client { retryable: true, .. })
    }
}

/// One value of a fetched row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Integer column.
    Int(i64),
    /// Floating-point column.
    Float(f64),
    /// Text column.
    Str(String),
}

/// One fetched row.
pub type SqlRow = Vec<SqlValue>;

/// A connection to the relational store.
///
/// Statements arrive fully rendered; the client only executes them. The id
/// reservation is the store-native sequence contract: it must atomically
/// advance a per-table counter under concurrent linkers.
pub trait SqlClient: Send + Sync {
    /// Executes a select and returns all rows.
    fn query(&self, sql: &str) -> SqlResult<Vec<SqlRow>>;

    /// Executes a DML statement (or statement batch) and returns the
    /// affected-row count.
    fn execute(&self, sql: &str) -> SqlResult<u64>;

    /// Reserves `count` contiguous ids for `table`, returning the first.
    fn next_id_block(&self, table: &str, count: u64) -> SqlResult<u64>;

    /// Maximum rendered statement size before the buffer must flush.
    fn max_statement_len(&self) -> usize {
        64 * 1024
    }
}

/// Escapes a string literal for inclusion in a rendered statement.
///
/// Doubles single quotes and backslashes; the surrounding quotes are the
/// caller's.
pub fn escape_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

/// A scripted client for rendering tests: canned rows out, captured
/// statements in.
#[derive(Default)]
pub struct RecordingClient {
    queries: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
    canned: Mutex<VecDeque<Vec<SqlRow>>>,
    next_ids: Mutex<u64>,
}

impl RecordingClient {
    /// Creates a client with no canned responses.
    pub fn new() -> Self {
        RecordingClient {
            queries: Mutex::new(Vec::new()),
            executed: Mutex::new(Vec::new()),
            canned: Mutex::new(VecDeque::new()),
            next_ids: Mutex::new(1),
        }
    }

    /// Queues the result of the next `query` call.
    pub fn push_rows(&self, rows: Vec<SqlRow>) {
        self.canned.lock().push_back(rows);
    }

    /// Statements passed to `query`, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    /// Statements passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }
}

impl SqlClient for RecordingClient {
    fn query(&self, sql: &str) -> SqlResult<Vec<SqlRow>> {
        self.queries.lock().push(sql.to_string());
        Ok(self.canned.lock().pop_front().unwrap_or_default())
    }

    fn execute(&self, sql: &str) -> SqlResult<u64> {
        self.executed.lock().push(sql.to_string());
        Ok(0)
    }

    fn next_id_block(&self, _table: &str, count: u64) -> SqlResult<u64> {
        let mut next = self.next_ids.lock();
        let first = *next;
        *next += count;
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_doubles_quotes_and_backslashes() {
        assert_eq!(escape_str("o'neil"), "o''neil");
        assert_eq!(escape_str(r"a\b"), r"a\\b");
        assert_eq!(escape_str("plain"), "plain");
    }

    #[test]
    fn recording_client_replays_canned_rows() {
        let client = RecordingClient::new();
        client.push_rows(vec![vec![SqlValue::Int(1)]]);

        let rows = client.query("select 1").unwrap();
        assert_eq!(rows, vec![vec![SqlValue::Int(1)]]);
        assert!(client.query("select 2").unwrap().is_empty());
        assert_eq!(client.queries().len(), 2);
    }

    #[test]
    fn id_blocks_advance() {
        let client = RecordingClient::new();
        assert_eq!(client.next_id_block("triggers", 5).unwrap(), 1);
        assert_eq!(client.next_id_block("triggers", 1).unwrap(), 6);
    }
}
