//! Batched statement buffer with overflow flushing.

use crate::client::{SqlClient, SqlResult};
use tracing::debug;

const ENVELOPE_BEGIN: &str = "begin\n";
const ENVELOPE_END: &str = "end;\n";

/// Accumulates `;`-terminated statements and executes them as one batch.
///
/// Some stores require a `begin … end;` envelope around multi-statement
/// batches; the buffer writes the opening on construction and the closing
/// on flush. A buffer holding only the envelope executes nothing. When the
/// accumulated text exceeds the client's statement limit the buffer flushes
/// itself and starts a fresh envelope, so callers can push without
/// worrying about batch size.
pub struct SqlBuffer {
    buf: String,
    limit: usize,
}

impl SqlBuffer {
    /// Opens a buffer sized to the client's statement limit.
    pub fn new(client: &dyn SqlClient) -> Self {
        let mut buf = String::with_capacity(1024);
        buf.push_str(ENVELOPE_BEGIN);
        SqlBuffer {
            buf,
            limit: client.max_statement_len(),
        }
    }

    /// Appends one statement, flushing first if the buffer would overflow.
    ///
    /// The statement must not carry its own terminator; the buffer appends
    /// `;\n`.
    pub fn push(&mut self, client: &dyn SqlClient, statement: &str) -> SqlResult<()> {
        if self.buf.len() + statement.len() + 2 > self.limit && self.has_statements() {
            self.flush(client)?;
        }
        self.buf.push_str(statement);
        self.buf.push_str(";\n");
        Ok(())
    }

    /// True when at least one statement is buffered beyond the envelope.
    pub fn has_statements(&self) -> bool {
        self.buf.len() > ENVELOPE_BEGIN.len()
    }

    /// Executes the buffered batch, if any, and resets the buffer.
    pub fn flush(&mut self, client: &dyn SqlClient) -> SqlResult<()> {
        if !self.has_statements() {
            return Ok(());
        }
        self.buf.push_str(ENVELOPE_END);
        debug!(bytes = self.buf.len(), "flushing statement batch");
        client.execute(&self.buf)?;
        self.buf.clear();
        self.buf.push_str(ENVELOPE_BEGIN);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RecordingClient;

    #[test]
    fn empty_buffer_executes_nothing() {
        let client = RecordingClient::new();
        let mut buffer = SqlBuffer::new(&client);
        buffer.flush(&client).unwrap();
        assert!(client.executed().is_empty());
    }

    #[test]
    fn statements_are_wrapped_in_the_envelope() {
        let client = RecordingClient::new();
        let mut buffer = SqlBuffer::new(&client);
        buffer.push(&client, "delete from graphs where graphid=1").unwrap();
        buffer.push(&client, "delete from graphs where graphid=2").unwrap();
        buffer.flush(&client).unwrap();

        let executed = client.executed();
        assert_eq!(executed.len(), 1);
        assert_eq!(
            executed[0],
            "begin\ndelete from graphs where graphid=1;\ndelete from graphs where graphid=2;\nend;\n"
        );
    }

    #[test]
    fn overflow_triggers_an_intermediate_flush() {
        struct TinyClient(RecordingClient);
        impl SqlClient for TinyClient {
            fn query(&self, sql: &str) -> SqlResult<Vec<crate::client::SqlRow>> {
                self.0.query(sql)
            }
            fn execute(&self, sql: &str) -> SqlResult<u64> {
                self.0.execute(sql)
            }
            fn next_id_block(&self, table: &str, count: u64) -> SqlResult<u64> {
                self.0.next_id_block(table, count)
            }
            fn max_statement_len(&self) -> usize {
                48
            }
        }

        let client = TinyClient(RecordingClient::new());
        let mut buffer = SqlBuffer::new(&client);
        buffer.push(&client, "update t set a=1 where id=1").unwrap();
        buffer.push(&client, "update t set a=1 where id=2").unwrap();
        buffer.flush(&client).unwrap();

        // the second push overflowed the 48-byte limit
        assert_eq!(client.0.executed().len(), 2);
    }
}
