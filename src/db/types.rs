//! sqlx-backed implementations of the driver seam.
//!
//! A query's rows are fetched up front and exposed through a forward-only
//! cursor; the statement handle owns the pooled connection it ran on.

use super::{RowSet, StatementHandle};
use crate::error::DriverError;
use sqlx::pool::PoolConnection;
use sqlx::Database;

/// Reads a single column of a driver row as text.
pub trait RowText {
    /// Text form of the column at `index`. SQL NULL is `None`.
    fn column_text(&self, index: usize) -> Result<Option<String>, DriverError>;
}

/// Forward-only row set over rows already fetched from the driver.
pub struct BufferedRowSet<R> {
    labels: Vec<String>,
    rows: std::vec::IntoIter<R>,
    current: Option<R>,
    closed: bool,
}

impl<R: RowText> BufferedRowSet<R> {
    /// Creates a row set positioned before the first row.
    pub fn new(labels: Vec<String>, rows: Vec<R>) -> Self {
        Self {
            labels,
            rows: rows.into_iter(),
            current: None,
            closed: false,
        }
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::read("row set is closed"));
        }
        Ok(())
    }
}

impl<R: RowText + Send> RowSet for BufferedRowSet<R> {
    fn column_count(&self) -> Result<usize, DriverError> {
        self.ensure_open()?;
        Ok(self.labels.len())
    }

    fn column_label(&self, index: usize) -> Result<String, DriverError> {
        self.ensure_open()?;
        self.labels.get(index).cloned().ok_or_else(|| {
            DriverError::read(format!(
                "column index {index} out of range ({} columns)",
                self.labels.len()
            ))
        })
    }

    fn advance(&mut self) -> Result<bool, DriverError> {
        self.ensure_open()?;
        self.current = self.rows.next();
        Ok(self.current.is_some())
    }

    fn column_text(&self, index: usize) -> Result<Option<String>, DriverError> {
        self.ensure_open()?;
        if index >= self.labels.len() {
            return Err(DriverError::read(format!(
                "column index {index} out of range ({} columns)",
                self.labels.len()
            )));
        }
        match &self.current {
            Some(row) => row.column_text(index),
            None => Err(DriverError::read("no current row")),
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::release("row set already closed"));
        }
        self.closed = true;
        self.current = None;
        // Drop the remaining buffered rows now rather than with the outcome.
        self.rows = Vec::new().into_iter();
        Ok(())
    }
}

/// Statement handle that holds the pooled connection the statement ran on.
pub struct PooledStatement<DB: Database> {
    conn: Option<PoolConnection<DB>>,
}

impl<DB: Database> PooledStatement<DB> {
    pub fn new(conn: PoolConnection<DB>) -> Self {
        Self { conn: Some(conn) }
    }
}

impl<DB: Database> StatementHandle for PooledStatement<DB>
where
    PoolConnection<DB>: Send,
{
    fn close(&mut self) -> Result<(), DriverError> {
        match self.conn.take() {
            // Dropping a pool connection returns it to the pool.
            Some(conn) => {
                drop(conn);
                Ok(())
            }
            None => Err(DriverError::release("statement already closed")),
        }
    }
}

/// Formats binary column data the way Postgres prints `bytea` as text.
pub(crate) fn hex_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(2 + bytes.len() * 2);
    text.push_str("\\x");
    for byte in bytes {
        text.push_str(&format!("{byte:02x}"));
    }
    text
}

/// Maps a decode failure on a column into a read error.
pub(crate) fn decode_error(index: usize, error: sqlx::Error) -> DriverError {
    DriverError::read(format!("Failed to read column {index}: {error}"))
}
