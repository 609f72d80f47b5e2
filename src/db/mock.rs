//! Mock driver handles and database clients for testing.
//!
//! Provides in-memory statements, row sets and clients that record the
//! driver calls made on them and can be told to fail.

use super::{DatabaseClient, RowSet, StatementHandle};
use crate::error::{DriverError, Result, StmtError};
use crate::query::StatementOutcome;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Shared, ordered record of driver calls made by mock handles.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, event: impl Into<String>) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event.into());
        }
    }

    /// Returns a snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<String> {
        self.0.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

/// A mock statement handle.
pub struct MockStatement {
    log: EventLog,
    fail_close: bool,
}

impl MockStatement {
    /// Creates a statement whose close succeeds.
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail_close: false,
        }
    }

    /// Creates a statement whose close always fails.
    pub fn failing(log: EventLog) -> Self {
        Self {
            log,
            fail_close: true,
        }
    }
}

impl StatementHandle for MockStatement {
    fn close(&mut self) -> std::result::Result<(), DriverError> {
        if self.fail_close {
            self.log.record("statement.close failed");
            return Err(DriverError::release("statement close failed"));
        }
        self.log.record("statement.close");
        Ok(())
    }
}

/// A mock forward-only row set over in-memory text values.
pub struct MockRowSet {
    labels: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    /// 0 means before the first row; n means positioned on row n - 1.
    position: usize,
    closed: bool,
    log: EventLog,
    fail_on_row: Option<usize>,
    fail_on_labels: bool,
    fail_close: bool,
}

impl MockRowSet {
    /// Creates a row set with the given labels and (nullable) values.
    pub fn new(labels: &[&str], rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            rows,
            position: 0,
            closed: false,
            log: EventLog::new(),
            fail_on_row: None,
            fail_on_labels: false,
            fail_close: false,
        }
    }

    /// Creates a row set whose values are all non-null text.
    pub fn from_text(labels: &[&str], rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
            .collect();
        Self::new(labels, rows)
    }

    /// Records calls into the given log.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Makes fetching the row at `index` (0-based) fail.
    pub fn fail_on_row(mut self, index: usize) -> Self {
        self.fail_on_row = Some(index);
        self
    }

    /// Makes column metadata access fail.
    pub fn fail_on_labels(mut self) -> Self {
        self.fail_on_labels = true;
        self
    }

    /// Makes close fail.
    pub fn fail_on_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    fn ensure_open(&self) -> std::result::Result<(), DriverError> {
        if self.closed {
            return Err(DriverError::read("row set is closed"));
        }
        Ok(())
    }
}

impl RowSet for MockRowSet {
    fn column_count(&self) -> std::result::Result<usize, DriverError> {
        self.ensure_open()?;
        if self.fail_on_labels {
            return Err(DriverError::read("metadata unavailable"));
        }
        Ok(self.labels.len())
    }

    fn column_label(&self, index: usize) -> std::result::Result<String, DriverError> {
        self.ensure_open()?;
        self.labels
            .get(index)
            .cloned()
            .ok_or_else(|| DriverError::read(format!("no column {index}")))
    }

    fn advance(&mut self) -> std::result::Result<bool, DriverError> {
        self.ensure_open()?;
        if self.fail_on_row == Some(self.position) {
            return Err(DriverError::read(format!(
                "connection lost fetching row {}",
                self.position
            )));
        }
        if self.position >= self.rows.len() {
            return Ok(false);
        }
        self.position += 1;
        Ok(true)
    }

    fn column_text(&self, index: usize) -> std::result::Result<Option<String>, DriverError> {
        self.ensure_open()?;
        let row = self
            .position
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| DriverError::read("no current row"))?;
        row.get(index)
            .cloned()
            .ok_or_else(|| DriverError::read(format!("no column {index}")))
    }

    fn close(&mut self) -> std::result::Result<(), DriverError> {
        if self.fail_close {
            self.log.record("rowset.close failed");
            return Err(DriverError::release("row set close failed"));
        }
        if self.closed {
            return Err(DriverError::release("row set already closed"));
        }
        self.closed = true;
        self.log.record("rowset.close");
        Ok(())
    }
}

/// A mock database client that returns predefined results.
///
/// `SELECT` statements yield a single `result` column with one row; anything
/// else reports the configured affected-row count.
#[derive(Default)]
pub struct MockDatabaseClient {
    log: EventLog,
    rows_affected: u64,
}

impl MockDatabaseClient {
    /// Creates a new mock client reporting zero affected rows for updates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the affected-row count reported for non-SELECT statements.
    pub fn with_rows_affected(mut self, rows_affected: u64) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    /// Records driver calls of every outcome into the given log.
    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&self, sql: &str) -> Result<StatementOutcome> {
        self.log.record(format!("execute {sql}"));
        let statement = Box::new(MockStatement::new(self.log.clone()));

        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            let rows = MockRowSet::new(
                &["result"],
                vec![vec![Some(format!("Mock result for: {sql}"))]],
            )
            .with_log(self.log.clone());
            Ok(StatementOutcome::query(statement, Box::new(rows)))
        } else {
            Ok(StatementOutcome::update(statement, self.rows_affected))
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every statement fails with the given message.
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&self, _sql: &str) -> Result<StatementOutcome> {
        Err(StmtError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
