//! Statement result formatting.
//!
//! A `StatementOutcome` owns the handles of one executed statement, renders
//! its result as text and releases the handles when closed.

use crate::db::{RowSet, StatementHandle};
use crate::error::DriverError;
use std::fmt;
use tracing::{info, warn, Span};

/// What the statement produced.
enum Payload {
    Rows(Box<dyn RowSet>),
    Count(u64),
}

/// The outcome of one executed statement.
///
/// Holds either a row set (for queries) or an affected-row count (for
/// updates), together with the statement handle. Log events are recorded
/// inside the span given to [`StatementOutcome::with_span`], or the span
/// that was current at construction.
pub struct StatementOutcome {
    statement: Box<dyn StatementHandle>,
    payload: Payload,
    span: Span,
}

impl StatementOutcome {
    /// Creates the outcome of a statement that produced a row set.
    pub fn query(statement: Box<dyn StatementHandle>, rows: Box<dyn RowSet>) -> Self {
        Self {
            statement,
            payload: Payload::Rows(rows),
            span: Span::current(),
        }
    }

    /// Creates the outcome of a statement that produced an affected-row count.
    pub fn update(statement: Box<dyn StatementHandle>, rows_affected: u64) -> Self {
        Self {
            statement,
            payload: Payload::Count(rows_affected),
            span: Span::current(),
        }
    }

    /// Records this outcome's log events inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn is_query(&self) -> bool {
        matches!(self.payload, Payload::Rows(_))
    }

    /// The row set, if the statement was a query.
    pub fn row_set(&self) -> Option<&dyn RowSet> {
        match &self.payload {
            Payload::Rows(rows) => Some(&**rows),
            Payload::Count(_) => None,
        }
    }

    /// The row set for reading, if the statement was a query.
    pub fn row_set_mut(&mut self) -> Option<&mut dyn RowSet> {
        match &mut self.payload {
            Payload::Rows(rows) => Some(&mut **rows),
            Payload::Count(_) => None,
        }
    }

    /// The affected-row count, if the statement was not a query.
    pub fn rows_affected(&self) -> Option<u64> {
        match self.payload {
            Payload::Rows(_) => None,
            Payload::Count(count) => Some(count),
        }
    }

    /// Renders the outcome as text, surfacing driver failures.
    ///
    /// A query renders as a bracketed header line of column labels followed
    /// by one bracketed line per row; NULL values render as `null`. Rows are
    /// consumed: rendering the same query twice yields only the header the
    /// second time. An update renders as `"<n> row(s) affected."`.
    pub fn try_render(&mut self) -> Result<String, DriverError> {
        let rows = match &mut self.payload {
            Payload::Count(count) => return Ok(format!("{count} row(s) affected.")),
            Payload::Rows(rows) => rows,
        };

        let mut text = String::new();
        let column_count = rows.column_count()?;
        for index in 0..column_count {
            text.push('[');
            text.push_str(&rows.column_label(index)?);
            text.push(']');
        }

        while rows.advance()? {
            text.push('\n');
            for index in 0..column_count {
                let value = rows.column_text(index)?;
                text.push('[');
                text.push_str(value.as_deref().unwrap_or("null"));
                text.push(']');
            }
        }

        Ok(text)
    }

    /// Renders the outcome as text, logging driver failures.
    ///
    /// Returns `None` only when the driver failed; a query without rows
    /// still renders its header.
    pub fn render(&mut self) -> Option<String> {
        match self.try_render() {
            Ok(text) => Some(text),
            Err(e) => {
                let _entered = self.span.enter();
                warn!("{}", e);
                None
            }
        }
    }

    /// Releases the row set (for queries), then the statement.
    ///
    /// Both releases are attempted even if the first fails. Each failure is
    /// logged; the first one is returned.
    pub fn close(self) -> Result<(), DriverError> {
        let Self {
            mut statement,
            payload,
            span,
        } = self;
        let _entered = span.enter();
        let mut first_error = None;

        if let Payload::Rows(mut rows) = payload {
            match rows.close() {
                Ok(()) => info!("Row set closed."),
                Err(e) => {
                    warn!("{}", e);
                    first_error = Some(e);
                }
            }
        }

        match statement.close() {
            Ok(()) => info!("Statement closed."),
            Err(e) => {
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for StatementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementOutcome")
            .field("is_query", &self.is_query())
            .field("rows_affected", &self.rows_affected())
            .finish()
    }
}
