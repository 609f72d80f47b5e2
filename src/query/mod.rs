//! Statement execution and result formatting for db-stmt.
//!
//! This module holds the statement result formatter and the runner that
//! executes a statement, renders it and releases its resources.

pub mod executor;
pub mod outcome;

pub use executor::{ExecutionReport, QueryExecutor};
pub use outcome::StatementOutcome;
