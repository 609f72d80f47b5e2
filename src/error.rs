//! Error types for db-stmt.
//!
//! Defines the application error enum and the driver failure taxonomy used by
//! the statement result formatter.

use thiserror::Error;

/// The two ways a driver operation on an executed statement can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// Metadata access, row fetch, or column decode.
    Read,
    /// Closing a row set or a statement.
    Release,
}

/// Failure raised by the driver while reading or releasing a statement result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("{0}")]
    Read(String),

    #[error("{0}")]
    Release(String),
}

impl DriverError {
    /// Creates a read failure with the given message.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Creates a release failure with the given message.
    pub fn release(msg: impl Into<String>) -> Self {
        Self::Release(msg.into())
    }

    pub fn kind(&self) -> DriverErrorKind {
        match self {
            Self::Read(_) => DriverErrorKind::Read,
            Self::Release(_) => DriverErrorKind::Release,
        }
    }
}

/// Main error type for db-stmt operations.
#[derive(Error, Debug)]
pub enum StmtError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors (invalid config file, bad connection string, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A statement result could not be read or released.
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl StmtError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Driver(_) => "Driver Error",
        }
    }
}

/// Result type alias using StmtError.
pub type Result<T> = std::result::Result<T, StmtError>;
