//! Database abstraction layer for db-stmt.
//!
//! Defines the driver seam consumed by the statement result formatter
//! (`StatementHandle`, `RowSet`) and the `DatabaseClient` trait implemented
//! by each backend.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{EventLog, FailingDatabaseClient, MockDatabaseClient, MockRowSet, MockStatement};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{BufferedRowSet, PooledStatement, RowText};

use crate::config::ConnectionConfig;
use crate::error::{DriverError, Result};
use crate::query::StatementOutcome;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string or URL scheme.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend, if it listens on one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::Sqlite => None,
        }
    }
}

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Driver-side handle for an executed statement.
pub trait StatementHandle: Send {
    /// Releases the statement and whatever server-side state it holds.
    fn close(&mut self) -> std::result::Result<(), DriverError>;
}

/// Forward-only cursor over the rows a query produced.
///
/// Column indexes are 0-based. Before the first `advance` the cursor sits
/// before the first row.
pub trait RowSet: Send {
    /// Number of columns in each row.
    fn column_count(&self) -> std::result::Result<usize, DriverError>;

    /// Label of the column at `index`.
    fn column_label(&self, index: usize) -> std::result::Result<String, DriverError>;

    /// Moves to the next row. Returns false once the rows are exhausted.
    fn advance(&mut self) -> std::result::Result<bool, DriverError>;

    /// Value of the column at `index` in the current row, as text.
    /// SQL NULL is `None`.
    fn column_text(&self, index: usize) -> std::result::Result<Option<String>, DriverError>;

    /// Releases the cursor.
    fn close(&mut self) -> std::result::Result<(), DriverError>;
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with StmtError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a single SQL statement and hands back its outcome.
    ///
    /// The outcome owns the statement's connection until it is closed.
    async fn execute(&self, sql: &str) -> Result<StatementOutcome>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}
