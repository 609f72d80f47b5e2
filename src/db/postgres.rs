//! PostgreSQL database client implementation.
//!
//! Provides the `PostgresClient` struct that implements the `DatabaseClient`
//! trait for PostgreSQL databases using sqlx.

use crate::config::ConnectionConfig;
use crate::db::types::decode_error;
use crate::db::{BufferedRowSet, DatabaseClient, PooledStatement, RowText};
use crate::error::{DriverError, Result, StmtError};
use crate::query::StatementOutcome;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Row, Statement, ValueRef};
use std::time::Duration;
use tracing::debug;

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// PostgreSQL database client.
#[derive(Debug)]
pub struct PostgresClient {
    pool: PgPool,
}

impl PostgresClient {
    /// Connects to the database described by `config`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Successfully connected to database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn execute(&self, sql: &str) -> Result<StatementOutcome> {
        let timeout = Duration::from_secs(QUERY_TIMEOUT_SECS);
        let timed_out =
            || StmtError::query(format!("Query timed out after {QUERY_TIMEOUT_SECS} seconds"));

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| StmtError::connection(e.to_string()))?;

        // The prepared statement tells us whether the statement yields rows.
        let labels: Vec<String> = tokio::time::timeout(timeout, (&mut *conn).prepare(sql))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| StmtError::query(format_query_error(e)))?
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        if labels.is_empty() {
            let result = tokio::time::timeout(timeout, sqlx::query(sql).execute(&mut *conn))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| StmtError::query(format_query_error(e)))?;

            debug!("Statement affected {} rows", result.rows_affected());
            let statement = PooledStatement::new(conn);
            return Ok(StatementOutcome::update(
                Box::new(statement),
                result.rows_affected(),
            ));
        }

        // A bare `&str` carries no arguments, so it runs over the simple query
        // protocol and every value comes back in the server's text format.
        let rows: Vec<PgRow> = tokio::time::timeout(timeout, (&mut *conn).fetch_all(sql))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| StmtError::query(format_query_error(e)))?;

        debug!("Query returned {} rows", rows.len());
        let row_set = BufferedRowSet::new(labels, rows);
        let statement = PooledStatement::new(conn);
        Ok(StatementOutcome::query(Box::new(statement), Box::new(row_set)))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

impl RowText for PgRow {
    fn column_text(&self, index: usize) -> std::result::Result<Option<String>, DriverError> {
        let value = self.try_get_raw(index).map_err(|e| decode_error(index, e))?;
        if value.is_null() {
            return Ok(None);
        }

        value
            .as_str()
            .map(|text| Some(text.to_string()))
            .map_err(|e| decode_error(index, sqlx::Error::Decode(e)))
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> StmtError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        StmtError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        StmtError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        StmtError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        StmtError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        StmtError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        StmtError::connection(error.to_string())
    }
}

/// Formats a statement error with PostgreSQL detail and hint if available.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(constraint) = pg_error.constraint() {
            result.push_str("\n  CONSTRAINT: ");
            result.push_str(constraint);
        }
    }

    result
}
