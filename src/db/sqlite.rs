//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the `DatabaseClient`
//! trait for SQLite database files using sqlx.

use crate::config::ConnectionConfig;
use crate::db::types::{decode_error, hex_text};
use crate::db::{BufferedRowSet, DatabaseClient, PooledStatement, RowText};
use crate::error::{DriverError, Result, StmtError};
use crate::query::StatementOutcome;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, Statement, TypeInfo, ValueRef};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the database file described by `config`, creating it if missing.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options = SqliteConnectOptions::from_str(&conn_str)
            .map_err(|e| StmtError::config(format!("Invalid SQLite location: {e}")))?
            .create_if_missing(true);

        let pool = pool_options(config)
            .connect_with(options)
            .await
            .map_err(|e| {
                StmtError::connection(format!("Cannot open SQLite database {conn_str}: {e}"))
            })?;

        debug!("Opened SQLite database {}", conn_str);
        Ok(Self { pool })
    }
}

/// Pool settings for `config`.
///
/// Every connection to an in-memory database sees its own database, so that
/// pool keeps exactly one connection open for its whole life.
fn pool_options(config: &ConnectionConfig) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new().acquire_timeout(Duration::from_secs(10));
    if config.is_in_memory() {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options.max_connections(5)
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
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
            .map_err(|e| StmtError::query(e.to_string()))?
            .columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect();

        if labels.is_empty() {
            let result = tokio::time::timeout(timeout, sqlx::query(sql).execute(&mut *conn))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| StmtError::query(e.to_string()))?;

            debug!("Statement affected {} rows", result.rows_affected());
            let statement = PooledStatement::new(conn);
            return Ok(StatementOutcome::update(
                Box::new(statement),
                result.rows_affected(),
            ));
        }

        let rows: Vec<SqliteRow> =
            tokio::time::timeout(timeout, sqlx::query(sql).fetch_all(&mut *conn))
                .await
                .map_err(|_| timed_out())?
                .map_err(|e| StmtError::query(e.to_string()))?;

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

impl RowText for SqliteRow {
    fn column_text(&self, index: usize) -> std::result::Result<Option<String>, DriverError> {
        // SQLite is dynamically typed; go by the storage class of the value.
        let type_name = {
            let raw = self.try_get_raw(index).map_err(|e| decode_error(index, e))?;
            if raw.is_null() {
                return Ok(None);
            }
            let name = raw.type_info().name().to_uppercase();
            name
        };

        let text = match type_name.as_str() {
            "INTEGER" | "INT8" | "BOOLEAN" => self
                .try_get_unchecked::<i64, _>(index)
                .map(|v| v.to_string()),
            "BLOB" => self
                .try_get_unchecked::<Vec<u8>, _>(index)
                .map(|bytes| hex_text(&bytes)),
            // SQLite converts REAL and TEXT values to their own text form.
            _ => self.try_get_unchecked::<String, _>(index),
        }
        .map_err(|e| decode_error(index, e))?;

        Ok(Some(text))
    }
}
