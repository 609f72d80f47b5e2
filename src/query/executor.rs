//! One-shot statement execution.
//!
//! Runs a statement through a `DatabaseClient`, renders the outcome and
//! releases it, independently of how the statement text was obtained.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn};

use crate::db::DatabaseClient;
use crate::error::Result;

/// Query executor that runs statements to completion.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Executes `sql`, renders its outcome and releases it.
    ///
    /// Execution failures are returned. Failures while reading or releasing
    /// the result have already been logged and are reflected in the report.
    pub async fn run(&self, sql: &str) -> Result<ExecutionReport> {
        let span = info_span!("statement", sql = %sql);

        let start = Instant::now();
        let outcome = self.db.execute(sql).await?;
        let execution_time = start.elapsed();

        let mut outcome = outcome.with_span(span);
        let is_query = outcome.is_query();
        let rendered = outcome.render();
        let released = outcome.close().is_ok();

        debug!(
            "Statement finished in {:?} (query: {}, released: {})",
            execution_time, is_query, released
        );

        Ok(ExecutionReport {
            rendered,
            is_query,
            execution_time,
            released,
        })
    }

    /// Runs statements read one per line from `input`, writing each
    /// rendering (or error) to `output` followed by a blank line.
    ///
    /// Blank lines and `--` comments are skipped; `exit` or `quit` stops.
    /// Returns the number of statements that failed.
    pub async fn run_script<R: BufRead, W: Write>(
        &self,
        input: R,
        output: &mut W,
    ) -> Result<usize> {
        let mut failures = 0;

        for line in input.lines() {
            let line = line?;
            let sql = line.trim();
            if sql.is_empty() || sql.starts_with("--") {
                continue;
            }
            if sql.eq_ignore_ascii_case("exit") || sql.eq_ignore_ascii_case("quit") {
                break;
            }

            match self.run(sql).await {
                Ok(ExecutionReport {
                    rendered: Some(text),
                    ..
                }) => writeln!(output, "{text}\n")?,
                Ok(_) => {
                    failures += 1;
                    writeln!(output, "Result could not be read.\n")?;
                }
                Err(e) => {
                    failures += 1;
                    warn!("{}", e);
                    writeln!(output, "{e}\n")?;
                }
            }
        }

        output.flush()?;
        Ok(failures)
    }
}

/// Result of running one statement to completion.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// The rendering, or `None` if the result could not be read.
    pub rendered: Option<String>,
    /// Whether the statement produced a row set.
    pub is_query: bool,
    /// How long the statement took to execute.
    pub execution_time: Duration,
    /// Whether the statement's resources were released cleanly.
    pub released: bool,
}
