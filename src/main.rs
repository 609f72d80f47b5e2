//! db-stmt - Execute a single SQL statement and render its outcome as text.

use std::io::{self, Write};

use db_stmt::cli::Cli;
use db_stmt::config::Config;
use db_stmt::error::{Result, StmtError};
use db_stmt::query::QueryExecutor;
use db_stmt::{db, logging};
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Runs the command. Returns false if a statement's result was not usable.
async fn run(cli: Cli) -> Result<bool> {
    // Credentials may live in a local .env file
    let _ = dotenvy::dotenv();

    let config_path = cli.config_path();
    let config = Config::load_from_file(&config_path)?;
    logging::init_stderr_logging(&config.logging.level);
    info!("Loaded config from: {}", config_path.display());

    let connection = cli.resolve_connection(&config)?.ok_or_else(|| {
        StmtError::config("No database connection configured. Use --help for usage information.")
    })?;
    info!("Connection: {}", connection.display_string());

    let client = db::connect(&connection).await?;
    let executor = QueryExecutor::new(client.as_ref());

    let succeeded = match cli.statement() {
        Some(sql) => {
            let report = executor.run(&sql).await;
            match report {
                Ok(report) => match report.rendered {
                    Some(text) => {
                        println!("{text}");
                        true
                    }
                    None => {
                        eprintln!("The statement ran but its result could not be read.");
                        false
                    }
                },
                Err(e) => {
                    client.close().await?;
                    return Err(e);
                }
            }
        }
        None => {
            let stdin = io::stdin();
            let mut stdout = io::stdout().lock();
            let failures = executor.run_script(stdin.lock(), &mut stdout).await?;
            stdout.flush()?;
            failures == 0
        }
    };

    client.close().await?;
    Ok(succeeded)
}
