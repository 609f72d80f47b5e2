//! db-stmt - Execute a single SQL statement and render its outcome as text.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod query;
