//! Integration tests for db-stmt.

pub mod logging_test;
pub mod postgres_test;
pub mod sqlite_test;
