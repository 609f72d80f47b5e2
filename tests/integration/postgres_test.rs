//! PostgreSQL integration tests.
//!
//! These tests require a running PostgreSQL database and are skipped unless
//! DATABASE_URL is set.

use db_stmt::config::ConnectionConfig;
use db_stmt::db::{DatabaseClient, PostgresClient};
use db_stmt::error::StmtError;
use db_stmt::query::QueryExecutor;

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    PostgresClient::connect(&config).await.ok()
}

#[tokio::test]
async fn test_values_select_renders_rows() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let executor = QueryExecutor::new(&client);
    let report = executor
        .run(
            "SELECT * FROM (VALUES (1, 'Ann'), (2, 'Bo')) AS people(id, name) ORDER BY id",
        )
        .await
        .unwrap();

    assert!(report.is_query);
    assert_eq!(report.rendered.unwrap(), "[id][name]\n[1][Ann]\n[2][Bo]");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_typed_columns_render_as_text() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let mut outcome = client
        .execute(
            "SELECT true AS flag, 7::int2 AS small, 9000000000::int8 AS big, \
             1.5::float8 AS ratio, '\\xdead'::bytea AS raw, 'x'::varchar AS label",
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.render().unwrap(),
        "[flag][small][big][ratio][raw][label]\n[t][7][9000000000][1.5][\\xdead][x]"
    );
    outcome.close().unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_server_text_form_for_common_types() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let report = QueryExecutor::new(&client)
        .run(
            "SELECT 2.50::numeric AS price, DATE '2024-01-02' AS day, \
             'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid AS id, \
             TIMESTAMPTZ '2024-01-02 03:04:05+00' AS at, \
             (SELECT avg(x) FROM (VALUES (1), (2)) AS t(x)) AS mean",
        )
        .await
        .unwrap();

    assert_eq!(
        report.rendered.unwrap(),
        "[price][day][id][at][mean]\n\
         [2.50][2024-01-02][a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11]\
         [2024-01-02 03:04:05+00][1.5000000000000000]"
    );
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_ddl_reports_rows_affected() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let report = QueryExecutor::new(&client)
        .run("CREATE TEMP TABLE IF NOT EXISTS db_stmt_scratch (id int)")
        .await
        .unwrap();

    assert!(!report.is_query);
    assert_eq!(report.rendered.unwrap(), "0 row(s) affected.");
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_error_carries_database_message() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = QueryExecutor::new(&client)
        .run("SELECT * FROM nonexistent_table_xyz")
        .await
        .unwrap_err();

    assert!(matches!(err, StmtError::Query(_)));
    assert!(err.to_string().contains("ERROR: "));
    client.close().await.unwrap();
}
