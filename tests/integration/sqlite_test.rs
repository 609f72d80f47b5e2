//! SQLite integration tests.
//!
//! Runs statements end to end against a temporary database file.

use db_stmt::db::DatabaseClient;
use db_stmt::query::QueryExecutor;
use pretty_assertions::assert_eq;

use super::common::sqlite_client;

async fn seed(client: &dyn DatabaseClient) {
    let executor = QueryExecutor::new(client);
    for sql in [
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT)",
        "INSERT INTO users (id, name, email) VALUES (1, 'Ann', 'ann@example.com')",
        "INSERT INTO users (id, name, email) VALUES (2, 'Bo', NULL)",
    ] {
        let report = executor.run(sql).await.unwrap();
        assert!(report.released);
    }
}

#[tokio::test]
async fn test_select_renders_header_and_rows() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;

    let report = QueryExecutor::new(client.as_ref())
        .run("SELECT id, name FROM users ORDER BY id")
        .await
        .unwrap();

    assert!(report.is_query);
    assert!(report.released);
    assert_eq!(report.rendered.unwrap(), "[id][name]\n[1][Ann]\n[2][Bo]");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_null_renders_as_null() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;

    let report = QueryExecutor::new(client.as_ref())
        .run("SELECT email FROM users WHERE id = 2")
        .await
        .unwrap();

    assert_eq!(report.rendered.unwrap(), "[email]\n[null]");
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_labels_follow_aliases() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;

    let report = QueryExecutor::new(client.as_ref())
        .run("SELECT COUNT(*) AS total, MAX(id) AS newest FROM users")
        .await
        .unwrap();

    assert_eq!(report.rendered.unwrap(), "[total][newest]\n[2][2]");
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_empty_select_renders_header_only() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;

    let report = QueryExecutor::new(client.as_ref())
        .run("SELECT id, name FROM users WHERE id > 100")
        .await
        .unwrap();

    assert!(report.is_query);
    assert_eq!(report.rendered, Some("[id][name]".to_string()));
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_update_reports_rows_affected() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;
    let executor = QueryExecutor::new(client.as_ref());

    let report = executor
        .run("UPDATE users SET email = 'x@example.com'")
        .await
        .unwrap();
    assert!(!report.is_query);
    assert_eq!(report.rendered.unwrap(), "2 row(s) affected.");

    let report = executor
        .run("DELETE FROM users WHERE id = 99")
        .await
        .unwrap();
    assert_eq!(report.rendered.unwrap(), "0 row(s) affected.");

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_second_render_sees_exhausted_cursor() {
    let (_dir, client) = sqlite_client().await;
    seed(client.as_ref()).await;

    let mut outcome = client
        .execute("SELECT name FROM users ORDER BY id")
        .await
        .unwrap();

    assert_eq!(outcome.render().unwrap(), "[name]\n[Ann]\n[Bo]");
    assert_eq!(outcome.render().unwrap(), "[name]");
    outcome.close().unwrap();

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_row_set_reads_values_as_text() {
    let (_dir, client) = sqlite_client().await;

    let mut outcome = client
        .execute("SELECT 42 AS answer, 0.5 AS half, 'text' AS word, x'beef' AS raw")
        .await
        .unwrap();

    let rows = outcome.row_set_mut().unwrap();
    assert_eq!(rows.column_count().unwrap(), 4);
    assert_eq!(rows.column_label(3).unwrap(), "raw");
    assert!(rows.advance().unwrap());
    assert_eq!(rows.column_text(0).unwrap(), Some("42".to_string()));
    assert_eq!(rows.column_text(1).unwrap(), Some("0.5".to_string()));
    assert_eq!(rows.column_text(2).unwrap(), Some("text".to_string()));
    assert_eq!(rows.column_text(3).unwrap(), Some("\\xbeef".to_string()));
    assert!(!rows.advance().unwrap());

    outcome.close().unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_execution_error_is_returned() {
    let (_dir, client) = sqlite_client().await;

    let err = QueryExecutor::new(client.as_ref())
        .run("SELECT * FROM missing_table")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("missing_table"));
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_run_script_against_database() {
    let (_dir, client) = sqlite_client().await;
    let executor = QueryExecutor::new(client.as_ref());

    let script = "\
CREATE TABLE notes (body TEXT)
INSERT INTO notes VALUES ('first'), ('second')
-- read them back
SELECT body FROM notes ORDER BY rowid
SELECT nope FROM notes
";
    let mut output = Vec::new();
    let failures = executor
        .run_script(script.as_bytes(), &mut output)
        .await
        .unwrap();

    let output = String::from_utf8(output).unwrap();
    assert_eq!(failures, 1);
    assert!(output.starts_with(
        "0 row(s) affected.\n\n2 row(s) affected.\n\n[body]\n[first]\n[second]\n\n"
    ));
    assert!(output.contains("Query error"));

    client.close().await.unwrap();
}
