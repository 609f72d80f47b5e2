//! Logging behavior of the statement result formatter.
//!
//! Each test installs its own scoped subscriber, so nothing here touches
//! process-wide logging state.

use db_stmt::db::{EventLog, MockRowSet, MockStatement};
use db_stmt::query::StatementOutcome;

use super::common::with_captured_logs;

fn outcome_with(rows: MockRowSet) -> StatementOutcome {
    let log = EventLog::new();
    StatementOutcome::query(
        Box::new(MockStatement::new(log.clone())),
        Box::new(rows.with_log(log)),
    )
}

#[test]
fn test_close_logs_each_release_in_order() {
    let (result, logs) = with_captured_logs(|| {
        outcome_with(MockRowSet::from_text(&["id"], &[&["1"]])).close()
    });

    assert!(result.is_ok());
    let row_set = logs.find("Row set closed.").expect("row set release logged");
    let statement = logs
        .find("Statement closed.")
        .expect("statement release logged");
    assert!(row_set < statement);
    assert!(logs.contains("INFO"));
}

#[test]
fn test_failed_render_logs_warning() {
    let (rendered, logs) = with_captured_logs(|| {
        let rows = MockRowSet::from_text(&["id"], &[&["1"], &["2"]]).fail_on_row(1);
        let mut outcome = outcome_with(rows);
        let rendered = outcome.render();
        let _ = outcome.close();
        rendered
    });

    assert_eq!(rendered, None);
    assert!(logs.contains("WARN"));
    assert!(logs.contains("connection lost fetching row 1"));
}

#[test]
fn test_failed_release_logs_warning_and_continues() {
    let (result, logs) = with_captured_logs(|| {
        outcome_with(MockRowSet::from_text(&["id"], &[]).fail_on_close()).close()
    });

    assert!(result.is_err());
    assert!(logs.contains("row set close failed"));
    assert!(logs.contains("Statement closed."));
    assert!(!logs.contains("Row set closed."));
}

#[test]
fn test_events_recorded_in_injected_span() {
    let (_, logs) = with_captured_logs(|| {
        let span = tracing::info_span!("statement", id = 7);
        outcome_with(MockRowSet::from_text(&["id"], &[]))
            .with_span(span)
            .close()
    });

    assert!(logs.contains("statement{id=7}"));
    assert!(logs.contains("Statement closed."));
}

#[test]
fn test_events_recorded_in_span_current_at_construction() {
    let (_, logs) = with_captured_logs(|| {
        let span = tracing::info_span!("request", request_id = 42);
        let outcome = span.in_scope(|| outcome_with(MockRowSet::from_text(&["id"], &[])));
        outcome.close()
    });

    assert!(logs.contains("request{request_id=42}"));
}
