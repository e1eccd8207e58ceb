//! End-to-end `list` behavior over SQLite-backed stores.

use rusqlite::{params, Connection};
use serde_json::Value;
use std::cell::RefCell;

use wolfies_sms::db::{connection, queries};
use wolfies_sms::{ListPayload, SmsEngine, SqliteStore};

/// `(date, type)` rows; ids and bodies are derived from the position.
fn store_with(rows: &[(i64, i32)]) -> SqliteStore {
    let conn = Connection::open_in_memory().unwrap();
    SqliteStore::create_schema(&conn).unwrap();
    for (i, (date, kind)) in rows.iter().enumerate() {
        conn.execute(
            queries::INSERT_SMS,
            params![i as i64 + 1, format!("+1555{:07}", i), format!("message {}", i), date, kind],
        )
        .unwrap();
    }
    SqliteStore::from_connection(conn)
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Success(u32, String),
    Failure(String),
}

/// Run `list` and record every continuation that fired.
fn list(engine: &SmsEngine<SqliteStore>, filter: Option<&str>) -> Vec<Outcome> {
    let fired = RefCell::new(Vec::new());
    engine.list(
        filter,
        |err| fired.borrow_mut().push(Outcome::Failure(err)),
        |count, body| fired.borrow_mut().push(Outcome::Success(count, body)),
    );
    fired.into_inner()
}

fn success(engine: &SmsEngine<SqliteStore>, filter: Option<&str>) -> (u32, Vec<Value>) {
    let mut outcomes = list(engine, filter);
    assert_eq!(outcomes.len(), 1, "exactly one continuation must fire");
    match outcomes.remove(0) {
        Outcome::Success(count, body) => {
            let rows: Vec<Value> = serde_json::from_str(&body).unwrap();
            assert_eq!(count as usize, rows.len());
            (count, rows)
        }
        Outcome::Failure(err) => panic!("unexpected failure: {}", err),
    }
}

fn dates(rows: &[Value]) -> Vec<i64> {
    rows.iter().map(|r| r["date"].as_i64().unwrap()).collect()
}

#[test]
fn test_default_cap_returns_newest_hundred() {
    let rows: Vec<(i64, i32)> = (0..250).map(|i| (1_000 + i * 7, 1 + (i % 2) as i32)).collect();
    let max_date = rows.iter().map(|r| r.0).max().unwrap();
    let engine = SmsEngine::new(store_with(&rows));

    let (count, body) = success(&engine, Some(""));
    assert_eq!(count, 100);
    assert_eq!(body.len(), 100);
    assert_eq!(body[0]["date"], max_date);

    let dates = dates(&body);
    assert!(dates.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_inbox_filter() {
    let engine = SmsEngine::new(store_with(&[(10, 1), (20, 2), (30, 1), (40, 2), (50, 1)]));
    let (count, body) = success(&engine, Some(r#"{"box":"inbox"}"#));
    assert_eq!(count, 3);
    assert!(body.iter().all(|r| r["type"] == 1));
}

#[test]
fn test_date_window_is_inclusive() {
    let engine = SmsEngine::new(store_with(&[(100, 1), (200, 1), (300, 2), (400, 1)]));
    let (count, body) = success(&engine, Some(r#"{"minDate":200,"maxDate":300}"#));
    assert_eq!(count, 2);
    assert_eq!(dates(&body), vec![300, 200]);
}

#[test]
fn test_max_count() {
    let rows: Vec<(i64, i32)> = (0..10).map(|i| (i * 100, 1)).collect();
    let engine = SmsEngine::new(store_with(&rows));
    let (count, body) = success(&engine, Some(r#"{"maxCount":3}"#));
    assert_eq!(count, 3);
    assert_eq!(dates(&body), vec![900, 800, 700]);
}

#[test]
fn test_bad_json_fires_failure_only() {
    let engine = SmsEngine::new(store_with(&[(1, 1)]));
    let outcomes = list(&engine, Some("{not json"));
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(&outcomes[0], Outcome::Failure(msg) if !msg.is_empty()));
}

#[test]
fn test_empty_store() {
    let engine = SmsEngine::new(store_with(&[]));
    assert_eq!(
        list(&engine, Some("")),
        vec![Outcome::Success(0, "[]".to_string())]
    );
    assert_eq!(
        list(&engine, None),
        vec![Outcome::Success(0, "[]".to_string())]
    );
}

#[test]
fn test_inverted_window_is_empty_not_error() {
    let engine = SmsEngine::new(store_with(&[(100, 1), (200, 1)]));
    let (count, _) = success(&engine, Some(r#"{"minDate":300,"maxDate":100}"#));
    assert_eq!(count, 0);
}

#[test]
fn test_row_fields_and_nulls() {
    let conn = Connection::open_in_memory().unwrap();
    SqliteStore::create_schema(&conn).unwrap();
    conn.execute(
        queries::INSERT_SMS,
        params![7, Option::<String>::None, Option::<String>::None, 123, 1],
    )
    .unwrap();
    let engine = SmsEngine::new(SqliteStore::from_connection(conn));

    let (_, body) = success(&engine, None);
    let row = body[0].as_object().unwrap();
    let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["_id", "address", "body", "date", "type"]);
    assert_eq!(row["_id"], "7");
    assert!(row["address"].is_null());
    assert!(row["body"].is_null());
    assert!(row["date"].is_number());
    assert!(row["type"].is_number());
}

#[test]
fn test_hostile_filter_values_stay_bound() {
    let engine = SmsEngine::new(store_with(&[(100, 1), (200, 2)]));

    // Unknown box values are ignored rather than reaching the query.
    let (count, _) = success(&engine, Some(r#"{"box":"inbox' OR 1=1 --"}"#));
    assert_eq!(count, 2);

    // Non-numeric dates never reach the store.
    let outcomes = list(&engine, Some(r#"{"minDate":"0; DROP TABLE sms"}"#));
    assert!(matches!(&outcomes[..], [Outcome::Failure(_)]));

    let (count, _) = success(&engine, None);
    assert_eq!(count, 2);
}

#[test]
fn test_file_backed_store_and_missing_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sms.db");

    let missing = SmsEngine::new(SqliteStore::at_path(&path));
    let outcomes = list(&missing, None);
    assert!(matches!(&outcomes[..], [Outcome::Failure(msg)] if msg.contains("Failed to open SMS database")));
    assert!(!connection::check_access(&path));

    {
        let conn = connection::open_db_writable(&path).unwrap();
        SqliteStore::create_schema(&conn).unwrap();
        conn.execute(queries::INSERT_SMS, params![1, "+1555", "hi", 42, 2])
            .unwrap();
    }
    assert!(connection::check_access(&path));

    let engine = SmsEngine::new(SqliteStore::at_path(&path));
    let ListPayload { count, messages } = engine.execute(Some(r#"{"box":"sent"}"#)).unwrap();
    assert_eq!(count, 1);
    assert!(messages.contains("\"body\":\"hi\""));
}

#[test]
fn test_table_missing_column_is_schema_mismatch() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE sms (_id INTEGER PRIMARY KEY, address TEXT, date INTEGER, type INTEGER);",
    )
    .unwrap();
    let engine = SmsEngine::new(SqliteStore::from_connection(conn));

    let err = engine.execute(None).unwrap_err();
    assert_eq!(err.kind_code(), "SCHEMA_MISMATCH");
    assert!(err.diagnostic().contains("body"));

    let outcomes = list(&engine, None);
    assert!(matches!(&outcomes[..], [Outcome::Failure(msg)] if msg.contains("no such column")));
}
