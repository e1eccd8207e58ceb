//! `ContentStore` over the SQLite SMS table.
//!
//! Works with either a hot connection (daemon) or a path opened per query
//! (CLI). Rows are fetched when the query runs, at most `limit` of them; the
//! returned cursor walks the buffer.
//!
//! CHANGELOG:
//! - 10/16/2026 - Bound LIMIT on queries; missing columns map to SchemaMismatch
//! - 02/04/2026 - Initial implementation

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};

use super::{connection, queries};
use crate::error::{EngineError, Result};
use crate::store::{BufferedCursor, CellValue, ContentStore, Cursor};

enum Source {
    Hot(Connection),
    Path(PathBuf),
}

/// SMS store backed by SQLite.
pub struct SqliteStore {
    source: Source,
}

impl SqliteStore {
    /// Wrap an open connection (kept for the life of the store).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            source: Source::Hot(conn),
        }
    }

    /// Open the database read-only now and keep the connection.
    pub fn open_hot(path: &Path) -> Result<Self> {
        connection::open_db(path).map(Self::from_connection)
    }

    /// Defer opening until each query. A missing database then surfaces as
    /// `StoreUnavailable` from the query, not from construction.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Path(path.into()),
        }
    }

    /// Create the SMS table on a writable connection.
    pub fn create_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(queries::CREATE_SMS_TABLE)?;
        Ok(())
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.source {
            Source::Hot(conn) => f(conn),
            Source::Path(path) => {
                let conn = connection::open_db(path)?;
                f(&conn)
            }
        }
    }
}

impl ContentStore for SqliteStore {
    fn query(
        &self,
        uri: &str,
        projection: &[&str],
        predicate: Option<&str>,
        args: &[String],
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Option<Box<dyn Cursor + '_>>> {
        let table = queries::table_for_uri(uri).ok_or_else(|| {
            EngineError::StoreUnavailable(format!("Unknown URI: {}", uri))
        })?;
        let sql = queries::select_sql(table, projection, predicate, sort, limit.is_some())?;
        tracing::debug!(%sql, args = ?args, ?limit, "running provider query");

        let cursor: Box<dyn Cursor + '_> =
            Box::new(self.with_connection(|conn| fetch(conn, &sql, args, limit))?);
        Ok(Some(cursor))
    }
}

fn fetch(
    conn: &Connection,
    sql: &str,
    args: &[String],
    limit: Option<u32>,
) -> Result<BufferedCursor> {
    let mut stmt = conn.prepare(sql).map_err(prepare_error)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    // Args bind as text so column affinity decides the comparison; LIMIT needs an integer.
    let mut bound: Vec<SqlValue> = args.iter().cloned().map(SqlValue::Text).collect();
    bound.extend(limit.map(|n| SqlValue::Integer(i64::from(n))));

    let mut rows = stmt.query(params_from_iter(bound))?;
    let mut buffered = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(to_cell(row.get_ref(i)?));
        }
        buffered.push(cells);
    }

    Ok(BufferedCursor::new(columns, buffered))
}

/// A column the table lacks is a schema problem, not an unavailable store.
fn prepare_error(err: rusqlite::Error) -> EngineError {
    if let rusqlite::Error::SqliteFailure(_, Some(msg)) = &err {
        if msg.starts_with("no such column") {
            return EngineError::SchemaMismatch(msg.clone());
        }
    }
    err.into()
}

fn to_cell(value: ValueRef<'_>) -> CellValue {
    match value {
        ValueRef::Null => CellValue::Null,
        ValueRef::Integer(i) => CellValue::Integer(i),
        ValueRef::Real(f) => CellValue::Real(f),
        ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => CellValue::Blob(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{PROJECTION, SORT_DATE_DESC};
    use crate::store::SMS_CONTENT_URI;
    use rusqlite::params;

    fn seeded() -> SqliteStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteStore::create_schema(&conn).unwrap();
        let rows: [(i64, Option<&str>, Option<&str>, i64, i32); 3] = [
            (1, Some("+15550001"), Some("first"), 100, 1),
            (2, None, Some("no sender"), 300, 1),
            (3, Some("+15550002"), None, 200, 2),
        ];
        for (id, address, body, date, kind) in rows {
            conn.execute(queries::INSERT_SMS, params![id, address, body, date, kind])
                .unwrap();
        }
        SqliteStore::from_connection(conn)
    }

    #[test]
    fn test_query_all_sorted() {
        let store = seeded();
        let mut cursor = store
            .query(SMS_CONTENT_URI, &PROJECTION, None, &[], SORT_DATE_DESC, None)
            .unwrap()
            .unwrap();
        let mut dates = Vec::new();
        if cursor.move_to_first() {
            loop {
                dates.push(cursor.get_long("date").unwrap());
                if !cursor.move_to_next() {
                    break;
                }
            }
        }
        cursor.close();
        assert_eq!(dates, vec![300, 200, 100]);
    }

    #[test]
    fn test_string_args_compare_numerically() {
        let store = seeded();
        let args = vec!["1".to_string(), "150".to_string()];
        let mut cursor = store
            .query(
                SMS_CONTENT_URI,
                &PROJECTION,
                Some("type = ? AND date >= ?"),
                &args,
                SORT_DATE_DESC,
                Some(10),
            )
            .unwrap()
            .unwrap();
        assert!(cursor.move_to_first());
        assert_eq!(cursor.get_string("_id").unwrap().as_deref(), Some("2"));
        assert_eq!(cursor.get_string("address").unwrap(), None);
        assert!(!cursor.move_to_next());
    }

    #[test]
    fn test_unknown_uri() {
        let store = seeded();
        let err = store
            .query("content://mms", &PROJECTION, None, &[], SORT_DATE_DESC, None)
            .err()
            .unwrap();
        assert_eq!(err.kind_code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_missing_column_in_table() {
        let store = seeded();
        let err = store
            .query(SMS_CONTENT_URI, &["_id", "thread_id"], None, &[], SORT_DATE_DESC, None)
            .err()
            .unwrap();
        assert_eq!(err.kind_code(), "SCHEMA_MISMATCH");
        assert!(err.diagnostic().contains("thread_id"));
    }

    #[test]
    fn test_lazy_path_surfaces_on_query() {
        let store = SqliteStore::at_path("/nonexistent/dir/sms.db");
        let err = store
            .query(SMS_CONTENT_URI, &PROJECTION, None, &[], SORT_DATE_DESC, None)
            .err()
            .unwrap();
        assert!(err.diagnostic().contains("Failed to open SMS database"));
    }

    #[test]
    fn test_limit_bounds_rows_read() {
        let conn = Connection::open_in_memory().unwrap();
        SqliteStore::create_schema(&conn).unwrap();
        for i in 0..500i64 {
            conn.execute(queries::INSERT_SMS, params![i, "+15550001", "x", i, 1 + i % 2])
                .unwrap();
        }

        let sql = queries::select_sql(queries::SMS_TABLE, &PROJECTION, None, SORT_DATE_DESC, true)
            .unwrap();
        assert_eq!(fetch(&conn, &sql, &[], Some(100)).unwrap().row_count(), 100);

        let sql = queries::select_sql(
            queries::SMS_TABLE,
            &PROJECTION,
            Some("type = ?"),
            SORT_DATE_DESC,
            true,
        )
        .unwrap();
        let cursor = fetch(&conn, &sql, &["2".to_string()], Some(3)).unwrap();
        assert_eq!(cursor.row_count(), 3);

        let store = SqliteStore::from_connection(conn);
        let mut cursor = store
            .query(SMS_CONTENT_URI, &PROJECTION, None, &[], SORT_DATE_DESC, Some(100))
            .unwrap()
            .unwrap();
        assert!(cursor.move_to_first());
        assert_eq!(cursor.get_long("date").unwrap(), 499);
        let mut walked = 1;
        while cursor.move_to_next() {
            walked += 1;
        }
        assert_eq!(walked, 100);

        let mut all = store
            .query(SMS_CONTENT_URI, &PROJECTION, None, &[], SORT_DATE_DESC, None)
            .unwrap()
            .unwrap();
        let mut walked = 0;
        if all.move_to_first() {
            walked += 1;
            while all.move_to_next() {
                walked += 1;
            }
        }
        assert_eq!(walked, 500);
    }
}
