//! Store adapter contract: a URI-addressed provider that answers a
//! parameterized query with a forward-only, column-typed cursor.
//!
//! CHANGELOG:
//! - 10/16/2026 - query takes a row limit
//! - 02/04/2026 - Added BufferedCursor shared by providers
//! - 02/03/2026 - Initial traits

use crate::error::{EngineError, Result};

/// URI of the SMS table.
pub const SMS_CONTENT_URI: &str = "content://sms";

/// Forward-only row cursor. Columns are looked up by name; an unknown name is
/// a `SchemaMismatch`.
pub trait Cursor {
    /// Position on the first row. False when there are no rows.
    fn move_to_first(&mut self) -> bool;

    /// Advance one row. False once the rows are exhausted.
    fn move_to_next(&mut self) -> bool;

    /// Text value of a column. NULL reads as `None`; integers render as decimal text.
    fn get_string(&self, column: &str) -> Result<Option<String>>;

    /// 64-bit integer value of a column. NULL reads as 0.
    fn get_long(&self, column: &str) -> Result<i64>;

    /// 32-bit integer value of a column. NULL reads as 0.
    fn get_int(&self, column: &str) -> Result<i32>;

    /// Release the cursor. Calling it twice is harmless.
    fn close(&mut self);
}

/// A query-addressable row source.
pub trait ContentStore {
    /// Run a query. `Ok(None)` is a null cursor and means "no rows".
    /// `limit` bounds how many rows the provider produces; `None` is unbounded.
    fn query(
        &self,
        uri: &str,
        projection: &[&str],
        predicate: Option<&str>,
        args: &[String],
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Option<Box<dyn Cursor + '_>>>;
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn query(
        &self,
        uri: &str,
        projection: &[&str],
        predicate: Option<&str>,
        args: &[String],
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Option<Box<dyn Cursor + '_>>> {
        (**self).query(uri, projection, predicate, args, sort, limit)
    }
}

impl<S: ContentStore + ?Sized> ContentStore for Box<S> {
    fn query(
        &self,
        uri: &str,
        projection: &[&str],
        predicate: Option<&str>,
        args: &[String],
        sort: &str,
        limit: Option<u32>,
    ) -> Result<Option<Box<dyn Cursor + '_>>> {
        (**self).query(uri, projection, predicate, args, sort, limit)
    }
}

/// A single cell as held by [`BufferedCursor`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// Cursor over rows already fetched from the provider.
#[derive(Debug)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    position: Option<usize>,
    closed: bool,
}

impl BufferedCursor {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
            closed: false,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn cell(&self, column: &str) -> Result<&CellValue> {
        if self.closed {
            return Err(EngineError::StoreUnavailable("cursor is closed".into()));
        }
        let index = self
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                EngineError::SchemaMismatch(format!(
                    "column '{}' does not exist. Available columns: [{}]",
                    column,
                    self.columns.join(", ")
                ))
            })?;
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| {
                EngineError::StoreUnavailable(format!(
                    "cursor index out of bounds: {:?} of {}",
                    self.position,
                    self.rows.len()
                ))
            })?;
        row.get(index).ok_or_else(|| {
            EngineError::SchemaMismatch(format!("row is missing column '{}'", column))
        })
    }
}

impl Cursor for BufferedCursor {
    fn move_to_first(&mut self) -> bool {
        if self.closed || self.rows.is_empty() {
            return false;
        }
        self.position = Some(0);
        true
    }

    fn move_to_next(&mut self) -> bool {
        if self.closed {
            return false;
        }
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.rows.len());
            false
        }
    }

    fn get_string(&self, column: &str) -> Result<Option<String>> {
        Ok(match self.cell(column)? {
            CellValue::Null => None,
            CellValue::Integer(i) => Some(i.to_string()),
            CellValue::Real(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        })
    }

    fn get_long(&self, column: &str) -> Result<i64> {
        match self.cell(column)? {
            CellValue::Null => Ok(0),
            CellValue::Integer(i) => Ok(*i),
            CellValue::Real(f) => Ok(*f as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().map_err(|_| {
                EngineError::SchemaMismatch(format!(
                    "column '{}' holds non-numeric text {:?}",
                    column, s
                ))
            }),
            CellValue::Blob(_) => Err(EngineError::SchemaMismatch(format!(
                "column '{}' holds a blob, expected an integer",
                column
            ))),
        }
    }

    fn get_int(&self, column: &str) -> Result<i32> {
        // Truncates like a provider's getInt on a wide integer column.
        self.get_long(column).map(|v| v as i32)
    }

    fn close(&mut self) {
        self.closed = true;
        self.rows.clear();
    }
}
