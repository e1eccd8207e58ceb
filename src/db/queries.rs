//! SQL text for the SMS store.
//!
//! CHANGELOG:
//! - 10/16/2026 - Optional trailing LIMIT placeholder
//! - 02/04/2026 - SELECT assembly with identifier checks
//! - 02/03/2026 - Initial table DDL

use crate::error::{EngineError, Result};
use crate::store::SMS_CONTENT_URI;

/// Table backing `content://sms`.
pub const SMS_TABLE: &str = "sms";

/// Schema of the SMS table. Fixtures and demo databases only; the engine
/// never migrates a live store.
pub const CREATE_SMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sms (
    _id INTEGER PRIMARY KEY,
    address TEXT,
    body TEXT,
    date INTEGER NOT NULL,
    type INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS sms_date_idx ON sms (date DESC);
"#;

/// Insert one message. Parameters: ?1 = _id, ?2 = address, ?3 = body, ?4 = date, ?5 = type
pub const INSERT_SMS: &str = r#"
INSERT INTO sms (_id, address, body, date, type)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

/// Map a content URI to its table.
pub fn table_for_uri(uri: &str) -> Option<&'static str> {
    match uri.trim_end_matches('/') {
        SMS_CONTENT_URI => Some(SMS_TABLE),
        _ => None,
    }
}

/// Assemble a SELECT. Column and sort identifiers are checked; the predicate
/// is passed through with its `?` placeholders intact. `limited` appends a
/// trailing `LIMIT ?`, bound after the predicate arguments.
pub fn select_sql(
    table: &str,
    projection: &[&str],
    predicate: Option<&str>,
    sort: &str,
    limited: bool,
) -> Result<String> {
    if projection.is_empty() {
        return Err(EngineError::StoreUnavailable("empty projection".into()));
    }
    for column in projection {
        check_identifier(column)?;
    }
    check_sort(sort)?;

    let mut sql = format!("SELECT {} FROM {}", projection.join(", "), table);
    if let Some(predicate) = predicate.filter(|p| !p.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    if !sort.trim().is_empty() {
        sql.push_str(" ORDER BY ");
        sql.push_str(sort);
    }
    if limited {
        sql.push_str(" LIMIT ?");
    }
    Ok(sql)
}

fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EngineError::StoreUnavailable(format!(
            "Invalid column: {:?}",
            name
        )))
    }
}

/// Accepts `col [ASC|DESC]` terms separated by commas.
fn check_sort(sort: &str) -> Result<()> {
    if sort.trim().is_empty() {
        return Ok(());
    }
    for term in sort.split(',') {
        let mut parts = term.split_whitespace();
        let column = parts.next().unwrap_or("");
        check_identifier(column)?;
        match parts.next() {
            None => {}
            Some(dir) if dir.eq_ignore_ascii_case("ASC") || dir.eq_ignore_ascii_case("DESC") => {}
            Some(other) => {
                return Err(EngineError::StoreUnavailable(format!(
                    "Invalid sort direction: {:?}",
                    other
                )))
            }
        }
        if parts.next().is_some() {
            return Err(EngineError::StoreUnavailable(format!(
                "Invalid sort term: {:?}",
                term
            )));
        }
    }
    Ok(())
}
