//! Query building: `FilterDescriptor` -> parameterized provider query.
//!
//! User-supplied values only ever travel in `args`; the predicate text is
//! assembled from fixed clause templates.
//!
//! CHANGELOG:
//! - 02/03/2026 - Initial builder

use crate::filter::FilterDescriptor;

/// Columns requested from the store, in emission order.
pub const PROJECTION: [&str; 5] = ["_id", "address", "body", "date", "type"];

/// Most recent first.
pub const SORT_DATE_DESC: &str = "date DESC";

const TYPE_CLAUSE: &str = "type = ?";
const MIN_DATE_CLAUSE: &str = "date >= ?";
const MAX_DATE_CLAUSE: &str = "date <= ?";

/// A ready-to-run store query plus the row cap the serializer enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub projection: &'static [&'static str],
    /// `None` matches every row.
    pub predicate: Option<String>,
    pub args: Vec<String>,
    pub sort: &'static str,
    pub cap: u32,
}

/// Build the query for a descriptor. Clause order is fixed:
/// box, then minDate, then maxDate.
pub fn build(desc: &FilterDescriptor) -> QueryPlan {
    let mut clauses: Vec<&'static str> = Vec::with_capacity(3);
    let mut args: Vec<String> = Vec::with_capacity(3);

    if let Some(message_box) = desc.message_box() {
        clauses.push(TYPE_CLAUSE);
        args.push(message_box.type_code().to_string());
    }

    if let Some(min_date) = desc.min_date() {
        clauses.push(MIN_DATE_CLAUSE);
        args.push(min_date.to_string());
    }

    if let Some(max_date) = desc.max_date() {
        clauses.push(MAX_DATE_CLAUSE);
        args.push(max_date.to_string());
    }

    let predicate = if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    };

    QueryPlan {
        projection: &PROJECTION,
        predicate,
        args,
        sort: SORT_DATE_DESC,
        cap: desc.effective_max_count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{self, MessageBox};

    #[test]
    fn test_no_clauses_matches_all() {
        let plan = build(&FilterDescriptor::default());
        assert_eq!(plan.predicate, None);
        assert!(plan.args.is_empty());
        assert_eq!(plan.sort, "date DESC");
        assert_eq!(plan.cap, 100);
        assert_eq!(plan.projection, &["_id", "address", "body", "date", "type"]);
    }

    #[test]
    fn test_box_codes() {
        let inbox = build(&FilterDescriptor::default().with_box(MessageBox::Inbox));
        assert_eq!(inbox.predicate.as_deref(), Some("type = ?"));
        assert_eq!(inbox.args, vec!["1"]);

        let sent = build(&FilterDescriptor::default().with_box(MessageBox::Sent));
        assert_eq!(sent.args, vec!["2"]);
    }

    #[test]
    fn test_canonical_clause_order() {
        let desc = filter::parse(Some(
            r#"{"maxDate":300,"minDate":200,"box":"inbox","maxCount":2}"#,
        ))
        .unwrap();
        let plan = build(&desc);
        assert_eq!(
            plan.predicate.as_deref(),
            Some("type = ? AND date >= ? AND date <= ?")
        );
        assert_eq!(plan.args, vec!["1", "200", "300"]);
        assert_eq!(plan.cap, 2);
    }

    #[test]
    fn test_values_never_reach_predicate_text() {
        let desc = FilterDescriptor::default()
            .with_min_date(-9_223_372_036_854_775_808)
            .with_max_date(4_242_424_242);
        let plan = build(&desc);
        let predicate = plan.predicate.unwrap();
        assert!(!predicate.contains("4242"));
        assert!(!predicate.contains("9223"));
        assert_eq!(plan.args, vec!["-9223372036854775808", "4242424242"]);
    }
}
