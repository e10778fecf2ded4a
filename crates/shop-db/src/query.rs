//! # Query Builder
//!
//! Translates structured filter and update inputs into parameterized
//! SQL fragments plus positional parameter sequences.
//!
//! ## Injection Discipline
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  caller input        code-defined constants                  │
//! │  ────────────        ──────────────────────                  │
//! │  filter VALUES  ──►  bound as ?-parameters                   │
//! │  update VALUES  ──►  bound as ?-parameters                   │
//! │  field NAMES    ──►  matched against closed whitelists;      │
//! │                      the whitelist constant (never the       │
//! │                      caller's string) lands in the SQL text  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The predicate vocabulary is a closed enum - Equals, Range, Contains -
//! so the set of SQL shapes this module can emit is enumerable.

use serde_json::{Map, Value};
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::SqliteArguments;
use sqlx::Sqlite;

// =============================================================================
// Predicates
// =============================================================================

/// One filter condition. Column names are `&'static str` on purpose:
/// they can only originate from code, never from caller input.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `column = ?`
    Equals {
        column: &'static str,
        value: Value,
    },

    /// `column >= ?` / `column <= ?`, both bounds inclusive and each
    /// optional.
    Range {
        column: &'static str,
        min: Option<Value>,
        max: Option<Value>,
    },

    /// Case-insensitive substring match over one or more columns,
    /// OR-combined: `(a LIKE ? OR b LIKE ?)`.
    Contains {
        columns: &'static [&'static str],
        needle: String,
    },
}

impl Predicate {
    /// Renders this predicate as a SQL fragment with `?` placeholders.
    /// Returns `None` for a degenerate predicate that constrains nothing
    /// (e.g. a `Range` with neither bound).
    fn to_sql(&self) -> Option<String> {
        match self {
            Predicate::Equals { column, .. } => Some(format!("{column} = ?")),
            Predicate::Range { column, min, max } => {
                let mut parts = Vec::with_capacity(2);
                if min.is_some() {
                    parts.push(format!("{column} >= ?"));
                }
                if max.is_some() {
                    parts.push(format!("{column} <= ?"));
                }
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" AND "))
                }
            }
            Predicate::Contains { columns, .. } => {
                let alternatives: Vec<String> =
                    columns.iter().map(|c| format!("{c} LIKE ?")).collect();
                Some(format!("({})", alternatives.join(" OR ")))
            }
        }
    }

    /// Appends this predicate's bind values, in placeholder order.
    fn collect_params(&self, out: &mut Vec<Value>) {
        match self {
            Predicate::Equals { value, .. } => out.push(value.clone()),
            Predicate::Range { min, max, .. } => {
                if let Some(v) = min {
                    out.push(v.clone());
                }
                if let Some(v) = max {
                    out.push(v.clone());
                }
            }
            Predicate::Contains { columns, needle } => {
                let pattern = Value::String(format!("%{needle}%"));
                for _ in columns.iter() {
                    out.push(pattern.clone());
                }
            }
        }
    }
}

// =============================================================================
// Product Filter
// =============================================================================

/// Columns of the product listing query, qualified with its alias.
const PRODUCT_CATEGORY_COL: &str = "p.category_id";
const PRODUCT_PRICE_COL: &str = "p.price";
const PRODUCT_SEARCH_COLS: &[&str] = &["p.name", "p.description"];

/// A structured filter over the product listing.
///
/// Predicates AND-combine; an empty filter selects the unconstrained
/// set. Built either through the typed methods or from a loose
/// key/value map via [`ProductFilter::from_map`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    predicates: Vec<Predicate>,
}

impl ProductFilter {
    pub fn new() -> Self {
        ProductFilter::default()
    }

    /// Restricts to one category.
    pub fn category(mut self, category_id: i64) -> Self {
        self.predicates.push(Predicate::Equals {
            column: PRODUCT_CATEGORY_COL,
            value: Value::from(category_id),
        });
        self
    }

    /// Inclusive lower price bound.
    pub fn min_price(mut self, min: f64) -> Self {
        self.predicates.push(Predicate::Range {
            column: PRODUCT_PRICE_COL,
            min: Some(Value::from(min)),
            max: None,
        });
        self
    }

    /// Inclusive upper price bound.
    pub fn max_price(mut self, max: f64) -> Self {
        self.predicates.push(Predicate::Range {
            column: PRODUCT_PRICE_COL,
            min: None,
            max: Some(Value::from(max)),
        });
        self
    }

    /// Case-insensitive substring search against name and description.
    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Contains {
            columns: PRODUCT_SEARCH_COLS,
            needle: needle.into(),
        });
        self
    }

    /// Builds a filter from a loose map, recognizing exactly
    /// `category_id`, `min_price`, `max_price`, and `search`.
    /// Unrecognized keys are ignored, not errors; recognized keys with
    /// values of the wrong shape are ignored the same way.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut filter = ProductFilter::new();
        for (key, value) in map {
            match key.as_str() {
                "category_id" => {
                    if let Some(id) = value.as_i64() {
                        filter = filter.category(id);
                    }
                }
                "min_price" => {
                    if let Some(p) = value.as_f64() {
                        filter = filter.min_price(p);
                    }
                }
                "max_price" => {
                    if let Some(p) = value.as_f64() {
                        filter = filter.max_price(p);
                    }
                }
                "search" => {
                    if let Some(s) = value.as_str() {
                        filter = filter.search(s);
                    }
                }
                _ => {}
            }
        }
        filter
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Renders ` AND <p1> AND <p2> ...` (prefixed so it appends to a
    /// `WHERE 1=1` base) plus the bind values in placeholder order.
    pub(crate) fn where_clause(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for predicate in &self.predicates {
            if let Some(fragment) = predicate.to_sql() {
                sql.push_str(" AND ");
                sql.push_str(&fragment);
                predicate.collect_params(&mut params);
            }
        }
        (sql, params)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// 1-based pagination window.
///
/// Listing queries order by creation time descending with a primary-key
/// tie-breaker, so a fixed dataset pages deterministically.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    page: u32,
    per_page: u32,
}

impl Page {
    /// Creates a pagination window. Zero values are clamped to 1.
    pub fn new(page: u32, per_page: u32) -> Self {
        Page {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Page {
    /// First page, ten rows - the listing default.
    fn default() -> Self {
        Page::new(1, 10)
    }
}

// =============================================================================
// Update Sets
// =============================================================================

/// The whitelisted portion of an `update(id, fields)` payload.
///
/// Built by matching caller keys against a closed per-entity column
/// whitelist; anything else is silently dropped. The SET fragment is
/// assembled from the whitelist's own `&'static str`s, so caller keys
/// never reach SQL text.
#[derive(Debug, Clone)]
pub struct UpdateSet {
    assignments: Vec<(&'static str, Value)>,
}

impl UpdateSet {
    pub fn from_map(whitelist: &'static [&'static str], fields: &Map<String, Value>) -> Self {
        let mut assignments = Vec::new();
        for (key, value) in fields {
            if let Some(column) = whitelist.iter().find(|c| **c == key.as_str()) {
                assignments.push((*column, value.clone()));
            }
        }
        UpdateSet { assignments }
    }

    /// True when no caller key survived the whitelist. The caller must
    /// report failure without touching the store.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// `name = ?, price = ?` - column names from the whitelist only.
    pub(crate) fn set_clause(&self) -> String {
        self.assignments
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn params(&self) -> impl Iterator<Item = &Value> {
        self.assignments.iter().map(|(_, value)| value)
    }
}

// =============================================================================
// Value Binding
// =============================================================================

/// Binds a dynamic JSON value with its natural SQLite type.
///
/// Strings bind as TEXT (not JSON-quoted), integers as INTEGER, other
/// numbers as REAL. Nested structures are stored as their JSON text,
/// mirroring how the import boundary flattens them.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

/// Same as [`bind_value`] for row-mapped queries.
pub(crate) fn bind_value_as<'q, O>(
    query: QueryAs<'q, Sqlite, O, SqliteArguments<'q>>,
    value: &'q Value,
) -> QueryAs<'q, Sqlite, O, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else {
                query.bind(n.as_f64())
            }
        }
        Value::String(s) => query.bind(s.as_str()),
        other => query.bind(other.to_string()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_filter_is_unconstrained() {
        let (sql, params) = ProductFilter::new().where_clause();
        assert_eq!(sql, "");
        assert!(params.is_empty());
    }

    #[test]
    fn test_filter_combines_with_and() {
        let filter = ProductFilter::new()
            .category(3)
            .min_price(5.0)
            .max_price(20.0)
            .search("coffee");
        let (sql, params) = filter.where_clause();

        assert_eq!(
            sql,
            " AND p.category_id = ? AND p.price >= ? AND p.price <= ? \
             AND (p.name LIKE ? OR p.description LIKE ?)"
        );
        assert_eq!(
            params,
            vec![
                json!(3),
                json!(5.0),
                json!(20.0),
                json!("%coffee%"),
                json!("%coffee%"),
            ]
        );
    }

    #[test]
    fn test_from_map_ignores_unrecognized_keys() {
        let filter = ProductFilter::from_map(&map(&[
            ("category_id", json!(2)),
            ("max_price", json!(9.99)),
            ("color", json!("red")),
            ("order_by", json!("price; DROP TABLE products")),
        ]));
        let (sql, params) = filter.where_clause();

        assert_eq!(sql, " AND p.category_id = ? AND p.price <= ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_from_map_ignores_wrongly_shaped_values() {
        let filter = ProductFilter::from_map(&map(&[
            ("category_id", json!("two")),
            ("search", json!(42)),
        ]));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(Page::new(1, 10).offset(), 0);
        assert_eq!(Page::new(2, 10).offset(), 10);
        assert_eq!(Page::new(3, 25).offset(), 50);
        // Zero page clamps to the first.
        assert_eq!(Page::new(0, 10).offset(), 0);
        assert_eq!(Page::default().limit(), 10);
    }

    #[test]
    fn test_update_set_whitelisting() {
        let set = UpdateSet::from_map(
            schema::PRODUCT_MUTABLE,
            &map(&[
                ("price", json!(12.5)),
                ("name", json!("Beans")),
                ("product_id", json!(999)),
                ("price = 0; --", json!(1)),
            ]),
        );

        assert_eq!(set.len(), 2);
        let clause = set.set_clause();
        assert!(clause.contains("price = ?"));
        assert!(clause.contains("name = ?"));
        assert!(!clause.contains("product_id"));
        assert!(!clause.contains("--"));
    }

    #[test]
    fn test_update_set_empty_when_nothing_whitelisted() {
        let set = UpdateSet::from_map(
            schema::ORDER_MUTABLE,
            &map(&[("order_id", json!(1)), ("order_date", json!("2026-01-01"))]),
        );
        assert!(set.is_empty());
    }
}
