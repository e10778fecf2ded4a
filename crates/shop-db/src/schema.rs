//! # Schema Registry
//!
//! The fixed, code-defined vocabulary of table and column names used in
//! dynamically assembled SQL. Every identifier that ever reaches a query
//! string comes from the constants in this module; caller input is only
//! ever bound as a parameter.
//!
//! The schema itself (DDL, constraints, foreign-key actions) lives in
//! `migrations/sqlite/` and is treated as a versioned contract enforced
//! by the storage engine.

/// Static description of one table in the schema contract.
#[derive(Debug, Clone, Copy)]
pub struct TableDef {
    /// Table name as it appears in the schema.
    pub name: &'static str,

    /// Primary key column (integer, engine-assigned).
    pub primary_key: &'static str,

    /// Columns accepted for row import. The primary key and derived
    /// columns are deliberately absent.
    pub insert_columns: &'static [&'static str],
}

/// All tables of the schema contract, in dependency order.
///
/// This doubles as the whitelist for `truncate`, row import/export, and
/// the per-table row counts in [`crate::maintenance`].
pub const TABLES: &[TableDef] = &[
    TableDef {
        name: "categories",
        primary_key: "category_id",
        insert_columns: &["name", "description", "created_at"],
    },
    TableDef {
        name: "products",
        primary_key: "product_id",
        insert_columns: &[
            "name",
            "description",
            "price",
            "stock_quantity",
            "category_id",
            "created_at",
        ],
    },
    TableDef {
        name: "customers",
        primary_key: "customer_id",
        insert_columns: &[
            "first_name",
            "last_name",
            "email",
            "phone",
            "registration_date",
        ],
    },
    TableDef {
        name: "orders",
        primary_key: "order_id",
        insert_columns: &["customer_id", "order_date", "total_amount", "status"],
    },
    TableDef {
        name: "order_items",
        primary_key: "order_item_id",
        // subtotal is generated; it can never be written.
        insert_columns: &["order_id", "product_id", "quantity", "unit_price"],
    },
];

/// Looks up a table definition by name. `None` for anything outside the
/// whitelist.
pub fn table(name: &str) -> Option<&'static TableDef> {
    TABLES.iter().find(|t| t.name == name)
}

// =============================================================================
// Mutable-Column Whitelists
// =============================================================================
// The closed sets of columns an `update(id, fields)` call may touch.
// Keys outside the set are silently dropped at the boundary; SQL SET
// fragments are built from these constants only.

pub const CATEGORY_MUTABLE: &[&str] = &["name", "description"];

pub const PRODUCT_MUTABLE: &[&str] = &[
    "name",
    "description",
    "price",
    "stock_quantity",
    "category_id",
];

pub const CUSTOMER_MUTABLE: &[&str] = &["first_name", "last_name", "email", "phone"];

pub const ORDER_MUTABLE: &[&str] = &["status", "total_amount"];

pub const ORDER_ITEM_MUTABLE: &[&str] = &["quantity", "unit_price"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookup() {
        assert!(table("orders").is_some());
        assert!(table("order_items").is_some());
        assert!(table("sqlite_sequence").is_none());
        assert!(table("not_a_table").is_none());
    }

    #[test]
    fn test_generated_and_key_columns_not_insertable() {
        for t in TABLES {
            assert!(!t.insert_columns.contains(&t.primary_key));
        }
        let items = table("order_items").unwrap();
        assert!(!items.insert_columns.contains(&"subtotal"));
    }
}
