//! # Row-Sequence Boundary
//!
//! The interface import/export collaborators speak: ordered sequences
//! of field→value mappings. CSV/JSON readers hand bulk inserts in as
//! row sequences; any read can be handed out as one for CSV/JSON
//! writers. The files themselves are someone else's problem.
//!
//! ## Boundary Types
//! ```text
//! identifier  → integer          timestamp → ISO-8601 string
//! text        → string           enum      → string
//! decimal     → number           missing   → null
//! ```
//!
//! Imports honor the same whitelists as everything else: the table
//! name and every column name in generated SQL come from the schema
//! registry, never from row keys.

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::{error, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::query::bind_value;
use crate::schema;

/// One record at the import/export boundary: field name → value.
pub type Row = serde_json::Map<String, Value>;

impl Database {
    /// Bulk-inserts a row sequence into a whitelisted table, inside one
    /// atomic unit.
    ///
    /// Row keys are projected onto the table's insertable columns;
    /// unknown keys are ignored. A row the engine rejects (constraint,
    /// malformed value) is logged and skipped - the rest of the import
    /// still commits. A storage-level failure rolls the whole import
    /// back.
    ///
    /// ## Returns
    /// Count of rows actually inserted.
    pub async fn import_rows(&self, table: &str, rows: &[Row]) -> DbResult<u64> {
        let def = schema::table(table).ok_or_else(|| {
            warn!(table, "refused import into non-whitelisted table");
            DbError::TableNotAllowed(table.to_string())
        })?;

        let mut unit = self.begin().await?;
        let mut inserted = 0u64;

        for (index, row) in rows.iter().enumerate() {
            let mut columns: Vec<&'static str> = Vec::new();
            let mut values: Vec<&Value> = Vec::new();
            for &column in def.insert_columns {
                if let Some(value) = row.get(column) {
                    columns.push(column);
                    values.push(value);
                }
            }

            if columns.is_empty() {
                warn!(index, "skipping row with no recognized columns");
                continue;
            }

            let placeholders = vec!["?"; columns.len()].join(", ");
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                def.name,
                columns.join(", "),
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for value in values {
                query = bind_value(query, value);
            }

            match query.execute(unit.conn()).await {
                Ok(_) => inserted += 1,
                Err(e) => {
                    let err = DbError::from(e);
                    if err.is_constraint() || matches!(err, DbError::QueryFailed(_)) {
                        warn!(index, error = %err, "skipping row rejected by the engine");
                    } else {
                        error!(index, error = %err, "import aborted");
                        return Err(unit.abort(err).await);
                    }
                }
            }
        }

        unit.commit().await?;
        info!(table, inserted, skipped = rows.len() as u64 - inserted, "imported rows");
        Ok(inserted)
    }

    /// Reads a whitelisted table as a row sequence, ordered by primary
    /// key. Timestamps come out as the ISO-8601 strings they are stored
    /// as; derived columns (an item's subtotal) are included.
    pub async fn export_rows(&self, table: &str) -> DbResult<Vec<Row>> {
        let def = schema::table(table).ok_or_else(|| {
            warn!(table, "refused export of non-whitelisted table");
            DbError::TableNotAllowed(table.to_string())
        })?;

        let sql = format!("SELECT * FROM {} ORDER BY {}", def.name, def.primary_key);
        let db_rows = sqlx::query(&sql).fetch_all(self.pool()).await?;

        let mut rows = Vec::with_capacity(db_rows.len());
        for db_row in &db_rows {
            rows.push(decode_row(db_row)?);
        }

        info!(table, count = rows.len(), "exported rows");
        Ok(rows)
    }
}

/// Decodes one SQLite row into a field→value map using the values'
/// runtime storage classes.
fn decode_row(db_row: &SqliteRow) -> DbResult<Row> {
    let mut row = Row::new();
    for column in db_row.columns() {
        let ordinal = column.ordinal();
        let raw = db_row.try_get_raw(ordinal).map_err(DbError::from)?;

        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::from(db_row.try_get::<i64, _>(ordinal)?),
                "REAL" | "NUMERIC" => {
                    let number = db_row.try_get::<f64, _>(ordinal)?;
                    serde_json::Number::from_f64(number)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
                "TEXT" | "DATETIME" | "DATE" | "TIME" => {
                    Value::String(db_row.try_get::<String, _>(ordinal)?)
                }
                other => {
                    warn!(column = column.name(), kind = other, "unsupported column type; exporting null");
                    Value::Null
                }
            }
        };

        row.insert(column.name().to_string(), value);
    }
    Ok(row)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_catalog, test_db};
    use serde_json::json;

    fn product_row(name: &str, price: f64, category: i64) -> Row {
        let mut row = Row::new();
        row.insert("name".to_string(), json!(name));
        row.insert("price".to_string(), json!(price));
        row.insert("stock_quantity".to_string(), json!(3));
        row.insert("category_id".to_string(), json!(category));
        row.insert("supplier".to_string(), json!("ignored key"));
        row
    }

    #[tokio::test]
    async fn test_import_rows_skips_bad_rows_and_commits_rest() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let rows = vec![
            product_row("Kettle", 39.90, fx.electronics),
            product_row("Ghost", 5.0, 9999), // FK rejection: skipped
            product_row("Toaster", 24.50, fx.electronics),
        ];
        let inserted = db.import_rows("products", &rows).await.unwrap();
        assert_eq!(inserted, 2);

        assert_eq!(db.products().count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_import_rows_rejects_unknown_table() {
        let db = test_db().await;

        let err = db
            .import_rows("sqlite_master", &[Row::new()])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TableNotAllowed(_)));
    }

    #[tokio::test]
    async fn test_export_rows_round_trip() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let rows = db.export_rows("products").await.unwrap();
        assert_eq!(rows.len(), 4);

        // Ordered by primary key; first seeded product first.
        assert_eq!(rows[0]["product_id"], json!(fx.laptop));
        assert_eq!(rows[0]["name"], json!("Laptop"));
        assert_eq!(rows[0]["price"], json!(999.99));
        // Timestamps exported as the stored ISO-8601 text.
        assert!(rows[0]["created_at"].is_string());
        // Nullable columns survive as nulls.
        assert_eq!(rows[0]["description"], Value::Null);
    }

    #[tokio::test]
    async fn test_export_includes_derived_subtotal() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let order = db
            .orders()
            .create(&shop_core::NewOrder::new(fx.alice))
            .await
            .unwrap();
        db.orders()
            .add_item(&shop_core::NewOrderItem::new(order, fx.novel, 4, 10.0))
            .await
            .unwrap();

        let rows = db.export_rows("order_items").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["subtotal"], json!(40.0));
    }

    #[tokio::test]
    async fn test_round_trip_import_of_exported_rows() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let exported = db.export_rows("categories").await.unwrap();

        // Into a fresh database: the registry strips the primary key,
        // so fresh ids are assigned.
        let other = test_db().await;
        let inserted = other.import_rows("categories", &exported).await.unwrap();
        assert_eq!(inserted, 2);

        let names: Vec<Row> = other.export_rows("categories").await.unwrap();
        assert_eq!(names[0]["name"], json!("Electronics"));
        assert_eq!(names[1]["name"], json!("Books"));
    }
}
