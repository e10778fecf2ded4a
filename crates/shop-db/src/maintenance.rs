//! # Maintenance Operations
//!
//! Table administration and engine housekeeping: whitelisted truncate
//! with sequence reset, ANALYZE/VACUUM, and storage statistics.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::schema;

// =============================================================================
// Statistics Types
// =============================================================================

/// Row count for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

/// One index as defined in the schema. `definition` is `None` for
/// indexes the engine created implicitly (UNIQUE constraints).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct IndexInfo {
    pub name: String,
    pub definition: Option<String>,
}

/// Storage statistics for monitoring.
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    /// Total storage size in bytes (page count × page size).
    pub database_size: i64,

    /// Row counts for every table of the schema contract.
    pub table_counts: Vec<TableCount>,

    /// Defined indexes (name + definition).
    pub indexes: Vec<IndexInfo>,
}

// =============================================================================
// Maintenance Operations
// =============================================================================

impl Database {
    /// Empties a whitelisted table and resets its identifier sequence,
    /// in one atomic unit: after truncation the next insert starts from
    /// the initial identifier again.
    ///
    /// Any name outside the fixed whitelist is refused before any SQL
    /// is issued. Deletes cascade per the schema's foreign-key actions,
    /// so truncating `orders` also clears its items - but truncating
    /// `products` fails while order items reference them (RESTRICT),
    /// rolling back cleanly.
    pub async fn truncate(&self, table: &str) -> DbResult<()> {
        let def = schema::table(table).ok_or_else(|| {
            warn!(table, "refused truncate of non-whitelisted table");
            DbError::TableNotAllowed(table.to_string())
        })?;

        let mut unit = self.begin().await?;

        if let Err(e) = sqlx::query(&format!("DELETE FROM {}", def.name))
            .execute(unit.conn())
            .await
        {
            let err = DbError::from(e);
            warn!(table, error = %err, "truncate failed");
            return Err(unit.abort(err).await);
        }

        // The sequence bookkeeping table only exists once an
        // AUTOINCREMENT insert has happened somewhere.
        let has_sequence: Option<i64> = match sqlx::query_scalar(
            "SELECT 1 FROM sqlite_master WHERE name = 'sqlite_sequence'",
        )
        .fetch_optional(unit.conn())
        .await
        {
            Ok(found) => found,
            Err(e) => return Err(unit.abort(DbError::from(e)).await),
        };

        if has_sequence.is_some() {
            if let Err(e) = sqlx::query("DELETE FROM sqlite_sequence WHERE name = ?")
                .bind(def.name)
                .execute(unit.conn())
                .await
            {
                return Err(unit.abort(DbError::from(e)).await);
            }
        }

        unit.commit().await?;
        info!(table, "truncated table");
        Ok(())
    }

    /// Rebuilds statistics and reclaims space: `ANALYZE` then `VACUUM`.
    /// VACUUM runs outside any transaction (the engine refuses it
    /// otherwise).
    pub async fn optimize(&self) -> DbResult<()> {
        sqlx::query("ANALYZE").execute(self.pool()).await?;
        sqlx::query("VACUUM").execute(self.pool()).await?;

        info!("database optimized");
        Ok(())
    }

    /// Collects storage statistics: total size, per-table row counts,
    /// and the defined indexes.
    pub async fn stats(&self) -> DbResult<DbStats> {
        let database_size: i64 = sqlx::query_scalar(
            "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
        )
        .fetch_one(self.pool())
        .await?;

        let mut table_counts = Vec::with_capacity(schema::TABLES.len());
        for def in schema::TABLES {
            let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", def.name))
                .fetch_one(self.pool())
                .await?;
            table_counts.push(TableCount {
                table: def.name.to_string(),
                rows,
            });
        }

        let indexes = sqlx::query_as::<_, IndexInfo>(
            "SELECT name, sql AS definition FROM sqlite_master \
             WHERE type = 'index' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(self.pool())
        .await?;

        info!(
            database_size,
            indexes = indexes.len(),
            "collected database stats"
        );
        Ok(DbStats {
            database_size,
            table_counts,
            indexes,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{place_order, seed_catalog, test_db};
    use shop_core::NewOrder;

    #[tokio::test]
    async fn test_truncate_resets_identifier_sequence() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let first = db.orders().create(&NewOrder::new(fx.alice)).await.unwrap();
        db.orders().create(&NewOrder::new(fx.bob)).await.unwrap();

        db.truncate("orders").await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);

        // The sequence restarted: the next order reuses the first id.
        let next = db.orders().create(&NewOrder::new(fx.alice)).await.unwrap();
        assert_eq!(next, first);
    }

    #[tokio::test]
    async fn test_truncate_orders_cascades_to_items() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;
        place_order(&db, fx.alice, &[(fx.novel, 1, 12.99)]).await;

        db.truncate("orders").await.unwrap();

        let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(items, 0);
    }

    #[tokio::test]
    async fn test_truncate_rejects_unknown_table_untouched() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db.truncate("not_a_table").await.unwrap_err();
        assert!(matches!(err, DbError::TableNotAllowed(_)));

        // Nothing was modified.
        assert_eq!(db.products().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_truncate_referenced_products_rolls_back() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;
        place_order(&db, fx.alice, &[(fx.novel, 1, 12.99)]).await;

        // RESTRICT on order_items.product_id makes this fail; the
        // delete must roll back rather than half-apply.
        let err = db.truncate("products").await.unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(db.products().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_stats_and_optimize() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let stats = db.stats().await.unwrap();
        assert!(stats.database_size > 0);

        let products = stats
            .table_counts
            .iter()
            .find(|t| t.table == "products")
            .unwrap();
        assert_eq!(products.rows, 4);

        // The migration-defined indexes are all reported.
        let names: Vec<&str> = stats.indexes.iter().map(|i| i.name.as_str()).collect();
        assert!(names.contains(&"idx_products_category"));
        assert!(names.contains(&"idx_order_items_product"));

        db.optimize().await.unwrap();
        assert!(db.health_check().await);
    }
}
