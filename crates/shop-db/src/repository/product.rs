//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Filtered, paginated listing with the owning category's name
//! - CRUD with whitelist-driven updates
//! - Referenced-delete pre-check (products in orders are undeletable)
//! - Batch insert and bulk price update as atomic units
//!
//! ## Filtered Listing
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ProductFilter { category, price range, search }             │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  SELECT p.*, c.name AS category_name                         │
//! │  FROM products p LEFT JOIN categories c ...                  │
//! │  WHERE 1=1 [AND <predicate>]...                              │
//! │  ORDER BY p.created_at DESC, p.product_id DESC               │
//! │  LIMIT ? OFFSET ?                                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::query::{bind_value, bind_value_as, Page, ProductFilter, UpdateSet};
use crate::schema;
use crate::transaction::AtomicUnit;
use serde_json::{Map, Value};
use shop_core::validation::validate_new_product;
use shop_core::{NewProduct, Product};

/// One row of the product listing: the product plus its category's
/// name (null for detached products).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductListing {
    pub product_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: i64,
    pub category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub category_name: Option<String>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(id)` - engine-assigned identifier of the new row
    /// * `Err(DbError::Validation)` - a required field is missing
    /// * `Err(DbError::ForeignKeyViolation)` - category doesn't exist
    pub async fn create(&self, new: &NewProduct) -> DbResult<i64> {
        validate_new_product(new)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products (name, description, price, stock_quantity, category_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.stock_quantity)
        .bind(new.category_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, name = %new.name, "created product");
        Ok(id)
    }

    /// Gets a product by its id. `Ok(None)` when no row matches.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT product_id, name, description, price, stock_quantity, category_id, created_at \
             FROM products WHERE product_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products with filtering and pagination.
    ///
    /// Rows carry the owning category's name via LEFT JOIN, so detached
    /// products (category deleted) still appear. Ordered by creation
    /// time descending with a primary-key tie-breaker for deterministic
    /// paging.
    pub async fn list(&self, filter: &ProductFilter, page: Page) -> DbResult<Vec<ProductListing>> {
        let (where_sql, params) = filter.where_clause();

        let sql = format!(
            "SELECT p.product_id, p.name, p.description, p.price, p.stock_quantity, \
                    p.category_id, p.created_at, c.name AS category_name \
             FROM products p \
             LEFT JOIN categories c ON p.category_id = c.category_id \
             WHERE 1=1{where_sql} \
             ORDER BY p.created_at DESC, p.product_id DESC \
             LIMIT ? OFFSET ?"
        );

        let mut query = sqlx::query_as::<_, ProductListing>(&sql);
        for value in &params {
            query = bind_value_as(query, value);
        }
        let products = query
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "listed products");
        Ok(products)
    }

    /// Updates a product from a field map.
    ///
    /// Only the whitelisted mutable columns (name, description, price,
    /// stock_quantity, category_id) are honored; other keys are
    /// silently dropped. Field values are not revalidated here - the
    /// engine's CHECK constraints reject out-of-range values.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - target id doesn't exist (checked
    ///   before the write, not inferred from rows-affected)
    /// * `Err(DbError::EmptyUpdate)` - no whitelisted field in the map;
    ///   the store is not touched
    pub async fn update(&self, id: i64, fields: &Map<String, Value>) -> DbResult<()> {
        let set = UpdateSet::from_map(schema::PRODUCT_MUTABLE, fields);
        if set.is_empty() {
            warn!(id, "product update carried no recognized fields");
            return Err(DbError::EmptyUpdate {
                entity: "product",
                id,
            });
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE product_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            warn!(id, "product update target not found");
            return Err(DbError::not_found("product", id));
        }

        let sql = format!("UPDATE products SET {} WHERE product_id = ?", set.set_clause());
        let mut query = sqlx::query(&sql);
        for value in set.params() {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&self.pool).await?;

        info!(id, fields = set.len(), "updated product");
        Ok(())
    }

    /// Deletes a product, refusing while order items reference it.
    ///
    /// The referencing count is checked first so the caller gets a
    /// deliberate constraint error instead of a raw RESTRICT failure;
    /// the engine's foreign-key action remains as the backstop.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let referencing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if referencing > 0 {
            warn!(id, referencing, "refusing to delete referenced product");
            return Err(DbError::Referenced {
                entity: "product",
                id,
            });
        }

        let result = sqlx::query("DELETE FROM products WHERE product_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("product", id));
        }

        info!(id, "deleted product");
        Ok(())
    }

    /// Applies a percentage price increase to every product in a
    /// category: `price = ROUND(price * (1 + percent/100), 2)`.
    ///
    /// One statement, one atomic unit. Deliberately not idempotent -
    /// running it twice compounds.
    ///
    /// ## Returns
    /// Count of affected rows (0 when the category is empty).
    pub async fn bulk_update_prices(
        &self,
        category_id: i64,
        increase_percent: f64,
    ) -> DbResult<u64> {
        let mut unit = AtomicUnit::begin(&self.pool).await?;

        let result = sqlx::query(
            "UPDATE products \
             SET price = ROUND(price * (1 + ? / 100), 2) \
             WHERE category_id = ?",
        )
        .bind(increase_percent)
        .bind(category_id)
        .execute(unit.conn())
        .await;

        match result {
            Ok(r) => {
                unit.commit().await?;
                let affected = r.rows_affected();
                info!(category_id, increase_percent, affected, "bulk updated prices");
                Ok(affected)
            }
            Err(e) => {
                let err = DbError::from(e);
                warn!(category_id, error = %err, "bulk price update failed");
                Err(unit.abort(err).await)
            }
        }
    }

    /// Inserts a batch of products as one atomic unit.
    ///
    /// Any single failure - a payload failing validation or the engine
    /// rejecting an insert - rolls back every insertion in the batch;
    /// no partial commits are observable.
    ///
    /// ## Returns
    /// Engine-assigned identifiers, in input order.
    pub async fn batch_create(&self, batch: &[NewProduct]) -> DbResult<Vec<i64>> {
        let mut unit = AtomicUnit::begin(&self.pool).await?;
        let mut ids = Vec::with_capacity(batch.len());
        let now = Utc::now();

        for (index, new) in batch.iter().enumerate() {
            if let Err(e) = validate_new_product(new) {
                warn!(index, error = %e, "batch aborted by invalid product");
                return Err(unit.abort(e.into()).await);
            }

            let result = sqlx::query(
                "INSERT INTO products (name, description, price, stock_quantity, category_id, created_at) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&new.name)
            .bind(&new.description)
            .bind(new.price)
            .bind(new.stock_quantity)
            .bind(new.category_id)
            .bind(now)
            .execute(unit.conn())
            .await;

            match result {
                Ok(r) => ids.push(r.last_insert_rowid()),
                Err(e) => {
                    let err = DbError::from(e);
                    warn!(index, error = %err, "batch aborted by insert failure");
                    return Err(unit.abort(err).await);
                }
            }
        }

        unit.commit().await?;
        info!(count = ids.len(), "batch created products");
        Ok(ids)
    }

    /// Counts all products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_catalog, test_db};
    use serde_json::json;
    use shop_core::{NewOrder, NewOrderItem};

    #[tokio::test]
    async fn test_create_preserves_price_exactly() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let id = db
            .products()
            .create(&NewProduct::new("Grinder", 64.90, fx.electronics))
            .await
            .unwrap();

        let stored = db.products().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.price, 64.90);
        assert_eq!(stored.name, "Grinder");
        assert_eq!(stored.category_id, Some(fx.electronics));
    }

    #[tokio::test]
    async fn test_create_rejects_missing_required_fields() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let nameless = NewProduct::new("", 5.0, fx.books);
        let err = db.products().create(&nameless).await.unwrap_err();
        assert!(err.is_validation());

        // Nothing was written.
        assert_eq!(db.products().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_category() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db
            .products()
            .create(&NewProduct::new("Orphan", 5.0, 9999))
            .await
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[tokio::test]
    async fn test_get_by_id_missing_is_none_not_error() {
        let db = test_db().await;
        assert!(db.products().get_by_id(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_combine() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let rows = db
            .products()
            .list(
                &ProductFilter::new().category(fx.electronics).min_price(300.0),
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Laptop");
        assert_eq!(rows[0].category_name.as_deref(), Some("Electronics"));
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let rows = db
            .products()
            .list(&ProductFilter::new().search("LAPTOP"), Page::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // Matches description text too.
        let rows = db
            .products()
            .list(&ProductFilter::new().search("paperback"), Page::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Novel");
    }

    #[tokio::test]
    async fn test_pagination_window_over_25_rows() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        // 25 fresh products on top of the seed; creation order == id order.
        let batch: Vec<NewProduct> = (1..=25)
            .map(|i| NewProduct::new(format!("Widget {i:02}"), f64::from(i), fx.electronics))
            .collect();
        let ids = db.products().batch_create(&batch).await.unwrap();

        let filter = ProductFilter::new().search("Widget");
        let page2 = db
            .products()
            .list(&filter, Page::new(2, 10))
            .await
            .unwrap();

        // Rows 11-20 of the creation-descending ordering.
        let expected: Vec<i64> = ids.iter().rev().skip(10).take(10).copied().collect();
        let got: Vec<i64> = page2.iter().map(|p| p.product_id).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_update_honors_whitelist_and_checks_existence() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let mut fields = Map::new();
        fields.insert("price".to_string(), json!(899.99));
        fields.insert("product_id".to_string(), json!(12345)); // dropped
        db.products().update(fx.laptop, &fields).await.unwrap();

        let stored = db.products().get_by_id(fx.laptop).await.unwrap().unwrap();
        assert_eq!(stored.price, 899.99);
        assert_eq!(stored.product_id, fx.laptop);

        // Unknown target reported before any write.
        let err = db.products().update(9999, &fields).await.unwrap_err();
        assert!(err.is_not_found());

        // A map with zero whitelisted fields fails without touching rows.
        let mut noise = Map::new();
        noise.insert("created_at".to_string(), json!("2020-01-01"));
        let err = db.products().update(fx.laptop, &noise).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_delete_refused_while_referenced() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let order_id = db
            .orders()
            .create(&NewOrder::new(fx.alice))
            .await
            .unwrap();
        db.orders()
            .add_item(&NewOrderItem::new(order_id, fx.laptop, 1, 999.99))
            .await
            .unwrap();

        let err = db.products().delete(fx.laptop).await.unwrap_err();
        assert!(matches!(err, DbError::Referenced { .. }));

        // Row unchanged.
        let still_there = db.products().get_by_id(fx.laptop).await.unwrap().unwrap();
        assert_eq!(still_there.name, "Laptop");

        // Unreferenced product deletes cleanly.
        db.products().delete(fx.phone).await.unwrap();
        assert!(db.products().get_by_id(fx.phone).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bulk_update_prices_compounds() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let target = db
            .products()
            .create(&NewProduct::new("Sampler", 20.00, fx.books))
            .await
            .unwrap();

        let affected = db.products().bulk_update_prices(fx.books, 10.0).await.unwrap();
        assert_eq!(affected, 3); // Novel, Atlas, Sampler

        let once = db.products().get_by_id(target).await.unwrap().unwrap();
        assert_eq!(once.price, 22.00);

        // Not idempotent by design: a second run compounds.
        db.products().bulk_update_prices(fx.books, 10.0).await.unwrap();
        let twice = db.products().get_by_id(target).await.unwrap().unwrap();
        assert_eq!(twice.price, 24.20);
    }

    #[tokio::test]
    async fn test_batch_create_rolls_back_entirely_on_mid_batch_failure() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;
        let before = db.products().count().await.unwrap();

        for n in [2usize, 5, 8] {
            let mut batch: Vec<NewProduct> = (0..n)
                .map(|i| NewProduct::new(format!("Bulk {i}"), 1.0, fx.books))
                .collect();
            batch[n / 2].name = String::new(); // violates a required field

            let err = db.products().batch_create(&batch).await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(
                db.products().count().await.unwrap(),
                before,
                "no partial commits for batch of {n}"
            );
        }
    }

    #[tokio::test]
    async fn test_batch_create_rolls_back_on_engine_rejection() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;
        let before = db.products().count().await.unwrap();

        // Second entry trips the engine's FK check, not validation.
        let batch = vec![
            NewProduct::new("Ok", 1.0, fx.books),
            NewProduct::new("Bad category", 1.0, 9999),
        ];
        let err = db.products().batch_create(&batch).await.unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(db.products().count().await.unwrap(), before);
    }
}
