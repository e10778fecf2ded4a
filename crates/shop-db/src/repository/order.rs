//! # Order Repository
//!
//! Database operations for orders and their line items.
//!
//! ## Order Lifecycle
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Order Lifecycle                         │
//! │                                                              │
//! │  create(NewOrder) → Order { status: pending, total: 0 }      │
//! │       │                                                      │
//! │       ├── add_item() → OrderItem (unit price captured)       │
//! │       ├── add_item() → ...                                   │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  set_status(confirmed | shipped | delivered)                 │
//! │       │                                                      │
//! │       └── or set_status(cancelled): items drop out of every  │
//! │           sales aggregate but stay on record                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! An item's `subtotal` is generated by the engine from
//! `quantity * unit_price`; it is read back, never written.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::query::{bind_value, Page, UpdateSet};
use crate::schema;
use shop_core::validation::{validate_new_order, validate_new_order_item};
use shop_core::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order with its defaults: order date now, total 0,
    /// status pending.
    ///
    /// ## Returns
    /// * `Ok(id)` - engine-assigned identifier
    /// * `Err(DbError::ForeignKeyViolation)` - customer doesn't exist
    pub async fn create(&self, new: &NewOrder) -> DbResult<i64> {
        validate_new_order(new)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO orders (customer_id, order_date, total_amount, status) \
             VALUES (?, ?, 0, ?)",
        )
        .bind(new.customer_id)
        .bind(now)
        .bind(OrderStatus::Pending)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, customer_id = new.customer_id, "created order");
        Ok(id)
    }

    /// Gets an order by id. `Ok(None)` when no row matches.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT order_id, customer_id, order_date, total_amount, status \
             FROM orders WHERE order_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders, newest first.
    pub async fn list(&self, page: Page) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT order_id, customer_id, order_date, total_amount, status \
             FROM orders \
             ORDER BY order_date DESC, order_id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Updates an order from a field map (whitelist: status,
    /// total_amount). Existence is checked before the write; a bad
    /// status value is rejected by the engine's CHECK constraint.
    pub async fn update(&self, id: i64, fields: &Map<String, Value>) -> DbResult<()> {
        let set = UpdateSet::from_map(schema::ORDER_MUTABLE, fields);
        if set.is_empty() {
            warn!(id, "order update carried no recognized fields");
            return Err(DbError::EmptyUpdate {
                entity: "order",
                id,
            });
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM orders WHERE order_id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::not_found("order", id));
        }

        let sql = format!("UPDATE orders SET {} WHERE order_id = ?", set.set_clause());
        let mut query = sqlx::query(&sql);
        for value in set.params() {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&self.pool).await?;

        info!(id, fields = set.len(), "updated order");
        Ok(())
    }

    /// Moves an order to a new status.
    pub async fn set_status(&self, id: i64, status: OrderStatus) -> DbResult<()> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE order_id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("order", id));
        }

        info!(id, status = %status, "order status changed");
        Ok(())
    }

    /// Deletes an order; its items cascade away with it.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("order", id));
        }

        info!(id, "deleted order");
        Ok(())
    }

    /// Adds a line item to an order.
    ///
    /// The unit price is captured on the line, so later catalog price
    /// changes leave order history untouched.
    pub async fn add_item(&self, new: &NewOrderItem) -> DbResult<i64> {
        validate_new_order_item(new)?;

        let result = sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(new.order_id)
        .bind(new.product_id)
        .bind(new.quantity)
        .bind(new.unit_price)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(
            id,
            order_id = new.order_id,
            product_id = new.product_id,
            "added order item"
        );
        Ok(id)
    }

    /// Updates an order line from a field map (whitelist: quantity,
    /// unit_price). The derived subtotal follows automatically; a
    /// non-positive quantity is rejected by the engine's CHECK.
    pub async fn update_item(&self, id: i64, fields: &Map<String, Value>) -> DbResult<()> {
        let set = UpdateSet::from_map(schema::ORDER_ITEM_MUTABLE, fields);
        if set.is_empty() {
            warn!(id, "order item update carried no recognized fields");
            return Err(DbError::EmptyUpdate {
                entity: "order item",
                id,
            });
        }

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM order_items WHERE order_item_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(DbError::not_found("order item", id));
        }

        let sql = format!(
            "UPDATE order_items SET {} WHERE order_item_id = ?",
            set.set_clause()
        );
        let mut query = sqlx::query(&sql);
        for value in set.params() {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&self.pool).await?;

        info!(id, fields = set.len(), "updated order item");
        Ok(())
    }

    /// Removes a line from an order.
    pub async fn remove_item(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_item_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("order item", id));
        }

        info!(id, "removed order item");
        Ok(())
    }

    /// Gets all items for an order, in insertion order.
    pub async fn items(&self, order_id: i64) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT order_item_id, order_id, product_id, quantity, unit_price, subtotal \
             FROM order_items \
             WHERE order_id = ? \
             ORDER BY order_item_id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
