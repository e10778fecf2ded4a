//! # Reporting Engine
//!
//! Fixed analytical queries over the catalog/order data. Every report
//! is a pure read: no side effects, no writes.
//!
//! ## Report Shapes
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  sales_by_category    GROUP BY category over non-cancelled   │
//! │                       order items; categories with no sales  │
//! │                       still appear (zero/null aggregates)    │
//! │                                                              │
//! │  customer_order_history   one row per order: correlated      │
//! │                           item count + concatenated product  │
//! │                           names; empty orders still appear   │
//! │                                                              │
//! │  popular_products     CTE ranking by units sold then         │
//! │                       revenue; unsold products appear with   │
//! │                       null aggregates                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancelled orders are excluded from every sales aggregate, but a
//! customer's history lists them - cancellation is part of the record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use shop_core::OrderStatus;

// =============================================================================
// Report Rows
// =============================================================================

/// One category's sales aggregates.
///
/// `items_sold` is 0 and the remaining aggregates are `None` for a
/// category nothing has been sold from.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategorySales {
    pub category_name: String,
    pub items_sold: i64,
    pub total_quantity: Option<i64>,
    pub total_revenue: Option<f64>,
    pub avg_price: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

/// One order in a customer's history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CustomerOrderSummary {
    pub order_id: i64,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: f64,
    /// Correlated count of the order's line items.
    pub item_count: i64,
    /// Comma-joined product names; `None` for an order with no items.
    pub product_names: Option<String>,
}

/// One product's popularity aggregates. `None` aggregates mean the
/// product has never been sold (outside a cancelled order).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductPopularity {
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub category_name: Option<String>,
    pub total_sold: Option<i64>,
    pub total_revenue: Option<f64>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for analytical reports (pure reads).
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales grouped by category over non-cancelled order items.
    ///
    /// Per category: item count, total quantity, total revenue (sum of
    /// derived subtotals), average/min/max unit price. Both date bounds
    /// are inclusive and filter on the order date before grouping.
    /// Ordered by total revenue descending (saleless categories last).
    pub async fn sales_by_category(
        &self,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<CategorySales>> {
        // The sold-item set is prefiltered in a subquery so that
        // cancelled or out-of-range items vanish without dragging their
        // category out of the result.
        let mut item_filter = String::from("o.status != 'cancelled'");
        if start_date.is_some() {
            item_filter.push_str(" AND o.order_date >= ?");
        }
        if end_date.is_some() {
            item_filter.push_str(" AND o.order_date <= ?");
        }

        let sql = format!(
            "SELECT \
                 c.name AS category_name, \
                 COUNT(s.order_item_id) AS items_sold, \
                 SUM(s.quantity) AS total_quantity, \
                 SUM(s.subtotal) AS total_revenue, \
                 AVG(s.unit_price) AS avg_price, \
                 MIN(s.unit_price) AS min_price, \
                 MAX(s.unit_price) AS max_price \
             FROM categories c \
             LEFT JOIN products p ON p.category_id = c.category_id \
             LEFT JOIN ( \
                 SELECT oi.order_item_id, oi.product_id, oi.quantity, oi.unit_price, oi.subtotal \
                 FROM order_items oi \
                 JOIN orders o ON o.order_id = oi.order_id \
                 WHERE {item_filter} \
             ) s ON s.product_id = p.product_id \
             GROUP BY c.category_id, c.name \
             ORDER BY total_revenue DESC"
        );

        let mut query = sqlx::query_as::<_, CategorySales>(&sql);
        if let Some(start) = start_date {
            query = query.bind(start);
        }
        if let Some(end) = end_date {
            query = query.bind(end);
        }

        let report = query.fetch_all(&self.pool).await?;
        debug!(categories = report.len(), "built sales report");
        Ok(report)
    }

    /// A customer's orders, newest first, each with its item count and
    /// the names of the products on it.
    ///
    /// Orders with no items still appear (LEFT JOINs), with a zero
    /// count and no names. An unknown customer yields an empty list,
    /// not an error.
    pub async fn customer_order_history(
        &self,
        customer_id: i64,
    ) -> DbResult<Vec<CustomerOrderSummary>> {
        let orders = sqlx::query_as::<_, CustomerOrderSummary>(
            "SELECT \
                 o.order_id, \
                 o.order_date, \
                 o.status, \
                 o.total_amount, \
                 (SELECT COUNT(*) FROM order_items oi WHERE oi.order_id = o.order_id) AS item_count, \
                 GROUP_CONCAT(p.name, ', ') AS product_names \
             FROM orders o \
             LEFT JOIN order_items oi ON o.order_id = oi.order_id \
             LEFT JOIN products p ON oi.product_id = p.product_id \
             WHERE o.customer_id = ? \
             GROUP BY o.order_id \
             ORDER BY o.order_date DESC, o.order_id DESC",
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(customer_id, orders = orders.len(), "built order history");
        Ok(orders)
    }

    /// The top-N products by units sold (then revenue) across
    /// non-cancelled orders.
    ///
    /// Products with zero sales appear with null aggregates and sort
    /// last, so a small catalog fills the requested window.
    pub async fn popular_products(&self, limit: u32) -> DbResult<Vec<ProductPopularity>> {
        let products = sqlx::query_as::<_, ProductPopularity>(
            "WITH product_sales AS ( \
                 SELECT \
                     p.product_id, \
                     p.name, \
                     p.price, \
                     c.name AS category_name, \
                     SUM(s.quantity) AS total_sold, \
                     SUM(s.subtotal) AS total_revenue \
                 FROM products p \
                 LEFT JOIN ( \
                     SELECT oi.product_id, oi.quantity, oi.subtotal \
                     FROM order_items oi \
                     JOIN orders o ON o.order_id = oi.order_id \
                     WHERE o.status != 'cancelled' \
                 ) s ON s.product_id = p.product_id \
                 LEFT JOIN categories c ON p.category_id = c.category_id \
                 GROUP BY p.product_id \
             ) \
             SELECT product_id, name, price, category_name, total_sold, total_revenue \
             FROM product_sales \
             ORDER BY total_sold DESC, total_revenue DESC \
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(products = products.len(), "built popularity report");
        Ok(products)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
