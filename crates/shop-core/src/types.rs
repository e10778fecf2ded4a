//! # Domain Types
//!
//! Core domain types used throughout shopdb.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Types                             │
//! │                                                                 │
//! │  Category ──1:N── Product ──1:N── OrderItem ──N:1── Order      │
//! │   (SET NULL)        (RESTRICT)      (CASCADE)        │          │
//! │                                                      │          │
//! │                                 Customer ──1:N───────┘          │
//! │                                  (CASCADE)                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every entity carries an integer surrogate key assigned by the storage
//! engine on insert and immutable afterwards. The `New*` companions are
//! the insert payloads: they carry everything a create needs except the
//! engine-assigned key and timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Stored as lowercase text; the schema's CHECK constraint rejects
/// anything outside this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Order created, not yet confirmed.
    Pending,
    /// Order confirmed by the shop.
    Confirmed,
    /// Order handed to the carrier.
    Shipped,
    /// Order received by the customer.
    Delivered,
    /// Order cancelled; its items are excluded from sales analytics.
    Cancelled,
}

impl OrderStatus {
    /// Returns the lowercase text form stored in the database.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Engine-assigned surrogate key.
    pub category_id: i64,

    /// Display name; unique across all categories.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>) -> Self {
        NewCategory {
            name: name.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// Invariant: `price >= 0` and `stock_quantity >= 0` at all times;
/// violating writes are rejected by the storage engine's CHECK
/// constraints, not silently clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Engine-assigned surrogate key.
    pub product_id: i64,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Unit price, kept to two decimal places.
    pub price: f64,

    /// Units on hand.
    pub stock_quantity: i64,

    /// Owning category. Nullable: deleting a category detaches its
    /// products rather than deleting them.
    pub category_id: Option<i64>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a product.
///
/// `category_id` is required on create even though the stored column is
/// nullable - the null state only arises later, when a category is
/// deleted out from under its products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub stock_quantity: i64,
    pub category_id: i64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64, category_id: i64) -> Self {
        NewProduct {
            name: name.into(),
            description: None,
            price,
            stock_quantity: 0,
            category_id,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn stock_quantity(mut self, qty: i64) -> Self {
        self.stock_quantity = qty;
        self
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    /// Engine-assigned surrogate key.
    pub customer_id: i64,

    pub first_name: String,

    pub last_name: String,

    /// Globally unique contact address.
    pub email: String,

    pub phone: Option<String>,

    /// When the customer registered.
    pub registration_date: DateTime<Utc>,
}

/// Insert payload for a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl NewCustomer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        NewCustomer {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
        }
    }

    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

// =============================================================================
// Order
// =============================================================================

/// A customer order.
///
/// Deleting a customer cascades to their orders; deleting an order
/// cascades to its items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    /// Engine-assigned surrogate key.
    pub order_id: i64,

    pub customer_id: i64,

    /// Defaults to creation time.
    pub order_date: DateTime<Utc>,

    /// Defaults to 0; maintained by the embedder as items are added.
    pub total_amount: f64,

    pub status: OrderStatus,
}

/// Insert payload for an order. Date, total, and status take their
/// defaults (now / 0 / pending) at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub customer_id: i64,
}

impl NewOrder {
    pub fn new(customer_id: i64) -> Self {
        NewOrder { customer_id }
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line on an order.
///
/// `subtotal` is derived (`quantity * unit_price`) by the storage engine
/// and never written independently. A product referenced by any item is
/// delete-restricted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    /// Engine-assigned surrogate key.
    pub order_item_id: i64,

    pub order_id: i64,

    pub product_id: i64,

    /// Units ordered; strictly positive.
    pub quantity: i64,

    /// Price per unit captured at order time.
    pub unit_price: f64,

    /// Derived line total: `quantity * unit_price`.
    pub subtotal: f64,
}

/// Insert payload for an order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

impl NewOrderItem {
    pub fn new(order_id: i64, product_id: i64, quantity: i64, unit_price: f64) -> Self {
        NewOrderItem {
            order_id,
            product_id,
            quantity,
            unit_price,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            let text = status.as_str();
            assert_eq!(text.parse::<OrderStatus>().unwrap(), status);
        }

        assert!("unknown".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_order_status_default_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_new_product_builder() {
        let new = NewProduct::new("Espresso Beans 1kg", 18.50, 3)
            .description("Dark roast")
            .stock_quantity(40);

        assert_eq!(new.name, "Espresso Beans 1kg");
        assert_eq!(new.price, 18.50);
        assert_eq!(new.category_id, 3);
        assert_eq!(new.stock_quantity, 40);
        assert_eq!(new.description.as_deref(), Some("Dark roast"));
    }
}
