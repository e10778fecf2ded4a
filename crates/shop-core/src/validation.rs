//! # Validation Module
//!
//! Required-field validation for create payloads.
//!
//! ## Validation Strategy
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Validation Layers                        │
//! │                                                              │
//! │  Layer 1: THIS MODULE (before any write)                     │
//! │  ├── required fields present and non-empty                   │
//! │  └── numbers finite and in the representable range           │
//! │           │                                                  │
//! │           ▼                                                  │
//! │  Layer 2: Storage engine (SQLite)                            │
//! │  ├── NOT NULL / UNIQUE constraints                           │
//! │  ├── CHECK constraints (price >= 0, quantity > 0, status)    │
//! │  └── foreign key actions (cascade, set-null, restrict)       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Update payloads are deliberately NOT revalidated here: update values
//! pass through to constrained columns, and the engine's CHECK
//! constraints reject anything out of range.

use crate::error::{ValidationError, ValidationResult};
use crate::types::{NewCategory, NewCustomer, NewOrder, NewOrderItem, NewProduct};

// =============================================================================
// Field Validators
// =============================================================================

/// Validates that a required text field is present and non-blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a price-like amount: finite and non-negative.
///
/// The engine's CHECK constraint is the authority on `price >= 0`; this
/// pre-check exists so an obviously malformed payload fails before a
/// transaction is opened.
pub fn validate_amount(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if value < 0.0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an order line quantity: strictly positive.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must contain a single '@' with text on both sides
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like local@domain".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a category insert payload.
pub fn validate_new_category(new: &NewCategory) -> ValidationResult<()> {
    validate_required("name", &new.name)
}

/// Validates a product insert payload.
///
/// Required fields: name, price, category reference.
pub fn validate_new_product(new: &NewProduct) -> ValidationResult<()> {
    validate_required("name", &new.name)?;
    validate_amount("price", new.price)?;
    if new.stock_quantity < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock_quantity".to_string(),
        });
    }
    if new.category_id <= 0 {
        return Err(ValidationError::required("category_id"));
    }
    Ok(())
}

/// Validates a customer insert payload.
pub fn validate_new_customer(new: &NewCustomer) -> ValidationResult<()> {
    validate_required("first_name", &new.first_name)?;
    validate_required("last_name", &new.last_name)?;
    validate_email(&new.email)
}

/// Validates an order insert payload.
pub fn validate_new_order(new: &NewOrder) -> ValidationResult<()> {
    if new.customer_id <= 0 {
        return Err(ValidationError::required("customer_id"));
    }
    Ok(())
}

/// Validates an order line insert payload.
pub fn validate_new_order_item(new: &NewOrderItem) -> ValidationResult<()> {
    if new.order_id <= 0 {
        return Err(ValidationError::required("order_id"));
    }
    if new.product_id <= 0 {
        return Err(ValidationError::required("product_id"));
    }
    validate_quantity(new.quantity)?;
    validate_amount("unit_price", new.unit_price)
}

// =============================================================================
// Unit Tests
// =============================================================================
