//! # shop-core: Pure Domain Logic for shopdb
//!
//! Domain types, input validation, and domain errors for the shopdb
//! catalog/order data-access layer. Everything in this crate is pure:
//! no database, no network, no file system.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    shopdb Architecture                      │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │          Embedder (CLI driver, importers, ...)        │  │
//! │  └───────────────────────────┬───────────────────────────┘  │
//! │                              │                              │
//! │  ┌───────────────────────────▼───────────────────────────┐  │
//! │  │              ★ shop-core (THIS CRATE) ★               │  │
//! │  │                                                       │  │
//! │  │   ┌───────────┐   ┌────────────┐   ┌─────────────┐    │  │
//! │  │   │   types   │   │ validation │   │    error    │    │  │
//! │  │   │ Product   │   │  required  │   │ Validation  │    │  │
//! │  │   │ Order ... │   │   fields   │   │   Error     │    │  │
//! │  │   └───────────┘   └────────────┘   └─────────────┘    │  │
//! │  │                                                       │  │
//! │  │   NO I/O • NO DATABASE • PURE FUNCTIONS               │  │
//! │  └───────────────────────────┬───────────────────────────┘  │
//! │                              │                              │
//! │  ┌───────────────────────────▼───────────────────────────┐  │
//! │  │               shop-db (Database Layer)                │  │
//! │  │        SQLite queries, migrations, repositories       │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Category, Product, Customer, Order, OrderItem)
//! - [`validation`] - Required-field validation for create payloads
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic
//! 2. **No I/O**: storage access is FORBIDDEN here
//! 3. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;
