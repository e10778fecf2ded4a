//! # shop-db: Database Layer for shopdb
//!
//! This crate provides database access for the shopdb catalog/order
//! domain. It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     shopdb Data Flow                         │
//! │                                                              │
//! │  Embedder (CLI driver / importer / exporter)                 │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                 shop-db (THIS CRATE)                   │  │
//! │  │                                                        │  │
//! │  │  ┌──────────┐  ┌──────────────┐  ┌──────────────────┐  │  │
//! │  │  │ Database │  │ Repositories │  │ Query Builder    │  │  │
//! │  │  │ (pool.rs)│◄─│ category     │◄─│ Predicate/Page/  │  │  │
//! │  │  │          │  │ product      │  │ UpdateSet        │  │  │
//! │  │  │ begin()──┼─►│ customer     │  └──────────────────┘  │  │
//! │  │  │ Atomic   │  │ order        │  ┌──────────────────┐  │  │
//! │  │  │ Unit     │  │ reports      │  │ Migrations       │  │  │
//! │  │  └──────────┘  └──────────────┘  │ (embedded .sql)  │  │  │
//! │  │                                  └──────────────────┘  │  │
//! │  └────────────────────────┬───────────────────────────────┘  │
//! │                           ▼                                  │
//! │                   SQLite database                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`schema`] - Fixed table/column whitelists
//! - [`query`] - Filter/update/pagination builders
//! - [`transaction`] - Atomic units (explicit transaction scopes)
//! - [`repository`] - Per-entity repositories
//! - [`reports`] - Analytical queries (pure reads)
//! - [`rows`] - Row-sequence import/export boundary
//! - [`maintenance`] - Truncate, optimize, statistics
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shop_db::{Database, DbConfig, Page, ProductFilter};
//!
//! let db = Database::new(DbConfig::new("path/to/shop.db")).await?;
//!
//! let id = db.products().create(&new_product).await?;
//! let page = db
//!     .products()
//!     .list(&ProductFilter::new().search("coffee"), Page::new(1, 20))
//!     .await?;
//! let report = db.reports().sales_by_category(None, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod maintenance;
pub mod migrations;
pub mod pool;
pub mod query;
pub mod reports;
pub mod repository;
pub mod rows;
pub mod schema;
pub mod transaction;

#[cfg(test)]
mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use maintenance::{DbStats, IndexInfo, TableCount};
pub use pool::{Database, DbConfig};
pub use query::{Page, Predicate, ProductFilter, UpdateSet};
pub use rows::Row;
pub use transaction::AtomicUnit;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{ProductListing, ProductRepository};
pub use reports::{CategorySales, CustomerOrderSummary, ProductPopularity, ReportRepository};
