//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Error Propagation                        │
//! │                                                              │
//! │  SQLite Error (sqlx::Error)                                  │
//! │       │                                                      │
//! │       ▼                                                      │
//! │  DbError (this module) ← classified and logged at the        │
//! │       │                  operation boundary                  │
//! │       ▼                                                      │
//! │  Embedder maps to its own surface (CLI message, API error)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers must be able to distinguish "no rows matched" from
//! "operation failed": reads return `Ok(None)` / empty collections for
//! the former and a `DbError` only for the latter. Raw `sqlx::Error`
//! values never escape this crate's API.

use thiserror::Error;

use shop_core::ValidationError;

/// Database operation errors.
///
/// Four spec-level kinds, each covering several concrete variants:
/// validation (pre-write), constraint (engine-surfaced or pre-checked),
/// not-found, and storage failure.
#[derive(Debug, Error)]
pub enum DbError {
    /// Input validation failed before any write was attempted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An update carried no recognized mutable fields; the store was
    /// not touched.
    #[error("update for {entity} {id} carried no recognized fields")]
    EmptyUpdate { entity: &'static str, id: i64 },

    /// Unique constraint violation (duplicate category name, duplicate
    /// customer email). The caller may retry with a different value;
    /// the operation itself does not retry.
    #[error("duplicate {field}: value already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation surfaced by the engine.
    #[error("foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative price/stock, bad status,
    /// non-positive quantity).
    #[error("check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Pre-checked delete refusal: the row is referenced by existing
    /// order items.
    #[error("{entity} {id} is referenced by existing orders")]
    Referenced { entity: &'static str, id: i64 },

    /// Table name outside the fixed whitelist.
    #[error("table '{0}' is not in the allowed set")]
    TableNotAllowed(String),

    /// Update/delete target does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// Database connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        DbError::NotFound { entity, id }
    }

    /// True for the constraint kind: uniqueness, foreign-key, check,
    /// the referenced-by-orders delete refusal, and whitelist refusals.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { .. }
                | DbError::ForeignKeyViolation { .. }
                | DbError::CheckViolation { .. }
                | DbError::Referenced { .. }
                | DbError::TableNotAllowed(_)
        )
    }

    /// True for the not-found kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// True for the validation kind (rejected before any write).
    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Validation(_) | DbError::EmptyUpdate { .. })
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database     → classify by SQLite constraint message
/// sqlx::Error::PoolTimedOut → DbError::PoolExhausted
/// sqlx::Error::PoolClosed   → DbError::ConnectionFailed
/// Other                     → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_predicates() {
        assert!(DbError::UniqueViolation {
            field: "categories.name".into()
        }
        .is_constraint());
        assert!(DbError::Referenced {
            entity: "product",
            id: 4
        }
        .is_constraint());
        assert!(DbError::not_found("order", 9).is_not_found());
        assert!(DbError::EmptyUpdate {
            entity: "product",
            id: 1
        }
        .is_validation());
        assert!(!DbError::QueryFailed("boom".into()).is_constraint());
    }

    #[test]
    fn test_referenced_message_names_orders() {
        let err = DbError::Referenced {
            entity: "product",
            id: 17,
        };
        assert_eq!(err.to_string(), "product 17 is referenced by existing orders");
    }
}
