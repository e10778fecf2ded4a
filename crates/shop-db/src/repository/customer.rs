//! # Customer Repository
//!
//! Database operations for customers. Email is globally unique;
//! deleting a customer cascades to their orders (and from there to the
//! order items).

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::query::{bind_value, Page, UpdateSet};
use crate::schema;
use shop_core::validation::validate_new_customer;
use shop_core::{Customer, NewCustomer};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a new customer.
    ///
    /// ## Returns
    /// * `Ok(id)` - engine-assigned identifier
    /// * `Err(DbError::UniqueViolation)` - email already registered
    pub async fn create(&self, new: &NewCustomer) -> DbResult<i64> {
        validate_new_customer(new)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO customers (first_name, last_name, email, phone, registration_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, email = %new.email, "created customer");
        Ok(id)
    }

    /// Gets a customer by id. `Ok(None)` when no row matches.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, first_name, last_name, email, phone, registration_date \
             FROM customers WHERE customer_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by their unique email. `Ok(None)` when no row
    /// matches.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, first_name, last_name, email, phone, registration_date \
             FROM customers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists customers, newest registrations first.
    pub async fn list(&self, page: Page) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT customer_id, first_name, last_name, email, phone, registration_date \
             FROM customers \
             ORDER BY registration_date DESC, customer_id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Updates a customer from a field map (whitelist: first_name,
    /// last_name, email, phone). Existence is checked before the write.
    pub async fn update(&self, id: i64, fields: &Map<String, Value>) -> DbResult<()> {
        let set = UpdateSet::from_map(schema::CUSTOMER_MUTABLE, fields);
        if set.is_empty() {
            warn!(id, "customer update carried no recognized fields");
            return Err(DbError::EmptyUpdate {
                entity: "customer",
                id,
            });
        }

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM customers WHERE customer_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(DbError::not_found("customer", id));
        }

        let sql = format!(
            "UPDATE customers SET {} WHERE customer_id = ?",
            set.set_clause()
        );
        let mut query = sqlx::query(&sql);
        for value in set.params() {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&self.pool).await?;

        info!(id, fields = set.len(), "updated customer");
        Ok(())
    }

    /// Deletes a customer. Their orders (and order items) cascade away
    /// with them.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("customer", id));
        }

        info!(id, "deleted customer");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{seed_catalog, test_db};

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_error() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let err = db
            .customers()
            .create(&NewCustomer::new("Another", "Alice", "alice@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_get_by_email() {
        let db = test_db().await;
        seed_catalog(&db).await;

        let found = db
            .customers()
            .get_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.first_name, "Alice");

        assert!(db
            .customers()
            .get_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_orders() {
        let db = test_db().await;
        let fx = seed_catalog(&db).await;

        let order_id = db
            .orders()
            .create(&shop_core::NewOrder::new(fx.alice))
            .await
            .unwrap();

        db.customers().delete(fx.alice).await.unwrap();

        assert!(db.orders().get_by_id(order_id).await.unwrap().is_none());
    }
}
