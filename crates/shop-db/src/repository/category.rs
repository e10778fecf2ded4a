//! # Category Repository
//!
//! Database operations for categories. Deleting a category does not
//! cascade: the engine's SET NULL action detaches dependent products
//! instead.

use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::query::{bind_value, Page, UpdateSet};
use crate::schema;
use shop_core::validation::validate_new_category;
use shop_core::{Category, NewCategory};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Ok(id)` - engine-assigned identifier
    /// * `Err(DbError::UniqueViolation)` - name already taken; the
    ///   caller may retry with a different name
    pub async fn create(&self, new: &NewCategory) -> DbResult<i64> {
        validate_new_category(new)?;

        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO categories (name, description, created_at) VALUES (?, ?, ?)",
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(id, name = %new.name, "created category");
        Ok(id)
    }

    /// Gets a category by its id. `Ok(None)` when no row matches.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_at \
             FROM categories WHERE category_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists categories, newest first.
    pub async fn list(&self, page: Page) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT category_id, name, description, created_at \
             FROM categories \
             ORDER BY created_at DESC, category_id DESC \
             LIMIT ? OFFSET ?",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Updates a category from a field map (whitelist: name,
    /// description). Existence is checked before the write.
    pub async fn update(&self, id: i64, fields: &Map<String, Value>) -> DbResult<()> {
        let set = UpdateSet::from_map(schema::CATEGORY_MUTABLE, fields);
        if set.is_empty() {
            warn!(id, "category update carried no recognized fields");
            return Err(DbError::EmptyUpdate {
                entity: "category",
                id,
            });
        }

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM categories WHERE category_id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        if exists.is_none() {
            return Err(DbError::not_found("category", id));
        }

        let sql = format!(
            "UPDATE categories SET {} WHERE category_id = ?",
            set.set_clause()
        );
        let mut query = sqlx::query(&sql);
        for value in set.params() {
            query = bind_value(query, value);
        }
        query.bind(id).execute(&self.pool).await?;

        info!(id, fields = set.len(), "updated category");
        Ok(())
    }

    /// Deletes a category. Dependent products are detached (their
    /// category reference set to null by the engine), never deleted.
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("category", id));
        }

        info!(id, "deleted category");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
