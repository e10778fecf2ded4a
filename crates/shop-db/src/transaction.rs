//! # Atomic Units
//!
//! Explicit scoped transaction acquisition for multi-statement writes.
//!
//! ## Contract
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Atomic Unit                             │
//! │                                                              │
//! │  let mut unit = db.begin().await?;                           │
//! │       │                                                      │
//! │       ├── statement 1 on unit.conn()                         │
//! │       ├── statement 2 on unit.conn()                         │
//! │       │        │                                             │
//! │       │        ├── any failure ──► unit.rollback()           │
//! │       │        │                   (or drop: same effect)    │
//! │       ▼        ▼                                             │
//! │  unit.commit() ──► all writes durably visible together       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failure inside the unit always rolls back cleanly: the transaction
//! is owned by the unit for its whole life, so there is no path on
//! which a rollback could target an already-released connection. Early
//! `?` returns are covered by drop semantics - an uncommitted
//! transaction rolls back when the unit goes out of scope.
//!
//! No nested or partial commit support: a unit is all-or-nothing.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, error};

use crate::error::{DbError, DbResult};

/// A group of writes that commit or roll back together.
///
/// Single-statement operations (`bulk_update_prices`, `truncate`) are
/// routed through the same type for a uniform discipline, even though
/// they are trivially atomic on their own.
#[derive(Debug)]
pub struct AtomicUnit {
    tx: Transaction<'static, Sqlite>,
}

impl AtomicUnit {
    /// Opens a unit on a pool connection. The connection is held for
    /// the unit's lifetime and released on every exit path.
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin().await?;
        debug!("atomic unit opened");
        Ok(AtomicUnit { tx })
    }

    /// The unit's connection, for executing statements inside it.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commits every write issued in the unit.
    pub async fn commit(self) -> DbResult<()> {
        self.tx.commit().await?;
        debug!("atomic unit committed");
        Ok(())
    }

    /// Rolls back every write issued in the unit.
    ///
    /// Best-effort on the error path: a rollback failure is logged and
    /// swallowed so it cannot mask the error that caused it. Callers
    /// that already hold a `DbError` should prefer [`abort`].
    pub async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await?;
        debug!("atomic unit rolled back");
        Ok(())
    }

    /// Rolls back and returns the causing error unchanged. Used in
    /// failure branches so the original failure is what the caller
    /// sees, never a secondary rollback error.
    pub(crate) async fn abort(self, cause: DbError) -> DbError {
        if let Err(rollback_err) = self.tx.rollback().await {
            error!(error = %rollback_err, "rollback failed after unit error");
        } else {
            debug!("atomic unit rolled back");
        }
        cause
    }
}
