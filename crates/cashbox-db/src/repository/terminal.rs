//! # Terminal Repository
//!
//! The `terminals` table doubles as the per-terminal lock for lifecycle
//! commands.
//!
//! ## Terminal Lock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UoW A (open term-1)              UoW B (reopen s-9 on term-1)          │
//! │  ───────────────────              ─────────────────────────────         │
//! │  lock("term-1")   ── write lock                                         │
//! │  find open session                lock_for_session("s-9") ── waits      │
//! │  insert session                        │                                │
//! │  mark_open                             │                                │
//! │  commit  ───────────────────────────►  │ (busy_timeout)                 │
//! │                                   sees A's session, decides conflict    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The lock is a no-op UPDATE of `updated_at`, the first statement of every
//! lifecycle unit of work. SQLite takes its write lock at that statement,
//! so the reads that follow are never stale for this terminal.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cashbox_core::{Terminal, TerminalStatus};

macro_rules! terminal_columns {
    () => {
        "id, name, location_id, status, current_cashier_id, updated_at"
    };
}

/// Repository for terminal rows.
#[derive(Debug)]
pub struct TerminalRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> TerminalRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        TerminalRepository { conn }
    }

    /// Gets a terminal by ID without locking it.
    pub async fn get(&mut self, id: &str) -> DbResult<Option<Terminal>> {
        let terminal = sqlx::query_as::<_, Terminal>(concat!(
            "SELECT ",
            terminal_columns!(),
            " FROM terminals WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(terminal)
    }

    /// Locks a terminal for the rest of the unit of work.
    ///
    /// ## Returns
    /// * `Ok(None)` - no such terminal, nothing locked
    pub async fn lock(&mut self, id: &str, now: DateTime<Utc>) -> DbResult<Option<Terminal>> {
        let terminal = sqlx::query_as::<_, Terminal>(concat!(
            "UPDATE terminals SET updated_at = ?2 WHERE id = ?1 RETURNING ",
            terminal_columns!()
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(terminal)
    }

    /// Locks the terminal that owns a session.
    ///
    /// ## Returns
    /// * `Ok(None)` - no such session
    pub async fn lock_for_session(
        &mut self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Terminal>> {
        let terminal = sqlx::query_as::<_, Terminal>(concat!(
            "UPDATE terminals SET updated_at = ?2 ",
            "WHERE id = (SELECT terminal_id FROM cash_sessions WHERE id = ?1) RETURNING ",
            terminal_columns!()
        ))
        .bind(session_id)
        .bind(now)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(terminal)
    }

    /// Marks the terminal OPEN with the cashier of its new OPEN session.
    pub async fn mark_open(&mut self, id: &str, cashier_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, cashier_id = %cashier_id, "Marking terminal open");
        self.set_state(id, TerminalStatus::Open, Some(cashier_id), now).await
    }

    /// Marks the terminal CLOSED and clears its cashier.
    pub async fn mark_closed(&mut self, id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(id = %id, "Marking terminal closed");
        self.set_state(id, TerminalStatus::Closed, None, now).await
    }

    async fn set_state(
        &mut self,
        id: &str,
        status: TerminalStatus,
        cashier_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE terminals SET status = ?2, current_cashier_id = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(cashier_id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Terminal", id));
        }
        Ok(())
    }

    /// Adds a terminal to the directory.
    pub async fn insert(&mut self, terminal: &Terminal) -> DbResult<()> {
        debug!(id = %terminal.id, location_id = %terminal.location_id, "Inserting terminal");

        sqlx::query(concat!(
            "INSERT INTO terminals (",
            terminal_columns!(),
            ") VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        ))
        .bind(&terminal.id)
        .bind(&terminal.name)
        .bind(&terminal.location_id)
        .bind(terminal.status)
        .bind(&terminal.current_cashier_id)
        .bind(terminal.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn count(&mut self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM terminals")
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};
    use cashbox_core::TerminalStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn test_lock_returns_row() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let terminal = uow.terminals().lock("term-1", now).await.unwrap().unwrap();
        assert_eq!(terminal.id, "term-1");
        assert_eq!(terminal.updated_at, now);
        assert_eq!(terminal.status, TerminalStatus::Closed);

        assert!(uow.terminals().lock("nope", now).await.unwrap().is_none());
        assert!(uow.terminals().lock_for_session("nope", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_open_and_closed() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        uow.terminals().mark_open("term-1", "user-1", now).await.unwrap();
        let terminal = uow.terminals().get("term-1").await.unwrap().unwrap();
        assert_eq!(terminal.status, TerminalStatus::Open);
        assert_eq!(terminal.current_cashier_id.as_deref(), Some("user-1"));

        uow.terminals().mark_closed("term-1", now).await.unwrap();
        let terminal = uow.terminals().get("term-1").await.unwrap().unwrap();
        assert_eq!(terminal.status, TerminalStatus::Closed);
        assert_eq!(terminal.current_cashier_id, None);

        assert!(uow.terminals().mark_closed("nope", now).await.is_err());
        assert_eq!(uow.terminals().count().await.unwrap(), 2);
    }
}
