//! # Session Repository
//!
//! Reads and writes of the `cash_sessions` table.
//!
//! ## Writers of Each Column
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert()  → id, terminal_id, user_id, opened_at, opening_amount,       │
//! │              status = OPEN                                              │
//! │                                                                         │
//! │  close()   → status, closed_at, closing_amount,                         │
//! │              expected_closing_amount, cash_difference,                  │
//! │              notes, authorized_by          (only WHERE status = OPEN)   │
//! │                                                                         │
//! │  reopen()  → status = OPEN, closed_at / closing fields / notes = NULL   │
//! │                                            (only WHERE status <> OPEN)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Nothing else updates a session, and nothing deletes one.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use cashbox_core::{CashSession, SessionClosing, SessionStatus};

macro_rules! session_columns {
    () => {
        "id, terminal_id, user_id, opened_at, closed_at, opening_amount, \
         closing_amount, expected_closing_amount, cash_difference, status, \
         notes, authorized_by"
    };
}

/// Repository for cash session rows.
#[derive(Debug)]
pub struct SessionRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SessionRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        SessionRepository { conn }
    }

    /// Gets a session by ID.
    pub async fn get(&mut self, id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(concat!(
            "SELECT ",
            session_columns!(),
            " FROM cash_sessions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(session)
    }

    /// The OPEN session of a terminal, if any.
    pub async fn find_open_by_terminal(&mut self, terminal_id: &str) -> DbResult<Option<CashSession>> {
        let session = sqlx::query_as::<_, CashSession>(concat!(
            "SELECT ",
            session_columns!(),
            " FROM cash_sessions WHERE terminal_id = ?1 AND status = ?2"
        ))
        .bind(terminal_id)
        .bind(SessionStatus::Open)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(session)
    }

    /// OPEN sessions opened strictly before `cutoff`, oldest first.
    pub async fn list_open_before(&mut self, cutoff: DateTime<Utc>) -> DbResult<Vec<CashSession>> {
        let sessions = sqlx::query_as::<_, CashSession>(concat!(
            "SELECT ",
            session_columns!(),
            " FROM cash_sessions WHERE status = ?1 AND opened_at < ?2 ORDER BY opened_at ASC"
        ))
        .bind(SessionStatus::Open)
        .bind(cutoff)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(sessions)
    }

    /// Inserts a freshly opened session.
    ///
    /// A second OPEN row for the same terminal fails with
    /// [`DbError::UniqueViolation`] from `idx_cash_sessions_one_open`.
    pub async fn insert(&mut self, session: &CashSession) -> DbResult<()> {
        debug!(id = %session.id, terminal_id = %session.terminal_id, "Inserting cash session");

        sqlx::query(concat!(
            "INSERT INTO cash_sessions (",
            session_columns!(),
            ") VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ))
        .bind(&session.id)
        .bind(&session.terminal_id)
        .bind(&session.user_id)
        .bind(session.opened_at)
        .bind(session.closed_at)
        .bind(session.opening_amount)
        .bind(session.closing_amount)
        .bind(session.expected_closing_amount)
        .bind(session.cash_difference)
        .bind(session.status)
        .bind(&session.notes)
        .bind(&session.authorized_by)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Writes a closing onto an OPEN session.
    pub async fn close(&mut self, closing: &SessionClosing) -> DbResult<()> {
        debug!(
            id = %closing.session_id,
            status = %closing.status,
            difference = %closing.cash_difference,
            "Closing cash session"
        );

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = ?2,
                closed_at = ?3,
                closing_amount = ?4,
                expected_closing_amount = ?5,
                cash_difference = ?6,
                notes = ?7,
                authorized_by = ?8
            WHERE id = ?1 AND status = 'OPEN'
            "#,
        )
        .bind(&closing.session_id)
        .bind(closing.status)
        .bind(closing.closed_at)
        .bind(closing.closing_amount)
        .bind(closing.expected_closing_amount)
        .bind(closing.cash_difference)
        .bind(&closing.notes)
        .bind(&closing.authorized_by)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open cash session", &closing.session_id));
        }

        Ok(())
    }

    /// Restores a closed session to OPEN and clears its closing fields.
    pub async fn reopen(&mut self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Reopening cash session");

        let result = sqlx::query(
            r#"
            UPDATE cash_sessions SET
                status = 'OPEN',
                closed_at = NULL,
                closing_amount = NULL,
                expected_closing_amount = NULL,
                cash_difference = NULL,
                notes = NULL
            WHERE id = ?1 AND status <> 'OPEN'
            "#,
        )
        .bind(id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Closed cash session", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};
    use crate::DbError;
    use cashbox_core::{CashSession, Money, SessionClosing, SessionStatus};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let session = CashSession::open("s-1", "term-1", "user-1", Money::from_cents(20000), Utc::now());
        uow.sessions().insert(&session).await.unwrap();

        let loaded = uow.sessions().get("s-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Open);
        assert_eq!(loaded.opening_amount, Money::from_cents(20000));
        assert!(loaded.closed_at.is_none());

        assert!(uow.sessions().get("missing").await.unwrap().is_none());
        assert_eq!(
            uow.sessions().find_open_by_terminal("term-1").await.unwrap().map(|s| s.id),
            Some("s-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_second_open_session_rejected_by_index() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let first = CashSession::open("s-1", "term-1", "user-1", Money::zero(), now);
        let second = CashSession::open("s-2", "term-1", "user-2", Money::zero(), now);
        uow.sessions().insert(&first).await.unwrap();

        let err = uow.sessions().insert(&second).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_close_and_reopen() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let session = CashSession::open("s-1", "term-1", "user-1", Money::from_cents(20000), now);
        uow.sessions().insert(&session).await.unwrap();

        let closing = SessionClosing::new(
            "s-1",
            SessionStatus::Closed,
            Money::from_cents(22500),
            Money::from_cents(23000),
            now,
        )
        .unwrap();
        uow.sessions().close(&closing).await.unwrap();

        let closed = uow.sessions().get("s-1").await.unwrap().unwrap();
        assert_eq!(closed.status, SessionStatus::Closed);
        assert_eq!(closed.cash_difference, Some(Money::from_cents(-500)));

        // a closed session cannot be closed again
        assert!(matches!(
            uow.sessions().close(&closing).await,
            Err(DbError::NotFound { .. })
        ));

        uow.sessions().reopen("s-1").await.unwrap();
        let reopened = uow.sessions().get("s-1").await.unwrap().unwrap();
        assert_eq!(reopened.status, SessionStatus::Open);
        assert_eq!(reopened.closing_amount, None);
        assert_eq!(reopened.expected_closing_amount, None);
        assert_eq!(reopened.cash_difference, None);
        assert_eq!(reopened.opened_at, session.opened_at);

        assert!(matches!(uow.sessions().reopen("s-1").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_inconsistent_difference() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let session = CashSession::open("s-1", "term-1", "user-1", Money::zero(), now);
        uow.sessions().insert(&session).await.unwrap();

        let mut closing =
            SessionClosing::new("s-1", SessionStatus::Closed, Money::from_cents(100), Money::zero(), now).unwrap();
        closing.cash_difference = Money::from_cents(7);

        let err = uow.sessions().close(&closing).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_open_before() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let stale = CashSession::open("old", "term-1", "user-1", Money::zero(), now - Duration::hours(30));
        let fresh = CashSession::open("new", "term-2", "user-2", Money::zero(), now - Duration::hours(1));
        uow.sessions().insert(&stale).await.unwrap();
        uow.sessions().insert(&fresh).await.unwrap();

        let found = uow
            .sessions()
            .list_open_before(now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "old");
    }
}
