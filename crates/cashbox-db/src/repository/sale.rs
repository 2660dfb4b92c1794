//! # Sale Repository
//!
//! Sales recorded against a cash session.
//!
//! ## Append Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  INSERT INTO sales (...) SELECT ?1..?5                                  │
//! │  WHERE EXISTS (session ?2 with status OPEN)                             │
//! │                                                                         │
//! │  1 row  → recorded                                                      │
//! │  0 rows → session missing or no longer OPEN; caller decides which       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The status check and the insert are one statement, so a sale can never
//! land in a session that a concurrent close has already sealed.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use cashbox_core::Sale;

/// Repository for sale rows.
#[derive(Debug)]
pub struct SaleRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> SaleRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        SaleRepository { conn }
    }

    /// Inserts a sale if its session is OPEN.
    ///
    /// ## Returns
    /// * `Ok(true)` - sale recorded
    /// * `Ok(false)` - session missing or not OPEN, nothing written
    pub async fn insert_if_open(&mut self, sale: &Sale) -> DbResult<bool> {
        debug!(id = %sale.id, session_id = %sale.session_id, method = %sale.payment_method, "Inserting sale");

        let result = sqlx::query(
            r#"
            INSERT INTO sales (id, session_id, payment_method, total_amount, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (SELECT 1 FROM cash_sessions WHERE id = ?2 AND status = 'OPEN')
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.session_id)
        .bind(&sale.payment_method)
        .bind(sale.total_amount)
        .bind(sale.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// All sales of a session in recording order.
    pub async fn list_by_session(&mut self, session_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, session_id, payment_method, total_amount, created_at
            FROM sales
            WHERE session_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(sales)
    }

    pub async fn count_by_session(&mut self, session_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE session_id = ?1")
            .bind(session_id)
            .fetch_one(&mut *self.conn)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};
    use cashbox_core::{CashSession, Money, Sale, SessionClosing, SessionStatus};
    use chrono::Utc;

    fn sale(id: &str, session_id: &str, cents: i64) -> Sale {
        Sale {
            id: id.to_string(),
            session_id: session_id.to_string(),
            payment_method: "CASH".to_string(),
            total_amount: Money::from_cents(cents),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_only_while_open() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let now = Utc::now();
        let session = CashSession::open("s-1", "term-1", "user-1", Money::zero(), now);
        uow.sessions().insert(&session).await.unwrap();

        assert!(uow.sales().insert_if_open(&sale("a", "s-1", 5000)).await.unwrap());
        assert!(!uow.sales().insert_if_open(&sale("b", "missing", 5000)).await.unwrap());

        let closing = SessionClosing::new("s-1", SessionStatus::Closed, Money::from_cents(5000), Money::from_cents(5000), now)
            .unwrap();
        uow.sessions().close(&closing).await.unwrap();
        assert!(!uow.sales().insert_if_open(&sale("c", "s-1", 100)).await.unwrap());

        let sales = uow.sales().list_by_session("s-1").await.unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].total_amount, Money::from_cents(5000));
        assert_eq!(uow.sales().count_by_session("s-1").await.unwrap(), 1);
        assert_eq!(uow.sales().count_by_session("missing").await.unwrap(), 0);
    }
}
