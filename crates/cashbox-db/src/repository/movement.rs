//! # Movement Repository
//!
//! Non-sale cash movements: deposits, withdrawals and the synthetic
//! closing record.
//!
//! Movements are append-only except for two deletions, both issued by a
//! reopen: the closing record of the restored session, and every movement
//! of a voided empty session.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use cashbox_core::category::normalize_label;
use cashbox_core::CashMovement;

/// Repository for cash movement rows.
#[derive(Debug)]
pub struct MovementRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> MovementRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        MovementRepository { conn }
    }

    /// Inserts a movement if its session is OPEN. Same contract as
    /// [`SaleRepository::insert_if_open`](super::sale::SaleRepository::insert_if_open).
    pub async fn insert_if_open(&mut self, movement: &CashMovement) -> DbResult<bool> {
        debug!(
            id = %movement.id,
            session_id = %movement.session_id,
            movement_type = %movement.movement_type,
            "Inserting cash movement"
        );

        let result = sqlx::query(
            r#"
            INSERT INTO cash_movements (id, session_id, movement_type, amount, description, created_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE EXISTS (SELECT 1 FROM cash_sessions WHERE id = ?2 AND status = 'OPEN')
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.session_id)
        .bind(&movement.movement_type)
        .bind(movement.amount)
        .bind(&movement.description)
        .bind(movement.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Inserts a movement unconditionally. Used for the closing record,
    /// written after the session has already left OPEN.
    pub async fn insert(&mut self, movement: &CashMovement) -> DbResult<()> {
        debug!(
            id = %movement.id,
            session_id = %movement.session_id,
            movement_type = %movement.movement_type,
            "Inserting cash movement"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_movements (id, session_id, movement_type, amount, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.session_id)
        .bind(&movement.movement_type)
        .bind(movement.amount)
        .bind(&movement.description)
        .bind(movement.created_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// All movements of a session in recording order.
    pub async fn list_by_session(&mut self, session_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, session_id, movement_type, amount, description, created_at
            FROM cash_movements
            WHERE session_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(movements)
    }

    /// Deletes every movement of a session.
    pub async fn delete_by_session(&mut self, session_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM cash_movements WHERE session_id = ?1")
            .bind(session_id)
            .execute(&mut *self.conn)
            .await?;

        debug!(session_id = %session_id, removed = result.rows_affected(), "Deleted session movements");
        Ok(result.rows_affected())
    }

    /// Deletes the movements of a session whose type matches one of
    /// `labels` after normalization.
    pub async fn delete_by_types(&mut self, session_id: &str, labels: &[&str]) -> DbResult<u64> {
        if labels.is_empty() {
            return Ok(0);
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "DELETE FROM cash_movements WHERE session_id = ",
        );
        query.push_bind(session_id);
        query.push(" AND REPLACE(REPLACE(UPPER(TRIM(movement_type)), '-', '_'), ' ', '_') IN (");
        let mut separated = query.separated(", ");
        for label in labels {
            separated.push_bind(normalize_label(label));
        }
        separated.push_unseparated(")");

        let result = query.build().execute(&mut *self.conn).await?;

        debug!(session_id = %session_id, removed = result.rows_affected(), "Deleted movements by type");
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};
    use cashbox_core::{CashMovement, CashSession, Money};
    use chrono::Utc;

    fn movement(id: &str, kind: &str, cents: i64) -> CashMovement {
        CashMovement {
            id: id.to_string(),
            session_id: "s-1".to_string(),
            movement_type: kind.to_string(),
            amount: Money::from_cents(cents),
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_list_and_delete_by_type() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let session = CashSession::open("s-1", "term-1", "user-1", Money::zero(), Utc::now());
        uow.sessions().insert(&session).await.unwrap();

        assert!(uow.movements().insert_if_open(&movement("m1", "WITHDRAWAL", 2000)).await.unwrap());
        uow.movements().insert(&movement("m2", "CLOSING", 23000)).await.unwrap();
        uow.movements().insert(&movement("m3", "cierre", 1)).await.unwrap();

        let listed = uow.movements().list_by_session("s-1").await.unwrap();
        assert_eq!(listed.len(), 3);

        let removed = uow
            .movements()
            .delete_by_types("s-1", &["CLOSING", "CIERRE"])
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let listed = uow.movements().list_by_session("s-1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].movement_type, "WITHDRAWAL");

        assert_eq!(uow.movements().delete_by_types("s-1", &[]).await.unwrap(), 0);
        assert_eq!(uow.movements().delete_by_session("s-1").await.unwrap(), 1);
        assert!(uow.movements().list_by_session("s-1").await.unwrap().is_empty());
    }
}
