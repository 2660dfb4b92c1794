//! # History Repository
//!
//! The joined read path behind session history and drill-down.
//!
//! ## Query Shape
//! ```text
//! cash_sessions s
//!   JOIN      terminals t ON t.id = s.terminal_id      → terminal_name, location_id
//!   LEFT JOIN users c     ON c.id = s.user_id          → cashier_name
//!   LEFT JOIN users a     ON a.id = s.authorized_by    → authorizer_name
//! WHERE <each present filter, AND-ed>
//! ORDER BY s.opened_at DESC, s.rowid DESC
//! LIMIT ?
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::DbResult;
use cashbox_core::{HistoryFilter, SessionRecord};

const RECORD_SELECT: &str = r#"
    SELECT
        s.id, s.terminal_id, s.user_id, s.opened_at, s.closed_at,
        s.opening_amount, s.closing_amount, s.expected_closing_amount,
        s.cash_difference, s.status, s.notes, s.authorized_by,
        t.name AS terminal_name,
        t.location_id AS location_id,
        c.name AS cashier_name,
        a.name AS authorizer_name
    FROM cash_sessions s
    JOIN terminals t ON t.id = s.terminal_id
    LEFT JOIN users c ON c.id = s.user_id
    LEFT JOIN users a ON a.id = s.authorized_by
"#;

/// Repository for joined session records.
#[derive(Debug)]
pub struct HistoryRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> HistoryRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        HistoryRepository { conn }
    }

    /// Sessions matching `filter`, newest first, at most `limit` rows.
    ///
    /// `filter.limit` is ignored here; the caller passes the validated,
    /// effective limit.
    pub async fn search(&mut self, filter: &HistoryFilter, limit: u32) -> DbResult<Vec<SessionRecord>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(RECORD_SELECT);
        query.push(" WHERE 1 = 1");

        if let Some(location_id) = &filter.location_id {
            query.push(" AND t.location_id = ").push_bind(location_id);
        }
        if let Some(terminal_id) = &filter.terminal_id {
            query.push(" AND s.terminal_id = ").push_bind(terminal_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND s.status = ").push_bind(status);
        }
        if let Some(start) = filter.start_date {
            query.push(" AND s.opened_at >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND s.opened_at <= ").push_bind(end);
        }

        query
            .push(" ORDER BY s.opened_at DESC, s.rowid DESC LIMIT ")
            .push_bind(i64::from(limit));

        let records = query
            .build_query_as::<SessionRecord>()
            .fetch_all(&mut *self.conn)
            .await?;

        Ok(records)
    }

    /// One joined record by session ID.
    pub async fn record(&mut self, session_id: &str) -> DbResult<Option<SessionRecord>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(RECORD_SELECT);
        query.push(" WHERE s.id = ").push_bind(session_id);

        let record = query
            .build_query_as::<SessionRecord>()
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{memory_db, seed_directory};
    use cashbox_core::{CashSession, HistoryFilter, Money, SessionClosing, SessionStatus};
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_search_filters_and_order() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let base = Utc::now() - Duration::days(3);
        let a = CashSession::open("a", "term-1", "user-1", Money::zero(), base);
        let b = CashSession::open("b", "term-1", "user-1", Money::zero(), base + Duration::days(1));
        let c = CashSession::open("c", "term-2", "user-2", Money::zero(), base + Duration::days(2));

        uow.sessions().insert(&a).await.unwrap();
        let closing = SessionClosing::new("a", SessionStatus::ClosedForce, Money::zero(), Money::zero(), base)
            .unwrap()
            .with_notes(Some("drawer jammed".into()))
            .with_authorizer(Some("mgr-1".into()));
        uow.sessions().close(&closing).await.unwrap();
        uow.sessions().insert(&b).await.unwrap();
        uow.sessions().insert(&c).await.unwrap();

        let all = uow.history().search(&HistoryFilter::default(), 50).await.unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.session.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let forced = &all[2];
        assert_eq!(forced.terminal_name, "Caja 1");
        assert_eq!(forced.location_id, "store-1");
        assert_eq!(forced.cashier_name.as_deref(), Some("Ana Cashier"));
        assert_eq!(forced.authorizer_name.as_deref(), Some("Marta Manager"));
        assert_eq!(all[0].authorizer_name, None);

        let open_on_term1 = HistoryFilter {
            terminal_id: Some("term-1".into()),
            status: Some(SessionStatus::Open),
            ..Default::default()
        };
        let rows = uow.history().search(&open_on_term1, 50).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session.id, "b");

        let by_location = HistoryFilter {
            location_id: Some("store-2".into()),
            ..Default::default()
        };
        let rows = uow.history().search(&by_location, 50).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session.id, "c");

        // inclusive bounds on opened_at
        let window = HistoryFilter {
            start_date: Some(base + Duration::days(1)),
            end_date: Some(base + Duration::days(2)),
            ..Default::default()
        };
        let rows = uow.history().search(&window, 50).await.unwrap();
        assert_eq!(rows.len(), 2);

        let rows = uow.history().search(&HistoryFilter::default(), 1).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].session.id, "c");
    }

    #[tokio::test]
    async fn test_record_lookup() {
        let db = memory_db().await;
        let mut uow = db.begin().await.unwrap();
        seed_directory(&mut uow).await;

        let session = CashSession::open("s-1", "term-2", "user-2", Money::from_cents(100), Utc::now());
        uow.sessions().insert(&session).await.unwrap();

        let record = uow.history().record("s-1").await.unwrap().unwrap();
        assert_eq!(record.session, session);
        assert_eq!(record.terminal_name, "Caja 2");
        assert!(uow.history().record("missing").await.unwrap().is_none());
    }
}
