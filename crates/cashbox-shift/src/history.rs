//! # History Query Engine
//!
//! Read-only reporting over cash sessions: filtered lists, one-session
//! drill-down and the reconciliation on its own.
//!
//! ```text
//! history(filter) ──► validate ──► HistoryRepository::search ──► Vec<SessionRecord>
//!
//! detail(id) ──► record + movements + sales ──► reconcile + breakdowns
//! ```
//!
//! An empty result is a valid answer, never an error.

use tracing::debug;

use cashbox_core::reconcile::{breakdown_movements, breakdown_sales, reconcile};
use cashbox_core::validation::{validate_history_filter, validate_id};
use cashbox_core::{
    CoreError, HistoryFilter, ReconciliationSummary, SessionDetail, SessionRecord,
    DEFAULT_HISTORY_LIMIT,
};
use cashbox_db::Database;

use crate::config::ShiftConfig;
use crate::error::ShiftResult;

/// History Query Engine.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    db: Database,
    default_limit: u32,
}

impl SessionHistory {
    pub fn new(db: Database) -> Self {
        SessionHistory {
            db,
            default_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn from_config(db: Database, config: &ShiftConfig) -> Self {
        Self::new(db).with_default_limit(config.history.default_limit)
    }

    /// Rows returned when a filter gives no limit.
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    /// Sessions matching every present filter field, newest `opened_at`
    /// first.
    pub async fn history(&self, filter: &HistoryFilter) -> ShiftResult<Vec<SessionRecord>> {
        let limit = validate_history_filter(filter, self.default_limit)?;

        let mut uow = self.db.begin().await?;
        let records = uow.history().search(filter, limit).await?;
        uow.commit().await?;

        debug!(?filter, limit, rows = records.len(), "Session history query");
        Ok(records)
    }

    /// The joined record of one session with its reconciliation and
    /// breakdowns by payment method and movement type.
    pub async fn detail(&self, session_id: &str) -> ShiftResult<SessionDetail> {
        validate_id("session_id", session_id)?;

        let mut uow = self.db.begin().await?;

        let record = uow
            .history()
            .record(session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
        let movements = uow.movements().list_by_session(session_id).await?;
        let sales = uow.sales().list_by_session(session_id).await?;

        uow.commit().await?;

        let summary = reconcile(&record.session, &movements, &sales)?;

        Ok(SessionDetail {
            summary,
            sales_by_method: breakdown_sales(&sales)?,
            movements_by_type: breakdown_movements(&movements)?,
            session: record,
        })
    }

    /// The Reconciliation Calculator over one session's current rows.
    pub async fn reconciliation(&self, session_id: &str) -> ShiftResult<ReconciliationSummary> {
        validate_id("session_id", session_id)?;

        let mut uow = self.db.begin().await?;

        let session = uow
            .sessions()
            .get(session_id)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;
        let movements = uow.movements().list_by_session(session_id).await?;
        let sales = uow.sales().list_by_session(session_id).await?;

        uow.commit().await?;

        Ok(reconcile(&session, &movements, &sales)?)
    }
}
