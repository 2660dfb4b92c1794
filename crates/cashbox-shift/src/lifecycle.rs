//! # Session Lifecycle Manager
//!
//! Owns every status change of a cash session and keeps the terminal row in
//! step with it.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │              open()                                                     │
//! │                │                                                        │
//! │                ▼            close()            ┌──────────────┐         │
//! │          ┌──────────┐ ───────────────────────► │   CLOSED     │         │
//! │          │   OPEN   │   close(force = true)    ├──────────────┤         │
//! │          │          │ ───────────────────────► │ CLOSED_FORCE │         │
//! │          └──────────┘   auto_close()           ├──────────────┤         │
//! │                ▲      ───────────────────────► │ CLOSED_AUTO  │         │
//! │                │                               └──────┬───────┘         │
//! │                └──────────── reopen() ◄───────────────┘                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Unit of Work per Command
//! Every command runs in one [`UnitOfWork`](cashbox_db::UnitOfWork) whose
//! first statement writes the terminal row. SQLite admits one writer at a
//! time, so two commands on the same terminal run one after the other and
//! each sees the other's committed result. Commands on different terminals
//! only wait for each other for the length of a commit.
//!
//! ```text
//!   begin ──► lock terminal ──► read ──► decide ──► write ──► commit
//!                  │                        │
//!                  │ unknown id             │ rule violated
//!                  ▼                        ▼
//!              NotFound                 Conflict (rolled back)
//! ```
//!
//! ## Reopen (void-and-swap)
//! A reopen on a terminal that already has a different OPEN session voids
//! that session when it has no sales, and refuses otherwise. The void, the
//! restore and the closing-movement cleanup commit together.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cashbox_core::category::CLOSING_MOVEMENT_TYPE;
use cashbox_core::reconcile::reconcile;
use cashbox_core::validation::{
    validate_closing_amount, validate_force_notes, validate_id, validate_movement_type,
    validate_notes, validate_opening_amount, validate_payment_method, validate_positive_amount,
};
use cashbox_core::{
    CashMovement, CashSession, CoreError, Money, MovementCategory, ReconciliationSummary, Sale,
    SessionClosing, SessionStatus, TerminalSnapshot,
};
use cashbox_db::{Database, DbError, UnitOfWork};

use crate::config::ShiftConfig;
use crate::error::{ShiftError, ShiftResult};

// =============================================================================
// Commands and Outcomes
// =============================================================================

/// Input of a cashier or manager close.
#[derive(Debug, Clone, Default)]
pub struct CloseRequest {
    /// Cash the cashier counted in the drawer.
    pub declared: Money,
    pub notes: Option<String>,
    /// Close as CLOSED_FORCE. Requires notes.
    pub force: bool,
    /// Manager authorizing a forced close. Ignored otherwise.
    pub authorized_by: Option<String>,
}

impl CloseRequest {
    pub fn new(declared: Money) -> Self {
        CloseRequest {
            declared,
            ..Default::default()
        }
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn forced(mut self, authorized_by: Option<String>) -> Self {
        self.force = true;
        self.authorized_by = authorized_by;
        self
    }
}

/// Result of any close: the session as stored and the summary it was
/// reconciled against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloseOutcome {
    pub session: CashSession,
    pub summary: ReconciliationSummary,
}

/// Acknowledgement of a reopen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReopenOutcome {
    pub session: CashSession,
    /// The empty session closed as CLOSED_AUTO to make room, if any.
    pub voided_session_id: Option<String>,
    /// Movements deleted from the voided session.
    pub voided_movements_removed: u64,
    /// Closing movements deleted from the reopened session.
    pub closing_movements_removed: u64,
}

// =============================================================================
// Service
// =============================================================================

/// Session Lifecycle Manager.
#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    db: Database,
    max_open: Duration,
}

impl SessionLifecycle {
    pub fn new(db: Database) -> Self {
        SessionLifecycle {
            db,
            max_open: Duration::hours(24),
        }
    }

    pub fn from_config(db: Database, config: &ShiftConfig) -> Self {
        Self::new(db).with_max_open_hours(config.auto_close.max_open_hours)
    }

    /// Age after which [`auto_close_stale`](Self::auto_close_stale) closes an
    /// OPEN session.
    pub fn with_max_open_hours(mut self, hours: u32) -> Self {
        self.max_open = Duration::hours(i64::from(hours));
        self
    }

    // -------------------------------------------------------------------------
    // Open
    // -------------------------------------------------------------------------

    /// Opens a session on a terminal that has none open.
    pub async fn open(
        &self,
        terminal_id: &str,
        user_id: &str,
        opening_amount: Money,
    ) -> ShiftResult<CashSession> {
        validate_id("terminal_id", terminal_id)?;
        validate_id("user_id", user_id)?;
        validate_opening_amount(opening_amount)?;

        let now = Utc::now();
        let mut uow = self.db.begin().await?;

        let terminal = uow
            .terminals()
            .lock(terminal_id, now)
            .await?
            .ok_or_else(|| CoreError::TerminalNotFound(terminal_id.to_string()))?;

        if !uow.users().exists(user_id).await? {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        if let Some(active) = uow.sessions().find_open_by_terminal(&terminal.id).await? {
            debug!(terminal_id = %terminal.id, session_id = %active.id, "Terminal already has an open session");
            return Err(ShiftError::already_open(&terminal.id, active.id));
        }

        let session = CashSession::open(
            Uuid::new_v4().to_string(),
            &terminal.id,
            user_id,
            opening_amount,
            now,
        );

        uow.sessions().insert(&session).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => ShiftError::already_open(&terminal.id, "unknown"),
            other => other.into(),
        })?;
        uow.terminals().mark_open(&terminal.id, user_id, now).await?;
        uow.commit().await?;

        info!(
            session_id = %session.id,
            terminal_id = %terminal.id,
            user_id = %user_id,
            opening_amount = %opening_amount,
            "Cash session opened"
        );

        Ok(session)
    }

    // -------------------------------------------------------------------------
    // Close
    // -------------------------------------------------------------------------

    /// Closes an OPEN session against the cashier's declared count.
    pub async fn close(&self, session_id: &str, request: CloseRequest) -> ShiftResult<CloseOutcome> {
        validate_id("session_id", session_id)?;
        validate_closing_amount(request.declared)?;

        let (status, notes, authorized_by) = if request.force {
            let notes = validate_force_notes(request.notes.as_deref())?;
            if let Some(authorizer) = &request.authorized_by {
                validate_id("authorized_by", authorizer)?;
            }
            (SessionStatus::ClosedForce, Some(notes), request.authorized_by)
        } else {
            if request.authorized_by.is_some() {
                debug!(session_id = %session_id, "Ignoring authorizer on a normal close");
            }
            (SessionStatus::Closed, validate_notes(request.notes.as_deref())?, None)
        };

        self.close_with(session_id, status, Some(request.declared), notes, authorized_by)
            .await
    }

    /// Closes an OPEN session as CLOSED_AUTO, declaring exactly the
    /// theoretical cash.
    pub async fn auto_close(&self, session_id: &str, reason: &str) -> ShiftResult<CloseOutcome> {
        validate_id("session_id", session_id)?;
        let reason = validate_force_notes(Some(reason))?;

        let outcome = self
            .close_with(session_id, SessionStatus::ClosedAuto, None, Some(reason), None)
            .await?;

        warn!(
            session_id = %session_id,
            terminal_id = %outcome.session.terminal_id,
            "Cash session auto-closed"
        );
        Ok(outcome)
    }

    /// Auto-closes every OPEN session opened more than the configured number
    /// of hours before `now`. Returns the ids closed.
    ///
    /// Each session is closed in its own unit of work; a session closed by
    /// someone else in between is skipped.
    pub async fn auto_close_stale(&self, now: DateTime<Utc>) -> ShiftResult<Vec<String>> {
        let cutoff = now - self.max_open;

        let stale = {
            let mut uow = self.db.begin().await?;
            let stale = uow.sessions().list_open_before(cutoff).await?;
            uow.commit().await?;
            stale
        };

        debug!(count = stale.len(), %cutoff, "Stale open sessions found");

        let reason = format!(
            "auto-closed: open longer than {} hours",
            self.max_open.num_hours()
        );

        let mut closed = Vec::with_capacity(stale.len());
        for session in stale {
            match self.auto_close(&session.id, &reason).await {
                Ok(_) => closed.push(session.id),
                Err(ShiftError::Conflict(CoreError::InvalidTransition { .. })) => {
                    debug!(session_id = %session.id, "Session closed concurrently, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(closed)
    }

    async fn close_with(
        &self,
        session_id: &str,
        status: SessionStatus,
        declared: Option<Money>,
        notes: Option<String>,
        authorized_by: Option<String>,
    ) -> ShiftResult<CloseOutcome> {
        let now = Utc::now();
        let mut uow = self.db.begin().await?;

        let terminal = uow
            .terminals()
            .lock_for_session(session_id, now)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        if let Some(authorizer) = &authorized_by {
            if !uow.users().exists(authorizer).await? {
                return Err(CoreError::UserNotFound(authorizer.clone()).into());
            }
        }

        let mut session = load_session(&mut uow, session_id).await?;
        session.status.ensure_transition(&session.id, status)?;

        let movements = uow.movements().list_by_session(&session.id).await?;
        let sales = uow.sales().list_by_session(&session.id).await?;
        let summary = reconcile(&session, &movements, &sales)?;

        let declared = declared.unwrap_or(summary.theoretical_cash);
        let closing = SessionClosing::new(&session.id, status, declared, summary.theoretical_cash, now)?
            .with_notes(notes)
            .with_authorizer(authorized_by);

        uow.sessions().close(&closing).await?;
        uow.movements()
            .insert(&CashMovement {
                id: Uuid::new_v4().to_string(),
                session_id: session.id.clone(),
                movement_type: CLOSING_MOVEMENT_TYPE.to_string(),
                amount: declared,
                description: Some(format!("{status} count")),
                created_at: now,
            })
            .await?;
        uow.terminals().mark_closed(&terminal.id, now).await?;
        uow.commit().await?;

        session.apply_closing(&closing);

        info!(
            session_id = %session.id,
            terminal_id = %terminal.id,
            status = %status,
            declared = %closing.closing_amount,
            expected = %closing.expected_closing_amount,
            difference = %closing.cash_difference,
            "Cash session closed"
        );

        Ok(CloseOutcome { session, summary })
    }

    // -------------------------------------------------------------------------
    // Reopen
    // -------------------------------------------------------------------------

    /// Restores a closed session to OPEN, voiding an empty duplicate on the
    /// same terminal if there is one.
    ///
    /// Refuses with `ActiveSessionHasSales` when the other OPEN session has
    /// recorded sales; nothing is written in that case.
    pub async fn reopen(&self, session_id: &str) -> ShiftResult<ReopenOutcome> {
        validate_id("session_id", session_id)?;

        let now = Utc::now();
        let mut uow = self.db.begin().await?;

        let terminal = uow
            .terminals()
            .lock_for_session(session_id, now)
            .await?
            .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()))?;

        let mut target = load_session(&mut uow, session_id).await?;
        target.status.ensure_transition(&target.id, SessionStatus::Open)?;

        let mut voided_session_id = None;
        let mut voided_movements_removed = 0;

        if let Some(active) = uow.sessions().find_open_by_terminal(&terminal.id).await? {
            let sale_count = uow.sales().count_by_session(&active.id).await?;
            if sale_count > 0 {
                uow.rollback().await?;
                info!(
                    session_id = %target.id,
                    active_session_id = %active.id,
                    sale_count,
                    "Reopen refused, active session has sales"
                );
                return Err(CoreError::ActiveSessionHasSales {
                    terminal_id: terminal.id,
                    session_id: active.id,
                    sale_count,
                }
                .into());
            }

            uow.sessions().close(&SessionClosing::void(&active.id, now)).await?;
            voided_movements_removed = uow.movements().delete_by_session(&active.id).await?;

            warn!(
                voided_session_id = %active.id,
                terminal_id = %terminal.id,
                movements_removed = voided_movements_removed,
                "Empty open session voided by reopen"
            );
            voided_session_id = Some(active.id);
        }

        uow.sessions().reopen(&target.id).await?;
        uow.terminals()
            .mark_open(&terminal.id, &target.user_id, now)
            .await?;
        let closing_movements_removed = uow
            .movements()
            .delete_by_types(&target.id, MovementCategory::Closing.labels())
            .await?;
        uow.commit().await?;

        target.apply_reopen();

        info!(
            session_id = %target.id,
            terminal_id = %terminal.id,
            voided = ?voided_session_id,
            "Cash session reopened"
        );

        Ok(ReopenOutcome {
            session: target,
            voided_session_id,
            voided_movements_removed,
            closing_movements_removed,
        })
    }

    // -------------------------------------------------------------------------
    // Append Path
    // -------------------------------------------------------------------------

    /// Records a completed sale against an OPEN session.
    pub async fn record_sale(
        &self,
        session_id: &str,
        payment_method: &str,
        total_amount: Money,
    ) -> ShiftResult<Sale> {
        validate_id("session_id", session_id)?;
        validate_payment_method(payment_method)?;
        validate_positive_amount("total_amount", total_amount)?;

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            payment_method: payment_method.trim().to_string(),
            total_amount,
            created_at: Utc::now(),
        };

        let mut uow = self.db.begin().await?;
        if !uow.sales().insert_if_open(&sale).await? {
            return Err(append_rejected(&mut uow, session_id).await);
        }
        uow.commit().await?;

        debug!(sale_id = %sale.id, session_id = %session_id, amount = %total_amount, "Sale recorded");
        Ok(sale)
    }

    /// Records a deposit or withdrawal against an OPEN session.
    pub async fn record_movement(
        &self,
        session_id: &str,
        movement_type: &str,
        amount: Money,
        description: Option<&str>,
    ) -> ShiftResult<CashMovement> {
        validate_id("session_id", session_id)?;
        validate_movement_type(movement_type)?;
        validate_positive_amount("amount", amount)?;
        let description = validate_notes(description)?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            movement_type: movement_type.trim().to_string(),
            amount,
            description,
            created_at: Utc::now(),
        };

        let mut uow = self.db.begin().await?;
        if !uow.movements().insert_if_open(&movement).await? {
            return Err(append_rejected(&mut uow, session_id).await);
        }
        uow.commit().await?;

        debug!(
            movement_id = %movement.id,
            session_id = %session_id,
            movement_type = %movement.movement_type,
            amount = %amount,
            "Cash movement recorded"
        );
        Ok(movement)
    }

    // -------------------------------------------------------------------------
    // Status
    // -------------------------------------------------------------------------

    /// The terminal, its OPEN session if any, and a live reconciliation.
    pub async fn current_session(&self, terminal_id: &str) -> ShiftResult<TerminalSnapshot> {
        validate_id("terminal_id", terminal_id)?;

        let mut uow = self.db.begin().await?;

        let terminal = uow
            .terminals()
            .get(terminal_id)
            .await?
            .ok_or_else(|| CoreError::TerminalNotFound(terminal_id.to_string()))?;

        let snapshot = match uow.sessions().find_open_by_terminal(terminal_id).await? {
            Some(session) => {
                let movements = uow.movements().list_by_session(&session.id).await?;
                let sales = uow.sales().list_by_session(&session.id).await?;
                let summary = reconcile(&session, &movements, &sales)?;
                TerminalSnapshot {
                    terminal,
                    session: Some(session),
                    summary: Some(summary),
                }
            }
            None => TerminalSnapshot {
                terminal,
                session: None,
                summary: None,
            },
        };

        uow.commit().await?;
        Ok(snapshot)
    }
}

async fn load_session(uow: &mut UnitOfWork, session_id: &str) -> ShiftResult<CashSession> {
    uow.sessions()
        .get(session_id)
        .await?
        .ok_or_else(|| CoreError::SessionNotFound(session_id.to_string()).into())
}

/// Explains why a conditional append inserted nothing.
async fn append_rejected(uow: &mut UnitOfWork, session_id: &str) -> ShiftError {
    match uow.sessions().get(session_id).await {
        Ok(Some(session)) => CoreError::SessionNotOpen {
            session_id: session.id,
            status: session.status,
        }
        .into(),
        Ok(None) => CoreError::SessionNotFound(session_id.to_string()).into(),
        Err(e) => e.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
