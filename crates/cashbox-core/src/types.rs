//! # Domain Types
//!
//! Core domain types for cash-register sessions.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Terminal     │   │   CashSession   │   │  CashMovement   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  terminal_id    │◄──│  session_id     │       │
//! │  │  status         │   │  user_id        │   │  movement_type  │       │
//! │  │  current_cashier│   │  status         │   │  amount         │       │
//! │  └─────────────────┘   │  opening_amount │   └─────────────────┘       │
//! │                        │  closing_*      │   ┌─────────────────┐       │
//! │                        └─────────────────┘◄──│      Sale       │       │
//! │                                              │  payment_method │       │
//! │                                              │  total_amount   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Session State Machine
//! ```text
//!                 close            ┌──────────────┐
//!            ┌────────────────────►│    CLOSED    │──┐
//!            │    force close      ├──────────────┤  │
//!   ┌──────┐ ├────────────────────►│ CLOSED_FORCE │──┤ reopen
//!   │ OPEN │─┤    auto close       ├──────────────┤  │
//!   └──────┘ └────────────────────►│ CLOSED_AUTO  │──┤
//!      ▲                           └──────────────┘  │
//!      └─────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::reconcile::{Breakdown, ReconciliationSummary};

// =============================================================================
// Session Status
// =============================================================================

/// Lifecycle status of a cash session.
///
/// Stored as the exact uppercase string in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum SessionStatus {
    /// Drawer is open and accepting sales and movements.
    Open,
    /// Closed by the cashier with a declared count.
    Closed,
    /// Closed with a manager's authorization and a mandatory justification.
    ClosedForce,
    /// Closed by the system (stale session or a voided duplicate).
    ClosedAuto,
}

impl SessionStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [SessionStatus; 4] = [
        SessionStatus::Open,
        SessionStatus::Closed,
        SessionStatus::ClosedForce,
        SessionStatus::ClosedAuto,
    ];

    /// The persisted label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Open => "OPEN",
            SessionStatus::Closed => "CLOSED",
            SessionStatus::ClosedForce => "CLOSED_FORCE",
            SessionStatus::ClosedAuto => "CLOSED_AUTO",
        }
    }

    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Open)
    }

    #[inline]
    pub const fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// The transition whitelist.
    ///
    /// OPEN may move to any closed variant; any closed variant may move back
    /// to OPEN. Nothing else is legal, including closed-to-closed.
    pub const fn can_transition_to(&self, next: SessionStatus) -> bool {
        match (self, next) {
            (SessionStatus::Open, SessionStatus::Open) => false,
            (SessionStatus::Open, _) => true,
            (_, SessionStatus::Open) => true,
            _ => false,
        }
    }

    /// Checks the whitelist for one session, producing the domain error.
    pub fn ensure_transition(&self, session_id: &str, next: SessionStatus) -> CoreResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                session_id: session_id.to_string(),
                from: *self,
                to: next,
            })
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        SessionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: SessionStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Terminal
// =============================================================================

/// Whether a terminal currently has an OPEN session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum TerminalStatus {
    Open,
    #[default]
    Closed,
}

/// A point-of-sale register, the unit of session exclusivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Terminal {
    pub id: String,
    /// Display name ("Caja 1", "Register 3").
    pub name: String,
    pub location_id: String,
    /// Mirrors whether an OPEN session exists.
    pub status: TerminalStatus,
    /// The user_id of the OPEN session, unset when none is open.
    pub current_cashier_id: Option<String>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A cashier or manager from the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Cash Session
// =============================================================================

/// One open-or-closed cash drawer period on one terminal.
///
/// ## Invariants
/// - `closing_amount`, `expected_closing_amount`, `cash_difference` and
///   `closed_at` are set exactly when `status` is not OPEN
/// - `cash_difference = closing_amount - expected_closing_amount`
/// - `opening_amount` never changes after open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashSession {
    pub id: String,
    pub terminal_id: String,
    /// The cashier who opened the drawer.
    pub user_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
    pub opening_amount: Money,
    /// Amount the cashier counted at close.
    pub closing_amount: Option<Money>,
    /// Theoretical cash at the moment of close.
    pub expected_closing_amount: Option<Money>,
    pub cash_difference: Option<Money>,
    pub status: SessionStatus,
    /// Forced-close justification or system audit trail.
    pub notes: Option<String>,
    /// Manager who authorized a forced close.
    pub authorized_by: Option<String>,
}

impl CashSession {
    /// Builds a freshly opened session.
    pub fn open(
        id: impl Into<String>,
        terminal_id: impl Into<String>,
        user_id: impl Into<String>,
        opening_amount: Money,
        opened_at: DateTime<Utc>,
    ) -> Self {
        CashSession {
            id: id.into(),
            terminal_id: terminal_id.into(),
            user_id: user_id.into(),
            opened_at,
            closed_at: None,
            opening_amount,
            closing_amount: None,
            expected_closing_amount: None,
            cash_difference: None,
            status: SessionStatus::Open,
            notes: None,
            authorized_by: None,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Applies a closing to this in-memory copy.
    pub fn apply_closing(&mut self, closing: &SessionClosing) {
        self.status = closing.status;
        self.closed_at = Some(closing.closed_at);
        self.closing_amount = Some(closing.closing_amount);
        self.expected_closing_amount = Some(closing.expected_closing_amount);
        self.cash_difference = Some(closing.cash_difference);
        self.notes = closing.notes.clone();
        self.authorized_by = closing.authorized_by.clone();
    }

    /// Clears every closing field, as a reopen does.
    pub fn apply_reopen(&mut self) {
        self.status = SessionStatus::Open;
        self.closed_at = None;
        self.closing_amount = None;
        self.expected_closing_amount = None;
        self.cash_difference = None;
        self.notes = None;
    }
}

/// The write set of a close: every field a close command is allowed to set.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClosing {
    pub session_id: String,
    pub status: SessionStatus,
    pub closed_at: DateTime<Utc>,
    pub closing_amount: Money,
    pub expected_closing_amount: Money,
    pub cash_difference: Money,
    pub notes: Option<String>,
    pub authorized_by: Option<String>,
}

impl SessionClosing {
    /// Builds a closing from the declared count and the theoretical cash.
    ///
    /// `cash_difference` is always derived here, never supplied.
    pub fn new(
        session_id: impl Into<String>,
        status: SessionStatus,
        declared: Money,
        expected: Money,
        closed_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let session_id = session_id.into();
        let Some(cash_difference) = declared.checked_sub(expected) else {
            return Err(CoreError::TotalOutOfRange {
                session_id,
                total: "cash_difference",
            });
        };

        Ok(SessionClosing {
            session_id,
            status,
            closed_at,
            closing_amount: declared,
            expected_closing_amount: expected,
            cash_difference,
            notes: None,
            authorized_by: None,
        })
    }

    /// The closing written on an empty duplicate session voided by a reopen.
    pub fn void(session_id: impl Into<String>, closed_at: DateTime<Utc>) -> Self {
        SessionClosing {
            session_id: session_id.into(),
            status: SessionStatus::ClosedAuto,
            closed_at,
            closing_amount: Money::zero(),
            expected_closing_amount: Money::zero(),
            cash_difference: Money::zero(),
            notes: Some(crate::AUTO_VOID_NOTE.to_string()),
            authorized_by: None,
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_authorizer(mut self, authorized_by: Option<String>) -> Self {
        self.authorized_by = authorized_by;
        self
    }
}

// =============================================================================
// Cash Movement
// =============================================================================

/// A non-sale cash movement (deposit, withdrawal, closing count).
///
/// `movement_type` keeps the raw label; classification into categories
/// happens in [`crate::category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub session_id: String,
    pub movement_type: String,
    pub amount: Money,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale recorded against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub session_id: String,
    /// Raw payment label ("CASH", "EFECTIVO", "DEBITO", ...).
    pub payment_method: String,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Read Models
// =============================================================================

/// A session joined with its terminal and directory names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SessionRecord {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub session: CashSession,
    pub terminal_name: String,
    pub location_id: String,
    pub cashier_name: Option<String>,
    pub authorizer_name: Option<String>,
}

/// Drill-down view of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionDetail {
    pub session: SessionRecord,
    pub summary: ReconciliationSummary,
    pub sales_by_method: Vec<Breakdown>,
    pub movements_by_type: Vec<Breakdown>,
}

/// A terminal with its OPEN session, if any, and a live preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TerminalSnapshot {
    pub terminal: Terminal,
    pub session: Option<CashSession>,
    pub summary: Option<ReconciliationSummary>,
}

// =============================================================================
// History Filter
// =============================================================================

/// Filters for the session history. All fields are optional and combine
/// with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HistoryFilter {
    pub location_id: Option<String>,
    pub terminal_id: Option<String>,
    pub status: Option<SessionStatus>,
    /// Inclusive lower bound on `opened_at`.
    #[ts(as = "Option<String>")]
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `opened_at`.
    #[ts(as = "Option<String>")]
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_whitelist() {
        use SessionStatus::*;

        for closed in [Closed, ClosedForce, ClosedAuto] {
            assert!(Open.can_transition_to(closed));
            assert!(closed.can_transition_to(Open));
            for other in [Closed, ClosedForce, ClosedAuto] {
                assert!(!closed.can_transition_to(other));
            }
        }
        assert!(!Open.can_transition_to(Open));
    }

    #[test]
    fn test_ensure_transition_reports_both_ends() {
        let err = SessionStatus::Open
            .ensure_transition("s-1", SessionStatus::Open)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: SessionStatus::Open,
                to: SessionStatus::Open,
                ..
            }
        ));
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("closed_force".parse::<SessionStatus>().unwrap(), SessionStatus::ClosedForce);
        assert_eq!(" OPEN ".parse::<SessionStatus>().unwrap(), SessionStatus::Open);
        assert!("ARCHIVED".parse::<SessionStatus>().is_err());

        for status in SessionStatus::ALL {
            assert_eq!(status.to_string().parse::<SessionStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&SessionStatus::ClosedAuto).unwrap();
        assert_eq!(json, "\"CLOSED_AUTO\"");
    }

    #[test]
    fn test_closing_derives_difference() {
        let now = Utc::now();
        let closing = SessionClosing::new(
            "s-1",
            SessionStatus::Closed,
            Money::from_cents(22500),
            Money::from_cents(23000),
            now,
        )
        .unwrap();
        assert_eq!(closing.cash_difference, Money::from_cents(-500));

        let overflow =
            SessionClosing::new("s-1", SessionStatus::ClosedAuto, Money::zero(), Money::from_cents(i64::MIN), now);
        assert!(matches!(
            overflow,
            Err(CoreError::TotalOutOfRange { total: "cash_difference", .. })
        ));

        let mut session = CashSession::open("s-1", "t-1", "u-1", Money::from_cents(20000), now);
        session.apply_closing(&closing);
        assert_eq!(session.status, SessionStatus::Closed);
        assert_eq!(session.closed_at, Some(now));
        assert_eq!(session.cash_difference, Some(Money::from_cents(-500)));

        session.apply_reopen();
        assert!(session.is_open());
        assert_eq!(session.closing_amount, None);
        assert_eq!(session.expected_closing_amount, None);
        assert_eq!(session.cash_difference, None);
        assert_eq!(session.opening_amount, Money::from_cents(20000));
    }

    #[test]
    fn test_void_closing() {
        let closing = SessionClosing::void("ghost", Utc::now());
        assert_eq!(closing.status, SessionStatus::ClosedAuto);
        assert!(closing.closing_amount.is_zero());
        assert!(closing.expected_closing_amount.is_zero());
        assert!(closing.cash_difference.is_zero());
        assert_eq!(closing.notes.as_deref(), Some(crate::AUTO_VOID_NOTE));
    }

    #[test]
    fn test_terminal_status_default() {
        assert_eq!(TerminalStatus::default(), TerminalStatus::Closed);
    }
}
