//! # Service Error Types
//!
//! The error taxonomy every lifecycle command and history query reports.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Kind        Source                              Caller action          │
//! │  ──────────  ──────────────────────────────────  ────────────────────   │
//! │  Validation  malformed command or filter         fix the input          │
//! │  NotFound    unknown session / terminal / user   use another id         │
//! │  Conflict    duplicate OPEN session,             human decision         │
//! │              illegal transition,                                        │
//! │              active session has sales,                                  │
//! │              append to a closed session                                 │
//! │              total out of range                                         │
//! │  Storage     store unavailable or failed         retry if transient     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write runs in one unit of work, so a `Storage` failure leaves the
//! store as if the command never ran. Retrying only helps when the failure
//! was transient (lock contention, pool timeout, lost connection).

use thiserror::Error;

use cashbox_core::{CoreError, ValidationError};
use cashbox_db::DbError;

/// Result type alias for service operations.
pub type ShiftResult<T> = Result<T, ShiftError>;

/// Coarse classification of a [`ShiftError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

/// Service error type.
#[derive(Debug, Error)]
pub enum ShiftError {
    /// Malformed command or filter input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced session, terminal or user does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Business rule violation that needs a human decision.
    #[error(transparent)]
    Conflict(CoreError),

    /// The store failed underneath the command.
    #[error("Storage failure: {0}")]
    Storage(DbError),
}

impl ShiftError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ShiftError::NotFound { entity, id: id.into() }
    }

    pub fn already_open(terminal_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        ShiftError::Conflict(CoreError::SessionAlreadyOpen {
            terminal_id: terminal_id.into(),
            session_id: session_id.into(),
        })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ShiftError::Validation(_) => ErrorKind::Validation,
            ShiftError::NotFound { .. } => ErrorKind::NotFound,
            ShiftError::Conflict(_) => ErrorKind::Conflict,
            ShiftError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether the same command may succeed unchanged on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ShiftError::Storage(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<CoreError> for ShiftError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ShiftError::Validation(e),
            CoreError::SessionNotFound(id) => ShiftError::not_found("Cash session", id),
            CoreError::TerminalNotFound(id) => ShiftError::not_found("Terminal", id),
            CoreError::UserNotFound(id) => ShiftError::not_found("User", id),
            other => ShiftError::Conflict(other),
        }
    }
}

/// Storage errors that carry business meaning are lifted out of `Storage`:
/// a unique violation can only come from the one-OPEN-session index. Call
/// sites that know the terminal use [`ShiftError::already_open`] instead.
impl From<DbError> for ShiftError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { .. } => ShiftError::already_open("unknown", "unknown"),
            DbError::NotFound { entity, id } => ShiftError::NotFound {
                entity: "Record",
                id: format!("{entity} {id}"),
            },
            other => ShiftError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbox_core::SessionStatus;

    #[test]
    fn test_core_error_mapping() {
        let err: ShiftError = CoreError::SessionNotFound("s-1".into()).into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "Cash session not found: s-1");

        let err: ShiftError = CoreError::ActiveSessionHasSales {
            terminal_id: "T1".into(),
            session_id: "B".into(),
            sale_count: 2,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());

        let err: ShiftError = CoreError::InvalidTransition {
            session_id: "A".into(),
            from: SessionStatus::Open,
            to: SessionStatus::Open,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: ShiftError = CoreError::Validation(ValidationError::Required {
            field: "notes".into(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "notes is required");
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ShiftError = DbError::duplicate("cash_sessions.terminal_id", "unknown").into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: ShiftError = DbError::PoolExhausted.into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.is_retryable());

        let err: ShiftError = DbError::TransactionFailed("database is locked".into()).into();
        assert!(err.is_retryable());

        let err: ShiftError = DbError::CheckViolation {
            message: "CHECK constraint failed: cash_difference".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_retryable());

        let err: ShiftError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".into(),
        }
        .into();
        assert!(!err.is_retryable());

        let err: ShiftError = DbError::not_found("Open cash session", "s-1").into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
