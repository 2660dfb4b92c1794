//! # Error Types
//!
//! Domain-specific error types for cashbox-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cashbox-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cashbox-db errors                                                     │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  cashbox-shift errors                                                  │
//! │  └── ShiftError       - Validation / NotFound / Conflict / Storage     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ShiftError → ApiError → Caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;
use crate::types::SessionStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Session lifecycle rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No cash session with this id.
    #[error("Cash session not found: {0}")]
    SessionNotFound(String),

    /// No terminal with this id in the directory.
    #[error("Terminal not found: {0}")]
    TerminalNotFound(String),

    /// No user with this id in the directory.
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// The terminal already has an OPEN session.
    #[error("Terminal {terminal_id} already has an open session ({session_id})")]
    SessionAlreadyOpen {
        terminal_id: String,
        session_id: String,
    },

    /// Reopen refused: the terminal's active session has real sales.
    ///
    /// ## User Workflow
    /// ```text
    /// Manager: reopen yesterday's session A on Terminal 1
    ///      │
    ///      ▼
    /// Terminal 1 has OPEN session B with 3 sales
    ///      │
    ///      ▼
    /// ActiveSessionHasSales { session_id: B, sale_count: 3 }
    ///      │
    ///      ▼
    /// UI: "Close session B manually before reopening"
    /// ```
    #[error(
        "Terminal {terminal_id} has an active session ({session_id}) with {sale_count} sale(s); \
         close it manually before reopening"
    )]
    ActiveSessionHasSales {
        terminal_id: String,
        session_id: String,
        sale_count: i64,
    },

    /// The requested status change is not in the transition whitelist.
    #[error("Cash session {session_id} cannot go from {from} to {to}")]
    InvalidTransition {
        session_id: String,
        from: SessionStatus,
        to: SessionStatus,
    },

    /// Sales and movements can only be appended while the session is OPEN.
    #[error("Cash session {session_id} is {status}; it no longer accepts sales or movements")]
    SessionNotOpen {
        session_id: String,
        status: SessionStatus,
    },

    /// A per-session total left the range of [`Money`].
    #[error("Cash session {session_id}: {total} is out of range")]
    TotalOutOfRange {
        session_id: String,
        total: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether this error is a business conflict that needs a human decision.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::SessionAlreadyOpen { .. }
                | CoreError::ActiveSessionHasSales { .. }
                | CoreError::InvalidTransition { .. }
                | CoreError::SessionNotOpen { .. }
                | CoreError::TotalOutOfRange { .. }
        )
    }

    /// Whether this error means a referenced record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::SessionNotFound(_) | CoreError::TerminalNotFound(_) | CoreError::UserNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage access so a malformed command never opens a
/// transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Amount above the per-command ceiling.
    #[error("{field} must not exceed {max}")]
    ExceedsMax { field: String, max: Money },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparseable status or timestamp).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A range whose start is after its end.
    #[error("{start_field} must not be after {end_field}")]
    InvertedRange {
        start_field: String,
        end_field: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::ActiveSessionHasSales {
            terminal_id: "T1".to_string(),
            session_id: "B".to_string(),
            sale_count: 3,
        };
        assert_eq!(
            err.to_string(),
            "Terminal T1 has an active session (B) with 3 sale(s); close it manually before reopening"
        );

        let err = CoreError::InvalidTransition {
            session_id: "A".to_string(),
            from: SessionStatus::Closed,
            to: SessionStatus::ClosedForce,
        };
        assert_eq!(err.to_string(), "Cash session A cannot go from CLOSED to CLOSED_FORCE");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::MustNotBeNegative {
            field: "closing_amount".to_string(),
        };
        assert_eq!(err.to_string(), "closing_amount must not be negative");

        let err = ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 100,
        };
        assert_eq!(err.to_string(), "limit must be between 1 and 100");

        let err = ValidationError::ExceedsMax {
            field: "amount".to_string(),
            max: Money::from_cents(crate::MAX_AMOUNT),
        };
        assert_eq!(err.to_string(), "amount must not exceed 1000000000.00");
    }

    #[test]
    fn test_classification() {
        assert!(CoreError::SessionNotFound("x".into()).is_not_found());
        assert!(!CoreError::SessionNotFound("x".into()).is_conflict());

        let err = CoreError::SessionAlreadyOpen {
            terminal_id: "T1".into(),
            session_id: "A".into(),
        };
        assert!(err.is_conflict());

        let validation: CoreError = ValidationError::Required {
            field: "notes".into(),
        }
        .into();
        assert!(matches!(validation, CoreError::Validation(_)));
        assert!(!validation.is_conflict());
        assert!(!validation.is_not_found());
    }
}
