//! # API Error Type
//!
//! The error every back-office command reports on failure.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  cashbox open term-1 user-1 200.00                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SessionLifecycle::open ── ShiftResult<T> ──┐                          │
//! │                                             │                           │
//! │        Validation ──► VALIDATION_ERROR      │                           │
//! │        NotFound   ──► NOT_FOUND             ▼                           │
//! │        Conflict   ──► CONFLICT         ApiError ──► stderr, exit 1      │
//! │        Storage    ──► STORAGE_FAILURE  (logged, generic message)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```json
//! {
//!   "code": "CONFLICT",
//!   "message": "Terminal term-1 already has an open session (6f1c...)"
//! }
//! ```

use serde::Serialize;

use cashbox_core::ValidationError;
use cashbox_shift::ShiftError;

/// Error printed when a command fails.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed command input
    ValidationError,

    /// Unknown session, terminal or user
    NotFound,

    /// Business rule needs a human decision
    Conflict,

    /// Store unavailable or rejected the write; the message says whether a
    /// retry can help
    StorageFailure,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::Validation(e) => ApiError::validation(e.to_string()),
            ShiftError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            ShiftError::Conflict(e) => ApiError::new(ErrorCode::Conflict, e.to_string()),
            ShiftError::Storage(ref e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, retryable = err.is_retryable(), "Storage failure");
                let message = if err.is_retryable() {
                    "The session store is unavailable, please retry"
                } else {
                    "The session store rejected the change"
                };
                ApiError::new(ErrorCode::StorageFailure, message)
            }
        }
    }
}

/// Input rejected before any service call (amount parsing).
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cashbox_core::CoreError;
    use cashbox_db::DbError;

    #[test]
    fn test_codes() {
        let err: ApiError = ShiftError::from(ValidationError::Required {
            field: "notes".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "notes is required");

        let err: ApiError = ShiftError::not_found("Terminal", "term-9").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Terminal not found: term-9");

        let err: ApiError = ShiftError::from(CoreError::ActiveSessionHasSales {
            terminal_id: "term-1".into(),
            session_id: "b".into(),
            sale_count: 3,
        })
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_storage_message_is_generic() {
        let err: ApiError = ShiftError::from(DbError::PoolExhausted).into();
        assert_eq!(err.code, ErrorCode::StorageFailure);
        assert!(!err.message.contains("pool"));

        assert!(err.message.contains("retry"));

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "STORAGE_FAILURE");

        let err: ApiError = ShiftError::from(DbError::CheckViolation {
            message: "CHECK constraint failed".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::StorageFailure);
        assert!(!err.message.contains("retry"));
        assert!(!err.message.contains("CHECK"));
    }
}
