//! # Validation Module
//!
//! Input validation for lifecycle commands, write events and history filters.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: back-office CLI                                              │
//! │  ├── Type validation (argument parsing)                                │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: cashbox-shift services                                       │
//! │  └── THIS MODULE: called before any transaction is opened              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── partial UNIQUE index (one OPEN session per terminal)              │
//! │  ├── CHECK constraints (closing fields, cash_difference)               │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cashbox_core::money::Money;
//! use cashbox_core::validation::{validate_closing_amount, validate_id};
//!
//! validate_id("terminal_id", "term-1").unwrap();
//! assert!(validate_closing_amount(Money::from_cents(-1)).is_err());
//! ```

use crate::category::{MovementCategory, PaymentCategory};
use crate::error::ValidationError;
use crate::money::{Money, ParseMoneyError};
use crate::types::HistoryFilter;
use crate::{MAX_AMOUNT, MAX_HISTORY_LIMIT, MAX_NOTES_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted identifier.
const MAX_ID_LENGTH: usize = 64;

// =============================================================================
// Identifiers and Text
// =============================================================================

/// Validates a record identifier (session, terminal or user id).
///
/// ## Rules
/// - Must not be empty or blank
/// - At most 64 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use cashbox_core::validation::validate_id;
///
/// assert!(validate_id("session_id", "0b7c-41aa").is_ok());
/// assert!(validate_id("session_id", "  ").is_err());
/// assert!(validate_id("session_id", "a;drop").is_err());
/// ```
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LENGTH,
        });
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates optional free-text notes.
///
/// ## Returns
/// The trimmed notes, or `None` when absent or blank.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(Some(notes.to_string()))
}

/// Validates the justification of a forced close. Unlike ordinary notes it
/// is mandatory.
pub fn validate_force_notes(notes: Option<&str>) -> ValidationResult<String> {
    validate_notes(notes)?.ok_or_else(|| ValidationError::Required {
        field: "notes".to_string(),
    })
}

// =============================================================================
// Amounts
// =============================================================================

/// Opening float: zero is allowed (a drawer may start empty).
pub fn validate_opening_amount(amount: Money) -> ValidationResult<()> {
    non_negative("opening_amount", amount)?;
    within_max("opening_amount", amount)
}

/// Declared count at close: zero is allowed, negative is not.
pub fn validate_closing_amount(amount: Money) -> ValidationResult<()> {
    non_negative("closing_amount", amount)?;
    within_max("closing_amount", amount)
}

/// Sale totals and movement amounts must be strictly positive; the
/// direction of a movement comes from its type.
///
/// ## Rules
/// - Must be greater than zero
/// - Must not exceed MAX_AMOUNT (1,000,000,000.00)
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    within_max(field, amount)
}

fn non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn within_max(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents() > MAX_AMOUNT {
        return Err(ValidationError::ExceedsMax {
            field: field.to_string(),
            max: Money::from_cents(MAX_AMOUNT),
        });
    }
    Ok(())
}

// =============================================================================
// Labels
// =============================================================================

/// A sale's payment label must map to a payment category.
pub fn validate_payment_method(label: &str) -> ValidationResult<PaymentCategory> {
    PaymentCategory::classify(label).ok_or_else(|| ValidationError::NotAllowed {
        field: "payment_method".to_string(),
        allowed: [PaymentCategory::Cash, PaymentCategory::Card, PaymentCategory::Transfer]
            .iter()
            .flat_map(|c| c.labels().iter().map(|l| l.to_string()))
            .collect(),
    })
}

/// A recorded movement must be inbound or outbound. The closing type is
/// written only by the close commands.
pub fn validate_movement_type(label: &str) -> ValidationResult<MovementCategory> {
    match MovementCategory::classify(label) {
        Some(category @ (MovementCategory::Inbound | MovementCategory::Outbound)) => Ok(category),
        _ => Err(ValidationError::NotAllowed {
            field: "movement_type".to_string(),
            allowed: [MovementCategory::Inbound, MovementCategory::Outbound]
                .iter()
                .flat_map(|c| c.labels().iter().map(|l| l.to_string()))
                .collect(),
        }),
    }
}

// =============================================================================
// History Filter
// =============================================================================

/// Validates a result limit, falling back to `default_limit` when absent.
///
/// ## Example
/// ```rust
/// use cashbox_core::validation::validate_history_limit;
///
/// assert_eq!(validate_history_limit(None, 50).unwrap(), 50);
/// assert_eq!(validate_history_limit(Some(10), 50).unwrap(), 10);
/// assert!(validate_history_limit(Some(0), 50).is_err());
/// assert!(validate_history_limit(Some(101), 50).is_err());
/// ```
pub fn validate_history_limit(limit: Option<u32>, default_limit: u32) -> ValidationResult<u32> {
    let limit = limit.unwrap_or(default_limit);
    if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: i64::from(MAX_HISTORY_LIMIT),
        });
    }
    Ok(limit)
}

/// Validates the whole filter shape and returns the effective limit.
pub fn validate_history_filter(filter: &HistoryFilter, default_limit: u32) -> ValidationResult<u32> {
    if let Some(terminal_id) = &filter.terminal_id {
        validate_id("terminal_id", terminal_id)?;
    }
    if let Some(location_id) = &filter.location_id {
        validate_id("location_id", location_id)?;
    }
    if let (Some(start), Some(end)) = (filter.start_date, filter.end_date) {
        if start > end {
            return Err(ValidationError::InvertedRange {
                start_field: "start_date".to_string(),
                end_field: "end_date".to_string(),
            });
        }
    }
    validate_history_limit(filter.limit, default_limit)
}

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses a decimal amount typed by an operator ("200", "199.5", "-3.25")
/// into minor units. At most two decimal places, and no larger than
/// MAX_AMOUNT either way. Sign rules are left to the command's own check.
///
/// ## Example
/// ```rust
/// use cashbox_core::validation::parse_amount;
///
/// assert_eq!(parse_amount("amount", "230.5").unwrap().cents(), 23050);
/// assert!(parse_amount("amount", "12,00").is_err());
/// assert!(parse_amount("amount", "1.234").is_err());
/// assert!(parse_amount("amount", "1000000000.01").is_err());
/// ```
pub fn parse_amount(field: &str, text: &str) -> ValidationResult<Money> {
    let amount: Money = text.parse().map_err(|e: ParseMoneyError| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })?;

    if amount.cents().unsigned_abs() > MAX_AMOUNT.unsigned_abs() {
        return Err(ValidationError::ExceedsMax {
            field: field.to_string(),
            max: Money::from_cents(MAX_AMOUNT),
        });
    }
    Ok(amount)
}

// =============================================================================
// Unit Tests
// =============================================================================
