//! # cashbox-core: Pure Domain Logic for Cashbox
//!
//! Types, rules and arithmetic for cash-register sessions, with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cashbox Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                back-office (CLI / presentation)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        cashbox-shift (SessionLifecycle, SessionHistory)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cashbox-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌─────────────┐  ┌──────────┐  │   │
//! │  │   │   types   │  │   money   │  │ reconcile   │  │validation│  │   │
//! │  │   │  Session  │  │   Money   │  │  Summary    │  │  rules   │  │   │
//! │  │   │  Status   │  │           │  │  Breakdown  │  │  checks  │  │   │
//! │  │   └───────────┘  └───────────┘  └─────────────┘  └──────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                cashbox-db (Session Store)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Sessions, movements, sales, terminals and the status machine
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`category`] - Label tables for payment methods and movement types
//! - [`reconcile`] - The Reconciliation Calculator
//! - [`error`] - Domain error types
//! - [`validation`] - Command and filter validation
//!
//! ## Example Usage
//!
//! ```rust
//! use cashbox_core::money::Money;
//! use cashbox_core::reconcile::reconcile;
//! use cashbox_core::types::CashSession;
//! use chrono::Utc;
//!
//! let session = CashSession::open("s-1", "term-1", "user-1", Money::from_cents(20000), Utc::now());
//! let summary = reconcile(&session, &[], &[]).unwrap();
//!
//! // No activity: the drawer should hold exactly the opening float
//! assert_eq!(summary.theoretical_cash, Money::from_cents(20000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod category;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use category::{MovementCategory, PaymentCategory};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use reconcile::{Breakdown, ReconciliationSummary};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of history rows returned when the caller does not ask for a limit.
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Hard cap on history rows per query.
///
/// ## Business Reason
/// History is rendered in the back office and exported by reporting jobs;
/// larger pulls page through with date ranges instead.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Largest single amount (in minor units) a command accepts: 1,000,000,000.00.
///
/// ## Business Reason
/// Catches typos such as a pasted card number in the amount field, and
/// keeps every per-session total far inside `i64`.
pub const MAX_AMOUNT: i64 = 100_000_000_000;

/// Maximum length of free-text session notes.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Note written on a duplicate session that a reopen voided.
pub const AUTO_VOID_NOTE: &str = "auto-voided by reopen";
