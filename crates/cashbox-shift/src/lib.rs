//! # cashbox-shift: Session Lifecycle and History Services
//!
//! The services a presentation layer talks to. Each public method is one
//! command or query, runs in one unit of work and reports failures through
//! [`ShiftError`].
//!
//! ## Service Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   SessionLifecycle                      SessionHistory                  │
//! │   ─────────────────                     ──────────────                  │
//! │   open                                  history(filter)                 │
//! │   close / auto_close                    detail(session_id)              │
//! │   auto_close_stale                      reconciliation(session_id)      │
//! │   reopen                                                                │
//! │   record_sale / record_movement                                         │
//! │   current_session                                                       │
//! │            │                                    │                       │
//! │            └──────────────┬─────────────────────┘                       │
//! │                           ▼                                             │
//! │          cashbox_db::Database::begin() ──► UnitOfWork                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use cashbox_core::Money;
//! use cashbox_db::{Database, DbConfig};
//! use cashbox_shift::{CloseRequest, SessionLifecycle};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DbConfig::new("cashbox.db")).await?;
//! let lifecycle = SessionLifecycle::new(db);
//!
//! let session = lifecycle.open("term-1", "user-1", Money::from_cents(20000)).await?;
//! lifecycle.record_sale(&session.id, "CASH", Money::from_cents(5000)).await?;
//!
//! let outcome = lifecycle
//!     .close(&session.id, CloseRequest::new(Money::from_cents(25000)))
//!     .await?;
//! assert!(outcome.session.cash_difference.unwrap().is_zero());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{ConfigError, ConfigResult, ShiftConfig};
pub use error::{ErrorKind, ShiftError, ShiftResult};
pub use history::SessionHistory;
pub use lifecycle::{CloseOutcome, CloseRequest, ReopenOutcome, SessionLifecycle};
