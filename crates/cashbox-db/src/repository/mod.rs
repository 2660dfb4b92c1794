//! # Repository Module
//!
//! Table-level access for the Session Store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  SessionLifecycle / SessionHistory                                     │
//! │       │                                                                 │
//! │       │  let mut uow = db.begin().await?;                              │
//! │       │  uow.sessions().get(id)                                        │
//! │       ▼                                                                 │
//! │  UnitOfWork ── lends its transaction connection ──► XxxRepository<'c>  │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Services never write SQL; repositories never make lifecycle decisions │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SessionRepository`](session::SessionRepository) - Session rows and status writes
//! - [`TerminalRepository`](terminal::TerminalRepository) - Terminal rows and the per-terminal lock
//! - [`UserRepository`](user::UserRepository) - Directory lookups
//! - [`SaleRepository`](sale::SaleRepository) - Sales append path
//! - [`MovementRepository`](movement::MovementRepository) - Cash movements
//! - [`HistoryRepository`](history::HistoryRepository) - Joined history reads

pub mod history;
pub mod movement;
pub mod sale;
pub mod session;
pub mod terminal;
pub mod user;
