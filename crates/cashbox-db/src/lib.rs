//! # cashbox-db: Session Store
//!
//! Durable storage for cash sessions, movements, sales and the
//! terminal/user directory. SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cashbox Data Flow                                │
//! │                                                                         │
//! │  SessionLifecycle::reopen(session_id)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   cashbox-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  UnitOfWork   │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │───►│ (one tx)      │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ sessions()    │    │ 001_initial_ │  │   │
//! │  │   │ begin()       │    │ terminals()   │    │   schema.sql │  │   │
//! │  │   │               │    │ sales() ...   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`unit_of_work`] - Transaction wrapper handing out repositories
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Table-level queries
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cashbox_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("cashbox.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! let session = uow.sessions().get("0b7c-41aa").await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;
