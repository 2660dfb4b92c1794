//! # Unit of Work
//!
//! One lifecycle command = one transaction on one pooled connection.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut uow = db.begin().await?;                                       │
//! │                                                                         │
//! │  uow.terminals().lock_for_session(id, now)   ← takes the write lock     │
//! │  uow.sessions().get(id)                                                 │
//! │  uow.sales().count_by_session(..)                                       │
//! │  uow.sessions().reopen(id)                                              │
//! │  uow.terminals().mark_open(..)                                          │
//! │                                                                         │
//! │  uow.commit().await?;          ← all of it, or (on drop / `?`) none     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories borrow the transaction's connection for the duration of a
//! call, so two repositories can never be used at the same time and every
//! statement sees the writes made earlier in the same unit.

use sqlx::{Sqlite, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::history::HistoryRepository;
use crate::repository::movement::MovementRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::session::SessionRepository;
use crate::repository::terminal::TerminalRepository;
use crate::repository::user::UserRepository;

/// A transaction scoped to one command.
#[derive(Debug)]
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        UnitOfWork { tx }
    }

    pub fn sessions(&mut self) -> SessionRepository<'_> {
        SessionRepository::new(&mut self.tx)
    }

    pub fn terminals(&mut self) -> TerminalRepository<'_> {
        TerminalRepository::new(&mut self.tx)
    }

    pub fn users(&mut self) -> UserRepository<'_> {
        UserRepository::new(&mut self.tx)
    }

    pub fn sales(&mut self) -> SaleRepository<'_> {
        SaleRepository::new(&mut self.tx)
    }

    pub fn movements(&mut self) -> MovementRepository<'_> {
        MovementRepository::new(&mut self.tx)
    }

    pub fn history(&mut self) -> HistoryRepository<'_> {
        HistoryRepository::new(&mut self.tx)
    }

    /// Makes every write of this unit durable and visible.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Discards every write of this unit. Dropping has the same effect; this
    /// form reports failures.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
