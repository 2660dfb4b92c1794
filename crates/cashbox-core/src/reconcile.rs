//! # Reconciliation Calculator
//!
//! Turns one session's movements and sales into the drawer summary used by
//! the close command and by the detail view.
//!
//! ## Computation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales ──► PaymentCategory::classify(payment_method)                    │
//! │              ├── Cash     ──► cash_sales                                │
//! │              ├── Card     ──► card_sales                                │
//! │              ├── Transfer ──► transfer_sales                            │
//! │              └── None     ──► (ignored)                                 │
//! │                                                                         │
//! │  movements ──► MovementCategory::classify(movement_type)                │
//! │              ├── Inbound  ──► deposits                                  │
//! │              ├── Outbound ──► withdrawals                               │
//! │              └── Closing / None ──► (ignored)                           │
//! │                                                                         │
//! │  theoretical_cash = opening_amount + cash_sales + deposits - withdrawals│
//! │  total_sales      = cash_sales + card_sales + transfer_sales            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is checked integer arithmetic on [`Money`]; the same
//! inputs always produce the same summary. A total that leaves the `i64`
//! range is reported as [`CoreError::TotalOutOfRange`], never wrapped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::category::{normalize_label, MovementCategory, PaymentCategory};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CashMovement, CashSession, Sale};

// =============================================================================
// Summary
// =============================================================================

/// Financial summary of one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReconciliationSummary {
    pub opening_amount: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    pub transfer_sales: Money,
    pub deposits: Money,
    pub withdrawals: Money,
    /// Cash the drawer should hold.
    pub theoretical_cash: Money,
    /// Sale volume across every payment category. Not part of the drawer.
    pub total_sales: Money,
}

/// Computes the summary for a session from its full movement and sale lists.
pub fn reconcile(
    session: &CashSession,
    movements: &[CashMovement],
    sales: &[Sale],
) -> CoreResult<ReconciliationSummary> {
    let add = |total: Money, amount: Money, name: &'static str| {
        total.checked_add(amount).ok_or_else(|| out_of_range(&session.id, name))
    };

    let mut summary = ReconciliationSummary {
        opening_amount: session.opening_amount,
        ..Default::default()
    };

    for sale in sales {
        match PaymentCategory::classify(&sale.payment_method) {
            Some(PaymentCategory::Cash) => {
                summary.cash_sales = add(summary.cash_sales, sale.total_amount, "cash_sales")?
            }
            Some(PaymentCategory::Card) => {
                summary.card_sales = add(summary.card_sales, sale.total_amount, "card_sales")?
            }
            Some(PaymentCategory::Transfer) => {
                summary.transfer_sales = add(summary.transfer_sales, sale.total_amount, "transfer_sales")?
            }
            None => {}
        }
    }

    for movement in movements {
        match MovementCategory::classify(&movement.movement_type) {
            Some(MovementCategory::Inbound) => {
                summary.deposits = add(summary.deposits, movement.amount, "deposits")?
            }
            Some(MovementCategory::Outbound) => {
                summary.withdrawals = add(summary.withdrawals, movement.amount, "withdrawals")?
            }
            Some(MovementCategory::Closing) | None => {}
        }
    }

    summary.theoretical_cash = summary
        .opening_amount
        .checked_add(summary.cash_sales)
        .and_then(|m| m.checked_add(summary.deposits))
        .and_then(|m| m.checked_sub(summary.withdrawals))
        .ok_or_else(|| out_of_range(&session.id, "theoretical_cash"))?;
    summary.total_sales = summary
        .cash_sales
        .checked_add(summary.card_sales)
        .and_then(|m| m.checked_add(summary.transfer_sales))
        .ok_or_else(|| out_of_range(&session.id, "total_sales"))?;

    Ok(summary)
}

fn out_of_range(session_id: &str, total: &'static str) -> CoreError {
    CoreError::TotalOutOfRange {
        session_id: session_id.to_string(),
        total,
    }
}

// =============================================================================
// Breakdowns
// =============================================================================

/// One row of a drill-down: a label with how many rows carried it and
/// their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Breakdown {
    /// Normalized label ("EFECTIVO", "TARJETA_DEBITO", "WITHDRAWAL").
    pub label: String,
    pub count: i64,
    pub total: Money,
}

fn breakdown<'a>(rows: impl Iterator<Item = (&'a str, &'a str, Money)>) -> CoreResult<Vec<Breakdown>> {
    let mut groups: BTreeMap<String, (i64, Money)> = BTreeMap::new();
    for (session_id, label, amount) in rows {
        let entry = groups.entry(normalize_label(label)).or_default();
        entry.0 += 1;
        entry.1 = entry
            .1
            .checked_add(amount)
            .ok_or_else(|| out_of_range(session_id, "breakdown"))?;
    }
    Ok(groups
        .into_iter()
        .map(|(label, (count, total))| Breakdown { label, count, total })
        .collect())
}

/// Sales grouped by payment label, sorted by label.
pub fn breakdown_sales(sales: &[Sale]) -> CoreResult<Vec<Breakdown>> {
    breakdown(sales.iter().map(|s| (s.session_id.as_str(), s.payment_method.as_str(), s.total_amount)))
}

/// Movements grouped by type label, sorted by label.
pub fn breakdown_movements(movements: &[CashMovement]) -> CoreResult<Vec<Breakdown>> {
    breakdown(movements.iter().map(|m| (m.session_id.as_str(), m.movement_type.as_str(), m.amount)))
}

// =============================================================================
// Unit Tests
// =============================================================================
