//! # Label Categories
//!
//! Payment methods and movement types arrive as free-form labels from
//! several till front-ends ("CASH", "EFECTIVO", "Tarjeta Debito", ...).
//! Reconciliation only cares about the category a label belongs to.
//!
//! ## Normalization
//! ```text
//! "  tarjeta-debito " ──► trim ──► uppercase ──► '-' / ' ' → '_' ──► "TARJETA_DEBITO"
//!                                                                          │
//!                                                                          ▼
//!                                                          lookup table ──► Card
//! ```
//!
//! Unknown labels classify to `None` and are excluded from every category
//! sum, and so from `total_sales` as well.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Movement type written when a session is closed.
pub const CLOSING_MOVEMENT_TYPE: &str = "CLOSING";

/// Canonicalizes a raw label for table lookup.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

fn lookup<T: Copy>(table: &[(T, &[&str])], label: &str) -> Option<T> {
    let normalized = normalize_label(label);
    table
        .iter()
        .find(|(_, labels)| labels.contains(&normalized.as_str()))
        .map(|(category, _)| *category)
}

// =============================================================================
// Payment Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentCategory {
    Cash,
    Card,
    Transfer,
}

const PAYMENT_LABELS: &[(PaymentCategory, &[&str])] = &[
    (PaymentCategory::Cash, &["CASH", "EFECTIVO"]),
    (
        PaymentCategory::Card,
        &[
            "CARD",
            "DEBIT",
            "CREDIT",
            "TARJETA",
            "DEBITO",
            "CREDITO",
            "TARJETA_DEBITO",
            "TARJETA_CREDITO",
            "EXTERNAL_CARD",
        ],
    ),
    (
        PaymentCategory::Transfer,
        &["TRANSFER", "TRANSFERENCIA", "BANK_TRANSFER"],
    ),
];

impl PaymentCategory {
    /// Maps a payment label to its category.
    pub fn classify(label: &str) -> Option<Self> {
        lookup(PAYMENT_LABELS, label)
    }

    /// Every label accepted for this category, canonical form.
    pub fn labels(&self) -> &'static [&'static str] {
        PAYMENT_LABELS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, labels)| *labels)
            .unwrap_or(&[])
    }
}

// =============================================================================
// Movement Category
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum MovementCategory {
    /// Cash put into the drawer.
    Inbound,
    /// Cash taken out of the drawer.
    Outbound,
    /// The declared count recorded by a close. Never part of theoretical cash.
    Closing,
}

const MOVEMENT_LABELS: &[(MovementCategory, &[&str])] = &[
    (
        MovementCategory::Inbound,
        &["DEPOSIT", "EXTRA_INCOME", "INCOME", "INGRESO", "INGRESO_EXTRA"],
    ),
    (
        MovementCategory::Outbound,
        &["WITHDRAWAL", "EXPENSE", "RETIRO", "GASTO", "EGRESO"],
    ),
    (MovementCategory::Closing, &["CLOSING", "CIERRE"]),
];

impl MovementCategory {
    /// Maps a movement label to its category.
    pub fn classify(label: &str) -> Option<Self> {
        lookup(MOVEMENT_LABELS, label)
    }

    pub fn labels(&self) -> &'static [&'static str] {
        MOVEMENT_LABELS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, labels)| *labels)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  tarjeta-debito "), "TARJETA_DEBITO");
        assert_eq!(normalize_label("Bank Transfer"), "BANK_TRANSFER");
        assert_eq!(normalize_label("CASH"), "CASH");
    }

    #[test]
    fn test_payment_synonyms() {
        assert_eq!(PaymentCategory::classify("efectivo"), Some(PaymentCategory::Cash));
        assert_eq!(PaymentCategory::classify("Cash"), Some(PaymentCategory::Cash));
        assert_eq!(PaymentCategory::classify("DEBITO"), Some(PaymentCategory::Card));
        assert_eq!(PaymentCategory::classify("tarjeta credito"), Some(PaymentCategory::Card));
        assert_eq!(PaymentCategory::classify("external-card"), Some(PaymentCategory::Card));
        assert_eq!(PaymentCategory::classify("transferencia"), Some(PaymentCategory::Transfer));
        assert_eq!(PaymentCategory::classify("VOUCHER"), None);
        assert_eq!(PaymentCategory::classify(""), None);
    }

    #[test]
    fn test_movement_synonyms() {
        assert_eq!(MovementCategory::classify("ingreso extra"), Some(MovementCategory::Inbound));
        assert_eq!(MovementCategory::classify("DEPOSIT"), Some(MovementCategory::Inbound));
        assert_eq!(MovementCategory::classify("retiro"), Some(MovementCategory::Outbound));
        assert_eq!(MovementCategory::classify("Expense"), Some(MovementCategory::Outbound));
        assert_eq!(MovementCategory::classify("cierre"), Some(MovementCategory::Closing));
        assert_eq!(
            MovementCategory::classify(CLOSING_MOVEMENT_TYPE),
            Some(MovementCategory::Closing)
        );
        assert_eq!(MovementCategory::classify("ADJUSTMENT"), None);
    }

    #[test]
    fn test_labels_are_canonical() {
        for category in [PaymentCategory::Cash, PaymentCategory::Card, PaymentCategory::Transfer] {
            for label in category.labels() {
                assert_eq!(normalize_label(label), *label);
                assert_eq!(PaymentCategory::classify(label), Some(category));
            }
        }
        assert!(MovementCategory::Closing.labels().contains(&"CIERRE"));
    }
}
