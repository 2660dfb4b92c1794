//! # Money Module
//!
//! Provides the `Money` type for every amount that passes through a cash
//! drawer: opening floats, sales, deposits, withdrawals and declared counts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  A drawer reconciliation sums hundreds of small amounts:               │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A one-cent drift turns a balanced drawer into a reported shortage.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    opening + cash sales + deposits - withdrawals                       │
//! │    is exact, and cash_difference is exactly zero when it should be     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cashbox_core::money::Money;
//!
//! let float: Money = "200.00".parse().unwrap();
//! let drawer = float
//!     .checked_add(Money::from_cents(5000))
//!     .and_then(|m| m.checked_sub(Money::from_cents(2000)))
//!     .unwrap();
//! assert_eq!(drawer.cents(), 23000);
//! assert_eq!(drawer.to_string(), "230.00");
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: cash differences are negative when the drawer is short
/// - **Single field tuple struct**: zero-cost over the INTEGER column it maps to
/// - **Transparent in SQL**: stored as a plain INTEGER
/// - **Decimal in JSON**: serialized as an exact string ("230.00"), the same
///   unit an operator types on the command line
/// - **Checked arithmetic only**: totals report overflow instead of wrapping
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  opening_amount ──┐                                                     │
/// │  cash sales ──────┼──► theoretical cash ──► expected_closing_amount     │
/// │  deposits ────────┤                                   │                 │
/// │  withdrawals ─────┘                                   ▼                 │
/// │                         closing_amount ──► cash_difference              │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(#[ts(type = "string")] i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    ///
    /// ## Example
    /// ```rust
    /// use cashbox_core::money::Money;
    ///
    /// let float = Money::from_cents(1099);
    /// assert_eq!(float.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use cashbox_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).checked_add(Money::from_cents(1)), Some(Money::from_cents(1001)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    /// ```
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts `other`, `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Why a decimal amount could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseMoneyError {
    #[error("expected a decimal amount such as 200.00")]
    Malformed,

    #[error("at most two decimal places")]
    TooPrecise,

    #[error("amount is too large")]
    TooLarge,
}

/// Parses "200", "199.5" or "-3.25" into minor units.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (major, minor) = digits.split_once('.').unwrap_or((digits, ""));

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if major.is_empty() || !all_digits(major) || !all_digits(minor) {
            return Err(ParseMoneyError::Malformed);
        }
        if minor.len() > 2 {
            return Err(ParseMoneyError::TooPrecise);
        }

        let major: i64 = major.parse().map_err(|_| ParseMoneyError::TooLarge)?;
        let minor: i64 = format!("{minor:0<2}").parse().map_err(|_| ParseMoneyError::Malformed)?;
        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or(ParseMoneyError::TooLarge)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with two decimals. Logs and JSON output both use it.
///
/// ## Note
/// Currency symbols and localization belong to the presentation layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
