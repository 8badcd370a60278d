//! # Money Module
//!
//! Provides the `Money` type for handling prices safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  The backend serializes prices as decimal strings ("12.50"), and the   │
//! │  previous client parseFloat'ed them into IEEE doubles.                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    "12.50" parses to 1250 cents, exactly, every time                   │
//! │    Arithmetic is integer arithmetic; formatting is still "12.50"       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use officine_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1250); // 12,50 €
//!
//! // Parse the backend's decimal-string representation
//! let parsed: Money = "12.50".parse().unwrap();
//! assert_eq!(parsed, price);
//!
//! // Format back for the wire
//! assert_eq!(price.to_decimal_string(), "12.50");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (euro cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for corrections
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support; serializes as a bare integer
///
/// Every price in the system flows through this type: the wire module parses
/// the backend's decimal strings into it on receipt and formats them back on
/// send, so no floating point ever touches a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use officine_core::money::Money;
    ///
    /// let price = Money::from_cents(1250); // Represents 12,50 €
    /// assert_eq!(price.cents(), 1250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (euros) portion.
    ///
    /// ## Example
    /// ```rust
    /// use officine_core::money::Money;
    ///
    /// let price = Money::from_cents(1250);
    /// assert_eq!(price.euros(), 12);
    /// ```
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use officine_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // 2,99 €
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897); // 8,97 €
    /// ```
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Doliprane 2,99 €
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Sale total preview: 8,97 €
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Formats the value as the backend's decimal-string representation.
    ///
    /// Always two fraction digits, dot separator, no currency symbol:
    /// exactly the shape a Laravel `decimal:2` cast produces.
    ///
    /// ## Example
    /// ```rust
    /// use officine_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1250).to_decimal_string(), "12.50");
    /// assert_eq!(Money::from_cents(5).to_decimal_string(), "0.05");
    /// ```
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

// =============================================================================
// Decimal String Parsing
// =============================================================================

/// Parses the backend's decimal-string price representation.
///
/// Accepts `"12"`, `"12.5"`, `"12.50"`; rejects more than two fraction
/// digits, empty strings, and anything non-numeric. No `parseFloat`
/// round-trips: the string is split on the dot and assembled with integer
/// arithmetic.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "prix".to_string(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "prix".to_string(),
            });
        }

        let (sign, digits) = match s.strip_prefix('-') {
            Some(rest) => (-1i64, rest),
            None => (1i64, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("must be a decimal number"));
        }

        let cents_part = match frac.len() {
            0 => 0,
            1 | 2 => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid("must be a decimal number"));
                }
                let parsed: i64 = frac.parse().map_err(|_| invalid("must be a decimal number"))?;
                // "12.5" means 50 cents, not 5
                if frac.len() == 1 {
                    parsed * 10
                } else {
                    parsed
                }
            }
            _ => return Err(invalid("at most two decimal places")),
        };

        let euros: i64 = whole
            .parse()
            .map_err(|_| invalid("amount is too large"))?;

        Ok(Money(sign * (euros * 100 + cents_part)))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money the French way (`12,50 €`).
///
/// ## Note
/// This is for debugging and logs. Use frontend formatting for actual UI
/// display to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{},{:02} €",
            sign,
            self.euros().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
