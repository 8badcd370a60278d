//! # Expiration Bucketing
//!
//! Pure date arithmetic for the expiration tracking screen.
//!
//! ## Bucketing Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  days = date_peremption − today   (whole calendar days)                 │
//! │                                                                         │
//! │  days < 0          → EXPIRED        (strictly before today)             │
//! │  0 <= days <= 30   → EXPIRING SOON  (today itself counts)               │
//! │  days > 30         → VALID                                              │
//! │                                                                         │
//! │  The three buckets partition the catalog: every product lands in        │
//! │  exactly one.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `today` is always a parameter, never read from the system clock, so every
//! computation here is deterministic and the screens decide what "now" means.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Product;
use crate::EXPIRING_SOON_DAYS;

// =============================================================================
// Expiry Status
// =============================================================================

/// Where a product stands relative to its expiration date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    /// Expiration date is strictly before today.
    Expired,
    /// Expires today or within the next 30 days.
    ExpiringSoon,
    /// More than 30 days of shelf life left.
    Valid,
}

// =============================================================================
// Day Arithmetic
// =============================================================================

/// Whole days between `today` and the expiration date.
///
/// Negative when the date is already past, zero when it expires today.
#[inline]
pub fn days_until_expiry(date_peremption: NaiveDate, today: NaiveDate) -> i64 {
    (date_peremption - today).num_days()
}

/// Classifies a single expiration date against `today`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use officine_core::expiry::{expiry_status, ExpiryStatus};
///
/// let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
/// let in_15_days = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
///
/// assert_eq!(expiry_status(in_15_days, today), ExpiryStatus::ExpiringSoon);
/// ```
pub fn expiry_status(date_peremption: NaiveDate, today: NaiveDate) -> ExpiryStatus {
    let days = days_until_expiry(date_peremption, today);

    if days < 0 {
        ExpiryStatus::Expired
    } else if days <= EXPIRING_SOON_DAYS {
        ExpiryStatus::ExpiringSoon
    } else {
        ExpiryStatus::Valid
    }
}

// =============================================================================
// Bucketing
// =============================================================================

/// The expiration screen's three product buckets.
///
/// Owned copies so the UI can render them after the cache moves on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryBuckets {
    pub expired: Vec<Product>,
    pub expiring_soon: Vec<Product>,
    pub valid: Vec<Product>,
}

impl ExpiryBuckets {
    /// Total products across the three buckets.
    pub fn total(&self) -> usize {
        self.expired.len() + self.expiring_soon.len() + self.valid.len()
    }
}

/// Partitions the catalog by expiration status.
///
/// Every product lands in exactly one bucket; order within a bucket follows
/// catalog order.
pub fn bucket_products(products: &[Product], today: NaiveDate) -> ExpiryBuckets {
    let mut buckets = ExpiryBuckets::default();

    for product in products {
        match expiry_status(product.date_peremption, today) {
            ExpiryStatus::Expired => buckets.expired.push(product.clone()),
            ExpiryStatus::ExpiringSoon => buckets.expiring_soon.push(product.clone()),
            ExpiryStatus::Valid => buckets.valid.push(product.clone()),
        }
    }

    buckets
}

// =============================================================================
// Unit Tests
// =============================================================================
