//! # Stock Rules
//!
//! The stock-mutation arithmetic for box quantities.
//!
//! ## The Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantite_boites >= 0, ALWAYS                                           │
//! │                                                                         │
//! │  Decremented only by:        Incremented only by:                       │
//! │  • a confirmed sale          • cancelling a sale                        │
//! │  • enlarging a sale          • shrinking a sale                         │
//! │                              • an approved request                      │
//! │                              • a manual admin edit                      │
//! │                                                                         │
//! │  Every decrement is guarded by an availability check FIRST, so the      │
//! │  subtraction itself can never go below zero.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions here are pure: they take the cached product by `&mut` and
//! either mutate it or return an error leaving it untouched. The data store
//! calls them under its write lock, after its local guards and before or
//! after the network call as each operation requires.

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

// =============================================================================
// Availability Check
// =============================================================================

/// Checks that `requested` boxes can be taken from the product's shelf.
///
/// ## Example
/// ```rust
/// use officine_core::stock::check_available;
/// # use officine_core::types::Product;
/// # use chrono::NaiveDate;
/// # let product = Product {
/// #     id: "p1".into(), nom: "Doliprane".into(), categorie: "Antalgique".into(),
/// #     numero_lot: "L1".into(),
/// #     date_peremption: NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
/// #     quantite_boites: 10, quantite_unites: 0, prix_cents: 500,
/// #     fournisseur: "Sanofi".into(), description: String::new(),
/// # };
///
/// assert!(check_available(&product, 10).is_ok());
/// assert!(check_available(&product, 11).is_err());
/// ```
pub fn check_available(product: &Product, requested: i64) -> CoreResult<()> {
    if requested > product.quantite_boites {
        return Err(CoreError::InsufficientStock {
            produit: product.nom.clone(),
            available: product.quantite_boites,
            requested,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Mutations
// =============================================================================

/// Removes `quantite_vendue` boxes for a confirmed sale.
///
/// Fails with `InsufficientStock` and leaves the product untouched when the
/// shelf does not hold enough boxes. The caller runs this check BEFORE the
/// network call so a doomed sale never reaches the backend.
pub fn deduct_for_sale(product: &mut Product, quantite_vendue: i64) -> CoreResult<()> {
    check_available(product, quantite_vendue)?;
    product.quantite_boites -= quantite_vendue;
    Ok(())
}

/// Puts `quantite_vendue` boxes back after a sale is cancelled.
pub fn restore_for_cancellation(product: &mut Product, quantite_vendue: i64) {
    product.quantite_boites += quantite_vendue;
}

/// Adjusts stock for a sale whose quantity changed from `old_qty` to
/// `new_qty`.
///
/// The shelf moves by the signed difference: raising the sale takes more
/// boxes, lowering it gives boxes back. A raise beyond what is currently
/// available fails with `InsufficientStock` and leaves the product
/// untouched.
///
/// ## Round Trip
/// ```text
/// stock 10, sale 3         (shelf already reflects the 3)
///      │ edit sale to 5
///      ▼
/// apply_edit_delta(old=3, new=5) → shelf 8
///      │ edit sale back to 3
///      ▼
/// apply_edit_delta(old=5, new=3) → shelf 10   (back where it started)
/// ```
pub fn apply_edit_delta(product: &mut Product, old_qty: i64, new_qty: i64) -> CoreResult<()> {
    let increase = new_qty - old_qty;
    if increase > 0 {
        check_available(product, increase)?;
    }
    product.quantite_boites -= increase;
    Ok(())
}

// =============================================================================
// Request Mutations
// =============================================================================

/// Credits `quantite_demandee` boxes when a replenishment request is
/// approved.
pub fn credit_for_request(product: &mut Product, quantite_demandee: i64) {
    product.quantite_boites += quantite_demandee;
}

// =============================================================================
// Unit Tests
// =============================================================================
