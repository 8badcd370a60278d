//! # officine-core: Pure Business Logic for Officine
//!
//! This crate is the **heart** of Officine, a pharmacy inventory client.
//! It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Officine Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                          UI Shell                               │   │
//! │  │    Dashboard ──► Sales ──► Expirations ──► Validation          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 officine-client (I/O Layer)                     │   │
//! │  │    AuthStore, DataStore, REST gateway, session persistence     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ officine-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   stock   │  │  expiry   │  │ validation│  │   │
//! │  │   │  Product  │  │  deduct   │  │  buckets  │  │   rules   │  │   │
//! │  │   │   Sale    │  │  restore  │  │  status   │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                 │   │
//! │  │   │   money   │  │  reports  │  │  history  │                 │   │
//! │  │   │   Money   │  │ dashboard │  │  journal  │                 │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, ProductRequest, User, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Stock movement rules (deduct, restore, edit deltas)
//! - [`expiry`] - Expiration status and three-way catalog bucketing
//! - [`reports`] - Dashboard, sales-screen and history aggregations
//! - [`history`] - Local activity journal entries
//! - [`error`] - Domain error types
//! - [`validation`] - Form input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Network, file system and clock access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! Dates and timestamps (`today`, `now`) and freshly minted IDs always come
//! in as parameters. officine-client owns the clock and the ID generator.
//!
//! ## Example Usage
//!
//! ```rust
//! use officine_core::money::Money;
//! use officine_core::stock;
//! use officine_core::types::Product;
//! use chrono::NaiveDate;
//!
//! let mut product = Product {
//!     id: "12".to_string(),
//!     nom: "Doliprane 1000mg".to_string(),
//!     categorie: "Antalgique".to_string(),
//!     numero_lot: "LOT-2026-04".to_string(),
//!     date_peremption: NaiveDate::from_ymd_opt(2027, 4, 30).unwrap(),
//!     quantite_boites: 10,
//!     quantite_unites: 8,
//!     prix_cents: 450, // 4.50 EUR, never a float
//!     fournisseur: "Sanofi".to_string(),
//!     description: String::new(),
//! };
//!
//! // Selling 3 boxes leaves 7 on the shelf
//! stock::deduct_for_sale(&mut product, 3).unwrap();
//! assert_eq!(product.quantite_boites, 7);
//!
//! // The line total stays in integer cents
//! let total = Money::from_cents(product.prix_cents).multiply_quantity(3);
//! assert_eq!(total.cents(), 1350);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod expiry;
pub mod history;
pub mod money;
pub mod reports;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use officine_core::Money` instead of
// `use officine_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of boxes in a single sale
///
/// ## Business Reason
/// Prevents accidental over-selling (e.g., typing 1000 instead of 10).
/// Matches the upper bound enforced by the sale form.
pub const MAX_SALE_QUANTITY: i64 = 999;

/// Minutes during which a seller may cancel their own sale
///
/// ## Business Reason
/// Covers the "customer changed their mind at the counter" case without
/// letting old records be silently rewritten. Admins are not bound by it.
pub const SALE_CANCEL_WINDOW_MINUTES: i64 = 10;

/// Days-to-expiry threshold below which a product counts as expiring soon
///
/// A product expiring today or within the next 30 days lands in the
/// "expiring soon" bucket; strictly past dates count as expired.
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Category assigned to stub products created from approved requests
pub const STUB_CATEGORY: &str = "Non classé";

/// Supplier assigned to stub products created from approved requests
pub const STUB_SUPPLIER: &str = "Inconnu";

/// Lot number assigned to stub products created from approved requests
///
/// The pharmacist replaces it with the real lot when the delivery arrives.
pub const STUB_LOT_NUMBER: &str = "PENDING";

/// Description stamped on stub products so they are easy to spot and clean up
pub const STUB_DESCRIPTION: &str = "Généré depuis une demande validée";
