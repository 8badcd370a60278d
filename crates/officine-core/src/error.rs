//! # Error Types
//!
//! Domain-specific error types for officine-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  officine-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  officine-client errors (separate crate)                                │
//! │  └── ClientError      - HTTP, decode, session failures                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → UI notification      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, ID, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
///
/// These errors represent business rule violations. They are raised by the
/// stock rules and by the data store's local guards before any network call,
/// and translated to user-facing notifications by the UI layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found in the cached catalog.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist in the cache
    /// - Product was deleted on the server and the cache already noticed
    /// - A request references a product that is gone
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to record a sale or enlarge one.
    ///
    /// ## When This Occurs
    /// - Selling more boxes than the product has
    /// - Raising a sale's quantity beyond what is left on the shelf
    ///
    /// ## User Workflow
    /// ```text
    /// Record sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { produit: "Doliprane 1000mg", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Stock insuffisant (3 boîtes disponibles)"
    /// ```
    #[error("Insufficient stock for {produit}: available {available}, requested {requested}")]
    InsufficientStock {
        produit: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found in the cache.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Replenishment request not found in the cache.
    #[error("Request not found: {0}")]
    RequestNotFound(String),

    /// Request is already APPROVED or REJECTED.
    ///
    /// ## When This Occurs
    /// - Double-clicking the validation button
    /// - Two admins racing on the same request
    ///
    /// Terminal statuses never transition again, so the second caller gets
    /// this error instead of a second stock increment.
    #[error("Request {id} is already finalized as {status}")]
    RequestAlreadyFinalized { id: String, status: String },

    /// The sale is too old to be cancelled by its owner.
    ///
    /// Owners get a short cancellation window after recording a sale;
    /// outside it only an admin may remove the sale.
    #[error("Sale {id} can no longer be cancelled (window is {window_minutes} minutes)")]
    CancelWindowExpired { id: String, window_minutes: i64 },

    /// The caller is not the user who recorded the sale.
    #[error("Sale {id} belongs to another user")]
    NotSaleOwner { id: String },

    /// The operation is reserved to admins.
    #[error("Operation requires the ADMIN role: {operation}")]
    AdminRequired { operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when form input doesn't meet requirements.
/// Used for early validation before any network call.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid date, invalid price string).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
