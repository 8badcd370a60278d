//! # Validation Module
//!
//! Form-input validation for Officine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form (TypeScript)                                          │
//! │  ├── Basic format checks (empty, length)                                │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any network call)                         │
//! │  ├── Required fields (nom, categorie, numero_lot)                       │
//! │  └── Numeric ranges (quantities, price)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend (Laravel 422 responses)                               │
//! │  └── Authoritative constraints; first field message surfaced            │
//! │                                                                         │
//! │  Defense in depth: a request that fails here never leaves the client    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use officine_core::validation::{validate_product_name, validate_quantity};
//!
//! validate_product_name("Doliprane 1000mg").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::MAX_SALE_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
///
/// ## Example
/// ```rust
/// use officine_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Doliprane 1000mg").is_ok());
/// assert!(validate_product_name("").is_err());
/// ```
pub fn validate_product_name(nom: &str) -> ValidationResult<()> {
    let nom = nom.trim();

    if nom.is_empty() {
        return Err(ValidationError::Required {
            field: "nom".to_string(),
        });
    }

    if nom.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "nom".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a category name.
///
/// ## Rules
/// - Must not be empty (the product form requires one)
/// - Must be at most 100 characters
pub fn validate_category(categorie: &str) -> ValidationResult<()> {
    let categorie = categorie.trim();

    if categorie.is_empty() {
        return Err(ValidationError::Required {
            field: "categorie".to_string(),
        });
    }

    if categorie.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "categorie".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a manufacturing lot number.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use officine_core::validation::validate_lot_number;
///
/// assert!(validate_lot_number("LOT-2026-04").is_ok());
/// assert!(validate_lot_number("").is_err());
/// ```
pub fn validate_lot_number(numero_lot: &str) -> ValidationResult<()> {
    let numero_lot = numero_lot.trim();

    if numero_lot.is_empty() {
        return Err(ValidationError::Required {
            field: "numero_lot".to_string(),
        });
    }

    if numero_lot.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "numero_lot".to_string(),
            max: 50,
        });
    }

    if !numero_lot
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "numero_lot".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text comment on a replenishment request.
///
/// ## Rules
/// - Can be empty (comment is optional)
/// - Maximum 500 characters
pub fn validate_comment(commentaire: &str) -> ValidationResult<()> {
    if commentaire.trim().len() > 500 {
        return Err(ValidationError::TooLong {
            field: "commentaire".to_string(),
            max: 500,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale or request quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SALE_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Sale form: record sale                                                 │
/// │                                                                         │
/// │  User enters quantity: 5                                                │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                   │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantite must be positive"                │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "quantite must be between 1 and 999"      │
/// │       │                                                                 │
/// │       └── OK → Stock check, then POST /ventes                           │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantite".to_string(),
        });
    }

    if qty > MAX_SALE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantite".to_string(),
            min: 1,
            max: MAX_SALE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level entered on the product form.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (a product can be cataloged before it arrives)
pub fn validate_stock_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (stub products carry a zero price until edited)
///
/// ## Example
/// ```rust
/// use officine_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1250).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "prix".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
