//! # Domain Types
//!
//! Core domain types used throughout Officine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │ ProductRequest  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  nom            │   │  product_id(FK) │   │  product_id?    │       │
//! │  │  numero_lot     │   │  product_nom    │   │  status         │       │
//! │  │  quantite_boites│   │  quantite_vendue│   │  quantite_      │       │
//! │  │  prix_cents     │   │  created_at     │   │    demandee     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     User        │   │    UserRole     │   │  RequestStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  nom, prenom    │   │  Admin          │   │  EnAttente      │       │
//! │  │  role, badge_id │   │  Vendeur        │   │  Valide         │       │
//! │  └─────────────────┘   └─────────────────┘   │  Refuse         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Sales and requests carry denormalized name snapshots (`product_nom`,
//! `user_name`) so history rows and lists stay readable after the referenced
//! product or user changes or disappears.
//!
//! ## Identifiers
//! The backend issues integer ids; the client treats every entity id as an
//! opaque `String`, stringified at the wire boundary.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::{
    SALE_CANCEL_WINDOW_MINUTES, STUB_CATEGORY, STUB_DESCRIPTION, STUB_LOT_NUMBER, STUB_SUPPLIER,
};

// =============================================================================
// User Role
// =============================================================================

/// Role of a pharmacy user.
///
/// Wire values match the backend enum: `ADMIN`, `VENDEUR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Full access: catalog CRUD, request validation, unrestricted sale edits.
    Admin,
    /// Seller: records sales, files replenishment requests.
    Vendeur,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => f.write_str("ADMIN"),
            UserRole::Vendeur => f.write_str("VENDEUR"),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A pharmacy user.
///
/// The password never appears here: it exists only as a login argument and
/// is dropped as soon as the token comes back.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Last name.
    pub nom: String,

    /// First name.
    pub prenom: String,

    /// Email address; empty when the backend has none on file.
    pub email: String,

    /// Role controlling admin-only operations.
    pub role: UserRole,

    /// Physical badge identifier.
    pub badge_id: String,
}

impl User {
    /// Checks if the user holds the ADMIN role.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Full display name ("prenom nom"), trimmed when one part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.prenom, self.nom).trim().to_string()
    }

    /// Checks the minimum a persisted session must carry to be worth
    /// verifying: an email or an id, and a first or last name.
    pub fn has_essential_fields(&self) -> bool {
        (!self.email.is_empty() || !self.id.is_empty())
            && (!self.prenom.is_empty() || !self.nom.is_empty())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (opaque string).
    pub id: String,

    /// Display name.
    pub nom: String,

    /// Category name (denormalized from the category resource).
    pub categorie: String,

    /// Manufacturing lot number.
    pub numero_lot: String,

    /// Expiration date of the lot.
    #[ts(as = "String")]
    pub date_peremption: NaiveDate,

    /// Sealed boxes on the shelf. The stock unit every rule acts on.
    pub quantite_boites: i64,

    /// Loose units outside boxes (informational, never decremented by sales).
    pub quantite_unites: i64,

    /// Unit price in cents (smallest currency unit).
    pub prix_cents: i64,

    /// Supplier name (denormalized from the supplier resource).
    pub fournisseur: String,

    /// Free-text description; empty when the backend has none.
    pub description: String,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn prix(&self) -> Money {
        Money::from_cents(self.prix_cents)
    }

    /// Checks if at least one box is available for sale.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.quantite_boites > 0
    }

    /// Checks if the product is out of stock (zero boxes).
    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantite_boites == 0
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
/// Uses snapshot pattern to freeze the product and seller names at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Product sold.
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_nom: String,
    /// Boxes sold.
    pub quantite_vendue: i64,
    /// Business date of the sale.
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// User who recorded the sale.
    pub user_id: String,
    /// Seller name at time of sale (frozen).
    pub user_name: String,
    /// When the sale was recorded. Drives the cancellation window.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Checks if the sale is still inside its owner-cancellation window.
    ///
    /// ## Policy
    /// A seller may cancel their own sale for 10 minutes after recording it
    /// (fat-finger protection); after that only an admin can remove it.
    /// The comparison is inclusive at exactly the window boundary.
    pub fn within_cancel_window(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at <= Duration::minutes(SALE_CANCEL_WINDOW_MINUTES)
    }

    /// Checks if `user` is the one who recorded this sale.
    #[inline]
    pub fn recorded_by(&self, user: &User) -> bool {
        self.user_id == user.id
    }
}

// =============================================================================
// Request Status
// =============================================================================

/// Status of a replenishment request.
///
/// Wire values match the backend enum: `EN_ATTENTE`, `VALIDE`, `REFUSE`.
/// Terminal statuses never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RequestStatus {
    /// Awaiting an admin decision.
    #[serde(rename = "EN_ATTENTE")]
    EnAttente,
    /// Approved; stock was credited.
    #[serde(rename = "VALIDE")]
    Valide,
    /// Rejected; no stock effect.
    #[serde(rename = "REFUSE")]
    Refuse,
}

impl RequestStatus {
    /// Checks if the status is APPROVED or REJECTED.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::EnAttente)
    }

    /// The backend's wire spelling of the status.
    pub fn as_wire(&self) -> &'static str {
        match self {
            RequestStatus::EnAttente => "EN_ATTENTE",
            RequestStatus::Valide => "VALIDE",
            RequestStatus::Refuse => "REFUSE",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

// =============================================================================
// Product Request
// =============================================================================

/// A seller-initiated replenishment request, subject to admin validation.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub id: String,
    /// Referenced product; `None` means a not-yet-cataloged product.
    pub product_id: Option<String>,
    /// Requested product name (snapshot, or free text for new products).
    pub product_nom: String,
    /// Boxes requested.
    pub quantite_demandee: i64,
    /// Free-text justification; empty when the seller gave none.
    pub commentaire: String,
    /// PENDING until an admin decides, then terminal.
    pub status: RequestStatus,
    /// Requesting user.
    pub user_id: String,
    /// Requester name at creation time (frozen).
    pub user_name: String,
    /// Business date the request was filed.
    #[ts(as = "String")]
    pub date_creation: NaiveDate,
}

impl ProductRequest {
    /// Checks if the request still awaits a decision.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::EnAttente
    }

    /// Builds the placeholder product created when a request without a
    /// product reference is approved.
    ///
    /// The admin is expected to edit the real details in afterwards; the
    /// stub only reserves the name and the credited stock.
    pub fn stub_product(&self) -> Product {
        Product {
            // The backend assigns the real id on creation
            id: String::new(),
            nom: self.product_nom.clone(),
            categorie: STUB_CATEGORY.to_string(),
            numero_lot: STUB_LOT_NUMBER.to_string(),
            date_peremption: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or(NaiveDate::MAX),
            quantite_boites: self.quantite_demandee,
            quantite_unites: 0,
            prix_cents: 0,
            fournisseur: STUB_SUPPLIER.to_string(),
            description: STUB_DESCRIPTION.to_string(),
        }
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category (roster resource, read plus inline create).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub nom: String,
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier (read-only roster resource).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: String,
    pub nom: String,
    pub telephone: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
