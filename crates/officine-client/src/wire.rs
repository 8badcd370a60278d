//! # Wire Codecs
//!
//! Payload types matching the Laravel backend, and the translation layer
//! between them and the domain model.
//!
//! ## Translation Layer
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Wire <-> Domain Mapping                           │
//! │                                                                         │
//! │  Backend (snake_case, French)          Domain (officine-core)          │
//! │  ─────────────────────────────         ───────────────────────         │
//! │  ApiProduit { id: 12,            ──►   Product { id: "12",             │
//! │    prix: "4.50",                         prix_cents: 450,              │
//! │    date_peremption: "2027-04-30",        date_peremption: NaiveDate,   │
//! │    category: { nom: "..." } }            categorie: "..." }            │
//! │                                                                         │
//! │  ApiVente { date_vente:          ──►   Sale { date: NaiveDate,         │
//! │    "2026-03-01T12:34:56Z" }              created_at: DateTime<Utc> }   │
//! │                                                                         │
//! │  ApiDemandeProduit {             ──►   ProductRequest {                │
//! │    status: "EN_ATTENTE" }                status: RequestStatus }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Parse, Don't Validate
//! Conversion happens once, immediately on receipt. Anything malformed
//! (unknown status, unparseable price or date) fails with a `Decode` error
//! here instead of leaking loosely-typed data into the stores. Identifiers
//! are integers on the wire and opaque strings in the domain; the reverse
//! parse happens when building outbound payloads.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use officine_core::{
    Category, Money, Product, ProductRequest, RequestStatus, Sale, Supplier, User, UserRole,
};

use crate::error::{ClientError, ClientResult};

// =============================================================================
// Inbound Payloads
// =============================================================================

/// Category resource as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCategory {
    pub id: i64,
    pub nom: String,
}

/// Supplier resource as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFournisseur {
    pub id: i64,
    pub nom: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// User resource.
///
/// The roster and login endpoints return the full shape; ventes and demandes
/// embed a reduced `{id, nom, email}` form, so everything beyond those three
/// fields is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUtilisateur {
    pub id: i64,
    pub nom: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub badge_id: Option<String>,
}

/// Product resource as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProduit {
    pub id: i64,
    pub nom: String,
    pub categorie_id: i64,
    pub fournisseur_id: i64,
    pub numero_lot: String,
    pub date_peremption: String,
    pub quantite_boites: i64,
    pub quantite_unites: i64,
    /// Decimal string, e.g. "4.50" (Laravel decimal cast).
    pub prix: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<ApiCategory>,
    #[serde(default)]
    pub fournisseur: Option<ApiFournisseur>,
}

/// Sale resource as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiVente {
    pub id: i64,
    pub produit_id: i64,
    pub utilisateur_id: i64,
    pub quantite_vendue: i64,
    /// Full timestamp; the sale's business date is its date part.
    pub date_vente: String,
    #[serde(default)]
    pub produit: Option<ApiProduit>,
    #[serde(default)]
    pub utilisateur: Option<ApiUtilisateur>,
}

/// Replenishment request resource as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiDemandeProduit {
    pub id: i64,
    #[serde(default)]
    pub produit_id: Option<i64>,
    pub utilisateur_id: i64,
    pub quantite_demandee: i64,
    #[serde(default)]
    pub commentaire: Option<String>,
    pub status: String,
    pub date_creation: String,
    #[serde(default)]
    pub produit: Option<ApiProduit>,
    #[serde(default)]
    pub utilisateur: Option<ApiUtilisateur>,
}

/// Successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLoginResponse {
    pub token: String,
    pub user: ApiUtilisateur,
}

// =============================================================================
// Outbound Payloads
// =============================================================================

/// POST /login body.
#[derive(Debug, Serialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// POST /categories body.
#[derive(Debug, Serialize)]
pub struct NewCategoryPayload {
    pub nom: String,
}

/// POST /produits body.
#[derive(Debug, Serialize)]
pub struct NewProduitPayload {
    pub nom: String,
    pub categorie_id: i64,
    pub fournisseur_id: i64,
    pub numero_lot: String,
    pub date_peremption: String,
    pub quantite_boites: i64,
    pub quantite_unites: i64,
    /// Decimal string, matching the backend's decimal cast.
    pub prix: String,
    pub description: String,
}

/// PUT /produits/{id} body. Absent fields are left untouched server-side.
#[derive(Debug, Default, Serialize)]
pub struct ProduitUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorie_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fournisseur_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_lot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_peremption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantite_boites: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantite_unites: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// POST /ventes body.
#[derive(Debug, Serialize)]
pub struct NewVentePayload {
    pub produit_id: i64,
    pub utilisateur_id: i64,
    pub quantite_vendue: i64,
    pub date_vente: String,
}

/// PUT /ventes/{id} body.
#[derive(Debug, Serialize)]
pub struct VenteUpdatePayload {
    pub quantite_vendue: i64,
}

/// POST /demandes-produits body.
/// `produit_id` is serialized as an explicit null for not-yet-cataloged
/// products; the backend distinguishes null from absent.
#[derive(Debug, Serialize)]
pub struct NewDemandePayload {
    pub produit_id: Option<i64>,
    pub utilisateur_id: i64,
    pub quantite_demandee: i64,
    pub commentaire: String,
}

/// PUT /demandes-produits/{id} body.
#[derive(Debug, Serialize)]
pub struct DemandeStatusPayload {
    pub status: &'static str,
}

/// PATCH /users/{id} body for the activity touch.
#[derive(Debug, Serialize)]
pub struct ActivityTouchPayload {
    pub updated_at: String,
}

// =============================================================================
// Parsing Helpers
// =============================================================================

/// Parses a wire identifier back to the backend's integer form.
pub fn parse_wire_id(id: &str) -> ClientResult<i64> {
    id.parse::<i64>()
        .map_err(|_| ClientError::Decode(format!("invalid numeric id: {id:?}")))
}

/// Parses the date part of a wire date, accepting both bare dates
/// ("2027-04-30") and timestamps ("2027-04-30T00:00:00.000000Z").
pub fn parse_wire_date(value: &str) -> ClientResult<NaiveDate> {
    let date_part = value.split('T').next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ClientError::Decode(format!("invalid date: {value:?}")))
}

/// Parses a wire timestamp, falling back to midnight UTC for bare dates.
pub fn parse_wire_timestamp(value: &str) -> ClientResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = parse_wire_date(value)?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

/// Parses the backend's role enum.
pub fn parse_role(value: &str) -> ClientResult<UserRole> {
    match value {
        "ADMIN" => Ok(UserRole::Admin),
        "VENDEUR" => Ok(UserRole::Vendeur),
        other => Err(ClientError::Decode(format!("unknown role: {other:?}"))),
    }
}

/// Parses the backend's request status enum.
pub fn parse_request_status(value: &str) -> ClientResult<RequestStatus> {
    match value {
        "EN_ATTENTE" => Ok(RequestStatus::EnAttente),
        "VALIDE" => Ok(RequestStatus::Valide),
        "REFUSE" => Ok(RequestStatus::Refuse),
        other => Err(ClientError::Decode(format!(
            "unknown request status: {other:?}"
        ))),
    }
}

/// Formats a timestamp the way the backend's `updated_at` column expects it,
/// with microsecond precision: `2026-02-18T13:43:08.000000Z`.
pub fn activity_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S.000000Z").to_string()
}

/// Formats a timestamp for a new sale's `date_vente`.
pub fn sale_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Wire -> Domain Conversions
// =============================================================================

impl From<ApiCategory> for Category {
    fn from(api: ApiCategory) -> Self {
        Category {
            id: api.id.to_string(),
            nom: api.nom,
        }
    }
}

impl From<ApiFournisseur> for Supplier {
    fn from(api: ApiFournisseur) -> Self {
        Supplier {
            id: api.id.to_string(),
            nom: api.nom,
            telephone: api.telephone,
            email: api.email,
        }
    }
}

impl TryFrom<ApiProduit> for Product {
    type Error = ClientError;

    fn try_from(api: ApiProduit) -> ClientResult<Self> {
        let prix: Money = api
            .prix
            .parse()
            .map_err(|_| ClientError::Decode(format!("invalid price: {:?}", api.prix)))?;

        Ok(Product {
            id: api.id.to_string(),
            nom: api.nom,
            categorie: api.category.map(|c| c.nom).unwrap_or_default(),
            numero_lot: api.numero_lot,
            date_peremption: parse_wire_date(&api.date_peremption)?,
            quantite_boites: api.quantite_boites,
            quantite_unites: api.quantite_unites,
            prix_cents: prix.cents(),
            fournisseur: api.fournisseur.map(|f| f.nom).unwrap_or_default(),
            description: api.description.unwrap_or_default(),
        })
    }
}

impl TryFrom<ApiVente> for Sale {
    type Error = ClientError;

    fn try_from(api: ApiVente) -> ClientResult<Self> {
        let created_at = parse_wire_timestamp(&api.date_vente)?;

        Ok(Sale {
            id: api.id.to_string(),
            product_id: api.produit_id.to_string(),
            product_nom: api.produit.map(|p| p.nom).unwrap_or_default(),
            quantite_vendue: api.quantite_vendue,
            date: created_at.date_naive(),
            user_id: api.utilisateur_id.to_string(),
            user_name: api.utilisateur.map(|u| u.nom).unwrap_or_default(),
            created_at,
        })
    }
}

impl TryFrom<ApiDemandeProduit> for ProductRequest {
    type Error = ClientError;

    fn try_from(api: ApiDemandeProduit) -> ClientResult<Self> {
        Ok(ProductRequest {
            id: api.id.to_string(),
            product_id: api.produit_id.map(|id| id.to_string()),
            product_nom: api.produit.map(|p| p.nom).unwrap_or_default(),
            quantite_demandee: api.quantite_demandee,
            commentaire: api.commentaire.unwrap_or_default(),
            status: parse_request_status(&api.status)?,
            user_id: api.utilisateur_id.to_string(),
            user_name: api.utilisateur.map(|u| u.nom).unwrap_or_default(),
            date_creation: parse_wire_date(&api.date_creation)?,
        })
    }
}

impl TryFrom<ApiUtilisateur> for User {
    type Error = ClientError;

    fn try_from(api: ApiUtilisateur) -> ClientResult<Self> {
        let role = api
            .role
            .as_deref()
            .ok_or_else(|| ClientError::Decode("user payload is missing a role".into()))?;

        Ok(User {
            id: api.id.to_string(),
            nom: api.nom,
            prenom: api.prenom.unwrap_or_default(),
            email: api.email.unwrap_or_default(),
            role: parse_role(role)?,
            badge_id: api.badge_id.unwrap_or_default(),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
