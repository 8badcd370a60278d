//! # Pharmacy API
//!
//! The backend surface this client talks to, as a trait, plus the REST
//! implementation over the gateway.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Backend Endpoints                              │
//! │                                                                         │
//! │  Auth        POST  /login                    email + password ──► token │
//! │              GET   /users/{email-or-id}      session verification       │
//! │              PATCH /users/{id}               activity timestamp touch   │
//! │                                                                         │
//! │  Catalog     GET   /produits                                            │
//! │              POST  /produits                                            │
//! │              PUT   /produits/{id}                                       │
//! │              DELETE /produits/{id}                                      │
//! │                                                                         │
//! │  Sales       GET   /ventes                                              │
//! │              POST  /ventes                                              │
//! │              PUT   /ventes/{id}                                         │
//! │              DELETE /ventes/{id}                                        │
//! │                                                                         │
//! │  Requests    GET   /demandes-produits                                   │
//! │              POST  /demandes-produits                                   │
//! │              PUT   /demandes-produits/{id}   status transition          │
//! │                                                                         │
//! │  Rosters     GET   /categories   POST /categories                       │
//! │              GET   /fournisseurs                                        │
//! │              GET   /users                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stores depend on the [`PharmaApi`] trait, never on `RestApi`
//! directly, so tests can substitute an in-memory backend and count the
//! calls that reach it.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use officine_core::{
    Category, Money, Product, ProductRequest, RequestStatus, Sale, Supplier, User,
};

use crate::error::ClientResult;
use crate::gateway::RestGateway;
use crate::wire::{
    activity_timestamp, parse_wire_id, sale_timestamp, ActivityTouchPayload, ApiCategory,
    ApiDemandeProduit, ApiFournisseur, ApiLoginResponse, ApiProduit, ApiUtilisateur, ApiVente,
    DemandeStatusPayload, LoginPayload, NewCategoryPayload, NewDemandePayload, NewProduitPayload,
    NewVentePayload, ProduitUpdatePayload, VenteUpdatePayload,
};

// =============================================================================
// Operation Inputs
// =============================================================================

/// Everything needed to create a catalog product.
///
/// Category and supplier arrive as roster identifiers, not names: the form
/// picks them from the cached rosters, so by construction they reference
/// rows the backend knows.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub nom: String,
    pub categorie_id: String,
    pub fournisseur_id: String,
    pub numero_lot: String,
    pub date_peremption: NaiveDate,
    pub quantite_boites: i64,
    pub quantite_unites: i64,
    pub prix: Money,
    pub description: String,
}

/// A partial product update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub nom: Option<String>,
    pub categorie_id: Option<String>,
    pub fournisseur_id: Option<String>,
    pub numero_lot: Option<String>,
    pub date_peremption: Option<NaiveDate>,
    pub quantite_boites: Option<i64>,
    pub quantite_unites: Option<i64>,
    pub prix: Option<Money>,
    pub description: Option<String>,
}

/// Everything needed to record a sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub product_id: String,
    pub user_id: String,
    pub quantite_vendue: i64,
    /// The moment of sale, minted by the caller.
    pub at: DateTime<Utc>,
}

/// Everything needed to file a replenishment request.
#[derive(Debug, Clone)]
pub struct NewRequest {
    /// `None` when the product is not yet in the catalog.
    pub product_id: Option<String>,
    pub product_nom: String,
    pub user_id: String,
    pub quantite_demandee: i64,
    pub commentaire: String,
}

// =============================================================================
// API Trait
// =============================================================================

/// Backend operations, in domain vocabulary.
#[async_trait]
pub trait PharmaApi: Send + Sync {
    /// Exchanges credentials for a bearer token and the signed-in user.
    async fn login(&self, email: &str, password: &str) -> ClientResult<(String, User)>;

    /// Checks that a locally stored user still exists server-side.
    /// Any failure, network included, reads as "not verified".
    async fn verify_user(&self, user: &User) -> bool;

    /// Stamps the user's `updated_at` column. Best-effort bookkeeping.
    async fn touch_user_activity(&self, user_id: &str, now: DateTime<Utc>) -> ClientResult<()>;

    async fn fetch_users(&self) -> ClientResult<Vec<User>>;

    async fn fetch_products(&self) -> ClientResult<Vec<Product>>;
    async fn create_product(&self, draft: &ProductDraft) -> ClientResult<Product>;
    async fn update_product(&self, id: &str, patch: &ProductPatch) -> ClientResult<Product>;
    async fn delete_product(&self, id: &str) -> ClientResult<()>;

    async fn fetch_sales(&self) -> ClientResult<Vec<Sale>>;
    async fn create_sale(&self, sale: &NewSale) -> ClientResult<Sale>;
    async fn update_sale_quantity(&self, id: &str, quantite_vendue: i64) -> ClientResult<Sale>;
    async fn delete_sale(&self, id: &str) -> ClientResult<()>;

    async fn fetch_requests(&self) -> ClientResult<Vec<ProductRequest>>;
    async fn create_request(&self, request: &NewRequest) -> ClientResult<ProductRequest>;
    async fn set_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> ClientResult<ProductRequest>;

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>>;
    async fn create_category(&self, nom: &str) -> ClientResult<Category>;

    async fn fetch_suppliers(&self) -> ClientResult<Vec<Supplier>>;
}

// =============================================================================
// REST Implementation
// =============================================================================

/// [`PharmaApi`] over the real backend.
///
/// All wire translation lives here: requests are built from domain values,
/// responses are parsed into domain values, and nothing loosely typed
/// escapes upward.
pub struct RestApi {
    gateway: RestGateway,
}

impl RestApi {
    pub fn new(gateway: RestGateway) -> Self {
        RestApi { gateway }
    }
}

#[async_trait]
impl PharmaApi for RestApi {
    async fn login(&self, email: &str, password: &str) -> ClientResult<(String, User)> {
        let payload = LoginPayload {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: ApiLoginResponse = self.gateway.post("login", &payload).await?;
        let user = User::try_from(resp.user)?;
        Ok((resp.token, user))
    }

    async fn verify_user(&self, user: &User) -> bool {
        let identifier = if user.email.is_empty() {
            user.id.clone()
        } else {
            user.email.clone()
        };

        let fetched: ApiUtilisateur = match self.gateway.get(&format!("users/{identifier}")).await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                debug!(?e, user_id = %user.id, "User verification request failed");
                return false;
            }
        };

        let same_email =
            !user.email.is_empty() && fetched.email.as_deref() == Some(user.email.as_str());
        let same_id = fetched.id.to_string() == user.id;
        let same_name = fetched.nom == user.nom
            && matches!(&fetched.prenom, Some(prenom) if *prenom == user.prenom);

        same_email || same_id || same_name
    }

    async fn touch_user_activity(&self, user_id: &str, now: DateTime<Utc>) -> ClientResult<()> {
        let payload = ActivityTouchPayload {
            updated_at: activity_timestamp(now),
        };
        self.gateway.patch(&format!("users/{user_id}"), &payload).await
    }

    async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        let users: Vec<ApiUtilisateur> = self.gateway.get("users").await?;
        users.into_iter().map(User::try_from).collect()
    }

    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        let produits: Vec<ApiProduit> = self.gateway.get("produits").await?;
        produits.into_iter().map(Product::try_from).collect()
    }

    async fn create_product(&self, draft: &ProductDraft) -> ClientResult<Product> {
        let payload = new_produit_payload(draft)?;
        let created: ApiProduit = self.gateway.post("produits", &payload).await?;
        Product::try_from(created)
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> ClientResult<Product> {
        let payload = produit_update_payload(patch)?;
        let updated: ApiProduit = self
            .gateway
            .put(&format!("produits/{id}"), &payload)
            .await?;
        Product::try_from(updated)
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.gateway.delete(&format!("produits/{id}")).await
    }

    async fn fetch_sales(&self) -> ClientResult<Vec<Sale>> {
        let ventes: Vec<ApiVente> = self.gateway.get("ventes").await?;
        ventes.into_iter().map(Sale::try_from).collect()
    }

    async fn create_sale(&self, sale: &NewSale) -> ClientResult<Sale> {
        let payload = NewVentePayload {
            produit_id: parse_wire_id(&sale.product_id)?,
            utilisateur_id: parse_wire_id(&sale.user_id)?,
            quantite_vendue: sale.quantite_vendue,
            date_vente: sale_timestamp(sale.at),
        };
        let created: ApiVente = self.gateway.post("ventes", &payload).await?;
        Sale::try_from(created)
    }

    async fn update_sale_quantity(&self, id: &str, quantite_vendue: i64) -> ClientResult<Sale> {
        let payload = VenteUpdatePayload { quantite_vendue };
        let updated: ApiVente = self.gateway.put(&format!("ventes/{id}"), &payload).await?;
        Sale::try_from(updated)
    }

    async fn delete_sale(&self, id: &str) -> ClientResult<()> {
        self.gateway.delete(&format!("ventes/{id}")).await
    }

    async fn fetch_requests(&self) -> ClientResult<Vec<ProductRequest>> {
        let demandes: Vec<ApiDemandeProduit> = self.gateway.get("demandes-produits").await?;
        demandes.into_iter().map(ProductRequest::try_from).collect()
    }

    async fn create_request(&self, request: &NewRequest) -> ClientResult<ProductRequest> {
        let produit_id = match &request.product_id {
            Some(id) => Some(parse_wire_id(id)?),
            None => None,
        };
        let payload = NewDemandePayload {
            produit_id,
            utilisateur_id: parse_wire_id(&request.user_id)?,
            quantite_demandee: request.quantite_demandee,
            commentaire: request.commentaire.clone(),
        };
        let created: ApiDemandeProduit = self.gateway.post("demandes-produits", &payload).await?;
        ProductRequest::try_from(created)
    }

    async fn set_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> ClientResult<ProductRequest> {
        let payload = DemandeStatusPayload {
            status: status.as_wire(),
        };
        let updated: ApiDemandeProduit = self
            .gateway
            .put(&format!("demandes-produits/{id}"), &payload)
            .await?;
        ProductRequest::try_from(updated)
    }

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>> {
        let categories: Vec<ApiCategory> = self.gateway.get("categories").await?;
        Ok(categories.into_iter().map(Category::from).collect())
    }

    async fn create_category(&self, nom: &str) -> ClientResult<Category> {
        let payload = NewCategoryPayload {
            nom: nom.to_string(),
        };
        let created: ApiCategory = self.gateway.post("categories", &payload).await?;
        Ok(Category::from(created))
    }

    async fn fetch_suppliers(&self) -> ClientResult<Vec<Supplier>> {
        let fournisseurs: Vec<ApiFournisseur> = self.gateway.get("fournisseurs").await?;
        Ok(fournisseurs.into_iter().map(Supplier::from).collect())
    }
}

// =============================================================================
// Payload Builders
// =============================================================================

fn new_produit_payload(draft: &ProductDraft) -> ClientResult<NewProduitPayload> {
    Ok(NewProduitPayload {
        nom: draft.nom.clone(),
        categorie_id: parse_wire_id(&draft.categorie_id)?,
        fournisseur_id: parse_wire_id(&draft.fournisseur_id)?,
        numero_lot: draft.numero_lot.clone(),
        date_peremption: draft.date_peremption.format("%Y-%m-%d").to_string(),
        quantite_boites: draft.quantite_boites,
        quantite_unites: draft.quantite_unites,
        prix: draft.prix.to_decimal_string(),
        description: draft.description.clone(),
    })
}

fn produit_update_payload(patch: &ProductPatch) -> ClientResult<ProduitUpdatePayload> {
    let categorie_id = match &patch.categorie_id {
        Some(id) => Some(parse_wire_id(id)?),
        None => None,
    };
    let fournisseur_id = match &patch.fournisseur_id {
        Some(id) => Some(parse_wire_id(id)?),
        None => None,
    };

    Ok(ProduitUpdatePayload {
        nom: patch.nom.clone(),
        categorie_id,
        fournisseur_id,
        numero_lot: patch.numero_lot.clone(),
        date_peremption: patch
            .date_peremption
            .map(|d| d.format("%Y-%m-%d").to_string()),
        quantite_boites: patch.quantite_boites,
        quantite_unites: patch.quantite_unites,
        prix: patch.prix.map(|p| p.to_decimal_string()),
        description: patch.description.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
