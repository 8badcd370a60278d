//! # Data Store
//!
//! The cached collections behind every screen, and the mutating operations
//! that keep them aligned with the backend.
//!
//! ## Consistency Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Store Consistency Model                             │
//! │                                                                         │
//! │            ┌───────────────────────────────────────────┐                │
//! │            │              DataStore                    │                │
//! │            │                                           │                │
//! │  screens ──┤  state: RwLock<Collections>   (snapshots) │                │
//! │            │  ops:   Mutex<()>            (mutations)  │                │
//! │            └───────────────┬───────────────────────────┘                │
//! │                            │                                            │
//! │                            ▼                                            │
//! │                      PharmaApi (REST)                                   │
//! │                                                                         │
//! │  RULES                                                                  │
//! │  1. Local guards run BEFORE any network call: an insufficient-stock     │
//! │     sale is rejected without the backend ever hearing about it.         │
//! │  2. Every mutation and every refresh holds `ops`, in sequence. A sale   │
//! │     recorded while a refresh is in flight waits for it, then lands on   │
//! │     the fresh snapshot instead of being clobbered by it.                │
//! │  3. A refresh replaces the six server collections only when ALL six     │
//! │     fetches succeeded. Partial refreshes never happen.                  │
//! │  4. After the backend accepts a mutation, the cache mirrors its effect  │
//! │     (prepend the sale, move the stock) without a full refetch.          │
//! │  5. The history log is client-side only: refreshes keep it, clearing   │
//! │     the store (logout) discards it.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use officine_core::{
    expiry::{self, ExpiryBuckets},
    history::{EntityKind, HistoryAction, HistoryEntry},
    reports::{self, DashboardSummary, SalesHistory},
    stock, validation, Category, CoreError, CoreResult, Product, ProductRequest, RequestStatus,
    Sale, Supplier, User, ValidationError, SALE_CANCEL_WINDOW_MINUTES, STUB_CATEGORY,
    STUB_SUPPLIER,
};

use crate::api::{NewRequest, NewSale, PharmaApi, ProductDraft, ProductPatch};
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Collections
// =============================================================================

/// Everything the screens read, in one place.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub products: Vec<Product>,
    pub sales: Vec<Sale>,
    pub requests: Vec<ProductRequest>,
    pub categories: Vec<Category>,
    pub fournisseurs: Vec<Supplier>,
    pub users: Vec<User>,
    /// Session-scoped activity log. Never fetched, never persisted.
    pub history: Vec<HistoryEntry>,
}

// =============================================================================
// Operation Inputs
// =============================================================================

/// Everything needed to file a replenishment request.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    /// Existing catalog product, or `None` for a product the pharmacy does
    /// not carry yet.
    pub product_id: Option<String>,
    /// Free-text product name; required when `product_id` is `None`.
    pub product_nom: String,
    pub quantite_demandee: i64,
    pub commentaire: String,
}

// =============================================================================
// Data Store
// =============================================================================

/// Cached pharmacy data over a [`PharmaApi`] backend.
pub struct DataStore<A> {
    api: Arc<A>,
    state: RwLock<Collections>,
    /// Serializes refreshes and mutations. See the consistency model above.
    ops: Mutex<()>,
}

impl<A: PharmaApi> DataStore<A> {
    pub fn new(api: Arc<A>) -> Self {
        DataStore {
            api,
            state: RwLock::new(Collections::default()),
            ops: Mutex::new(()),
        }
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Clones the full collection set for a screen render.
    pub async fn collections(&self) -> Collections {
        self.state.read().await.clone()
    }

    pub async fn products(&self) -> Vec<Product> {
        self.state.read().await.products.clone()
    }

    pub async fn sales(&self) -> Vec<Sale> {
        self.state.read().await.sales.clone()
    }

    pub async fn requests(&self) -> Vec<ProductRequest> {
        self.state.read().await.requests.clone()
    }

    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    pub async fn suppliers(&self) -> Vec<Supplier> {
        self.state.read().await.fournisseurs.clone()
    }

    pub async fn users(&self) -> Vec<User> {
        self.state.read().await.users.clone()
    }

    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.state.read().await.history.clone()
    }

    // -------------------------------------------------------------------------
    // Derived Views
    // -------------------------------------------------------------------------

    /// Expiration screen: the catalog partitioned into expired /
    /// expiring-soon / valid as of `today`.
    pub async fn expiry_buckets(&self, today: NaiveDate) -> ExpiryBuckets {
        let state = self.state.read().await;
        expiry::bucket_products(&state.products, today)
    }

    /// Dashboard KPI cards as of `today`.
    pub async fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        let state = self.state.read().await;
        reports::dashboard_summary(&state.products, &state.users, today)
    }

    /// History screen: sales visible to `viewer`, filtered by `query`.
    pub async fn sales_history(&self, viewer: &User, query: &str) -> SalesHistory {
        let state = self.state.read().await;
        reports::sales_history(&state.sales, viewer, query)
    }

    // -------------------------------------------------------------------------
    // Refresh
    // -------------------------------------------------------------------------

    /// Reloads all six server collections, all-or-nothing.
    ///
    /// The six fetches run concurrently. If any one fails the cache is left
    /// exactly as it was, so a flaky endpoint can never leave the screens
    /// showing products from one refresh and sales from another.
    pub async fn refresh_all(&self) -> ClientResult<()> {
        let _ops = self.ops.lock().await;

        let (products, sales, requests, categories, fournisseurs, users) = tokio::try_join!(
            self.api.fetch_products(),
            self.api.fetch_sales(),
            self.api.fetch_requests(),
            self.api.fetch_categories(),
            self.api.fetch_suppliers(),
            self.api.fetch_users(),
        )?;

        let mut state = self.state.write().await;
        state.products = products;
        state.sales = sales;
        state.requests = requests;
        state.categories = categories;
        state.fournisseurs = fournisseurs;
        state.users = users;

        info!(
            products = state.products.len(),
            sales = state.sales.len(),
            requests = state.requests.len(),
            "Collections refreshed"
        );
        Ok(())
    }

    /// Empties the cache, history included. Called on logout.
    pub async fn clear(&self) {
        let _ops = self.ops.lock().await;
        *self.state.write().await = Collections::default();
        debug!("Store cleared");
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    /// Creates a catalog product.
    pub async fn create_product(&self, user: &User, draft: &ProductDraft) -> ClientResult<Product> {
        validate_product_draft(draft)?;

        let _ops = self.ops.lock().await;
        let created = self.api.create_product(draft).await?;

        let mut state = self.state.write().await;
        let entry = self
            .new_entry(
                EntityKind::Product,
                HistoryAction::Created,
                user,
                &created.id,
                &created.nom,
            )
            .with_quantite(created.quantite_boites);
        state.products.push(created.clone());
        state.history.push(entry);

        info!(product_id = %created.id, nom = %created.nom, "Product created");
        Ok(created)
    }

    /// Applies a partial update to a catalog product.
    pub async fn update_product(
        &self,
        user: &User,
        id: &str,
        patch: &ProductPatch,
    ) -> ClientResult<Product> {
        if let Some(nom) = &patch.nom {
            validation::validate_product_name(nom).map_err(CoreError::from)?;
        }
        if let Some(qty) = patch.quantite_boites {
            validation::validate_stock_quantity("quantite_boites", qty).map_err(CoreError::from)?;
        }
        if let Some(qty) = patch.quantite_unites {
            validation::validate_stock_quantity("quantite_unites", qty).map_err(CoreError::from)?;
        }
        if let Some(prix) = patch.prix {
            validation::validate_price_cents(prix.cents()).map_err(CoreError::from)?;
        }

        let _ops = self.ops.lock().await;
        let updated = self.api.update_product(id, patch).await?;

        let mut state = self.state.write().await;
        let mut entry = self.new_entry(
            EntityKind::Product,
            HistoryAction::Updated,
            user,
            &updated.id,
            &updated.nom,
        );

        match state.products.iter_mut().find(|p| p.id == updated.id) {
            Some(cached) => {
                if cached.quantite_boites != updated.quantite_boites {
                    entry = entry.with_stock_change(cached.quantite_boites, updated.quantite_boites);
                }
                *cached = updated.clone();
            }
            None => state.products.push(updated.clone()),
        }
        state.history.push(entry);

        Ok(updated)
    }

    /// Removes a product from the catalog.
    pub async fn delete_product(&self, user: &User, id: &str) -> ClientResult<()> {
        let _ops = self.ops.lock().await;

        let nom = {
            let state = self.state.read().await;
            state
                .products
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.nom.clone())
                .unwrap_or_default()
        };

        self.api.delete_product(id).await?;

        let mut state = self.state.write().await;
        state.products.retain(|p| p.id != id);
        let entry = self.new_entry(EntityKind::Product, HistoryAction::Deleted, user, id, nom);
        state.history.push(entry);

        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// Creates a category inline (from the product form).
    pub async fn create_category(&self, nom: &str) -> ClientResult<Category> {
        validation::validate_category(nom).map_err(CoreError::from)?;

        let _ops = self.ops.lock().await;
        let created = self.api.create_category(nom).await?;
        self.state.write().await.categories.push(created.clone());
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    /// Records a sale and moves the stock.
    ///
    /// The stock check runs against the cache before the request goes out:
    /// overselling is rejected locally and the backend never sees the
    /// attempt.
    pub async fn create_sale(
        &self,
        user: &User,
        product_id: &str,
        quantite_vendue: i64,
    ) -> ClientResult<Sale> {
        validation::validate_quantity(quantite_vendue).map_err(CoreError::from)?;

        let _ops = self.ops.lock().await;

        let avant = {
            let state = self.state.read().await;
            let product = state
                .products
                .iter()
                .find(|p| p.id == product_id)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
            stock::check_available(product, quantite_vendue)?;
            product.quantite_boites
        };

        let sale = self
            .api
            .create_sale(&NewSale {
                product_id: product_id.to_string(),
                user_id: user.id.clone(),
                quantite_vendue,
                at: Utc::now(),
            })
            .await?;

        let mut state = self.state.write().await;
        if let Some(product) = state.products.iter_mut().find(|p| p.id == sale.product_id) {
            // Cannot fail: the availability check above ran under the same
            // ops guard, so nothing moved the stock in between.
            stock::deduct_for_sale(product, sale.quantite_vendue)?;
        }
        let entry = self
            .new_entry(
                EntityKind::Sale,
                HistoryAction::Created,
                user,
                &sale.id,
                &sale.product_nom,
            )
            .with_quantite(sale.quantite_vendue)
            .with_stock_change(avant, avant - sale.quantite_vendue);
        state.sales.insert(0, sale.clone());
        state.history.push(entry);

        info!(
            sale_id = %sale.id,
            product_id = %sale.product_id,
            quantite = sale.quantite_vendue,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Changes a sale's quantity, settling the stock difference.
    ///
    /// Reserved to admins. Raising the quantity is checked against the
    /// cached stock first; lowering it always succeeds and returns boxes
    /// to the shelf.
    pub async fn update_sale(
        &self,
        user: &User,
        sale_id: &str,
        quantite_vendue: i64,
    ) -> ClientResult<Sale> {
        if !user.is_admin() {
            return Err(admin_required("edit a sale"));
        }
        validation::validate_quantity(quantite_vendue).map_err(CoreError::from)?;

        let _ops = self.ops.lock().await;

        let (old_qty, product_id) = {
            let state = self.state.read().await;
            let sale = state
                .sales
                .iter()
                .find(|s| s.id == sale_id)
                .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

            let increase = quantite_vendue - sale.quantite_vendue;
            if increase > 0 {
                if let Some(product) = state.products.iter().find(|p| p.id == sale.product_id) {
                    stock::check_available(product, increase)?;
                }
            }
            (sale.quantite_vendue, sale.product_id.clone())
        };

        let updated = self.api.update_sale_quantity(sale_id, quantite_vendue).await?;

        let mut state = self.state.write().await;
        let mut entry = self
            .new_entry(
                EntityKind::Sale,
                HistoryAction::Updated,
                user,
                &updated.id,
                &updated.product_nom,
            )
            .with_quantite(updated.quantite_vendue);

        if let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) {
            let avant = product.quantite_boites;
            stock::apply_edit_delta(product, old_qty, updated.quantite_vendue)?;
            entry = entry.with_stock_change(avant, product.quantite_boites);
        }
        if let Some(cached) = state.sales.iter_mut().find(|s| s.id == updated.id) {
            *cached = updated.clone();
        }
        state.history.push(entry);

        Ok(updated)
    }

    /// Cancels a sale and returns its boxes to the shelf.
    ///
    /// Owners may cancel within the fat-finger window; admins may cancel
    /// anything, any time.
    pub async fn delete_sale(&self, user: &User, sale_id: &str) -> ClientResult<()> {
        let _ops = self.ops.lock().await;

        let (quantite, product_id, product_nom) = {
            let state = self.state.read().await;
            let sale = state
                .sales
                .iter()
                .find(|s| s.id == sale_id)
                .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

            if !user.is_admin() {
                if !sale.recorded_by(user) {
                    return Err(CoreError::NotSaleOwner {
                        id: sale_id.to_string(),
                    }
                    .into());
                }
                if !sale.within_cancel_window(Utc::now()) {
                    return Err(CoreError::CancelWindowExpired {
                        id: sale_id.to_string(),
                        window_minutes: SALE_CANCEL_WINDOW_MINUTES,
                    }
                    .into());
                }
            }

            (sale.quantite_vendue, sale.product_id.clone(), sale.product_nom.clone())
        };

        self.api.delete_sale(sale_id).await?;

        let mut state = self.state.write().await;
        let mut entry = self
            .new_entry(EntityKind::Sale, HistoryAction::Deleted, user, sale_id, product_nom)
            .with_quantite(quantite);

        if let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) {
            let avant = product.quantite_boites;
            stock::restore_for_cancellation(product, quantite);
            entry = entry.with_stock_change(avant, product.quantite_boites);
        }
        state.sales.retain(|s| s.id != sale_id);
        state.history.push(entry);

        info!(sale_id = %sale_id, quantite, "Sale cancelled");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Replenishment Requests
    // -------------------------------------------------------------------------

    /// Files a replenishment request. It starts pending and stays so until
    /// an admin decides.
    pub async fn create_request(
        &self,
        user: &User,
        draft: &RequestDraft,
    ) -> ClientResult<ProductRequest> {
        validation::validate_quantity(draft.quantite_demandee).map_err(CoreError::from)?;
        validation::validate_comment(&draft.commentaire).map_err(CoreError::from)?;
        if draft.product_id.is_none() && draft.product_nom.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "produit".to_string(),
            })
            .into());
        }

        let _ops = self.ops.lock().await;

        // For catalog products the display name comes from the cache
        let product_nom = match &draft.product_id {
            Some(id) => {
                let state = self.state.read().await;
                state
                    .products
                    .iter()
                    .find(|p| p.id == *id)
                    .map(|p| p.nom.clone())
                    .unwrap_or_else(|| draft.product_nom.clone())
            }
            None => draft.product_nom.trim().to_string(),
        };

        let created = self
            .api
            .create_request(&NewRequest {
                product_id: draft.product_id.clone(),
                product_nom,
                user_id: user.id.clone(),
                quantite_demandee: draft.quantite_demandee,
                commentaire: draft.commentaire.clone(),
            })
            .await?;

        let mut state = self.state.write().await;
        let entry = self
            .new_entry(
                EntityKind::Request,
                HistoryAction::Created,
                user,
                &created.id,
                &created.product_nom,
            )
            .with_quantite(created.quantite_demandee);
        state.requests.insert(0, created.clone());
        state.history.push(entry);

        info!(request_id = %created.id, "Replenishment request filed");
        Ok(created)
    }

    /// Decides a pending request: `Valide` credits the stock, `Refuse`
    /// leaves it untouched. Admin only, and strictly once per request.
    ///
    /// ## Approval Outcomes
    /// ```text
    /// approve(request)
    ///     │
    ///     ├── request targets a cataloged product ──► stock += quantity
    ///     │
    ///     ├── a product with the requested name exists ──► stock += quantity
    ///     │
    ///     └── nothing matches ──► placeholder product is created, carrying
    ///         the requested quantity, under the fallback category and
    ///         supplier, for the admin to complete later
    /// ```
    ///
    /// The status transition is sent before the stock effect. If the stock
    /// call then fails, the request is already terminal and a retry is
    /// refused: a missed credit (fixable by editing the product) is the
    /// accepted failure mode, a double credit is not.
    pub async fn set_request_status(
        &self,
        user: &User,
        request_id: &str,
        decision: RequestStatus,
    ) -> ClientResult<ProductRequest> {
        if !user.is_admin() {
            return Err(admin_required("decide a replenishment request"));
        }
        if decision == RequestStatus::EnAttente {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: "a request cannot return to pending".to_string(),
            })
            .into());
        }

        let _ops = self.ops.lock().await;

        let request = {
            let state = self.state.read().await;
            let request = state
                .requests
                .iter()
                .find(|r| r.id == request_id)
                .ok_or_else(|| CoreError::RequestNotFound(request_id.to_string()))?
                .clone();

            if request.status.is_terminal() {
                return Err(CoreError::RequestAlreadyFinalized {
                    id: request.id,
                    status: request.status.to_string(),
                }
                .into());
            }
            request
        };

        if decision == RequestStatus::Valide {
            self.approve(user, request).await
        } else {
            self.reject(user, request).await
        }
    }

    /// Approves a pending request and applies its stock effect.
    async fn approve(&self, user: &User, request: ProductRequest) -> ClientResult<ProductRequest> {
        // Resolve the credit target before any network call: by reference
        // first, then by (case-insensitive) name for free-text requests
        // whose product was cataloged in the meantime.
        let target = {
            let state = self.state.read().await;
            let by_id = request
                .product_id
                .as_ref()
                .and_then(|id| state.products.iter().find(|p| p.id == *id));
            let by_nom = || {
                let wanted = request.product_nom.trim().to_lowercase();
                (!wanted.is_empty())
                    .then(|| {
                        state
                            .products
                            .iter()
                            .find(|p| p.nom.trim().to_lowercase() == wanted)
                    })
                    .flatten()
            };
            by_id.or_else(by_nom).map(|p| (p.id.clone(), p.quantite_boites))
        };

        let updated = self
            .api
            .set_request_status(&request.id, RequestStatus::Valide)
            .await?;

        // The terminal status lands in the cache before the stock effect:
        // should the credit below fail, a retry finds the request already
        // finalized instead of crediting twice.
        replace_request(&mut self.state.write().await.requests, &updated);

        match target {
            Some((product_id, avant)) => {
                let patch = ProductPatch {
                    quantite_boites: Some(avant + request.quantite_demandee),
                    ..Default::default()
                };
                let product = self.api.update_product(&product_id, &patch).await?;

                let mut state = self.state.write().await;
                if let Some(cached) = state.products.iter_mut().find(|p| p.id == product.id) {
                    *cached = product.clone();
                }
                let entry = self
                    .new_entry(
                        EntityKind::Request,
                        HistoryAction::Approved,
                        user,
                        &updated.id,
                        &product.nom,
                    )
                    .with_quantite(request.quantite_demandee)
                    .with_stock_change(avant, product.quantite_boites);
                state.history.push(entry);

                info!(
                    request_id = %updated.id,
                    product_id = %product.id,
                    credited = request.quantite_demandee,
                    "Request approved, stock credited"
                );
            }
            None => {
                let draft = self.stub_draft(&request).await?;
                let product = self.api.create_product(&draft).await?;

                let mut state = self.state.write().await;
                state.products.push(product.clone());
                let entry = self
                    .new_entry(
                        EntityKind::Request,
                        HistoryAction::Approved,
                        user,
                        &updated.id,
                        &product.nom,
                    )
                    .with_quantite(request.quantite_demandee)
                    .with_stock_change(0, product.quantite_boites);
                state.history.push(entry);

                info!(
                    request_id = %updated.id,
                    product_id = %product.id,
                    "Request approved, placeholder product created"
                );
            }
        }

        Ok(updated)
    }

    /// Rejects a pending request. No stock effect.
    async fn reject(&self, user: &User, request: ProductRequest) -> ClientResult<ProductRequest> {
        let updated = self.api.set_request_status(&request.id, RequestStatus::Refuse).await?;

        let mut state = self.state.write().await;
        replace_request(&mut state.requests, &updated);
        let entry = self.new_entry(
            EntityKind::Request,
            HistoryAction::Rejected,
            user,
            &updated.id,
            &updated.product_nom,
        );
        state.history.push(entry);

        info!(request_id = %updated.id, "Request rejected");
        Ok(updated)
    }

    /// Builds the placeholder draft for an approved request that matches no
    /// catalog product, resolving its category and supplier against the
    /// rosters.
    async fn stub_draft(&self, request: &ProductRequest) -> ClientResult<ProductDraft> {
        let stub = request.stub_product();
        let prix = stub.prix();

        // Refreshed requests only carry names for cataloged products, so a
        // free-text request can come back nameless; keep it identifiable.
        let nom = if stub.nom.trim().is_empty() {
            format!("Demande {}", request.id)
        } else {
            stub.nom
        };

        let fournisseur_id = {
            let state = self.state.read().await;
            let unknown = STUB_SUPPLIER.to_lowercase();
            state
                .fournisseurs
                .iter()
                .find(|f| f.nom.trim().to_lowercase() == unknown)
                .or_else(|| state.fournisseurs.first())
                .map(|f| f.id.clone())
        };
        let Some(fournisseur_id) = fournisseur_id else {
            return Err(ClientError::Validation(
                "Aucun fournisseur disponible pour créer le produit demandé".to_string(),
            ));
        };

        let categorie_id = self.ensure_stub_category().await?;

        Ok(ProductDraft {
            nom,
            categorie_id,
            fournisseur_id,
            numero_lot: stub.numero_lot,
            date_peremption: stub.date_peremption,
            quantite_boites: stub.quantite_boites,
            quantite_unites: stub.quantite_unites,
            prix,
            description: stub.description,
        })
    }

    /// Finds the fallback category, creating it on first use.
    async fn ensure_stub_category(&self) -> ClientResult<String> {
        let wanted = STUB_CATEGORY.to_lowercase();
        {
            let state = self.state.read().await;
            if let Some(cat) = state
                .categories
                .iter()
                .find(|c| c.nom.trim().to_lowercase() == wanted)
            {
                return Ok(cat.id.clone());
            }
        }

        debug!(nom = STUB_CATEGORY, "Creating fallback category");
        let created = self.api.create_category(STUB_CATEGORY).await?;
        let id = created.id.clone();
        self.state.write().await.categories.push(created);
        Ok(id)
    }

    // -------------------------------------------------------------------------
    // History Minting
    // -------------------------------------------------------------------------

    /// Builds a history entry with a fresh id and timestamp. All minting
    /// happens here, never in officine-core.
    fn new_entry(
        &self,
        entity: EntityKind,
        action: HistoryAction,
        actor: &User,
        target_id: impl Into<String>,
        target_nom: impl Into<String>,
    ) -> HistoryEntry {
        HistoryEntry::new(
            Uuid::new_v4().to_string(),
            Utc::now(),
            entity,
            action,
            actor,
            target_id,
            target_nom,
        )
    }
}

// =============================================================================
// Local Guards
// =============================================================================

fn admin_required(operation: &str) -> ClientError {
    CoreError::AdminRequired {
        operation: operation.to_string(),
    }
    .into()
}

fn validate_product_draft(draft: &ProductDraft) -> ClientResult<()> {
    let check = || -> CoreResult<()> {
        validation::validate_product_name(&draft.nom)?;
        if draft.categorie_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "categorie".to_string(),
            }
            .into());
        }
        validation::validate_lot_number(&draft.numero_lot)?;
        validation::validate_stock_quantity("quantite_boites", draft.quantite_boites)?;
        validation::validate_stock_quantity("quantite_unites", draft.quantite_unites)?;
        validation::validate_price_cents(draft.prix.cents())?;
        Ok(())
    };
    check().map_err(ClientError::from)
}

fn replace_request(requests: &mut [ProductRequest], updated: &ProductRequest) {
    if let Some(cached) = requests.iter_mut().find(|r| r.id == updated.id) {
        *cached = updated.clone();
    } else {
        warn!(request_id = %updated.id, "Updated request was not in the cache");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, FakeApi};
    use officine_core::Money;
    use std::sync::atomic::Ordering;

    /// A store over the seeded fake, already refreshed.
    async fn seeded_store() -> (Arc<FakeApi>, DataStore<FakeApi>) {
        let api = Arc::new(FakeApi::seeded());
        let store = DataStore::new(api.clone());
        store.refresh_all().await.unwrap();
        (api, store)
    }

    fn draft() -> ProductDraft {
        ProductDraft {
            nom: "Spasfon 80mg".to_string(),
            categorie_id: "1".to_string(),
            fournisseur_id: "1".to_string(),
            numero_lot: "LOT-2026-11".to_string(),
            date_peremption: fixtures::date(2027, 11, 30),
            quantite_boites: 6,
            quantite_unites: 0,
            prix: Money::from_cents(320),
            description: String::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Refresh
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_refresh_populates_all_collections() {
        let (_, store) = seeded_store().await;

        assert_eq!(store.products().await.len(), 2);
        assert_eq!(store.sales().await.len(), 1);
        assert_eq!(store.requests().await.len(), 2);
        assert_eq!(store.categories().await.len(), 2);
        assert_eq!(store.suppliers().await.len(), 2);
        assert_eq!(store.users().await.len(), 3);
    }

    #[tokio::test]
    async fn test_failed_refresh_leaves_cache_untouched() {
        let (api, store) = seeded_store().await;

        // The server now has more data, but one endpoint is broken
        api.products.lock().unwrap().push(fixtures::product("9", "Aspirine 500mg", 3));
        api.fail_fetch_sales.store(true, Ordering::SeqCst);

        assert!(store.refresh_all().await.is_err());

        // Nothing moved: not even the collections whose fetch succeeded
        assert_eq!(store.products().await.len(), 2);
        assert_eq!(store.sales().await.len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_preserves_history() {
        let (_, store) = seeded_store().await;
        let admin = fixtures::admin();

        store.create_product(&admin, &draft()).await.unwrap();
        assert_eq!(store.history().await.len(), 1);

        store.refresh_all().await.unwrap();
        assert_eq!(store.history().await.len(), 1);
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_sale_decrements_stock_exactly() {
        let (_, store) = seeded_store().await;
        let vendeur = fixtures::vendeur();

        let sale = store.create_sale(&vendeur, "1", 3).await.unwrap();

        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 7);

        // Newest first
        assert_eq!(store.sales().await[0].id, sale.id);

        let history = store.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].stock_avant, Some(10));
        assert_eq!(history[0].stock_apres, Some(7));
    }

    #[tokio::test]
    async fn test_oversell_is_rejected_before_any_network_call() {
        let (api, store) = seeded_store().await;
        let vendeur = fixtures::vendeur();

        let err = store.create_sale(&vendeur, "1", 50).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::InsufficientStock { available: 10, requested: 50, .. })
        ));

        // The backend never heard about it
        assert_eq!(api.calls.create_sale.load(Ordering::SeqCst), 0);

        // And the cache did not move
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 10);
    }

    #[tokio::test]
    async fn test_create_sale_unknown_product() {
        let (api, store) = seeded_store().await;
        let err = store
            .create_sale(&fixtures::vendeur(), "404", 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::ProductNotFound(_))));
        assert_eq!(api.calls.create_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_create_sale_rejects_non_positive_quantity() {
        let (api, store) = seeded_store().await;
        assert!(store.create_sale(&fixtures::vendeur(), "1", 0).await.is_err());
        assert!(store.create_sale(&fixtures::vendeur(), "1", -2).await.is_err());
        assert_eq!(api.calls.create_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_sale_is_admin_only() {
        let (api, store) = seeded_store().await;

        let err = store
            .update_sale(&fixtures::vendeur(), "1", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::AdminRequired { .. })));
        assert_eq!(api.calls.update_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_sale_applies_signed_delta() {
        let (_, store) = seeded_store().await;
        let admin = fixtures::admin();

        // Seeded sale: 2 boxes of product 1 (stock 10). Raising to 5 costs 3.
        store.update_sale(&admin, "1", 5).await.unwrap();
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 7);

        // Lowering back to 1 returns 4
        store.update_sale(&admin, "1", 1).await.unwrap();
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 11);
    }

    #[tokio::test]
    async fn test_update_sale_rejects_increase_beyond_stock() {
        let (api, store) = seeded_store().await;

        let err = store
            .update_sale(&fixtures::admin(), "1", 200)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::InsufficientStock { .. })));
        assert_eq!(api.calls.update_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_sale_by_owner_within_window() {
        let (_, store) = seeded_store().await;

        // Seeded sale 1 belongs to the vendeur and is two minutes old
        store.delete_sale(&fixtures::vendeur(), "1").await.unwrap();

        assert!(store.sales().await.is_empty());
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 12);
    }

    #[tokio::test]
    async fn test_delete_sale_window_expired_for_owner() {
        let (api, store) = seeded_store().await;

        // Age the sale past the window, server-side and cache-side
        let old = Utc::now() - chrono::Duration::minutes(30);
        api.sales.lock().unwrap()[0].created_at = old;
        store.refresh_all().await.unwrap();

        let err = store
            .delete_sale(&fixtures::vendeur(), "1")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::CancelWindowExpired { window_minutes: 10, .. })
        ));
        assert_eq!(api.calls.delete_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_sale_rejects_non_owner() {
        let (api, store) = seeded_store().await;

        let err = store
            .delete_sale(&fixtures::autre_vendeur(), "1")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::NotSaleOwner { .. })));
        assert_eq!(api.calls.delete_sale.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_sale_admin_ignores_window_and_owner() {
        let (api, store) = seeded_store().await;

        let old = Utc::now() - chrono::Duration::minutes(90);
        api.sales.lock().unwrap()[0].created_at = old;
        store.refresh_all().await.unwrap();

        store.delete_sale(&fixtures::admin(), "1").await.unwrap();
        assert!(store.sales().await.is_empty());
    }

    // -------------------------------------------------------------------------
    // Catalog
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_product_appends_and_logs() {
        let (_, store) = seeded_store().await;
        let admin = fixtures::admin();

        let created = store.create_product(&admin, &draft()).await.unwrap();
        assert_eq!(created.nom, "Spasfon 80mg");
        assert_eq!(created.categorie, "Antalgique");
        assert_eq!(store.products().await.len(), 3);

        let history = store.history().await;
        assert_eq!(history[0].describe(), "Produit créé : Spasfon 80mg");
    }

    #[tokio::test]
    async fn test_create_product_validates_before_network() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        let mut bad = draft();
        bad.nom = "  ".to_string();
        assert!(store.create_product(&admin, &bad).await.is_err());

        let mut bad = draft();
        bad.categorie_id = String::new();
        assert!(store.create_product(&admin, &bad).await.is_err());

        let mut bad = draft();
        bad.numero_lot = String::new();
        assert!(store.create_product(&admin, &bad).await.is_err());

        assert_eq!(api.calls.create_product.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_product_replaces_cache_entry() {
        let (_, store) = seeded_store().await;
        let admin = fixtures::admin();

        let patch = ProductPatch {
            quantite_boites: Some(4),
            ..Default::default()
        };
        let updated = store.update_product(&admin, "1", &patch).await.unwrap();
        assert_eq!(updated.quantite_boites, 4);

        let cached = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(cached.quantite_boites, 4);

        let history = store.history().await;
        assert_eq!(history[0].stock_avant, Some(10));
        assert_eq!(history[0].stock_apres, Some(4));
    }

    #[tokio::test]
    async fn test_delete_product_removes_cache_entry() {
        let (_, store) = seeded_store().await;

        store.delete_product(&fixtures::admin(), "2").await.unwrap();
        assert!(store.products().await.iter().all(|p| p.id != "2"));
    }

    // -------------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_request_starts_pending() {
        let (_, store) = seeded_store().await;
        let vendeur = fixtures::vendeur();

        let created = store
            .create_request(
                &vendeur,
                &RequestDraft {
                    product_id: Some("2".to_string()),
                    product_nom: String::new(),
                    quantite_demandee: 8,
                    commentaire: "Rupture prévue".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(created.is_pending());
        assert_eq!(created.product_nom, "Amoxicilline 500mg");
        assert_eq!(store.requests().await[0].id, created.id);
    }

    #[tokio::test]
    async fn test_create_request_for_new_product_needs_a_name() {
        let (api, store) = seeded_store().await;

        let err = store
            .create_request(
                &fixtures::vendeur(),
                &RequestDraft {
                    product_id: None,
                    product_nom: "   ".to_string(),
                    quantite_demandee: 5,
                    commentaire: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::Validation(_))));
        assert_eq!(api.calls.create_request.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_approve_credits_referenced_product() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        // Seeded request 1 asks for 5 boxes of product 1 (stock 10)
        let updated = store
            .set_request_status(&admin, "1", RequestStatus::Valide)
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Valide);

        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 15);
        assert_eq!(api.calls.update_product.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.create_product.load(Ordering::SeqCst), 0);

        let history = store.history().await;
        assert_eq!(history[0].stock_avant, Some(10));
        assert_eq!(history[0].stock_apres, Some(15));
    }

    #[tokio::test]
    async fn test_approve_creates_placeholder_for_unknown_product() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        // Seeded request 2 names a product the catalog does not carry
        store
            .set_request_status(&admin, "2", RequestStatus::Valide)
            .await
            .unwrap();

        let products = store.products().await;
        let stub = products
            .iter()
            .find(|p| p.nom == "Paracetamol 500")
            .expect("placeholder product should exist");
        assert_eq!(stub.quantite_boites, 12);
        assert_eq!(stub.numero_lot, "PENDING");
        assert_eq!(stub.categorie, "Non classé");
        assert_eq!(stub.prix_cents, 0);

        // The fallback category did not exist and was created on the fly
        assert_eq!(api.calls.create_category.load(Ordering::SeqCst), 1);
        assert!(store
            .categories()
            .await
            .iter()
            .any(|c| c.nom == "Non classé"));
        assert_eq!(api.calls.create_product.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_approve_matches_existing_product_by_name() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        // Catalog now carries the requested name (spelled differently)
        api.products
            .lock()
            .unwrap()
            .push(fixtures::product("7", "PARACETAMOL 500", 2));
        store.refresh_all().await.unwrap();

        store
            .set_request_status(&admin, "2", RequestStatus::Valide)
            .await
            .unwrap();

        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "7")
            .unwrap();
        assert_eq!(product.quantite_boites, 14);
        assert_eq!(api.calls.create_product.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_approve_is_refused_the_second_time() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        store
            .set_request_status(&admin, "1", RequestStatus::Valide)
            .await
            .unwrap();
        let err = store
            .set_request_status(&admin, "1", RequestStatus::Valide)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::RequestAlreadyFinalized { .. })
        ));

        // Exactly one status call, exactly one credit
        assert_eq!(api.calls.set_request_status.load(Ordering::SeqCst), 1);
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 15);
    }

    #[tokio::test]
    async fn test_failed_credit_does_not_allow_a_second_approval() {
        let (api, store) = seeded_store().await;
        let admin = fixtures::admin();

        // The status transition succeeds but the stock credit fails
        api.fail_update_product.store(true, Ordering::SeqCst);
        assert!(store
            .set_request_status(&admin, "1", RequestStatus::Valide)
            .await
            .is_err());

        // Retrying is refused rather than credited twice
        api.fail_update_product.store(false, Ordering::SeqCst);
        let err = store
            .set_request_status(&admin, "1", RequestStatus::Valide)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::Core(CoreError::RequestAlreadyFinalized { .. })
        ));
        assert_eq!(api.calls.set_request_status.load(Ordering::SeqCst), 1);

        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 10);
    }

    #[tokio::test]
    async fn test_reject_leaves_stock_alone() {
        let (api, store) = seeded_store().await;

        let updated = store
            .set_request_status(&fixtures::admin(), "1", RequestStatus::Refuse)
            .await
            .unwrap();
        assert_eq!(updated.status, RequestStatus::Refuse);

        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 10);
        assert_eq!(api.calls.update_product.load(Ordering::SeqCst), 0);

        let history = store.history().await;
        assert_eq!(history[0].describe(), "Demande refusée : Doliprane 1000mg");
    }

    #[tokio::test]
    async fn test_set_request_status_is_admin_only() {
        let (api, store) = seeded_store().await;

        let err = store
            .set_request_status(&fixtures::vendeur(), "1", RequestStatus::Valide)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::AdminRequired { .. })));
        assert_eq!(api.calls.set_request_status.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_cannot_return_to_pending() {
        let (_, store) = seeded_store().await;
        assert!(store
            .set_request_status(&fixtures::admin(), "1", RequestStatus::EnAttente)
            .await
            .is_err());
    }

    // -------------------------------------------------------------------------
    // Derived Views
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_expiry_buckets_partition_the_catalog() {
        let (api, store) = seeded_store().await;
        let today = fixtures::date(2026, 6, 1);

        // Seeded products expire 2027-06-30 (valid); add one expired and
        // one expiring within the window
        {
            let mut products = api.products.lock().unwrap();
            let mut expired = fixtures::product("8", "Vieux lot", 1);
            expired.date_peremption = fixtures::date(2026, 5, 20);
            let mut soon = fixtures::product("9", "Lot proche", 1);
            soon.date_peremption = fixtures::date(2026, 6, 20);
            products.push(expired);
            products.push(soon);
        }
        store.refresh_all().await.unwrap();

        let buckets = store.expiry_buckets(today).await;
        assert_eq!(buckets.expired.len(), 1);
        assert_eq!(buckets.expiring_soon.len(), 1);
        assert_eq!(buckets.valid.len(), 2);
        assert_eq!(buckets.total(), store.products().await.len());
    }

    #[tokio::test]
    async fn test_dashboard_reflects_cache() {
        let (_, store) = seeded_store().await;
        let today = fixtures::date(2026, 6, 1);

        let summary = store.dashboard(today).await;
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_users, 3);
        assert_eq!(summary.out_of_stock, 0);
    }

    #[tokio::test]
    async fn test_sales_history_scopes_by_viewer() {
        let (_, store) = seeded_store().await;

        let admin_view = store.sales_history(&fixtures::admin(), "").await;
        assert_eq!(admin_view.total_count, 1);
        assert_eq!(admin_view.total_boxes, 2);

        // The other seller recorded nothing
        let empty = store.sales_history(&fixtures::autre_vendeur(), "").await;
        assert_eq!(empty.total_count, 0);
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_clear_wipes_collections_and_history() {
        let (_, store) = seeded_store().await;
        store
            .create_sale(&fixtures::vendeur(), "1", 1)
            .await
            .unwrap();

        store.clear().await;

        let collections = store.collections().await;
        assert!(collections.products.is_empty());
        assert!(collections.sales.is_empty());
        assert!(collections.history.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sale_during_refresh_is_not_clobbered() {
        let (api, store) = seeded_store().await;
        let store = Arc::new(store);

        // Slow the next refresh down so the sale arrives mid-flight
        api.fetch_delay_ms.store(50, Ordering::SeqCst);

        let refresher = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh_all().await })
        };
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let vendeur = fixtures::vendeur();
        store.create_sale(&vendeur, "1", 3).await.unwrap();
        refresher.await.unwrap().unwrap();

        // The refresh snapshot predates the sale, but the sale waited for
        // it: the decrement lands on top, not underneath
        let product = store
            .products()
            .await
            .into_iter()
            .find(|p| p.id == "1")
            .unwrap();
        assert_eq!(product.quantite_boites, 7);
        assert_eq!(store.sales().await.len(), 2);
    }
}
