//! # Test Support
//!
//! An in-memory [`PharmaApi`] with call counters and failure switches, plus
//! shared fixtures. Tests assert not only on outcomes but on which calls
//! reached the "backend": the oversell guard, for example, is proven by a
//! `create_sale` counter that stays at zero.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use officine_core::{
    Category, Product, ProductRequest, RequestStatus, Sale, Supplier, User, UserRole,
};

use crate::api::{NewRequest, NewSale, PharmaApi, ProductDraft, ProductPatch};
use crate::error::{ClientError, ClientResult};

// =============================================================================
// Call Counters
// =============================================================================

/// How many times each mutating call reached the fake backend.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub create_product: AtomicU64,
    pub update_product: AtomicU64,
    pub create_sale: AtomicU64,
    pub update_sale: AtomicU64,
    pub delete_sale: AtomicU64,
    pub create_request: AtomicU64,
    pub set_request_status: AtomicU64,
    pub create_category: AtomicU64,
    pub touch_activity: AtomicU64,
}

// =============================================================================
// Fake API
// =============================================================================

/// In-memory backend double.
///
/// State lives in plain mutexes so tests can reach in and rearrange the
/// "server" between calls. Failure switches simulate a dead network or a
/// single broken endpoint.
pub struct FakeApi {
    pub products: Mutex<Vec<Product>>,
    pub sales: Mutex<Vec<Sale>>,
    pub requests: Mutex<Vec<ProductRequest>>,
    pub categories: Mutex<Vec<Category>>,
    pub suppliers: Mutex<Vec<Supplier>>,
    pub users: Mutex<Vec<User>>,

    pub calls: CallCounters,

    /// Every call fails as if the network were down.
    pub fail_all: AtomicBool,
    /// Only the sales fetch fails (for all-or-nothing refresh tests).
    pub fail_fetch_sales: AtomicBool,
    /// Only the product update fails (for failed-credit tests).
    pub fail_update_product: AtomicBool,
    /// Login is rejected regardless of credentials.
    pub reject_login: AtomicBool,
    /// Outcome of `verify_user`.
    pub verify_ok: AtomicBool,
    /// Artificial latency on the products fetch, to stage refresh races.
    pub fetch_delay_ms: AtomicU64,

    next_id: AtomicU64,
}

impl FakeApi {
    /// An empty backend.
    pub fn new() -> Self {
        FakeApi {
            products: Mutex::new(Vec::new()),
            sales: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            categories: Mutex::new(Vec::new()),
            suppliers: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            calls: CallCounters::default(),
            fail_all: AtomicBool::new(false),
            fail_fetch_sales: AtomicBool::new(false),
            fail_update_product: AtomicBool::new(false),
            reject_login: AtomicBool::new(false),
            verify_ok: AtomicBool::new(true),
            fetch_delay_ms: AtomicU64::new(0),
            next_id: AtomicU64::new(100),
        }
    }

    /// A backend with the standard dataset most tests start from:
    ///
    /// - products 1 (Doliprane, 10 boxes) and 2 (Amoxicilline, 4 boxes)
    /// - one fresh sale of 2 Doliprane boxes by the vendeur
    /// - request 1 (5 boxes of product 1) and request 2 (12 boxes of an
    ///   uncataloged "Paracetamol 500"), both pending
    /// - two categories, two suppliers, three users
    pub fn seeded() -> Self {
        let fake = FakeApi::new();

        *fake.users.lock().unwrap() = vec![
            fixtures::admin(),
            fixtures::vendeur(),
            fixtures::autre_vendeur(),
        ];

        *fake.categories.lock().unwrap() = vec![
            Category {
                id: "1".to_string(),
                nom: "Antalgique".to_string(),
            },
            Category {
                id: "2".to_string(),
                nom: "Antibiotique".to_string(),
            },
        ];

        *fake.suppliers.lock().unwrap() = vec![
            Supplier {
                id: "1".to_string(),
                nom: "Sanofi".to_string(),
                telephone: None,
                email: None,
            },
            Supplier {
                id: "2".to_string(),
                nom: "Pfizer".to_string(),
                telephone: None,
                email: None,
            },
        ];

        let mut amoxicilline = fixtures::product("2", "Amoxicilline 500mg", 4);
        amoxicilline.categorie = "Antibiotique".to_string();
        amoxicilline.prix_cents = 650;
        *fake.products.lock().unwrap() = vec![
            fixtures::product("1", "Doliprane 1000mg", 10),
            amoxicilline,
        ];

        let now = Utc::now();
        *fake.sales.lock().unwrap() = vec![Sale {
            id: "1".to_string(),
            product_id: "1".to_string(),
            product_nom: "Doliprane 1000mg".to_string(),
            quantite_vendue: 2,
            date: now.date_naive(),
            user_id: "2".to_string(),
            user_name: "Diallo".to_string(),
            created_at: now - chrono::Duration::minutes(2),
        }];

        *fake.requests.lock().unwrap() = vec![
            ProductRequest {
                id: "1".to_string(),
                product_id: Some("1".to_string()),
                product_nom: "Doliprane 1000mg".to_string(),
                quantite_demandee: 5,
                commentaire: String::new(),
                status: RequestStatus::EnAttente,
                user_id: "2".to_string(),
                user_name: "Diallo".to_string(),
                date_creation: now.date_naive(),
            },
            ProductRequest {
                id: "2".to_string(),
                product_id: None,
                product_nom: "Paracetamol 500".to_string(),
                quantite_demandee: 12,
                commentaire: "Demande client".to_string(),
                status: RequestStatus::EnAttente,
                user_id: "2".to_string(),
                user_name: "Diallo".to_string(),
                date_creation: now.date_naive(),
            },
        ];

        fake
    }

    fn mint_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn outage(&self) -> ClientResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(ClientError::Network("simulated outage".to_string()));
        }
        Ok(())
    }

    fn category_nom(&self, id: &str) -> String {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.nom.clone())
            .unwrap_or_default()
    }

    fn supplier_nom(&self, id: &str) -> String {
        self.suppliers
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.nom.clone())
            .unwrap_or_default()
    }

    fn user_nom(&self, id: &str) -> String {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.nom.clone())
            .unwrap_or_default()
    }
}

impl Default for FakeApi {
    fn default() -> Self {
        FakeApi::new()
    }
}

#[async_trait]
impl PharmaApi for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> ClientResult<(String, User)> {
        self.outage()?;
        if self.reject_login.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized);
        }

        let user = self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned();

        match user {
            Some(user) => Ok((format!("fake-token-{}", user.id), user)),
            None => Err(ClientError::Unauthorized),
        }
    }

    async fn verify_user(&self, _user: &User) -> bool {
        !self.fail_all.load(Ordering::SeqCst) && self.verify_ok.load(Ordering::SeqCst)
    }

    async fn touch_user_activity(
        &self,
        _user_id: &str,
        _now: chrono::DateTime<Utc>,
    ) -> ClientResult<()> {
        self.calls.touch_activity.fetch_add(1, Ordering::SeqCst);
        self.outage()
    }

    async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        self.outage()?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        let delay = self.fetch_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.outage()?;
        Ok(self.products.lock().unwrap().clone())
    }

    async fn create_product(&self, draft: &ProductDraft) -> ClientResult<Product> {
        self.calls.create_product.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let product = Product {
            id: self.mint_id(),
            nom: draft.nom.clone(),
            categorie: self.category_nom(&draft.categorie_id),
            numero_lot: draft.numero_lot.clone(),
            date_peremption: draft.date_peremption,
            quantite_boites: draft.quantite_boites,
            quantite_unites: draft.quantite_unites,
            prix_cents: draft.prix.cents(),
            fournisseur: self.supplier_nom(&draft.fournisseur_id),
            description: draft.description.clone(),
        };
        self.products.lock().unwrap().push(product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: &str, patch: &ProductPatch) -> ClientResult<Product> {
        self.calls.update_product.fetch_add(1, Ordering::SeqCst);
        self.outage()?;
        if self.fail_update_product.load(Ordering::SeqCst) {
            return Err(ClientError::Http {
                status: 500,
                body: "produits endpoint down".to_string(),
            });
        }

        // Resolve roster names outside the products lock
        let categorie = patch.categorie_id.as_deref().map(|c| self.category_nom(c));
        let fournisseur = patch
            .fournisseur_id
            .as_deref()
            .map(|f| self.supplier_nom(f));

        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("produits/{id}")))?;

        if let Some(nom) = &patch.nom {
            product.nom = nom.clone();
        }
        if let Some(categorie) = categorie {
            product.categorie = categorie;
        }
        if let Some(fournisseur) = fournisseur {
            product.fournisseur = fournisseur;
        }
        if let Some(numero_lot) = &patch.numero_lot {
            product.numero_lot = numero_lot.clone();
        }
        if let Some(date) = patch.date_peremption {
            product.date_peremption = date;
        }
        if let Some(qty) = patch.quantite_boites {
            product.quantite_boites = qty;
        }
        if let Some(qty) = patch.quantite_unites {
            product.quantite_unites = qty;
        }
        if let Some(prix) = patch.prix {
            product.prix_cents = prix.cents();
        }
        if let Some(description) = &patch.description {
            product.description = description.clone();
        }

        Ok(product.clone())
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.outage()?;
        self.products.lock().unwrap().retain(|p| p.id != id);
        Ok(())
    }

    async fn fetch_sales(&self) -> ClientResult<Vec<Sale>> {
        self.outage()?;
        if self.fail_fetch_sales.load(Ordering::SeqCst) {
            return Err(ClientError::Http {
                status: 500,
                body: "ventes endpoint down".to_string(),
            });
        }
        Ok(self.sales.lock().unwrap().clone())
    }

    async fn create_sale(&self, sale: &NewSale) -> ClientResult<Sale> {
        self.calls.create_sale.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let user_name = self.user_nom(&sale.user_id);
        let mut products = self.products.lock().unwrap();
        let product = products
            .iter_mut()
            .find(|p| p.id == sale.product_id)
            .ok_or_else(|| ClientError::NotFound(format!("produits/{}", sale.product_id)))?;

        if product.quantite_boites < sale.quantite_vendue {
            return Err(ClientError::Validation("Stock insuffisant".to_string()));
        }
        product.quantite_boites -= sale.quantite_vendue;

        let recorded = Sale {
            id: self.mint_id(),
            product_id: sale.product_id.clone(),
            product_nom: product.nom.clone(),
            quantite_vendue: sale.quantite_vendue,
            date: sale.at.date_naive(),
            user_id: sale.user_id.clone(),
            user_name,
            created_at: sale.at,
        };
        drop(products);

        self.sales.lock().unwrap().push(recorded.clone());
        Ok(recorded)
    }

    async fn update_sale_quantity(&self, id: &str, quantite_vendue: i64) -> ClientResult<Sale> {
        self.calls.update_sale.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let mut sales = self.sales.lock().unwrap();
        let sale = sales
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("ventes/{id}")))?;

        let delta = quantite_vendue - sale.quantite_vendue;
        sale.quantite_vendue = quantite_vendue;
        let updated = sale.clone();
        drop(sales);

        if let Some(product) = self
            .products
            .lock()
            .unwrap()
            .iter_mut()
            .find(|p| p.id == updated.product_id)
        {
            product.quantite_boites -= delta;
        }

        Ok(updated)
    }

    async fn delete_sale(&self, id: &str) -> ClientResult<()> {
        self.calls.delete_sale.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let removed = {
            let mut sales = self.sales.lock().unwrap();
            let removed = sales.iter().find(|s| s.id == id).cloned();
            sales.retain(|s| s.id != id);
            removed
        };

        if let Some(sale) = removed {
            if let Some(product) = self
                .products
                .lock()
                .unwrap()
                .iter_mut()
                .find(|p| p.id == sale.product_id)
            {
                product.quantite_boites += sale.quantite_vendue;
            }
        }
        Ok(())
    }

    async fn fetch_requests(&self) -> ClientResult<Vec<ProductRequest>> {
        self.outage()?;
        Ok(self.requests.lock().unwrap().clone())
    }

    async fn create_request(&self, request: &NewRequest) -> ClientResult<ProductRequest> {
        self.calls.create_request.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let product_nom = match &request.product_id {
            Some(id) => self
                .products
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.id == *id)
                .map(|p| p.nom.clone())
                .unwrap_or_else(|| request.product_nom.clone()),
            None => request.product_nom.clone(),
        };

        let created = ProductRequest {
            id: self.mint_id(),
            product_id: request.product_id.clone(),
            product_nom,
            quantite_demandee: request.quantite_demandee,
            commentaire: request.commentaire.clone(),
            status: RequestStatus::EnAttente,
            user_id: request.user_id.clone(),
            user_name: self.user_nom(&request.user_id),
            date_creation: Utc::now().date_naive(),
        };
        self.requests.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn set_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> ClientResult<ProductRequest> {
        self.calls.set_request_status.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let mut requests = self.requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("demandes-produits/{id}")))?;

        // Deliberately permissive: the terminal-status guard under test is
        // the client's, not the backend's
        request.status = status;
        Ok(request.clone())
    }

    async fn fetch_categories(&self) -> ClientResult<Vec<Category>> {
        self.outage()?;
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn create_category(&self, nom: &str) -> ClientResult<Category> {
        self.calls.create_category.fetch_add(1, Ordering::SeqCst);
        self.outage()?;

        let created = Category {
            id: self.mint_id(),
            nom: nom.to_string(),
        };
        self.categories.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn fetch_suppliers(&self) -> ClientResult<Vec<Supplier>> {
        self.outage()?;
        Ok(self.suppliers.lock().unwrap().clone())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// Shared fixture values, mirrored by the seeded fake.
pub mod fixtures {
    use super::*;

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// User 1: Moussa Ndiaye, ADMIN.
    pub fn admin() -> User {
        User {
            id: "1".to_string(),
            nom: "Ndiaye".to_string(),
            prenom: "Moussa".to_string(),
            email: "moussa@officine.test".to_string(),
            role: UserRole::Admin,
            badge_id: "B-001".to_string(),
        }
    }

    /// User 2: Awa Diallo, VENDEUR. Owns the seeded sale.
    pub fn vendeur() -> User {
        User {
            id: "2".to_string(),
            nom: "Diallo".to_string(),
            prenom: "Awa".to_string(),
            email: "awa@officine.test".to_string(),
            role: UserRole::Vendeur,
            badge_id: "B-007".to_string(),
        }
    }

    /// User 3: Idrissa Sow, VENDEUR. Owns nothing.
    pub fn autre_vendeur() -> User {
        User {
            id: "3".to_string(),
            nom: "Sow".to_string(),
            prenom: "Idrissa".to_string(),
            email: "idrissa@officine.test".to_string(),
            role: UserRole::Vendeur,
            badge_id: "B-003".to_string(),
        }
    }

    /// An antalgique at 3,00 € with the given box count.
    pub fn product(id: &str, nom: &str, quantite_boites: i64) -> Product {
        Product {
            id: id.to_string(),
            nom: nom.to_string(),
            categorie: "Antalgique".to_string(),
            numero_lot: format!("LOT-{id}"),
            date_peremption: date(2027, 6, 30),
            quantite_boites,
            quantite_unites: 0,
            prix_cents: 300,
            fournisseur: "Sanofi".to_string(),
            description: String::new(),
        }
    }
}
