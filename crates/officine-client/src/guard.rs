//! # Route Guard
//!
//! The navigation map and the access rules the UI shell applies before
//! rendering a screen.
//!
//! ## Access Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Route Access Matrix                             │
//! │                                                                         │
//! │                      LOADING      UNAUTHENTICATED    AUTHENTICATED     │
//! │  /login, /register   loading      allow              ► /dashboard      │
//! │  /dashboard …        loading      ► /login           allow             │
//! │  /validation         loading      ► /login           admin: allow      │
//! │                                                      other: ► /dash…   │
//! │  anything else       loading      ► /login           ► /dashboard      │
//! │                                                                         │
//! │  While the startup restore is in flight every route shows a neutral     │
//! │  loading view: a stored session must never flash the login page, and    │
//! │  an expired one must never flash the dashboard.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::session::SessionState;

// =============================================================================
// Routes
// =============================================================================

/// Every screen the client can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Produits,
    Ventes,
    Peremptions,
    Demandes,
    Validation,
    Historique,
    /// Catch-all for unknown paths.
    NotFound,
}

impl Route {
    /// Resolves a browser path to a route. Unknown paths become the
    /// catch-all; the bare root behaves as the dashboard.
    pub fn from_path(path: &str) -> Route {
        match path.trim_end_matches('/') {
            "" => Route::Dashboard,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/dashboard" => Route::Dashboard,
            "/produits" => Route::Produits,
            "/ventes" => Route::Ventes,
            "/peremptions" => Route::Peremptions,
            "/demandes" => Route::Demandes,
            "/validation" => Route::Validation,
            "/historique" => Route::Historique,
            _ => Route::NotFound,
        }
    }

    /// Canonical path of the route.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Dashboard => "/dashboard",
            Route::Produits => "/produits",
            Route::Ventes => "/ventes",
            Route::Peremptions => "/peremptions",
            Route::Demandes => "/demandes",
            Route::Validation => "/validation",
            Route::Historique => "/historique",
            Route::NotFound => "/dashboard",
        }
    }

    /// French menu label, as shown in the sidebar.
    pub fn label(&self) -> &'static str {
        match self {
            Route::Login => "Connexion",
            Route::Register => "Inscription",
            Route::Dashboard => "Tableau de bord",
            Route::Produits => "Produits",
            Route::Ventes => "Ventes",
            Route::Peremptions => "Péremptions",
            Route::Demandes => "Demandes",
            Route::Validation => "Validation",
            Route::Historique => "Historique",
            Route::NotFound => "Introuvable",
        }
    }

    /// Reachable without a session.
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Reserved to the ADMIN role.
    pub fn admin_only(&self) -> bool {
        matches!(self, Route::Validation)
    }
}

/// Sidebar entries for a signed-in user, in display order. The validation
/// screen only appears for admins.
pub fn nav_routes(is_admin: bool) -> Vec<Route> {
    let mut routes = vec![
        Route::Dashboard,
        Route::Produits,
        Route::Ventes,
        Route::Peremptions,
        Route::Demandes,
    ];
    if is_admin {
        routes.push(Route::Validation);
    }
    routes.push(Route::Historique);
    routes
}

// =============================================================================
// Access Evaluation
// =============================================================================

/// What the shell should render for a requested route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Render the requested screen.
    Allow,
    /// Render the neutral loading view (restore still in flight).
    ShowLoading,
    /// Navigate to the login screen.
    RedirectLogin,
    /// Navigate to the dashboard.
    RedirectDashboard,
}

/// Decides what to render for `route` in the current session state.
pub fn evaluate(route: Route, state: SessionState, is_admin: bool) -> Access {
    match state {
        SessionState::Loading => Access::ShowLoading,
        SessionState::Unauthenticated => {
            if route.is_public() {
                Access::Allow
            } else {
                Access::RedirectLogin
            }
        }
        SessionState::Authenticated => {
            if route.is_public() || route == Route::NotFound {
                Access::RedirectDashboard
            } else if route.admin_only() && !is_admin {
                Access::RedirectDashboard
            } else {
                Access::Allow
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
