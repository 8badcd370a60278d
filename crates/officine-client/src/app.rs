//! # Application Handle
//!
//! Wires the configuration, session, gateway, and stores into the single
//! handle the UI shell holds.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Application Startup                              │
//! │                                                                         │
//! │  init_tracing()                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Officine::bootstrap(None)                                              │
//! │       │   config (defaults → file → env) ──► session store             │
//! │       │   gateway ──► REST api ──► auth store + data store             │
//! │       ▼                                                                 │
//! │  officine.start().await                                                 │
//! │       │   restore session (LOADING settles)                             │
//! │       │   if authenticated: initial refresh (best-effort)               │
//! │       ▼                                                                 │
//! │  shell renders against session state + store snapshots                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::RestApi;
use crate::auth::AuthStore;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::gateway::RestGateway;
use crate::guard::{self, Access, Route};
use crate::session::{SessionState, SessionStore};
use crate::store::DataStore;

// =============================================================================
// Tracing
// =============================================================================

/// Initializes structured logging.
///
/// `RUST_LOG` takes precedence; the default keeps our crates chatty and
/// everything else at info.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,officine=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// =============================================================================
// Application Handle
// =============================================================================

/// The assembled client: one configuration, one session, one backend.
pub struct Officine {
    config: ClientConfig,
    session: Arc<SessionStore>,
    auth: AuthStore<RestApi>,
    data: DataStore<RestApi>,
}

impl Officine {
    /// Builds the full stack from the configuration at `config_path`
    /// (platform default when `None`). Missing configuration falls back to
    /// defaults; only an unusable data directory or base URL is fatal.
    pub fn bootstrap(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let config = ClientConfig::load_or_default(config_path);
        info!(base_url = %config.api.base_url, "Starting officine client");

        let session = Arc::new(SessionStore::new(config.session_path()?));
        let gateway = RestGateway::new(&config, session.clone())?;
        let api = Arc::new(RestApi::new(gateway));

        Ok(Officine {
            auth: AuthStore::new(api.clone(), session.clone()),
            data: DataStore::new(api),
            config,
            session,
        })
    }

    /// Settles the session from disk and, if someone is signed in, primes
    /// the collections. A failed initial refresh is reported and tolerated;
    /// the screens start empty and the next refresh fills them.
    pub async fn start(&self) {
        self.auth.restore().await;

        if self.session.state() == SessionState::Authenticated {
            if let Err(e) = self.data.refresh_all().await {
                warn!(?e, "Initial refresh failed");
            }
        }
    }

    /// Signs the user out and drops everything derived from the session,
    /// cached collections and activity log included.
    pub async fn logout(&self) {
        self.auth.logout().await;
        self.data.clear().await;
    }

    /// Decides what to render for a browser path right now.
    pub async fn evaluate_route(&self, path: &str) -> Access {
        guard::evaluate(
            Route::from_path(path),
            self.session.state(),
            self.auth.is_admin().await,
        )
    }

    /// Session state changes, for the shell's render loop.
    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> &AuthStore<RestApi> {
        &self.auth
    }

    pub fn data(&self) -> &DataStore<RestApi> {
        &self.data
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
