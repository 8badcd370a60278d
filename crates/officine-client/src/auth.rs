//! # Authentication Store
//!
//! Drives the session through login, logout, and the startup restore.
//!
//! ## Startup Restore
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Startup Restore Sequence                           │
//! │                                                                         │
//! │  app start (state: LOADING)                                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  read stored session ──── none ─────────────► UNAUTHENTICATED           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  essential fields present? ── no ──► clear ─► UNAUTHENTICATED           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ask server about the user ── no/error ──► clear ─► UNAUTHENTICATED     │
//! │        │                                                                │
//! │        ▼ confirmed                                                      │
//! │  AUTHENTICATED (no login screen shown)                                  │
//! │                                                                         │
//! │  Every failure path lands in UNAUTHENTICATED. A stale token, a dead     │
//! │  backend, or a corrupt file costs the user a login, never a crash.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use officine_core::User;

use crate::api::PharmaApi;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

// =============================================================================
// Auth Store
// =============================================================================

/// Authentication operations over a [`PharmaApi`] backend.
pub struct AuthStore<A> {
    api: Arc<A>,
    session: Arc<SessionStore>,
}

impl<A: PharmaApi> AuthStore<A> {
    pub fn new(api: Arc<A>, session: Arc<SessionStore>) -> Self {
        AuthStore { api, session }
    }

    /// Signs in with email and password.
    ///
    /// Rejected credentials come back as `Ok(false)`, never as an error:
    /// the login screen shows its own fixed message and must not leak
    /// backend wording. Infrastructure failures (network down, backend
    /// broken) still surface as errors so they can be told apart.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<bool> {
        let (token, user) = match self.api.login(email, password).await {
            Ok(ok) => ok,
            Err(ClientError::Unauthorized) | Err(ClientError::Validation(_)) => {
                info!(email, "Login rejected");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        info!(user_id = %user.id, role = %user.role, "Login succeeded");
        self.session.open(token, user.clone()).await;
        self.touch_activity(&user).await;
        Ok(true)
    }

    /// Signs out.
    ///
    /// The server is notified best-effort; local credentials are cleared
    /// no matter what so the user is never stuck signed in.
    pub async fn logout(&self) {
        if let Some(user) = self.session.current_user().await {
            info!(user_id = %user.id, "Logging out");
            self.touch_activity(&user).await;
        }
        self.session.clear().await;
    }

    /// Settles the startup session state from the persisted credentials.
    pub async fn restore(&self) {
        let Some(data) = self.session.load_persisted() else {
            self.session.settle_unauthenticated();
            return;
        };

        if !data.user.has_essential_fields() {
            warn!("Stored session is missing essential user fields; signing out");
            self.session.clear().await;
            return;
        }

        // The verification request needs the stored token attached
        self.session.stage(data.clone()).await;

        if self.api.verify_user(&data.user).await {
            self.session.resume(data).await;
        } else {
            info!("Stored session was not confirmed by the server; signing out");
            self.session.clear().await;
        }
    }

    /// Returns the signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.session.current_user().await
    }

    /// Returns true when the signed-in user is an administrator.
    pub async fn is_admin(&self) -> bool {
        self.session
            .current_user()
            .await
            .map(|u| u.is_admin())
            .unwrap_or(false)
    }

    /// Stamps the user's last-activity column. Failures are logged and
    /// swallowed; activity bookkeeping never blocks an auth flow.
    async fn touch_activity(&self, user: &User) {
        if let Err(e) = self.api.touch_user_activity(&user.id, Utc::now()).await {
            warn!(?e, user_id = %user.id, "Could not record user activity");
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
