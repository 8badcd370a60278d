//! # Session Store
//!
//! Holds the authenticated user and bearer token, persists them across
//! launches, and broadcasts session state changes to the UI shell.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Session State Machine                            │
//! │                                                                         │
//! │                         ┌─────────────┐                                 │
//! │        app start ─────► │   LOADING   │                                 │
//! │                         └──────┬──────┘                                 │
//! │                                │                                        │
//! │          stored session        │        nothing stored, or              │
//! │          verified with server  │        verification failed             │
//! │            ┌───────────────────┴───────────────────┐                    │
//! │            ▼                                       ▼                    │
//! │     ┌───────────────┐      logout or       ┌─────────────────┐          │
//! │     │ AUTHENTICATED │ ───────────────────► │ UNAUTHENTICATED │          │
//! │     └───────────────┘      401 expiry      └─────────────────┘          │
//! │            ▲                                       │                    │
//! │            └───────────── successful login ────────┘                    │
//! │                                                                         │
//! │  LOADING is entered exactly once, at startup. Route guards render a     │
//! │  neutral loading view while in it so a stored session never flashes     │
//! │  the login page.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persistence
//! The token and user travel together in a single JSON file under the data
//! directory. A file that cannot be read or parsed is treated the same as no
//! stored session at all: the restore path must never crash the app over a
//! stale or corrupt credential file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use officine_core::User;

// =============================================================================
// Session State
// =============================================================================

/// Where the client currently stands with respect to authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Startup restore is still in flight.
    Loading,
    /// A verified user is signed in.
    Authenticated,
    /// Nobody is signed in.
    Unauthenticated,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Loading => write!(f, "loading"),
            SessionState::Authenticated => write!(f, "authenticated"),
            SessionState::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

// =============================================================================
// Session Data
// =============================================================================

/// The credentials persisted between launches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Bearer token issued by the backend at login.
    pub token: String,
    /// The signed-in user as of the last login or verification.
    pub user: User,
}

// =============================================================================
// Session Store
// =============================================================================

/// Owns the current session and its on-disk copy.
///
/// All mutation goes through this type so that the in-memory credentials,
/// the persisted file, and the broadcast state can never disagree for long.
pub struct SessionStore {
    /// Path of the persisted session file.
    path: PathBuf,
    /// Current credentials, if any.
    data: RwLock<Option<SessionData>>,
    /// State change broadcaster.
    state_tx: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Creates a store persisting to `path`. Starts in `Loading`.
    pub fn new(path: PathBuf) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Loading);
        SessionStore {
            path,
            data: RwLock::new(None),
            state_tx,
        }
    }

    /// Returns the current session state.
    pub fn state(&self) -> SessionState {
        *self.state_tx.borrow()
    }

    /// Subscribes to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Reads the persisted session, if one exists.
    ///
    /// Unreadable or corrupt files are logged, deleted, and reported as
    /// absent. The caller still has to verify the credentials with the
    /// server before trusting them.
    pub fn load_persisted(&self) -> Option<SessionData> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No stored session");
            return None;
        }

        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(?e, path = %self.path.display(), "Could not read stored session");
                return None;
            }
        };

        match serde_json::from_str::<SessionData>(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(?e, "Stored session is corrupt; discarding it");
                self.remove_file();
                None
            }
        }
    }

    /// Installs a freshly issued session and persists it.
    ///
    /// Persistence is best-effort: a disk error costs the next launch its
    /// auto-restore but must not fail an otherwise valid login.
    pub async fn open(&self, token: String, user: User) {
        let data = SessionData { token, user };

        match serde_json::to_string_pretty(&data) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(?e, path = %self.path.display(), "Could not persist session");
                }
            }
            Err(e) => warn!(?e, "Could not serialize session"),
        }

        info!(user_id = %data.user.id, "Session opened");
        *self.data.write().await = Some(data);
        self.set_state(SessionState::Authenticated);
    }

    /// Stages stored credentials without settling the session state.
    ///
    /// The startup restore has to attach the stored token to its
    /// verification request while the state is still `Loading`; the state
    /// settles only once the server has answered.
    pub async fn stage(&self, data: SessionData) {
        *self.data.write().await = Some(data);
    }

    /// Adopts an already-persisted session after server verification.
    pub async fn resume(&self, data: SessionData) {
        info!(user_id = %data.user.id, "Session restored");
        *self.data.write().await = Some(data);
        self.set_state(SessionState::Authenticated);
    }

    /// Ends the session: forgets the credentials and removes the file.
    pub async fn clear(&self) {
        self.remove_file();
        *self.data.write().await = None;
        self.set_state(SessionState::Unauthenticated);
    }

    /// Tears the session down after the server rejected its token.
    pub async fn expire(&self) {
        warn!("Server rejected the session token; clearing credentials");
        self.clear().await;
    }

    /// Settles the startup restore with no session.
    pub fn settle_unauthenticated(&self) {
        self.set_state(SessionState::Unauthenticated);
    }

    /// Returns the bearer token, if signed in.
    pub async fn token(&self) -> Option<String> {
        self.data.read().await.as_ref().map(|d| d.token.clone())
    }

    /// Returns the signed-in user, if any.
    pub async fn current_user(&self) -> Option<User> {
        self.data.read().await.as_ref().map(|d| d.user.clone())
    }

    /// Returns true while a user is signed in.
    pub async fn is_authenticated(&self) -> bool {
        self.data.read().await.is_some()
    }

    /// Publishes a state change. `Loading` is startup-only and is never
    /// re-entered once the restore has settled.
    fn set_state(&self, next: SessionState) {
        let current = *self.state_tx.borrow();
        if next == SessionState::Loading && current != SessionState::Loading {
            debug!(%current, "Ignoring transition back to loading");
            return;
        }
        if current != next {
            debug!(from = %current, to = %next, "Session state changed");
            // send_replace: the state must update even before any subscriber
            // exists; plain send() is a no-op while the channel has no
            // receivers.
            self.state_tx.send_replace(next);
        }
    }

    fn remove_file(&self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(?e, path = %self.path.display(), "Could not remove session file");
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
