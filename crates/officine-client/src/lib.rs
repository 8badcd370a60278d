//! # officine-client: REST Client for Officine
//!
//! This crate is the I/O half of the pharmacy client: it talks to the
//! Laravel backend, keeps the session alive across restarts, and holds the
//! in-memory collections every screen renders from. The domain rules it
//! enforces live in `officine-core`.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Client Architecture                             │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  Officine (Application Handle)                   │  │
//! │  │                                                                  │  │
//! │  │  bootstrap() wires config → session → gateway → stores           │  │
//! │  │  start() restores the session and primes the collections         │  │
//! │  └──────────────┬────────────────────────────┬──────────────────────┘  │
//! │                 │                            │                         │
//! │                 ▼                            ▼                         │
//! │  ┌────────────────────────┐   ┌────────────────────────────────────┐  │
//! │  │       AuthStore        │   │             DataStore              │  │
//! │  │                        │   │                                    │  │
//! │  │ login / logout         │   │ products, sales, requests,         │  │
//! │  │ restore on startup     │   │ categories, suppliers, users       │  │
//! │  │ activity heartbeat     │   │ stock rules + activity history     │  │
//! │  └───────────┬────────────┘   └─────────────────┬──────────────────┘  │
//! │              │                                  │                      │
//! │              ▼                                  ▼                      │
//! │  ┌────────────────────────┐   ┌────────────────────────────────────┐  │
//! │  │      SessionStore      │◄──┤        RestApi (PharmaApi)         │  │
//! │  │                        │401│                                    │  │
//! │  │ LOADING → AUTH/UNAUTH  │   │ login, produits, ventes,           │  │
//! │  │ token persisted on disk│   │ demandes-produits, categories, ... │  │
//! │  └────────────────────────┘   └─────────────────┬──────────────────┘  │
//! │                                                 │                      │
//! │                               ┌─────────────────▼──────────────────┐  │
//! │                               │            RestGateway             │  │
//! │                               │                                    │  │
//! │                               │ reqwest + bearer token             │  │
//! │                               │ failure classification (401/422)   │  │
//! │                               └─────────────────┬──────────────────┘  │
//! │                                                 ▼                      │
//! │                                        Laravel REST backend            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`api`] - REST endpoints behind the [`PharmaApi`] trait
//! - [`app`] - [`Officine`] application handle and tracing setup
//! - [`auth`] - Login, logout, and startup session restore
//! - [`config`] - Client configuration (base URL, timeout, data directory)
//! - [`error`] - Client error types
//! - [`gateway`] - HTTP transport with bearer auth and failure classification
//! - [`guard`] - Route table and navigation guard
//! - [`session`] - Session state machine and on-disk persistence
//! - [`store`] - Cached collections and the stock bookkeeping around them
//! - [`wire`] - Serde types and conversions for the backend wire format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use officine_client::{init_tracing, Officine};
//!
//! init_tracing();
//!
//! let app = Officine::bootstrap(None)?;
//! app.start().await;
//!
//! if app.auth().login("awa@officine.test", "secret").await? {
//!     let produits = app.data().products().await;
//!     println!("{} produits en stock", produits.len());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod store;
pub mod wire;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

// Application surface
pub use app::{init_tracing, Officine};
pub use auth::AuthStore;
pub use store::{Collections, DataStore, RequestDraft};

// Backend access
pub use api::{NewRequest, NewSale, PharmaApi, ProductDraft, ProductPatch, RestApi};
pub use gateway::RestGateway;

// Session and navigation
pub use guard::{Access, Route};
pub use session::{SessionData, SessionState, SessionStore};

// Configuration and errors
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
