//! # Client Error Types
//!
//! Error types for the REST client layer.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │     HTTP        │  │     Local State         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  Http{status}   │  │  Session                │ │
//! │  │                 │  │  Unauthorized   │  │  Config                 │ │
//! │  │                 │  │  NotFound       │  │                         │ │
//! │  │                 │  │  Validation     │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Decoding     │  │     Domain      │                              │
//! │  │                 │  │                 │                              │
//! │  │  Decode         │  │  Core (wraps    │                              │
//! │  │                 │  │  officine-core) │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Propagation Policy
//! Store methods log backend failures and re-throw them normalized; the UI
//! presents the message as a notification. Nothing here retries on its own:
//! every retry is the user resubmitting the form. The single exception is
//! `Unauthorized`, which the gateway turns into a global session teardown
//! instead of a local message.

use thiserror::Error;

use officine_core::CoreError;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all REST layer failures.
///
/// ## Design Principles
/// - Unauthorized is its own variant, never folded into Http: it carries a
///   global side effect (session teardown) no other status has
/// - Validation carries the first server field message, ready for display
/// - All errors are `Send + Sync` for async compatibility
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Connectivity failure before any HTTP status was received.
    #[error("Network error: {0}")]
    Network(String),

    // =========================================================================
    // HTTP Errors
    // =========================================================================
    /// Non-2xx response that maps to no more specific variant.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP 401. The gateway tears the session down before surfacing this.
    #[error("Session expired or invalid credentials")]
    Unauthorized,

    /// HTTP 404, or a reference the backend no longer knows.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 422 with a structured Laravel-style error body.
    /// Carries the first field message, ready for the notification toast.
    #[error("{0}")]
    Validation(String),

    // =========================================================================
    // Decoding Errors
    // =========================================================================
    /// Response body was not the JSON shape we expect.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    // =========================================================================
    // Local State Errors
    // =========================================================================
    /// Session file could not be read or written.
    #[error("Session storage error: {0}")]
    Session(String),

    /// Configuration could not be loaded, parsed or saved.
    #[error("Configuration error: {0}")]
    Config(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    /// Business rule violation from officine-core (insufficient stock,
    /// finalized request, cancel window, local validation).
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ClientError::Decode(err.to_string());
        }
        if let Some(status) = err.status() {
            return ClientError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            };
        }
        ClientError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Session(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if resubmitting the same operation could succeed.
    ///
    /// ## Retryable
    /// - Network failures (connectivity blips)
    /// - 5xx responses
    ///
    /// ## Non-Retryable
    /// - Validation and domain rule rejections (same input, same answer)
    /// - Unauthorized (needs a fresh login, not a retry)
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error means the session is no longer valid.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    /// Returns true if this error came from a local business rule, meaning
    /// no network call was made.
    pub fn is_local_rejection(&self) -> bool {
        matches!(self, ClientError::Core(_))
    }
}
