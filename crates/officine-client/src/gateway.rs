//! # REST Gateway
//!
//! The single doorway between this client and the pharmacy backend. Every
//! network request flows through here so that authentication, error
//! classification, and session teardown happen in exactly one place.
//!
//! ## Request Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Pipeline                                │
//! │                                                                         │
//! │  caller ──► verb method (get/post/put/patch/delete)                    │
//! │                │                                                        │
//! │                ▼                                                        │
//! │          attach bearer token (when a session is open)                   │
//! │                │                                                        │
//! │                ▼                                                        │
//! │          send ──► 2xx ──► decode JSON ──► domain payload               │
//! │                │                                                        │
//! │                ├── 401 ──► expire session* ──► Unauthorized            │
//! │                ├── 404 ──► NotFound                                    │
//! │                ├── 422 ──► first field message ──► Validation          │
//! │                └── other ──► Http { status, body }                     │
//! │                                                                         │
//! │  * except for the login endpoint itself, where a 401 simply means      │
//! │    bad credentials and must not tear down anything.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionStore;

// =============================================================================
// Gateway
// =============================================================================

/// HTTP client bound to one backend and one session.
pub struct RestGateway {
    http: reqwest::Client,
    base: String,
    session: Arc<SessionStore>,
}

impl RestGateway {
    /// Builds a gateway from the loaded configuration.
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(RestGateway {
            http,
            base: config.api.base_url.clone(),
            session,
        })
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let resp = self.send("GET", path, self.http.get(self.endpoint(path))).await?;
        decode(resp).await
    }

    /// POST a JSON body, decoding the JSON response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.http.post(self.endpoint(path)).json(body);
        let resp = self.send("POST", path, builder).await?;
        decode(resp).await
    }

    /// PUT a JSON body, decoding the JSON response.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.http.put(self.endpoint(path)).json(body);
        let resp = self.send("PUT", path, builder).await?;
        decode(resp).await
    }

    /// PATCH a JSON body, ignoring the response body.
    pub async fn patch<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<()> {
        let builder = self.http.patch(self.endpoint(path)).json(body);
        self.send("PATCH", path, builder).await?;
        Ok(())
    }

    /// DELETE a resource, ignoring the response body.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send("DELETE", path, self.http.delete(self.endpoint(path))).await?;
        Ok(())
    }

    /// Sends one request and classifies any failure.
    async fn send(
        &self,
        method: &str,
        path: &str,
        builder: RequestBuilder,
    ) -> ClientResult<Response> {
        let builder = match self.session.token().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        debug!(method, path, "API request");

        let resp = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        warn!(method, path, status = status.as_u16(), "API request failed");
        Err(self.classify_failure(status, &body, path).await)
    }

    /// Maps a non-2xx response to a `ClientError`.
    ///
    /// A 401 anywhere but the login endpoint means the stored token is no
    /// longer honored, so the session is torn down before the error is
    /// returned. On the login endpoint a 401 is just wrong credentials.
    async fn classify_failure(&self, status: StatusCode, body: &str, path: &str) -> ClientError {
        match status {
            StatusCode::UNAUTHORIZED => {
                if !is_login_path(path) {
                    self.session.expire().await;
                }
                ClientError::Unauthorized
            }
            StatusCode::NOT_FOUND => ClientError::NotFound(path.to_string()),
            StatusCode::UNPROCESSABLE_ENTITY => match first_validation_message(body) {
                Some(message) => ClientError::Validation(message),
                None => ClientError::Http {
                    status: status.as_u16(),
                    body: body.to_string(),
                },
            },
            _ => ClientError::Http {
                status: status.as_u16(),
                body: body.to_string(),
            },
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    resp.json::<T>()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))
}

// =============================================================================
// Failure Classification Helpers
// =============================================================================

/// True for the one endpoint where a 401 must not tear the session down.
fn is_login_path(path: &str) -> bool {
    path.trim_matches('/').ends_with("login")
}

/// The backend's 422 body: a human message plus per-field message lists.
#[derive(Debug, Deserialize)]
struct ValidationBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Extracts the message to surface from a 422 body.
///
/// Takes the first message of the first field, matching what the previous
/// client showed users, and falls back to the top-level message.
fn first_validation_message(body: &str) -> Option<String> {
    let parsed: ValidationBody = serde_json::from_str(body).ok()?;

    parsed
        .errors
        .into_iter()
        .next()
        .and_then(|(_, messages)| messages.into_iter().next())
        .or(parsed.message)
}

// =============================================================================
// Unit Tests
// =============================================================================
