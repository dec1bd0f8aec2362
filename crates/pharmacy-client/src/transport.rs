//! # HTTP Transport
//!
//! The boundary that issues requests against the pharmacy backend and
//! normalizes their outcomes.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Transport Request Flow                               │
//! │                                                                         │
//! │  request(GET, "/api/medicines", None)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  credential set? ── yes ──► Authorization: Bearer <token>              │
//! │       │ no                                                              │
//! │       ▼  (sent unauthenticated, the server decides)                     │
//! │  ┌────────────┐                                                         │
//! │  │   send     │── no response ─────────► TransportError::Network        │
//! │  └─────┬──────┘                                                         │
//! │        │ response                                                       │
//! │        ▼                                                                │
//! │  2xx? ── no ──► TransportError::Api { status, body.message? }           │
//! │        │ yes                                                            │
//! │        ▼                                                                │
//! │  JSON body ── invalid ─► TransportError::Decode                         │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  Ok(Value)   (empty body = Value::Null)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transport holds the default credential but never decides what it is;
//! the auth module sets and clears it.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiSettings;
use crate::error::{ClientError, ClientResult, TransportError};

// =============================================================================
// Method
// =============================================================================

/// HTTP methods used against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Request/response boundary used by every store module.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request relative to the backend base URL.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError>;

    /// Sets or clears the default bearer credential.
    fn set_credential(&self, token: Option<String>);

    /// Current default bearer credential.
    fn credential(&self) -> Option<String>;
}

// =============================================================================
// reqwest Implementation
// =============================================================================

/// [`Transport`] over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credential: RwLock<Option<String>>,
}

impl HttpTransport {
    /// Creates a transport with no request timeout.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Creates a transport, optionally bounding every request.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> ClientResult<Self> {
        let parsed = url::Url::parse(base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base URL must be http or https, got: {}",
                base_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: RwLock::new(None),
        })
    }

    /// Creates a transport from the `[api]` config section.
    pub fn from_settings(settings: &ApiSettings) -> ClientResult<Self> {
        Self::with_timeout(&settings.base_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let mut request = self.client.request(method.into(), self.url(path));

        let credential = self.credential();
        if let Some(token) = &credential {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        debug!(%method, path, authenticated = credential.is_some(), "Sending request");

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
                .filter(|m| !m.is_empty());

            debug!(%method, path, status = status.as_u16(), "Request failed");
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }

    fn set_credential(&self, token: Option<String>) {
        *self.credential.write() = token;
    }

    fn credential(&self) -> Option<String> {
        self.credential.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    async fn echo_auth(headers: HeaderMap) -> Json<Value> {
        let auth = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Json(json!({ "authorization": auth }))
    }

    async fn echo_body(Json(body): Json<Value>) -> Json<Value> {
        Json(body)
    }

    async fn forbidden() -> (StatusCode, Json<Value>) {
        (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "Permission denied" })),
        )
    }

    async fn plain_failure() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom")
    }

    async fn empty() -> StatusCode {
        StatusCode::OK
    }

    async fn not_json() -> &'static str {
        "definitely not json"
    }

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/api/auth", get(echo_auth))
            .route("/api/echo", post(echo_body))
            .route("/api/forbidden", get(forbidden))
            .route("/api/plain", get(plain_failure))
            .route("/api/empty", get(empty))
            .route("/api/not-json", get(not_json));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_bearer_header_follows_credential() {
        let base = spawn_backend().await;
        let transport = HttpTransport::new(&base).unwrap();

        let body = transport.request(Method::Get, "/api/auth", None).await.unwrap();
        assert_eq!(body["authorization"], Value::Null);

        transport.set_credential(Some("t1".to_string()));
        let body = transport.request(Method::Get, "/api/auth", None).await.unwrap();
        assert_eq!(body["authorization"], "Bearer t1");

        transport.set_credential(None);
        let body = transport.request(Method::Get, "api/auth", None).await.unwrap();
        assert_eq!(body["authorization"], Value::Null);
    }

    #[tokio::test]
    async fn test_json_body_is_sent() {
        let base = spawn_backend().await;
        let transport = HttpTransport::new(&format!("{}/", base)).unwrap();

        let body = transport
            .request(Method::Post, "/api/echo", Some(json!({ "username": "admin" })))
            .await
            .unwrap();
        assert_eq!(body, json!({ "username": "admin" }));
    }

    #[tokio::test]
    async fn test_error_body_message_is_extracted() {
        let base = spawn_backend().await;
        let transport = HttpTransport::new(&base).unwrap();

        let err = transport
            .request(Method::Get, "/api/forbidden", None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            TransportError::Api {
                status: 403,
                message: Some("Permission denied".to_string())
            }
        );

        let err = transport
            .request(Method::Get, "/api/plain", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.server_message(), None);
        assert_eq!(err.message(), "Request failed with status 500");

        let err = transport
            .request(Method::Get, "/api/missing", None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_success_bodies() {
        let base = spawn_backend().await;
        let transport = HttpTransport::new(&base).unwrap();

        let body = transport.request(Method::Get, "/api/empty", None).await.unwrap();
        assert_eq!(body, Value::Null);

        let err = transport
            .request(Method::Get, "/api/not-json", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://{}", addr)).unwrap();
        let err = transport
            .request(Method::Get, "/api/medicines", None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpTransport::new("not a url").is_err());
        assert!(HttpTransport::new("ftp://example.com").is_err());
        assert!(HttpTransport::new("https://pharmacy.example.com").is_ok());
    }
}
