//! # Client Error Types
//!
//! Error types for the session and domain-cache store.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  TransportError │  │   ClientError   │  │     StorageError        │ │
//! │  │  (raw outcome)  │  │  (user-facing)  │  │  (session persistence)  │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │─►│  Network        │  │  Io                     │ │
//! │  │  Api{status,..} │─►│  Api / Request  │  │  Serialization          │ │
//! │  │  Decode         │─►│  Protocol       │  │                         │ │
//! │  └─────────────────┘  │  Validation     │  └─────────────────────────┘ │
//! │                       │  Storage/Config │                              │
//! │                       └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `TransportError` is what the HTTP layer reports. The auth module and the
//! collections classify it into a `ClientError` with a message fit for display.

use pharmacy_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for store operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Fixed message shown when the backend cannot be reached.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Cannot reach the server, please check your network connection";

// =============================================================================
// Transport Errors
// =============================================================================

/// Outcome of a failed request, before any classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response reached us (connect failure, timeout, I/O).
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Request failed with status {status}")]
    Api {
        status: u16,
        /// `message` field of the error body, when there is one.
        message: Option<String>,
    },

    /// Success status, but the body is not valid JSON.
    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Status code of an `Api` failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-provided message, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Server-provided message, or a generic fallback.
    pub fn message(&self) -> String {
        self.server_message()
            .map(str::to_string)
            .unwrap_or_else(|| self.to_string())
    }

    /// True for a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Session persistence failures.
///
/// The auth module treats these as non-fatal: the in-memory session stays usable.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed: {0}")]
    Io(String),

    /// The backing file is not a valid key/value document.
    #[error("Storage file is corrupt: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

// =============================================================================
// Client Error
// =============================================================================

/// User-facing error raised by store actions.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed caller input; no request was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The server could not be reached.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network { reason: String },

    /// The login endpoint answered with an error.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// A collection fetch or mutation failed.
    ///
    /// `message` is the server's message when it sent one, otherwise the
    /// operation's default. `status` is `None` when no error response was
    /// received (network or decode failure).
    #[error("{message}")]
    Request {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// A success response violated the expected shape.
    #[error("Malformed server response: {0}")]
    Protocol(String),

    /// Session persistence failed.
    #[error("{0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An action name that no module owns.
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl From<CoreError> for ClientError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => ClientError::Validation(e),
            CoreError::MalformedLoginResponse { reason } => ClientError::Protocol(reason),
        }
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

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::Config(format!("invalid base URL: {}", err))
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// HTTP status behind this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// True when a collection action hit a 401 and the session was dropped.
    ///
    /// A 401 from the login endpoint is a plain credential failure and does
    /// not count.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ClientError::Request { status: Some(401), .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }
}
