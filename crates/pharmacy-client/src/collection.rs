//! # Domain Collections
//!
//! Cached snapshots of the backend's medicine, sale and user lists.
//!
//! ## Fetch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Collection Fetch                                     │
//! │                                                                         │
//! │  fetch() ── loading = true (LoadingGuard)                               │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  GET /api/<kind> ──┬── Ok(list)  ─► items = list, Ok(count)             │
//! │                    │                                                    │
//! │                    ├── Api 401   ─► ActionFailure { Request, Some(      │
//! │                    │                 SessionExpired) }                  │
//! │                    │                                                    │
//! │                    ├── not a list ─► ActionFailure { Protocol, None }   │
//! │                    │                                                    │
//! │                    └── other     ─► ActionFailure { Request, None }     │
//! │                                      (items untouched)                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  guard dropped ── loading = false   (every exit path)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overlapping Fetches
//! Nothing serializes two fetches of the same collection. Whichever response
//! resolves last overwrites `items`, and the first one to finish clears
//! `loading` even if the other is still in flight.
//!
//! The collection never touches the session. A 401 is reported upward as a
//! [`StoreEvent::SessionExpired`] and the store root performs the logout.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ClientError, TransportError};
use crate::events::StoreEvent;
use crate::store::Namespace;
use crate::transport::{Method, Transport};

// =============================================================================
// Collection Kind
// =============================================================================

/// The three cached lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Medicines,
    Sales,
    Users,
}

impl CollectionKind {
    /// Listing endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            CollectionKind::Medicines => "/api/medicines",
            CollectionKind::Sales => "/api/sales",
            CollectionKind::Users => "/api/users",
        }
    }

    /// Message reported when a fetch fails without a server message.
    pub fn failure_message(&self) -> &'static str {
        match self {
            CollectionKind::Medicines => "Failed to fetch medicines",
            CollectionKind::Sales => "Failed to fetch sales records",
            CollectionKind::Users => "Failed to fetch users",
        }
    }

    /// Short name used in logs and action names.
    pub fn name(&self) -> &'static str {
        match self {
            CollectionKind::Medicines => "medicines",
            CollectionKind::Sales => "sales",
            CollectionKind::Users => "users",
        }
    }

    /// Store namespace owning this collection.
    pub fn namespace(&self) -> Namespace {
        match self {
            CollectionKind::Medicines => Namespace::Medicines,
            CollectionKind::Sales => Namespace::Sales,
            CollectionKind::Users => Namespace::Users,
        }
    }

    fn operation(&self) -> String {
        format!("{}/fetch", self.name())
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Action Failure
// =============================================================================

/// A failed module action, plus the side effect it asks the root to perform.
#[derive(Debug)]
pub struct ActionFailure {
    pub error: ClientError,
    pub event: Option<StoreEvent>,
}

impl ActionFailure {
    /// True when the root must force a logout.
    pub fn is_session_expired(&self) -> bool {
        matches!(self.event, Some(StoreEvent::SessionExpired { .. }))
    }
}

/// Turns a transport failure into the module's user-facing error.
///
/// The server's message wins over `default_message`. Only a 401 carries the
/// session-expired event. A success body that is not JSON is a protocol error.
pub fn normalize_failure(
    err: TransportError,
    operation: &str,
    default_message: &str,
    namespace: Namespace,
) -> ActionFailure {
    let event = err
        .is_unauthorized()
        .then_some(StoreEvent::SessionExpired { namespace });

    let error = match err {
        TransportError::Decode(reason) => {
            warn!(%namespace, operation, reason = %reason, "Response body is not JSON");
            ClientError::Protocol(reason)
        }
        TransportError::Network(ref reason) => {
            debug!(%namespace, operation, reason = %reason, "No response from server");
            ClientError::Request {
                operation: operation.to_string(),
                status: None,
                message: default_message.to_string(),
            }
        }
        TransportError::Api { status, message } => ClientError::Request {
            operation: operation.to_string(),
            status: Some(status),
            message: message.unwrap_or_else(|| default_message.to_string()),
        },
    };

    ActionFailure { error, event }
}

/// A success body that does not have the expected shape.
pub fn shape_failure(operation: &str, err: serde_json::Error) -> ActionFailure {
    ActionFailure {
        error: ClientError::Protocol(format!("{}: {}", operation, err)),
        event: None,
    }
}

// =============================================================================
// Collection
// =============================================================================

/// Snapshot of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState<R> {
    /// Most recent successful fetch, in server order.
    pub items: Vec<R>,
    pub loading: bool,
}

impl<R> Default for CollectionState<R> {
    fn default() -> Self {
        CollectionState {
            items: Vec::new(),
            loading: false,
        }
    }
}

/// Clears `loading` when dropped, so a dropped future cannot leave it set.
struct LoadingGuard<'a, R> {
    state: &'a RwLock<CollectionState<R>>,
}

impl<'a, R> LoadingGuard<'a, R> {
    fn start(state: &'a RwLock<CollectionState<R>>) -> Self {
        state.write().loading = true;
        LoadingGuard { state }
    }
}

impl<R> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        self.state.write().loading = false;
    }
}

/// A cached list of `R`, refreshed by [`Collection::fetch`].
pub struct Collection<R> {
    kind: CollectionKind,
    state: RwLock<CollectionState<R>>,
}

impl<R> Collection<R>
where
    R: DeserializeOwned + Clone + Send + Sync,
{
    /// An empty, idle collection.
    pub fn new(kind: CollectionKind) -> Self {
        Collection {
            kind,
            state: RwLock::new(CollectionState::default()),
        }
    }

    /// Which list this is.
    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Replaces the cached items with the server's current list.
    ///
    /// Returns the number of items received. On failure the previous items
    /// are kept.
    pub async fn fetch(&self, transport: &dyn Transport) -> Result<usize, ActionFailure> {
        let _loading = LoadingGuard::start(&self.state);

        let body = transport
            .request(Method::Get, self.kind.endpoint(), None)
            .await
            .map_err(|e| {
                normalize_failure(
                    e,
                    &self.kind.operation(),
                    self.kind.failure_message(),
                    self.kind.namespace(),
                )
            })?;

        let items: Vec<R> = serde_json::from_value(body).map_err(|e| {
            warn!(collection = %self.kind, error = %e, "Unexpected list payload");
            shape_failure(&self.kind.operation(), e)
        })?;

        let count = items.len();
        self.state.write().items = items;

        debug!(collection = %self.kind, count, "Collection refreshed");
        Ok(count)
    }

    /// Snapshot of items and loading flag, taken under one read lock.
    pub fn state(&self) -> CollectionState<R> {
        self.state.read().clone()
    }

    /// Copy of the cached items.
    pub fn items(&self) -> Vec<R> {
        self.state.read().items.clone()
    }

    /// True while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    /// Number of cached items.
    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }
}
