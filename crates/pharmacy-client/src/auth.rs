//! # Auth Module
//!
//! Owns the session: logs in against the backend, keeps the bearer credential
//! on the transport in step with the session, and mirrors every change into
//! persistent storage.
//!
//! ## Login Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Login Flow                                      │
//! │                                                                         │
//! │  login("  admin  ", "pw")                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_credentials ── empty ──► ClientError::Validation (no request) │
//! │       │ {username: "admin", password: "pw"}                             │
//! │       ▼                                                                 │
//! │  POST /api/login ─┬─ Api{status, msg} ─► ClientError::Api               │
//! │                   ├─ Network         ─► ClientError::Network            │
//! │                   └─ Decode          ─► ClientError::Protocol           │
//! │       │ {access_token, user}                                            │
//! │       ▼                                                                 │
//! │  Session::from_login_response ── malformed ──► ClientError::Protocol    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. replace in-memory session                                           │
//! │  2. persist (failure logged, session stays usable)                      │
//! │  3. transport.set_credential(token)                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 401 from the login endpoint is a wrong-credentials answer. It is reported
//! as `ClientError::Api` and never forces a logout.

use std::sync::Arc;

use parking_lot::RwLock;
use pharmacy_core::validation::validate_credentials;
use pharmacy_core::{AuthState, Session, UserRecord};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult, TransportError};
use crate::storage::SessionPersistence;
use crate::transport::{Method, Transport};

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/api/login";

/// Message used when the login endpoint fails without saying why.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed";

/// Session owner.
pub struct AuthModule {
    session: RwLock<Session>,
    persistence: SessionPersistence,
    transport: Arc<dyn Transport>,
}

impl AuthModule {
    /// Restores the persisted session and seeds the transport credential.
    ///
    /// An unreadable store is logged and treated as "no session".
    pub fn restore(transport: Arc<dyn Transport>, persistence: SessionPersistence) -> Self {
        let session = persistence.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load persisted session, starting anonymous");
            Session::anonymous()
        });

        transport.set_credential(session.token().map(str::to_string));
        if session.is_authenticated() {
            info!(user = ?session.user().and_then(UserRecord::display_name), "Session restored");
        }

        AuthModule {
            session: RwLock::new(session),
            persistence,
            transport,
        }
    }

    /// Exchanges credentials for a session.
    ///
    /// Logging in while authenticated replaces the current session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        let credentials = validate_credentials(username, password)?;
        let body = serde_json::to_value(&credentials)
            .map_err(|e| ClientError::Protocol(e.to_string()))?;

        debug!(username = %credentials.username, "Logging in");

        let response = self
            .transport
            .request(Method::Post, LOGIN_PATH, Some(body))
            .await
            .map_err(classify_login_failure)?;

        let session = Session::from_login_response(&response)?;
        let token = session.token().map(str::to_string);

        *self.session.write() = session.clone();

        if let Err(e) = self.persistence.save(&session) {
            warn!(error = %e, "Failed to persist session, continuing in memory");
        }

        self.transport.set_credential(token);

        info!(username = %credentials.username, "Logged in");
        Ok(())
    }

    /// Clears the session everywhere. Calling it while anonymous is a no-op.
    ///
    /// Returns whether a session was actually dropped.
    pub fn logout(&self) -> bool {
        let was_authenticated = {
            let mut session = self.session.write();
            let was = session.is_authenticated();
            *session = Session::anonymous();
            was
        };

        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        self.transport.set_credential(None);

        if was_authenticated {
            info!("Logged out");
        }
        was_authenticated
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.session.read().clone()
    }

    pub fn state(&self) -> AuthState {
        self.session.read().state()
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<UserRecord> {
        self.session.read().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_authenticated()
    }
}

fn classify_login_failure(err: TransportError) -> ClientError {
    match err {
        TransportError::Api { status, message } => ClientError::Api {
            status,
            message: message.unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_string()),
        },
        TransportError::Network(reason) => ClientError::Network { reason },
        TransportError::Decode(reason) => ClientError::Protocol(reason),
    }
}

impl std::fmt::Debug for AuthModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthModule")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, StorageResult};
    use crate::storage::{FileStorage, KeyValueStorage, MemoryStorage};
    use crate::testing::MockTransport;
    use pharmacy_core::{TOKEN_KEY, USER_KEY};
    use serde_json::{json, Value};

    struct BrokenStorage;

    impl KeyValueStorage for BrokenStorage {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Io("disk unplugged".into()))
        }

        fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk unplugged".into()))
        }

        fn remove(&self, _key: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk unplugged".into()))
        }
    }

    fn login_ok() -> Value {
        json!({ "access_token": "t1", "user": { "id": 1, "name": "Admin" } })
    }

    fn setup() -> (Arc<MockTransport>, Arc<MemoryStorage>, AuthModule) {
        let transport = Arc::new(MockTransport::new());
        let storage = Arc::new(MemoryStorage::new());
        let auth = AuthModule::restore(
            transport.clone(),
            SessionPersistence::new(storage.clone()),
        );
        (transport, storage, auth)
    }

    #[tokio::test]
    async fn test_login_trims_username_and_sets_credential() {
        let (transport, storage, auth) = setup();
        transport.push_ok(login_ok());

        auth.login("  admin  ", "pw").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "/api/login");
        assert_eq!(
            requests[0].body,
            Some(json!({ "username": "admin", "password": "pw" }))
        );
        assert_eq!(requests[0].credential, None);

        assert_eq!(auth.state(), AuthState::Authenticated);
        assert_eq!(auth.token().as_deref(), Some("t1"));
        assert_eq!(
            auth.user().map(|u| u.as_value().clone()),
            Some(json!({ "id": 1, "name": "Admin" }))
        );
        assert_eq!(transport.credential().as_deref(), Some("t1"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert!(storage.get(USER_KEY).unwrap().is_some());

        // every later request carries the bearer token
        transport.push_ok(json!([]));
        transport
            .request(Method::Get, "/api/medicines", None)
            .await
            .unwrap();
        assert_eq!(transport.requests()[1].credential.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_invalid_credentials_send_nothing() {
        let (transport, _storage, auth) = setup();

        for (username, password) in [("", "pw"), ("   ", "pw"), ("admin", "")] {
            let err = auth.login(username, password).await.unwrap_err();
            assert!(err.is_validation(), "{username:?}/{password:?}");
        }

        assert_eq!(transport.request_count(), 0);
        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_current_session() {
        let (transport, storage, auth) = setup();
        transport.push_ok(login_ok());
        auth.login("admin", "pw").await.unwrap();
        let before = auth.session();
        let stored_token = storage.get(TOKEN_KEY).unwrap();
        let stored_user = storage.get(USER_KEY).unwrap();

        let err = auth.login("   ", "pw").await.unwrap_err();
        assert!(err.is_validation());

        transport.push_status(401, Some("Invalid username or password"));
        let err = auth.login("other", "wrong").await.unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, .. }));

        assert_eq!(transport.request_count(), 2);
        assert_eq!(auth.session(), before);
        assert_eq!(auth.token().as_deref(), Some("t1"));
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), stored_token);
        assert_eq!(storage.get(USER_KEY).unwrap(), stored_user);
        assert_eq!(transport.credential().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_login_failure_classification() {
        let (transport, _storage, auth) = setup();

        transport.push_status(401, Some("Invalid username or password"));
        let err = auth.login("admin", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Api { status: 401, ref message } if message == "Invalid username or password"
        ));
        assert!(!err.is_session_expired());

        transport.push_status(500, None);
        let err = auth.login("admin", "pw").await.unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED_MESSAGE);

        transport.push_err(TransportError::Network("connection refused".into()));
        let err = auth.login("admin", "pw").await.unwrap_err();
        assert!(err.is_network());

        transport.push_err(TransportError::Decode("eof".into()));
        let err = auth.login("admin", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));

        assert_eq!(auth.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_malformed_login_response_is_protocol_error() {
        let (transport, _storage, auth) = setup();
        transport.push_ok(json!({ "access_token": "t1" }));

        let err = auth.login("admin", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
        assert!(!auth.is_authenticated());
        assert_eq!(transport.credential(), None);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let (transport, storage, auth) = setup();
        transport.push_ok(login_ok());
        auth.login("admin", "pw").await.unwrap();

        assert!(auth.logout());
        let after_once = auth.session();
        assert!(!auth.logout());

        assert_eq!(auth.session(), after_once);
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert_eq!(transport.credential(), None);
        assert_eq!(storage.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_restore_seeds_credential() {
        let storage = Arc::new(MemoryStorage::new());
        {
            let transport = Arc::new(MockTransport::new());
            transport.push_ok(login_ok());
            let auth =
                AuthModule::restore(transport, SessionPersistence::new(storage.clone()));
            auth.login("admin", "pw").await.unwrap();
        }

        let transport = Arc::new(MockTransport::new());
        let auth = AuthModule::restore(transport.clone(), SessionPersistence::new(storage));
        assert!(auth.is_authenticated());
        assert_eq!(transport.credential().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_login_over_corrupt_session_file_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{truncated").unwrap();

        let transport = Arc::new(MockTransport::new());
        let auth = AuthModule::restore(
            transport.clone(),
            SessionPersistence::new(Arc::new(FileStorage::new(&path))),
        );
        assert!(!auth.is_authenticated());

        transport.push_ok(login_ok());
        auth.login("admin", "pw").await.unwrap();

        // next launch picks the session up from disk
        let transport = Arc::new(MockTransport::new());
        let restored = AuthModule::restore(
            transport.clone(),
            SessionPersistence::new(Arc::new(FileStorage::new(&path))),
        );
        assert!(restored.is_authenticated());
        assert_eq!(restored.session(), auth.session());
        assert_eq!(transport.credential().as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_storage_failures_are_not_fatal() {
        let transport = Arc::new(MockTransport::new());
        let auth = AuthModule::restore(
            transport.clone(),
            SessionPersistence::new(Arc::new(BrokenStorage)),
        );
        assert!(!auth.is_authenticated());

        transport.push_ok(login_ok());
        auth.login("admin", "pw").await.unwrap();
        assert!(auth.is_authenticated());
        assert_eq!(transport.credential().as_deref(), Some("t1"));

        auth.logout();
        assert!(!auth.is_authenticated());
        assert_eq!(transport.credential(), None);
    }
}
