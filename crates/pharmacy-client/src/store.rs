//! # Store Root
//!
//! `PharmacyStore` composes the auth module and the three collections under
//! disjoint namespaces, routes named actions to them, and performs the one
//! cross-module effect: forced logout when the server rejects the session.
//!
//! ## Namespaces & Actions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PharmacyStore                                    │
//! │                                                                         │
//! │  auth/       login, logout               ──► AuthModule                │
//! │  medicines/  fetch, add, update, delete  ──► Collection<Medicine>      │
//! │  sales/      fetch, record, delete       ──► Collection<Sale>          │
//! │  users/      fetch, add, delete          ──► Collection<UserAccount>   │
//! │                                                                         │
//! │  Any non-login action ── 401 ──► ActionFailure { event: SessionExpired }│
//! │                                        │                                │
//! │                                        ▼                                │
//! │                              emit(SessionExpired)                       │
//! │                              auth.logout()  ─► emit(LoggedOut)          │
//! │                              emit(Navigate(View::Login))   (once)       │
//! │                              return the module's error                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mutations never touch the cached lists; callers refetch afterwards.

use std::str::FromStr;
use std::sync::Arc;

use pharmacy_core::validation::{
    validate_new_medicine, validate_new_sale, validate_new_user, validate_record_id,
};
use pharmacy_core::{
    HealthReport, Medicine, MutationReceipt, NewMedicine, NewSale, NewUser, Sale, UserAccount,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::AuthModule;
use crate::collection::{
    normalize_failure, shape_failure, ActionFailure, Collection, CollectionKind,
};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, TransportError};
use crate::events::{StoreEvent, StoreEventEmitter, View};
use crate::storage::SessionPersistence;
use crate::transport::{HttpTransport, Method, Transport};

/// Liveness endpoint path.
pub const HEALTH_PATH: &str = "/health";

// =============================================================================
// Namespaces
// =============================================================================

/// The store modules. Every action belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Auth,
    Medicines,
    Sales,
    Users,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Auth => "auth",
            Namespace::Medicines => "medicines",
            Namespace::Sales => "sales",
            Namespace::Users => "users",
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Action Names
// =============================================================================

/// Every action the store understands, without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionName {
    Login,
    Logout,
    FetchMedicines,
    AddMedicine,
    UpdateMedicine,
    DeleteMedicine,
    FetchSales,
    RecordSale,
    DeleteSale,
    FetchUsers,
    AddUser,
    DeleteUser,
}

impl ActionName {
    pub const ALL: [ActionName; 12] = [
        ActionName::Login,
        ActionName::Logout,
        ActionName::FetchMedicines,
        ActionName::AddMedicine,
        ActionName::UpdateMedicine,
        ActionName::DeleteMedicine,
        ActionName::FetchSales,
        ActionName::RecordSale,
        ActionName::DeleteSale,
        ActionName::FetchUsers,
        ActionName::AddUser,
        ActionName::DeleteUser,
    ];

    /// Qualified name, `<namespace>/<action>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionName::Login => "auth/login",
            ActionName::Logout => "auth/logout",
            ActionName::FetchMedicines => "medicines/fetch",
            ActionName::AddMedicine => "medicines/add",
            ActionName::UpdateMedicine => "medicines/update",
            ActionName::DeleteMedicine => "medicines/delete",
            ActionName::FetchSales => "sales/fetch",
            ActionName::RecordSale => "sales/record",
            ActionName::DeleteSale => "sales/delete",
            ActionName::FetchUsers => "users/fetch",
            ActionName::AddUser => "users/add",
            ActionName::DeleteUser => "users/delete",
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            ActionName::Login | ActionName::Logout => Namespace::Auth,
            ActionName::FetchMedicines
            | ActionName::AddMedicine
            | ActionName::UpdateMedicine
            | ActionName::DeleteMedicine => Namespace::Medicines,
            ActionName::FetchSales | ActionName::RecordSale | ActionName::DeleteSale => {
                Namespace::Sales
            }
            ActionName::FetchUsers | ActionName::AddUser | ActionName::DeleteUser => {
                Namespace::Users
            }
        }
    }

    /// The action itself, for names that take no arguments.
    pub fn parameterless(&self) -> Option<Action> {
        match self {
            ActionName::Logout => Some(Action::Logout),
            ActionName::FetchMedicines => Some(Action::FetchMedicines),
            ActionName::FetchSales => Some(Action::FetchSales),
            ActionName::FetchUsers => Some(Action::FetchUsers),
            _ => None,
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            ActionName::Login => crate::auth::LOGIN_FAILED_MESSAGE,
            ActionName::Logout => "Logout failed",
            ActionName::FetchMedicines => CollectionKind::Medicines.failure_message(),
            ActionName::AddMedicine => "Failed to add medicine",
            ActionName::UpdateMedicine => "Failed to update medicine",
            ActionName::DeleteMedicine => "Failed to delete medicine",
            ActionName::FetchSales => CollectionKind::Sales.failure_message(),
            ActionName::RecordSale => "Failed to record sale",
            ActionName::DeleteSale => "Failed to delete sales record",
            ActionName::FetchUsers => CollectionKind::Users.failure_message(),
            ActionName::AddUser => "Failed to add user",
            ActionName::DeleteUser => "Failed to delete user",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionName {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| ClientError::UnknownAction(s.to_string()))
    }
}

// =============================================================================
// Actions
// =============================================================================

/// A store action with its arguments.
#[derive(Clone)]
pub enum Action {
    Login { username: String, password: String },
    Logout,
    FetchMedicines,
    AddMedicine(NewMedicine),
    UpdateMedicine { id: i64, medicine: NewMedicine },
    DeleteMedicine { id: i64 },
    FetchSales,
    RecordSale(NewSale),
    DeleteSale { id: i64 },
    FetchUsers,
    AddUser(NewUser),
    DeleteUser { id: i64 },
}

impl Action {
    pub fn kind(&self) -> ActionName {
        match self {
            Action::Login { .. } => ActionName::Login,
            Action::Logout => ActionName::Logout,
            Action::FetchMedicines => ActionName::FetchMedicines,
            Action::AddMedicine(_) => ActionName::AddMedicine,
            Action::UpdateMedicine { .. } => ActionName::UpdateMedicine,
            Action::DeleteMedicine { .. } => ActionName::DeleteMedicine,
            Action::FetchSales => ActionName::FetchSales,
            Action::RecordSale(_) => ActionName::RecordSale,
            Action::DeleteSale { .. } => ActionName::DeleteSale,
            Action::FetchUsers => ActionName::FetchUsers,
            Action::AddUser(_) => ActionName::AddUser,
            Action::DeleteUser { .. } => ActionName::DeleteUser,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn namespace(&self) -> Namespace {
        self.kind().namespace()
    }
}

// credentials must never reach the logs
impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.name())
    }
}

/// What a dispatched action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    /// Login or logout completed.
    Done,
    /// A collection was refreshed with this many items.
    Fetched(usize),
    /// A mutation was acknowledged.
    Receipt(MutationReceipt),
}

// =============================================================================
// Store
// =============================================================================

/// Root of the client store.
pub struct PharmacyStore {
    transport: Arc<dyn Transport>,
    auth: AuthModule,
    medicines: Collection<Medicine>,
    sales: Collection<Sale>,
    users: Collection<UserAccount>,
    emitter: Arc<dyn StoreEventEmitter>,
}

impl PharmacyStore {
    /// Builds the store, restoring any persisted session.
    pub fn new(
        transport: Arc<dyn Transport>,
        persistence: SessionPersistence,
        emitter: Arc<dyn StoreEventEmitter>,
    ) -> Self {
        let auth = AuthModule::restore(transport.clone(), persistence);

        PharmacyStore {
            transport,
            auth,
            medicines: Collection::new(CollectionKind::Medicines),
            sales: Collection::new(CollectionKind::Sales),
            users: Collection::new(CollectionKind::Users),
            emitter,
        }
    }

    /// Builds an HTTP-backed store from configuration.
    pub fn from_config(
        config: &ClientConfig,
        emitter: Arc<dyn StoreEventEmitter>,
    ) -> ClientResult<Self> {
        let transport = Arc::new(HttpTransport::from_settings(&config.api)?);
        let persistence = SessionPersistence::new(config.storage.open()?);
        Ok(Self::new(transport, persistence, emitter))
    }

    pub fn auth(&self) -> &AuthModule {
        &self.auth
    }

    pub fn medicines(&self) -> &Collection<Medicine> {
        &self.medicines
    }

    pub fn sales(&self) -> &Collection<Sale> {
        &self.sales
    }

    pub fn users(&self) -> &Collection<UserAccount> {
        &self.users
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    /// Routes an action to the module that owns its namespace.
    pub async fn dispatch(&self, action: Action) -> ClientResult<ActionOutput> {
        debug!(action = action.name(), "Dispatching");

        match action {
            Action::Login { username, password } => {
                self.login(&username, &password).await?;
                Ok(ActionOutput::Done)
            }
            Action::Logout => {
                self.logout();
                Ok(ActionOutput::Done)
            }
            Action::FetchMedicines => self.fetch_medicines().await.map(ActionOutput::Fetched),
            Action::FetchSales => self.fetch_sales().await.map(ActionOutput::Fetched),
            Action::FetchUsers => self.fetch_users().await.map(ActionOutput::Fetched),
            Action::AddMedicine(medicine) => {
                self.add_medicine(&medicine).await.map(ActionOutput::Receipt)
            }
            Action::UpdateMedicine { id, medicine } => self
                .update_medicine(id, &medicine)
                .await
                .map(ActionOutput::Receipt),
            Action::DeleteMedicine { id } => {
                self.delete_medicine(id).await.map(ActionOutput::Receipt)
            }
            Action::RecordSale(sale) => self.record_sale(&sale).await.map(ActionOutput::Receipt),
            Action::DeleteSale { id } => self.delete_sale(id).await.map(ActionOutput::Receipt),
            Action::AddUser(user) => self.add_user(&user).await.map(ActionOutput::Receipt),
            Action::DeleteUser { id } => self.delete_user(id).await.map(ActionOutput::Receipt),
        }
    }

    // -------------------------------------------------------------------------
    // auth/*
    // -------------------------------------------------------------------------

    /// `auth/login`. A 401 here is a credential failure, not an expiry.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<()> {
        self.auth.login(username, password).await?;
        self.emitter.emit(&StoreEvent::LoggedIn);
        Ok(())
    }

    /// `auth/logout`. Idempotent.
    pub fn logout(&self) {
        if self.auth.logout() {
            self.emitter.emit(&StoreEvent::LoggedOut);
        }
    }

    // -------------------------------------------------------------------------
    // <collection>/fetch
    // -------------------------------------------------------------------------

    pub async fn fetch_medicines(&self) -> ClientResult<usize> {
        let result = self.medicines.fetch(self.transport.as_ref()).await;
        self.settle(result)
    }

    pub async fn fetch_sales(&self) -> ClientResult<usize> {
        let result = self.sales.fetch(self.transport.as_ref()).await;
        self.settle(result)
    }

    pub async fn fetch_users(&self) -> ClientResult<usize> {
        let result = self.users.fetch(self.transport.as_ref()).await;
        self.settle(result)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    pub async fn add_medicine(&self, medicine: &NewMedicine) -> ClientResult<MutationReceipt> {
        validate_new_medicine(medicine)?;
        let body = to_body(medicine)?;
        self.mutate(ActionName::AddMedicine, Method::Post, "/api/medicines", Some(body))
            .await
    }

    pub async fn update_medicine(
        &self,
        id: i64,
        medicine: &NewMedicine,
    ) -> ClientResult<MutationReceipt> {
        validate_record_id("id", id)?;
        validate_new_medicine(medicine)?;
        let body = to_body(medicine)?;
        let path = format!("/api/medicines/{}", id);
        self.mutate(ActionName::UpdateMedicine, Method::Put, &path, Some(body))
            .await
    }

    pub async fn delete_medicine(&self, id: i64) -> ClientResult<MutationReceipt> {
        validate_record_id("id", id)?;
        let path = format!("/api/medicines/{}", id);
        self.mutate(ActionName::DeleteMedicine, Method::Delete, &path, None)
            .await
    }

    /// `sales/record`. The server prices the sale and decrements stock.
    pub async fn record_sale(&self, sale: &NewSale) -> ClientResult<MutationReceipt> {
        validate_new_sale(sale)?;
        let body = to_body(sale)?;
        self.mutate(ActionName::RecordSale, Method::Post, "/api/sales", Some(body))
            .await
    }

    pub async fn delete_sale(&self, id: i64) -> ClientResult<MutationReceipt> {
        validate_record_id("id", id)?;
        let path = format!("/api/sales/{}", id);
        self.mutate(ActionName::DeleteSale, Method::Delete, &path, None)
            .await
    }

    pub async fn add_user(&self, user: &NewUser) -> ClientResult<MutationReceipt> {
        validate_new_user(user)?;
        let body = to_body(user)?;
        self.mutate(ActionName::AddUser, Method::Post, "/api/users", Some(body))
            .await
    }

    pub async fn delete_user(&self, id: i64) -> ClientResult<MutationReceipt> {
        validate_record_id("id", id)?;
        let path = format!("/api/users/{}", id);
        self.mutate(ActionName::DeleteUser, Method::Delete, &path, None)
            .await
    }

    // -------------------------------------------------------------------------
    // Health
    // -------------------------------------------------------------------------

    /// Asks the backend whether it and its database are up.
    ///
    /// An error status still counts as an answer and comes back as an
    /// unhealthy report. Only an unreachable server is an error.
    pub async fn health(&self) -> ClientResult<HealthReport> {
        match self.transport.request(Method::Get, HEALTH_PATH, None).await {
            Ok(body) => {
                serde_json::from_value(body).map_err(|e| ClientError::Protocol(e.to_string()))
            }
            Err(err @ TransportError::Api { .. }) => Ok(HealthReport {
                status: "unhealthy".to_string(),
                database: None,
                error: Some(err.message()),
                timestamp: None,
            }),
            Err(TransportError::Network(reason)) => Err(ClientError::Network { reason }),
            Err(TransportError::Decode(reason)) => Err(ClientError::Protocol(reason)),
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn mutate(
        &self,
        action: ActionName,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<MutationReceipt> {
        let result = match self.transport.request(method, path, body).await {
            Ok(Value::Null) => Ok(MutationReceipt::default()),
            Ok(body) => serde_json::from_value(body).map_err(|e| {
                warn!(action = %action, error = %e, "Unexpected mutation response");
                shape_failure(action.as_str(), e)
            }),
            Err(err) => Err(normalize_failure(
                err,
                action.as_str(),
                action.failure_message(),
                action.namespace(),
            )),
        };

        self.settle(result)
    }

    /// Performs any side effect a module asked for, then surfaces its error.
    fn settle<T>(&self, result: Result<T, ActionFailure>) -> ClientResult<T> {
        result.map_err(|failure| {
            if let Some(event) = &failure.event {
                self.handle_event(event);
            }
            failure.error
        })
    }

    fn handle_event(&self, event: &StoreEvent) {
        self.emitter.emit(event);

        if let StoreEvent::SessionExpired { namespace } = event {
            warn!(%namespace, "Server rejected the session, logging out");
            self.logout();
            self.emitter.emit(&StoreEvent::Navigate(View::Login));
        }
    }
}

fn to_body<T: Serialize>(value: &T) -> ClientResult<Value> {
    serde_json::to_value(value).map_err(|e| ClientError::Protocol(e.to_string()))
}
