//! # pharmacy-client: Session & Domain-Cache Store
//!
//! Client-side state for the pharmacy backend: who is logged in, and the most
//! recent lists of medicines, sales and staff accounts.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Client Store Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  PharmacyStore (store root)                      │  │
//! │  │                                                                  │  │
//! │  │  dispatch("medicines/fetch") ──► owning module                   │  │
//! │  │  401 outside login ──► logout + Navigate(View::Login)            │  │
//! │  └──────┬──────────────────────┬───────────────────────┬────────────┘  │
//! │         ▼                      ▼                       ▼               │
//! │  ┌──────────────┐   ┌─────────────────────┐   ┌──────────────────┐    │
//! │  │  AuthModule  │   │ Collection<R> × 3   │   │ StoreEventEmitter│    │
//! │  │              │   │                     │   │                  │    │
//! │  │ login/logout │   │ medicines, sales,   │   │ NoOp / Channel   │    │
//! │  │ restore      │   │ users + loading flag│   │ (UI, router)     │    │
//! │  └───┬──────┬───┘   └──────────┬──────────┘   └──────────────────┘    │
//! │      │      │                  │                                       │
//! │      ▼      └─────────┬────────┘                                       │
//! │  ┌──────────────┐     ▼                                                │
//! │  │ Session      │  ┌─────────────────────────┐                        │
//! │  │ Persistence  │  │ Transport (reqwest)     │                        │
//! │  │ token + user │  │ Authorization: Bearer   │                        │
//! │  └──────────────┘  └─────────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`store`] - `PharmacyStore`, namespaces and action routing
//! - [`auth`] - Session ownership and the login flow
//! - [`collection`] - Cached lists and failure normalization
//! - [`transport`] - HTTP boundary with bearer injection
//! - [`storage`] - Key/value persistence of the session
//! - [`events`] - Events reported to the UI and router
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Error types
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use pharmacy_client::{ClientConfig, NoOpEmitter, PharmacyStore};
//!
//! # async fn run() -> pharmacy_client::ClientResult<()> {
//! let config = ClientConfig::load(None)?;
//! let store = PharmacyStore::from_config(&config, Arc::new(NoOpEmitter))?;
//!
//! store.login("admin", "secret").await?;
//! let count = store.fetch_medicines().await?;
//! println!("{} medicines", count);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod collection;
pub mod config;
pub mod error;
pub mod events;
pub mod storage;
pub mod store;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::AuthModule;
pub use collection::{ActionFailure, Collection, CollectionKind, CollectionState};
pub use config::{ApiSettings, ClientConfig, StorageBackend, StorageSettings};
pub use error::{ClientError, ClientResult, StorageError, TransportError};
pub use events::{ChannelEmitter, NoOpEmitter, StoreEvent, StoreEventEmitter, View};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage, SessionPersistence};
pub use store::{Action, ActionName, ActionOutput, Namespace, PharmacyStore};
pub use transport::{HttpTransport, Method, Transport};
