//! # pharmacy-core: Pure Domain Logic for the Pharmacy Client
//!
//! This crate holds the domain model shared by the client store and its
//! front-ends. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pharmacy Client Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 UI / Router (external)                          │   │
//! │  │      Login view ──► Medicines ──► Sales ──► Users               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ actions / events                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              pharmacy-client (session & cache store)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pharmacy-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  session  │  │ validation│  │   error   │  │   │
//! │  │   │ Medicine  │  │  Session  │  │Credentials│  │ CoreError │  │   │
//! │  │   │ Sale, ... │  │UserRecord │  │  records  │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Backend records (Medicine, Sale, UserAccount, ...)
//! - [`session`] - Session pair invariant and login response checks
//! - [`validation`] - Local input validation
//! - [`error`] - Domain error types

pub mod error;
pub mod session;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use session::{AuthState, Session, UserRecord};
pub use types::*;
pub use validation::Credentials;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Backend address used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Persisted key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";

/// Persisted key holding the JSON-encoded user record.
pub const USER_KEY: &str = "user";
