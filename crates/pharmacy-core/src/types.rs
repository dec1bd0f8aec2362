//! # Domain Types
//!
//! Records exchanged with the pharmacy backend.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Read models (GET lists)          Write models (POST/PUT bodies)        │
//! │  ───────────────────────          ──────────────────────────────        │
//! │  Medicine                         NewMedicine                           │
//! │  Sale                             NewSale                               │
//! │  UserAccount                      NewUser                               │
//! │                                                                         │
//! │  Responses                                                              │
//! │  ─────────                                                              │
//! │  MutationReceipt  { message, id? }                                      │
//! │  HealthReport     { status, database?, error?, timestamp? }             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identifiers are the backend's integer keys. Timestamps are naive
//! ISO-8601 strings as emitted by the server and are optional everywhere.
//! Unknown fields are ignored so the backend can grow without breaking us.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Medicine
// =============================================================================

/// A medicine in the pharmacy catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Medicine {
    /// Backend identifier.
    pub id: i64,

    /// Display name.
    pub name: String,

    /// Specification / packaging (e.g. "0.25g*24 capsules").
    #[serde(default)]
    pub description: String,

    /// Unit price in the store currency.
    pub price: f64,

    /// Units on hand.
    pub stock: i64,

    /// Manufacturer name.
    #[serde(default)]
    pub manufacturer: String,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<NaiveDateTime>,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<NaiveDateTime>,
}

impl Medicine {
    /// Returns true when nothing is left on the shelf.
    pub fn is_out_of_stock(&self) -> bool {
        self.stock <= 0
    }
}

/// Body for creating or replacing a medicine.
///
/// The backend requires every field on both POST and PUT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMedicine {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub manufacturer: String,
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale, joined with the medicine name and salesperson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: i64,

    pub medicine_id: i64,

    /// Medicine name at the time the list was produced.
    #[serde(default)]
    pub medicine_name: String,

    pub quantity: i64,

    /// Total charged for the line.
    pub total_price: f64,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<NaiveDateTime>,

    /// Username of the salesperson, if the account still exists.
    #[serde(default)]
    pub salesperson: Option<String>,
}

/// Body for recording a sale. The server prices it and decrements stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub medicine_id: i64,
    pub quantity: i64,
}

// =============================================================================
// User Account
// =============================================================================

/// A staff account as listed by the user administration endpoint.
///
/// Distinct from [`crate::UserRecord`], which is the opaque identity the
/// login endpoint hands back for the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserAccount {
    pub id: i64,

    pub username: String,

    /// Role name (`admin`, `staff`, ...). Not interpreted client-side.
    #[serde(default)]
    pub role: String,

    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub created_at: Option<NaiveDateTime>,
}

/// Body for creating a staff account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: String,
}

// =============================================================================
// Responses
// =============================================================================

/// Acknowledgement returned by create/update/delete endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MutationReceipt {
    /// Server message ("created", "deleted", ...).
    #[serde(default)]
    pub message: String,

    /// Identifier of the created row, when the endpoint creates one.
    #[serde(default)]
    pub id: Option<i64>,
}

/// Backend liveness report from `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`.
    pub status: String,

    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
