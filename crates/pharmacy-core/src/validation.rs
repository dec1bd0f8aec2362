//! # Validation Module
//!
//! Input checks that run before any request leaves the client.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI forms                                                     │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Client store (Rust)                                          │
//! │  └── THIS MODULE: reject empty credentials / incomplete records        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend                                                      │
//! │  └── Authoritative checks (stock, uniqueness, permissions)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharmacy_core::validation::validate_credentials;
//!
//! let creds = validate_credentials("  admin  ", "pw").unwrap();
//! assert_eq!(creds.username, "admin");
//! assert!(validate_credentials("   ", "pw").is_err());
//! ```

use serde::Serialize;

use crate::error::ValidationError;
use crate::types::{NewMedicine, NewSale, NewUser};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Credentials
// =============================================================================

/// Login body, ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Trimmed username.
    pub username: String,
    /// Password exactly as typed.
    pub password: String,
}

/// Validates login input.
///
/// ## Rules
/// - Username is trimmed; empty after trimming is rejected
/// - Password is NOT trimmed (leading/trailing characters may be intentional);
///   only the empty string is rejected
pub fn validate_credentials(username: &str, password: &str) -> ValidationResult<Credentials> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::required("username"));
    }

    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

// =============================================================================
// Record Validators
// =============================================================================

fn require_text(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a backend identifier used in a path segment.
pub fn validate_record_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a medicine before create/update.
///
/// ## Rules
/// - name, description, manufacturer: non-empty after trimming
/// - price: finite and not negative
/// - stock: not negative
pub fn validate_new_medicine(medicine: &NewMedicine) -> ValidationResult<()> {
    require_text("name", &medicine.name)?;
    require_text("description", &medicine.description)?;
    require_text("manufacturer", &medicine.manufacturer)?;

    if !medicine.price.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if medicine.price < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    if medicine.stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a sale before it is recorded.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_record_id("medicine_id", sale.medicine_id)?;

    if sale.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a new staff account.
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    require_text("username", &user.username)?;
    if user.password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    require_text("role", &user.role)
}
