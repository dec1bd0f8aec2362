//! # Session Model
//!
//! The authenticated identity held by the client.
//!
//! ## Pair Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session States                                       │
//! │                                                                         │
//! │   ┌────────────────┐      login ok       ┌──────────────────────────┐  │
//! │   │   Anonymous    │ ──────────────────► │      Authenticated       │  │
//! │   │ token = None   │                     │ token = Some, user = Some│  │
//! │   │ user  = None   │ ◄────────────────── │                          │  │
//! │   └────────────────┘  logout / 401       └──────────────────────────┘  │
//! │                                                                         │
//! │   A token without a user (or the reverse) is unrepresentable:          │
//! │   both live in one `Identity` behind an `Option`.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// User Record
// =============================================================================

/// Opaque user identity returned by the login endpoint.
///
/// Only guaranteed to exist (non-null) and be serializable. No field is
/// interpreted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct UserRecord(Value);

impl UserRecord {
    /// Wraps a JSON value, rejecting `null`.
    pub fn new(value: Value) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(UserRecord(value))
        }
    }

    /// Returns the raw JSON value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Best-effort display name, for UI greetings only.
    pub fn display_name(&self) -> Option<&str> {
        self.0
            .get("username")
            .or_else(|| self.0.get("name"))
            .and_then(Value::as_str)
    }
}

impl TryFrom<Value> for UserRecord {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        UserRecord::new(value).ok_or_else(|| "user record must not be null".to_string())
    }
}

impl From<UserRecord> for Value {
    fn from(record: UserRecord) -> Self {
        record.0
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
struct Identity {
    token: String,
    user: UserRecord,
}

/// Authentication state derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthState::Anonymous => write!(f, "anonymous"),
            AuthState::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Token + user, both present or both absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    identity: Option<Identity>,
}

impl Session {
    /// An empty session.
    pub fn anonymous() -> Self {
        Session { identity: None }
    }

    /// A populated session.
    pub fn authenticated(token: impl Into<String>, user: UserRecord) -> Self {
        Session {
            identity: Some(Identity {
                token: token.into(),
                user,
            }),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.token.as_str())
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.identity.as_ref().map(|i| &i.user)
    }

    pub fn state(&self) -> AuthState {
        if self.identity.is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Builds a session from a `POST /api/login` success body.
    ///
    /// ## Contract
    /// - `access_token` must be a non-empty string
    /// - `user` must be present and not `null`
    ///
    /// Anything else is a backend/client contract mismatch.
    pub fn from_login_response(body: &Value) -> CoreResult<Self> {
        let token = match body.get("access_token") {
            Some(Value::String(token)) if !token.is_empty() => token.clone(),
            _ => {
                return Err(CoreError::MalformedLoginResponse {
                    reason: "missing access_token".to_string(),
                })
            }
        };

        let user = body
            .get("user")
            .cloned()
            .and_then(UserRecord::new)
            .ok_or_else(|| CoreError::MalformedLoginResponse {
                reason: "missing user".to_string(),
            })?;

        Ok(Session::authenticated(token, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert_eq!(session.state(), AuthState::Anonymous);
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_login_response_ok() {
        let session = Session::from_login_response(&json!({
            "access_token": "t1",
            "user": { "id": 1, "name": "Admin" }
        }))
        .unwrap();

        assert_eq!(session.token(), Some("t1"));
        assert_eq!(
            session.user().map(UserRecord::as_value),
            Some(&json!({ "id": 1, "name": "Admin" }))
        );
        assert_eq!(session.state(), AuthState::Authenticated);
    }

    #[test]
    fn test_login_response_missing_parts() {
        let cases = [
            json!({ "user": { "id": 1 } }),
            json!({ "access_token": "", "user": { "id": 1 } }),
            json!({ "access_token": 42, "user": { "id": 1 } }),
            json!({ "access_token": "t1" }),
            json!({ "access_token": "t1", "user": null }),
            json!([]),
        ];

        for body in cases {
            let err = Session::from_login_response(&body).unwrap_err();
            assert!(
                matches!(err, CoreError::MalformedLoginResponse { .. }),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn test_empty_object_user_is_accepted() {
        let session =
            Session::from_login_response(&json!({ "access_token": "t", "user": {} })).unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_user_record_rejects_null_on_deserialize() {
        assert!(serde_json::from_str::<UserRecord>("null").is_err());
        let record: UserRecord = serde_json::from_str(r#"{"username":"amy"}"#).unwrap();
        assert_eq!(record.display_name(), Some("amy"));
    }
}
