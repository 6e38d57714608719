//! # Authentication Types
//!
//! Credentials, the identity that comes back from a successful login and the
//! view state machine the login screen renders.
//!
//! ## View State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        AuthViewState                                    │
//! │                                                                         │
//! │   ┌───────────────┐  login()   ┌─────────┐  data   ┌──────────────┐    │
//! │   │ Uninitialized │ ─────────► │ Loading │ ──────► │ AuthSuccess  │    │
//! │   └───────────────┘            └────┬────┘         └──────┬───────┘    │
//! │           ▲                         │ no data             │            │
//! │           │                         ▼                     │            │
//! │           │   reset()          ┌─────────┐   reset()      │            │
//! │           └─────────────────── │  Error  │ ◄──────────────┘            │
//! │           ▲                    └─────────┘                             │
//! │           └────────────────────────────────── reset() ─────────────────│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::{DataState, Payload};

/// Fallback message when a settled emission carries no data and no message.
const UNKNOWN_AUTH_ERROR: &str = "Unknown authentication error";

// =============================================================================
// Identity Newtypes
// =============================================================================

/// The account name a user logs in with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

/// The e-mail address reported for an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

/// Bearer token from the `Authorization` response header.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }
    };
}

string_newtype!(Username);
string_newtype!(Email);
string_newtype!(Token);

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

// =============================================================================
// Credential
// =============================================================================

/// A login attempt. Never persisted.
///
/// Serializes to the JSON body the auth endpoint expects.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credential {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

// =============================================================================
// Results
// =============================================================================

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub username: Username,
    pub email: Email,
    pub token: Token,
}

/// Data carried by a successful auth emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSummary {
    pub user_info: UserInfo,
}

/// Outcome of a single login call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AuthResult {
    Success { user: UserInfo },
    Error { message: String },
}

impl AuthResult {
    /// Converts into the settled emission of an auth sequence.
    pub fn into_state(self) -> DataState<AuthSummary> {
        match self {
            AuthResult::Success { user } => DataState::data(AuthSummary { user_info: user }),
            AuthResult::Error { message } => DataState::error(message),
        }
    }
}

// =============================================================================
// View State
// =============================================================================

/// What the login screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AuthViewState {
    #[default]
    Uninitialized,
    Loading,
    AuthSuccess(UserInfo),
    Error(String),
}

impl AuthViewState {
    /// State entered synchronously when a login is submitted.
    pub fn login() -> Self {
        AuthViewState::Loading
    }

    /// Back to the initial state; valid from anywhere.
    pub fn reset() -> Self {
        AuthViewState::Uninitialized
    }

    /// Maps one emission of the auth sequence to the state it produces.
    pub fn reduce(emission: &DataState<AuthSummary>) -> Self {
        if emission.loading {
            return AuthViewState::Loading;
        }
        match &emission.payload {
            Payload::Data(summary) => AuthViewState::AuthSuccess(summary.user_info.clone()),
            Payload::Error(message) => AuthViewState::Error(message.clone()),
            Payload::Idle | Payload::Empty => AuthViewState::Error(UNKNOWN_AUTH_ERROR.to_string()),
        }
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthViewState::Loading)
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        match self {
            AuthViewState::AuthSuccess(info) => Some(info),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserInfo {
        UserInfo {
            username: Username::new("kermit"),
            email: Email::new("kermit@example.com"),
            token: Token::new("Bearer abc123"),
        }
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let credential = Credential::new("kermit", "hunter2");
        let printed = format!("{:?}", credential);
        assert!(printed.contains("kermit"));
        assert!(!printed.contains("hunter2"));

        let printed = format!("{:?}", user());
        assert!(!printed.contains("abc123"));
    }

    #[test]
    fn test_credential_json_body() {
        let json = serde_json::to_value(Credential::new("kermit", "hunter2")).unwrap();
        assert_eq!(json, serde_json::json!({"username": "kermit", "password": "hunter2"}));
    }

    #[test]
    fn test_reduce_maps_each_emission() {
        assert_eq!(AuthViewState::reduce(&DataState::loading()), AuthViewState::Loading);

        let success = AuthResult::Success { user: user() }.into_state();
        assert_eq!(AuthViewState::reduce(&success), AuthViewState::AuthSuccess(user()));

        let failure = AuthResult::Error {
            message: "Invalid credentials".to_string(),
        }
        .into_state();
        assert_eq!(
            AuthViewState::reduce(&failure),
            AuthViewState::Error("Invalid credentials".to_string())
        );
    }

    #[test]
    fn test_reduce_without_data_is_error() {
        let state = AuthViewState::reduce(&DataState::empty());
        assert!(matches!(state, AuthViewState::Error(_)));
    }

    #[test]
    fn test_login_and_reset() {
        assert!(AuthViewState::login().is_loading());
        assert_eq!(AuthViewState::reset(), AuthViewState::default());
        assert_eq!(AuthViewState::AuthSuccess(user()).user_info(), Some(&user()));
    }
}
