use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::{AuthResponse, User};

/// Version stamped into the persisted envelope
pub const ENVELOPE_VERSION: u32 = 0;

/// User plus token pair. Only exists while authenticated.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user.id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl AuthSession {
    /// Build from a provider payload, rejecting empty tokens
    pub fn from_response(response: AuthResponse) -> Option<Self> {
        if response.access_token.is_empty() || response.refresh_token.is_empty() {
            return None;
        }
        Some(Self {
            user: response.user,
            access_token: response.access_token,
            refresh_token: response.refresh_token,
        })
    }
}

/// The two valid session states. "Refreshing" is an in-flight condition of
/// the store, never a stored state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(AuthSession),
}

impl SessionState {
    /// Derived from the variant; cannot drift from token/user presence
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(session) => Some(&session.user),
            SessionState::Anonymous => None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated(session) => Some(&session.access_token),
            SessionState::Anonymous => None,
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        match self {
            SessionState::Authenticated(session) => Some(&session.refresh_token),
            SessionState::Anonymous => None,
        }
    }

    pub fn to_envelope(&self) -> SessionEnvelope {
        let state = match self {
            SessionState::Authenticated(session) => PersistedState {
                user: Some(session.user.clone()),
                access_token: Some(session.access_token.clone()),
                refresh_token: Some(session.refresh_token.clone()),
                is_authenticated: true,
            },
            SessionState::Anonymous => PersistedState::default(),
        };
        SessionEnvelope {
            state,
            version: ENVELOPE_VERSION,
        }
    }

    /// Partial envelopes (missing user or either token) collapse to `Anonymous`.
    /// The stored `isAuthenticated` flag is ignored.
    pub fn from_envelope(envelope: SessionEnvelope) -> Self {
        let PersistedState {
            user,
            access_token,
            refresh_token,
            ..
        } = envelope.state;
        match (user, non_empty(access_token), non_empty(refresh_token)) {
            (Some(user), Some(access_token), Some(refresh_token)) => {
                SessionState::Authenticated(AuthSession {
                    user,
                    access_token,
                    refresh_token,
                })
            }
            _ => SessionState::Anonymous,
        }
    }
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

/// Persisted subset of the session. Transient flags never land here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

/// `{"state": {...}, "version": 0}` as written under the storage key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEnvelope {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

impl SessionEnvelope {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse session envelope")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize session envelope")
    }

    /// Access token as stored, without requiring the rest of the envelope to be valid
    pub fn access_token(&self) -> Option<&str> {
        self.state.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        serde_json::from_str(r#"{"id":"1","role":"user","permissions":[]}"#).unwrap()
    }

    fn authenticated() -> SessionState {
        SessionState::Authenticated(AuthSession {
            user: user(),
            access_token: "AT1".to_string(),
            refresh_token: "RT1".to_string(),
        })
    }

    #[test]
    fn test_anonymous_accessors() {
        let state = SessionState::default();
        assert!(!state.is_authenticated());
        assert!(state.user().is_none());
        assert!(state.access_token().is_none());
        assert!(state.refresh_token().is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let json = authenticated().to_envelope().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 0);
        assert_eq!(value["state"]["accessToken"], "AT1");
        assert_eq!(value["state"]["refreshToken"], "RT1");
        assert_eq!(value["state"]["isAuthenticated"], true);
        assert_eq!(value["state"]["user"]["id"], "1");
        assert!(value["state"].get("isLoading").is_none());
    }

    #[test]
    fn test_anonymous_envelope_has_nulls() {
        let json = SessionState::Anonymous.to_envelope().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["state"]["accessToken"].is_null());
        assert_eq!(value["state"]["isAuthenticated"], false);
    }

    #[test]
    fn test_envelope_restores_state() {
        let envelope = authenticated().to_envelope();
        assert_eq!(SessionState::from_envelope(envelope), authenticated());
    }

    #[test]
    fn test_partial_envelope_is_anonymous() {
        // isAuthenticated=true with no refresh token is not a valid session
        let raw = r#"{"state":{"user":{"id":"1"},"accessToken":"AT1","refreshToken":null,"isAuthenticated":true},"version":0}"#;
        let envelope = SessionEnvelope::parse(raw).unwrap();
        assert_eq!(envelope.access_token(), Some("AT1"));
        assert_eq!(SessionState::from_envelope(envelope), SessionState::Anonymous);

        let raw = r#"{"state":{"accessToken":"AT1","refreshToken":"RT1"}}"#;
        let envelope = SessionEnvelope::parse(raw).unwrap();
        assert_eq!(SessionState::from_envelope(envelope), SessionState::Anonymous);
    }

    #[test]
    fn test_empty_tokens_are_absent() {
        let raw = r#"{"state":{"user":{"id":"1"},"accessToken":"","refreshToken":"RT1"},"version":0}"#;
        let envelope = SessionEnvelope::parse(raw).unwrap();
        assert_eq!(envelope.access_token(), None);
        assert_eq!(SessionState::from_envelope(envelope), SessionState::Anonymous);
    }

    #[test]
    fn test_from_response_rejects_empty_tokens() {
        let response = AuthResponse {
            user: user(),
            access_token: String::new(),
            refresh_token: "RT1".to_string(),
        };
        assert!(AuthSession::from_response(response).is_none());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let debug = format!("{:?}", authenticated());
        assert!(!debug.contains("AT1"));
        assert!(!debug.contains("RT1"));
    }
}
