use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimum password length accepted by the login form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Identity record returned by the identity provider.
///
/// Only `id` is mandatory on the wire; the provider omits the rest for
/// some payloads (e.g. refresh responses in older deployments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "Array<string>"))]
    pub permissions: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to greet the user with, falling back to the email address
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

/// Successful login/refresh payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Email/password pair. Lives only for the duration of a login call.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Form-level validation, run before anything is sent to the provider.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !is_plausible_email(&self.email) {
            return Err("Please enter a valid email address");
        }
        validate_password(&self.password)
    }
}

/// Length rule shared by the login form and the new-password prompts.
/// Counts characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters");
    }
    Ok(())
}

/// Loose `local@domain.tld` check; the provider does the real validation.
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Partial user for `PATCH /auth/profile`; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.avatar.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenBody<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct EmailBody<'a> {
    pub email: &'a str,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_minimal_payload() {
        let user: User =
            serde_json::from_str(r#"{"id":"1","role":"user","permissions":[]}"#).unwrap();
        assert_eq!(user.id, "1");
        assert_eq!(user.role, "user");
        assert!(user.permissions.is_empty());
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_user_full_payload() {
        let json = r#"{
            "id": "42",
            "email": "baker@omadecravings.com",
            "name": "Head Baker",
            "role": "admin",
            "permissions": ["orders:read", "orders:write"],
            "createdAt": "2024-01-02T03:04:05Z",
            "updatedAt": "2024-02-03T04:05:06Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.display_name(), "Head Baker");
        assert!(user.permissions.contains("orders:write"));
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user: User = serde_json::from_str(r#"{"id":"1","email":"a@b.com"}"#).unwrap();
        assert_eq!(user.display_name(), "a@b.com");
    }

    #[test]
    fn test_auth_response_uses_camel_case() {
        let json = r#"{"user":{"id":"1"},"accessToken":"AT1","refreshToken":"RT1"}"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(auth.access_token, "AT1");
        assert_eq!(auth.refresh_token, "RT1");
    }

    #[test]
    fn test_credentials_validation() {
        assert!(LoginCredentials::new("a@b.com", "secret1").validate().is_ok());
        assert_eq!(
            LoginCredentials::new("not-an-email", "secret1").validate(),
            Err("Please enter a valid email address")
        );
        assert_eq!(
            LoginCredentials::new("a@b.com", "12345").validate(),
            Err("Password must be at least 6 characters")
        );
        assert!(LoginCredentials::new("a @b.com", "secret1").validate().is_err());
        assert!(LoginCredentials::new("a@b", "secret1").validate().is_err());
        assert!(LoginCredentials::new("@b.com", "secret1").validate().is_err());
    }

    #[test]
    fn test_password_length_counts_characters() {
        // Six characters, twelve bytes
        assert!(validate_password("ññññññ").is_ok());
        // Three characters, six bytes
        assert!(validate_password("ñññ").is_err());
        assert!(LoginCredentials::new("a@b.com", "ñññ").validate().is_err());
        assert!(LoginCredentials::new("a@b.com", "ñññññ!").validate().is_ok());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = LoginCredentials::new("a@b.com", "secret1");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret1"));
        assert!(debug.contains("a@b.com"));
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            name: Some("New Name".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"name":"New Name"}"#);
        assert!(!update.is_empty());
        assert!(ProfileUpdate::default().is_empty());
    }

    #[test]
    fn test_change_password_body() {
        let body = ChangePasswordRequest {
            current_password: "old".to_string(),
            new_password: "new".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"currentPassword": "old", "newPassword": "new"})
        );
    }
}
