use thiserror::Error;

use crate::api::ApiError;

/// Failures surfaced by `SessionStore` operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Provider rejected the email/password pair. Shown inline on the form.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Credentials failed local validation; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The refresh call failed. The session has already been cleared.
    #[error("Session refresh failed: {0}")]
    RefreshFailed(#[source] ApiError),

    /// Timeouts, 5xx, connectivity and other provider failures
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl SessionError {
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            SessionError::InvalidCredentials(_) | SessionError::Validation(_)
        )
    }
}
