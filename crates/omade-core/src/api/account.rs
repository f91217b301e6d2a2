//! Account endpoints of the identity provider that require a session.

use tracing::warn;

use super::client::RequestSpec;
use super::{ApiClient, ApiError};
use crate::models::{ChangePasswordRequest, EmailBody, ProfileUpdate, ResetPasswordRequest, User};

const PROFILE_PATH: &str = "/auth/profile";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

impl ApiClient {
    /// `GET /auth/profile`; the session's cached user is updated to match
    pub async fn get_profile(&self) -> Result<User, ApiError> {
        let user: User = self.get(PROFILE_PATH).await?;
        self.sync_session_user(&user);
        Ok(user)
    }

    /// `PATCH /auth/profile` with only the fields being changed
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, ApiError> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("profile update has no fields".to_string()));
        }
        let user: User = self.patch(PROFILE_PATH, update).await?;
        self.sync_session_user(&user);
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_empty(RequestSpec::post(CHANGE_PASSWORD_PATH).json(&body)?)
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.send_empty(RequestSpec::post(FORGOT_PASSWORD_PATH).json(&EmailBody { email })?)
            .await
    }

    pub async fn reset_password(&self, token: &str, password: &str) -> Result<(), ApiError> {
        let body = ResetPasswordRequest {
            token: token.to_string(),
            password: password.to_string(),
        };
        self.send_empty(RequestSpec::post(RESET_PASSWORD_PATH).json(&body)?)
            .await
    }

    fn sync_session_user(&self, user: &User) {
        if let Err(e) = self.session().set_user(user.clone()) {
            warn!(error = %e, "Failed to store refreshed profile in session");
        }
    }
}
