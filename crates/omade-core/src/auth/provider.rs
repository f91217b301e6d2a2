//! Identity provider endpoints that establish or tear down a session.
//!
//! These calls go out without a bearer token and outside the gateway's
//! refresh interception, so a failing refresh can never trigger another
//! refresh.

use reqwest::{header, Client};
use tracing::debug;

use crate::api::{check_response, join_url, ApiError};
use crate::models::{AuthResponse, LoginCredentials, RefreshTokenBody};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const REFRESH_PATH: &str = "/auth/refresh";

/// Clone is cheap - shares the gateway's connection pool.
#[derive(Clone)]
pub struct IdentityProvider {
    client: Client,
    base_url: String,
}

impl IdentityProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/login`
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, ApiError> {
        debug!(email = %credentials.email, "Sending login request");
        self.post_json(LOGIN_PATH, credentials).await
    }

    /// `POST /auth/logout`; the response body is ignored
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        let url = join_url(&self.base_url, LOGOUT_PATH);
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&RefreshTokenBody { refresh_token })
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// `POST /auth/refresh`
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthResponse, ApiError> {
        debug!("Sending token refresh request");
        self.post_json(REFRESH_PATH, &RefreshTokenBody { refresh_token })
            .await
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, ApiError> {
        let url = join_url(&self.base_url, path);
        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;
        let response = check_response(response).await?;
        response
            .json::<AuthResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}: {}", path, url, e)))
    }
}
