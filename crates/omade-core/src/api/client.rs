//! HTTP gateway for the Omade Cravings API.
//!
//! Every application call goes through `ApiClient`, which attaches the
//! current access token and recovers from an expired token with exactly one
//! refresh-and-replay cycle.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::{RefreshOutcome, SessionError, SessionStore};
use crate::routes::Navigator;

// ============================================================================
// Helpers
// ============================================================================

/// Join a base URL and an absolute API path without doubling slashes
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

/// Shared reqwest client with the gateway's fixed per-request timeout.
pub fn build_http_client(timeout: Duration) -> Result<Client, ApiError> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        header::HeaderValue::from_static("application/json"),
    );
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(ApiError::NetworkError)
}

// ============================================================================
// Request descriptor
// ============================================================================

/// Everything needed to send (and replay) one request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Serialize the body up front so the request can be replayed verbatim
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Outcome of sending a request once
enum Attempt {
    Success(Response),
    AuthorizationExpired,
    Failed(ApiError),
}

// ============================================================================
// Gateway
// ============================================================================

/// Shared request pipeline.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
            navigator,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send a request, refreshing and replaying it once on a 401.
    ///
    /// A second 401 on the replay is returned as `ApiError::Unauthorized`
    /// without another refresh.
    pub async fn send(&self, spec: RequestSpec) -> Result<Response, ApiError> {
        let generation = self.session.refresh_generation();
        let token = self.session.persisted_access_token();

        match self.attempt(&spec, token.as_deref()).await {
            Attempt::Success(response) => return Ok(response),
            Attempt::Failed(err) => return Err(err),
            Attempt::AuthorizationExpired => {
                debug!(method = %spec.method, path = %spec.path, "Authorization expired, refreshing session");
            }
        }

        let fresh_token = self.recover(token.as_deref(), generation).await?;

        match self.attempt(&spec, Some(&fresh_token)).await {
            Attempt::Success(response) => Ok(response),
            Attempt::Failed(err) => Err(err),
            Attempt::AuthorizationExpired => {
                warn!(method = %spec.method, path = %spec.path, "Replayed request rejected again");
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Send and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, spec: RequestSpec) -> Result<T, ApiError> {
        let url = join_url(&self.base_url, &spec.path);
        let response = self.send(spec).await?;
        response.json().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    /// Send, discarding any response body
    pub async fn send_empty(&self, spec: RequestSpec) -> Result<(), ApiError> {
        self.send(spec).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(RequestSpec::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(RequestSpec::post(path).json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(RequestSpec::put(path).json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(RequestSpec::patch(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send_empty(RequestSpec::delete(path)).await
    }

    fn auth_headers(token: Option<&str>) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidRequest("access token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn attempt(&self, spec: &RequestSpec, token: Option<&str>) -> Attempt {
        let headers = match Self::auth_headers(token) {
            Ok(headers) => headers,
            Err(err) => return Attempt::Failed(err),
        };

        let url = join_url(&self.base_url, &spec.path);
        let mut request = self
            .client
            .request(spec.method.clone(), &url)
            .headers(headers);
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(url = %url, error = %err, "Request failed");
                return Attempt::Failed(err.into());
            }
        };

        if response.status() == StatusCode::UNAUTHORIZED {
            return Attempt::AuthorizationExpired;
        }

        match check_response(response).await {
            Ok(response) => Attempt::Success(response),
            Err(err) => Attempt::Failed(err),
        }
    }

    /// Refresh after a 401 and return the token to replay with.
    async fn recover(
        &self,
        rejected_token: Option<&str>,
        generation: u64,
    ) -> Result<String, ApiError> {
        match self
            .session
            .refresh_after_rejection(rejected_token, generation)
            .await
        {
            Ok(RefreshOutcome::Refreshed) => self
                .session
                .persisted_access_token()
                .or_else(|| self.session.access_token())
                .ok_or(ApiError::Unauthorized),
            // Nothing to refresh with: the original 401 stands
            Ok(RefreshOutcome::NoRefreshToken) => Err(ApiError::Unauthorized),
            Err(err) => {
                warn!(error = %err, "Session refresh failed, redirecting to login");
                self.session.clear_auth();
                self.navigator.redirect_to_login();
                Err(refresh_failure(err))
            }
        }
    }
}

/// Every caller of a failed refresh gets the same `RefreshFailed`
fn refresh_failure(err: SessionError) -> ApiError {
    match err {
        SessionError::RefreshFailed(ApiError::RefreshFailed(message)) => {
            ApiError::RefreshFailed(message)
        }
        SessionError::RefreshFailed(source) => ApiError::RefreshFailed(source.to_string()),
        other => ApiError::RefreshFailed(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8000/api", "/auth/login"),
            "http://localhost:8000/api/auth/login"
        );
        assert_eq!(
            join_url("http://localhost:8000/api/", "auth/login"),
            "http://localhost:8000/api/auth/login"
        );
    }

    #[test]
    fn test_request_spec_json_body() {
        let spec = RequestSpec::post("/orders")
            .json(&serde_json::json!({"loaves": 2}))
            .unwrap()
            .query("draft", "true");
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.body.unwrap()["loaves"], 2);
        assert_eq!(spec.query, vec![("draft".to_string(), "true".to_string())]);
    }

    #[test]
    fn test_refresh_failure_message_is_not_nested() {
        let first = refresh_failure(SessionError::RefreshFailed(ApiError::Unauthorized));
        let shared = refresh_failure(SessionError::RefreshFailed(ApiError::RefreshFailed(
            ApiError::Unauthorized.to_string(),
        )));
        assert_eq!(first.to_string(), shared.to_string());
    }

    #[test]
    fn test_auth_headers() {
        let headers = ApiClient::auth_headers(Some("AT1")).unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer AT1");
        assert!(ApiClient::auth_headers(None).unwrap().is_empty());
        assert!(ApiClient::auth_headers(Some("bad\ntoken")).is_err());
    }
}
