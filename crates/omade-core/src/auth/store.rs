//! The session store: single source of truth for authentication state.
//!
//! Every transition writes the persisted envelope before the in-memory state
//! changes, so anything reading through storage (the gateway) never sees a
//! token the store has already dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::SessionError;
use super::provider::IdentityProvider;
use super::session::{AuthSession, SessionEnvelope, SessionState};
use super::storage::Storage;
use crate::api::ApiError;
use crate::config::{DEFAULT_ELEVATED_ROLE, DEFAULT_STORAGE_KEY};
use crate::models::{LoginCredentials, User};
use crate::routes::guard;

/// Result of a refresh that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A fresh token pair is in place (possibly issued for a concurrent caller)
    Refreshed,
    /// No refresh token was held; the session is now anonymous
    NoRefreshToken,
}

pub struct SessionStore {
    provider: IdentityProvider,
    storage: Arc<dyn Storage>,
    storage_key: String,
    elevated_role: String,
    state: RwLock<SessionState>,
    /// Serializes login/logout/refresh across their network calls
    transition: Mutex<()>,
    loading: AtomicBool,
    /// Bumped each time a refresh call to the provider completes
    refresh_generation: AtomicU64,
    /// Error from the most recent refresh, if it failed
    last_refresh_failure: StdMutex<Option<String>>,
}

/// Clears the loading flag when a login/logout finishes, however it finishes
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SessionStore {
    pub fn new(provider: IdentityProvider, storage: Arc<dyn Storage>) -> Self {
        Self {
            provider,
            storage,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            elevated_role: DEFAULT_ELEVATED_ROLE.to_string(),
            state: RwLock::new(SessionState::Anonymous),
            transition: Mutex::new(()),
            loading: AtomicBool::new(false),
            refresh_generation: AtomicU64::new(0),
            last_refresh_failure: StdMutex::new(None),
        }
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_elevated_role(mut self, role: impl Into<String>) -> Self {
        self.elevated_role = role.into();
        self
    }

    // ===== Persistence =====

    /// Hydrate from storage. Returns true if an authenticated session was restored.
    pub fn load(&self) -> anyhow::Result<bool> {
        let Some(raw) = self.storage.get_item(&self.storage_key)? else {
            debug!("No persisted session");
            return Ok(false);
        };

        let state = match SessionEnvelope::parse(&raw) {
            Ok(envelope) => SessionState::from_envelope(envelope),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session envelope");
                SessionState::Anonymous
            }
        };

        let restored = state.is_authenticated();
        if !restored {
            debug!("Persisted session incomplete, starting anonymous");
        }
        self.set_state(state);
        Ok(restored)
    }

    /// Read-through of the stored access token.
    ///
    /// Storage is the source of truth here, not memory: another process
    /// sharing the storage may have refreshed the pair.
    pub fn persisted_access_token(&self) -> Option<String> {
        let raw = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read session storage");
                return None;
            }
        };
        match SessionEnvelope::parse(&raw) {
            Ok(envelope) => envelope.access_token().map(str::to_string),
            Err(e) => {
                warn!(error = %e, "Failed to parse session storage");
                None
            }
        }
    }

    /// Write the new state to storage, then swap it in
    fn commit(&self, state: SessionState) -> Result<(), SessionError> {
        let json = state
            .to_envelope()
            .to_json()
            .map_err(SessionError::Storage)?;
        self.storage
            .set_item(&self.storage_key, &json)
            .map_err(SessionError::Storage)?;
        self.set_state(state);
        Ok(())
    }

    /// Transition to `Anonymous` and drop the persisted entry
    fn reset(&self) {
        if let Err(e) = self.storage.remove_item(&self.storage_key) {
            warn!(error = %e, "Failed to clear persisted session");
        }
        self.set_state(SessionState::Anonymous);
    }

    fn set_state(&self, state: SessionState) {
        let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *current = state;
    }

    // ===== Accessors =====

    pub fn snapshot(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_authenticated()
    }

    pub fn user(&self) -> Option<User> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user()
            .cloned()
    }

    /// In-memory access token. The gateway uses `persisted_access_token` instead.
    pub fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .access_token()
            .map(str::to_string)
    }

    fn refresh_token(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .refresh_token()
            .map(str::to_string)
    }

    pub fn elevated_role(&self) -> &str {
        &self.elevated_role
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        guard::has_permission(state.user(), permission, &self.elevated_role)
    }

    /// True while a login or logout is in flight. Never persisted.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    // ===== Transitions =====

    /// Authenticate with email/password.
    ///
    /// On failure the state is left exactly as it was before the call.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<User, SessionError> {
        credentials
            .validate()
            .map_err(|msg| SessionError::Validation(msg.to_string()))?;

        let _transition = self.transition.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        let response = self
            .provider
            .login(credentials)
            .await
            .map_err(credential_error)?;

        let session = AuthSession::from_response(response).ok_or_else(|| {
            SessionError::Api(ApiError::InvalidResponse(
                "login response is missing a token".to_string(),
            ))
        })?;
        let user = session.user.clone();

        self.commit(SessionState::Authenticated(session))?;
        // A fresh session supersedes any earlier refresh failure
        *self
            .last_refresh_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Best-effort provider notification, then unconditionally anonymous.
    pub async fn logout(&self) {
        let _transition = self.transition.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        if let Some(refresh_token) = self.refresh_token() {
            if let Err(e) = self.provider.logout(&refresh_token).await {
                warn!(error = %e, "Logout notification failed, clearing session anyway");
            }
        }

        self.reset();
        info!("Logged out");
    }

    /// Exchange the held refresh token for a new pair.
    ///
    /// Any failure leaves the store anonymous with storage cleared.
    pub async fn refresh(&self) -> Result<RefreshOutcome, SessionError> {
        let _transition = self.transition.lock().await;
        self.refresh_locked().await
    }

    /// Generation of completed refresh calls. A request samples this before
    /// it is sent and hands it back to `refresh_after_rejection`.
    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation.load(Ordering::SeqCst)
    }

    /// Refresh on behalf of a request that was rejected while carrying
    /// `rejected_token`, sent when the refresh generation was `observed`.
    ///
    /// Callers queue on the transition lock. If a refresh completed while
    /// the request was in flight, its outcome is shared instead of making a
    /// new call, so N concurrent 401s produce one refresh and all of them
    /// see the same result.
    pub async fn refresh_after_rejection(
        &self,
        rejected_token: Option<&str>,
        observed: u64,
    ) -> Result<RefreshOutcome, SessionError> {
        let _transition = self.transition.lock().await;

        if self.refresh_generation() != observed {
            if let Some(message) = self.last_refresh_failure() {
                debug!("Concurrent refresh already failed");
                return Err(SessionError::RefreshFailed(ApiError::RefreshFailed(message)));
            }
        }

        if let Some(current) = self.persisted_access_token() {
            if Some(current.as_str()) != rejected_token && self.is_authenticated() {
                debug!("Token already refreshed by a concurrent request");
                return Ok(RefreshOutcome::Refreshed);
            }
        }

        self.refresh_locked().await
    }

    fn last_refresh_failure(&self) -> Option<String> {
        self.last_refresh_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record the outcome of a provider refresh call and advance the generation
    fn finish_refresh(&self, failure: Option<String>) {
        *self
            .last_refresh_failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = failure;
        self.refresh_generation.fetch_add(1, Ordering::SeqCst);
    }

    async fn refresh_locked(&self) -> Result<RefreshOutcome, SessionError> {
        let Some(refresh_token) = self.refresh_token() else {
            debug!("No refresh token held, nothing to refresh");
            self.reset();
            return Ok(RefreshOutcome::NoRefreshToken);
        };

        let response = match self.provider.refresh(&refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Token refresh failed");
                self.reset();
                self.finish_refresh(Some(e.to_string()));
                return Err(SessionError::RefreshFailed(e));
            }
        };

        let Some(session) = AuthSession::from_response(response) else {
            warn!("Refresh response is missing a token");
            let err = ApiError::InvalidResponse("refresh response is missing a token".to_string());
            self.reset();
            self.finish_refresh(Some(err.to_string()));
            return Err(SessionError::RefreshFailed(err));
        };

        if let Err(e) = self.commit(SessionState::Authenticated(session)) {
            self.reset();
            self.finish_refresh(Some(e.to_string()));
            return Err(e);
        }
        self.finish_refresh(None);
        debug!("Token pair refreshed");
        Ok(RefreshOutcome::Refreshed)
    }

    /// Unconditional, synchronous transition to `Anonymous`
    pub fn clear_auth(&self) {
        self.reset();
        debug!("Session cleared");
    }

    /// Replace the cached user (after a profile fetch or update).
    /// Ignored when anonymous.
    pub fn set_user(&self, user: User) -> Result<(), SessionError> {
        let next = match self.snapshot() {
            SessionState::Authenticated(mut session) => {
                session.user = user;
                SessionState::Authenticated(session)
            }
            SessionState::Anonymous => return Ok(()),
        };
        self.commit(next)
    }
}

/// Provider rejections of the credentials themselves become `InvalidCredentials`
fn credential_error(err: ApiError) -> SessionError {
    match err {
        ApiError::Unauthorized => {
            SessionError::InvalidCredentials("Invalid email or password".to_string())
        }
        ApiError::AccessDenied(message) => SessionError::InvalidCredentials(message),
        ApiError::Rejected { status, message } if matches!(status, 400 | 422) => {
            SessionError::InvalidCredentials(message)
        }
        other => SessionError::Api(other),
    }
}
