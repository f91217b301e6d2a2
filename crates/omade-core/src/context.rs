//! Composition root for the client.
//!
//! `AppContext` owns the session store, the router and the HTTP gateway and
//! hands out shared references; nothing in the crate reaches for a global.
//!
//! Lifecycle: `AppContext::new`/`from_config` builds an anonymous context,
//! `init` hydrates it from storage, and dropping it tears it down. The
//! persisted session outlives the context; only `logout` (or a failed
//! refresh) ends it.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::{debug, info};

use crate::api::{build_http_client, ApiClient};
use crate::auth::{
    FileStorage, IdentityProvider, KeyringStorage, MemoryStorage, SessionError, SessionStore,
    Storage,
};
use crate::config::{Config, StorageKind};
use crate::models::{LoginCredentials, User};
use crate::routes::{GuardPolicy, Navigation, Navigator, RouteTable, Router, LOGIN_PATH};
use crate::seo::SiteConfig;

pub struct AppContext {
    config: Config,
    session: Arc<SessionStore>,
    router: Arc<Router>,
    api: ApiClient,
}

impl AppContext {
    /// Build a context with the site's route table
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        Self::with_routes(config, storage, RouteTable::site())
    }

    pub fn with_routes(config: Config, storage: Arc<dyn Storage>, routes: RouteTable) -> Result<Self> {
        let http = build_http_client(config.request_timeout())
            .context("Failed to build HTTP client")?;

        let provider = IdentityProvider::new(http.clone(), config.api_base_url.clone());
        let session = Arc::new(
            SessionStore::new(provider, storage)
                .with_storage_key(config.storage_key.clone())
                .with_elevated_role(config.elevated_role.clone()),
        );

        let policy = GuardPolicy {
            redirect_authenticated_to: config.redirect_authenticated_to.clone(),
        };
        let router = Arc::new(Router::new(Arc::clone(&session), routes, policy));
        let navigator: Arc<dyn Navigator> = router.clone();
        let api = ApiClient::new(
            http,
            config.api_base_url.clone(),
            Arc::clone(&session),
            navigator,
        );

        Ok(Self {
            config,
            session,
            router,
            api,
        })
    }

    /// Build a context using the storage backend named in the config
    pub fn from_config(config: Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = match config.storage {
            StorageKind::File => Arc::new(FileStorage::new(config.data_dir()?)),
            StorageKind::Keyring => Arc::new(KeyringStorage::new()),
            StorageKind::Memory => Arc::new(MemoryStorage::new()),
        };
        debug!(storage = ?config.storage, base_url = %config.api_base_url, "Building app context");
        Self::new(config, storage)
    }

    /// Hydrate the session from storage. Returns true if a session was restored.
    pub fn init(&self) -> Result<bool> {
        let restored = self
            .session
            .load()
            .context("Failed to load persisted session")?;
        if restored {
            info!("Restored persisted session");
        }
        Ok(restored)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn site(&self) -> SiteConfig {
        SiteConfig::default().with_site_url(self.config.site_url.clone())
    }

    /// Log in and move to the return target (or the dashboard)
    pub async fn login(
        &self,
        credentials: &LoginCredentials,
        redirect_url: Option<&str>,
    ) -> Result<(User, Navigation), SessionError> {
        let user = self.session.login(credentials).await?;
        let navigation = self.router.complete_login(redirect_url);
        Ok((user, navigation))
    }

    /// Log out and land on the login page
    pub async fn logout(&self) -> Navigation {
        self.session.logout().await;
        self.router.navigate(LOGIN_PATH)
    }
}
