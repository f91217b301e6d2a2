use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use super::guard::{self, GuardDecision, GuardPolicy, RouteAccess, DEFAULT_LANDING};
use super::Navigator;
use crate::auth::SessionStore;

/// Locations kept in the router's history; older entries are dropped
pub const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub access: RouteAccess,
}

/// Route subtrees keyed by path prefix.
///
/// A route matches its own path and everything below it, segment-wise
/// (`/dashboard` covers `/dashboard/orders` but not `/dashboards`). The root
/// route `/` only matches `/` itself. The longest match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, path: &str, access: RouteAccess) -> Self {
        self.routes.push(Route {
            path: path.to_string(),
            access,
        });
        self
    }

    /// The site's route tree: coming-soon pages, login area, dashboard
    pub fn site() -> Self {
        Self::new()
            .route("/", RouteAccess::Public)
            .route("/comingSoon", RouteAccess::Public)
            .route("/auth", RouteAccess::PublicOnly)
            .route("/auth/login", RouteAccess::PublicOnly)
            .route("/dashboard", RouteAccess::Protected)
    }

    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let requested = segments(path);
        self.routes
            .iter()
            .filter(|route| {
                let prefix = segments(&route.path);
                if prefix.is_empty() {
                    requested.is_empty()
                } else {
                    requested.starts_with(&prefix)
                }
            })
            .max_by_key(|route| segments(&route.path).len())
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Outcome of one navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Entered(String),
    Redirected { from: String, to: String },
    NotFound(String),
}

impl Navigation {
    /// Location the router ended up at
    pub fn location(&self) -> &str {
        match self {
            Navigation::Entered(location) | Navigation::NotFound(location) => location,
            Navigation::Redirected { to, .. } => to,
        }
    }
}

/// In-process navigator that guards every navigation against the session.
pub struct Router {
    table: RouteTable,
    session: Arc<SessionStore>,
    policy: GuardPolicy,
    location: RwLock<String>,
    history: RwLock<VecDeque<String>>,
}

impl Router {
    pub fn new(session: Arc<SessionStore>, table: RouteTable, policy: GuardPolicy) -> Self {
        Self {
            table,
            session,
            policy,
            location: RwLock::new("/".to_string()),
            history: RwLock::new(VecDeque::with_capacity(HISTORY_LIMIT)),
        }
    }

    /// Navigate to `location` (path plus optional query).
    ///
    /// A guard redirect is followed once and not re-guarded, so a
    /// misconfigured landing route cannot loop.
    pub fn navigate(&self, location: &str) -> Navigation {
        let location = normalize(location);
        let (path, _) = guard::split_location(&location);

        let Some(route) = self.table.resolve(path) else {
            debug!(location = %location, "No route matched");
            self.set_location(&location);
            return Navigation::NotFound(location);
        };

        let authenticated = self.session.is_authenticated();
        match guard::evaluate(route.access, authenticated, &location, &self.policy) {
            GuardDecision::Allow => {
                debug!(location = %location, "Entered route");
                self.set_location(&location);
                Navigation::Entered(location)
            }
            GuardDecision::Redirect(to) => {
                info!(from = %location, to = %to, "Navigation redirected by route guard");
                self.set_location(&to);
                Navigation::Redirected { from: location, to }
            }
        }
    }

    /// After a successful login: go to the requested return target or the dashboard
    pub fn complete_login(&self, redirect_url: Option<&str>) -> Navigation {
        let target = redirect_url
            .and_then(guard::sanitize_redirect)
            .unwrap_or(DEFAULT_LANDING)
            .to_string();
        self.navigate(&target)
    }

    /// Current location including query
    pub fn location(&self) -> String {
        self.location
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent locations, oldest first, at most `HISTORY_LIMIT`
    pub fn history(&self) -> Vec<String> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.session.has_permission(permission)
    }

    fn set_location(&self, location: &str) {
        *self.location.write().unwrap_or_else(PoisonError::into_inner) = location.to_string();
        let mut history = self.history.write().unwrap_or_else(PoisonError::into_inner);
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back(location.to_string());
    }
}

impl Navigator for Router {
    fn current_path(&self) -> String {
        let location = self.location();
        guard::split_location(&location).0.to_string()
    }

    fn redirect(&self, location: &str) {
        self.navigate(location);
    }
}

fn normalize(location: &str) -> String {
    let location = location.trim();
    if location.starts_with('/') {
        location.to_string()
    } else {
        format!("/{}", location)
    }
}
