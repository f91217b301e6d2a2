//! Omade Cravings client core.
//!
//! Session lifecycle for the Omade Cravings site: a persisted session store,
//! an HTTP gateway that refreshes and replays once on a 401, and a route
//! guard deciding who may enter which part of the site. SEO helpers for the
//! public pages live alongside.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod routes;
pub mod seo;

pub use api::{ApiClient, ApiError, RequestSpec};
pub use auth::{RefreshOutcome, SessionError, SessionState, SessionStore};
pub use config::Config;
pub use context::AppContext;
pub use models::{AuthResponse, LoginCredentials, User};
pub use routes::{Navigation, Navigator, Router};
