//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: login/logout/refresh/clear state machine over a persisted session
//! - `IdentityProvider`: the unauthenticated `/auth/login|logout|refresh` calls
//! - `Storage`: durable client storage (`FileStorage`, `KeyringStorage`, `MemoryStorage`)
//!
//! The session is persisted under a single storage key as a
//! `{"state": {...}, "version": 0}` envelope.

pub mod credentials;
pub mod error;
pub mod provider;
pub mod session;
pub mod storage;
pub mod store;

pub use credentials::KeyringStorage;
pub use error::SessionError;
pub use provider::IdentityProvider;
pub use session::{AuthSession, SessionEnvelope, SessionState};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{RefreshOutcome, SessionStore};
