//! Data models exchanged with the identity provider.
//!
//! - `User`: identity record with role and permission set
//! - `AuthResponse`: user plus access/refresh token pair
//! - `LoginCredentials`: ephemeral email/password pair with form validation
//! - Account request bodies: `ProfileUpdate`, `ChangePasswordRequest`, `ResetPasswordRequest`

pub mod user;

pub use user::{
    AuthResponse, ChangePasswordRequest, LoginCredentials, ProfileUpdate, ResetPasswordRequest,
    User, validate_password, MIN_PASSWORD_LENGTH,
};
pub(crate) use user::{EmailBody, RefreshTokenBody};
