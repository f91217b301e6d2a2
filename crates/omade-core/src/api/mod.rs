//! HTTP gateway module for the Omade Cravings API.
//!
//! This module provides the `ApiClient`, the single request pipeline every
//! application call goes through, plus the account endpoints built on it.
//!
//! Requests carry `Authorization: Bearer <accessToken>` read from session
//! storage. A 401 triggers one session refresh and one replay.

pub mod account;
pub mod client;
pub mod error;

pub use client::{build_http_client, ApiClient, RequestSpec};
pub use error::ApiError;

pub(crate) use client::{check_response, join_url};
