//! REST client module for the remote auth API.
//!
//! This module provides the `ApiClient` (the auth gateway) for talking to
//! `/login`, `/me`, `/logout` and the account endpoints, and `ApiError`
//! for everything that can go wrong on the wire.
//!
//! The API uses bearer token authentication. Tokens are attached from the
//! shared `CredentialAttacher`, never stored here.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
