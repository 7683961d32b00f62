//! Data models for the auth API.
//!
//! - `Credentials`: identifier (email or phone) plus password
//! - `UserProfile`: the opaque user object the server hands back
//! - `NormalizedAuthResponse`, `NormalizedProfile`: response bodies reduced
//!   to one canonical shape at the gateway boundary

pub mod auth;

pub use auth::{Credentials, NormalizedAuthResponse, NormalizedProfile, UserProfile};
