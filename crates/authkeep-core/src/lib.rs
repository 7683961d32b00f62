//! Core library for authkeep.
//!
//! Holds everything needed to sign in against a remote auth API and keep
//! the resulting session alive across restarts:
//!
//! - `api`: the gateway client for `/login`, `/me`, `/logout` and friends
//! - `auth`: the credential attacher and the session state machine
//! - `store`: persistent key-value backends (file, OS keychain, memory)
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{
    clear_local_session, AuthError, CredentialAttacher, Session, SessionHandle, SessionManager,
    SessionStatus,
};
pub use config::{Config, StoreBackend};
pub use models::{Credentials, NormalizedAuthResponse, NormalizedProfile, UserProfile};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
