//! Authentication module for managing the signed-in session.
//!
//! This module provides:
//! - `CredentialAttacher`: the current bearer token, mirrored to the store
//!   and to the default headers of authorized requests
//! - `Session`: user, token, login status and last error
//! - `SessionManager` / `SessionHandle`: the single-writer state machine
//!   that runs login, profile fetch and logout one at a time
//!
//! The token and user survive restarts through the `store` module.

pub mod credentials;
pub mod error;
pub mod machine;
pub mod session;

pub use credentials::CredentialAttacher;
pub use error::AuthError;
pub use machine::{clear_local_session, SessionHandle, SessionManager};
pub use session::{Session, SessionStatus};
