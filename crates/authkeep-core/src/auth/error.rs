use thiserror::Error;

use crate::api::ApiError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Local precondition failed; no request was sent
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Token contains characters that cannot be sent in a header")]
    InvalidToken,

    #[error("Session manager is no longer running")]
    ManagerClosed,
}

impl AuthError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AuthError::Validation(_))
    }
}
