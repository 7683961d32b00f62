use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::UserProfile;
use crate::store::{KeyValueStore, USER_KEY};

/// Outcome of the most recent login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Loading => "loading",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The in-memory authentication state.
///
/// Only `SessionManager` mutates it, through the transition methods below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<UserProfile>,
    pub token: Option<String>,
    pub status: SessionStatus,
    pub error: Option<String>,
}

impl Session {
    /// Rebuild the session from what a previous process left in the store.
    ///
    /// Status always starts at `idle`. An unreadable user entry is dropped.
    pub fn hydrate(store: &dyn KeyValueStore, token: Option<String>) -> Self {
        let user = match store.get(USER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<UserProfile>(&raw) {
                Ok(user) if !user.as_value().is_null() => Some(user),
                Ok(_) => None,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable stored user");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user");
                None
            }
        };

        Self {
            user,
            token,
            ..Self::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn begin_login(&mut self) {
        self.status = SessionStatus::Loading;
        self.error = None;
    }

    pub(crate) fn login_succeeded(&mut self, token: String, user: Option<UserProfile>) {
        self.status = SessionStatus::Succeeded;
        self.token = Some(token);
        self.user = user;
    }

    pub(crate) fn login_failed(&mut self, message: String) {
        self.status = SessionStatus::Failed;
        self.error = Some(message);
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.error = None;
    }

    pub(crate) fn profile_fetched(&mut self, user: UserProfile) {
        self.user = Some(user);
    }

    /// Profile fetch failed; user and token are kept
    pub(crate) fn profile_failed(&mut self, message: String) {
        self.error = Some(message);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
