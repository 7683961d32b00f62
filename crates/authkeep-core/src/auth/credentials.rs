use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use super::AuthError;
use crate::store::{KeyValueStore, TOKEN_KEY};

#[derive(Default)]
struct Attached {
    token: Option<String>,
    headers: HeaderMap,
    // Set once memory holds the authoritative value (hydrated, set or cleared).
    // Until then `token()` may fall back to the store.
    primed: bool,
}

/// Single owner of the current bearer token.
///
/// Keeps three copies in step: the in-memory token, the `auth_token` entry
/// in the store, and the default headers every authorized request carries.
/// All three change together under one write lock.
pub struct CredentialAttacher {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<Attached>,
}

impl CredentialAttacher {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            state: RwLock::new(Attached::default()),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Prime the token and header from the store at startup.
    ///
    /// A stored token that cannot be a header value is ignored.
    pub fn hydrate(&self) -> Result<Option<String>, AuthError> {
        let stored = self.store.get(TOKEN_KEY)?.filter(|t| !t.is_empty());
        let mut state = self.state.write();
        state.primed = true;
        match stored {
            Some(token) => match bearer_value(&token) {
                Ok(value) => {
                    state.headers.insert(header::AUTHORIZATION, value);
                    state.token = Some(token.clone());
                    debug!("Token hydrated from store");
                    Ok(Some(token))
                }
                Err(e) => {
                    warn!(error = %e, "Ignoring stored token");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Replace (or with `None`, clear) the current token.
    ///
    /// Memory and the default header are updated first; the store write
    /// happens before the lock is released. A store failure is returned but
    /// leaves memory and header on the new value; in particular a cleared
    /// token stays cleared even if the stored copy could not be removed.
    pub fn set_token(&self, token: Option<&str>) -> Result<(), AuthError> {
        let token = token.filter(|t| !t.is_empty());
        let value = token.map(bearer_value).transpose()?;

        let mut state = self.state.write();
        state.primed = true;
        state.token = token.map(str::to_string);
        match value {
            Some(value) => {
                state.headers.insert(header::AUTHORIZATION, value);
            }
            None => {
                state.headers.remove(header::AUTHORIZATION);
            }
        }

        match token {
            Some(t) => self.store.set(TOKEN_KEY, t)?,
            None => self.store.remove(TOKEN_KEY)?,
        }
        debug!(present = token.is_some(), "Token updated");
        Ok(())
    }

    /// Current token; falls back to the store when memory was never primed.
    pub fn token(&self) -> Option<String> {
        {
            let state = self.state.read();
            if state.primed || state.token.is_some() {
                return state.token.clone();
            }
        }

        let stored = match self.store.get(TOKEN_KEY) {
            Ok(stored) => stored.filter(|t| !t.is_empty())?,
            Err(e) => {
                warn!(error = %e, "Failed to read token from store");
                return None;
            }
        };
        let value = match bearer_value(&stored) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Ignoring stored token");
                return None;
            }
        };

        let mut state = self.state.write();
        // Another caller may have set or cleared the token while we were reading
        if state.primed {
            return state.token.clone();
        }
        state.headers.insert(header::AUTHORIZATION, value);
        state.token = Some(stored.clone());
        state.primed = true;
        Some(stored)
    }

    /// Headers to put on every authorized request
    pub fn default_headers(&self) -> HeaderMap {
        self.state.read().headers.clone()
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, AuthError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| AuthError::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}
