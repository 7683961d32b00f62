//! Session state machine.
//!
//! `SessionManager` owns the `Session` and is the only thing that writes to
//! it. Once spawned it runs as a background task that takes commands from a
//! queue and handles them strictly in arrival order, so a slow profile fetch
//! can never land on top of a logout that was submitted after it. The queue
//! is unbounded: submitting never waits on work already in flight.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::{AuthError, CredentialAttacher, Session};
use crate::api::{ApiClient, ApiError};
use crate::models::Credentials;
use crate::store::{KeyValueStore, USER_KEY};

/// Error shown when a login fails without a server-supplied message
pub const LOGIN_FAILED: &str = "Login failed";

/// Error shown when a profile fetch fails without a server-supplied message
pub const PROFILE_FAILED: &str = "Failed to fetch profile";

type Reply = oneshot::Sender<Result<Session, AuthError>>;

enum Command {
    Login { credentials: Credentials, reply: Reply },
    FetchProfile { reply: Reply },
    Logout { reply: oneshot::Sender<Session> },
}

pub struct SessionManager {
    api: ApiClient,
    store: Arc<dyn KeyValueStore>,
    session: Session,
    state_tx: watch::Sender<Session>,
}

impl SessionManager {
    /// Build a manager, hydrating token and user from the store.
    pub fn new(api: ApiClient) -> Self {
        let store = api.credentials().store().clone();
        let token = match api.credentials().hydrate() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        };
        let session = Session::hydrate(store.as_ref(), token);
        debug!(
            authenticated = session.is_authenticated(),
            has_user = session.user.is_some(),
            "Session hydrated"
        );

        let (state_tx, _) = watch::channel(session.clone());
        Self {
            api,
            store,
            session,
            state_tx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Observe every state change, including the intermediate `loading`
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state_tx.subscribe()
    }

    /// Move the manager onto a background task and return a handle to it.
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(self) -> SessionHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = self.subscribe();
        tokio::spawn(self.run(rx));
        SessionHandle {
            commands: tx,
            state,
        }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Login { credentials, reply } => {
                    let result = self.login(&credentials).await;
                    let _ = reply.send(result);
                }
                Command::FetchProfile { reply } => {
                    let result = self.fetch_profile().await;
                    let _ = reply.send(result);
                }
                Command::Logout { reply } => {
                    let session = self.logout().await;
                    let _ = reply.send(session);
                }
            }
        }
        debug!("Session manager stopped");
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.session.clone());
    }

    /// Store the current user, or remove it when there is none
    fn persist_user(&self) {
        let result = match self.session.user {
            Some(ref user) => serde_json::to_string(user)
                .map_err(|e| AuthError::Store(e.into()))
                .and_then(|raw| Ok(self.store.set(USER_KEY, &raw)?)),
            None => self.store.remove(USER_KEY).map_err(AuthError::from),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist user");
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Log in with the given credentials.
    ///
    /// Blank credentials fail without a request; status is left as it was
    /// and the validation message lands in `error`.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<Session, AuthError> {
        let credentials = match credentials.validate() {
            Ok(credentials) => credentials,
            Err(e) => {
                self.session.error = Some(e.to_string());
                self.publish();
                return Err(e);
            }
        };

        self.session.begin_login();
        self.publish();

        let auth = match self.api.login(&credentials).await {
            Ok(auth) => auth,
            Err(e) => return Err(self.fail_login(e.into())),
        };

        match self.api.credentials().set_token(Some(&auth.token)) {
            Ok(()) => {}
            Err(e @ AuthError::InvalidToken) => return Err(self.fail_login(e)),
            Err(e) => warn!(error = %e, "Failed to persist token"),
        }

        self.session.login_succeeded(auth.token, auth.user);
        self.persist_user();
        self.publish();
        info!("Login successful");
        Ok(self.session.clone())
    }

    fn fail_login(&mut self, e: AuthError) -> AuthError {
        let message = failure_message(&e, LOGIN_FAILED);
        warn!(error = %e, "Login failed");
        self.session.login_failed(message);
        self.publish();
        e
    }

    /// Refresh the user profile. Status and token are never touched, and a
    /// failure keeps the existing user.
    pub async fn fetch_profile(&mut self) -> Result<Session, AuthError> {
        self.session.begin_fetch();
        self.publish();

        match self.api.fetch_profile().await {
            Ok(profile) => {
                self.session.profile_fetched(profile.user);
                self.persist_user();
                self.publish();
                debug!("Profile refreshed");
                Ok(self.session.clone())
            }
            Err(e) => {
                warn!(error = %e, status = ?e.status(), "Profile fetch failed");
                let e = AuthError::from(e);
                self.session.profile_failed(failure_message(&e, PROFILE_FAILED));
                self.publish();
                Err(e)
            }
        }
    }

    /// Log out. Local state is cleared whether or not the server call works.
    pub async fn logout(&mut self) -> Session {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, status = ?e.status(), "Remote logout failed, clearing local session anyway");
        }

        self.session.reset();
        if let Err(e) = clear_local_session(self.api.credentials()) {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.publish();
        info!("Logged out");
        self.session.clone()
    }
}

/// Cloneable front door to a spawned `SessionManager`.
///
/// Any number of callers may submit operations at once; they are queued and
/// run one after another.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<Session>,
}

impl SessionHandle {
    pub async fn login(&self, credentials: Credentials) -> Result<Session, AuthError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Login { credentials, reply })?;
        rx.await.map_err(|_| AuthError::ManagerClosed)?
    }

    pub async fn fetch_profile(&self) -> Result<Session, AuthError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::FetchProfile { reply })?;
        rx.await.map_err(|_| AuthError::ManagerClosed)?
    }

    /// Only fails if the manager task is gone
    pub async fn logout(&self) -> Result<Session, AuthError> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Logout { reply })?;
        rx.await.map_err(|_| AuthError::ManagerClosed)
    }

    /// Latest published session
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.clone()
    }

    fn submit(&self, command: Command) -> Result<(), AuthError> {
        self.commands
            .send(command)
            .map_err(|_| AuthError::ManagerClosed)
    }
}

/// Server-supplied text when there is some, `fallback` for transport and
/// response-shape failures.
fn failure_message(e: &AuthError, fallback: &str) -> String {
    match e {
        AuthError::Validation(message) => message.clone(),
        AuthError::Api(ApiError::Status { message, .. }) if !message.trim().is_empty() => {
            message.clone()
        }
        _ => fallback.to_string(),
    }
}

/// Drop the token (memory, default header, store) and the stored user.
///
/// Needs no server, so a front end can always log out locally. Both removals
/// are attempted; the first failure is returned.
pub fn clear_local_session(credentials: &CredentialAttacher) -> Result<(), AuthError> {
    let token = credentials.set_token(None);
    let user = credentials.store().remove(USER_KEY).map_err(AuthError::from);
    token.and(user)
}

// ============================================================================
// Tests
// ============================================================================
