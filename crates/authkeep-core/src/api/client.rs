//! Gateway client for the remote auth API.
//!
//! This module provides the `ApiClient` struct for logging in, fetching the
//! signed-in user's profile, logging out, and the account endpoints. Bodies
//! are normalized here so callers never branch on response shape.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::auth::CredentialAttacher;
use crate::models::{Credentials, NormalizedAuthResponse, NormalizedProfile};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/login";
const PROFILE_PATH: &str = "/me";
const LOGOUT_PATH: &str = "/logout";
const REGISTER_PATH: &str = "/register";
const UPDATE_USER_PATH: &str = "/update-user";
const CHANGE_PASSWORD_PATH: &str = "/change-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    None,
    Bearer,
}

/// API client for the auth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    credentials: Arc<CredentialAttacher>,
}

impl ApiClient {
    /// Create a new API client with the default timeout
    pub fn new(base_url: &str, credentials: Arc<CredentialAttacher>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, credentials, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        credentials: Arc<CredentialAttacher>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialAttacher> {
        &self.credentials
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue a request and return the body of a successful response.
    ///
    /// Empty bodies come back as `Value::Null`, non-JSON bodies as a
    /// `Value::String` holding the raw text.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);
        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::ACCEPT, "application/json");

        if auth == Auth::Bearer {
            request = request.headers(self.credentials.default_headers());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, path, authorized = auth == Auth::Bearer, "Sending request");
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            debug!(%method, path, %status, body = %ApiError::truncate_body(&text), "Request failed");
            return Err(ApiError::from_status(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }

    // ===== Session Endpoints =====

    /// Log in and prime the credential attacher with the returned token.
    pub async fn login(&self, credentials: &Credentials) -> Result<NormalizedAuthResponse, ApiError> {
        let body = self
            .send(Method::POST, LOGIN_PATH, Some(credentials), Auth::None)
            .await?;

        let auth = NormalizedAuthResponse::from_body(&body).ok_or_else(|| {
            ApiError::InvalidResponse("Login response did not include a token".to_string())
        })?;

        // Requests issued before the session manager stores the token still get it
        if let Err(e) = self.credentials.set_token(Some(&auth.token)) {
            warn!(error = %e, "Failed to prime token after login");
        }

        Ok(auth)
    }

    /// Fetch the signed-in user's profile
    pub async fn fetch_profile(&self) -> Result<NormalizedProfile, ApiError> {
        let body = self
            .send::<Value>(Method::GET, PROFILE_PATH, None, Auth::Bearer)
            .await?;

        NormalizedProfile::from_body(&body).ok_or_else(|| {
            ApiError::InvalidResponse("Profile response did not include a user".to_string())
        })
    }

    /// Tell the server the session is over. Failures are returned as-is.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.send::<Value>(Method::POST, LOGOUT_PATH, None, Auth::Bearer)
            .await?;
        Ok(())
    }

    // ===== Account Endpoints =====

    /// Create an account. The body is returned untouched.
    pub async fn register(&self, payload: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, REGISTER_PATH, Some(payload), Auth::None)
            .await
    }

    /// Update the signed-in user. Any `token` field is dropped before sending.
    pub async fn update_user(&self, payload: &Value) -> Result<Value, ApiError> {
        let mut clean = payload.clone();
        if let Some(map) = clean.as_object_mut() {
            map.remove("token");
        }
        self.send(Method::POST, UPDATE_USER_PATH, Some(&clean), Auth::Bearer)
            .await
    }

    pub async fn change_password(&self, payload: &Value) -> Result<Value, ApiError> {
        self.send(Method::POST, CHANGE_PASSWORD_PATH, Some(payload), Auth::Bearer)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
