use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthError;

/// Message shown when the identifier is blank
pub const IDENTIFIER_REQUIRED: &str = "Email or mobile is required";

/// Message shown when the password is blank
pub const PASSWORD_REQUIRED: &str = "Password is required";

/// Login credentials as typed by the user.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "email_or_mobile")]
    pub identifier: String,
    pub password: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            password: password.into(),
        }
    }

    /// Check both fields and return the form that goes on the wire.
    ///
    /// Both fields must be non-empty after trimming. The identifier is sent
    /// trimmed, the password exactly as typed.
    pub fn validate(&self) -> Result<Credentials, AuthError> {
        let identifier = self.identifier.trim();
        if identifier.is_empty() {
            return Err(AuthError::Validation(IDENTIFIER_REQUIRED.to_string()));
        }
        if self.password.trim().is_empty() {
            return Err(AuthError::Validation(PASSWORD_REQUIRED.to_string()));
        }
        Ok(Credentials::new(identifier, self.password.clone()))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The user profile exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Value);

impl UserProfile {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up a top-level string field (e.g. `name`, `email`)
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Best-effort display name for the front end
    pub fn display_name(&self) -> String {
        ["name", "email", "mobile"]
            .iter()
            .find_map(|f| self.str_field(f))
            .map(str::to_string)
            .or_else(|| self.0.get("id").map(|id| format!("user {}", id)))
            .unwrap_or_else(|| "unknown user".to_string())
    }
}

impl From<Value> for UserProfile {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Login response reduced to `{token, user}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAuthResponse {
    pub token: String,
    pub user: Option<UserProfile>,
}

impl NormalizedAuthResponse {
    /// Accepts `{token, user}` or `{data: {token, user}}`.
    ///
    /// Returns `None` when no usable token is present in either place.
    pub fn from_body(body: &Value) -> Option<Self> {
        let token = pick(body, "token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?
            .to_string();
        let user = pick(body, "user").cloned().map(UserProfile);
        Some(Self { token, user })
    }
}

/// Profile response reduced to `{user}`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedProfile {
    pub user: UserProfile,
}

impl NormalizedProfile {
    /// Accepts `{user}` or `{data: {user}}`.
    pub fn from_body(body: &Value) -> Option<Self> {
        pick(body, "user").cloned().map(|user| Self {
            user: UserProfile(user),
        })
    }
}

/// Top-level field first, `data.<field>` as fallback. JSON nulls count as
/// absent in both places.
fn pick<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    body.get(field)
        .filter(|v| !v.is_null())
        .or_else(|| {
            body.get("data")
                .and_then(|d| d.get(field))
                .filter(|v| !v.is_null())
        })
}
