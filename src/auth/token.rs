//! Session token model and the cookie codec.
//!
//! The cookie value is the URL-safe base64 encoding of the token's JSON form.
//! It carries no integrity protection of its own: the private cookie jar
//! encrypts and authenticates it in transit (see `auth::cookie`).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::AuthError;

/// Tokens issued by a provider, plus the key of the provider that issued them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
    /// Stamped by the exchange step from the provider that was called.
    pub provider_key: String,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("id_token", &"<redacted>")
            .field("scope", &self.scope)
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("provider_key", &self.provider_key)
            .finish()
    }
}

/// Verified identity attributes extracted from an identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The provider's immutable subject identifier. Never empty.
    pub subject_id: String,
    pub email: Option<String>,
}

/// Encoded session token as carried by the cookie.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieValue(String);

impl CookieValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for CookieValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CookieValue(<redacted>)")
    }
}

/// Encode a token into its cookie representation.
pub fn encode(token: &Token) -> CookieValue {
    // Serializing a struct of strings and integers cannot fail.
    let json = serde_json::to_vec(token).unwrap_or_default();
    CookieValue(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a cookie value back into a token.
pub fn decode(value: &str) -> Result<Token, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingCookie);
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| AuthError::MalformedCookie)?;

    serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedCookie)
}

// ============================================================================
// Tests
// ============================================================================
