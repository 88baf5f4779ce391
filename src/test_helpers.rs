//! Test helper factories and mock state builders
//!
//! Provides a stub token validator, provider/registry builders, HS256 id_token
//! minting with a matching JWKS document, and a ready-made `ServerState`.
#![allow(dead_code)]

use crate::api::handlers::ServerState;
use crate::auth::cookie::CookieSettings;
use crate::auth::error::ValidationError;
use crate::auth::provider::{Provider, ProviderRegistry, DEFAULT_SCOPE};
use crate::auth::token::{Claims, Token};
use crate::auth::validator::TokenValidator;
use crate::auth::AuthService;
use crate::{ProviderConfig, ProviderKind};
use async_trait::async_trait;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEST_AUDIENCE: &str = "test-client-id";
pub const TEST_ISSUER: &str = "https://issuer.example.com";
pub const TEST_KEY_ID: &str = "test-key";

/// HMAC secret behind the test JWKS (48 bytes, so its base64 needs no padding)
pub const TEST_HMAC_SECRET: &[u8] = b"card-session-test-hmac-secret-0123456789abcdefgh";
const TEST_HMAC_SECRET_B64: &str = "Y2FyZC1zZXNzaW9uLXRlc3QtaG1hYy1zZWNyZXQtMDEyMzQ1Njc4OWFiY2RlZmdo";

// ============================================================================
// Tokens
// ============================================================================

pub fn sample_token() -> Token {
    Token {
        access_token: "ya29.access".to_string(),
        refresh_token: "1//refresh".to_string(),
        id_token: "header.payload.signature".to_string(),
        scope: "openid email".to_string(),
        expires_in: 3599,
        token_type: "Bearer".to_string(),
        provider_key: "google".to_string(),
    }
}

pub fn token_with_id_token(id_token: String) -> Token {
    Token {
        id_token,
        ..sample_token()
    }
}

/// Mint an HS256 id_token signed with the test secret.
///
/// `expires_in_secs` may be negative to produce an already expired token.
pub fn id_token(subject: &str, audience: &str, expires_in_secs: i64, email: Option<&str>) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let mut claims = json!({
        "iss": TEST_ISSUER,
        "sub": subject,
        "aud": audience,
        "iat": now,
        "exp": now + expires_in_secs,
    });
    if let Some(email) = email {
        claims["email"] = json!(email);
    }

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(TEST_KEY_ID.to_string());

    encode(&header, &claims, &EncodingKey::from_secret(TEST_HMAC_SECRET)).unwrap()
}

/// JWKS document containing the test HMAC key.
pub fn jwks_body() -> serde_json::Value {
    json!({
        "keys": [{
            "kty": "oct",
            "k": TEST_HMAC_SECRET_B64,
            "kid": TEST_KEY_ID,
            "alg": "HS256"
        }]
    })
}

// ============================================================================
// Validators and providers
// ============================================================================

/// Validator returning a fixed outcome and recording the audiences it was asked about.
pub struct StubValidator {
    outcome: Result<Claims, ValidationError>,
    seen_audiences: Arc<Mutex<Vec<String>>>,
}

impl StubValidator {
    pub fn accepting(subject_id: &str) -> Self {
        Self {
            outcome: Ok(Claims {
                subject_id: subject_id.to_string(),
                email: None,
            }),
            seen_audiences: Arc::default(),
        }
    }

    pub fn rejecting(err: ValidationError) -> Self {
        Self {
            outcome: Err(err),
            seen_audiences: Arc::default(),
        }
    }

    pub fn seen_audiences(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen_audiences.clone()
    }
}

#[async_trait]
impl TokenValidator for StubValidator {
    async fn validate(&self, _token: &Token, audience: &str) -> Result<Claims, ValidationError> {
        self.seen_audiences
            .lock()
            .unwrap()
            .push(audience.to_string());
        self.outcome.clone()
    }
}

/// Provider whose endpoints live under `base_url` (`/authorize`, `/token`, `/revoke`).
pub fn stub_provider(key: &str, base_url: &str, validator: impl TokenValidator + 'static) -> Provider {
    Provider {
        key: key.to_string(),
        authorization_endpoint: format!("{}/authorize", base_url),
        token_endpoint: format!("{}/token", base_url),
        revoke_endpoint: format!("{}/revoke", base_url),
        client_id: TEST_AUDIENCE.to_string(),
        client_secret: "test-client-secret".to_string(),
        scope: DEFAULT_SCOPE.to_string(),
        redirect_uris: vec!["http://localhost:3000/auth/callback".to_string()],
        validator: Arc::new(validator),
    }
}

pub fn google_provider_config() -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Google,
        client_id: "123456.apps.googleusercontent.com".to_string(),
        client_secret: "secret123".to_string(),
        redirect_uris: vec!["http://localhost:3000/auth/callback".to_string()],
        scope: None,
        auth_endpoint: None,
        token_endpoint: None,
        revoke_endpoint: None,
        jwks_uri: None,
        issuers: None,
        algorithms: None,
    }
}

// ============================================================================
// Server state
// ============================================================================

pub fn test_cookie_key() -> Key {
    Key::from(&[7u8; 64])
}

/// State with a single "google" provider backed by `validator`, endpoints on localhost:0.
pub fn test_server_state(validator: impl TokenValidator + 'static) -> ServerState {
    test_server_state_with(stub_provider("google", "http://127.0.0.1:0", validator))
}

pub fn test_server_state_with(provider: Provider) -> ServerState {
    let registry = ProviderRegistry::new([provider]);
    ServerState {
        auth: Arc::new(AuthService::new(Arc::new(registry), reqwest::Client::new())),
        cookie_key: test_cookie_key(),
        cookies: Arc::new(CookieSettings::default()),
    }
}

/// `Cookie` request header carrying `value` as the encrypted session cookie.
pub fn session_cookie_header(state: &ServerState, value: &str) -> String {
    let jar = PrivateCookieJar::new(state.cookie_key.clone()).add(Cookie::new(
        state.cookies.session_cookie_name.clone(),
        value.to_string(),
    ));
    let response = (jar, ()).into_response();
    let set_cookie = response
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}
