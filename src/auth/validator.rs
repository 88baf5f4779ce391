//! Identity token verification strategies.
//!
//! Each provider family implements [`TokenValidator`]. OIDC providers that
//! publish a JWKS document (Google and most others) share [`JwksValidator`],
//! which verifies the id_token signature, audience, issuer and expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde_json::Value;

use super::error::ValidationError;
use super::token::{Claims, Token};

pub const GOOGLE_JWKS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// How long a fetched key set is trusted before it is fetched again.
const KEY_SET_TTL: Duration = Duration::from_secs(3600);

/// Provider-specific verification of a token.
///
/// `audience` is the client id the token must have been issued to.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &Token, audience: &str) -> Result<Claims, ValidationError>;
}

/// Verifies OIDC id_tokens against the provider's published JWKS.
pub struct JwksValidator {
    jwks_uri: String,
    issuers: Vec<String>,
    algorithms: Vec<Algorithm>,
    http: reqwest::Client,
    key_sets: Cache<String, Arc<JwkSet>>,
}

impl JwksValidator {
    pub fn new(
        jwks_uri: impl Into<String>,
        issuers: Vec<String>,
        algorithms: Vec<Algorithm>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            issuers,
            algorithms,
            http,
            key_sets: Cache::builder()
                .max_capacity(8)
                .time_to_live(KEY_SET_TTL)
                .build(),
        }
    }

    /// Google's signing keys, issuers and algorithm.
    pub fn google(http: reqwest::Client) -> Self {
        Self::new(
            GOOGLE_JWKS_URI,
            GOOGLE_ISSUERS.iter().map(|s| s.to_string()).collect(),
            vec![Algorithm::RS256],
            http,
        )
    }

    /// Point the validator at another key set (self-hosted OIDC, tests).
    pub fn with_jwks_uri(mut self, jwks_uri: impl Into<String>) -> Self {
        self.jwks_uri = jwks_uri.into();
        self
    }

    /// Accept tokens from these issuers instead.
    pub fn with_issuers(mut self, issuers: Vec<String>) -> Self {
        self.issuers = issuers;
        self
    }

    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    async fn key_set(&self) -> Result<Arc<JwkSet>, ValidationError> {
        let http = self.http.clone();
        let uri = self.jwks_uri.clone();

        self.key_sets
            .try_get_with(self.jwks_uri.clone(), async move {
                let set = http
                    .get(&uri)
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<JwkSet>()
                    .await?;
                Ok::<_, reqwest::Error>(Arc::new(set))
            })
            .await
            .map_err(|e| ValidationError::KeySet(e.to_string()))
    }

    /// Find the signing key, refetching once when the key id is unknown (key rotation).
    async fn signing_key(&self, kid: Option<&str>) -> Result<Jwk, ValidationError> {
        if let Some(jwk) = select_key(&*self.key_set().await?, kid) {
            return Ok(jwk);
        }

        tracing::debug!(jwks_uri = %self.jwks_uri, ?kid, "Signing key not cached, refetching key set");
        self.key_sets.invalidate(&self.jwks_uri).await;

        select_key(&*self.key_set().await?, kid)
            .ok_or_else(|| ValidationError::UnknownKey(kid.map(str::to_string)))
    }
}

fn select_key(set: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => set.find(kid).cloned(),
        // A key set with a single key needs no key id.
        None if set.keys.len() == 1 => set.keys.first().cloned(),
        None => None,
    }
}

#[async_trait]
impl TokenValidator for JwksValidator {
    async fn validate(&self, token: &Token, audience: &str) -> Result<Claims, ValidationError> {
        if token.id_token.is_empty() {
            return Err(ValidationError::MissingIdToken);
        }

        let header = decode_header(&token.id_token)?;
        if !self.algorithms.contains(&header.alg) {
            return Err(ValidationError::Malformed(format!(
                "algorithm {:?} not accepted",
                header.alg
            )));
        }

        let jwk = self.signing_key(header.kid.as_deref()).await?;
        let key = DecodingKey::from_jwk(&jwk)?;

        let mut validation = Validation::new(header.alg);
        validation.algorithms = self.algorithms.clone();
        validation.set_audience(&[audience]);
        validation.set_issuer(self.issuers.as_slice());
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);

        let data = decode::<HashMap<String, Value>>(&token.id_token, &key, &validation)?;
        claims_from_payload(&data.claims)
    }
}

/// Extract `sub` (required, non-empty) and `email` (kept only when a string).
pub(crate) fn claims_from_payload(
    payload: &HashMap<String, Value>,
) -> Result<Claims, ValidationError> {
    let subject_id = payload
        .get("sub")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingSubject)?
        .to_string();

    let email = payload
        .get("email")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(Claims { subject_id, email })
}

// ============================================================================
// Tests
// ============================================================================
