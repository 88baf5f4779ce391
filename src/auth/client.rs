//! Provider-facing OAuth2 operations: authorization URL, code exchange,
//! token validation and revocation.
//!
//! Every network call goes through the shared `reqwest::Client`, which is
//! built with a fixed timeout (see [`build_http_client`]) so an unresponsive
//! provider cannot hold a request open indefinitely.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::StatusCode;
use serde::Deserialize;

use super::error::AuthError;
use super::provider::Provider;
use super::token::{Claims, Token};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the HTTP client shared by all provider calls.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .context("Failed to build provider HTTP client")
}

/// Longest provider error body kept for logs.
const MAX_ERROR_BODY_BYTES: usize = 2048;

/// Read an error response body, cut to [`MAX_ERROR_BODY_BYTES`].
async fn error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(body) => truncate_body(body),
        Err(_) => "no body".to_string(),
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}

/// Token endpoint response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    /// The provider key comes from the provider that was called, never from the body.
    fn into_token(self, provider_key: &str) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            id_token: self.id_token.unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            expires_in: self.expires_in.unwrap_or_default(),
            token_type: self.token_type.unwrap_or_default(),
            provider_key: provider_key.to_string(),
        }
    }
}

/// OAuth2 client scoped to a single provider.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<Provider>,
    http_client: reqwest::Client,
}

impl ProviderClient {
    pub fn new(provider: Arc<Provider>, http_client: reqwest::Client) -> Self {
        Self {
            provider,
            http_client,
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Compose the authorization URL the browser is sent to.
    ///
    /// `state` is passed through unmodified; correlating it on the way back
    /// is the caller's job.
    pub fn build_authorization_url(&self, state: &str, redirect_url: &str) -> String {
        let separator = if self.provider.authorization_endpoint.contains('?') {
            '&'
        } else {
            '?'
        };

        format!(
            "{}{}state={}&client_id={}&redirect_uri={}&scope={}&response_type=code&access_type=offline",
            self.provider.authorization_endpoint,
            separator,
            urlencoding::encode(state),
            urlencoding::encode(&self.provider.client_id),
            urlencoding::encode(redirect_url),
            urlencoding::encode(&self.provider.scope),
        )
    }

    /// Exchange an authorization code for tokens, then validate them.
    ///
    /// A token that the provider issued but that fails local validation is
    /// rejected here rather than on first use.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(Claims, Token), AuthError> {
        let response = self
            .http_client
            .post(&self.provider.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = error_body(response).await;
            return Err(AuthError::Exchange { status, body });
        }

        let token = response
            .json::<TokenResponse>()
            .await?
            .into_token(&self.provider.key);

        let claims = self.validate_token(&token).await?;

        tracing::debug!(
            provider = %self.provider.key,
            subject_id = %claims.subject_id,
            "Authorization code exchanged"
        );

        Ok((claims, token))
    }

    /// Verify a token with the provider's validator, using our client id as audience.
    pub async fn validate_token(&self, token: &Token) -> Result<Claims, AuthError> {
        let claims = self
            .provider
            .validator
            .validate(token, &self.provider.client_id)
            .await?;
        Ok(claims)
    }

    /// Ask the provider to stop honouring `token`.
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .http_client
            .post(&self.provider.revoke_endpoint)
            .form(&[("token", token)])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status();
            let body = error_body(response).await;
            return Err(AuthError::Revoke { status, body });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
