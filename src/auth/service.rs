//! Auth application service: login redirect, code exchange, logout and
//! cookie authentication, composed from the registry, the provider client
//! and the token codec.

use std::sync::Arc;

use super::client::ProviderClient;
use super::error::AuthError;
use super::provider::ProviderRegistry;
use super::token::{self, Claims, CookieValue};

/// Identity attached to a request that passed the session middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub subject_id: String,
}

/// What a logout actually did. Both outcomes are successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    /// The provider revoked the session's token.
    Revoked,
    /// The cookie was missing, undecodable or named an unregistered provider.
    NothingToRevoke,
}

pub struct AuthService {
    registry: Arc<ProviderRegistry>,
    http_client: reqwest::Client,
}

impl AuthService {
    pub fn new(registry: Arc<ProviderRegistry>, http_client: reqwest::Client) -> Self {
        Self {
            registry,
            http_client,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolve the provider for `key` and wrap it in a client.
    pub fn client(&self, key: &str) -> Result<ProviderClient, AuthError> {
        let provider = self.registry.find(key)?;
        Ok(ProviderClient::new(provider, self.http_client.clone()))
    }

    /// Authorization URL for `key`. `state` is generated and stored by the caller.
    pub fn login(&self, key: &str, state: &str, redirect_url: &str) -> Result<String, AuthError> {
        Ok(self.client(key)?.build_authorization_url(state, redirect_url))
    }

    /// Exchange an authorization code and encode the resulting session.
    pub async fn exchange_code(
        &self,
        key: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<CookieValue, AuthError> {
        let (_, cookie) = self.exchange_code_with_claims(key, code, redirect_uri).await?;
        Ok(cookie)
    }

    /// Like [`exchange_code`](Self::exchange_code), also returning the verified claims.
    pub async fn exchange_code_with_claims(
        &self,
        key: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<(Claims, CookieValue), AuthError> {
        let client = self.client(key)?;
        let (claims, token) = client.exchange_code(code, redirect_uri).await?;
        Ok((claims, token::encode(&token)))
    }

    /// Revoke the session carried by `cookie`.
    ///
    /// A missing or undecodable cookie, or one naming an unregistered
    /// provider, is not a failure: there is nothing to revoke and no provider
    /// is contacted.
    pub async fn logout(&self, cookie: &str) -> Result<LogoutOutcome, AuthError> {
        let token = match token::decode(cookie) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(reason = %e, "Logout without a decodable session");
                return Ok(LogoutOutcome::NothingToRevoke);
            }
        };

        // A provider removed from the registry can no longer be asked to revoke.
        let client = match self.client(&token.provider_key) {
            Ok(client) => client,
            Err(AuthError::NotSupported { key }) => {
                tracing::warn!(provider = %key, "Logout for a session of an unregistered provider");
                return Ok(LogoutOutcome::NothingToRevoke);
            }
            Err(e) => return Err(e),
        };

        // Revoking the refresh token ends the whole grant; fall back to the access token.
        let revocable = if token.refresh_token.is_empty() {
            &token.access_token
        } else {
            &token.refresh_token
        };
        if revocable.is_empty() {
            return Ok(LogoutOutcome::NothingToRevoke);
        }

        client.revoke_token(revocable).await?;
        Ok(LogoutOutcome::Revoked)
    }

    /// Decode, resolve and validate a session cookie.
    pub async fn authenticate(&self, cookie: &str) -> Result<AuthenticatedIdentity, AuthError> {
        let token = token::decode(cookie)?;
        let client = self.client(&token.provider_key)?;
        let claims = client.validate_token(&token).await?;

        Ok(AuthenticatedIdentity {
            subject_id: claims.subject_id,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
