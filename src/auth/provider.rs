//! Provider descriptors and the read-only registry that resolves them by key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::AuthError;
use super::validator::{JwksValidator, TokenValidator};
use crate::{ProviderConfig, ProviderKind};

pub const GOOGLE_AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
pub const DEFAULT_SCOPE: &str = "openid email profile";

/// An OAuth2/OIDC provider the service can log users in with.
pub struct Provider {
    pub key: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub revoke_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// Redirect URIs the login flow may hand to the provider; the first is the default.
    pub redirect_uris: Vec<String>,
    pub validator: Arc<dyn TokenValidator>,
}

impl Provider {
    /// Build a provider from its config entry, filling in the family's defaults.
    pub fn from_config(key: &str, config: &ProviderConfig, http: reqwest::Client) -> Self {
        match config.kind {
            ProviderKind::Google => {
                let mut validator = JwksValidator::google(http);
                if let Some(ref uri) = config.jwks_uri {
                    validator = validator.with_jwks_uri(uri.clone());
                }
                if let Some(ref issuers) = config.issuers {
                    validator = validator.with_issuers(issuers.clone());
                }
                if let Some(ref algorithms) = config.algorithms {
                    validator = validator.with_algorithms(algorithms.clone());
                }

                Self {
                    key: key.to_string(),
                    authorization_endpoint: config
                        .auth_endpoint
                        .clone()
                        .unwrap_or_else(|| GOOGLE_AUTH_ENDPOINT.to_string()),
                    token_endpoint: config
                        .token_endpoint
                        .clone()
                        .unwrap_or_else(|| GOOGLE_TOKEN_ENDPOINT.to_string()),
                    revoke_endpoint: config
                        .revoke_endpoint
                        .clone()
                        .unwrap_or_else(|| GOOGLE_REVOKE_ENDPOINT.to_string()),
                    client_id: config.client_id.clone(),
                    client_secret: config.client_secret.clone(),
                    scope: config
                        .scope
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
                    redirect_uris: config.redirect_uris.clone(),
                    validator: Arc::new(validator),
                }
            }
        }
    }

    /// Pick the redirect URI for a login: the requested one if it is
    /// registered for this provider, the default when none is requested.
    pub fn resolve_redirect_uri(&self, requested: Option<&str>) -> Option<String> {
        match requested {
            Some(uri) => self
                .redirect_uris
                .iter()
                .find(|allowed| allowed.as_str() == uri)
                .cloned(),
            None => self.redirect_uris.first().cloned(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .field("revoke_endpoint", &self.revoke_endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Read-only map from provider key to provider, built once at startup.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<Provider>>,
}

impl ProviderRegistry {
    pub fn new(providers: impl IntoIterator<Item = Provider>) -> Self {
        Self {
            providers: providers
                .into_iter()
                .map(|p| (p.key.clone(), Arc::new(p)))
                .collect(),
        }
    }

    /// Build every configured provider.
    ///
    /// A provider without a registered redirect URI could never complete a
    /// login, so it is a configuration error.
    pub fn from_config(
        configs: &HashMap<String, ProviderConfig>,
        http: reqwest::Client,
    ) -> anyhow::Result<Self> {
        if let Some(key) = configs
            .iter()
            .find(|(_, config)| config.redirect_uris.is_empty())
            .map(|(key, _)| key)
        {
            anyhow::bail!("provider {:?} has no redirect_uris configured", key);
        }

        Ok(Self::new(
            configs
                .iter()
                .map(|(key, config)| Provider::from_config(key, config, http.clone())),
        ))
    }

    /// Exact, case-sensitive lookup.
    pub fn find(&self, key: &str) -> Result<Arc<Provider>, AuthError> {
        self.providers
            .get(key)
            .cloned()
            .ok_or_else(|| AuthError::NotSupported {
                key: key.to_string(),
            })
    }

    /// Registered provider keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.providers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

// ============================================================================
// Tests
// ============================================================================
