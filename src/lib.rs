//! Card Session
//!
//! Session layer of the card search backend:
//! - OAuth2 login against third-party identity providers (Google)
//! - Identity token validation against the provider's signing keys
//! - Stateless sessions carried in an encrypted cookie
//! - Middleware guarding the protected REST routes

pub mod api;
pub mod auth;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{bail, Context, Result};
use axum_extra::extract::cookie::Key;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::ServerState;
use crate::auth::client::build_http_client;
use crate::auth::cookie::{should_set_secure, CookieSettings, DEFAULT_SESSION_COOKIE_NAME};
use crate::auth::{AuthService, ProviderRegistry};

/// Minimum decoded length of the cookie secret (encryption + signing halves).
pub const MIN_COOKIE_SECRET_BYTES: usize = 64;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub session: SessionYamlConfig,
    pub http: HttpYamlConfig,
    /// Providers keyed by the name used in routes and session tokens (e.g. "google")
    pub providers: HashMap<String, ProviderConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
    /// Public URL behind a reverse proxy (e.g. https://cards.example.com)
    pub public_url: Option<String>,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            public_url: None,
        }
    }
}

/// Session cookie configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionYamlConfig {
    pub cookie_name: String,
    /// Base64 key material for the private cookie jar, at least 64 bytes decoded
    pub cookie_secret: Option<String>,
    /// Force the `Secure` cookie flag on or off; derived from `public_url` when absent
    pub secure_cookie: Option<bool>,
}

impl Default for SessionYamlConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            cookie_secret: None,
            secure_cookie: None,
        }
    }
}

/// Outbound HTTP configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpYamlConfig {
    /// Timeout for every call to a provider (token, revoke, key set)
    pub provider_timeout_secs: u64,
}

impl Default for HttpYamlConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 5,
        }
    }
}

/// Provider family; decides the default endpoints and the token validator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
}

/// One OAuth provider entry.
///
/// Endpoint fields override the family defaults (self-hosted OIDC, tests).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,
    pub client_id: String,
    pub client_secret: String,
    /// Redirect URIs registered with the provider; the first is the default
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    pub scope: Option<String>,
    pub auth_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub revoke_endpoint: Option<String>,
    pub jwks_uri: Option<String>,
    /// Accepted id_token issuers (`iss`); the family's issuers when absent
    #[serde(default)]
    pub issuers: Option<Vec<String>>,
    /// Accepted id_token signing algorithms, e.g. `[RS256, ES256]`
    #[serde(default)]
    pub algorithms: Option<Vec<Algorithm>>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub public_url: Option<String>,
    pub cookie_name: String,
    pub cookie_secret: String,
    pub secure_cookie: Option<bool>,
    pub provider_timeout: Duration,
    pub providers: HashMap<String, ProviderConfig>,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file
    /// falls back to env vars / defaults; an unparseable one is an error.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let mut yaml = Self::load_yaml(yaml_path)?;

        // 2. Provider credentials from env
        apply_google_env(&mut yaml.providers);

        // 3. Build Config with env var overrides
        let cookie_secret = std::env::var("SESSION_COOKIE_SECRET")
            .ok()
            .or(yaml.session.cookie_secret)
            .filter(|s| !s.is_empty())
            .context("session.cookie_secret (or SESSION_COOKIE_SECRET) is required")?;

        let provider_timeout_secs = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(yaml.http.provider_timeout_secs);
        if provider_timeout_secs == 0 {
            bail!("http.provider_timeout_secs (or PROVIDER_TIMEOUT_SECS) must be at least 1");
        }

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            public_url: std::env::var("PUBLIC_URL").ok().or(yaml.server.public_url),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or(yaml.session.cookie_name),
            cookie_secret,
            secure_cookie: yaml.session.secure_cookie,
            provider_timeout: Duration::from_secs(provider_timeout_secs),
            providers: yaml.providers,
        })
    }

    /// Load and parse a YAML config file. Returns defaults when the file does not exist.
    fn load_yaml(yaml_path: Option<&Path>) -> Result<YamlConfig> {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let config = serde_yaml::from_str(&contents)
                    .with_context(|| format!("Failed to parse {}", path.display()))?;
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                Ok(YamlConfig::default())
            }
        }
    }

    /// Decode the cookie secret into the private jar's key.
    pub fn cookie_key(&self) -> Result<Key> {
        let bytes = STANDARD
            .decode(self.cookie_secret.trim())
            .context("Cookie secret is not valid base64")?;
        if bytes.len() < MIN_COOKIE_SECRET_BYTES {
            bail!(
                "Cookie secret must decode to at least {} bytes (got {})",
                MIN_COOKIE_SECRET_BYTES,
                bytes.len()
            );
        }
        Ok(Key::from(&bytes))
    }

    pub fn cookie_settings(&self) -> CookieSettings {
        CookieSettings {
            session_cookie_name: self.cookie_name.clone(),
            secure: should_set_secure(self.secure_cookie, self.public_url.as_deref()),
        }
    }
}

/// `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` / `GOOGLE_REDIRECT_URI` override
/// (or, when both credentials are set, create) the "google" provider entry.
fn apply_google_env(providers: &mut HashMap<String, ProviderConfig>) {
    let client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
    let client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok();
    let redirect_uri = std::env::var("GOOGLE_REDIRECT_URI").ok();

    if !providers.contains_key("google") {
        let (Some(client_id), Some(client_secret)) = (client_id.clone(), client_secret.clone())
        else {
            return;
        };
        providers.insert(
            "google".to_string(),
            ProviderConfig {
                kind: ProviderKind::Google,
                client_id,
                client_secret,
                redirect_uris: Vec::new(),
                scope: None,
                auth_endpoint: None,
                token_endpoint: None,
                revoke_endpoint: None,
                jwks_uri: None,
                issuers: None,
                algorithms: None,
            },
        );
    }

    if let Some(google) = providers.get_mut("google") {
        if let Some(id) = client_id {
            google.client_id = id;
        }
        if let Some(secret) = client_secret {
            google.client_secret = secret;
        }
        if let Some(uri) = redirect_uri {
            google.redirect_uris = vec![uri];
        }
    }
}

/// Build the shared server state: HTTP client, provider registry, auth service, cookie key.
pub fn build_state(config: &Config) -> Result<ServerState> {
    let http_client = build_http_client(config.provider_timeout)?;
    let registry = ProviderRegistry::from_config(&config.providers, http_client.clone())?;

    if registry.keys().is_empty() {
        tracing::warn!("No auth providers configured, nobody will be able to log in");
    }
    for key in registry.keys() {
        tracing::info!(provider = %key, "Auth provider registered");
    }

    Ok(ServerState {
        auth: Arc::new(AuthService::new(Arc::new(registry), http_client)),
        cookie_key: config.cookie_key()?,
        cookies: Arc::new(config.cookie_settings()),
    })
}

/// Bind the listener and serve until Ctrl-C.
pub async fn start_server(config: Config) -> Result<()> {
    let state = build_state(&config)?;
    let app = api::create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")
}

// ============================================================================
// Tests
// ============================================================================
