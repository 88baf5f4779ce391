//! Authentication route handlers: OAuth login, callback, logout, provider discovery.
//!
//! Endpoints:
//! - `GET  /auth/providers`: Lists the configured provider keys
//! - `GET  /auth/{provider}/login`: Returns the provider's authorization URL
//! - `POST /auth/{provider}/callback`: Exchanges the auth code and sets the session cookie
//! - `POST /auth/logout`: Revokes the session's token and clears the cookie

use crate::api::handlers::{AppError, ServerState};
use crate::auth::cookie::{generate_state, STATE_COOKIE_NAME};
use crate::auth::provider::Provider;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::{Deserialize, Serialize};

// ============================================================================
// Request / Response types
// ============================================================================

/// Response for GET /auth/providers
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
}

/// Query for GET /auth/{provider}/login
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect_uri: Option<String>,
}

/// Response for GET /auth/{provider}/login
#[derive(Serialize)]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

/// Request body for POST /auth/{provider}/callback
#[derive(Deserialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
    /// Must match the redirect URI used for the login; defaults to the provider's first.
    pub redirect_uri: Option<String>,
}

/// Response for POST /auth/{provider}/callback
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub subject_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/providers: Discovery endpoint for the login UI. Always public.
pub async fn list_providers(State(state): State<ServerState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.auth.registry().keys(),
    })
}

/// GET /auth/{provider}/login: Start the OAuth flow.
///
/// Generates the login state, keeps it in a short-lived encrypted cookie and
/// returns the URL the frontend should send the browser to.
pub async fn login(
    State(state): State<ServerState>,
    Path(provider_key): Path<String>,
    Query(query): Query<LoginQuery>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<AuthUrlResponse>), AppError> {
    let provider = state.auth.registry().find(&provider_key)?;
    let redirect_uri = registered_redirect_uri(&provider, query.redirect_uri.as_deref())?;

    let login_state = generate_state();
    let auth_url = state.auth.login(&provider_key, &login_state, &redirect_uri)?;

    tracing::debug!(provider = %provider_key, "Login started");

    let jar = jar.add(state.cookies.state_cookie(login_state));
    Ok((jar, Json(AuthUrlResponse { auth_url })))
}

/// POST /auth/{provider}/callback: Finish the OAuth flow.
///
/// 1. Checks the returned state against the login-state cookie
/// 2. Exchanges the code for tokens and validates them
/// 3. Sets the encrypted session cookie and drops the state cookie
pub async fn callback(
    State(state): State<ServerState>,
    Path(provider_key): Path<String>,
    jar: PrivateCookieJar,
    Json(req): Json<CallbackRequest>,
) -> Result<(PrivateCookieJar, Json<SessionResponse>), AppError> {
    let expected_state = jar.get(STATE_COOKIE_NAME).map(|c| c.value().to_string());
    if req.state.is_empty() || expected_state.as_deref() != Some(req.state.as_str()) {
        tracing::warn!(provider = %provider_key, "Login state mismatch");
        return Err(AppError::BadRequest("Login state mismatch".to_string()));
    }

    let provider = state.auth.registry().find(&provider_key)?;
    let redirect_uri = registered_redirect_uri(&provider, req.redirect_uri.as_deref())?;

    let (claims, cookie_value) = state
        .auth
        .exchange_code_with_claims(&provider_key, &req.code, &redirect_uri)
        .await?;

    tracing::info!(provider = %provider_key, subject_id = %claims.subject_id, "User logged in");

    let jar = jar
        .remove(state.cookies.clear_state_cookie())
        .add(state.cookies.session_cookie(cookie_value));

    Ok((
        jar,
        Json(SessionResponse {
            subject_id: claims.subject_id,
        }),
    ))
}

/// POST /auth/logout: Revoke the session at the provider and clear the cookie.
///
/// The cookie is cleared even when revocation fails.
pub async fn logout(State(state): State<ServerState>, jar: PrivateCookieJar) -> Response {
    let raw = jar
        .get(&state.cookies.session_cookie_name)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    let jar = jar.remove(state.cookies.clear_session_cookie());

    match state.auth.logout(&raw).await {
        Ok(outcome) => {
            tracing::info!(?outcome, "Logged out");
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(e) => (jar, AppError::from(e)).into_response(),
    }
}

fn registered_redirect_uri(provider: &Provider, requested: Option<&str>) -> Result<String, AppError> {
    provider.resolve_redirect_uri(requested).ok_or_else(|| {
        tracing::warn!(provider = %provider.key, ?requested, "Unregistered redirect_uri");
        AppError::BadRequest("redirect_uri is not registered for this provider".to_string())
    })
}
