//! Shared server state, error-to-response mapping and the non-auth handlers.

use crate::auth::cookie::CookieSettings;
use crate::auth::error::AuthError;
use crate::auth::extractor::AuthUser;
use crate::auth::service::AuthService;
use axum::{extract::FromRef, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::Key;
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService>,
    /// Key the private cookie jar encrypts and authenticates cookies with
    pub cookie_key: Key,
    pub cookies: Arc<CookieSettings>,
}

impl FromRef<ServerState> for Key {
    fn from_ref(state: &ServerState) -> Self {
        state.cookie_key.clone()
    }
}

// ============================================================================
// Health check
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health: liveness only; provider reachability is not probed.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Protected resources
// ============================================================================

/// Response for GET /api/me
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub subject_id: String,
}

/// GET /api/me: the authenticated caller's identity.
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        subject_id: user.subject_id,
    })
}

// ============================================================================
// Error handling
// ============================================================================

const UNAUTHORIZED_MESSAGE: &str = "Authentication required";
const PROVIDER_FAILURE_MESSAGE: &str = "Authentication provider request failed";

/// Application error type
///
/// Messages end up in response bodies; causes that must stay server-side are
/// logged before conversion.
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    BadGateway(String),
}

impl AppError {
    /// The one 401 every authentication failure turns into.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotSupported { key } => {
                tracing::debug!(provider = %key, "Unsupported provider requested");
                AppError::NotFound("Unsupported provider".to_string())
            }
            e if e.is_unauthorized() => {
                tracing::warn!(error = %e, "Authentication rejected");
                AppError::unauthorized()
            }
            e => {
                tracing::error!(error = %e, "Authentication provider call failed");
                AppError::BadGateway(PROVIDER_FAILURE_MESSAGE.to_string())
            }
        }
    }
}
