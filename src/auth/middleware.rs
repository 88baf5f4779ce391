//! Session middleware for protected Axum routes.
//!
//! Reads the encrypted session cookie, decodes the token, resolves its
//! provider and validates it, then injects an [`AuthenticatedIdentity`] into
//! the request extensions for downstream handlers.

use crate::api::handlers::{AppError, ServerState};
use crate::auth::error::AuthError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::PrivateCookieJar;

/// Middleware that requires a valid session cookie.
///
/// # Behavior
/// 1. Read the session cookie from the private jar → 401 if absent, empty or tampered
/// 2. Decode the token → 401 if malformed
/// 3. Resolve the token's provider → 401 if unknown
/// 4. Validate with the provider → 401 if expired or invalid
/// 5. Inject `AuthenticatedIdentity` into request extensions
///
/// Every rejection carries the same body; the cause is only logged.
pub async fn require_session(
    State(state): State<ServerState>,
    jar: PrivateCookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie = jar
        .get(&state.cookies.session_cookie_name)
        .filter(|c| !c.value().is_empty())
        .ok_or_else(|| {
            tracing::debug!(path = %req.uri().path(), "Request without session cookie");
            AppError::unauthorized()
        })?;

    let identity = state
        .auth
        .authenticate(cookie.value())
        .await
        .map_err(|e| {
            match &e {
                AuthError::NotSupported { key } => {
                    tracing::warn!(provider = %key, "Session names an unregistered provider")
                }
                other => tracing::warn!(error = %other, "Session rejected"),
            }
            AppError::unauthorized()
        })?;

    tracing::debug!(subject_id = %identity.subject_id, "Session authenticated");
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================
