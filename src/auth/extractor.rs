//! AuthUser extractor for Axum handlers.
//!
//! Reads the identity the `require_session` middleware placed in the request
//! extensions.

use crate::api::handlers::AppError;
use crate::auth::service::AuthenticatedIdentity;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Authenticated caller of a protected handler.
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.subject_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject_id: String,
}

impl From<AuthenticatedIdentity> for AuthUser {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            subject_id: identity.subject_id,
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = parts.extensions.get::<AuthenticatedIdentity>().cloned();

        async move {
            // Only reachable when a handler that needs a session was mounted
            // outside the session middleware.
            identity.map(AuthUser::from).ok_or_else(|| {
                tracing::error!("AuthUser extracted on a route without require_session");
                AppError::Internal(anyhow::anyhow!("missing authenticated identity"))
            })
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
