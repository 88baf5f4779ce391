//! Error taxonomy for the session/authentication subsystem.
//!
//! Every variant is recovered at the HTTP boundary (`api::handlers::AppError`)
//! and turned into a detail-free response; the `Display` output below is for
//! server-side logs only.

use reqwest::StatusCode;
use thiserror::Error;

/// Reasons an identity token is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("token carries no id_token")]
    MissingIdToken,
    #[error("id_token expired")]
    Expired,
    #[error("id_token audience does not match client id")]
    WrongAudience,
    #[error("id_token issuer not accepted")]
    WrongIssuer,
    #[error("id_token signature invalid")]
    BadSignature,
    #[error("id_token signed with unknown key id {0:?}")]
    UnknownKey(Option<String>),
    #[error("id_token has no subject")]
    MissingSubject,
    #[error("id_token unparseable: {0}")]
    Malformed(String),
    #[error("provider key set unavailable: {0}")]
    KeySet(String),
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => ValidationError::Expired,
            ErrorKind::InvalidAudience => ValidationError::WrongAudience,
            ErrorKind::InvalidIssuer => ValidationError::WrongIssuer,
            ErrorKind::InvalidSignature => ValidationError::BadSignature,
            _ => ValidationError::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown provider key.
    #[error("provider not supported: {key:?}")]
    NotSupported { key: String },

    #[error("session cookie missing")]
    MissingCookie,

    #[error("session cookie malformed")]
    MalformedCookie,

    /// Token endpoint answered with a non-200 status.
    #[error("token exchange failed ({status}): {body}")]
    Exchange { status: StatusCode, body: String },

    /// Revoke endpoint answered with a non-200 status.
    #[error("token revocation failed ({status}): {body}")]
    Revoke { status: StatusCode, body: String },

    #[error("token rejected: {0}")]
    Validation(#[from] ValidationError),

    /// Provider unreachable, timed out, or answered with an undecodable body.
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AuthError {
    /// True for errors caused by the caller's credentials rather than the provider.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCookie | AuthError::MalformedCookie | AuthError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_error_kinds_map_to_validation_errors() {
        use jsonwebtoken::errors::{Error, ErrorKind};

        let expired: ValidationError = Error::from(ErrorKind::ExpiredSignature).into();
        assert_eq!(expired, ValidationError::Expired);

        let audience: ValidationError = Error::from(ErrorKind::InvalidAudience).into();
        assert_eq!(audience, ValidationError::WrongAudience);

        let issuer: ValidationError = Error::from(ErrorKind::InvalidIssuer).into();
        assert_eq!(issuer, ValidationError::WrongIssuer);

        let signature: ValidationError = Error::from(ErrorKind::InvalidSignature).into();
        assert_eq!(signature, ValidationError::BadSignature);

        let other: ValidationError = Error::from(ErrorKind::InvalidToken).into();
        assert!(matches!(other, ValidationError::Malformed(_)));
    }

    #[test]
    fn test_unauthorized_classification() {
        assert!(AuthError::MissingCookie.is_unauthorized());
        assert!(AuthError::MalformedCookie.is_unauthorized());
        assert!(AuthError::Validation(ValidationError::Expired).is_unauthorized());
        assert!(!AuthError::NotSupported { key: "x".into() }.is_unauthorized());
        assert!(!AuthError::Exchange {
            status: StatusCode::BAD_REQUEST,
            body: "invalid_grant".into()
        }
        .is_unauthorized());
    }

    #[test]
    fn test_not_supported_carries_key() {
        let err = AuthError::NotSupported {
            key: "github".into(),
        };
        assert!(err.to_string().contains("github"));
    }
}
