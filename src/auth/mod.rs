//! Authentication module: OAuth login + encrypted session cookies
//!
//! Provides:
//! - Session token model and cookie codec (`token`)
//! - Provider descriptors and registry (`provider`)
//! - Identity token verification strategies (`validator`)
//! - Provider-facing OAuth2 calls (`client`)
//! - Login / exchange / logout orchestration (`service`)
//! - Session middleware and handler extractor (`middleware`, `extractor`)

pub mod client;
pub mod cookie;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod provider;
pub mod service;
pub mod token;
pub mod validator;

pub use error::{AuthError, ValidationError};
pub use provider::{Provider, ProviderRegistry};
pub use service::{AuthService, AuthenticatedIdentity, LogoutOutcome};
pub use token::{Claims, CookieValue, Token};
pub use validator::{JwksValidator, TokenValidator};
