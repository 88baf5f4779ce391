//! Session and login-state cookie builders.
//!
//! Both cookies travel through `PrivateCookieJar`, which encrypts and
//! authenticates their values with the server key, so the session cookie's
//! encoded token is opaque to the browser and tamper-evident.
//!
//! Cookie attributes: `HttpOnly; SameSite=Lax; Path=/; [Secure]`
//! - `HttpOnly`: not readable from JavaScript
//! - `SameSite=Lax`: not sent on cross-site POST
//! - `Secure`: HTTPS only (omitted for plain-http localhost setups)

use axum_extra::extract::cookie::{Cookie, SameSite};
use std::time::Duration;

use super::token::CookieValue;

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "SESSION";

/// Cookie carrying the OAuth `state` between login and callback.
pub const STATE_COOKIE_NAME: &str = "oauth_state";

/// How long a login may take between redirect and callback.
pub const STATE_COOKIE_MAX_AGE: Duration = Duration::from_secs(600);

/// Cookie settings resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub session_cookie_name: String,
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            secure: false,
        }
    }
}

impl CookieSettings {
    /// Session cookie; lives for the browser session.
    pub fn session_cookie(&self, value: CookieValue) -> Cookie<'static> {
        base_cookie(self.session_cookie_name.clone(), value.into_inner(), self.secure)
    }

    /// Removal cookie for the session; attributes must match the original.
    pub fn clear_session_cookie(&self) -> Cookie<'static> {
        base_cookie(self.session_cookie_name.clone(), String::new(), self.secure)
    }

    pub fn state_cookie(&self, state: String) -> Cookie<'static> {
        let mut cookie = base_cookie(STATE_COOKIE_NAME.to_string(), state, self.secure);
        cookie.set_max_age(time::Duration::seconds(STATE_COOKIE_MAX_AGE.as_secs() as i64));
        cookie
    }

    pub fn clear_state_cookie(&self) -> Cookie<'static> {
        base_cookie(STATE_COOKIE_NAME.to_string(), String::new(), self.secure)
    }
}

fn base_cookie(name: String, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(secure)
        .build()
}

/// Generate a random 128-bit login state encoded as hex (32 chars).
pub fn generate_state() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Whether cookies should carry the `Secure` flag.
///
/// An explicit setting wins; otherwise HTTPS public URLs get it.
pub fn should_set_secure(explicit: Option<bool>, public_url: Option<&str>) -> bool {
    explicit.unwrap_or_else(|| public_url.is_some_and(|url| url.starts_with("https://")))
}

// ============================================================================
// Tests
// ============================================================================
