//! Minimal cookie handling for session tokens.
//!
//! Reads a named cookie out of the `Cookie` request header and builds
//! `Set-Cookie` values for issuing and clearing it.

use axum::http::{HeaderMap, HeaderValue, header};
use std::time::Duration;

/// Value of the cookie called `name`, if the request carries one.
///
/// All `Cookie` headers are searched; the first non-empty match wins.
#[must_use]
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// `Set-Cookie` builder for an HTTP-only, `SameSite=Strict` cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
}

impl SessionCookie {
    /// Cookie named `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), secure: false }
    }

    /// Add the `Secure` attribute.
    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Name of the cookie.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header value that stores `value` for `max_age`.
    #[must_use]
    pub fn issue(&self, value: &str, max_age: Duration) -> Option<HeaderValue> {
        self.render(value, max_age.as_secs())
    }

    /// Header value that removes the cookie.
    #[must_use]
    pub fn clear(&self) -> Option<HeaderValue> {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age_secs: u64) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Strict",
            self.name
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}
