use crate::config::app_config::CookieConfig;
use axum::http::{header, HeaderMap};

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Builds and reads the session cookies
#[derive(Clone)]
pub struct CookieService {
    config: CookieConfig,
}

impl CookieService {
    pub fn new(config: CookieConfig) -> Self {
        Self { config }
    }

    fn build(&self, name: &str, value: &str, max_age_seconds: i64) -> String {
        let secure = if self.config.secure { "; Secure" } else { "" };
        format!(
            "{}={}; HttpOnly{}; SameSite=Lax; Path=/; Max-Age={}",
            name, value, secure, max_age_seconds
        )
    }

    /// `Set-Cookie` values for a freshly issued token pair
    pub fn session_cookies(&self, access_token: &str, refresh_token: &str) -> [String; 2] {
        [
            self.build(ACCESS_TOKEN_COOKIE, access_token, self.config.access_max_age_seconds),
            self.build(REFRESH_TOKEN_COOKIE, refresh_token, self.config.refresh_max_age_seconds),
        ]
    }

    /// `Set-Cookie` values that make the browser drop both tokens
    pub fn cleared_cookies(&self) -> [String; 2] {
        [
            self.build(ACCESS_TOKEN_COOKIE, "", 0),
            self.build(REFRESH_TOKEN_COOKIE, "", 0),
        ]
    }

    /// Extract a named cookie from a `Cookie` header value
    pub fn extract_from_header(cookie_header: &str, name: &str) -> Option<String> {
        cookie_header
            .split(';')
            .filter_map(|cookie| cookie.trim().split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Extract a named cookie from any `Cookie` header on the request
    pub fn extract(headers: &HeaderMap, name: &str) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|value| Self::extract_from_header(value, name))
    }
}
