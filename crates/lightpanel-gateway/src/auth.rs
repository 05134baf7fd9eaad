//! Session cookie handling and the `SessionUser` extractor.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};

use crate::error::ApiError;
use crate::state::GatewayState;

/// A request carrying a live session cookie.
///
/// Extraction refreshes the session's activity time. Requests without a
/// valid session are rejected with a redirect to `/`.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// The session token from the cookie.
    pub token: String,
}

#[async_trait]
impl FromRequestParts<Arc<GatewayState>> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            cookie_value(&parts.headers, &state.config.cookie_name).ok_or(ApiError::Unauthorized)?;
        state.sessions.require(&token)?;
        Ok(Self { token })
    }
}

/// Find a cookie by name in the request headers.
#[must_use]
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` header issuing a session.
///
/// # Errors
///
/// Returns an error if the cookie name or token contains invalid header bytes.
pub fn session_cookie(name: &str, token: &str) -> Result<(axum::http::HeaderName, HeaderValue), ApiError> {
    let value = format!("{name}={token}; HttpOnly; SameSite=Strict; Path=/");
    header_value(&value).map(|v| (SET_COOKIE, v))
}

/// `Set-Cookie` header removing the session cookie.
///
/// # Errors
///
/// Returns an error if the cookie name contains invalid header bytes.
pub fn clear_cookie(name: &str) -> Result<(axum::http::HeaderName, HeaderValue), ApiError> {
    let value = format!("{name}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0");
    header_value(&value).map(|v| (SET_COOKIE, v))
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value).map_err(|e| ApiError::Internal(format!("invalid cookie: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn finds_named_cookie() {
        let h = headers(&["theme=dark; session=abc123; lang=en"]);
        assert_eq!(cookie_value(&h, "session").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(&h, "lang").as_deref(), Some("en"));
        assert_eq!(cookie_value(&h, "missing"), None);
    }

    #[test]
    fn searches_every_cookie_header() {
        let h = headers(&["a=1", "session=xyz"]);
        assert_eq!(cookie_value(&h, "session").as_deref(), Some("xyz"));
    }

    #[test]
    fn empty_value_is_absent() {
        let h = headers(&["session="]);
        assert_eq!(cookie_value(&h, "session"), None);
    }

    #[test]
    fn cookie_attributes() {
        let (name, value) = session_cookie("session", "tok").unwrap();
        assert_eq!(name, SET_COOKIE);
        let value = value.to_str().unwrap();
        assert!(value.starts_with("session=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Strict"));

        let (_, cleared) = clear_cookie("session").unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
