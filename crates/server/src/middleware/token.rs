//! Admin token extraction and the session cookie.
//!
//! A token may arrive in the `x-admin-token` header (per-tab sessions) or in
//! the `admin_token` cookie (whole-browser sessions). Both modes are
//! supported; the header wins when both are present.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use folio_core::AdminToken;

/// Header carrying a per-tab admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Cookie carrying a whole-browser admin token.
pub const ADMIN_TOKEN_COOKIE: &str = "admin_token";

/// Extract the admin token from the header, then the cookie.
///
/// A value that is not a well-formed token counts as absent.
#[must_use]
pub fn extract_token(headers: &HeaderMap) -> Option<AdminToken> {
    let from_header = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| AdminToken::parse(s).ok());

    from_header.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ADMIN_TOKEN_COOKIE)
            .and_then(|c| AdminToken::parse(c.value()).ok())
    })
}

/// Build the `admin_token` session cookie.
///
/// `HttpOnly`, `SameSite=Strict`, scoped to `/`, living as long as the
/// session itself.
#[must_use]
pub fn session_cookie(token: &AdminToken, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_TOKEN_COOKIE, token.as_str().to_owned()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Build a cookie that clears `admin_token` (`Max-Age=0`).
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((ADMIN_TOKEN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_header_token() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("tab-token"));

        assert_eq!(extract_token(&headers).unwrap().as_str(), "tab-token");
    }

    #[test]
    fn test_cookie_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; admin_token=cookie-token"),
        );

        assert_eq!(extract_token(&headers).unwrap().as_str(), "cookie-token");
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("tab-token"));
        headers.insert("cookie", HeaderValue::from_static("admin_token=cookie-token"));

        assert_eq!(extract_token(&headers).unwrap().as_str(), "tab-token");
    }

    #[test]
    fn test_malformed_or_missing_token_is_absent() {
        assert!(extract_token(&HeaderMap::new()).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("   "));
        assert!(extract_token(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let token = AdminToken::parse("abc123").unwrap();
        let cookie = session_cookie(&token, 3600, true).to_string();

        assert!(cookie.starts_with("admin_token=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));

        let cleared = clear_session_cookie(false).to_string();
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
