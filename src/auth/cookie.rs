//! Session-cookie to bearer-token translation.
//!
//! Browsers cannot attach custom headers to a WebSocket handshake, so the
//! session token travels as the `authToken` cookie and the gateway turns it
//! into an `Authorization: Bearer` header before forwarding. The extraction
//! is a pure function over the `Cookie` header so the HTTP proxy path and
//! the upgrade path share one implementation.
//!
//! Anything malformed yields `None`: the request is forwarded
//! unauthenticated and the backend makes the authorization decision.

use axum::http::{header, HeaderMap};
use cookie::Cookie;

/// Name of the session cookie carrying the bearer token.
pub const AUTH_COOKIE_NAME: &str = "authToken";

/// Extract the bearer token from a raw `Cookie` header value.
///
/// Cookie names are matched exactly, never by substring, so a cookie named
/// `otherauthToken` cannot shadow the real one. The value is
/// percent-decoded.
pub fn bearer_token(cookie_header: &str) -> Option<String> {
    for cookie in Cookie::split_parse_encoded(cookie_header.to_owned()) {
        let Ok(cookie) = cookie else {
            // One unparseable pair does not invalidate the rest of the header.
            continue;
        };
        if cookie.name() == AUTH_COOKIE_NAME {
            let value = cookie.value().trim();
            if value.is_empty() {
                return None;
            }
            return Some(value.to_string());
        }
    }
    None
}

/// Extract the bearer token from a request header map.
pub fn bearer_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_token_among_other_cookies() {
        let token = bearer_token("foo=bar; authToken=abc%20def; other=baz");
        assert_eq!(token.as_deref(), Some("abc def"));
    }

    #[test]
    fn decodes_url_encoded_value() {
        let token = bearer_token("authToken=eyJ%2Fabc%3D%3D");
        assert_eq!(token.as_deref(), Some("eyJ/abc=="));
    }

    #[test]
    fn name_is_matched_exactly() {
        assert_eq!(bearer_token("otherauthToken=stolen"), None);
        assert_eq!(bearer_token("authTokenX=stolen"), None);
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert_eq!(bearer_token(""), None);
        assert_eq!(bearer_token("session=abc; theme=dark"), None);
    }

    #[test]
    fn empty_value_yields_none() {
        assert_eq!(bearer_token("authToken="), None);
        assert_eq!(bearer_token("authToken=; foo=bar"), None);
    }

    #[test]
    fn plain_value_passes_through() {
        assert_eq!(bearer_token("authToken=XYZ").as_deref(), Some("XYZ"));
    }

    #[test]
    fn reads_from_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("authToken=tok123"),
        );
        assert_eq!(bearer_token_from_headers(&headers).as_deref(), Some("tok123"));

        assert_eq!(bearer_token_from_headers(&HeaderMap::new()), None);
    }
}
