//! HTTP credential extraction for Axum
//!
//! Unlike a validating middleware, the extractor never rejects a request:
//! a missing token is reported by the discovery service itself so that the
//! error shape stays consistent across endpoints.

use super::WARP10_TOKEN_HEADER;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Extract the READ token from request headers
///
/// Lookup order:
/// 1. `X-Warp10-Token: <token>`
/// 2. `Authorization: Bearer <token>`
/// 3. `Authorization: Basic <base64(user:token)>` (the password is the token)
pub fn extract_read_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(WARP10_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }

    let authorization = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();

    if let Some(token) = authorization.strip_prefix("Bearer ") {
        let token = token.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    if let Some(encoded) = authorization.strip_prefix("Basic ") {
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let credentials = String::from_utf8(decoded).ok()?;
        let (_, password) = credentials.split_once(':')?;
        return (!password.is_empty()).then(|| password.to_string());
    }

    None
}

/// Axum extractor for the READ token
///
/// Resolves to an empty token when the request carries none.
///
/// ```ignore
/// async fn handler(ReadToken(token): ReadToken) -> Response {
///     // token is "" when no credential was supplied
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReadToken(pub String);

impl<S> axum::extract::FromRequestParts<S> for ReadToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(ReadToken(
            extract_read_token(&parts.headers).unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_warp10_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-warp10-token", HeaderValue::from_static("read-token-1"));
        headers.insert("authorization", HeaderValue::from_static("Bearer other"));

        assert_eq!(extract_read_token(&headers).as_deref(), Some("read-token-1"));
    }

    #[test]
    fn test_extract_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));

        assert_eq!(extract_read_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_extract_basic_password() {
        let mut headers = HeaderMap::new();
        // base64("grafana:secret-token")
        headers.insert(
            "authorization",
            HeaderValue::from_static("Basic Z3JhZmFuYTpzZWNyZXQtdG9rZW4="),
        );

        assert_eq!(
            extract_read_token(&headers).as_deref(),
            Some("secret-token")
        );
    }

    #[test]
    fn test_extract_basic_without_password() {
        let mut headers = HeaderMap::new();
        // base64("grafana:")
        headers.insert("authorization", HeaderValue::from_static("Basic Z3JhZmFuYTo="));

        assert_eq!(extract_read_token(&headers), None);
    }

    #[test]
    fn test_extract_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_read_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("x-warp10-token", HeaderValue::from_static("   "));
        assert_eq!(extract_read_token(&headers), None);
    }

    #[test]
    fn test_extract_unknown_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Digest xyz"));
        assert_eq!(extract_read_token(&headers), None);
    }

    #[tokio::test]
    async fn test_extractor_defaults_to_empty() {
        use axum::extract::FromRequestParts;

        let (mut parts, _) = axum::http::Request::builder()
            .uri("/api/v1/labels")
            .body(())
            .unwrap()
            .into_parts();

        let ReadToken(token) = ReadToken::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(token.is_empty());
    }
}
