//! Optional shared-secret bearer authentication.
//!
//! When no token is configured every request passes. When one is configured,
//! requests must carry `Authorization: Bearer <token>` with a matching value.

use crate::error::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use subtle::ConstantTimeEq;

#[derive(Clone, Default)]
pub struct BearerAuthConfig {
    token: Option<Arc<Secret<String>>>,
}

impl BearerAuthConfig {
    /// Build from an optional token. Blank tokens disable authentication.
    pub fn new(token: Option<Secret<String>>) -> Self {
        let token = token
            .filter(|t| !t.expose_secret().trim().is_empty())
            .map(Arc::new);
        Self { token }
    }

    pub fn disabled() -> Self {
        Self { token: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Check the presented credentials against the configured token.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let Some(expected) = &self.token else {
            return Ok(());
        };

        let presented = extract_bearer_token(headers).ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("Missing bearer token"))
        })?;

        let expected = expected.expose_secret().as_bytes();
        let presented = presented.as_bytes();

        if expected.len() != presented.len() || !bool::from(expected.ct_eq(presented)) {
            return Err(AppError::Unauthorized(anyhow::anyhow!("Invalid bearer token")));
        }

        Ok(())
    }
}

impl std::fmt::Debug for BearerAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuthConfig")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Pull the credential out of an `Authorization: Bearer ...` header.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, credentials) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credentials = credentials.trim();
    (!credentials.is_empty()).then_some(credentials)
}

pub async fn bearer_auth_middleware<S>(
    State(state): State<S>,
    request: Request,
    next: Next,
) -> Result<Response, AppError>
where
    S: AsRef<BearerAuthConfig> + Clone + Send + Sync + 'static,
{
    if let Err(e) = state.as_ref().authorize(request.headers()) {
        tracing::warn!(
            path = %request.uri().path(),
            reason = %e,
            "Rejected unauthenticated request"
        );
        return Err(e);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn config(token: &str) -> BearerAuthConfig {
        BearerAuthConfig::new(Some(Secret::new(token.to_string())))
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token(&headers_with("Bearer abc123")),
            Some("abc123")
        );
        assert_eq!(
            extract_bearer_token(&headers_with("bearer abc123")),
            Some("abc123")
        );
        assert_eq!(extract_bearer_token(&headers_with("Basic abc123")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_disabled_allows_everything() {
        let auth = BearerAuthConfig::disabled();
        assert!(!auth.is_enabled());
        assert!(auth.authorize(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_blank_token_disables_auth() {
        let auth = config("   ");
        assert!(!auth.is_enabled());
    }

    #[test]
    fn test_matching_token_is_accepted() {
        let auth = config("secrettoken");
        assert!(auth.authorize(&headers_with("Bearer secrettoken")).is_ok());
    }

    #[test]
    fn test_missing_or_wrong_token_is_rejected() {
        let auth = config("secrettoken");
        assert!(matches!(
            auth.authorize(&HeaderMap::new()),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authorize(&headers_with("Bearer secrettokem")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.authorize(&headers_with("Bearer secret")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
