//! Caller identity extractors.
//!
//! The gateway identifies callers by the `x-user-email` header. It is
//! trusted as-is; only the admin endpoints check it against the allow-list.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use aloha_core::Email;
use aloha_platform::PlatformError;
use aloha_store::Store;

use crate::error::ApiError;
use crate::state::GatewayState;

/// Header carrying the caller's email.
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Read the caller's email from the headers, if present and non-blank.
#[must_use]
pub fn caller_email(headers: &HeaderMap) -> Option<Email> {
    headers
        .get(USER_EMAIL_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .and_then(|v| Email::parse(v).ok())
}

/// The caller's email, when the request carries one.
#[derive(Debug, Clone)]
pub struct CallerEmail(pub Option<Email>);

#[async_trait]
impl<St: Send + Sync> FromRequestParts<St> for CallerEmail {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        Ok(Self(caller_email(&parts.headers)))
    }
}

/// A caller on the admin allow-list. Rejects everyone else with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Email);

#[async_trait]
impl<S: Store + 'static> FromRequestParts<Arc<GatewayState<S>>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState<S>>,
    ) -> Result<Self, Self::Rejection> {
        let email = caller_email(&parts.headers);
        state.admin.require_admin(email.as_ref())?;

        email
            .map(Self)
            .ok_or_else(|| PlatformError::Unauthorized.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_trimmed_header() {
        let mut headers = HeaderMap::new();
        assert!(caller_email(&headers).is_none());

        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static(" a@b.c "));
        assert_eq!(caller_email(&headers).unwrap().as_str(), "a@b.c");

        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("   "));
        assert!(caller_email(&headers).is_none());
    }
}
