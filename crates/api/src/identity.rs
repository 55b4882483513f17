//! Caller identity extracted from the `X-User-Email` header.
//!
//! The backend trusts an upstream gateway to authenticate users and
//! forward the verified address. Requests without the header are
//! rejected before any handler logic runs.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller's email address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEmail(pub String);

impl UserEmail {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for UserEmail
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User-Email header".to_string()))?;

        Ok(UserEmail(email.to_string()))
    }
}
