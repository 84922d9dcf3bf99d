//! Caller identity extraction. Authentication happens upstream; by the time
//! a request reaches this service the gateway has resolved the caller into
//! an opaque id carried in a trusted header.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header installed by the upstream gateway carrying the resolved caller id.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Opaque identity of the caller. Whether the caller is the host of a given
/// session is decided server-side against the session, never by the client.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing `{IDENTITY_HEADER}` header"))
            })?;

        Ok(Caller(value.to_string()))
    }
}
