use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

/// Header carrying the id of the participant performing the request.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Participant performing the request, read from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser(pub Uuid);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing user header `X-User-Id`".into()))?;

        Uuid::parse_str(raw.trim())
            .map(ActingUser)
            .map_err(|_| AppError::Unauthorized("malformed user header `X-User-Id`".into()))
    }
}
