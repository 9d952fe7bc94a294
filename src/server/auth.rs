use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::Json,
};
use serde_json::Value;

use crate::errors::CoreError;
use crate::server::handlers::error_response;

/// Acting identity resolved by the upstream authentication collaborator
/// and forwarded as the `x-user-id` header. Requests without one are
/// rejected before any handler runs.
pub struct CurrentUser(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i32>().ok())
            .map(CurrentUser)
            .ok_or_else(|| error_response(CoreError::Unauthenticated))
    }
}
