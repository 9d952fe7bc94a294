pub mod health;
pub mod notifications;
pub mod reviews;
pub mod users;

use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::error;

use crate::errors::CoreError;

/// Map a service error onto the HTTP surface. Storage failures are logged
/// here and surfaced as an opaque 500.
pub(crate) fn error_response(err: CoreError) -> (StatusCode, Json<Value>) {
    let status = match &err {
        CoreError::Validation(_) | CoreError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        CoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden => StatusCode::FORBIDDEN,
        CoreError::NotFound(_) => StatusCode::NOT_FOUND,
        CoreError::Conflict => StatusCode::CONFLICT,
        CoreError::Database(db_err) => {
            error!("database error: {}", db_err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let message = match &err {
        CoreError::Database(_) => "internal error".to_string(),
        other => other.to_string(),
    };

    (status, Json(json!({ "error": message })))
}
