use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::error_response;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::notifications::{NotificationService, NotificationView};

pub async fn list_notifications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<NotificationView>>, (StatusCode, Json<Value>)> {
    let service = NotificationService::new(state.db.clone());
    let notifications = service
        .list_for_recipient(user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(notifications))
}

pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let service = NotificationService::new(state.db.clone());
    service
        .mark_read(id, user_id)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}
