use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use super::error_response;
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::follows::{FollowService, UserProfile};

pub async fn get_user_profile(
    State(state): State<AppState>,
    viewer: Option<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<UserProfile>, (StatusCode, Json<Value>)> {
    let service = FollowService::new(state.db.clone(), state.dispatcher.clone());
    let profile = service
        .profile(id, viewer.map(|CurrentUser(id)| id))
        .await
        .map_err(error_response)?;

    Ok(Json(profile))
}

pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let service = FollowService::new(state.db.clone(), state.dispatcher.clone());
    service.follow(user_id, id).await.map_err(error_response)?;

    Ok(Json(json!({ "message": "Followed successfully" })))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let service = FollowService::new(state.db.clone(), state.dispatcher.clone());
    service
        .unfollow(user_id, id)
        .await
        .map_err(error_response)?;

    Ok(Json(json!({ "message": "Unfollowed successfully" })))
}
