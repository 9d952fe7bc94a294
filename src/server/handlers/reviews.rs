use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;

use super::error_response;
use crate::database::entities::{likes, reviews};
use crate::server::app::AppState;
use crate::server::auth::CurrentUser;
use crate::services::interactions::{InteractionService, ReviewStatus, SubmitReview};

pub async fn submit_review(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<SubmitReview>,
) -> Result<Json<reviews::Model>, (StatusCode, Json<Value>)> {
    let service = InteractionService::new(state.db.clone());
    let review = service
        .submit_review(user_id, &payload)
        .await
        .map_err(error_response)?;

    Ok(Json(review))
}

pub async fn check_review_status(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(movie_id): Path<String>,
) -> Result<Json<ReviewStatus>, (StatusCode, Json<Value>)> {
    let service = InteractionService::new(state.db.clone());
    let status = service
        .check_review_status(user_id, &movie_id)
        .await
        .map_err(error_response)?;

    Ok(Json(status))
}

pub async fn list_user_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<reviews::Model>>, (StatusCode, Json<Value>)> {
    let service = InteractionService::new(state.db.clone());
    let reviews = service
        .reviews_for_user(user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(reviews))
}

pub async fn list_user_likes(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<likes::Model>>, (StatusCode, Json<Value>)> {
    let service = InteractionService::new(state.db.clone());
    let likes = service
        .likes_for_user(user_id)
        .await
        .map_err(error_response)?;

    Ok(Json(likes))
}
