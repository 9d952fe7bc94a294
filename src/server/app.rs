use anyhow::Result;
use axum::{
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{health, notifications, reviews, users};
use super::ws;
use crate::services::dispatch::DeliveryDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub dispatcher: DeliveryDispatcher,
}

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState {
        db,
        dispatcher: DeliveryDispatcher::new(),
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<axum::http::HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        // Health check endpoint
        .route("/health", get(health::health_check))
        // API v1 routes
        .nest("/api/v1", api_v1_routes())
        // Real-time notification stream
        .route("/ws/notifications", get(ws::notification_socket))
        // Add middleware
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(state);

    Ok(app)
}

fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Review routes
        .route("/reviews", post(reviews::submit_review))
        .route(
            "/reviews/movie/:movie_id/check",
            get(reviews::check_review_status),
        )
        .route("/reviews/user/:user_id", get(reviews::list_user_reviews))
        .route("/likes/user/:user_id", get(reviews::list_user_likes))
        // User routes
        .route("/users/:id", get(users::get_user_profile))
        .route("/users/:id/follow", post(users::follow_user))
        .route("/users/:id/unfollow", post(users::unfollow_user))
        // Notification routes
        .route("/notifications", get(notifications::list_notifications))
        .route(
            "/notifications/:id/read",
            put(notifications::mark_notification_read),
        )
}
