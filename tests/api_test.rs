//! API integration tests
//!
//! Tests for the HTTP boundary: identity extraction, review submission,
//! follow/notification flows.

use anyhow::Result;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use cinelog::database::connection::setup_database;
use cinelog::database::entities::users;
use cinelog::server::app::create_app;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

/// Create a test server with a tempfile database, keeping the connection
/// for seeding.
async fn setup_test_server() -> Result<(TestServer, DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    let app = create_app(db.clone(), Some("*")).await?;
    let server = TestServer::new(app)?;

    Ok((server, db, temp_file))
}

async fn seed_user(db: &DatabaseConnection, name: &str) -> Result<users::Model> {
    let user = users::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(user)
}

fn as_user(id: i32) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&id.to_string()).unwrap(),
    )
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (server, _db, _temp_file) = setup_test_server().await?;

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);

    let body: Value = response.json();
    assert_eq!(body["service"], "cinelog-server");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_mutations_require_identity() -> Result<()> {
    let (server, _db, _temp_file) = setup_test_server().await?;

    let response = server
        .post("/api/v1/reviews")
        .json(&json!({ "movie_id": "42", "movie_title": "The Answer" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server.get("/api/v1/notifications").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_review_submission_flow() -> Result<()> {
    let (server, db, _temp_file) = setup_test_server().await?;
    let alice = seed_user(&db, "alice").await?;
    let (name, value) = as_user(alice.id);

    let payload = json!({
        "movie_id": "42",
        "movie_title": "The Answer",
        "movie_year": "1979",
        "rating": 8.5,
        "content": "Still holds up.",
        "tags": ["sci-fi"],
        "like_intent": true,
        "vote_average": 8.2
    });

    let response = server
        .post("/api/v1/reviews")
        .add_header(name.clone(), value.clone())
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let review: Value = response.json();
    assert_eq!(review["movie_id"], "42");
    assert_eq!(review["rating"], 8.5);
    let review_id = review["id"].as_i64().unwrap();

    // Resubmission updates in place.
    let mut resubmit = payload.clone();
    resubmit["rating"] = json!(9.0);
    resubmit["like_intent"] = json!(false);
    let response = server
        .post("/api/v1/reviews")
        .add_header(name.clone(), value.clone())
        .json(&resubmit)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated: Value = response.json();
    assert_eq!(updated["id"].as_i64().unwrap(), review_id);
    assert_eq!(updated["rating"], 9.0);

    let response = server
        .get(&format!("/api/v1/reviews/user/{}", alice.id))
        .await;
    let reviews: Vec<Value> = response.json();
    assert_eq!(reviews.len(), 1);

    let response = server
        .get(&format!("/api/v1/likes/user/{}", alice.id))
        .await;
    let likes: Vec<Value> = response.json();
    assert!(likes.is_empty());

    let response = server
        .get("/api/v1/reviews/movie/42/check")
        .add_header(name, value)
        .await;
    let status: Value = response.json();
    assert_eq!(status["has_review"], true);
    assert_eq!(status["rating"], 9.0);
    assert_eq!(status["review_id"].as_i64().unwrap(), review_id);

    Ok(())
}

#[tokio::test]
async fn test_invalid_rating_is_bad_request() -> Result<()> {
    let (server, db, _temp_file) = setup_test_server().await?;
    let alice = seed_user(&db, "alice").await?;
    let (name, value) = as_user(alice.id);

    let response = server
        .post("/api/v1/reviews")
        .add_header(name, value)
        .json(&json!({
            "movie_id": "42",
            "movie_title": "The Answer",
            "rating": -1.0
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_follow_and_notification_flow() -> Result<()> {
    let (server, db, _temp_file) = setup_test_server().await?;
    let alice = seed_user(&db, "alice").await?;
    let bob = seed_user(&db, "bob").await?;
    let (alice_header, alice_value) = as_user(alice.id);
    let (bob_header, bob_value) = as_user(bob.id);

    // Self-follow is rejected.
    let response = server
        .post(&format!("/api/v1/users/{}/follow", alice.id))
        .add_header(alice_header.clone(), alice_value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // Follow, twice; the second is a no-op.
    for _ in 0..2 {
        let response = server
            .post(&format!("/api/v1/users/{}/follow", bob.id))
            .add_header(alice_header.clone(), alice_value.clone())
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let response = server
        .get("/api/v1/notifications")
        .add_header(bob_header.clone(), bob_value.clone())
        .await;
    let notifications: Vec<Value> = response.json();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "FOLLOW");
    assert_eq!(notifications[0]["sender_name"], "alice");
    assert_eq!(notifications[0]["is_read"], false);
    let notification_id = notifications[0]["id"].as_i64().unwrap();

    // Only the recipient may mark it read.
    let response = server
        .put(&format!("/api/v1/notifications/{}/read", notification_id))
        .add_header(alice_header.clone(), alice_value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = server
        .put(&format!("/api/v1/notifications/{}/read", notification_id))
        .add_header(bob_header.clone(), bob_value.clone())
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let response = server
        .get("/api/v1/notifications")
        .add_header(bob_header, bob_value)
        .await;
    let notifications: Vec<Value> = response.json();
    assert_eq!(notifications[0]["is_read"], true);

    // Profile reflects the committed edge.
    let response = server
        .get(&format!("/api/v1/users/{}", bob.id))
        .add_header(alice_header, alice_value)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let profile: Value = response.json();
    assert_eq!(profile["followers_count"], 1);
    assert_eq!(profile["is_following"], true);

    Ok(())
}

#[tokio::test]
async fn test_profile_of_unknown_user_is_not_found() -> Result<()> {
    let (server, _db, _temp_file) = setup_test_server().await?;

    let response = server.get("/api/v1/users/9999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}
