//! Review/like consistency tests
//!
//! Tests for the interaction coordinator: upsert semantics, duplicate
//! healing, and like reconciliation.

use anyhow::Result;
use chrono::Utc;
use cinelog::database::entities::{likes, reviews, users};
use cinelog::database::setup_database;
use cinelog::errors::{is_unique_violation, CoreError};
use cinelog::services::interactions::{InteractionService, SubmitReview};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
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

fn submission(movie_id: &str) -> SubmitReview {
    SubmitReview {
        movie_id: movie_id.to_string(),
        movie_title: "The Answer".to_string(),
        movie_year: Some("1979".to_string()),
        poster_url: Some("/posters/answer.jpg".to_string()),
        content: Some("Still holds up.".to_string()),
        rating: Some(8.5),
        is_rewatch: false,
        contains_spoiler: false,
        watched_date: None,
        tags: Some(vec!["sci-fi".to_string(), "rewatchable".to_string()]),
        like_intent: None,
        vote_average: None,
        release_date: None,
    }
}

async fn reviews_for(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: &str,
) -> Result<Vec<reviews::Model>> {
    let rows = reviews::Entity::find()
        .filter(reviews::Column::UserId.eq(user_id))
        .filter(reviews::Column::MovieId.eq(movie_id))
        .all(db)
        .await?;
    Ok(rows)
}

async fn likes_for(
    db: &DatabaseConnection,
    user_id: i32,
    movie_id: &str,
) -> Result<Vec<likes::Model>> {
    let rows = likes::Entity::find()
        .filter(likes::Column::UserId.eq(user_id))
        .filter(likes::Column::MovieId.eq(movie_id))
        .all(db)
        .await?;
    Ok(rows)
}

#[tokio::test]
async fn test_submit_creates_then_updates_one_row() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let created = service.submit_review(user.id, &submission("42")).await?;
    assert_eq!(created.rating, Some(8.5));
    assert_eq!(created.tag_list(), vec!["sci-fi", "rewatchable"]);

    let mut resubmit = submission("42");
    resubmit.rating = Some(9.0);
    let updated = service.submit_review(user.id, &resubmit).await?;

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.rating, Some(9.0));
    assert_eq!(reviews_for(&db, user.id, "42").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_review_and_like_stay_consistent_across_resubmission() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut first = submission("42");
    first.rating = Some(8.5);
    first.like_intent = Some(true);
    first.vote_average = Some(8.2);
    service.submit_review(user.id, &first).await?;

    assert_eq!(reviews_for(&db, user.id, "42").await?.len(), 1);
    let likes = likes_for(&db, user.id, "42").await?;
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].vote_average, 8.2);

    let mut second = submission("42");
    second.rating = Some(9.0);
    second.like_intent = Some(false);
    service.submit_review(user.id, &second).await?;

    let remaining = reviews_for(&db, user.id, "42").await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].rating, Some(9.0));
    assert!(likes_for(&db, user.id, "42").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_like_intent_is_idempotent() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut request = submission("42");
    request.like_intent = Some(true);

    service.submit_review(user.id, &request).await?;
    service.submit_review(user.id, &request).await?;

    assert_eq!(likes_for(&db, user.id, "42").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_like_intent_false_without_like_is_noop() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut request = submission("42");
    request.like_intent = Some(false);
    service.submit_review(user.id, &request).await?;

    assert!(likes_for(&db, user.id, "42").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_absent_like_intent_leaves_like_untouched() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut with_like = submission("42");
    with_like.like_intent = Some(true);
    service.submit_review(user.id, &with_like).await?;

    // No intent this time: the like must survive the resubmission.
    service.submit_review(user.id, &submission("42")).await?;

    assert_eq!(likes_for(&db, user.id, "42").await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_like_snapshot_falls_back_to_review_year() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut request = submission("42");
    request.like_intent = Some(true);
    request.vote_average = None;
    request.release_date = None;
    service.submit_review(user.id, &request).await?;

    let likes = likes_for(&db, user.id, "42").await?;
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].vote_average, 0.0);
    assert_eq!(likes[0].release_date, Some("1979".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_rows_are_healed_on_write() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;

    // Recreate the legacy shape: no unique key, several rows per key.
    db.execute_unprepared("DROP INDEX \"uq-reviews-user-movie\"")
        .await?;

    let now = Utc::now();
    let mut first_id = None;
    for n in 0..3 {
        let row = reviews::ActiveModel {
            user_id: Set(user.id),
            movie_id: Set("42".to_string()),
            movie_title: Set(format!("The Answer (copy {})", n)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        first_id.get_or_insert(row.id);
    }

    let service = InteractionService::new(db.clone());
    let healed = service.submit_review(user.id, &submission("42")).await?;

    let remaining = reviews_for(&db, user.id, "42").await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first_id.unwrap());
    assert_eq!(healed.movie_title, "The Answer");

    Ok(())
}

#[tokio::test]
async fn test_unique_key_rejects_second_insert() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;

    let now = Utc::now();
    let row = reviews::ActiveModel {
        user_id: Set(user.id),
        movie_id: Set("42".to_string()),
        movie_title: Set("The Answer".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    row.clone().insert(&db).await?;

    // A second raw insert on the same key loses to the constraint; this is
    // the backstop for the check-then-act window.
    let err = row.insert(&db).await.unwrap_err();
    assert!(is_unique_violation(&err));
    assert!(matches!(CoreError::from_db(err), CoreError::Conflict));

    Ok(())
}

#[tokio::test]
async fn test_invalid_rating_rejected_before_write() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let mut request = submission("42");
    request.rating = Some(10.5);
    let err = service.submit_review(user.id, &request).await.unwrap_err();

    assert!(matches!(err, CoreError::Validation(_)));
    assert!(reviews_for(&db, user.id, "42").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_optional_fields_survive_partial_resubmission() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    service.submit_review(user.id, &submission("42")).await?;

    let sparse = SubmitReview {
        movie_id: "42".to_string(),
        movie_title: "The Answer".to_string(),
        movie_year: None,
        poster_url: None,
        content: None,
        rating: None,
        is_rewatch: true,
        contains_spoiler: false,
        watched_date: None,
        tags: None,
        like_intent: None,
        vote_average: None,
        release_date: None,
    };
    let updated = service.submit_review(user.id, &sparse).await?;

    // Optional scalars keep their previous values; structured fields take
    // the caller's value as sent, so the tags were cleared.
    assert_eq!(updated.content, Some("Still holds up.".to_string()));
    assert_eq!(updated.rating, Some(8.5));
    assert_eq!(updated.movie_year, Some("1979".to_string()));
    assert!(updated.is_rewatch);
    assert!(updated.tag_list().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_check_review_status() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let user = seed_user(&db, "alice").await?;
    let service = InteractionService::new(db.clone());

    let before = service.check_review_status(user.id, "42").await?;
    assert!(!before.has_review);
    assert_eq!(before.review_id, None);

    let review = service.submit_review(user.id, &submission("42")).await?;

    let after = service.check_review_status(user.id, "42").await?;
    assert!(after.has_review);
    assert_eq!(after.rating, Some(8.5));
    assert_eq!(after.review_id, Some(review.id));

    Ok(())
}
