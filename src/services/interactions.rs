use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::entities::{likes, reviews};
use crate::errors::{CoreError, CoreResult};

/// One client action: the review fields the caller owns, an optional like
/// intent, and the denormalized catalog snapshot used if a like is created.
#[derive(Clone, Debug, Deserialize)]
pub struct SubmitReview {
    pub movie_id: String,
    pub movie_title: String,
    #[serde(default)]
    pub movie_year: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_rewatch: bool,
    #[serde(default)]
    pub contains_spoiler: bool,
    #[serde(default)]
    pub watched_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub like_intent: Option<bool>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewStatus {
    pub has_review: bool,
    pub rating: Option<f64>,
    pub review_id: Option<i32>,
}

/// Coordinates the review and like stores so a single client action leaves
/// them mutually consistent. Every mutation here is one transaction.
pub struct InteractionService {
    db: DatabaseConnection,
}

impl InteractionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Upsert the caller's review for a movie and reconcile the like flag
    /// in the same atomic unit. Historical duplicate rows for the key are
    /// healed on every call: the lowest id wins, the rest are deleted.
    ///
    /// A lost race against the unique key surfaces as `Conflict`; one
    /// internal retry then observes the winner's row and updates it.
    pub async fn submit_review(
        &self,
        user_id: i32,
        request: &SubmitReview,
    ) -> CoreResult<reviews::Model> {
        validate(request)?;

        match self.submit_review_once(user_id, request).await {
            Err(CoreError::Conflict) => {
                warn!(
                    "review upsert for user {} movie {} lost a write race, retrying",
                    user_id, request.movie_id
                );
                self.submit_review_once(user_id, request).await
            }
            other => other,
        }
    }

    /// `{hasReview, rating, reviewId}` for the caller and a movie. Reads
    /// the authoritative row (lowest id) if duplicates are still present.
    pub async fn check_review_status(
        &self,
        user_id: i32,
        movie_id: &str,
    ) -> CoreResult<ReviewStatus> {
        let review = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::MovieId.eq(movie_id))
            .order_by_asc(reviews::Column::Id)
            .one(&self.db)
            .await?;

        Ok(match review {
            Some(review) => ReviewStatus {
                has_review: true,
                rating: review.rating,
                review_id: Some(review.id),
            },
            None => ReviewStatus {
                has_review: false,
                rating: None,
                review_id: None,
            },
        })
    }

    pub async fn reviews_for_user(&self, user_id: i32) -> CoreResult<Vec<reviews::Model>> {
        let reviews = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .order_by_desc(reviews::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(reviews)
    }

    pub async fn likes_for_user(&self, user_id: i32) -> CoreResult<Vec<likes::Model>> {
        let likes = likes::Entity::find()
            .filter(likes::Column::UserId.eq(user_id))
            .order_by_desc(likes::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(likes)
    }

    async fn submit_review_once(
        &self,
        user_id: i32,
        request: &SubmitReview,
    ) -> CoreResult<reviews::Model> {
        let txn = self.db.begin().await?;

        match self.apply_submission(&txn, user_id, request).await {
            Ok(review) => {
                txn.commit().await.map_err(CoreError::from_db)?;
                Ok(review)
            }
            Err(err) => {
                let _ = txn.rollback().await;
                Err(err)
            }
        }
    }

    async fn apply_submission(
        &self,
        txn: &DatabaseTransaction,
        user_id: i32,
        request: &SubmitReview,
    ) -> CoreResult<reviews::Model> {
        let mut existing = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .filter(reviews::Column::MovieId.eq(request.movie_id.as_str()))
            .order_by_asc(reviews::Column::Id)
            .all(txn)
            .await?;

        let authoritative = if existing.is_empty() {
            None
        } else {
            Some(existing.remove(0))
        };

        // Everything past the lowest id is a historical duplicate.
        for duplicate in existing {
            debug!(
                "removing duplicate review {} for user {} movie {}",
                duplicate.id, user_id, request.movie_id
            );
            duplicate.delete(txn).await?;
        }

        let now = Utc::now();
        let review = match authoritative {
            Some(current) => {
                let mut active: reviews::ActiveModel = current.into();
                apply_review_fields(&mut active, request);
                active.updated_at = Set(now);
                active.update(txn).await.map_err(CoreError::from_db)?
            }
            None => {
                let mut active = reviews::ActiveModel {
                    user_id: Set(user_id),
                    movie_id: Set(request.movie_id.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                apply_review_fields(&mut active, request);
                active.insert(txn).await.map_err(CoreError::from_db)?
            }
        };

        if let Some(intent) = request.like_intent {
            self.reconcile_like(txn, user_id, &review, request, intent)
                .await?;
        }

        Ok(review)
    }

    /// Bring the like row in line with the requested intent. Create uses
    /// the catalog snapshot (vote_average defaults to 0.0, release_date
    /// falls back to the review's year); matching state is a no-op.
    async fn reconcile_like(
        &self,
        txn: &DatabaseTransaction,
        user_id: i32,
        review: &reviews::Model,
        request: &SubmitReview,
        intent: bool,
    ) -> CoreResult<()> {
        let current = likes::Entity::find()
            .filter(likes::Column::UserId.eq(user_id))
            .filter(likes::Column::MovieId.eq(review.movie_id.as_str()))
            .one(txn)
            .await?;

        match (intent, current) {
            (true, None) => {
                let like = likes::ActiveModel {
                    user_id: Set(user_id),
                    movie_id: Set(review.movie_id.clone()),
                    movie_title: Set(review.movie_title.clone()),
                    poster_url: Set(review.poster_url.clone()),
                    vote_average: Set(request.vote_average.unwrap_or(0.0)),
                    release_date: Set(request
                        .release_date
                        .clone()
                        .or_else(|| review.movie_year.clone())),
                    created_at: Set(Utc::now()),
                    ..Default::default()
                };
                like.insert(txn).await.map_err(CoreError::from_db)?;
            }
            (false, Some(like)) => {
                like.delete(txn).await?;
            }
            _ => {}
        }

        Ok(())
    }
}

/// Overwrite semantics per field: required and structured fields take the
/// caller's value as sent (including clearing tags), optional scalar
/// fields are left untouched when absent.
fn apply_review_fields(active: &mut reviews::ActiveModel, request: &SubmitReview) {
    active.movie_title = Set(request.movie_title.clone());
    if let Some(year) = &request.movie_year {
        active.movie_year = Set(Some(year.clone()));
    }
    if let Some(poster) = &request.poster_url {
        active.poster_url = Set(Some(poster.clone()));
    }
    if let Some(content) = &request.content {
        active.content = Set(Some(content.clone()));
    }
    if let Some(rating) = request.rating {
        active.rating = Set(Some(rating));
    }
    active.is_rewatch = Set(request.is_rewatch);
    active.contains_spoiler = Set(request.contains_spoiler);
    if let Some(date) = request.watched_date {
        active.watched_date = Set(Some(date));
    }
    active.tags = Set(request
        .tags
        .as_ref()
        .and_then(|tags| serde_json::to_string(tags).ok()));
}

fn validate(request: &SubmitReview) -> CoreResult<()> {
    if request.movie_id.trim().is_empty() {
        return Err(CoreError::Validation("movie_id must not be empty".into()));
    }
    if request.movie_title.trim().is_empty() {
        return Err(CoreError::Validation("movie_title must not be empty".into()));
    }
    if let Some(rating) = request.rating {
        if !(0.0..=10.0).contains(&rating) {
            return Err(CoreError::Validation(format!(
                "rating {} outside the 0-10 range",
                rating
            )));
        }
    }
    Ok(())
}
