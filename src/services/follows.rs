use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::warn;

use crate::database::entities::{follows, notifications, reviews, users};
use crate::database::entities::notifications::NotificationKind;
use crate::errors::{CoreError, CoreResult};
use crate::services::dispatch::{DeliveryDispatcher, NotificationPush};

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub bio: String,
    pub avatar_url: String,
    pub followers_count: u64,
    pub following_count: u64,
    pub reviews_count: u64,
    pub is_following: bool,
}

/// Owns the directed follow graph. Edge creation and the FOLLOW
/// notification commit together; real-time push runs after commit and
/// never affects the outcome.
pub struct FollowService {
    db: DatabaseConnection,
    dispatcher: DeliveryDispatcher,
}

impl FollowService {
    pub fn new(db: DatabaseConnection, dispatcher: DeliveryDispatcher) -> Self {
        Self { db, dispatcher }
    }

    /// Create the follower -> followee edge and notify the followee. An
    /// existing edge is a successful no-op with no new notification.
    pub async fn follow(&self, follower_id: i32, followee_id: i32) -> CoreResult<()> {
        if follower_id == followee_id {
            return Err(CoreError::InvalidOperation(
                "cannot follow yourself".into(),
            ));
        }

        match self.follow_once(follower_id, followee_id).await {
            Err(CoreError::Conflict) => {
                warn!(
                    "follow {} -> {} lost a write race, retrying",
                    follower_id, followee_id
                );
                self.follow_once(follower_id, followee_id).await
            }
            other => other,
        }
    }

    /// Remove the edge if present. Success either way; notifications are
    /// never retracted.
    pub async fn unfollow(&self, follower_id: i32, followee_id: i32) -> CoreResult<()> {
        users::Entity::find_by_id(followee_id)
            .one(&self.db)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        follows::Entity::delete_many()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FolloweeId.eq(followee_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    pub async fn is_following(&self, follower_id: i32, followee_id: i32) -> CoreResult<bool> {
        let count = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FolloweeId.eq(followee_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn follower_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = follows::Entity::find()
            .filter(follows::Column::FolloweeId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    pub async fn following_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    /// Profile aggregates for a user page, with `is_following` resolved
    /// against the viewing user when one is present.
    pub async fn profile(&self, user_id: i32, viewer: Option<i32>) -> CoreResult<UserProfile> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        let followers_count = self.follower_count(user_id).await?;
        let following_count = self.following_count(user_id).await?;
        let reviews_count = reviews::Entity::find()
            .filter(reviews::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        let is_following = match viewer {
            Some(viewer_id) if viewer_id != user_id => {
                self.is_following(viewer_id, user_id).await?
            }
            _ => false,
        };

        Ok(UserProfile {
            id: user.id,
            name: user.name,
            bio: user.bio.unwrap_or_default(),
            avatar_url: user.avatar_url.unwrap_or_default(),
            followers_count,
            following_count,
            reviews_count,
            is_following,
        })
    }

    async fn follow_once(&self, follower_id: i32, followee_id: i32) -> CoreResult<()> {
        let txn = self.db.begin().await?;

        match self.apply_follow(&txn, follower_id, followee_id).await {
            Ok(push) => {
                txn.commit().await.map_err(CoreError::from_db)?;

                if let Some(push) = push {
                    // Fire-and-forget: the ledger row is already durable.
                    let dispatcher = self.dispatcher.clone();
                    tokio::spawn(async move {
                        dispatcher.dispatch(followee_id, push).await;
                    });
                }

                Ok(())
            }
            Err(err) => {
                let _ = txn.rollback().await;
                Err(err)
            }
        }
    }

    /// Inside the transaction: check both users, insert the edge if absent,
    /// and record the notification. Returns the push payload when a new
    /// edge was created.
    async fn apply_follow(
        &self,
        txn: &DatabaseTransaction,
        follower_id: i32,
        followee_id: i32,
    ) -> CoreResult<Option<NotificationPush>> {
        let follower = users::Entity::find_by_id(follower_id)
            .one(txn)
            .await?
            .ok_or(CoreError::NotFound("user"))?;
        users::Entity::find_by_id(followee_id)
            .one(txn)
            .await?
            .ok_or(CoreError::NotFound("user"))?;

        let existing = follows::Entity::find()
            .filter(follows::Column::FollowerId.eq(follower_id))
            .filter(follows::Column::FolloweeId.eq(followee_id))
            .one(txn)
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        let now = Utc::now();
        let edge = follows::ActiveModel {
            follower_id: Set(follower_id),
            followee_id: Set(followee_id),
            created_at: Set(now),
            ..Default::default()
        };
        edge.insert(txn).await.map_err(CoreError::from_db)?;

        let notification = notifications::ActiveModel {
            recipient_id: Set(followee_id),
            sender_id: Set(follower_id),
            message: Set(format!("{} started following you", follower.name)),
            kind: Set(NotificationKind::Follow.into()),
            is_read: Set(false),
            created_at: Set(now),
            ..Default::default()
        };
        let notification = notification.insert(txn).await.map_err(CoreError::from_db)?;

        Ok(Some(NotificationPush::from_parts(&notification, &follower)))
    }
}
