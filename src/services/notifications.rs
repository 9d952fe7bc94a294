use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;

use crate::database::entities::{notifications, users};
use crate::errors::{CoreError, CoreResult};

/// Ledger row joined with the sender fields clients render.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: i32,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub sender_id: i32,
    pub sender_name: String,
    pub sender_avatar: String,
}

/// Durable, per-recipient notification ledger. The only mutation after
/// creation is the recipient marking a row read.
pub struct NotificationService {
    db: DatabaseConnection,
}

impl NotificationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Snapshot of the recipient's ledger, newest first (created_at, then
    /// id for same-instant rows).
    pub async fn list_for_recipient(&self, user_id: i32) -> CoreResult<Vec<NotificationView>> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::RecipientId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .all(&self.db)
            .await?;

        let sender_ids: Vec<i32> = rows.iter().map(|n| n.sender_id).collect();
        let senders: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(sender_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let views = rows
            .into_iter()
            .map(|n| {
                let sender = senders.get(&n.sender_id);
                NotificationView {
                    id: n.id,
                    message: n.message,
                    kind: n.kind,
                    is_read: n.is_read,
                    created_at: n.created_at,
                    sender_id: n.sender_id,
                    sender_name: sender.map(|u| u.name.clone()).unwrap_or_default(),
                    sender_avatar: sender
                        .and_then(|u| u.avatar_url.clone())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Ok(views)
    }

    /// Flip `is_read` to true. Only the recipient may do this; a second
    /// call is a no-op.
    pub async fn mark_read(&self, notification_id: i32, acting_user_id: i32) -> CoreResult<()> {
        let notification = notifications::Entity::find_by_id(notification_id)
            .one(&self.db)
            .await?
            .ok_or(CoreError::NotFound("notification"))?;

        if notification.recipient_id != acting_user_id {
            return Err(CoreError::Forbidden);
        }

        if notification.is_read {
            return Ok(());
        }

        let mut active: notifications::ActiveModel = notification.into();
        active.is_read = Set(true);
        active.update(&self.db).await?;

        Ok(())
    }
}
