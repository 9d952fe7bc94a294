use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Durable notification record. Immutable after creation except `is_read`,
/// which flips false to true once and never reverts. The message is
/// rendered at creation time, not templated at read time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub recipient_id: i32,
    pub sender_id: i32,
    pub message: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::RecipientId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Recipient,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::SenderId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    Follow,
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        match kind {
            NotificationKind::Follow => "FOLLOW".to_string(),
        }
    }
}

impl From<String> for NotificationKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "FOLLOW" => NotificationKind::Follow,
            _ => NotificationKind::Follow,
        }
    }
}

impl Model {
    pub fn get_kind(&self) -> NotificationKind {
        NotificationKind::from(self.kind.clone())
    }
}
