use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One review per (user_id, movie_id). The unique index arrived after the
/// data did (m002), so readers and writers still treat the lowest id as the
/// authoritative row when duplicates are encountered.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub movie_id: String,
    pub movie_title: String,
    pub movie_year: Option<String>,
    pub poster_url: Option<String>,
    pub content: Option<String>,
    pub rating: Option<f64>,
    pub is_rewatch: bool,
    pub contains_spoiler: bool,
    pub watched_date: Option<ChronoDate>,
    pub tags: Option<String>, // JSON array, submission order
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Tag list in submission order; empty when the column is null or holds
    /// anything other than a string array.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_ref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }
}
