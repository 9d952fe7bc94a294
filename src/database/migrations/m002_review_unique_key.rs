use sea_orm::Statement;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Collapse historical duplicate review rows, then add the unique key.
///
/// Earlier deployments enforced one-review-per-movie in application code
/// only, so the table can hold several rows per (user_id, movie_id). The
/// lowest id is the authoritative row; the rest are dropped before the
/// index is created, since the index cannot be built over duplicate data.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let collapse_duplicates = "DELETE FROM reviews WHERE id NOT IN \
            (SELECT MIN(id) FROM reviews GROUP BY user_id, movie_id)";
        db.execute(Statement::from_string(
            manager.get_database_backend(),
            collapse_duplicates.to_string(),
        ))
        .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq-reviews-user-movie")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .col(Reviews::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("uq-reviews-user-movie")
                    .table(Reviews::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Reviews {
    Table,
    UserId,
    MovieId,
}
