pub mod app;
pub mod auth;
pub mod handlers;
pub mod ws;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum MigrateDirection {
    Up,
    Down,
    Fresh,
}

use crate::database::{connection::*, migrations::Migrator};
use anyhow::Result;
use sea_orm_migration::prelude::*;
use tracing::info;

pub async fn start_server(port: u16, database_path: &str, cors_origin: Option<&str>) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    info!("Database migrations completed");

    let app = app::create_app(db, cors_origin).await?;

    log_routes();

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                              - Health check");
    info!("  /api/v1/reviews                      - Submit review (POST)");
    info!("  /api/v1/reviews/movie/:id/check      - Review status for a movie");
    info!("  /api/v1/reviews/user/:id             - Reviews by user");
    info!("  /api/v1/likes/user/:id               - Likes by user");
    info!("  /api/v1/users/:id                    - User profile");
    info!("  /api/v1/users/:id/follow             - Follow user (POST)");
    info!("  /api/v1/users/:id/unfollow           - Unfollow user (POST)");
    info!("  /api/v1/notifications                - Notification ledger");
    info!("  /api/v1/notifications/:id/read       - Mark notification read (PUT)");
    info!("  /ws/notifications                    - Real-time notification stream");
}

pub async fn migrate_database(database_path: &str, direction: MigrateDirection) -> Result<()> {
    let database_url = get_database_url(Some(database_path));
    let db = establish_connection(&database_url).await?;

    match direction {
        MigrateDirection::Up => {
            info!("Running migrations up");
            Migrator::up(&db, None).await?;
        }
        MigrateDirection::Down => {
            info!("Running migrations down");
            Migrator::down(&db, None).await?;
        }
        MigrateDirection::Fresh => {
            info!("Running fresh migrations (down then up)");
            Migrator::down(&db, None).await?;
            Migrator::up(&db, None).await?;
        }
    }

    info!("Database migration completed");
    Ok(())
}
