//! Database connection and table creation.
//!
//! Tables are generated from the entity definitions with `SeaORM`'s
//! `Schema::create_table_from_entity`, so the schema always matches the models.

use crate::entities::{ApiKey, GameDocument};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::info;

/// Database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/gw2_companion.sqlite?mode=rwc";

/// Gets the database URL from the environment, falling back to a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Connects to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let mut table = Schema::new(builder).create_table_from_entity(entity);
    db.execute(builder.build(table.if_not_exists())).await?;
    Ok(())
}

/// Creates the game document and API key tables if they do not exist.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, GameDocument).await?;
    create_table(db, ApiKey).await?;
    Ok(())
}
