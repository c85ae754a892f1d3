use dotenvy::dotenv;
use gw2_companion::{
    api::Gw2Api,
    bot::{self, BotData},
    config::{database, gamedata},
    core::{gamedata::DocumentStore, sync},
    errors::{Error, Result},
};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Curated game data
    let game_config = gamedata::load_default_gamedata()
        .inspect_err(|e| error!("Failed to load game data: {e}"))?;

    // 4. Database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Static game data, fetched on first start
    let api = Gw2Api::from_env();
    let store = DocumentStore::new(db.clone());
    sync::ensure_build_data(&api, &store).await?;
    if env::var("SYNC_ITEMS").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true")) {
        match sync::sync_items(&api, &store).await {
            Ok(count) => info!("Synchronized {count} items"),
            Err(e) => warn!("Item synchronization failed, search names may be stale: {e}"),
        }
    }

    // 6. Run the bot
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {e}"))
        .map_err(Error::EnvVar)?;

    bot::run_bot(&token, BotData::new(db, api, game_config)).await
}
