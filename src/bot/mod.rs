//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the framework-agnostic core into poise slash commands and
//! owns the shared state every command sees.

/// Discord command implementations (general, build, account, wvw)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    api::Gw2Api,
    config::gamedata::GameConfig,
    core::{gamedata::DocumentStore, report},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
pub struct BotData {
    /// Database connection for API keys
    pub database: DatabaseConnection,
    /// Static game data documents
    pub store: DocumentStore,
    /// Game API client
    pub api: Gw2Api,
    /// Curated kill proof, trophy and raid data
    pub game_config: GameConfig,
}

impl BotData {
    /// Creates the shared state. The document store reuses the database connection.
    #[must_use]
    pub fn new(database: DatabaseConnection, api: Gw2Api, game_config: GameConfig) -> Self {
        let store = DocumentStore::new(database.clone());
        Self {
            database,
            store,
            api,
            game_config,
        }
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Sends a reply, split over several messages when it is too long.
pub async fn say_long(ctx: Context<'_>, text: &str) -> Result<()> {
    for part in report::split_message(text, report::MESSAGE_LIMIT) {
        ctx.say(part).await?;
    }
    Ok(())
}

/// Text shown to the user for a failed command.
#[must_use]
pub fn user_message(error: &Error) -> String {
    match error {
        Error::MissingApiKey { .. } => {
            "You have no API key registered. Add one with `/key_add`.".to_string()
        }
        Error::Unauthorized { .. } => {
            "Your API key was rejected. It may have been deleted, add a new one with `/key_add`."
                .to_string()
        }
        e if e.is_api_failure() => {
            "The game API did not answer properly. Try again later.".to_string()
        }
        Error::MalformedCode { .. }
        | Error::InvalidApiKey { .. }
        | Error::MissingPermission { .. }
        | Error::LookupNotFound { .. } => error.to_string(),
        _ => "Something went wrong while running this command.".to_string(),
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            warn!("Error in command `{}`: {error:?}", ctx.command().name);
            if let Err(e) = ctx.say(user_message(&error)).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Starts the Discord client and blocks until it stops.
#[instrument(skip_all)]
pub async fn run_bot(token: &str, data: BotData) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client...");
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}
