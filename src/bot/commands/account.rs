//! Account Discord commands - API keys, account overview, item search, progress
//! and home instance collections.
//!
//! Every command here except `key_add` looks up the caller's registered key first,
//! so a user without one gets a pointer to `/key_add` from the error handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, say_long},
        core::{
            account,
            gamedata::{GameData, parse_choice_value},
            home,
            inventory::{ItemCounts, SplitCount, fetch_inventory_snapshot, find_items_in_account},
            progress, raids, report, trophies, wvw,
        },
        errors::{Error, Result},
    };
    use std::collections::BTreeMap;
    use tracing::{info, warn};

    async fn reply_private(ctx: poise::Context<'_, BotData, Error>, text: String) -> Result<()> {
        ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
            .await?;
        Ok(())
    }

    /// Registers your API key. Create one at https://account.arena.net/applications
    #[poise::command(slash_command, prefix_command)]
    pub async fn key_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Your API key"] key: String,
    ) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let model = account::register_key(&data.database, &data.api, &user_id, &key).await?;
        reply_private(
            ctx,
            format!(
                "✅ Key added for **{}** with permissions: {}",
                model.account_name,
                model.permissions.replace(',', ", ")
            ),
        )
        .await
    }

    /// Forgets your API key.
    #[poise::command(slash_command, prefix_command)]
    pub async fn key_remove(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let removed = account::remove_api_key(&ctx.data().database, &user_id).await?;
        let text = if removed {
            "🗑️ Your API key has been removed."
        } else {
            "You have no API key registered."
        };
        reply_private(ctx, text.to_string()).await
    }

    /// Shows an overview of your account.
    #[poise::command(slash_command, prefix_command)]
    pub async fn account(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let summary = account::fetch_account_summary(&data.api, &key).await?;

        let world_id = summary.account.world;
        let world = match wvw::fetch_worlds(&data.api).await {
            Ok(worlds) => worlds
                .into_iter()
                .find(|w| w.id == world_id)
                .map_or_else(|| world_id.to_string(), |w| w.name),
            Err(e) => {
                warn!("Could not resolve world {world_id}: {e}");
                world_id.to_string()
            }
        };
        say_long(ctx, &report::format_account_summary(&summary, &world)).await
    }

    /// Finds an item across your bank, material storage, shared slots and characters.
    #[poise::command(slash_command, prefix_command)]
    pub async fn search(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to search for"]
        #[autocomplete = "autocomplete::autocomplete_item"]
        item: String,
    ) -> Result<()> {
        let Some(ids) = parse_choice_value(&item) else {
            ctx.say("Pick an item from the suggestions.").await?;
            return Ok(());
        };
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;

        let docs = data.store.items(&ids).await?;
        let name = docs
            .first()
            .map_or_else(|| format!("Item {}", ids[0]), |doc| doc.name.clone());
        let is_upgrade = docs.iter().any(|doc| doc.is_upgrade);

        let snapshot = fetch_inventory_snapshot(&data.api, &key).await?;
        let counts: ItemCounts<SplitCount> = find_items_in_account(&ids, &snapshot);
        let by_location: BTreeMap<String, SplitCount> = counts.by_location();
        info!("Found {name} in {} locations", by_location.len());

        match report::format_search_results(&name, is_upgrade, &by_location) {
            Some(text) => say_long(ctx, &text).await,
            None => {
                ctx.say(format!("No **{name}** found on your account.")).await?;
                Ok(())
            }
        }
    }

    /// Shows your kill proof: challenge modes and other hard achievements.
    #[poise::command(slash_command, prefix_command)]
    pub async fn kp(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let areas =
            progress::fetch_kill_proof(&data.api, &key, &data.game_config.killproofs.areas)
                .await?;
        say_long(ctx, &report::format_kill_proof(&areas)).await
    }

    /// Counts your raid trophies, including those spent in crafting.
    #[poise::command(slash_command, prefix_command)]
    pub async fn li(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let kinds = &data.game_config.raid_trophies;
        let tally = trophies::fetch_trophies(&data.api, &key, kinds).await?;

        let names: BTreeMap<u32, String> = data
            .store
            .items(&trophies::trophy_item_ids(kinds))
            .await?
            .into_iter()
            .map(|item| (item.id, item.name))
            .collect();
        say_long(ctx, &report::format_trophies(&tally, &names)).await
    }

    /// Shows which raid bosses you have killed this week.
    #[poise::command(slash_command, prefix_command)]
    pub async fn bosses(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let summary = raids::fetch_raid_progress(
            &data.api,
            &key,
            &data.game_config.raids,
            chrono::Utc::now(),
        )
        .await?;
        say_long(ctx, &report::format_raid_summary(&summary)).await
    }

    /// Lists the home instance cats you have not collected yet.
    #[poise::command(slash_command, prefix_command)]
    pub async fn cats(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let missing = home::fetch_missing_cats(&data.api, &key, &data.game_config.home.cats).await?;
        let text = report::format_home_unlocks(
            "Cats you haven't collected yet",
            &missing,
            "You have collected all the cats! Congratulations! :cat2:",
        );
        say_long(ctx, &text).await
    }

    /// Lists the home instance gathering nodes you have not unlocked yet.
    #[poise::command(slash_command, prefix_command)]
    pub async fn nodes(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let missing =
            home::fetch_missing_nodes(&data.api, &key, &data.game_config.home.nodes).await?;
        let text = report::format_home_unlocks(
            "Nodes you haven't collected yet",
            &missing,
            "You've collected all home instance nodes! Congratulations!",
        );
        say_long(ctx, &text).await
    }
}

// Re-export all commands
pub use inner::*;
