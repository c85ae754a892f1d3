//! World vs World commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        api::AccountSource,
        bot::{BotData, handlers::autocomplete, say_long},
        core::{account, account::AccountInfo, report, wvw},
        errors::{Error, Result},
    };

    /// Shows how a world is doing in its current match.
    ///
    /// Without a world name, your account's home world is used.
    #[poise::command(slash_command, prefix_command)]
    pub async fn wvw_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "World name (defaults to your home world)"]
        #[autocomplete = "autocomplete::autocomplete_world"]
        world: Option<String>,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();

        let world_id = match world {
            Some(name) => {
                let worlds = wvw::fetch_worlds(&data.api).await?;
                let Some(found) = wvw::find_world(&worlds, &name) else {
                    ctx.say(format!("No world named **{name}**.")).await?;
                    return Ok(());
                };
                found.id
            }
            None => {
                let key =
                    account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
                account::require_permissions(&key, &["account"])?;
                data.api.get::<AccountInfo>("account", &key.key).await?.world
            }
        };

        let stats = wvw::fetch_world_stats(&data.api, world_id).await?;
        ctx.say(report::format_world_stats(&stats)).await?;
        Ok(())
    }

    /// Lists every world.
    #[poise::command(slash_command, prefix_command)]
    pub async fn wvw_worlds(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer().await?;
        let worlds = wvw::fetch_worlds(&ctx.data().api).await?;
        say_long(ctx, &report::format_world_list(&worlds)).await
    }
}

// Re-export all commands
pub use inner::*;
