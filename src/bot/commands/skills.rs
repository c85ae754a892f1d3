//! Skill and trait lookup commands.
//!
//! Both read the static game data store only; no API key is needed.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete, say_long},
        core::report,
        errors::{Error, Result},
    };
    use tracing::debug;

    /// Shows a skill's description, facts and wiki page.
    #[poise::command(slash_command, prefix_command)]
    pub async fn skill(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Skill name or id"]
        #[autocomplete = "autocomplete::autocomplete_skill"]
        skill: String,
    ) -> Result<()> {
        let Some(found) = ctx.data().store.find_skill(&skill).await? else {
            ctx.say("Could not find any skills with that name.").await?;
            return Ok(());
        };
        debug!("Showing skill {}", found.id);
        say_long(ctx, &report::format_skill(&found)).await
    }

    /// Shows a trait's description, facts and wiki page.
    #[poise::command(slash_command, prefix_command, rename = "trait")]
    pub async fn trait_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Trait name or id"]
        #[autocomplete = "autocomplete::autocomplete_trait"]
        name: String,
    ) -> Result<()> {
        let Some(found) = ctx.data().store.find_trait(&name).await? else {
            ctx.say("Could not find any traits with that name.").await?;
            return Ok(());
        };
        debug!("Showing trait {}", found.id);
        say_long(ctx, &report::format_trait(&found)).await
    }
}

// Re-export all commands
pub use inner::*;
