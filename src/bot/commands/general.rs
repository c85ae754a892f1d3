//! General Discord commands - ping, help, and other utility commands.
//! These commands touch neither the database nor the game API.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**GW2 Companion Help**\n\
        **Builds**\n\
        • `/build <code>` - Shows the build behind a build template chat code.\n\
        • `/character_build <character> [tab]` - Shows and links a character's build.\n\
        • `/link <code>` - Decodes any chat link.\n\
        • `/skill <name>` - Shows a skill's tooltip and wiki page.\n\
        • `/trait <name>` - Shows a trait's tooltip and wiki page.\n\n\
        **Account** (needs an API key)\n\
        • `/key_add <key>` - Registers your API key.\n\
        • `/key_remove` - Forgets your API key.\n\
        • `/account` - Shows an overview of your account.\n\
        • `/search <item>` - Finds an item across bank, storage and characters.\n\
        • `/kp` - Shows your kill proof.\n\
        • `/li` - Counts your raid trophies.\n\
        • `/bosses` - Shows this week's raid progress.\n\
        • `/cats` - Lists the home instance cats you are missing.\n\
        • `/nodes` - Lists the home instance nodes you are missing.\n\n\
        **World vs World**\n\
        • `/wvw_info [world]` - Shows a world's current match.\n\
        • `/wvw_worlds` - Lists every world.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
