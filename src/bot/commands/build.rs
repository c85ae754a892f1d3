//! Build template and chat link commands.
//!
//! Builds are resolved against the static game data store; character builds
//! additionally need the user's API key.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, say_long},
        core::{
            account,
            build::{BuildDescription, fetch_build_tab},
            chatcode::{ChatLink, find_chat_codes},
            gamedata::GameData,
            report,
        },
        errors::{Error, Result},
    };
    use tracing::info;

    /// Shows the build behind a build template chat code.
    #[poise::command(slash_command, prefix_command)]
    pub async fn build(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Build template chat code, e.g. [&DQMGOyYv...]"] code: String,
    ) -> Result<()> {
        let code = find_chat_codes(&code)
            .first()
            .map_or_else(|| code.trim().to_string(), |c| (*c).to_string());
        let description = BuildDescription::decode(&code, &ctx.data().store).await?;
        info!("Decoded {} build", description.profession.id);
        say_long(ctx, &report::format_build(&description, &code)?).await
    }

    /// Shows one of your characters' builds and its chat code.
    #[poise::command(slash_command, prefix_command)]
    pub async fn character_build(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Character name"] character: String,
        #[description = "Build tab number (defaults to the active tab)"]
        #[min = 1]
        tab: Option<u32>,
    ) -> Result<()> {
        ctx.defer().await?;
        let data = ctx.data();
        let key = account::get_api_key(&data.database, &ctx.author().id.to_string()).await?;
        let build_tab = fetch_build_tab(&data.api, &key, &character, tab).await?;
        let description = BuildDescription::from_build_tab(&build_tab, &data.store).await?;
        let code = description.encode()?;

        let mut text = String::new();
        if !build_tab.build.name.is_empty() {
            text.push_str(&format!("Tab {}: {}\n", build_tab.tab, build_tab.build.name));
        }
        text.push_str(&report::format_build(&description, &code)?);
        say_long(ctx, &text).await
    }

    /// Decodes every chat link in a message.
    #[poise::command(slash_command, prefix_command)]
    pub async fn link(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Text containing one or more [&...] chat links"] text: String,
    ) -> Result<()> {
        let codes = find_chat_codes(&text);
        if codes.is_empty() {
            ctx.say("No chat links found.").await?;
            return Ok(());
        }

        let store = &ctx.data().store;
        let mut lines = Vec::with_capacity(codes.len());
        for code in codes {
            let line = match ChatLink::parse(code) {
                Ok(ChatLink::Build(record)) => {
                    match BuildDescription::from_record(&record, store).await {
                        Ok(description) => report::format_build(&description, code)?,
                        Err(e) => format!("`{code}`: {e}"),
                    }
                }
                Ok(ChatLink::Item(item)) => {
                    let name = store
                        .items(&[item.item_id])
                        .await?
                        .into_iter()
                        .next()
                        .map(|doc| doc.name);
                    let text = report::format_chat_link(&ChatLink::Item(item));
                    match name {
                        Some(name) => format!("{name}: {text}"),
                        None => text,
                    }
                }
                Ok(link) => report::format_chat_link(&link),
                Err(e) => format!("`{code}`: {e}"),
            };
            lines.push(line);
        }
        say_long(ctx, &lines.join("\n")).await
    }
}

// Re-export all commands
pub use inner::*;
