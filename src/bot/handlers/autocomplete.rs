//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::wvw, errors::Error};
use poise::serenity_prelude as serenity;
use tracing::warn;

// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Suggests items whose name contains the typed text.
///
/// Items sharing name, rarity and type are offered once; the submitted value
/// carries all of their ids.
pub async fn autocomplete_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    // Fetch more rows than we show since duplicates collapse.
    let found = ctx.data().store.search_items(partial, 100).await;
    match found {
        Ok(choices) => choices
            .into_iter()
            .take(MAX_CHOICES)
            .map(|choice| serenity::AutocompleteChoice::new(choice.label(), choice.value()))
            .collect(),
        Err(e) => {
            warn!("Item autocomplete failed: {e}");
            Vec::new()
        }
    }
}

/// Suggests profession skills by name; the submitted value is the skill id.
pub async fn autocomplete_skill(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    match ctx.data().store.search_skills(partial, MAX_CHOICES).await {
        Ok(skills) => skills
            .into_iter()
            .map(|skill| serenity::AutocompleteChoice::new(skill.name, skill.id.to_string()))
            .collect(),
        Err(e) => {
            warn!("Skill autocomplete failed: {e}");
            Vec::new()
        }
    }
}

/// Suggests traits by name; the submitted value is the trait id.
pub async fn autocomplete_trait(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<serenity::AutocompleteChoice> {
    match ctx.data().store.search_traits(partial, MAX_CHOICES).await {
        Ok(traits) => traits
            .into_iter()
            .map(|found| serenity::AutocompleteChoice::new(found.name, found.id.to_string()))
            .collect(),
        Err(e) => {
            warn!("Trait autocomplete failed: {e}");
            Vec::new()
        }
    }
}

/// Suggests world names for the typed text.
pub async fn autocomplete_world(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(worlds) = wvw::fetch_worlds(&ctx.data().api).await else {
        return Vec::new();
    };
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = worlds
        .into_iter()
        .map(|world| world.name)
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();
    matching.sort();
    matching.truncate(MAX_CHOICES);
    matching
}
