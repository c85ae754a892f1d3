//! Curated game configuration loaded from `gamedata.toml`.
//!
//! The API does not describe which achievements prove an encounter, which items
//! are worth raid trophies, or how raid wings are grouped, so that data is kept
//! in a TOML file next to the bot.

use crate::{
    core::{
        home::{Cat, Node},
        progress::KillProofArea,
        raids::Raid,
        trophies::RaidTrophy,
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Path used when `GAMEDATA_PATH` is not set.
pub const DEFAULT_GAMEDATA_PATH: &str = "gamedata.toml";

/// Contents of `gamedata.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameConfig {
    /// Kill proof areas
    #[serde(default)]
    pub killproofs: KillProofConfig,
    /// Raid trophy kinds
    #[serde(default)]
    pub raid_trophies: Vec<RaidTrophy>,
    /// Raids and their wings
    #[serde(default)]
    pub raids: Vec<Raid>,
    /// Home instance unlocks
    #[serde(default)]
    pub home: HomeConfig,
}

/// Home instance section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeConfig {
    /// Cats in display order
    #[serde(default)]
    pub cats: Vec<Cat>,
    /// Gathering nodes in display order
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// Kill proof section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KillProofConfig {
    /// Areas in display order
    #[serde(default)]
    pub areas: Vec<KillProofArea>,
}

/// Parses game configuration from TOML text.
pub fn parse_gamedata(contents: &str) -> Result<GameConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse game data: {e}"),
    })
}

/// Loads game configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or its contents are invalid.
pub fn load_gamedata<P: AsRef<Path>>(path: P) -> Result<GameConfig> {
    let path = path.as_ref();
    debug!("Loading game data from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    let config = parse_gamedata(&contents)?;
    info!(
        "Loaded {} kill proof areas, {} trophy kinds, {} raids, {} cats, {} nodes",
        config.killproofs.areas.len(),
        config.raid_trophies.len(),
        config.raids.len(),
        config.home.cats.len(),
        config.home.nodes.len()
    );
    Ok(config)
}

/// Loads game configuration from `GAMEDATA_PATH`, or `gamedata.toml`.
pub fn load_default_gamedata() -> Result<GameConfig> {
    let path =
        std::env::var("GAMEDATA_PATH").unwrap_or_else(|_| DEFAULT_GAMEDATA_PATH.to_string());
    load_gamedata(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{progress::Encounter, raids::EventKind};

    #[test]
    fn test_parse_gamedata() {
        let config = parse_gamedata(
            r#"
            [[killproofs.areas]]
            name = "Raids"
            encounters = [
                { type = "single_achievement", name = "Vale Guardian", id = 2654 },
            ]

            [[raid_trophies]]
            name = "Insights"
            wallet = 70
            [[raid_trophies.items]]
            items = [77302]
            worth = 1

            [[raids]]
            id = "forsaken_thicket"
            [[raids.wings]]
            id = "spirit_vale"
            events = [{ id = "vale_guardian", type = "Boss" }]

            [[home.cats]]
            id = 1
            guide = "Chicken"

            [[home.nodes]]
            id = "quartz_node"
            guide = "Quartz"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.killproofs.areas[0].encounters[0],
            Encounter::SingleAchievement {
                name: "Vale Guardian".to_string(),
                id: 2654
            }
        );
        assert_eq!(config.raid_trophies[0].wallet, Some(70));
        assert!(!config.raid_trophies[0].items[0].crafted);
        assert_eq!(config.raids[0].wings[0].events[0].kind, EventKind::Boss);
        assert_eq!(config.home.cats[0].id, 1);
        assert_eq!(config.home.nodes[0].id, "quartz_node");
    }

    #[test]
    fn test_invalid_gamedata() {
        let err = parse_gamedata("[[raids]]\nwings = 3").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(load_gamedata("/nonexistent/gamedata.toml").is_err());
    }

    #[test]
    fn test_bundled_gamedata_parses() {
        let config = load_gamedata(concat!(env!("CARGO_MANIFEST_DIR"), "/gamedata.toml")).unwrap();
        assert!(!config.killproofs.areas.is_empty());
        assert!(!config.raid_trophies.is_empty());
        assert!(!config.raids.is_empty());
        assert!(!config.home.cats.is_empty());
        assert!(!config.home.nodes.is_empty());
    }
}
