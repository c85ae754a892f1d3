//! World vs World match performance of a world.

use crate::{
    api::PublicSource,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, instrument};

/// Team colour in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    /// Red team
    Red,
    /// Green team
    Green,
    /// Blue team
    Blue,
}

impl TeamColor {
    /// All colours, in the order the API lists them.
    pub const ALL: [Self; 3] = [Self::Red, Self::Blue, Self::Green];

    /// Matches an objective owner such as `"Red"` or `"Neutral"`.
    #[must_use]
    pub fn matches_owner(self, owner: &str) -> bool {
        owner.eq_ignore_ascii_case(&self.to_string())
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        })
    }
}

/// One value per team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PerTeam<T> {
    /// Red team value
    pub red: T,
    /// Green team value
    pub green: T,
    /// Blue team value
    pub blue: T,
}

impl<T> PerTeam<T> {
    /// Value of one team.
    pub const fn get(&self, color: TeamColor) -> &T {
        match color {
            TeamColor::Red => &self.red,
            TeamColor::Green => &self.green,
            TeamColor::Blue => &self.blue,
        }
    }
}

/// A world (server).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct World {
    /// World id
    pub id: u32,
    /// World name
    pub name: String,
    /// Population level (e.g. "VeryHigh")
    pub population: String,
}

/// An objective on a match map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Objective {
    /// Owning team, or "Neutral"
    pub owner: String,
    /// Points awarded per tick
    #[serde(default)]
    pub points_tick: u64,
}

/// One map of a match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MatchMap {
    /// Objectives on the map
    #[serde(default)]
    pub objectives: Vec<Objective>,
}

/// A running match between three teams.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Match {
    /// World ids on each team
    pub all_worlds: PerTeam<Vec<u32>>,
    /// War score
    pub scores: PerTeam<u64>,
    /// Victory points
    pub victory_points: PerTeam<u64>,
    /// Kills
    pub kills: PerTeam<u64>,
    /// Deaths
    pub deaths: PerTeam<u64>,
    /// Maps
    #[serde(default)]
    pub maps: Vec<MatchMap>,
}

impl Match {
    /// Team a world plays on, with the other worlds linked to it.
    #[must_use]
    pub fn team_of(&self, world_id: u32) -> Option<(TeamColor, Vec<u32>)> {
        TeamColor::ALL.into_iter().find_map(|color| {
            let worlds = self.all_worlds.get(color);
            worlds.contains(&world_id).then(|| {
                let linked = worlds.iter().copied().filter(|&id| id != world_id).collect();
                (color, linked)
            })
        })
    }

    /// Points a team earns per tick from the objectives it holds.
    #[must_use]
    pub fn points_per_tick(&self, color: TeamColor) -> u64 {
        self.maps
            .iter()
            .flat_map(|map| &map.objectives)
            .filter(|objective| color.matches_owner(&objective.owner))
            .map(|objective| objective.points_tick)
            .sum()
    }

    /// Kill/death ratio of a team rounded to two decimals, `None` without deaths.
    #[must_use]
    pub fn kill_death_ratio(&self, color: TeamColor) -> Option<f64> {
        let deaths = *self.deaths.get(color);
        (deaths > 0).then(|| {
            #[allow(clippy::cast_precision_loss)]
            let ratio = *self.kills.get(color) as f64 / deaths as f64;
            (ratio * 100.0).round() / 100.0
        })
    }
}

/// Population levels, lowest first.
pub const POPULATIONS: [&str; 5] = ["low", "medium", "high", "veryhigh", "full"];

/// Position of a population level in [`POPULATIONS`].
#[must_use]
pub fn population_to_int(population: &str) -> Option<usize> {
    let normalized = population.to_lowercase().replace('_', "");
    POPULATIONS.iter().position(|&p| p == normalized)
}

/// Readable population level.
#[must_use]
pub fn readable_population(population: &str) -> String {
    match population {
        "VeryHigh" => "Very high".to_string(),
        other => other.to_string(),
    }
}

/// Finds a world by name, ignoring case.
#[must_use]
pub fn find_world<'a>(worlds: &'a [World], name: &str) -> Option<&'a World> {
    let name = name.trim();
    worlds.iter().find(|w| w.name.eq_ignore_ascii_case(name))
}

/// Match performance of a world.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldStats {
    /// World name
    pub name: String,
    /// Team colour
    pub color: TeamColor,
    /// Names of linked worlds
    pub linked_worlds: Vec<String>,
    /// War score
    pub score: u64,
    /// Points per tick
    pub points_per_tick: u64,
    /// Victory points
    pub victory_points: u64,
    /// Kill/death ratio
    pub kill_death_ratio: Option<f64>,
    /// Readable population
    pub population: String,
}

/// Computes a world's performance in its current match.
pub fn world_stats(matchup: &Match, world: &World, worlds: &[World]) -> Result<WorldStats> {
    let (color, linked) = matchup
        .team_of(world.id)
        .ok_or_else(|| Error::not_found("world in match", world.id))?;
    let linked_worlds = linked
        .iter()
        .map(|id| {
            worlds
                .iter()
                .find(|w| w.id == *id)
                .map_or_else(|| id.to_string(), |w| w.name.clone())
        })
        .collect();
    Ok(WorldStats {
        name: world.name.clone(),
        color,
        linked_worlds,
        score: *matchup.scores.get(color),
        points_per_tick: matchup.points_per_tick(color),
        victory_points: *matchup.victory_points.get(color),
        kill_death_ratio: matchup.kill_death_ratio(color),
        population: readable_population(&world.population),
    })
}

/// Fetches every world.
pub async fn fetch_worlds<S: PublicSource>(source: &S) -> Result<Vec<World>> {
    source.get_public("worlds?ids=all").await
}

/// Fetches the current match of a world and computes its performance.
#[instrument(skip(source))]
pub async fn fetch_world_stats<S: PublicSource>(source: &S, world_id: u32) -> Result<WorldStats> {
    let endpoint = format!("wvw/matches?world={world_id}");
    let (matchup, worlds) = tokio::try_join!(
        source.get_public::<Match>(&endpoint),
        fetch_worlds(source),
    )?;
    let world = worlds
        .iter()
        .find(|w| w.id == world_id)
        .ok_or_else(|| Error::not_found("world", world_id))?;
    debug!("World {} found in match", world.name);
    world_stats(&matchup, world, &worlds)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::FakeAccountSource;
    use serde_json::{Value, json};

    fn match_json() -> Value {
        json!({
            "id": "1-1",
            "all_worlds": {"red": [1001, 1010], "blue": [1002], "green": [1003, 1013]},
            "scores": {"red": 120, "blue": 80, "green": 95},
            "victory_points": {"red": 30, "blue": 20, "green": 25},
            "kills": {"red": 100, "blue": 50, "green": 0},
            "deaths": {"red": 30, "blue": 50, "green": 0},
            "maps": [
                {"objectives": [
                    {"owner": "Red", "points_tick": 5},
                    {"owner": "Blue", "points_tick": 2},
                    {"owner": "Neutral", "points_tick": 0}
                ]},
                {"objectives": [{"owner": "Red", "points_tick": 10}]}
            ]
        })
    }

    fn worlds_json() -> Value {
        json!([
            {"id": 1001, "name": "Anvil Rock", "population": "VeryHigh"},
            {"id": 1010, "name": "Ehmry Bay", "population": "Medium"},
            {"id": 1002, "name": "Borlis Pass", "population": "Full"},
            {"id": 1003, "name": "Yak's Bend", "population": "High"}
        ])
    }

    #[test]
    fn test_team_and_linked_worlds() {
        let matchup: Match = serde_json::from_value(match_json()).unwrap();
        assert_eq!(matchup.team_of(1010), Some((TeamColor::Red, vec![1001])));
        assert_eq!(matchup.team_of(1002), Some((TeamColor::Blue, vec![])));
        assert_eq!(matchup.team_of(9999), None);
    }

    #[test]
    fn test_points_and_ratio() {
        let matchup: Match = serde_json::from_value(match_json()).unwrap();
        assert_eq!(matchup.points_per_tick(TeamColor::Red), 15);
        assert_eq!(matchup.points_per_tick(TeamColor::Green), 0);
        assert_eq!(matchup.kill_death_ratio(TeamColor::Red), Some(3.33));
        assert_eq!(matchup.kill_death_ratio(TeamColor::Blue), Some(1.0));
        assert_eq!(matchup.kill_death_ratio(TeamColor::Green), None);
    }

    #[test]
    fn test_population() {
        assert_eq!(population_to_int("Low"), Some(0));
        assert_eq!(population_to_int("VeryHigh"), Some(3));
        assert_eq!(population_to_int("very_high"), Some(3));
        assert_eq!(population_to_int("Full"), Some(4));
        assert_eq!(population_to_int("Crowded"), None);
        assert_eq!(readable_population("VeryHigh"), "Very high");
    }

    #[test]
    fn test_find_world() {
        let worlds: Vec<World> = serde_json::from_value(worlds_json()).unwrap();
        assert_eq!(find_world(&worlds, " anvil rock").unwrap().id, 1001);
        assert!(find_world(&worlds, "Nowhere").is_none());
    }

    #[tokio::test]
    async fn test_fetch_world_stats() -> Result<()> {
        let source = FakeAccountSource::new()
            .with("wvw/matches?world=1001", match_json())
            .with("worlds?ids=all", worlds_json());
        let stats = fetch_world_stats(&source, 1001).await?;
        assert_eq!(stats.name, "Anvil Rock");
        assert_eq!(stats.color, TeamColor::Red);
        assert_eq!(stats.linked_worlds, vec!["Ehmry Bay".to_string()]);
        assert_eq!(stats.score, 120);
        assert_eq!(stats.points_per_tick, 15);
        assert_eq!(stats.victory_points, 30);
        assert_eq!(stats.population, "Very high");
        Ok(())
    }

    #[tokio::test]
    async fn test_world_missing_from_match() {
        let source = FakeAccountSource::new()
            .with("wvw/matches?world=1003", match_json())
            .with("worlds?ids=all", json!([{"id": 1003, "name": "Yak's Bend", "population": "High"}]));
        let stats = fetch_world_stats(&source, 1003).await.unwrap();
        assert_eq!(stats.linked_worlds, vec!["1013".to_string()]);

        let source = FakeAccountSource::new()
            .with("wvw/matches?world=2000", match_json())
            .with("worlds?ids=all", json!([{"id": 2000, "name": "Elsewhere", "population": "Low"}]));
        let err = fetch_world_stats(&source, 2000).await.unwrap_err();
        assert!(matches!(err, Error::LookupNotFound { .. }));
    }
}
