//! Kill proof: completion of raid, fractal and strike encounters derived from achievements.

use crate::{
    api::AccountSource,
    entities::api_key,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// How an encounter's completion is proven.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Encounter {
    /// One achievement has to be done
    SingleAchievement {
        /// Encounter name
        name: String,
        /// Achievement id
        id: u32,
    },
    /// Every listed achievement has to be done
    AllAchievements {
        /// Encounter name
        name: String,
        /// Achievement ids
        ids: Vec<u32>,
    },
    /// One achievement has to reach a progress value
    ProgressedAchievement {
        /// Encounter name
        name: String,
        /// Achievement id
        id: u32,
        /// Required `current` value
        progress: u32,
    },
}

/// A named group of encounters (e.g. a raid or fractal tier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillProofArea {
    /// Area name
    pub name: String,
    /// Encounters, in display order
    pub encounters: Vec<Encounter>,
}

/// One entry of `account/achievements`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AchievementProgress {
    /// Achievement id
    pub id: u32,
    /// Whether the achievement is done
    #[serde(default)]
    pub done: bool,
    /// Current progress
    #[serde(default)]
    pub current: u32,
}

impl Encounter {
    /// Display name of the encounter.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::SingleAchievement { name, .. }
            | Self::AllAchievements { name, .. }
            | Self::ProgressedAchievement { name, .. } => name,
        }
    }

    /// Achievement ids this encounter depends on.
    #[must_use]
    pub fn achievement_ids(&self) -> Vec<u32> {
        match self {
            Self::SingleAchievement { id, .. } | Self::ProgressedAchievement { id, .. } => {
                vec![*id]
            }
            Self::AllAchievements { ids, .. } => ids.clone(),
        }
    }

    /// Whether the account's achievement progress proves this encounter.
    ///
    /// Achievements without progress are absent from `progress`, so missing ids count as not done.
    #[must_use]
    pub fn is_completed(&self, progress: &[AchievementProgress]) -> bool {
        let done = |id: u32| progress.iter().any(|a| a.id == id && a.done);
        match self {
            Self::SingleAchievement { id, .. } => done(*id),
            Self::AllAchievements { ids, .. } => ids.iter().all(|&id| done(id)),
            Self::ProgressedAchievement { id, progress: goal, .. } => progress
                .iter()
                .any(|a| a.id == *id && a.current >= *goal),
        }
    }
}

/// Every achievement id needed to evaluate `areas`, in area order.
#[must_use]
pub fn achievement_ids(areas: &[KillProofArea]) -> Vec<u32> {
    areas
        .iter()
        .flat_map(|area| &area.encounters)
        .flat_map(Encounter::achievement_ids)
        .collect()
}

/// Completion of each encounter of an area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaProgress {
    /// Area name
    pub name: String,
    /// `(encounter name, completed)` in display order
    pub encounters: Vec<(String, bool)>,
}

/// Evaluates every encounter of `areas`.
#[must_use]
pub fn evaluate(areas: &[KillProofArea], progress: &[AchievementProgress]) -> Vec<AreaProgress> {
    areas
        .iter()
        .map(|area| AreaProgress {
            name: area.name.clone(),
            encounters: area
                .encounters
                .iter()
                .map(|e| (e.name().to_string(), e.is_completed(progress)))
                .collect(),
        })
        .collect()
}

/// Fetches the account's progress on every achievement the areas depend on.
///
/// The API answers 404 when none of the requested achievements has progress,
/// which is reported as an empty list.
#[instrument(skip_all, fields(account = %key.account_name))]
pub async fn fetch_kill_proof<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    areas: &[KillProofArea],
) -> Result<Vec<AreaProgress>> {
    crate::core::account::require_permissions(key, &["progression"])?;
    let ids = achievement_ids(areas)
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    let endpoint = format!("account/achievements?ids={ids}");
    let progress = match source
        .get::<Vec<AchievementProgress>>(&endpoint, &key.key)
        .await
    {
        Ok(progress) => progress,
        Err(Error::NotFound { .. }) => {
            debug!("No progress on any kill proof achievement");
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    Ok(evaluate(areas, &progress))
}
