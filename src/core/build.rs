//! Build templates: resolving build chat codes into builds and back.
//!
//! A [`BuildRecord`] only holds ids. [`BuildDescription`] is the same build with the
//! profession, specialization, trait, skill, pet and legend documents resolved. All
//! documents of one kind are fetched in a single batched lookup.

use crate::{
    api::AccountSource,
    core::{
        account::require_permissions,
        chatcode::{BuildRecord, SKILL_SLOTS, SpecializationSlot, TraitSelection},
        gamedata::{
            GameData, Legend, Pet, Profession, Skill, Specialization, Trait, index_by,
            profession_by_code, profession_by_id, require,
        },
    },
    entities::api_key,
    errors::{Error, Result},
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

/// How a profession uses the profession-specific bytes of a build record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfessionKind {
    /// No extras
    Standard,
    /// Two terrestrial and two aquatic pets (Ranger)
    Pets,
    /// Two terrestrial and two aquatic legends (Revenant)
    Legends,
}

impl ProfessionKind {
    /// Strategy for a profession.
    #[must_use]
    pub fn of(profession: &Profession) -> Self {
        match profession.id.as_str() {
            "Ranger" => Self::Pets,
            "Revenant" => Self::Legends,
            _ => Self::Standard,
        }
    }
}

/// One resolved specialization line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializationBuild {
    /// Position of the line in the build record, 0 to 2
    pub slot: usize,
    /// The specialization
    pub specialization: Specialization,
    /// Active major trait per tier
    pub active_traits: [Option<u32>; 3],
    /// Minor and major trait documents of the line
    pub traits: HashMap<u32, Trait>,
}

impl SpecializationBuild {
    /// Trait selection derived from where each active trait sits in the major trait list.
    ///
    /// Traits that are not major traits of this line leave their tier empty.
    #[must_use]
    pub fn selection(&self) -> TraitSelection {
        let mut tiers = [0u8; 3];
        for trait_id in self.active_traits.iter().flatten() {
            let Some(position) = self
                .specialization
                .major_traits
                .iter()
                .position(|t| t == trait_id)
            else {
                continue;
            };
            if let (Some(tier), Ok(value)) = (tiers.get_mut(position / 3), u8::try_from(position % 3 + 1)) {
                *tier = value;
            }
        }
        TraitSelection::new(tiers)
    }

    /// Documents of the active major traits, tier order.
    pub fn active_trait_docs(&self) -> impl Iterator<Item = &Trait> {
        self.active_traits
            .iter()
            .flatten()
            .filter_map(|id| self.traits.get(id))
    }

    /// Documents of the minor traits, tier order.
    pub fn minor_trait_docs(&self) -> impl Iterator<Item = &Trait> {
        self.specialization
            .minor_traits
            .iter()
            .filter_map(|id| self.traits.get(id))
    }
}

/// Heal, three utilities and elite.
pub type SkillBar = [Option<Skill>; SKILL_SLOTS];

/// Profession-specific part of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfessionExtras {
    /// Nothing beyond the skill bars
    None,
    /// Ranger pets
    Pets {
        /// Terrestrial pets
        terrestrial: [Option<Pet>; 2],
        /// Aquatic pets
        aquatic: [Option<Pet>; 2],
    },
    /// Revenant legends
    Legends {
        /// Terrestrial legends
        terrestrial: [Option<Legend>; 2],
        /// Aquatic legends
        aquatic: [Option<Legend>; 2],
        /// Legend swap skills of the terrestrial legends
        swap_skills: Vec<Skill>,
        /// Inactive legend utility palettes, carried through unresolved
        inactive_utility_palettes: [u16; 6],
    },
}

/// A fully resolved build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescription {
    /// The profession
    pub profession: Profession,
    /// Up to three specialization lines, in slot order; empty slots are absent
    pub specializations: Vec<SpecializationBuild>,
    /// Terrestrial skill bar
    pub terrestrial: SkillBar,
    /// Aquatic skill bar
    pub aquatic: SkillBar,
    /// Pets or legends
    pub extras: ProfessionExtras,
}

impl BuildDescription {
    /// Decodes a `[&...]` build template chat code.
    #[instrument(skip(game_data))]
    pub async fn decode<G: GameData>(code: &str, game_data: &G) -> Result<Self> {
        let record = BuildRecord::from_chat_code(code)?;
        Self::from_record(&record, game_data).await
    }

    /// Resolves every id of a build record.
    pub async fn from_record<G: GameData>(record: &BuildRecord, game_data: &G) -> Result<Self> {
        let profession = profession_by_code(game_data, record.profession).await?;
        let kind = ProfessionKind::of(&profession);
        debug!("Decoding {} build ({kind:?})", profession.id);

        let chosen: Vec<(usize, &SpecializationSlot)> = record
            .specializations
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.id != 0)
            .collect();
        let spec_ids: Vec<u32> = chosen.iter().map(|(_, slot)| u32::from(slot.id)).collect();
        let mut spec_docs = index_by(game_data.specializations(&spec_ids).await?, |s| s.id);
        let mut selections = Vec::with_capacity(chosen.len());
        for (position, slot) in chosen {
            let id = u32::from(slot.id);
            let specialization = spec_docs
                .remove(&id)
                .ok_or_else(|| Error::not_found("specialization", id))?;
            let mut active_traits = [None; 3];
            for (tier, index) in slot.traits.major_trait_indexes() {
                let trait_id = specialization
                    .major_traits
                    .get(index)
                    .ok_or_else(|| Error::not_found("major trait", format!("{id}:{index}")))?;
                active_traits[tier] = Some(*trait_id);
            }
            selections.push((position, specialization, active_traits));
        }
        let specializations = resolve_traits(selections, game_data).await?;

        let terrestrial_ids = palettes_to_skills(&profession, &record.terrestrial_palettes)?;
        let aquatic_ids = palettes_to_skills(&profession, &record.aquatic_palettes)?;

        let legends = if kind == ProfessionKind::Legends {
            let by_code = index_by(game_data.legends().await?, |l| l.code);
            let pick = |code: u8| -> Result<Option<Legend>> {
                if code == 0 {
                    return Ok(None);
                }
                require(&by_code, "legend", &code).map(|l| Some(l.clone()))
            };
            Some([
                pick(record.extras[0])?,
                pick(record.extras[1])?,
                pick(record.extras[2])?,
                pick(record.extras[3])?,
            ])
        } else {
            None
        };

        let mut skill_ids: Vec<u32> = terrestrial_ids
            .iter()
            .chain(aquatic_ids.iter())
            .flatten()
            .copied()
            .collect();
        if let Some(legends) = &legends {
            skill_ids.extend(legends.iter().flatten().map(|l| l.swap));
        }
        let skills = index_by(game_data.skills(&skill_ids).await?, |s| s.id);
        let terrestrial = resolve_bar(&terrestrial_ids, &skills)?;
        let aquatic = resolve_bar(&aquatic_ids, &skills)?;

        let extras = match (kind, legends) {
            (ProfessionKind::Legends, Some([t1, t2, a1, a2])) => {
                let swap_skills = [&t1, &t2]
                    .into_iter()
                    .flatten()
                    .map(|legend| require(&skills, "skill", &legend.swap).cloned())
                    .collect::<Result<Vec<_>>>()?;
                ProfessionExtras::Legends {
                    terrestrial: [t1, t2],
                    aquatic: [a1, a2],
                    swap_skills,
                    inactive_utility_palettes: record.inactive_legend_palettes,
                }
            }
            (ProfessionKind::Pets, _) => {
                let pet_ids: Vec<u32> = record
                    .extras
                    .iter()
                    .filter(|&&id| id != 0)
                    .map(|&id| u32::from(id))
                    .collect();
                let pets = index_by(game_data.pets(&pet_ids).await?, |p| p.id);
                let pick = |id: u8| -> Result<Option<Pet>> {
                    if id == 0 {
                        return Ok(None);
                    }
                    require(&pets, "pet", &u32::from(id)).map(|p| Some(p.clone()))
                };
                ProfessionExtras::Pets {
                    terrestrial: [pick(record.extras[0])?, pick(record.extras[1])?],
                    aquatic: [pick(record.extras[2])?, pick(record.extras[3])?],
                }
            }
            _ => ProfessionExtras::None,
        };

        Ok(Self {
            profession,
            specializations,
            terrestrial,
            aquatic,
            extras,
        })
    }

    /// Builds a description from a character build tab as served by the API.
    #[instrument(skip_all, fields(profession = %tab.build.profession))]
    pub async fn from_build_tab<G: GameData>(tab: &BuildTab, game_data: &G) -> Result<Self> {
        let build = &tab.build;
        let profession = profession_by_id(game_data, &build.profession).await?;
        let kind = ProfessionKind::of(&profession);

        let lines: Vec<(usize, &TabSpecialization)> = build
            .specializations
            .iter()
            .take(3)
            .enumerate()
            .filter_map(|(position, line)| line.as_ref().map(|line| (position, line)))
            .filter(|(_, line)| line.id != 0)
            .collect();
        let spec_ids: Vec<u32> = lines.iter().map(|(_, line)| line.id).collect();
        let mut spec_docs = index_by(game_data.specializations(&spec_ids).await?, |s| s.id);
        let mut selections = Vec::with_capacity(lines.len());
        for (position, line) in lines {
            let specialization = spec_docs
                .remove(&line.id)
                .ok_or_else(|| Error::not_found("specialization", line.id))?;
            let mut active_traits = [None; 3];
            for trait_id in line.traits.iter().flatten() {
                let tier = specialization
                    .major_traits
                    .iter()
                    .position(|t| t == trait_id)
                    .map(|position| position / 3);
                if let Some(slot) = tier.and_then(|tier| active_traits.get_mut(tier)) {
                    *slot = Some(*trait_id);
                }
            }
            selections.push((position, specialization, active_traits));
        }
        let specializations = resolve_traits(selections, game_data).await?;

        let terrestrial_ids = build.skills.slots();
        let aquatic_ids = build.aquatic_skills.slots();

        let legends = if kind == ProfessionKind::Legends {
            let by_id = index_by(game_data.legends().await?, |l| l.id.clone());
            let pick = |id: Option<&String>| -> Result<Option<Legend>> {
                id.map(|id| require(&by_id, "legend", id).cloned()).transpose()
            };
            Some([
                pick(legend_at(&build.legends, 0))?,
                pick(legend_at(&build.legends, 1))?,
                pick(legend_at(&build.aquatic_legends, 0))?,
                pick(legend_at(&build.aquatic_legends, 1))?,
            ])
        } else {
            None
        };

        let mut skill_ids: Vec<u32> = terrestrial_ids
            .iter()
            .chain(aquatic_ids.iter())
            .flatten()
            .copied()
            .collect();
        if let Some(legends) = &legends {
            skill_ids.extend(legends.iter().flatten().map(|l| l.swap));
        }
        let skills = index_by(game_data.skills(&skill_ids).await?, |s| s.id);
        let terrestrial = resolve_bar(&terrestrial_ids, &skills)?;
        let aquatic = resolve_bar(&aquatic_ids, &skills)?;

        let extras = match (kind, legends) {
            (ProfessionKind::Legends, Some([t1, t2, a1, a2])) => {
                let swap_skills = [&t1, &t2]
                    .into_iter()
                    .flatten()
                    .map(|legend| require(&skills, "skill", &legend.swap).cloned())
                    .collect::<Result<Vec<_>>>()?;
                ProfessionExtras::Legends {
                    terrestrial: [t1, t2],
                    aquatic: [a1, a2],
                    swap_skills,
                    inactive_utility_palettes: [0; 6],
                }
            }
            (ProfessionKind::Pets, _) => {
                let tab_pets = build.pets.clone().unwrap_or_default();
                let pet_ids: Vec<u32> = tab_pets
                    .terrestrial
                    .iter()
                    .chain(tab_pets.aquatic.iter())
                    .flatten()
                    .copied()
                    .collect();
                let pets = index_by(game_data.pets(&pet_ids).await?, |p| p.id);
                let pick = |list: &[Option<u32>], i: usize| -> Result<Option<Pet>> {
                    list.get(i)
                        .copied()
                        .flatten()
                        .map(|id| require(&pets, "pet", &id).cloned())
                        .transpose()
                };
                ProfessionExtras::Pets {
                    terrestrial: [
                        pick(&tab_pets.terrestrial, 0)?,
                        pick(&tab_pets.terrestrial, 1)?,
                    ],
                    aquatic: [pick(&tab_pets.aquatic, 0)?, pick(&tab_pets.aquatic, 1)?],
                }
            }
            _ => ProfessionExtras::None,
        };

        Ok(Self {
            profession,
            specializations,
            terrestrial,
            aquatic,
            extras,
        })
    }

    /// Strategy used for the profession-specific bytes.
    #[must_use]
    pub fn kind(&self) -> ProfessionKind {
        ProfessionKind::of(&self.profession)
    }

    /// The skills shown for this build.
    ///
    /// Revenants show their legend swap skills, everybody else their terrestrial bar.
    #[must_use]
    pub fn active_skills(&self) -> Vec<&Skill> {
        match &self.extras {
            ProfessionExtras::Legends { swap_skills, .. } => swap_skills.iter().collect(),
            _ => self.terrestrial.iter().flatten().collect(),
        }
    }

    /// Terrestrial pets, if this is a pet build.
    #[must_use]
    pub fn active_pets(&self) -> Vec<&Pet> {
        match &self.extras {
            ProfessionExtras::Pets { terrestrial, .. } => terrestrial.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    /// Packs the build into a record.
    ///
    /// Skills without a palette entry and traits that are not major traits of their
    /// line are written as empty slots.
    pub fn to_record(&self) -> Result<BuildRecord> {
        let mut record = BuildRecord {
            profession: self.profession.code,
            ..BuildRecord::default()
        };
        for line in &self.specializations {
            let slot = record
                .specializations
                .get_mut(line.slot)
                .ok_or_else(|| {
                    Error::malformed(format!("specialization slot {} out of range", line.slot))
                })?;
            *slot = SpecializationSlot {
                id: narrow("specialization", line.specialization.id)?,
                traits: line.selection(),
            };
        }
        record.terrestrial_palettes = skills_to_palettes(&self.profession, &self.terrestrial);
        record.aquatic_palettes = skills_to_palettes(&self.profession, &self.aquatic);

        match &self.extras {
            ProfessionExtras::None => {}
            ProfessionExtras::Pets {
                terrestrial,
                aquatic,
            } => {
                for (byte, pet) in record
                    .extras
                    .iter_mut()
                    .zip(terrestrial.iter().chain(aquatic.iter()))
                {
                    *byte = pet.as_ref().map_or(Ok(0), |p| narrow("pet", p.id))?;
                }
            }
            ProfessionExtras::Legends {
                terrestrial,
                aquatic,
                inactive_utility_palettes,
                ..
            } => {
                for (byte, legend) in record
                    .extras
                    .iter_mut()
                    .zip(terrestrial.iter().chain(aquatic.iter()))
                {
                    *byte = legend.as_ref().map_or(0, |l| l.code);
                }
                record.inactive_legend_palettes = *inactive_utility_palettes;
            }
        }
        Ok(record)
    }

    /// Encodes the build as a `[&...]` chat code.
    pub fn encode(&self) -> Result<String> {
        Ok(self.to_record()?.to_chat_code())
    }
}

fn legend_at(list: &[Option<String>], i: usize) -> Option<&String> {
    list.get(i).and_then(Option::as_ref)
}

fn narrow(kind: &'static str, id: u32) -> Result<u8> {
    u8::try_from(id)
        .map_err(|_| Error::malformed(format!("{kind} id {id} does not fit in a build code")))
}

fn palettes_to_skills(
    profession: &Profession,
    palettes: &[u16; SKILL_SLOTS],
) -> Result<[Option<u32>; SKILL_SLOTS]> {
    let mut skills = [None; SKILL_SLOTS];
    for (skill, &palette) in skills.iter_mut().zip(palettes.iter()) {
        if palette == 0 {
            continue;
        }
        *skill = Some(
            profession
                .skill_for_palette(palette)
                .ok_or_else(|| Error::not_found("skill palette", palette))?,
        );
    }
    Ok(skills)
}

fn skills_to_palettes(profession: &Profession, bar: &SkillBar) -> [u16; SKILL_SLOTS] {
    let mut palettes = [0; SKILL_SLOTS];
    for (palette, skill) in palettes.iter_mut().zip(bar.iter()) {
        *palette = skill
            .as_ref()
            .and_then(|s| profession.palette_for_skill(s.id))
            .unwrap_or(0);
    }
    palettes
}

fn resolve_bar(ids: &[Option<u32>; SKILL_SLOTS], skills: &HashMap<u32, Skill>) -> Result<SkillBar> {
    let mut bar: SkillBar = Default::default();
    for (slot, id) in bar.iter_mut().zip(ids.iter()) {
        if let Some(id) = id {
            *slot = Some(require(skills, "skill", id)?.clone());
        }
    }
    Ok(bar)
}

async fn resolve_traits<G: GameData>(
    selections: Vec<(usize, Specialization, [Option<u32>; 3])>,
    game_data: &G,
) -> Result<Vec<SpecializationBuild>> {
    let trait_ids: Vec<u32> = selections
        .iter()
        .flat_map(|(_, spec, _)| spec.minor_traits.iter().chain(spec.major_traits.iter()))
        .copied()
        .collect();
    let trait_docs = index_by(game_data.traits(&trait_ids).await?, |t| t.id);

    selections
        .into_iter()
        .map(|(slot, specialization, active_traits)| {
            let traits = specialization
                .minor_traits
                .iter()
                .chain(specialization.major_traits.iter())
                .map(|id| require(&trait_docs, "trait", id).map(|t| (*id, t.clone())))
                .collect::<Result<HashMap<_, _>>>()?;
            Ok(SpecializationBuild {
                slot,
                specialization,
                active_traits,
                traits,
            })
        })
        .collect()
}

/// A character build tab (`characters/:id/buildtabs`).
#[derive(Debug, Clone, Deserialize)]
pub struct BuildTab {
    /// Tab number, starting at 1
    #[serde(default)]
    pub tab: u32,
    /// Whether this is the character's active tab
    #[serde(default)]
    pub is_active: bool,
    /// The build stored in the tab
    pub build: TabBuild,
}

/// The build inside a build tab.
#[derive(Debug, Clone, Deserialize)]
pub struct TabBuild {
    /// Tab name
    #[serde(default)]
    pub name: String,
    /// Profession id
    pub profession: String,
    /// Specialization lines
    #[serde(default)]
    pub specializations: Vec<Option<TabSpecialization>>,
    /// Terrestrial skills
    #[serde(default)]
    pub skills: TabSkills,
    /// Aquatic skills
    #[serde(default)]
    pub aquatic_skills: TabSkills,
    /// Terrestrial legend ids
    #[serde(default)]
    pub legends: Vec<Option<String>>,
    /// Aquatic legend ids
    #[serde(default)]
    pub aquatic_legends: Vec<Option<String>>,
    /// Pets
    #[serde(default)]
    pub pets: Option<TabPets>,
}

/// A specialization line in a build tab.
#[derive(Debug, Clone, Deserialize)]
pub struct TabSpecialization {
    /// Specialization id
    pub id: u32,
    /// Chosen major trait ids
    #[serde(default)]
    pub traits: Vec<Option<u32>>,
}

/// One skill bar in a build tab.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabSkills {
    /// Heal skill
    #[serde(default)]
    pub heal: Option<u32>,
    /// Utility skills
    #[serde(default)]
    pub utilities: Vec<Option<u32>>,
    /// Elite skill
    #[serde(default)]
    pub elite: Option<u32>,
}

impl TabSkills {
    fn slots(&self) -> [Option<u32>; SKILL_SLOTS] {
        let utility = |i: usize| self.utilities.get(i).copied().flatten();
        [self.heal, utility(0), utility(1), utility(2), self.elite]
    }
}

/// Pets in a build tab.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TabPets {
    /// Terrestrial pet ids
    #[serde(default)]
    pub terrestrial: Vec<Option<u32>>,
    /// Aquatic pet ids
    #[serde(default)]
    pub aquatic: Vec<Option<u32>>,
}

/// Fetches a character's build tabs and picks one.
///
/// `tab` selects by tab number; without it the active tab is used.
#[instrument(skip(source, key), fields(account = %key.account_name))]
pub async fn fetch_build_tab<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    character: &str,
    tab: Option<u32>,
) -> Result<BuildTab> {
    require_permissions(key, &["characters", "builds"])?;
    let endpoint = format!(
        "characters/{}/buildtabs?tabs=all",
        character.trim().replace(' ', "%20")
    );
    let tabs: Vec<BuildTab> = source.get(&endpoint, &key.key).await?;
    debug!("Character has {} build tabs", tabs.len());
    tabs.into_iter()
        .find(|t| tab.map_or(t.is_active, |number| t.tab == number))
        .ok_or_else(|| Error::not_found("build tab", tab.map_or_else(|| "active".to_string(), |n| n.to_string())))
}
