//! Shared test utilities.
//!
//! This module provides helpers for setting up an in-memory database, a seeded
//! game data store, and a fake API source answering from canned JSON.

use crate::{
    api::{AccountSource, PublicSource},
    core::gamedata::{
        DocumentStore, ITEMS, LEGENDS, PETS, PROFESSIONS, SKILLS, SPECIALIZATIONS, TRAITS,
    },
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a document store seeded with the fixture game data.
pub async fn setup_game_data() -> Result<DocumentStore> {
    let store = DocumentStore::new(setup_test_db().await?);
    seed_game_data(&store).await?;
    Ok(store)
}

/// Minor trait ids of a fixture specialization.
#[must_use]
pub fn minor_traits(spec: u32) -> Vec<u32> {
    (1..=3).map(|i| spec * 100 + i).collect()
}

/// Major trait ids of a fixture specialization, three per tier.
#[must_use]
pub fn major_traits(spec: u32) -> Vec<u32> {
    (11..=19).map(|i| spec * 100 + i).collect()
}

const FIXTURE_SPECIALIZATIONS: [(u32, &str, &str, bool); 7] = [
    (42, "Zeal", "Guardian", false),
    (16, "Radiance", "Guardian", false),
    (27, "Dragonhunter", "Guardian", true),
    (30, "Skirmishing", "Ranger", false),
    (32, "Wilderness Survival", "Ranger", false),
    (15, "Devastation", "Revenant", false),
    (3, "Invocation", "Revenant", false),
];

/// Seeds professions, specializations, traits, skills, pets, legends and items.
///
/// Palette tables:
/// * Guardian (code 1): palettes 100..=104 → skills 9102, 9150..=9153
/// * Ranger (code 4): palettes 200..=204 → skills 12489, 12491..=12493, 12497
/// * Revenant (code 9): palettes 300..=304 → skills 28219, 27322, 27505, 26821, 28406
pub async fn seed_game_data(store: &DocumentStore) -> Result<()> {
    let professions = [
        ("Guardian", 1, vec![(100, 9102), (101, 9150), (102, 9151), (103, 9152), (104, 9153)]),
        ("Ranger", 4, vec![(200, 12489), (201, 12491), (202, 12492), (203, 12493), (204, 12497)]),
        ("Revenant", 9, vec![(300, 28219), (301, 27322), (302, 27505), (303, 26821), (304, 28406)]),
    ];
    for (id, code, palettes) in professions {
        let doc = json!({"id": id, "name": id, "code": code, "skills_by_palette": palettes});
        store.insert_document(PROFESSIONS, id, Some(id), &doc).await?;
    }

    for (id, name, profession, elite) in FIXTURE_SPECIALIZATIONS {
        let doc = json!({
            "id": id,
            "name": name,
            "profession": profession,
            "elite": elite,
            "minor_traits": minor_traits(id),
            "major_traits": major_traits(id),
        });
        store
            .insert_document(SPECIALIZATIONS, &id.to_string(), Some(name), &doc)
            .await?;
        for (slot, traits) in [("Minor", minor_traits(id)), ("Major", major_traits(id))] {
            for (i, trait_id) in traits.into_iter().enumerate() {
                let name = format!("{name} {slot} {trait_id}");
                let tier = if slot == "Minor" { i + 1 } else { i / 3 + 1 };
                let doc = json!({"id": trait_id, "name": name, "tier": tier, "slot": slot});
                store
                    .insert_document(TRAITS, &trait_id.to_string(), Some(&name), &doc)
                    .await?;
            }
        }
    }

    let skills = [
        (9102, "Shelter", "Heal", "Guardian"),
        (9150, "Signet of Wrath", "Utility", "Guardian"),
        (9151, "Signet of Resolve", "Utility", "Guardian"),
        (9152, "Bane Signet", "Utility", "Guardian"),
        (9153, "Signet of Courage", "Elite", "Guardian"),
        (12489, "We Heal As One!", "Heal", "Ranger"),
        (12491, "Signet of Stone", "Utility", "Ranger"),
        (12492, "Signet of the Hunt", "Utility", "Ranger"),
        (12493, "Signet of the Wild", "Utility", "Ranger"),
        (12497, "Strength of the Pack!", "Elite", "Ranger"),
        (28219, "Enchanted Daggers", "Heal", "Revenant"),
        (27322, "Phase Traversal", "Utility", "Revenant"),
        (27505, "Riposting Shadows", "Utility", "Revenant"),
        (26821, "Impossible Odds", "Utility", "Revenant"),
        (28406, "Jade Winds", "Elite", "Revenant"),
        (28134, "Legendary Assassin Stance", "Profession_1", "Revenant"),
        (28419, "Legendary Demon Stance", "Profession_1", "Revenant"),
    ];
    for (id, name, slot, profession) in skills {
        let doc = json!({"id": id, "name": name, "slot": slot, "professions": [profession]});
        store
            .insert_document(SKILLS, &id.to_string(), Some(name), &doc)
            .await?;
    }
    // Monster version of a profession skill; no profession may use it.
    let doc = json!({"id": 31000, "name": "Bane Signet", "slot": "Utility", "professions": []});
    store
        .insert_document(SKILLS, "31000", Some("Bane Signet"), &doc)
        .await?;

    let pets = [
        (1, "Juvenile Jungle Stalker"),
        (2, "Juvenile Wolf"),
        (3, "Juvenile Shark"),
        (4, "Juvenile Armor Fish"),
    ];
    for (id, name) in pets {
        let doc = json!({"id": id, "name": name});
        store
            .insert_document(PETS, &id.to_string(), Some(name), &doc)
            .await?;
    }

    let legends = [("Legend1", 1, 28419), ("Legend2", 2, 28134)];
    for (id, code, swap) in legends {
        let doc = json!({"id": id, "code": code, "swap": swap, "heal": 0, "elite": 0, "utilities": []});
        store.insert_document(LEGENDS, id, None, &doc).await?;
    }

    let items = [
        (77302, "Legendary Insight", "Legendary", "Trophy", false),
        (77303, "Legendary Insight", "Legendary", "Trophy", false),
        (24615, "Superior Sigil of Force", "Exotic", "UpgradeComponent", true),
        (49424, "+1 Agony Infusion", "Rare", "UpgradeComponent", true),
    ];
    for (id, name, rarity, kind, is_upgrade) in items {
        let doc = json!({"id": id, "name": name, "rarity": rarity, "type": kind, "is_upgrade": is_upgrade});
        store
            .insert_document(ITEMS, &id.to_string(), Some(name), &doc)
            .await?;
    }
    Ok(())
}

/// Canned response of a [`FakeAccountSource`].
#[derive(Debug, Clone)]
pub enum FakeResponse {
    /// Successful JSON body
    Ok(Value),
    /// HTTP status failure
    Status(u16),
}

/// API source answering from canned JSON keyed by endpoint, with or without a key.
///
/// Unknown endpoints answer 404.
#[derive(Debug, Default, Clone)]
pub struct FakeAccountSource {
    responses: HashMap<String, FakeResponse>,
}

impl FakeAccountSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `endpoint` with `body`.
    #[must_use]
    pub fn with(mut self, endpoint: &str, body: Value) -> Self {
        self.responses
            .insert(endpoint.to_string(), FakeResponse::Ok(body));
        self
    }

    /// Answers `endpoint` with an HTTP error status.
    #[must_use]
    pub fn with_status(mut self, endpoint: &str, status: u16) -> Self {
        self.responses
            .insert(endpoint.to_string(), FakeResponse::Status(status));
        self
    }

    fn answer<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        match self.responses.get(endpoint) {
            Some(FakeResponse::Ok(body)) => Ok(serde_json::from_value(body.clone())?),
            Some(FakeResponse::Status(status)) => {
                Err(crate::api::status_error(endpoint, *status))
            }
            None => Err(Error::NotFound {
                endpoint: endpoint.to_string(),
            }),
        }
    }
}

impl AccountSource for FakeAccountSource {
    async fn get<T: DeserializeOwned + Send>(&self, endpoint: &str, _key: &str) -> Result<T> {
        self.answer(endpoint)
    }
}

impl PublicSource for FakeAccountSource {
    async fn get_public<T: DeserializeOwned + Send>(&self, endpoint: &str) -> Result<T> {
        self.answer(endpoint)
    }
}
