//! Static game data: document types and batched lookups.
//!
//! Lookups go through the [`GameData`] trait. Every method takes a whole batch of
//! ids so a caller resolving a build or a search issues one query per document
//! kind, no matter how many slots reference it. Ids missing from the data are
//! simply absent from the returned list; callers decide whether that is an error.

use crate::{
    entities::{GameDocument, game_document},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{collections::HashMap, future::Future, hash::Hash};
use tracing::{debug, info, trace};

/// Collection holding profession documents.
pub const PROFESSIONS: &str = "professions";
/// Collection holding specialization documents.
pub const SPECIALIZATIONS: &str = "specializations";
/// Collection holding trait documents.
pub const TRAITS: &str = "traits";
/// Collection holding skill documents.
pub const SKILLS: &str = "skills";
/// Collection holding pet documents.
pub const PETS: &str = "pets";
/// Collection holding legend documents.
pub const LEGENDS: &str = "legends";
/// Collection holding item documents.
pub const ITEMS: &str = "items";

/// A profession and its skill palette table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profession {
    /// Profession id, which is also its English name (e.g. "Ranger")
    pub id: String,
    /// Display name
    pub name: String,
    /// Code used in build template links
    pub code: u8,
    /// `(palette id, skill id)` pairs
    #[serde(default)]
    pub skills_by_palette: Vec<(u16, u32)>,
    /// Icon URL
    #[serde(default)]
    pub icon: Option<String>,
}

impl Profession {
    /// Skill id for a palette id; the first matching entry wins.
    #[must_use]
    pub fn skill_for_palette(&self, palette: u16) -> Option<u32> {
        self.skills_by_palette
            .iter()
            .find(|(p, _)| *p == palette)
            .map(|&(_, skill)| skill)
    }

    /// Palette id for a skill id; the first matching entry wins.
    #[must_use]
    pub fn palette_for_skill(&self, skill: u32) -> Option<u16> {
        self.skills_by_palette
            .iter()
            .find(|(_, s)| *s == skill)
            .map(|&(palette, _)| palette)
    }
}

/// A specialization line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialization {
    /// Specialization id
    pub id: u32,
    /// Display name
    pub name: String,
    /// Owning profession id
    pub profession: String,
    /// Whether this is an elite specialization
    #[serde(default)]
    pub elite: bool,
    /// Minor trait ids, tier order
    #[serde(default)]
    pub minor_traits: Vec<u32>,
    /// Major trait ids, three per tier in tier order
    #[serde(default)]
    pub major_traits: Vec<u32>,
}

/// A trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trait {
    /// Trait id
    pub id: u32,
    /// Display name
    pub name: String,
    /// Tier, 1 to 3
    #[serde(default)]
    pub tier: u8,
    /// "Major" or "Minor"
    #[serde(default)]
    pub slot: Option<String>,
    /// Description text
    #[serde(default)]
    pub description: Option<String>,
    /// Owning specialization id
    #[serde(default)]
    pub specialization: Option<u32>,
    /// Tooltip facts
    #[serde(default)]
    pub facts: Vec<Fact>,
}

/// A skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Skill id
    pub id: u32,
    /// Display name
    pub name: String,
    /// Skill bar slot (e.g. "Heal", "Utility", "Elite")
    #[serde(default)]
    pub slot: Option<String>,
    /// Description text
    #[serde(default)]
    pub description: Option<String>,
    /// Professions able to use the skill; empty for shared and monster skills
    #[serde(default)]
    pub professions: Vec<String>,
    /// Weapon a weapon skill belongs to (e.g. "Greatsword")
    #[serde(default)]
    pub weapon_type: Option<String>,
    /// Tooltip facts
    #[serde(default)]
    pub facts: Vec<Fact>,
}

impl Skill {
    /// Human readable kind of skill derived from its slot, e.g. "Greatsword skill 2".
    #[must_use]
    pub fn kind_label(&self) -> String {
        let slot = self.slot.as_deref().unwrap_or_default();
        let (base, number) = slot
            .split_once('_')
            .map_or((slot, None), |(base, number)| (base, Some(number)));
        match (base, number) {
            ("Weapon", Some(n)) => {
                let weapon = self
                    .weapon_type
                    .as_deref()
                    .filter(|w| *w != "None")
                    .unwrap_or("Weapon");
                format!("{weapon} skill {n}")
            }
            ("Profession", Some(n)) => format!("Profession skill {n}"),
            ("Downed", Some(n)) => format!("Downed skill {n}"),
            ("Heal", _) => "Heal skill".to_string(),
            ("Elite", _) => "Elite skill".to_string(),
            ("Pet", _) => "Pet skill".to_string(),
            _ => "Utility skill".to_string(),
        }
    }
}

/// One line of a skill or trait tooltip.
///
/// Only the fields the tooltip renders are kept; the API sends many more fact types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Label (e.g. "Range")
    #[serde(default)]
    pub text: Option<String>,
    /// Fact type (e.g. "Distance", "Buff")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Plain value, a number or a flag
    #[serde(default)]
    pub value: Option<Value>,
    /// Distance in units
    #[serde(default)]
    pub distance: Option<u32>,
    /// Percentage
    #[serde(default)]
    pub percent: Option<Value>,
    /// Duration in seconds
    #[serde(default)]
    pub duration: Option<u32>,
    /// Applied boon or condition
    #[serde(default)]
    pub status: Option<String>,
    /// Stacks applied
    #[serde(default)]
    pub apply_count: Option<u32>,
}

/// A ranger pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    /// Pet id
    pub id: u32,
    /// Display name
    pub name: String,
}

/// A revenant legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Legend {
    /// Legend id (e.g. "Legend1")
    pub id: String,
    /// Code used in build template links
    pub code: u8,
    /// Legend swap skill id
    pub swap: u32,
    /// Heal skill id
    #[serde(default)]
    pub heal: u32,
    /// Elite skill id
    #[serde(default)]
    pub elite: u32,
    /// Utility skill ids
    #[serde(default)]
    pub utilities: Vec<u32>,
}

/// An item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Item id
    pub id: u32,
    /// Display name
    pub name: String,
    /// Rarity (e.g. "Exotic")
    #[serde(default)]
    pub rarity: String,
    /// Item type (e.g. "UpgradeComponent")
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Whether the item is slotted into other items (runes, sigils, infusions)
    #[serde(default)]
    pub is_upgrade: bool,
}

/// Batched static game data lookups.
pub trait GameData: Sync {
    /// All professions.
    fn professions(&self) -> impl Future<Output = Result<Vec<Profession>>> + Send;
    /// Specializations with the given ids.
    fn specializations(
        &self,
        ids: &[u32],
    ) -> impl Future<Output = Result<Vec<Specialization>>> + Send;
    /// Traits with the given ids.
    fn traits(&self, ids: &[u32]) -> impl Future<Output = Result<Vec<Trait>>> + Send;
    /// Skills with the given ids.
    fn skills(&self, ids: &[u32]) -> impl Future<Output = Result<Vec<Skill>>> + Send;
    /// Pets with the given ids.
    fn pets(&self, ids: &[u32]) -> impl Future<Output = Result<Vec<Pet>>> + Send;
    /// All legends.
    fn legends(&self) -> impl Future<Output = Result<Vec<Legend>>> + Send;
    /// Items with the given ids.
    fn items(&self, ids: &[u32]) -> impl Future<Output = Result<Vec<Item>>> + Send;
}

/// Indexes documents by a key.
pub fn index_by<T, K, F>(docs: Vec<T>, key: F) -> HashMap<K, T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    docs.into_iter().map(|doc| (key(&doc), doc)).collect()
}

/// Looks up an id in an index, reporting which kind of document was missing.
pub fn require<'a, K, T>(index: &'a HashMap<K, T>, kind: &'static str, id: &K) -> Result<&'a T>
where
    K: Eq + Hash + std::fmt::Display,
{
    index.get(id).ok_or_else(|| Error::not_found(kind, id))
}

/// Finds the profession with the given build link code.
///
/// An unknown code means the chat code itself is bad.
pub async fn profession_by_code<G: GameData>(game_data: &G, code: u8) -> Result<Profession> {
    game_data
        .professions()
        .await?
        .into_iter()
        .find(|p| p.code == code)
        .ok_or_else(|| Error::malformed(format!("unknown profession code {code}")))
}

/// Finds the profession with the given id.
pub async fn profession_by_id<G: GameData>(game_data: &G, id: &str) -> Result<Profession> {
    game_data
        .professions()
        .await?
        .into_iter()
        .find(|p| p.id == id)
        .ok_or_else(|| Error::not_found("profession", id))
}

/// An autocomplete choice grouping items that share name, rarity and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemChoice {
    /// Item name
    pub name: String,
    /// Item rarity
    pub rarity: String,
    /// Every item id with this name, rarity and type
    pub ids: Vec<u32>,
}

impl ItemChoice {
    /// Label shown to the user.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.rarity)
    }

    /// Space separated ids, the value submitted back to the search command.
    #[must_use]
    pub fn value(&self) -> String {
        self.ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parses a choice value, or a plain item id typed by hand.
///
/// Returns `None` when any part is not an id.
#[must_use]
pub fn parse_choice_value(value: &str) -> Option<Vec<u32>> {
    let ids: Vec<u32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    (!ids.is_empty()).then_some(ids)
}

// Discord caps choice values at 100 characters.
const MAX_CHOICE_VALUE_LEN: usize = 100;

/// Groups items by name, rarity and type, sorted by name.
///
/// Groups whose id list would not fit in a choice value are dropped.
#[must_use]
pub fn consolidate_items(items: Vec<Item>) -> Vec<ItemChoice> {
    let mut groups: Vec<(String, ItemChoice)> = Vec::new();
    for item in items {
        if let Some((_, choice)) = groups.iter_mut().find(|(kind, c)| {
            c.name == item.name && c.rarity == item.rarity && *kind == item.kind
        }) {
            choice.ids.push(item.id);
            continue;
        }
        groups.push((
            item.kind,
            ItemChoice {
                name: item.name,
                rarity: item.rarity,
                ids: vec![item.id],
            },
        ));
    }
    let mut choices: Vec<ItemChoice> = groups
        .into_iter()
        .map(|(_, choice)| choice)
        .filter(|choice| choice.value().len() <= MAX_CHOICE_VALUE_LEN)
        .collect();
    choices.sort_by(|a, b| a.name.cmp(&b.name));
    choices
}

// Rows per INSERT, well below SQLite's bound parameter limit.
const INSERT_CHUNK: usize = 500;

// Name matches read before filtering and collapsing duplicate names.
const SEARCH_ROWS: u64 = 200;

/// Game data backed by the `game_documents` table.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    db: DatabaseConnection,
}

impl DocumentStore {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a document in a collection.
    pub async fn insert_document<T: Serialize + Sync>(
        &self,
        collection: &str,
        doc_id: &str,
        name: Option<&str>,
        body: &T,
    ) -> Result<()> {
        let document = game_document::ActiveModel {
            collection: Set(collection.to_string()),
            doc_id: Set(doc_id.to_string()),
            name: Set(name.map(str::to_string)),
            body: Set(serde_json::to_string(body)?),
            ..Default::default()
        };
        document.insert(&self.db).await?;
        trace!("Stored {collection}/{doc_id}");
        Ok(())
    }

    /// Replaces every document of a collection with `docs`.
    ///
    /// Each document is keyed by its `id` field and named by its `name` field.
    /// Returns the number of documents stored.
    pub async fn replace_collection(&self, collection: &str, docs: &[Value]) -> Result<usize> {
        let rows = docs
            .iter()
            .map(|doc| {
                let doc_id = match doc.get("id") {
                    Some(Value::String(id)) => id.clone(),
                    Some(Value::Number(id)) => id.to_string(),
                    _ => {
                        return Err(Error::Config {
                            message: format!("Document in {collection} has no id"),
                        });
                    }
                };
                Ok(game_document::ActiveModel {
                    collection: Set(collection.to_string()),
                    doc_id: Set(doc_id),
                    name: Set(doc.get("name").and_then(Value::as_str).map(str::to_string)),
                    body: Set(serde_json::to_string(doc)?),
                    ..Default::default()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let txn = self.db.begin().await?;
        GameDocument::delete_many()
            .filter(game_document::Column::Collection.eq(collection))
            .exec(&txn)
            .await?;
        for chunk in rows.chunks(INSERT_CHUNK) {
            GameDocument::insert_many(chunk.to_vec())
                .exec_without_returning(&txn)
                .await?;
        }
        txn.commit().await?;
        info!("Stored {} documents in {collection}", docs.len());
        Ok(docs.len())
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> Result<u64> {
        GameDocument::find()
            .filter(game_document::Column::Collection.eq(collection))
            .count(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn fetch_many<T: DeserializeOwned>(&self, collection: &str, ids: &[u32]) -> Result<Vec<T>> {
        let mut keys: Vec<String> = ids.iter().map(u32::to_string).collect();
        keys.sort();
        keys.dedup();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Fetching {} documents from {collection}", keys.len());
        let rows = GameDocument::find()
            .filter(game_document::Column::Collection.eq(collection))
            .filter(game_document::Column::DocId.is_in(keys))
            .all(&self.db)
            .await?;
        decode_rows(rows)
    }

    async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        let rows = GameDocument::find()
            .filter(game_document::Column::Collection.eq(collection))
            .order_by_asc(game_document::Column::Id)
            .all(&self.db)
            .await?;
        decode_rows(rows)
    }

    async fn search_named<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &str,
        limit: u64,
    ) -> Result<Vec<T>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let rows = GameDocument::find()
            .filter(game_document::Column::Collection.eq(collection))
            .filter(game_document::Column::Name.contains(query))
            .order_by_asc(game_document::Column::Name)
            .order_by_asc(game_document::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        decode_rows(rows)
    }

    /// Items whose name contains `query`, grouped for autocomplete.
    pub async fn search_items(&self, query: &str, limit: u64) -> Result<Vec<ItemChoice>> {
        Ok(consolidate_items(self.search_named(ITEMS, query, limit).await?))
    }

    /// Profession skills whose name contains `query`, one per name, sorted by name.
    pub async fn search_skills(&self, query: &str, limit: usize) -> Result<Vec<Skill>> {
        let mut skills: Vec<Skill> = self.search_named(SKILLS, query, SEARCH_ROWS).await?;
        skills.retain(|skill| !skill.professions.is_empty());
        skills.dedup_by(|a, b| a.name == b.name);
        skills.truncate(limit);
        Ok(skills)
    }

    /// Traits whose name contains `query`, sorted by name.
    pub async fn search_traits(&self, query: &str, limit: usize) -> Result<Vec<Trait>> {
        let mut traits: Vec<Trait> = self.search_named(TRAITS, query, SEARCH_ROWS).await?;
        traits.dedup_by(|a, b| a.name == b.name);
        traits.truncate(limit);
        Ok(traits)
    }

    /// Resolves user input to a skill: an id, else the first name match.
    pub async fn find_skill(&self, input: &str) -> Result<Option<Skill>> {
        if let Ok(id) = input.trim().parse::<u32>() {
            return Ok(self.skills(&[id]).await?.into_iter().next());
        }
        Ok(self.search_skills(input, 1).await?.into_iter().next())
    }

    /// Resolves user input to a trait: an id, else the first name match.
    pub async fn find_trait(&self, input: &str) -> Result<Option<Trait>> {
        if let Ok(id) = input.trim().parse::<u32>() {
            return Ok(self.traits(&[id]).await?.into_iter().next());
        }
        Ok(self.search_traits(input, 1).await?.into_iter().next())
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<game_document::Model>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_str(&row.body).map_err(Error::from))
        .collect()
}

impl GameData for DocumentStore {
    async fn professions(&self) -> Result<Vec<Profession>> {
        self.fetch_all(PROFESSIONS).await
    }

    async fn specializations(&self, ids: &[u32]) -> Result<Vec<Specialization>> {
        self.fetch_many(SPECIALIZATIONS, ids).await
    }

    async fn traits(&self, ids: &[u32]) -> Result<Vec<Trait>> {
        self.fetch_many(TRAITS, ids).await
    }

    async fn skills(&self, ids: &[u32]) -> Result<Vec<Skill>> {
        self.fetch_many(SKILLS, ids).await
    }

    async fn pets(&self, ids: &[u32]) -> Result<Vec<Pet>> {
        self.fetch_many(PETS, ids).await
    }

    async fn legends(&self) -> Result<Vec<Legend>> {
        self.fetch_all(LEGENDS).await
    }

    async fn items(&self, ids: &[u32]) -> Result<Vec<Item>> {
        self.fetch_many(ITEMS, ids).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{setup_game_data, setup_test_db};
    use serde_json::json;

    fn item(id: u32, name: &str, rarity: &str, kind: &str) -> Item {
        Item {
            id,
            name: name.to_string(),
            rarity: rarity.to_string(),
            kind: kind.to_string(),
            is_upgrade: false,
        }
    }

    #[tokio::test]
    async fn test_batched_lookup_skips_missing_ids() -> Result<()> {
        let store = setup_game_data().await?;
        let specs = store.specializations(&[42, 42, 9999]).await?;
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "Zeal");
        assert!(store.skills(&[]).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_profession_lookups() -> Result<()> {
        let store = setup_game_data().await?;
        let ranger = profession_by_code(&store, 4).await?;
        assert_eq!(ranger.id, "Ranger");
        assert_eq!(ranger.skill_for_palette(200), Some(12489));
        assert_eq!(ranger.palette_for_skill(12489), Some(200));

        let err = profession_by_code(&store, 77).await.unwrap_err();
        assert!(matches!(err, Error::MalformedCode { .. }));
        let err = profession_by_id(&store, "Tengu").await.unwrap_err();
        assert!(matches!(err, Error::LookupNotFound { kind: "profession", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_search_items_groups_duplicates() -> Result<()> {
        let store = setup_game_data().await?;
        let choices = store.search_items("Insight", 25).await?;
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].name, "Legendary Insight");
        assert_eq!(choices[0].value(), "77302 77303");
        assert_eq!(choices[0].label(), "Legendary Insight - Legendary");
        assert!(store.search_items("   ", 25).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_search_skills_keeps_profession_skills() -> Result<()> {
        let store = setup_game_data().await?;
        let skills = store.search_skills("Signet", 25).await?;
        let names: Vec<_> = skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Bane Signet",
                "Signet of Courage",
                "Signet of Resolve",
                "Signet of Stone",
                "Signet of Wrath",
                "Signet of the Hunt",
                "Signet of the Wild",
            ]
        );
        assert_eq!(skills[0].id, 9152);
        assert_eq!(store.search_skills("Signet", 2).await?.len(), 2);
        assert!(store.search_skills("", 25).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_find_skill_and_trait() -> Result<()> {
        let store = setup_game_data().await?;
        assert_eq!(store.find_skill("9102").await?.unwrap().name, "Shelter");
        assert_eq!(store.find_skill("jade winds").await?.unwrap().id, 28406);
        assert!(store.find_skill("31000").await?.unwrap().professions.is_empty());
        assert!(store.find_skill("Meteor Shower").await?.is_none());

        let found = store.find_trait("Radiance Major 1611").await?.unwrap();
        assert_eq!((found.id, found.tier), (1611, 1));
        assert_eq!(store.find_trait("4213").await?.unwrap().name, "Zeal Major 4213");
        assert_eq!(store.search_traits("Zeal Minor", 25).await?.len(), 3);
        assert!(store.find_trait("99999").await?.is_none());
        Ok(())
    }

    #[test]
    fn test_skill_kind_label() {
        let skill = |slot: Option<&str>, weapon: Option<&str>| Skill {
            id: 1,
            name: "Skill".to_string(),
            slot: slot.map(str::to_string),
            description: None,
            professions: vec!["Guardian".to_string()],
            weapon_type: weapon.map(str::to_string),
            facts: Vec::new(),
        };
        assert_eq!(skill(Some("Weapon_2"), Some("Greatsword")).kind_label(), "Greatsword skill 2");
        assert_eq!(skill(Some("Weapon_4"), Some("None")).kind_label(), "Weapon skill 4");
        assert_eq!(skill(Some("Profession_1"), None).kind_label(), "Profession skill 1");
        assert_eq!(skill(Some("Downed_3"), None).kind_label(), "Downed skill 3");
        assert_eq!(skill(Some("Heal"), None).kind_label(), "Heal skill");
        assert_eq!(skill(Some("Pet"), None).kind_label(), "Pet skill");
        assert_eq!(skill(Some("Toolbelt"), None).kind_label(), "Utility skill");
        assert_eq!(skill(None, None).kind_label(), "Utility skill");
    }

    #[tokio::test]
    async fn test_replace_collection() -> Result<()> {
        let store = DocumentStore::new(setup_test_db().await?);
        let first = vec![
            json!({"id": 1, "name": "Juvenile Jungle Stalker"}),
            json!({"id": 2, "name": "Juvenile Wolf"}),
        ];
        assert_eq!(store.replace_collection(PETS, &first).await?, 2);
        store
            .replace_collection(PETS, &[json!({"id": 3, "name": "Juvenile Shark"})])
            .await?;
        assert_eq!(store.count(PETS).await?, 1);
        let pets = store.pets(&[1, 2, 3]).await?;
        assert_eq!(pets, vec![Pet { id: 3, name: "Juvenile Shark".to_string() }]);

        store
            .replace_collection(LEGENDS, &[json!({"id": "Legend1", "code": 1, "swap": 28419})])
            .await?;
        assert_eq!(store.legends().await?[0].id, "Legend1");

        let err = store
            .replace_collection(PETS, &[json!({"name": "Nameless"})])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(store.count(PETS).await?, 1);
        Ok(())
    }

    #[test]
    fn test_consolidate_items() {
        let choices = consolidate_items(vec![
            item(3, "Sigil of Force", "Exotic", "UpgradeComponent"),
            item(1, "Amalgamated Gemstone", "Exotic", "CraftingMaterial"),
            item(4, "Sigil of Force", "Exotic", "UpgradeComponent"),
            item(5, "Sigil of Force", "Rare", "UpgradeComponent"),
        ]);
        let names: Vec<_> = choices.iter().map(ItemChoice::label).collect();
        assert_eq!(
            names,
            vec![
                "Amalgamated Gemstone - Exotic",
                "Sigil of Force - Exotic",
                "Sigil of Force - Rare"
            ]
        );
        assert_eq!(choices[1].ids, vec![3, 4]);
    }

    #[test]
    fn test_parse_choice_value() {
        assert_eq!(parse_choice_value("24615 24616"), Some(vec![24615, 24616]));
        assert_eq!(parse_choice_value(" 19721,"), Some(vec![19721]));
        assert_eq!(parse_choice_value("Sigil of Force"), None);
        assert_eq!(parse_choice_value(""), None);
    }

    #[test]
    fn test_consolidate_drops_oversized_groups() {
        let items = (100_000..100_020)
            .map(|id| item(id, "Mystic Clover", "Rare", "Trophy"))
            .collect();
        assert!(consolidate_items(items).is_empty());
    }

    #[test]
    fn test_require_reports_kind_and_id() {
        let index = index_by(vec![item(1, "A", "Basic", "Trophy")], |i| i.id);
        assert!(require(&index, "item", &1).is_ok());
        let err = require(&index, "item", &2).unwrap_err();
        assert_eq!(err.to_string(), "No item found with id 2");
    }
}
