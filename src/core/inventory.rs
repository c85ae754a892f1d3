//! Item search across every storage location of an account.
//!
//! [`fetch_inventory_snapshot`] gathers the account's storage from the API;
//! [`find_items_in_account`] then counts target items per location without any I/O.
//!
//! Locations are visited in a fixed order: bank, shared inventory, material storage,
//! then each character in the order the API lists them (bag items, bag contents,
//! equipment tabs in tab order), and trading post delivery last.

use crate::{
    api::AccountSource,
    core::account::require_permissions,
    entities::api_key,
    errors::Result,
};
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashSet},
    fmt::Debug,
    ops::AddAssign,
};
use tracing::{debug, instrument, warn};

/// Location name of the bank.
pub const BANK: &str = "bank";
/// Location name of the shared inventory slots.
pub const SHARED: &str = "shared";
/// Location name of material storage.
pub const MATERIAL_STORAGE: &str = "material storage";
/// Pooled location of items equipped from the legendary armory.
pub const LEGENDARY_ARMORY: &str = "legendary armory";
/// Location name of trading post pickups.
pub const TP_DELIVERY: &str = "TP delivery";

/// A storage or equipment slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Slot {
    /// Item id
    pub id: u32,
    /// Stack size; absent means one
    #[serde(default)]
    pub count: Option<u32>,
    /// Infusions slotted into the item
    #[serde(default)]
    pub infusions: Vec<u32>,
    /// Upgrade components slotted into the item
    #[serde(default)]
    pub upgrades: Vec<u32>,
    /// Where an equipped item comes from (e.g. "Equipped", "LegendaryArmory")
    #[serde(default)]
    pub location: Option<String>,
}

impl Slot {
    /// A slot holding a single item with no attachments.
    #[must_use]
    pub fn item(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    fn is_from_legendary_armory(&self) -> bool {
        self.location
            .as_deref()
            .is_some_and(|location| location.ends_with("LegendaryArmory"))
    }
}

/// A character bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Bag {
    /// Item id of the bag itself
    pub id: u32,
    /// Number of slots
    #[serde(default)]
    pub size: u32,
    /// Bag contents; empty slots are `None`
    #[serde(default)]
    pub inventory: Vec<Option<Slot>>,
}

/// One equipment tab of a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EquipmentTab {
    /// Tab number
    #[serde(default)]
    pub tab: u32,
    /// Tab name
    #[serde(default)]
    pub name: String,
    /// Equipped gear
    #[serde(default)]
    pub equipment: Vec<Slot>,
}

/// A character's inventory and equipment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Character {
    /// Character name
    pub name: String,
    /// Bags; empty bag slots are `None`
    #[serde(default)]
    pub bags: Vec<Option<Bag>>,
    /// Equipment tabs
    #[serde(default)]
    pub equipment_tabs: Vec<EquipmentTab>,
}

/// Trading post items waiting for pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Delivery {
    /// Coins waiting for pickup
    #[serde(default)]
    pub coins: u64,
    /// Items waiting for pickup
    #[serde(default)]
    pub items: Vec<Slot>,
}

/// Account storage at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventorySnapshot {
    /// Bank slots
    pub bank: Vec<Option<Slot>>,
    /// Shared inventory slots
    pub shared: Vec<Option<Slot>>,
    /// Material storage slots
    pub materials: Vec<Option<Slot>>,
    /// Characters
    pub characters: Vec<Character>,
    /// Trading post delivery items, if they could be fetched
    pub delivery: Option<Vec<Slot>>,
}

/// How much a slot contributes to one target item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// The slot holds the item itself
    OwnItem,
    /// The item is slotted as an infusion
    Infusions,
    /// The item is slotted as an upgrade component
    Upgrades,
}

/// Rules in evaluation order; the first non-zero contribution wins.
pub const AMOUNT_RULES: [AmountRule; 3] = [
    AmountRule::OwnItem,
    AmountRule::Infusions,
    AmountRule::Upgrades,
];

impl AmountRule {
    /// Contribution of `slot` to `item_id` under this rule.
    #[must_use]
    pub fn apply(self, slot: &Slot, item_id: u32) -> u64 {
        let occurrences = |ids: &[u32]| ids.iter().filter(|&&id| id == item_id).count() as u64;
        match self {
            Self::OwnItem if slot.id == item_id => u64::from(slot.count.unwrap_or(1)),
            Self::OwnItem => 0,
            Self::Infusions => occurrences(&slot.infusions),
            Self::Upgrades => occurrences(&slot.upgrades),
        }
    }
}

/// Amount of `item_id` a slot holds: the item itself, or else its infusions, or else its upgrades.
#[must_use]
pub fn slot_amount(slot: &Slot, item_id: u32) -> u64 {
    AMOUNT_RULES
        .iter()
        .map(|rule| rule.apply(slot, item_id))
        .find(|&amount| amount > 0)
        .unwrap_or(0)
}

/// Per-location count of one item. The count mode of a search is its `Tally` type.
pub trait Tally: Default + Clone + Debug + PartialEq + AddAssign {
    /// Adds `amount`, found geared or not.
    fn record(&mut self, amount: u64, geared: bool);
}

impl Tally for u64 {
    fn record(&mut self, amount: u64, _geared: bool) {
        *self += amount;
    }
}

/// Count split between storage and equipped gear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitCount {
    /// Found in bags and storage
    pub bag: u64,
    /// Found in equipped gear
    pub geared: u64,
}

impl SplitCount {
    /// Both parts added together.
    #[must_use]
    pub const fn total(self) -> u64 {
        self.bag + self.geared
    }
}

impl AddAssign for SplitCount {
    fn add_assign(&mut self, other: Self) {
        self.bag += other.bag;
        self.geared += other.geared;
    }
}

impl Tally for SplitCount {
    fn record(&mut self, amount: u64, geared: bool) {
        if geared {
            self.geared += amount;
        } else {
            self.bag += amount;
        }
    }
}

/// Counts per item id and location.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCounts<T> {
    counts: BTreeMap<u32, BTreeMap<String, T>>,
}

impl<T: Tally> ItemCounts<T> {
    fn new(item_ids: &[u32]) -> Self {
        Self {
            counts: item_ids.iter().map(|&id| (id, BTreeMap::new())).collect(),
        }
    }

    /// Locations holding the item. `None` only for ids that were not searched for.
    #[must_use]
    pub fn locations(&self, item_id: u32) -> Option<&BTreeMap<String, T>> {
        self.counts.get(&item_id)
    }

    /// Count of the item at one location, zero if absent.
    #[must_use]
    pub fn at(&self, item_id: u32, location: &str) -> T {
        self.counts
            .get(&item_id)
            .and_then(|locations| locations.get(location))
            .cloned()
            .unwrap_or_default()
    }

    /// Total of the item over every location.
    #[must_use]
    pub fn total(&self, item_id: u32) -> T {
        let mut total = T::default();
        for count in self.counts.get(&item_id).into_iter().flat_map(BTreeMap::values) {
            total += count.clone();
        }
        total
    }

    /// Item ids that were searched for.
    pub fn item_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.counts.keys().copied()
    }

    /// Collapses locations into one total per item.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<u32, T> {
        self.item_ids().map(|id| (id, self.total(id))).collect()
    }

    /// Totals per location across all searched items.
    #[must_use]
    pub fn by_location(&self) -> BTreeMap<String, T> {
        let mut merged: BTreeMap<String, T> = BTreeMap::new();
        for locations in self.counts.values() {
            for (location, count) in locations {
                *merged.entry(location.clone()).or_default() += count.clone();
            }
        }
        merged
    }

    fn record(&mut self, item_id: u32, location: &str, amount: u64, geared: bool) {
        if let Some(locations) = self.counts.get_mut(&item_id) {
            locations
                .entry(location.to_string())
                .or_default()
                .record(amount, geared);
        }
    }
}

struct Scan<'a, T> {
    targets: &'a [u32],
    counts: ItemCounts<T>,
    armory_seen: HashSet<u32>,
}

impl<T: Tally> Scan<'_, T> {
    fn visit<'s>(&mut self, slots: impl IntoIterator<Item = &'s Slot>, location: &str, geared: bool) {
        for slot in slots {
            self.visit_slot(slot, location, geared);
        }
    }

    fn visit_slot(&mut self, slot: &Slot, location: &str, geared: bool) {
        let mut location = location;
        if geared && slot.is_from_legendary_armory() {
            if !self.armory_seen.insert(slot.id) {
                return;
            }
            location = LEGENDARY_ARMORY;
        }
        for &item_id in self.targets {
            let amount = slot_amount(slot, item_id);
            if amount > 0 {
                self.counts.record(item_id, location, amount, geared);
            }
        }
    }
}

/// Counts the target items in every location of a snapshot.
///
/// Every target id is present in the result, with no locations if it was not found.
/// Gear equipped from the legendary armory is counted once per item id under
/// [`LEGENDARY_ARMORY`], however many characters have it equipped.
#[must_use]
pub fn find_items_in_account<T: Tally>(item_ids: &[u32], snapshot: &InventorySnapshot) -> ItemCounts<T> {
    let mut scan = Scan {
        targets: item_ids,
        counts: ItemCounts::new(item_ids),
        armory_seen: HashSet::new(),
    };

    for (location, slots) in [
        (BANK, &snapshot.bank),
        (SHARED, &snapshot.shared),
        (MATERIAL_STORAGE, &snapshot.materials),
    ] {
        scan.visit(slots.iter().flatten(), location, false);
    }

    for character in &snapshot.characters {
        let bags: Vec<&Bag> = character.bags.iter().flatten().collect();
        for bag in &bags {
            scan.visit_slot(&Slot::item(bag.id), &character.name, false);
        }
        for bag in &bags {
            scan.visit(bag.inventory.iter().flatten(), &character.name, false);
        }
        for tab in &character.equipment_tabs {
            scan.visit(&tab.equipment, &character.name, true);
        }
    }

    if let Some(delivery) = &snapshot.delivery {
        scan.visit(delivery, TP_DELIVERY, false);
    }

    debug!(
        "Scanned {} characters for {} items, {} armory items seen",
        snapshot.characters.len(),
        item_ids.len(),
        scan.armory_seen.len()
    );
    scan.counts
}

/// Fetches everything [`find_items_in_account`] scans.
///
/// Trading post delivery is only requested when the key has the `tradingpost`
/// permission; API failures on that request leave the delivery empty instead of
/// failing the whole fetch.
#[instrument(skip_all, fields(account = %key.account_name))]
pub async fn fetch_inventory_snapshot<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
) -> Result<InventorySnapshot> {
    require_permissions(key, &["inventories", "characters"])?;
    let api_key = key.key.as_str();

    let (bank, shared, materials, characters) = tokio::try_join!(
        source.get::<Vec<Option<Slot>>>("account/bank", api_key),
        source.get::<Vec<Option<Slot>>>("account/inventory", api_key),
        source.get::<Vec<Option<Slot>>>("account/materials", api_key),
        source.get::<Vec<Character>>("characters?page=0&page_size=200", api_key),
    )?;

    let delivery = if key.has_permission("tradingpost") {
        match source.get::<Delivery>("commerce/delivery", api_key).await {
            Ok(delivery) => Some(delivery.items),
            Err(e) if e.is_api_failure() => {
                warn!("Ignoring trading post delivery failure: {e}");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    Ok(InventorySnapshot {
        bank,
        shared,
        materials,
        characters,
        delivery,
    })
}
