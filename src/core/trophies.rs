//! Raid trophy (legendary insight and divination) totals.
//!
//! Trophies are counted from the wallet and from items found anywhere on the
//! account. Items crafted from trophies are worth the trophies that went into them;
//! groups with a reduced worth count their first `reduced_amount` items at that
//! worth, less whatever was already upgraded into the group named by `upgrades_to`.

use crate::{
    api::AccountSource,
    core::{
        account::require_permissions,
        inventory::{ItemCounts, fetch_inventory_snapshot, find_items_in_account},
    },
    entities::api_key,
    errors::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// A kind of raid trophy and where it can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidTrophy {
    /// Trophy name (e.g. "Insights")
    pub name: String,
    /// Wallet currency id holding the trophy, if any
    #[serde(default)]
    pub wallet: Option<u32>,
    /// Item groups worth trophies
    #[serde(default)]
    pub items: Vec<TrophyGroup>,
}

/// Items worth a fixed number of trophies each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrophyGroup {
    /// Group name, used by `upgrades_to` and in breakdowns
    #[serde(default)]
    pub name: Option<String>,
    /// Item ids in the group
    pub items: Vec<u32>,
    /// Trophies per item
    pub worth: u64,
    /// Whether the trophies were spent crafting these items
    #[serde(default)]
    pub crafted: bool,
    /// Trophies per item for the first `reduced_amount` items
    #[serde(default)]
    pub reduced_worth: Option<u64>,
    /// Number of items counted at `reduced_worth`
    #[serde(default)]
    pub reduced_amount: u64,
    /// Group these items can be upgraded into
    #[serde(default)]
    pub upgrades_to: Option<String>,
}

/// One wallet currency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalletEntry {
    /// Currency id
    pub id: u32,
    /// Amount held
    pub value: u64,
}

/// One line of a trophy breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrophySource {
    /// Held in the wallet
    Wallet {
        /// Trophies
        value: u64,
    },
    /// A reduced-worth group, counted as a whole
    Group {
        /// Group name
        name: String,
        /// Items found
        amount: u64,
        /// Trophies they are worth
        value: u64,
    },
    /// A single item
    Item {
        /// Item id
        id: u32,
        /// Items found
        amount: u64,
        /// Trophies they are worth
        value: u64,
        /// Trophies per item
        worth: u64,
    },
}

/// Trophies of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrophyTotal {
    /// Trophy name
    pub name: String,
    /// Trophies earned
    pub total: u64,
    /// Non-zero sources
    pub breakdown: Vec<TrophySource>,
}

/// Trophies of every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrophyTally {
    /// Kinds with at least one trophy
    pub trophies: Vec<TrophyTotal>,
    /// Trophies earned overall
    pub total: u64,
    /// Trophies spent in crafting
    pub crafted: u64,
}

impl TrophyTally {
    /// Trophies not spent in crafting.
    #[must_use]
    pub const fn on_hand(&self) -> u64 {
        self.total.saturating_sub(self.crafted)
    }
}

/// Every item id the trophies can be found as.
#[must_use]
pub fn trophy_item_ids(trophies: &[RaidTrophy]) -> Vec<u32> {
    trophies
        .iter()
        .flat_map(|trophy| &trophy.items)
        .flat_map(|group| group.items.iter().copied())
        .collect()
}

fn group_amount(group: &TrophyGroup, counts: &BTreeMap<u32, u64>) -> u64 {
    group
        .items
        .iter()
        .map(|id| counts.get(id).copied().unwrap_or(0))
        .sum()
}

/// Tallies trophies from item totals and the wallet.
///
/// # Errors
/// Returns [`Error::Config`] when a group upgrades into a group that does not exist.
pub fn tally_trophies(
    trophies: &[RaidTrophy],
    counts: &BTreeMap<u32, u64>,
    wallet: &[WalletEntry],
) -> Result<TrophyTally> {
    let mut tally = TrophyTally::default();

    for trophy in trophies {
        let mut total = 0;
        let mut breakdown = Vec::new();

        if let Some(entry) = trophy
            .wallet
            .and_then(|currency| wallet.iter().find(|e| e.id == currency))
        {
            total += entry.value;
            breakdown.push(TrophySource::Wallet { value: entry.value });
        }

        for group in &trophy.items {
            if let Some(reduced_worth) = group.reduced_worth {
                let upgraded = match &group.upgrades_to {
                    Some(target) => {
                        let target_group = trophy
                            .items
                            .iter()
                            .find(|g| g.name.as_deref() == Some(target.as_str()))
                            .ok_or_else(|| Error::Config {
                                message: format!(
                                    "Trophy group upgrades to unknown group '{target}'"
                                ),
                            })?;
                        group_amount(target_group, counts)
                    }
                    None => 0,
                };
                let amount = group_amount(group, counts);
                let reduced_amount = group.reduced_amount.saturating_sub(upgraded);
                let value = amount.min(reduced_amount) * reduced_worth
                    + amount.saturating_sub(reduced_amount) * group.worth;
                if value > 0 {
                    total += value;
                    if group.crafted {
                        tally.crafted += value;
                    }
                    breakdown.push(TrophySource::Group {
                        name: group.name.clone().unwrap_or_default(),
                        amount,
                        value,
                    });
                }
                continue;
            }

            for &id in &group.items {
                let amount = counts.get(&id).copied().unwrap_or(0);
                let value = amount * group.worth;
                if value > 0 {
                    total += value;
                    if group.crafted {
                        tally.crafted += value;
                    }
                    breakdown.push(TrophySource::Item {
                        id,
                        amount,
                        value,
                        worth: group.worth,
                    });
                }
            }
        }

        if total > 0 {
            tally.total += total;
            tally.trophies.push(TrophyTotal {
                name: trophy.name.clone(),
                total,
                breakdown,
            });
        }
    }
    Ok(tally)
}

/// Fetches the account's storage and wallet and tallies its trophies.
#[instrument(skip_all, fields(account = %key.account_name))]
pub async fn fetch_trophies<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    trophies: &[RaidTrophy],
) -> Result<TrophyTally> {
    require_permissions(key, &["inventories", "characters", "wallet"])?;
    let (snapshot, wallet) = tokio::try_join!(
        fetch_inventory_snapshot(source, key),
        source.get::<Vec<WalletEntry>>("account/wallet", &key.key),
    )?;
    let counts: ItemCounts<u64> = find_items_in_account(&trophy_item_ids(trophies), &snapshot);
    tally_trophies(trophies, &counts.flatten(), &wallet)
}
