//! Text rendering of computed results.
//!
//! The bot layer sends these strings as they are. Everything here is pure so
//! the layout can be tested without Discord.

use crate::core::{
    account::{AccountSummary, format_age},
    build::{BuildDescription, ProfessionExtras},
    chatcode::ChatLink,
    gamedata::{Fact, Skill, Trait},
    home::HomeUnlock,
    inventory::SplitCount,
    progress::AreaProgress,
    raids::RaidSummary,
    trophies::{TrophySource, TrophyTally},
    wvw::{World, WorldStats},
};
use serde_json::Value;
use std::{collections::BTreeMap, fmt::Write};

/// Discord's message length limit.
pub const MESSAGE_LIMIT: usize = 2000;

/// Renders a resolved build.
pub fn format_build(build: &BuildDescription, code: &str) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(out, "**{}** build", build.profession.name)?;
    for line in &build.specializations {
        let traits: Vec<&str> = line.active_trait_docs().map(|t| t.name.as_str()).collect();
        let traits = if traits.is_empty() {
            "no traits".to_string()
        } else {
            traits.join(" / ")
        };
        writeln!(out, "• {}: {traits}", line.specialization.name)?;
    }
    let skills: Vec<&str> = build.active_skills().iter().map(|s| s.name.as_str()).collect();
    if !skills.is_empty() {
        writeln!(out, "Skills: {}", skills.join(", "))?;
    }
    match &build.extras {
        ProfessionExtras::Pets { .. } => {
            let pets: Vec<&str> = build.active_pets().iter().map(|p| p.name.as_str()).collect();
            if !pets.is_empty() {
                writeln!(out, "Pets: {}", pets.join(", "))?;
            }
        }
        ProfessionExtras::Legends { .. } => {
            let bar: Vec<&str> = build.terrestrial.iter().flatten().map(|s| s.name.as_str()).collect();
            if !bar.is_empty() {
                writeln!(out, "Utilities: {}", bar.join(", "))?;
            }
        }
        ProfessionExtras::None => {}
    }
    write!(out, "`{code}`")?;
    Ok(out)
}

/// Renders a decoded chat link.
#[must_use]
pub fn format_chat_link(link: &ChatLink) -> String {
    match link {
        ChatLink::Coin(copper) => format!("Coin: {}", format_coins(u64::from(*copper))),
        ChatLink::Item(item) => {
            let mut text = format!("Item {} × {}", item.item_id, item.quantity);
            if let Some(skin) = item.skin_id {
                let _ = write!(text, ", skin {skin}");
            }
            if !item.upgrades.is_empty() {
                let upgrades: Vec<String> = item.upgrades.iter().map(u32::to_string).collect();
                let _ = write!(text, ", upgrades {}", upgrades.join(", "));
            }
            text
        }
        ChatLink::MapLink(id) => format!("Map link: point of interest {id}"),
        ChatLink::Skill(id) => format!("Skill {id}"),
        ChatLink::Trait(id) => format!("Trait {id}"),
        ChatLink::Recipe(id) => format!("Recipe {id}"),
        ChatLink::Wardrobe(id) => format!("Wardrobe skin {id}"),
        ChatLink::Outfit(id) => format!("Outfit {id}"),
        ChatLink::Build(record) => format!("Build template (profession code {})", record.profession),
        ChatLink::Other(kind) => kind.name().to_string(),
    }
}

/// Formats copper as gold, silver and copper.
#[must_use]
pub fn format_coins(copper: u64) -> String {
    let gold = copper / 10_000;
    let silver = copper % 10_000 / 100;
    let copper = copper % 100;
    match (gold, silver) {
        (0, 0) => format!("{copper}c"),
        (0, _) => format!("{silver}s {copper}c"),
        _ => format!("{gold}g {silver}s {copper}c"),
    }
}

/// Renders item search results as a table, largest stacks first.
///
/// Upgrade components show stored and slotted amounts separately.
/// Returns `None` when nothing was found.
#[must_use]
pub fn format_search_results(
    item_name: &str,
    is_upgrade: bool,
    results: &BTreeMap<String, SplitCount>,
) -> Option<String> {
    let mut rows: Vec<(&String, SplitCount)> = results
        .iter()
        .filter(|(_, count)| count.total() > 0)
        .map(|(location, count)| (location, *count))
        .collect();
    if rows.is_empty() {
        return None;
    }
    rows.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then_with(|| a.0.cmp(b.0)));

    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0).max(8);
    let header = if is_upgrade { "INV / GEAR" } else { "COUNT" };
    let mut lines = vec![
        format!("{:<width$} | {header}", "LOCATION"),
        format!("{}-|------", "-".repeat(width)),
    ];
    let mut total = 0;
    for (location, count) in rows {
        total += count.total();
        let amount = if is_upgrade && count.geared > 0 {
            format!("{} / {}", count.bag, count.geared)
        } else if is_upgrade {
            count.bag.to_string()
        } else {
            count.total().to_string()
        };
        lines.push(format!("{:<width$} | {amount}", location.to_uppercase()));
    }
    lines.push("-".repeat(width + 8));
    lines.push(format!("{:<width$} | {total}", "TOTAL"));
    Some(format!("**{item_name}**\n```ml\n{}\n```", lines.join("\n")))
}

/// Renders kill proof as a diff block: `+` completed, `-` not.
#[must_use]
pub fn format_kill_proof(areas: &[AreaProgress]) -> String {
    let mut out = String::new();
    for area in areas {
        out.push_str(&format!("**{}**\n```diff\n", area.name));
        for (name, done) in &area.encounters {
            let mark = if *done { "+✔" } else { "-✖" };
            out.push_str(&format!("{mark}{name}\n"));
        }
        out.push_str("```\n");
    }
    out.push_str("Green (+) means completed. Red (-) means not. CM stands for Challenge Mode.");
    out
}

/// Renders raid trophy totals; item ids missing from `item_names` are shown as ids.
#[must_use]
pub fn format_trophies(tally: &TrophyTally, item_names: &BTreeMap<u32, String>) -> String {
    let mut out = format!(
        "**{} Raid trophies earned**\n{} on hand, {} used in crafting\n",
        tally.total,
        tally.on_hand(),
        tally.crafted
    );
    for trophy in &tally.trophies {
        out.push_str(&format!("\n**{} Legendary {} earned**\n", trophy.total, trophy.name));
        for source in &trophy.breakdown {
            let line = match source {
                TrophySource::Wallet { value } => format!("Wallet - **{value}**"),
                TrophySource::Group { name, amount, value } => {
                    format!("{amount} {name} - **{value}**")
                }
                TrophySource::Item { id, amount, value, worth } => {
                    let name = item_names.get(id).cloned().unwrap_or_else(|| id.to_string());
                    if *worth == 1 {
                        format!("{name} - **{value}**")
                    } else {
                        format!("{amount} {name} - **{value}**")
                    }
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
    }
    out.trim_end().to_string()
}

/// Renders weekly raid progress.
#[must_use]
pub fn format_raid_summary(summary: &RaidSummary) -> String {
    let mut out = String::new();
    for wing in &summary.wings {
        let mut title = wing.name.clone();
        if wing.call_of_the_mists {
            title.push_str(" (Call of the Mists)");
        } else if wing.emboldened {
            title.push_str(" (Emboldened)");
        }
        let mark = if wing.done { "✅" } else { "❌" };
        out.push_str(&format!("**{title}** {mark}\n"));
        for (event, done) in &wing.events {
            let mark = if *done { "✅" } else { "❌" };
            out.push_str(&format!("> {mark} {event}\n"));
        }
    }
    out.push_str(&summary.description());
    if summary.outdated {
        out.push_str("\n❗ Data outdated for this week. Log into the game to update.");
    }
    out
}

/// Renders a world's match performance.
#[must_use]
pub fn format_world_stats(stats: &WorldStats) -> String {
    let ratio = stats
        .kill_death_ratio
        .map_or_else(|| "-".to_string(), |r| format!("{r:.2}"));
    let mut out = format!(
        "**{}** ({} team)\nScore: {}\nPoints per tick: {}\nVictory points: {}\nK/D ratio: {ratio}\nPopulation: {}",
        stats.name,
        stats.color,
        stats.score,
        stats.points_per_tick,
        stats.victory_points,
        stats.population
    );
    if !stats.linked_worlds.is_empty() {
        out.push_str(&format!("\nLinked with: {}", stats.linked_worlds.join(", ")));
    }
    out
}

/// Renders an account overview; `world` is the resolved home world name.
#[must_use]
pub fn format_account_summary(summary: &AccountSummary, world: &str) -> String {
    let account = &summary.account;
    let mut out = format!(
        "**{}**\nCreated account on: {}\nWvW server: {world}\nCommander tag: {}",
        account.name,
        account.created.format("%Y-%m-%d"),
        if account.commander { "Yes" } else { "No" }
    );
    if let Some(level) = account.fractal_level {
        out.push_str(&format!("\nFractal level: {level}"));
    }
    if let Some(rank) = account.wvw_rank {
        out.push_str(&format!("\nWvW rank: {rank}"));
    }
    if let Some(rank) = summary.pvp_rank {
        out.push_str(&format!("\nPvP rank: {rank}"));
    }
    if let Some(seconds) = summary.played_seconds {
        out.push_str(&format!("\nTotal time played: {}", format_age(seconds)));
    }
    if !summary.access.is_empty() {
        out.push_str(&format!("\nExpansion access: {}", summary.access.join(", ")));
    }
    out
}

/// Renders the world names, sorted, as one code block.
#[must_use]
pub fn format_world_list(worlds: &[World]) -> String {
    let mut names: Vec<&str> = worlds.iter().map(|world| world.name.as_str()).collect();
    names.sort_unstable();
    format!("Available worlds are: ```{}```", names.join(", "))
}

/// Renders the unlocks still missing under `title`, or `complete` when none are.
#[must_use]
pub fn format_home_unlocks<Id>(title: &str, missing: &[HomeUnlock<Id>], complete: &str) -> String {
    if missing.is_empty() {
        return complete.to_string();
    }
    let mut out = format!("**{title}**");
    for unlock in missing {
        out.push_str(&format!("\n• {}", unlock.guide));
    }
    out
}

const WIKI_URL: &str = "https://wiki.guildwars2.com/wiki/";

/// Wiki page of a skill or trait.
#[must_use]
pub fn wiki_url(name: &str) -> String {
    format!("{WIKI_URL}{}", name.replace(' ', "_"))
}

/// Removes the game's inline markup such as `<c=@reminder>` and `</c>`.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn format_fact(fact: &Fact) -> Option<String> {
    if let Some(status) = &fact.status {
        let mut line = status.clone();
        if let Some(count) = fact.apply_count.filter(|&n| n > 1) {
            line.push_str(&format!(" x{count}"));
        }
        if let Some(duration) = fact.duration.filter(|&d| d > 0) {
            line.push_str(&format!(" ({duration}s)"));
        }
        return Some(line);
    }
    let label = fact.text.as_deref().filter(|t| !t.is_empty())?;
    let value = fact
        .distance
        .map(|d| d.to_string())
        .or_else(|| fact.percent.as_ref().map(|p| format!("{p}%")))
        .or_else(|| fact.duration.map(|d| format!("{d}s")))
        .or_else(|| match &fact.value {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        });
    Some(value.map_or_else(|| label.to_string(), |value| format!("{label}: {value}")))
}

fn push_tooltip(out: &mut String, description: Option<&str>, facts: &[Fact]) {
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        out.push('\n');
        out.push_str(&strip_markup(description));
    }
    for line in facts.iter().filter_map(format_fact) {
        out.push_str(&format!("\n• {line}"));
    }
}

/// Renders a skill tooltip with a wiki link.
#[must_use]
pub fn format_skill(skill: &Skill) -> String {
    let mut out = format!("**{}** ({})", skill.name, skill.kind_label());
    push_tooltip(&mut out, skill.description.as_deref(), &skill.facts);
    if let [profession] = skill.professions.as_slice() {
        out.push_str(&format!("\nProfession: {profession}"));
    }
    out.push_str(&format!("\n<{}>", wiki_url(&skill.name)));
    out
}

/// Renders a trait tooltip with a wiki link.
#[must_use]
pub fn format_trait(found: &Trait) -> String {
    let mut out = format!("**{}**", found.name);
    match (found.slot.as_deref(), found.tier) {
        (Some(slot), tier) if tier > 0 => {
            out.push_str(&format!(" ({slot} trait, tier {tier})"));
        }
        (Some(slot), _) => out.push_str(&format!(" ({slot} trait)")),
        (None, _) => {}
    }
    push_tooltip(&mut out, found.description.as_deref(), &found.facts);
    out.push_str(&format!("\n<{}>", wiki_url(&found.name)));
    out
}

const FENCE: &str = "```";

/// Splits text into messages no longer than `limit` characters, breaking at lines.
///
/// A code block cut by a split is closed at the end of one message and reopened,
/// with its language tag, at the start of the next. Lines longer than the limit are cut.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();
    // Opening line of the code block `current` ends inside, if any.
    let mut open_fence: Option<String> = None;
    for line in text.lines() {
        let line: String = line.chars().take(limit).collect();
        let is_fence = line.starts_with(FENCE);
        let open_after = open_fence.is_some() != is_fence;
        let closing = if open_after { FENCE.len() + 1 } else { 0 };
        let needed = current.chars().count()
            + usize::from(!current.is_empty())
            + line.chars().count()
            + closing;
        if needed > limit && !current.is_empty() {
            if open_fence.is_some() {
                current.push('\n');
                current.push_str(FENCE);
            }
            messages.push(std::mem::take(&mut current));
            if let Some(fence) = &open_fence {
                current.push_str(fence);
            }
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(&line);
        if is_fence {
            open_fence = if open_fence.is_some() { None } else { Some(line) };
        }
    }
    if !current.is_empty() {
        messages.push(current);
    }
    messages
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            account::AccountInfo,
            chatcode::{BuildRecord, ItemLink, SpecializationSlot, TraitSelection},
            raids::WingProgress,
            trophies::TrophyTotal,
            wvw::TeamColor,
        },
        errors::Result,
        test_utils::setup_game_data,
    };
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_format_build() -> Result<()> {
        let store = setup_game_data().await?;
        let record = BuildRecord {
            profession: 1,
            specializations: [
                SpecializationSlot {
                    id: 42,
                    traits: TraitSelection::new([1, 2, 3]),
                },
                SpecializationSlot::default(),
                SpecializationSlot::default(),
            ],
            terrestrial_palettes: [100, 101, 102, 0, 104],
            ..BuildRecord::default()
        };
        let code = record.to_chat_code();
        let build = BuildDescription::decode(&code, &store).await?;
        let text = format_build(&build, &code)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "**Guardian** build");
        assert!(lines[1].starts_with("• Zeal: "));
        assert_eq!(
            lines[2],
            "Skills: Shelter, Signet of Wrath, Signet of Resolve, Signet of Courage"
        );
        assert_eq!(lines[3], format!("`{code}`"));
        Ok(())
    }

    #[test]
    fn test_format_coins() {
        assert_eq!(format_coins(5), "5c");
        assert_eq!(format_coins(1_05), "1s 5c");
        assert_eq!(format_coins(12_34_56), "12g 34s 56c");
    }

    #[test]
    fn test_format_chat_link() {
        let link = ChatLink::Item(ItemLink {
            quantity: 1,
            item_id: 11988,
            skin_id: None,
            upgrades: vec![24615],
        });
        assert_eq!(format_chat_link(&link), "Item 11988 × 1, upgrades 24615");
        assert_eq!(format_chat_link(&ChatLink::Coin(10_203)), "Coin: 1g 2s 3c");
    }

    #[test]
    fn test_search_results_table() {
        let results = BTreeMap::from([
            ("bank".to_string(), SplitCount { bag: 2, geared: 0 }),
            ("Zojja".to_string(), SplitCount { bag: 1, geared: 3 }),
            ("shared".to_string(), SplitCount::default()),
        ]);
        let text = format_search_results("Superior Sigil of Force", true, &results).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "**Superior Sigil of Force**");
        assert_eq!(lines[2], "LOCATION | INV / GEAR");
        assert_eq!(lines[4], "ZOJJA    | 1 / 3");
        assert_eq!(lines[5], "BANK     | 2");
        assert_eq!(lines[7], "TOTAL    | 6");
        assert!(!text.contains("SHARED"));

        let plain = format_search_results("Sigil", false, &results).unwrap();
        assert!(plain.contains("ZOJJA    | 4"));
        assert!(format_search_results("Sigil", false, &BTreeMap::new()).is_none());
    }

    #[test]
    fn test_format_kill_proof() {
        let text = format_kill_proof(&[AreaProgress {
            name: "Raids".to_string(),
            encounters: vec![("Vale Guardian".to_string(), true), ("Gorseval".to_string(), false)],
        }]);
        assert!(text.contains("+✔Vale Guardian\n-✖Gorseval"));
    }

    #[test]
    fn test_format_trophies() {
        let tally = TrophyTally {
            trophies: vec![TrophyTotal {
                name: "Insights".to_string(),
                total: 160,
                breakdown: vec![
                    TrophySource::Wallet { value: 10 },
                    TrophySource::Item { id: 80248, amount: 1, value: 150, worth: 150 },
                ],
            }],
            total: 160,
            crafted: 150,
        };
        let names = BTreeMap::from([(80248, "Perfected Envoy Helmet".to_string())]);
        let text = format_trophies(&tally, &names);
        assert!(text.starts_with("**160 Raid trophies earned**\n10 on hand, 150 used in crafting"));
        assert!(text.contains("Wallet - **10**"));
        assert!(text.contains("1 Perfected Envoy Helmet - **150**"));
    }

    #[test]
    fn test_format_raid_summary() {
        let summary = RaidSummary {
            wings: vec![WingProgress {
                name: "Spirit Vale".to_string(),
                events: vec![("Vale Guardian".to_string(), true)],
                done: true,
                call_of_the_mists: true,
                emboldened: false,
            }],
            bosses_left: 0,
            events_left: 0,
            outdated: true,
        };
        let text = format_raid_summary(&summary);
        assert!(text.starts_with("**Spirit Vale (Call of the Mists)** ✅"));
        assert!(text.contains("Everything completed that week"));
        assert!(text.contains("Data outdated"));
    }

    #[test]
    fn test_format_world_and_account() {
        let stats = WorldStats {
            name: "Anvil Rock".to_string(),
            color: TeamColor::Red,
            linked_worlds: vec!["Ehmry Bay".to_string()],
            score: 120,
            points_per_tick: 15,
            victory_points: 30,
            kill_death_ratio: None,
            population: "Very high".to_string(),
        };
        let text = format_world_stats(&stats);
        assert!(text.starts_with("**Anvil Rock** (red team)"));
        assert!(text.contains("K/D ratio: -"));
        assert!(text.ends_with("Linked with: Ehmry Bay"));

        let summary = AccountSummary {
            account: AccountInfo {
                id: "A".to_string(),
                name: "Test.1234".to_string(),
                world: 1001,
                created: Utc.with_ymd_and_hms(2015, 8, 28, 18, 0, 0).unwrap(),
                access: vec![],
                commander: false,
                fractal_level: Some(100),
                wvw_rank: None,
            },
            access: vec!["Path Of Fire".to_string()],
            pvp_rank: None,
            played_seconds: Some(3_600),
        };
        let text = format_account_summary(&summary, "Anvil Rock");
        assert!(text.contains("Created account on: 2015-08-28"));
        assert!(text.contains("Fractal level: 100"));
        assert!(text.contains("Total time played: 1 hours"));
        assert!(!text.contains("PvP rank"));
    }

    #[test]
    fn test_format_world_list() {
        let world = |id, name: &str| World {
            id,
            name: name.to_string(),
            population: "High".to_string(),
        };
        let text = format_world_list(&[world(1002, "Borlis Pass"), world(1001, "Anvil Rock")]);
        assert_eq!(text, "Available worlds are: ```Anvil Rock, Borlis Pass```");
    }

    #[test]
    fn test_format_home_unlocks() {
        let missing = vec![
            HomeUnlock { id: 1, guide: "Chicken".to_string() },
            HomeUnlock { id: 3, guide: "Spicy Flank Steak".to_string() },
        ];
        assert_eq!(
            format_home_unlocks("Cats you haven't collected yet", &missing, "All done"),
            "**Cats you haven't collected yet**\n• Chicken\n• Spicy Flank Steak"
        );
        let none: Vec<HomeUnlock<String>> = Vec::new();
        assert_eq!(format_home_unlocks("Nodes", &none, "All done"), "All done");
    }

    #[test]
    fn test_format_skill() {
        let skill: Skill = serde_json::from_value(serde_json::json!({
            "id": 9137,
            "name": "Whirling Wrath",
            "slot": "Weapon_2",
            "weapon_type": "Greatsword",
            "professions": ["Guardian"],
            "description": "Spin to deal damage. <c=@reminder>Projectile finisher.</c>",
            "facts": [
                {"text": "Range", "type": "Range", "value": 180},
                {"type": "Buff", "status": "Might", "apply_count": 3, "duration": 8},
                {"text": "Unblockable", "type": "Unblockable", "value": true},
                {"type": "NoData"}
            ]
        }))
        .unwrap();
        assert_eq!(
            format_skill(&skill),
            "**Whirling Wrath** (Greatsword skill 2)\n\
             Spin to deal damage. Projectile finisher.\n\
             • Range: 180\n\
             • Might x3 (8s)\n\
             • Unblockable\n\
             Profession: Guardian\n\
             <https://wiki.guildwars2.com/wiki/Whirling_Wrath>"
        );
    }

    #[test]
    fn test_format_trait() {
        let found: Trait = serde_json::from_value(serde_json::json!({
            "id": 1899,
            "name": "Zealous Scepter",
            "tier": 2,
            "slot": "Major",
            "facts": [{"text": "Recharge Reduced", "type": "Percent", "percent": 20}]
        }))
        .unwrap();
        assert_eq!(
            format_trait(&found),
            "**Zealous Scepter** (Major trait, tier 2)\n\
             • Recharge Reduced: 20%\n\
             <https://wiki.guildwars2.com/wiki/Zealous_Scepter>"
        );
        assert_eq!(strip_markup("a <c=@abilitytype>b</c> c"), "a b c");
    }

    #[test]
    fn test_split_message() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
        assert_eq!(split_message(text, 100), vec![text]);
        assert_eq!(split_message("abcdef", 4), vec!["abcd"]);
        assert!(split_message("", 10).is_empty());
    }

    #[test]
    fn test_split_message_reopens_code_blocks() {
        let text = "**Title**\n```ml\nrow one\nrow two\nrow three\n```\nafter";
        let parts = split_message(text, 30);
        assert_eq!(
            parts,
            vec![
                "**Title**\n```ml\nrow one\n```",
                "```ml\nrow two\nrow three\n```",
                "after",
            ]
        );
        assert!(parts.iter().all(|part| part.chars().count() <= 30));
        assert!(parts.iter().all(|part| part.matches(FENCE).count() % 2 == 0));
    }
}
