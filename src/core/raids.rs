//! Weekly raid progress.
//!
//! Raid clears reset every Monday at 07:30 UTC. One wing each week carries the
//! Call of the Mists buff and the next one Emboldened, rotating through all wings
//! starting from the week of 2022-06-20.

use crate::{
    api::AccountSource, core::account::require_permissions, entities::api_key, errors::Result,
};
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

/// Day number (days from the common era) of Monday 2022-06-20, week zero of the rotation.
const ROTATION_START_DAY: i32 = 738_326;

/// Minutes after midnight UTC of the weekly reset.
const RESET_MINUTES: i64 = 7 * 60 + 30;

/// A raid and its wings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raid {
    /// Raid id (e.g. "forsaken_thicket")
    pub id: String,
    /// Wings in order
    pub wings: Vec<Wing>,
}

/// A raid wing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wing {
    /// Wing id (e.g. "spirit_vale")
    pub id: String,
    /// Bosses and checkpoints in order
    pub events: Vec<RaidEvent>,
}

/// A boss or checkpoint that is cleared once a week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEvent {
    /// Event id (e.g. "vale_guardian")
    pub id: String,
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,
}

/// Kind of a raid event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Boss encounter
    Boss,
    /// Checkpoint event
    Checkpoint,
}

/// Progress on one wing this week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WingProgress {
    /// Readable wing name
    pub name: String,
    /// `(readable event name, cleared)` in order
    pub events: Vec<(String, bool)>,
    /// Whether every event is cleared
    pub done: bool,
    /// Wing has the Call of the Mists buff this week
    pub call_of_the_mists: bool,
    /// Wing has the Emboldened buff this week
    pub emboldened: bool,
}

/// Progress on every wing this week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidSummary {
    /// Wings across all raids, in order
    pub wings: Vec<WingProgress>,
    /// Bosses not cleared
    pub bosses_left: usize,
    /// Checkpoints not cleared
    pub events_left: usize,
    /// Account data predates the current week
    pub outdated: bool,
}

/// The weekly reset at or before `at`.
#[must_use]
pub fn weekly_reset(at: DateTime<Utc>) -> DateTime<Utc> {
    let monday = at.date_naive() - TimeDelta::days(i64::from(at.weekday().num_days_from_monday()));
    let reset = monday.and_time(NaiveTime::MIN).and_utc() + TimeDelta::minutes(RESET_MINUTES);
    if reset > at {
        reset - TimeDelta::weeks(1)
    } else {
        reset
    }
}

/// Rotation week `date` falls in, counted from the week of 2022-06-20.
#[must_use]
pub fn rotation_week(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce() - ROTATION_START_DAY).div_euclid(7)
}

/// Indexes of the Call of the Mists and Emboldened wings on `date`.
///
/// Returns `None` when there are no wings.
#[must_use]
pub fn buffed_wings(date: NaiveDate, wing_count: usize) -> Option<(usize, usize)> {
    let count = i64::try_from(wing_count).ok().filter(|&c| c > 0)?;
    let week = rotation_week(date);
    let call_of_the_mists = usize::try_from(week.rem_euclid(count)).ok()?;
    let emboldened = usize::try_from((week + 1).rem_euclid(count)).ok()?;
    Some((call_of_the_mists, emboldened))
}

/// Turns an API id such as `"hall_of_chains"` into `"Hall of Chains"`.
#[must_use]
pub fn readable_id(id: &str) -> String {
    let title = id
        .split('_')
        .map(|word| match word {
            "of" | "the" | "in" => word.to_string(),
            _ => capitalize(word),
        })
        .collect::<Vec<_>>()
        .join(" ");
    capitalize_first(&title)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Builds the weekly summary from the ids of cleared events.
///
/// `last_modified` is when the account data was last updated; it is outdated
/// once `now` is past the reset following it.
#[must_use]
pub fn summarize(
    raids: &[Raid],
    cleared: &[String],
    last_modified: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RaidSummary {
    let cleared: HashSet<&str> = cleared.iter().map(String::as_str).collect();
    let wings: Vec<&Wing> = raids.iter().flat_map(|raid| &raid.wings).collect();
    let buffed = buffed_wings(now.date_naive(), wings.len());

    let mut bosses_left = 0;
    let mut events_left = 0;
    let wings = wings
        .into_iter()
        .enumerate()
        .map(|(index, wing)| {
            let events: Vec<(String, bool)> = wing
                .events
                .iter()
                .map(|event| {
                    let done = cleared.contains(event.id.as_str());
                    if !done {
                        match event.kind {
                            EventKind::Boss => bosses_left += 1,
                            EventKind::Checkpoint => events_left += 1,
                        }
                    }
                    (readable_id(&event.id), done)
                })
                .collect();
            WingProgress {
                name: readable_id(&wing.id),
                done: events.iter().all(|(_, done)| *done),
                events,
                call_of_the_mists: buffed.is_some_and(|(cotm, _)| cotm == index),
                emboldened: buffed.is_some_and(|(_, emboldened)| emboldened == index),
            }
        })
        .collect();

    RaidSummary {
        wings,
        bosses_left,
        events_left,
        outdated: now > weekly_reset(last_modified) + TimeDelta::weeks(1),
    }
}

impl RaidSummary {
    /// One-line description of what is left this week.
    #[must_use]
    pub fn description(&self) -> String {
        let plural = |n: usize, one: &str, many: &str| {
            if n == 1 {
                format!("{n} {one}")
            } else {
                format!("{n} {many}")
            }
        };
        let week = if self.outdated { "that" } else { "this" };
        if self.bosses_left == 0 && self.events_left == 0 {
            return format!("Everything completed {week} week");
        }
        let mut parts = Vec::new();
        if self.bosses_left > 0 {
            parts.push(plural(self.bosses_left, "boss", "bosses"));
        }
        if self.events_left > 0 {
            parts.push(plural(self.events_left, "event", "events"));
        }
        format!("{} not completed {week} week", parts.join(", "))
    }
}

#[derive(Debug, Deserialize)]
struct AccountTimestamp {
    last_modified: DateTime<Utc>,
}

/// Fetches cleared raid events and summarizes the week.
#[instrument(skip_all, fields(account = %key.account_name))]
pub async fn fetch_raid_progress<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    raids: &[Raid],
    now: DateTime<Utc>,
) -> Result<RaidSummary> {
    require_permissions(key, &["progression"])?;
    let (cleared, account) = tokio::try_join!(
        source.get::<Vec<String>>("account/raids", &key.key),
        source.get::<AccountTimestamp>("account", &key.key),
    )?;
    Ok(summarize(raids, &cleared, account.last_modified, now))
}
