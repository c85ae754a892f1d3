//! API key registration and account summaries.
//!
//! Each Discord user registers one API key. Registration validates the key
//! against `tokeninfo` and `account` and stores the account name and granted
//! permissions alongside it, so later commands can check permissions without
//! another round trip.

use crate::{
    api::AccountSource,
    entities::{ApiKey, api_key},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*, sea_query::OnConflict};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Lengths of the dash-separated groups of an API key.
const KEY_GROUPS: [usize; 9] = [8, 4, 4, 4, 20, 4, 4, 4, 12];

/// Expansions implied by owning any other access.
const BASE_ACCESS: [&str; 2] = ["PlayForFree", "GuildWars2"];

/// `tokeninfo` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    /// Key id
    pub id: String,
    /// Name the user gave the key
    pub name: String,
    /// Granted permissions
    pub permissions: Vec<String>,
}

/// `account` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Account id
    pub id: String,
    /// Account name (e.g. "Name.1234")
    pub name: String,
    /// Home world id
    #[serde(default)]
    pub world: u32,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Owned game access
    #[serde(default)]
    pub access: Vec<String>,
    /// Whether the account has a commander tag
    #[serde(default)]
    pub commander: bool,
    /// Fractal level, with the `progression` permission
    #[serde(default)]
    pub fractal_level: Option<u32>,
    /// WvW rank, with the `progression` permission
    #[serde(default)]
    pub wvw_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PvpStats {
    pvp_rank: u32,
    #[serde(default)]
    pvp_rank_rollovers: u32,
}

#[derive(Debug, Deserialize)]
struct CharacterAge {
    #[serde(default)]
    age: u64,
}

/// Ensures a key grants every permission in `scopes`.
pub fn require_permissions(key: &api_key::Model, scopes: &[&str]) -> Result<()> {
    match scopes.iter().find(|scope| !key.has_permission(scope)) {
        Some(missing) => Err(Error::MissingPermission {
            permission: (*missing).to_string(),
        }),
        None => Ok(()),
    }
}

/// Checks that `key` is shaped like an API key.
pub fn validate_key_format(key: &str) -> Result<()> {
    let groups: Vec<&str> = key.split('-').collect();
    let well_formed = groups.len() == KEY_GROUPS.len()
        && groups.iter().zip(KEY_GROUPS).all(|(group, len)| {
            group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit())
        });
    if well_formed {
        Ok(())
    } else {
        Err(Error::InvalidApiKey {
            reason: "expected 72 characters of hexadecimal groups separated by dashes".to_string(),
        })
    }
}

/// Retrieves the key a user registered.
pub async fn get_api_key(db: &DatabaseConnection, user_id: &str) -> Result<api_key::Model> {
    ApiKey::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::MissingApiKey {
            user_id: user_id.to_string(),
        })
}

/// Stores a key for its user, replacing any key registered before.
pub async fn save_api_key(db: &DatabaseConnection, key: api_key::Model) -> Result<api_key::Model> {
    let active = api_key::ActiveModel {
        user_id: Set(key.user_id.clone()),
        key: Set(key.key.clone()),
        account_name: Set(key.account_name.clone()),
        permissions: Set(key.permissions.clone()),
    };
    ApiKey::insert(active)
        .on_conflict(
            OnConflict::column(api_key::Column::UserId)
                .update_columns([
                    api_key::Column::Key,
                    api_key::Column::AccountName,
                    api_key::Column::Permissions,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(key)
}

/// Removes a user's key. Returns whether one was registered.
pub async fn remove_api_key(db: &DatabaseConnection, user_id: &str) -> Result<bool> {
    let result = ApiKey::delete_by_id(user_id.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}

/// Validates a key against the API and registers it for `user_id`.
#[instrument(skip(db, source, key))]
pub async fn register_key<S: AccountSource>(
    db: &DatabaseConnection,
    source: &S,
    user_id: &str,
    key: &str,
) -> Result<api_key::Model> {
    let key = key.trim();
    validate_key_format(key)?;
    let (token, account) = tokio::try_join!(
        source.get::<TokenInfo>("tokeninfo", key),
        source.get::<AccountInfo>("account", key),
    )?;
    let model = api_key::Model {
        user_id: user_id.to_string(),
        key: key.to_string(),
        account_name: account.name,
        permissions: token.permissions.join(","),
    };
    let model = save_api_key(db, model).await?;
    info!(
        "Registered key '{}' for {} with permissions {}",
        token.name, model.account_name, model.permissions
    );
    Ok(model)
}

/// Readable expansion names, without base game access when anything else is owned.
#[must_use]
pub fn format_access(access: &[String]) -> Vec<String> {
    access
        .iter()
        .filter(|a| access.len() == 1 || !BASE_ACCESS.contains(&a.as_str()))
        .map(|a| split_words(a))
        .collect()
}

/// Splits `"HeartOfThorns"` into `"Heart Of Thorns"`; digits start a new word.
fn split_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if i > 0 && (c.is_ascii_uppercase() || c.is_ascii_digit()) {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Formats played time in seconds as days, hours and minutes.
#[must_use]
pub fn format_age(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = seconds % 86_400 / 3_600;
    let minutes = seconds % 3_600 / 60;
    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days} days"));
    }
    if hours > 0 {
        parts.push(format!("{hours} hours"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{minutes} minutes"));
    }
    parts.join(", ")
}

/// Account overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    /// Account details
    pub account: AccountInfo,
    /// Readable expansion access
    pub access: Vec<String>,
    /// PvP rank, with the `pvp` permission
    pub pvp_rank: Option<u32>,
    /// Played time over all characters in seconds, with the `characters` permission
    pub played_seconds: Option<u64>,
}

/// Fetches the account overview, adding whatever the key's optional permissions allow.
///
/// Failures of the optional parts are logged and leave them empty.
#[instrument(skip_all, fields(account = %key.account_name))]
pub async fn fetch_account_summary<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
) -> Result<AccountSummary> {
    require_permissions(key, &["account"])?;
    let account: AccountInfo = source.get("account", &key.key).await?;

    let pvp_rank = if key.has_permission("pvp") {
        match source.get::<PvpStats>("pvp/stats", &key.key).await {
            Ok(stats) => Some(stats.pvp_rank + stats.pvp_rank_rollovers),
            Err(e) if e.is_api_failure() => {
                warn!("Skipping PvP rank: {e}");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    let played_seconds = if key.has_permission("characters") {
        match source
            .get::<Vec<CharacterAge>>("characters?ids=all", &key.key)
            .await
        {
            Ok(characters) => Some(characters.iter().map(|c| c.age).sum()),
            Err(e) if e.is_api_failure() => {
                warn!("Skipping played time: {e}");
                None
            }
            Err(e) => return Err(e),
        }
    } else {
        None
    };

    Ok(AccountSummary {
        access: format_access(&account.access),
        account,
        pvp_rank,
        played_seconds,
    })
}
