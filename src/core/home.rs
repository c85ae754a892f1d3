//! Home instance collections: cats and gathering nodes.
//!
//! The API only lists what an account has unlocked. Which unlocks exist and how
//! to get them comes from `gamedata.toml`.

use crate::{api::AccountSource, core::account, entities::api_key, errors::Result};
use serde::Deserialize;
use tracing::{debug, instrument};

/// An unlockable home instance feature and how to obtain it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HomeUnlock<Id> {
    /// Id used by the API
    pub id: Id,
    /// Where to get it
    pub guide: String,
}

/// A cat, keyed by a numeric id.
pub type Cat = HomeUnlock<u32>;

/// A gathering node, keyed by a string id such as `"quartz_node"`.
pub type Node = HomeUnlock<String>;

// Older schema versions return objects with a hint, newer ones bare ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwnedCat {
    Id(u32),
    Entry { id: u32 },
}

impl OwnedCat {
    const fn id(&self) -> u32 {
        match self {
            Self::Id(id) | Self::Entry { id } => *id,
        }
    }
}

/// Unlocks from `all` whose id is not in `owned`, in configuration order.
#[must_use]
pub fn missing_unlocks<Id: PartialEq + Clone>(
    all: &[HomeUnlock<Id>],
    owned: &[Id],
) -> Vec<HomeUnlock<Id>> {
    all.iter()
        .filter(|unlock| !owned.contains(&unlock.id))
        .cloned()
        .collect()
}

/// Cats the account has not collected yet.
#[instrument(skip_all)]
pub async fn fetch_missing_cats<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    cats: &[Cat],
) -> Result<Vec<Cat>> {
    account::require_permissions(key, &["progression"])?;
    let owned: Vec<u32> = source
        .get::<Vec<OwnedCat>>("account/home/cats", &key.key)
        .await?
        .iter()
        .map(OwnedCat::id)
        .collect();
    debug!("Account owns {} cats", owned.len());
    Ok(missing_unlocks(cats, &owned))
}

/// Gathering nodes the account has not unlocked yet.
#[instrument(skip_all)]
pub async fn fetch_missing_nodes<S: AccountSource>(
    source: &S,
    key: &api_key::Model,
    nodes: &[Node],
) -> Result<Vec<Node>> {
    account::require_permissions(key, &["progression"])?;
    let owned: Vec<String> = source.get("account/home/nodes", &key.key).await?;
    debug!("Account owns {} nodes", owned.len());
    Ok(missing_unlocks(nodes, &owned))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::FakeAccountSource};
    use serde_json::json;

    fn key(permissions: &str) -> api_key::Model {
        api_key::Model {
            user_id: "1".to_string(),
            key: "KEY".to_string(),
            account_name: "Test.1234".to_string(),
            permissions: permissions.to_string(),
        }
    }

    fn cats() -> Vec<Cat> {
        [(1, "Chicken"), (2, "Grilled Chicken"), (3, "Spicy Flank Steak")]
            .into_iter()
            .map(|(id, guide)| Cat { id, guide: guide.to_string() })
            .collect()
    }

    fn nodes() -> Vec<Node> {
        [("quartz_node", "Quartz"), ("garden_plot_1", "Garden plot")]
            .into_iter()
            .map(|(id, guide)| Node { id: id.to_string(), guide: guide.to_string() })
            .collect()
    }

    #[test]
    fn test_missing_unlocks_keeps_order() {
        let missing = missing_unlocks(&cats(), &[2]);
        let ids: Vec<u32> = missing.iter().map(|cat| cat.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(missing_unlocks(&cats(), &[3, 2, 1, 99]).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_missing_cats_accepts_both_shapes() -> Result<()> {
        let bare = FakeAccountSource::new().with("account/home/cats", json!([1, 3]));
        let missing = fetch_missing_cats(&bare, &key("account,progression"), &cats()).await?;
        assert_eq!(missing, vec![cats()[1].clone()]);

        let objects = FakeAccountSource::new().with(
            "account/home/cats",
            json!([{"id": 1, "hint": "chicken"}, {"id": 2, "hint": "grilled_chicken"}]),
        );
        let missing = fetch_missing_cats(&objects, &key("account,progression"), &cats()).await?;
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].guide, "Spicy Flank Steak");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_missing_nodes() -> Result<()> {
        let source =
            FakeAccountSource::new().with("account/home/nodes", json!(["garden_plot_1"]));
        let missing = fetch_missing_nodes(&source, &key("account,progression"), &nodes()).await?;
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, "quartz_node");
        Ok(())
    }

    #[tokio::test]
    async fn test_home_needs_progression() {
        let source = FakeAccountSource::new().with("account/home/nodes", json!([]));
        let err = fetch_missing_nodes(&source, &key("account"), &nodes())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingPermission { permission } if permission == "progression"));
    }
}
