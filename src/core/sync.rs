//! Refreshes the static game data from the public API.
//!
//! Small collections are fetched whole with `ids=all`; large ones are paged.

use crate::{
    api::PublicSource,
    core::gamedata::{
        DocumentStore, ITEMS, LEGENDS, PETS, PROFESSIONS, SKILLS, SPECIALIZATIONS, TRAITS,
    },
    errors::{Error, Result},
};
use serde_json::Value;
use tracing::{debug, info, instrument};

/// Largest page the API serves.
pub const PAGE_SIZE: usize = 200;

/// How a collection is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    All,
    Paged,
}

/// Collections a build needs: `(collection, endpoint, fetch mode)`.
const BUILD_COLLECTIONS: [(&str, &str, Fetch); 6] = [
    (PROFESSIONS, "professions", Fetch::All),
    (SPECIALIZATIONS, "specializations", Fetch::All),
    (TRAITS, "traits", Fetch::Paged),
    (SKILLS, "skills", Fetch::Paged),
    (PETS, "pets", Fetch::All),
    (LEGENDS, "legends", Fetch::All),
];

/// Fetches every page of a paged endpoint.
///
/// Stops at the first short page. Asking for the page past the end of a
/// collection whose size is a multiple of the page size is answered with an
/// error status, which also ends the listing.
pub async fn fetch_paged<S: PublicSource>(source: &S, endpoint: &str) -> Result<Vec<Value>> {
    let mut docs = Vec::new();
    for page in 0.. {
        let url = format!("{endpoint}?page={page}&page_size={PAGE_SIZE}");
        let batch: Vec<Value> = match source.get_public(&url).await {
            Ok(batch) => batch,
            Err(Error::Api { status: 400, .. } | Error::NotFound { .. }) if page > 0 => break,
            Err(e) => return Err(e),
        };
        debug!("{endpoint} page {page}: {} documents", batch.len());
        let last = batch.len() < PAGE_SIZE;
        docs.extend(batch);
        if last {
            break;
        }
    }
    Ok(docs)
}

async fn fetch_collection<S: PublicSource>(
    source: &S,
    endpoint: &str,
    fetch: Fetch,
) -> Result<Vec<Value>> {
    match fetch {
        Fetch::All => source.get_public(&format!("{endpoint}?ids=all")).await,
        Fetch::Paged => fetch_paged(source, endpoint).await,
    }
}

/// Replaces the professions, specializations, traits, skills, pets and legends.
///
/// Returns the number of documents stored.
#[instrument(skip_all)]
pub async fn sync_build_data<S: PublicSource>(source: &S, store: &DocumentStore) -> Result<usize> {
    let mut total = 0;
    for (collection, endpoint, fetch) in BUILD_COLLECTIONS {
        let docs = fetch_collection(source, endpoint, fetch).await?;
        total += store.replace_collection(collection, &docs).await?;
    }
    info!("Synchronized {total} build documents");
    Ok(total)
}

/// Replaces the items, flagging upgrade components.
#[instrument(skip_all)]
pub async fn sync_items<S: PublicSource>(source: &S, store: &DocumentStore) -> Result<usize> {
    let mut items = fetch_paged(source, "items").await?;
    for item in &mut items {
        let is_upgrade = item.get("type").and_then(Value::as_str) == Some("UpgradeComponent");
        if let Some(fields) = item.as_object_mut() {
            fields.insert("is_upgrade".to_string(), Value::Bool(is_upgrade));
        }
    }
    store.replace_collection(ITEMS, &items).await
}

/// Synchronizes the build collections when the store has no professions yet.
pub async fn ensure_build_data<S: PublicSource>(source: &S, store: &DocumentStore) -> Result<()> {
    if store.count(PROFESSIONS).await? == 0 {
        info!("Game data store is empty, synchronizing from the API");
        sync_build_data(source, store).await?;
    }
    Ok(())
}
