//! Guild Wars 2 REST API client.
//!
//! Account data (inventories, characters, achievements, ...) is read through the
//! [`AccountSource`] and [`PublicSource`] traits so the aggregation code can be exercised without the network.

use crate::errors::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::{debug, warn};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.guildwars2.com/v2/";

/// Schema version requested from the API; fixes the shape of character equipment.
pub const SCHEMA_VERSION: &str = "2021-07-15T13:00:00.000Z";

/// Authenticated, typed reads of API endpoints.
pub trait AccountSource: Sync {
    /// Fetches `endpoint` (relative to the API root) with the given API key.
    fn get<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        key: &str,
    ) -> impl Future<Output = Result<T>> + Send;
}

/// Typed reads of public API endpoints.
pub trait PublicSource: Sync {
    /// Fetches `endpoint` (relative to the API root) without authentication.
    fn get_public<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<T>> + Send;
}

/// Maps a failed HTTP status to the error the rest of the crate expects.
#[must_use]
pub fn status_error(endpoint: &str, status: u16) -> Error {
    let endpoint = endpoint.to_string();
    match status {
        401 | 403 => Error::Unauthorized { endpoint },
        404 => Error::NotFound { endpoint },
        status => Error::Api { endpoint, status },
    }
}

/// HTTP client for the official API.
#[derive(Debug, Clone)]
pub struct Gw2Api {
    base_url: String,
    client: Client,
}

impl Gw2Api {
    /// Creates a client for the given API root.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Creates a client from `GW2_API_BASE_URL`, falling back to the public API.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("GW2_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )
    }

    async fn request<T: DeserializeOwned>(&self, endpoint: &str, key: Option<&str>) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!("GET {url}");

        let mut request = self
            .client
            .get(&url)
            .header("X-Schema-Version", SCHEMA_VERSION);
        if let Some(key) = key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            warn!("API returned {status} for {endpoint}");
        }
        Err(status_error(endpoint, status.as_u16()))
    }
}

impl AccountSource for Gw2Api {
    async fn get<T: DeserializeOwned + Send>(&self, endpoint: &str, key: &str) -> Result<T> {
        self.request(endpoint, Some(key)).await
    }
}

impl PublicSource for Gw2Api {
    async fn get_public<T: DeserializeOwned + Send>(&self, endpoint: &str) -> Result<T> {
        self.request(endpoint, None).await
    }
}
