//! Read-only catalog client.
//!
//! The menu is public data with no state machine: plain GETs, cached with
//! `moka` (5-minute TTL). Search results are never cached. Mutable cart and
//! order state never goes through here.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use quickbite_core::FoodSnapshot;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::gateway::wire::WireFood;

const MENU_CACHE_KEY: &str = "menu";

/// The backend has returned the menu both as a bare array and wrapped in a
/// `foods` object across versions; accept either.
#[derive(Deserialize)]
#[serde(untagged)]
enum MenuResponse {
    Wrapped { foods: Vec<WireFood> },
    Plain(Vec<WireFood>),
}

impl MenuResponse {
    fn into_foods(self) -> Vec<WireFood> {
        match self {
            Self::Wrapped { foods } | Self::Plain(foods) => foods,
        }
    }
}

/// Client for the catalog endpoints.
#[derive(Clone)]
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    cache: Cache<String, Arc<Vec<FoodSnapshot>>>,
}

impl CatalogClient {
    /// Create a catalog client for the configured backend.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(64)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            timeout: config.http_timeout,
            cache,
        }
    }

    /// Get the full menu.
    ///
    /// # Errors
    ///
    /// Returns the classified failure if the request fails.
    #[instrument(skip(self))]
    pub async fn fetch_menu(&self) -> Result<Arc<Vec<FoodSnapshot>>> {
        if let Some(menu) = self.cache.get(MENU_CACHE_KEY).await {
            debug!("Cache hit for menu");
            return Ok(menu);
        }

        let url = self.endpoint("api/food/fetch/all")?;
        let foods = self.get_foods(url).await?;

        let menu = Arc::new(foods);
        self.cache
            .insert(MENU_CACHE_KEY.to_string(), Arc::clone(&menu))
            .await;

        Ok(menu)
    }

    /// Search the menu by item name. Not cached.
    ///
    /// # Errors
    ///
    /// Returns the classified failure if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, food_name: &str) -> Result<Vec<FoodSnapshot>> {
        let mut url = self.endpoint("api/food/search")?;
        url.query_pairs_mut().append_pair("foodName", food_name);
        self.get_foods(url).await
    }

    /// Resolve an item's image reference to its URL.
    ///
    /// # Errors
    ///
    /// `ValidationRejected` if the reference does not form a valid URL.
    pub fn image_url(&self, image_ref: &str) -> Result<Url> {
        self.endpoint(&format!("api/food/{image_ref}"))
    }

    /// Drop all cached catalog data.
    pub async fn invalidate(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::ValidationRejected(format!("invalid request URL: {e}")))
    }

    async fn get_foods(&self, url: Url) -> Result<Vec<FoodSnapshot>> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::NetworkUnreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::ServerRejected {
                status: Some(status.as_u16()),
                message: body.chars().take(200).collect(),
            });
        }

        let menu: MenuResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse catalog response");
            ApiError::ServerRejected {
                status: Some(status.as_u16()),
                message: format!("undecodable response: {e}"),
            }
        })?;

        Ok(menu.into_foods().into_iter().map(Into::into).collect())
    }
}
