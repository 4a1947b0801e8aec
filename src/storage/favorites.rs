//! Cached favorites lists.
//!
//! Each site has a favorites file `<config_dir>/<site>_favorites.json`
//! holding the creators the user follows:
//!
//! ```json
//! [{"id": "12345", "name": "alice", "service": "patreon"}]
//! ```

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::{ArtistListing, ArtistNames, Creator, Site, SitesConfig};
use crate::services::FavoritesSource;
use crate::storage::LocalStorage;

/// Favorites read from the local cache directory.
#[derive(Debug, Clone)]
pub struct FavoritesCache {
    storage: LocalStorage,
    sites: SitesConfig,
}

impl FavoritesCache {
    pub fn new(config_dir: impl Into<PathBuf>, sites: SitesConfig) -> Self {
        Self {
            storage: LocalStorage::new(config_dir),
            sites,
        }
    }

    /// Path of the cache file for a site.
    pub fn path(&self, site: Site) -> PathBuf {
        self.storage.path(&site.favorites_file())
    }

    /// Delete the cached favorites of a site.
    ///
    /// Returns whether a file was removed; a missing cache is not an error.
    pub async fn reset(&self, site: Site) -> Result<bool> {
        let removed = self.storage.remove(&site.favorites_file()).await?;
        if removed {
            log::info!("{} removed successfully", self.path(site).display());
        } else {
            log::warn!("No file found with the name {}", self.path(site).display());
        }
        Ok(removed)
    }

    /// Creators in the cache of a site.
    pub async fn creators(&self, site: Site) -> Result<Vec<Creator>> {
        self.storage
            .read_json(&site.favorites_file())
            .await?
            .ok_or_else(|| {
                AppError::config(format!(
                    "Favorites cache not found at {}",
                    self.path(site).display()
                ))
            })
    }

    /// First API page of every favorite creator.
    pub fn page_urls(&self, site: Site, creators: &[Creator]) -> Vec<String> {
        let base = self.sites.base_url(site);
        creators
            .iter()
            .filter(|c| !c.service.is_empty())
            .map(|c| format!("{}/api/v1/{}/user/{}", base, c.service, c.id))
            .collect()
    }
}

#[async_trait]
impl FavoritesSource for FavoritesCache {
    async fn favorites(&self, site: Site) -> Result<ArtistListing> {
        let creators = self.creators(site).await?;
        log::info!("Loaded {} favorite creators for {}", creators.len(), site);
        Ok(ArtistListing {
            pages: self.page_urls(site, &creators),
            names: ArtistNames::from_creators(&creators),
            username: None,
        })
    }
}
