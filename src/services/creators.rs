// src/services/creators.rs

//! Username lookup against the sites' creator listings.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ArtistListing, ArtistNames, Creator, Site, SitesConfig};
use crate::services::{Fetcher, UsernameResolver};

/// Resolves usernames through `{base}/api/v1/creators` of every site.
pub struct CreatorDirectory {
    fetcher: Arc<Fetcher>,
    sites: SitesConfig,
}

impl CreatorDirectory {
    pub fn new(fetcher: Arc<Fetcher>, sites: SitesConfig) -> Self {
        Self { fetcher, sites }
    }

    fn listing_url(&self, site: Site) -> String {
        format!("{}/api/v1/creators", self.sites.base_url(site))
    }

    /// Every creator a site lists. A skipped listing is empty.
    pub async fn creators(&self, site: Site) -> Result<Vec<Creator>> {
        let Some(items) = self
            .fetcher
            .fetch_json::<Vec<Value>>(&self.listing_url(site))
            .await?
        else {
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect())
    }
}

#[async_trait]
impl UsernameResolver for CreatorDirectory {
    async fn resolve(&self, username: &str) -> Result<ArtistListing> {
        let wanted = username.trim().to_lowercase();
        let mut listing = ArtistListing::default();

        for site in Site::ALL {
            let base = self.sites.base_url(site).to_string();
            for creator in self.creators(site).await? {
                if creator.name.to_lowercase() != wanted || creator.service.is_empty() {
                    continue;
                }
                log::info!(
                    "Found {} on {} ({}, id {})",
                    creator.name,
                    site,
                    creator.service,
                    creator.id
                );
                listing.pages.push(format!(
                    "{}/api/v1/{}/user/{}",
                    base, creator.service, creator.id
                ));
                listing
                    .names
                    .extend(ArtistNames::from_creators(std::iter::once(&creator)));
                listing.username.get_or_insert(creator.name);
            }
        }

        if listing.pages.is_empty() {
            return Err(AppError::UnknownArtist {
                artist_id: username.to_string(),
            });
        }
        Ok(listing)
    }
}
