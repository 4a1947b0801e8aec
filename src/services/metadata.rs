// src/services/metadata.rs

//! Artist profile persistence.
//!
//! Profiles are kept in `<config_dir>/artists.json`, one entry per
//! `{domain}/{service}/{id}` key. Saving the same artist again replaces its
//! entry, so replays are harmless.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::PageUrl;
use crate::services::{Fetcher, MetadataPersister};
use crate::storage::LocalStorage;

pub const ARTISTS_FILE: &str = "artists.json";

/// One saved profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArtistRecord {
    /// Page URL the save was triggered by
    pub url: String,
    pub saved_at: DateTime<Utc>,
    /// Profile exactly as returned by the API
    pub profile: Value,
}

/// Saves artist profiles into the config directory.
pub struct ProfileStore {
    fetcher: Arc<Fetcher>,
    storage: LocalStorage,
}

impl ProfileStore {
    pub fn new(fetcher: Arc<Fetcher>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            storage: LocalStorage::new(config_dir),
        }
    }

    /// Key of an artist in `artists.json`.
    pub fn key(page: &PageUrl) -> String {
        format!(
            "{}/{}/{}",
            page.domain.to_lowercase(),
            page.service.to_lowercase(),
            page.artist_id
        )
    }

    /// All saved profiles.
    pub async fn records(&self) -> Result<BTreeMap<String, ArtistRecord>> {
        Ok(self
            .storage
            .read_json(ARTISTS_FILE)
            .await?
            .unwrap_or_default())
    }

    async fn upsert(&self, key: String, record: ArtistRecord) -> Result<()> {
        let mut records = self.records().await?;
        records.insert(key, record);
        self.storage.write_json(ARTISTS_FILE, &records).await
    }
}

#[async_trait]
impl MetadataPersister for ProfileStore {
    async fn save(&self, page_url: &str) -> Result<()> {
        let page = PageUrl::parse(page_url)?;
        let Some(profile) = self.fetcher.fetch_json::<Value>(&page.profile_url()).await? else {
            log::warn!("No profile saved for {}", page_url);
            return Ok(());
        };

        let key = Self::key(&page);
        self.upsert(
            key.clone(),
            ArtistRecord {
                url: page_url.to_string(),
                saved_at: Utc::now(),
                profile,
            },
        )
        .await?;

        log::info!("Saved artist metadata for {}", key);
        Ok(())
    }
}
