// src/models/mod.rs

//! Domain models for the mirror.
//!
//! This module contains the configuration, the API records, and the
//! positional page URL contract.

mod artist;
mod config;
mod page_url;
mod post;

// Re-export all public types
pub use artist::{ArtistNames, Creator};
pub use config::{Config, DownloadConfig, FetchConfig, PathsConfig, Site, SitesConfig};
pub use page_url::{DISCORD_SERVICE, PageUrl};
pub use post::{Attachment, DownloadTarget, Post};

/// Page URLs to mirror together with the names of their artists.
#[derive(Debug, Clone, Default)]
pub struct ArtistListing {
    pub pages: Vec<String>,
    pub names: ArtistNames,
    /// Canonical username when the listing came from a username lookup
    pub username: Option<String>,
}
