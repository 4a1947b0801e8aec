//! Service layer for the mirror.
//!
//! This module contains the fetch-and-persist building blocks:
//! - Retrying HTTP access with domain fallback (`Fetcher`)
//! - Temp-then-rename file downloads (`FileDownloader`)
//! - `content.txt` generation (`TranscriptWriter`)
//!
//! and the collaborators the iterator talks to through traits:
//! favorites, username lookup, artist metadata, Discord hand-off.

mod creators;
mod discord;
mod downloader;
mod fetcher;
mod metadata;
pub mod progress;
pub mod transcript;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ArtistListing, Site};

pub use creators::CreatorDirectory;
pub use discord::SkipDiscord;
pub use downloader::{DownloadOutcome, DownloadState, FileDownloader, TEMP_SUFFIX};
pub use fetcher::Fetcher;
pub use metadata::{ARTISTS_FILE, ArtistRecord, ProfileStore};
pub use progress::{NoProgress, ProgressHandle, ProgressObserver, ProgressUnit};
#[cfg(feature = "cli")]
pub use progress::TerminalProgress;
pub use transcript::{Comment, TRANSCRIPT_FILE, TranscriptWriter};

/// Supplies the page URLs and names of a user's favorite creators.
#[async_trait]
pub trait FavoritesSource: Send + Sync {
    async fn favorites(&self, site: Site) -> Result<ArtistListing>;
}

/// Looks up creators by username.
#[async_trait]
pub trait UsernameResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<ArtistListing>;
}

/// Persists an artist's profile metadata.
///
/// Called once per finished contiguous run of pages for an artist.
/// Implementations must tolerate being replayed for the same URL.
#[async_trait]
pub trait MetadataPersister: Send + Sync {
    async fn save(&self, page_url: &str) -> Result<()>;
}

/// Independent content pipeline for Discord servers.
#[async_trait]
pub trait DiscordScraper: Send + Sync {
    async fn scrape(&self, server_id: &str) -> Result<()>;
}
