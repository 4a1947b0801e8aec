// src/pipeline/mirror.rs

//! The artist/post iterator.
//!
//! For every page URL, in order:
//! 1. Parse the URL; malformed ones are skipped.
//! 2. Look up the artist name; unknown ids are skipped.
//! 3. Discord pages go to the Discord collaborator and nothing else.
//! 4. Otherwise fetch the page, then for each post create its folder,
//!    download attachments and the primary file, and write the transcript.
//!
//! Metadata is saved once per artist run after all of its pages are done:
//! when the next artist's first page comes up, or at the end of the list.
//! Only a page body that cannot be decoded aborts the run; the run open at
//! that point is not saved.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ArtistNames, Config, PageUrl, Post};
use crate::services::{
    DiscordScraper, DownloadOutcome, FileDownloader, Fetcher, MetadataPersister, NoProgress,
    ProfileStore, ProgressObserver, ProgressUnit, SkipDiscord, TranscriptWriter,
};
use crate::storage::{ErrorSink, LocalStorage};
use crate::utils::http::request_timeout;

use super::run_state::{ArtistRunState, FinishedRun};

/// Counters of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub pages_skipped: usize,
    pub urls_skipped: usize,
    pub posts: usize,
    pub posts_skipped: usize,
    pub files_downloaded: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub transcripts: usize,
    pub metadata_saves: usize,
    pub discord_handoffs: usize,
}

impl RunSummary {
    fn record_download(&mut self, outcome: &DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded { .. } => self.files_downloaded += 1,
            DownloadOutcome::Skipped => self.files_skipped += 1,
            DownloadOutcome::Failed => self.files_failed += 1,
        }
    }

    pub fn log(&self) {
        crate::utils::log::summary(
            "Mirror run",
            &[
                ("Pages fetched", self.pages_fetched.to_string()),
                ("Pages skipped", self.pages_skipped.to_string()),
                ("URLs skipped", self.urls_skipped.to_string()),
                ("Posts", self.posts.to_string()),
                ("Posts skipped", self.posts_skipped.to_string()),
                ("Files downloaded", self.files_downloaded.to_string()),
                ("Files already present", self.files_skipped.to_string()),
                ("Files failed", self.files_failed.to_string()),
                ("Transcripts", self.transcripts.to_string()),
                ("Metadata saves", self.metadata_saves.to_string()),
                ("Discord hand-offs", self.discord_handoffs.to_string()),
            ],
        );
    }
}

/// Mirrors page URLs into the output directory.
pub struct Mirror {
    config: Arc<Config>,
    storage: LocalStorage,
    fetcher: Arc<Fetcher>,
    downloader: FileDownloader,
    transcripts: TranscriptWriter,
    metadata: Arc<dyn MetadataPersister>,
    discord: Arc<dyn DiscordScraper>,
    progress: Arc<dyn ProgressObserver>,
}

impl Mirror {
    /// Mirror with profile metadata saved under the config directory,
    /// Discord pages only logged, and no progress output.
    pub fn new(config: Arc<Config>, client: Client, errors: Arc<dyn ErrorSink>) -> Self {
        let fetcher = Arc::new(Fetcher::new(client.clone(), config.fetch.clone(), errors));
        let progress: Arc<dyn ProgressObserver> = Arc::new(NoProgress);

        Self {
            storage: LocalStorage::new(&config.paths.output_dir),
            downloader: FileDownloader::new(Arc::clone(&fetcher), Arc::clone(&progress)),
            transcripts: TranscriptWriter::new(client, request_timeout(&config.fetch)),
            metadata: Arc::new(ProfileStore::new(
                Arc::clone(&fetcher),
                &config.paths.config_dir,
            )),
            discord: Arc::new(SkipDiscord),
            fetcher,
            progress,
            config,
        }
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataPersister>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_discord(mut self, discord: Arc<dyn DiscordScraper>) -> Self {
        self.discord = discord;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.downloader = FileDownloader::new(Arc::clone(&self.fetcher), Arc::clone(&progress));
        self.progress = progress;
        self
    }

    pub fn fetcher(&self) -> Arc<Fetcher> {
        Arc::clone(&self.fetcher)
    }

    /// Mirror every URL. Returns false when the run was aborted.
    pub async fn run(&self, urls: &[String], names: &ArtistNames) -> bool {
        match self.try_run(urls, names).await {
            Ok(summary) => {
                summary.log();
                true
            }
            Err(e) => {
                log::error!("Run aborted: {}", e);
                false
            }
        }
    }

    /// Mirror every URL, propagating the fatal page error.
    pub async fn try_run(&self, urls: &[String], names: &ArtistNames) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut runs = ArtistRunState::new();
        let bar = self.progress.begin("Pages", urls.len() as u64, ProgressUnit::Items);

        for url in urls {
            let result = self.mirror_url(url, names, &mut runs, &mut summary).await;
            bar.advance(1);
            if let Err(e) = result {
                bar.finish();
                return Err(e);
            }
        }

        if let Some(run) = runs.finish() {
            self.save_metadata(run, &mut summary).await;
        }
        bar.finish();

        Ok(summary)
    }

    async fn mirror_url(
        &self,
        url: &str,
        names: &ArtistNames,
        runs: &mut ArtistRunState,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let page = match PageUrl::parse(url) {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Skipping URL: {}", e);
                summary.urls_skipped += 1;
                return Ok(());
            }
        };

        let Some(artist_name) = names.get(&page.artist_id) else {
            let e = AppError::UnknownArtist {
                artist_id: page.artist_id.clone(),
            };
            log::warn!("Skipping {}: {}", url, e);
            summary.urls_skipped += 1;
            return Ok(());
        };

        if page.is_discord() {
            log::info!("Handing Discord server {} off", page.artist_id);
            if let Err(e) = self.discord.scrape(&page.artist_id).await {
                log::error!("Discord scrape of {} failed: {}", page.artist_id, e);
            }
            summary.discord_handoffs += 1;
            return Ok(());
        }

        // The previous artist's pages are all done once a new artist shows
        // up, so its run is closed before this page can fail.
        if let Some(run) = runs.observe(&page.artist_id, url) {
            self.save_metadata(run, summary).await;
        }
        if runs.track_username(&page.username, url) {
            log::debug!("First page of {}", page.username);
        }

        log::info!("Processing {} ({} / {})", url, artist_name, page.service);
        self.mirror_page(&page, artist_name, summary).await
    }

    async fn mirror_page(
        &self,
        page: &PageUrl,
        artist_name: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let artist_dir = match self.storage.artist_dir(page, artist_name).await {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("Cannot create folder for {}: {}", artist_name, e);
                summary.pages_skipped += 1;
                return Ok(());
            }
        };

        let Some(items) = self.fetcher.fetch_json::<Vec<Value>>(&page.raw).await? else {
            summary.pages_skipped += 1;
            return Ok(());
        };
        summary.pages_fetched += 1;

        for item in items {
            match serde_json::from_value::<Post>(item) {
                Ok(post) => self.mirror_post(page, &artist_dir, &post, summary).await,
                Err(e) => {
                    log::warn!("Skipping malformed post on {}: {}", page.raw, e);
                    summary.posts_skipped += 1;
                }
            }
        }
        Ok(())
    }

    async fn mirror_post(
        &self,
        page: &PageUrl,
        artist_dir: &Path,
        post: &Post,
        summary: &mut RunSummary,
    ) {
        let folder = post.folder_name();
        let post_dir = match self.storage.post_dir(artist_dir, &folder).await {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("Cannot create post folder {}: {}", folder, e);
                summary.posts_skipped += 1;
                return;
            }
        };
        summary.posts += 1;

        let targets = post.download_targets(page);
        let outcomes: Vec<DownloadOutcome> = stream::iter(targets)
            .map(|target| {
                let post_dir = &post_dir;
                async move {
                    self.downloader
                        .download(&target.url, post_dir, &target.file_name)
                        .await
                }
            })
            .buffer_unordered(self.config.download.max_concurrent.max(1))
            .collect()
            .await;
        outcomes.iter().for_each(|o| summary.record_download(o));

        let post_url = page.post_url(&post.id);
        match self
            .transcripts
            .write(&post_dir, &post.content, &post.embed, &post_url)
            .await
        {
            Ok(_) => summary.transcripts += 1,
            Err(e) => log::error!("Cannot write transcript for {}: {}", post_url, e),
        }
    }

    async fn save_metadata(&self, run: FinishedRun, summary: &mut RunSummary) {
        log::info!("Saving metadata for artist {}", run.artist_id);
        match self.metadata.save(&run.last_url).await {
            Ok(()) => summary.metadata_saves += 1,
            Err(e) => log::error!("Metadata save for {} failed: {}", run.last_url, e),
        }
    }
}
