use async_trait::async_trait;

use crate::error::Result;
use crate::services::DiscordScraper;

/// Discord hand-off that only logs the server id.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipDiscord;

#[async_trait]
impl DiscordScraper for SkipDiscord {
    async fn scrape(&self, server_id: &str) -> Result<()> {
        log::info!("Discord server {} handed off, not mirrored", server_id);
        Ok(())
    }
}
