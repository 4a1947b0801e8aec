//! Storage for mirrored content and run bookkeeping.
//!
//! ## Directory Structure
//!
//! ```text
//! {output_dir}/                 # Creators/
//! └── <Domain>/<Artist>/<Service>/<PostFolder>/
//!     ├── <attachment files...>
//!     └── content.txt
//! {config_dir}/                 # Config/
//! ├── kemono_favorites.json     # Cached favorites (input)
//! ├── coomer_favorites.json
//! └── artists.json              # Saved artist profiles
//! errors.txt                    # Failed URLs, one per line
//! ```

pub mod error_log;
pub mod favorites;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use error_log::{FileErrorLog, MemoryErrorLog};
pub use favorites::FavoritesCache;
pub use local::LocalStorage;

/// Sink for URLs that exhausted every retry.
#[async_trait]
pub trait ErrorSink: Send + Sync {
    /// Record one failed URL.
    async fn record(&self, url: &str) -> Result<()>;
}
