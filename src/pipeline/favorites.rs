// src/pipeline/favorites.rs

//! Favorites mode: mirror every followed creator of the selected sites.

use crate::models::{ArtistListing, Site};
use crate::services::FavoritesSource;
use crate::utils::log;

use super::Mirror;

/// Mirror the favorites of each site, in order.
///
/// A site whose favorites cannot be loaded is logged and left out.
pub async fn run_favorites(mirror: &Mirror, source: &dyn FavoritesSource, sites: &[Site]) -> bool {
    log::header("Mirroring favorites");

    let listing = collect(source, sites).await;
    log::info(&format!(
        "{} pages from {} creators",
        listing.pages.len(),
        listing.names.len()
    ));

    let ok = mirror.run(&listing.pages, &listing.names).await;
    if ok {
        log::success("Favorites mirrored");
    } else {
        log::failure("Favorites run aborted");
    }
    ok
}

async fn collect(source: &dyn FavoritesSource, sites: &[Site]) -> ArtistListing {
    let mut combined = ArtistListing::default();

    for (i, site) in sites.iter().enumerate() {
        log::step(i + 1, sites.len(), &format!("Loading {site} favorites"));
        match source.favorites(*site).await {
            Ok(listing) => {
                combined.pages.extend(listing.pages);
                combined.names.extend(listing.names);
            }
            Err(e) => log::failure(&format!("{site} favorites: {e}")),
        }
    }
    combined
}
