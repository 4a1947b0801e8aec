// src/pipeline/users.rs

//! Username modes: one username, or a file with one username per line.

use std::path::Path;

use crate::error::Result;
use crate::services::UsernameResolver;
use crate::utils::log;

use super::Mirror;

/// Resolve and mirror one username.
pub async fn run_user(mirror: &Mirror, resolver: &dyn UsernameResolver, username: &str) -> bool {
    log::header(&format!("Mirroring {username}"));

    let listing = match resolver.resolve(username).await {
        Ok(listing) => listing,
        Err(e) => {
            log::failure(&format!("{username}: {e}"));
            return false;
        }
    };

    let canonical = listing.username.as_deref().unwrap_or(username);
    log::info(&format!(
        "{} resolved to {} pages",
        canonical,
        listing.pages.len()
    ));

    let ok = mirror.run(&listing.pages, &listing.names).await;
    if ok {
        log::success(&format!("{canonical} mirrored"));
    }
    ok
}

/// Mirror every username listed in `path`.
///
/// Returns whether every username succeeded; one failure does not stop the
/// rest.
pub async fn run_user_file(
    mirror: &Mirror,
    resolver: &dyn UsernameResolver,
    path: &Path,
) -> Result<bool> {
    let content = tokio::fs::read_to_string(path).await?;
    let usernames = read_usernames(&content);
    log::info(&format!(
        "{} usernames in {}",
        usernames.len(),
        path.display()
    ));

    let mut all_ok = true;
    for (i, username) in usernames.iter().enumerate() {
        log::step(i + 1, usernames.len(), username);
        all_ok &= run_user(mirror, resolver, username).await;
    }
    Ok(all_ok)
}

/// Usernames of a batch file, trimmed, blank lines dropped.
pub fn read_usernames(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
