//! Positional parsing of API page URLs.
//!
//! A page URL has the fixed shape
//!
//! ```text
//! https://kemono.party/api/v1/patreon/user/12345?o=50
//! [0]    [1] [2]      [3] [4] [5]    [6]  [7]
//! ```
//!
//! split on `/`. The host's first label names the domain folder, segment 5
//! is the service and segment 7 (minus any query) the artist id.

use crate::error::{AppError, Result};
use crate::utils::capitalize;
use crate::utils::url::{base_url, last_segment, strip_query};

/// Index of the host segment.
const HOST_SEGMENT: usize = 2;
/// Index of the service segment.
const SERVICE_SEGMENT: usize = 5;
/// Index of the artist id segment.
const ARTIST_SEGMENT: usize = 7;

/// Service name that is handed to the Discord collaborator.
pub const DISCORD_SERVICE: &str = "Discord";

/// A parsed page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    /// The URL as given
    pub raw: String,
    /// Scheme and host, e.g. `https://kemono.party`
    pub base_url: String,
    /// Capitalized first host label, e.g. `Kemono`
    pub domain: String,
    /// Capitalized service, e.g. `Patreon`
    pub service: String,
    /// Artist id as it appears in the URL
    pub artist_id: String,
    /// Last path segment without query, tracked per run
    pub username: String,
}

impl PageUrl {
    /// Parse a page URL from its fixed segment positions.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts: Vec<&str> = raw.split('/').collect();
        if parts.len() <= ARTIST_SEGMENT {
            return Err(AppError::malformed_url(raw, parts.len()));
        }

        let artist_id = strip_query(parts[ARTIST_SEGMENT]);
        let host = parts[HOST_SEGMENT];
        let label = host.split('.').next().unwrap_or(host);
        if artist_id.is_empty() || label.is_empty() || parts[SERVICE_SEGMENT].is_empty() {
            return Err(AppError::malformed_url(raw, parts.len()));
        }

        let base_url = base_url(raw).ok_or_else(|| AppError::malformed_url(raw, parts.len()))?;

        Ok(Self {
            raw: raw.to_string(),
            base_url,
            domain: capitalize(label),
            service: capitalize(parts[SERVICE_SEGMENT]),
            artist_id: artist_id.to_string(),
            username: last_segment(raw).to_string(),
        })
    }

    /// Whether this page belongs to a Discord server.
    pub fn is_discord(&self) -> bool {
        self.service == DISCORD_SERVICE
    }

    /// Canonical web URL of one post of this artist.
    pub fn post_url(&self, post_id: &str) -> String {
        format!(
            "{}/{}/user/{}/post/{}",
            self.base_url,
            self.service.to_lowercase(),
            self.artist_id.to_lowercase(),
            post_id
        )
    }

    /// API URL of the artist profile.
    pub fn profile_url(&self) -> String {
        format!(
            "{}/api/v1/{}/user/{}/profile",
            self.base_url,
            self.service.to_lowercase(),
            self.artist_id
        )
    }

    /// Absolute URL of a server-relative data path.
    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_url() {
        let page = PageUrl::parse("https://kemono.party/api/v1/patreon/user/12345?o=50").unwrap();
        assert_eq!(page.base_url, "https://kemono.party");
        assert_eq!(page.domain, "Kemono");
        assert_eq!(page.service, "Patreon");
        assert_eq!(page.artist_id, "12345");
        assert_eq!(page.username, "12345");
        assert!(!page.is_discord());
    }

    #[test]
    fn test_parse_keeps_port_in_base() {
        let page = PageUrl::parse("http://coomer.party:8080/api/v1/onlyfans/user/Bella").unwrap();
        assert_eq!(page.base_url, "http://coomer.party:8080");
        assert_eq!(page.domain, "Coomer");
        assert_eq!(page.service, "Onlyfans");
        assert_eq!(page.artist_id, "Bella");
    }

    #[test]
    fn test_five_segments_is_malformed() {
        let err = PageUrl::parse("https://kemono.party/api/v1").unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl { segments: 5, .. }));
    }

    #[test]
    fn test_missing_artist_segment_is_malformed() {
        let err = PageUrl::parse("https://kemono.party/api/v1/patreon/user").unwrap_err();
        assert!(matches!(err, AppError::MalformedUrl { segments: 7, .. }));
        assert!(PageUrl::parse("https://kemono.party/api/v1/patreon/user/?o=0").is_err());
    }

    #[test]
    fn test_discord_detection() {
        let page = PageUrl::parse("https://kemono.party/api/v1/discord/server/998877").unwrap();
        assert!(page.is_discord());
        assert_eq!(page.artist_id, "998877");
    }

    #[test]
    fn test_post_and_profile_urls() {
        let page = PageUrl::parse("https://kemono.party/api/v1/fanbox/user/ABC?o=0").unwrap();
        assert_eq!(
            page.post_url("77"),
            "https://kemono.party/fanbox/user/abc/post/77"
        );
        assert_eq!(
            page.profile_url(),
            "https://kemono.party/api/v1/fanbox/user/ABC/profile"
        );
        assert_eq!(
            page.resolve("/data/aa/bb/file.png"),
            "https://kemono.party/data/aa/bb/file.png"
        );
    }
}
