// src/utils/url.rs

//! URL manipulation utilities.

/// Scheme and authority of a URL, without a trailing slash.
///
/// # Examples
/// ```
/// use kemono_mirror::utils::url::base_url;
///
/// assert_eq!(
///     base_url("https://kemono.party/api/v1/patreon/user/1"),
///     Some("https://kemono.party".to_string())
/// );
/// ```
pub fn base_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}

/// Rewrite the host suffix of a URL for the fallback domain.
///
/// Every occurrence of `primary` is replaced; a URL without `primary`
/// comes back unchanged.
pub fn with_fallback_suffix(url: &str, primary: &str, fallback: &str) -> String {
    url.replace(primary, fallback)
}

/// Last path segment of a URL with any query string removed.
pub fn last_segment(url: &str) -> &str {
    let last = url.rsplit('/').next().unwrap_or(url);
    strip_query(last)
}

/// Cut a segment at the first `?`.
pub fn strip_query(segment: &str) -> &str {
    segment.split('?').next().unwrap_or(segment)
}
