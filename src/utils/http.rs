// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &FetchConfig) -> Result<reqwest::Client> {
    let client = client_builder(config).build()?;
    Ok(client)
}

/// Client builder with user agent, connect and idle timeouts applied.
///
/// There is no whole-request deadline: file bodies may stream for as long
/// as bytes keep arriving. Callers that buffer a body bound the request
/// with [`request_timeout`].
///
/// Exposed so callers can add transport options (proxies, DNS overrides)
/// before building.
pub fn client_builder(config: &FetchConfig) -> reqwest::ClientBuilder {
    let timeout = request_timeout(config);
    reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(timeout)
        .read_timeout(timeout)
}

/// Deadline for requests whose whole body is read into memory.
pub fn request_timeout(config: &FetchConfig) -> Duration {
    Duration::from_secs(config.timeout_secs)
}
