// src/services/fetcher.rs

//! HTTP GET with retries and top-level-domain fallback.
//!
//! A URL is tried `retries` times. When every attempt fails (network error
//! or non-2xx status) the primary host suffix is swapped for the fallback
//! suffix and the same budget is spent on the rewritten URL. When that is
//! exhausted too, the URL is recorded in the error sink and the caller gets
//! `None`: the unit of work is skipped, the run goes on.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;
use crate::storage::ErrorSink;
use crate::utils::http::request_timeout;
use crate::utils::url::with_fallback_suffix;

/// Retrying HTTP fetcher.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    errors: Arc<dyn ErrorSink>,
}

impl Fetcher {
    pub fn new(client: Client, config: FetchConfig, errors: Arc<dyn ErrorSink>) -> Self {
        Self {
            client,
            config,
            errors,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// GET `url` with the configured retry budget and fallback suffix.
    ///
    /// The body is not read; callers stream it or collect it as needed.
    pub async fn fetch(&self, url: &str) -> Option<Response> {
        self.fetch_with(url, self.config.retries, &self.config.fallback_suffix)
            .await
    }

    /// GET `url` with an explicit retry budget and fallback suffix.
    pub async fn fetch_with(
        &self,
        url: &str,
        retries: u32,
        fallback_suffix: &str,
    ) -> Option<Response> {
        let result = self.try_fetch(url, retries, fallback_suffix).await;
        self.skip_exhausted(url, result).await
    }

    /// Fetch and decode a JSON body.
    ///
    /// Each attempt, body included, is bounded by the configured timeout.
    /// `Ok(None)` means the URL was skipped after exhausting retries; an
    /// unreadable or undecodable body is an error.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let deadline = Some(request_timeout(&self.config));
        let result = self
            .send_with_fallback(url, self.config.retries, &self.config.fallback_suffix, deadline)
            .await;
        let Some(response) = self.skip_exhausted(url, result).await else {
            return Ok(None);
        };
        let body = response.text().await?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Run both retry batches, reporting exhaustion as an error.
    ///
    /// No overall deadline applies, so streamed bodies may take as long as
    /// data keeps arriving.
    pub async fn try_fetch(
        &self,
        url: &str,
        retries: u32,
        fallback_suffix: &str,
    ) -> Result<Response> {
        self.send_with_fallback(url, retries, fallback_suffix, None).await
    }

    async fn send_with_fallback(
        &self,
        url: &str,
        retries: u32,
        fallback_suffix: &str,
        deadline: Option<Duration>,
    ) -> Result<Response> {
        if let Some(response) = self.attempt_all(url, retries, deadline).await {
            return Ok(response);
        }

        // A URL without the primary suffix is retried unchanged.
        let fallback_url = with_fallback_suffix(url, &self.config.primary_suffix, fallback_suffix);
        log::warn!("Retrying with fallback URL: {}", fallback_url);

        if let Some(response) = self.attempt_all(&fallback_url, retries, deadline).await {
            return Ok(response);
        }

        Err(AppError::FetchExhausted {
            url: fallback_url,
            attempts: retries * 2,
        })
    }

    /// Log and record exhaustion; other errors are only logged.
    async fn skip_exhausted(&self, url: &str, result: Result<Response>) -> Option<Response> {
        match result {
            Ok(response) => Some(response),
            Err(AppError::FetchExhausted { url, attempts }) => {
                log::error!(
                    "Failed to download {} after {} attempts, logging to error log",
                    url,
                    attempts
                );
                if let Err(e) = self.errors.record(&url).await {
                    log::warn!("Could not record failed URL {}: {}", url, e);
                }
                None
            }
            Err(e) => {
                log::error!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }

    async fn attempt_all(
        &self,
        url: &str,
        retries: u32,
        deadline: Option<Duration>,
    ) -> Option<Response> {
        let delay = Duration::from_millis(self.config.retry_delay_ms);

        for attempt in 1..=retries {
            match self.attempt(url, deadline).await {
                Ok(response) => return Some(response),
                Err(e) => {
                    log::warn!("Failed to get {}, attempt {}: {}", url, attempt, e);
                    if attempt < retries && !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        None
    }

    async fn attempt(&self, url: &str, deadline: Option<Duration>) -> reqwest::Result<Response> {
        let mut request = self.client.get(url);
        if let Some(deadline) = deadline {
            request = request.timeout(deadline);
        }
        request.send().await?.error_for_status()
    }
}
