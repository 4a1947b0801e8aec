// src/services/downloader.rs

//! Resumable, idempotent file downloads.
//!
//! Bytes are streamed into `<name>.temp` and renamed to `<name>` once the
//! body ends, so a file under its final name is never still being written.
//! A body that stops short of its Content-Length is kept with a warning.
//! A `.temp` left behind by an interrupted run is discarded and the download
//! starts over; there is no byte-range resume.
//!
//! Concurrent runs against the same destination are not coordinated; only
//! one writer per destination directory is supported.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::CONTENT_LENGTH;
use reqwest::{Response, StatusCode};
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::services::Fetcher;
use crate::services::progress::{ProgressObserver, ProgressUnit};

/// Suffix of in-flight download files.
pub const TEMP_SUFFIX: &str = ".temp";

/// On-disk state of one download target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadState {
    /// Neither the final file nor a temp file exists
    Absent,
    /// A temp file from an earlier attempt exists
    InProgress(PathBuf),
    /// The final file exists
    Complete,
}

impl DownloadState {
    /// Inspect the destination. A leftover temp file takes precedence.
    pub async fn inspect(dest_dir: &Path, file_name: &str) -> Self {
        let temp = temp_path(dest_dir, file_name);
        if exists(&temp).await {
            return Self::InProgress(temp);
        }
        if exists(&dest_dir.join(file_name)).await {
            return Self::Complete;
        }
        Self::Absent
    }
}

/// Result of one download call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Final file already present, no request issued
    Skipped,
    /// File written; `declared` is the Content-Length (0 when unknown)
    Downloaded { bytes: u64, declared: u64 },
    /// Fetch exhausted, unexpected status, or I/O failure
    Failed,
}

impl DownloadOutcome {
    /// Received byte count differs from a known declared length.
    pub fn is_integrity_mismatch(&self) -> bool {
        match self {
            Self::Downloaded { bytes, declared } => !integrity_ok(*bytes, *declared),
            _ => false,
        }
    }
}

/// Downloads files through the retrying fetcher.
pub struct FileDownloader {
    fetcher: Arc<Fetcher>,
    progress: Arc<dyn ProgressObserver>,
}

impl FileDownloader {
    pub fn new(fetcher: Arc<Fetcher>, progress: Arc<dyn ProgressObserver>) -> Self {
        Self { fetcher, progress }
    }

    /// Download `url` to `dest_dir/file_name`.
    ///
    /// Never fails: every error is logged and reported as `Failed`.
    pub async fn download(&self, url: &str, dest_dir: &Path, file_name: &str) -> DownloadOutcome {
        match self.try_download(url, dest_dir, file_name).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Download of {} into {} failed: {}", url, dest_dir.display(), e);
                if let Err(e) = remove_if_exists(&temp_path(dest_dir, file_name)).await {
                    log::debug!("Could not remove temp file for {}: {}", file_name, e);
                }
                DownloadOutcome::Failed
            }
        }
    }

    async fn try_download(
        &self,
        url: &str,
        dest_dir: &Path,
        file_name: &str,
    ) -> Result<DownloadOutcome> {
        if let DownloadState::InProgress(temp) = DownloadState::inspect(dest_dir, file_name).await {
            log::info!("Discarding incomplete download {}", temp.display());
            remove_if_exists(&temp).await?;
        }

        if DownloadState::inspect(dest_dir, file_name).await == DownloadState::Complete {
            log::info!("Skipping download: {} already exists", file_name);
            return Ok(DownloadOutcome::Skipped);
        }

        let Some(response) = self.fetcher.fetch(url).await else {
            return Ok(DownloadOutcome::Failed);
        };
        if response.status() != StatusCode::OK {
            log::warn!(
                "Unexpected status {} for {}, not saving {}",
                response.status(),
                url,
                file_name
            );
            return Ok(DownloadOutcome::Failed);
        }

        let temp = temp_path(dest_dir, file_name);
        let final_path = dest_dir.join(file_name);
        let declared = declared_length(&response);

        let bytes = self.stream_to_file(response, &temp, file_name, declared).await?;
        tokio::fs::rename(&temp, &final_path).await?;

        if !integrity_ok(bytes, declared) {
            log::warn!(
                "Size mismatch for {}: received {} of {} declared bytes",
                final_path.display(),
                bytes,
                declared
            );
        }
        log::info!("Downloaded: {}", file_name);

        Ok(DownloadOutcome::Downloaded { bytes, declared })
    }

    async fn stream_to_file(
        &self,
        mut response: Response,
        temp: &Path,
        label: &str,
        declared: u64,
    ) -> Result<u64> {
        let progress = self.progress.begin(label, declared, ProgressUnit::Bytes);
        let mut file = tokio::fs::File::create(temp).await?;
        let mut received = 0u64;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                // A body cut short still counts as received; the size check
                // in the caller reports the mismatch.
                Err(e) if received > 0 => {
                    log::warn!("Body of {} ended early after {} bytes: {}", label, received, e);
                    break;
                }
                Err(e) => {
                    progress.finish();
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            progress.advance(chunk.len() as u64);
        }

        file.flush().await?;
        progress.finish();
        Ok(received)
    }
}

/// Path of the in-flight file for a target.
pub fn temp_path(dest_dir: &Path, file_name: &str) -> PathBuf {
    dest_dir.join(format!("{file_name}{TEMP_SUFFIX}"))
}

/// A declared length of 0 is unknown and always passes.
fn integrity_ok(received: u64, declared: u64) -> bool {
    declared == 0 || received == declared
}

fn declared_length(response: &Response) -> u64 {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use crate::models::FetchConfig;
    use crate::services::progress::{NoProgress, ProgressHandle};
    use crate::storage::MemoryErrorLog;
    use crate::utils::http::client_builder;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct RecordingProgress {
        events: Arc<Mutex<Vec<String>>>,
    }

    struct RecordingHandle {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl ProgressObserver for RecordingProgress {
        fn begin(&self, label: &str, total: u64, unit: ProgressUnit) -> Box<dyn ProgressHandle> {
            self.events
                .lock()
                .unwrap()
                .push(format!("begin {label} {total} {unit:?}"));
            Box::new(RecordingHandle {
                events: Arc::clone(&self.events),
            })
        }
    }

    impl ProgressHandle for RecordingHandle {
        fn advance(&self, delta: u64) {
            self.events.lock().unwrap().push(format!("advance {delta}"));
        }

        fn finish(&self) {
            self.events.lock().unwrap().push("finish".to_string());
        }
    }

    fn downloader(server: &MockServer, progress: Arc<dyn ProgressObserver>) -> FileDownloader {
        downloader_at(*server.address(), 60, progress)
    }

    fn downloader_at(
        addr: SocketAddr,
        timeout_secs: u64,
        progress: Arc<dyn ProgressObserver>,
    ) -> FileDownloader {
        let config = FetchConfig {
            retry_delay_ms: 0,
            retries: 1,
            timeout_secs,
            ..FetchConfig::default()
        };
        let client = client_builder(&config)
            .resolve("kemono.party", addr)
            .resolve("kemono.su", addr)
            .build()
            .unwrap();
        let fetcher = Fetcher::new(client, config, Arc::new(MemoryErrorLog::new()));
        FileDownloader::new(Arc::new(fetcher), progress)
    }

    /// One-connection HTTP server writing `head`, then each chunk after
    /// `gap`, then closing.
    async fn raw_server(head: &'static str, chunks: Vec<&'static [u8]>, gap: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }

            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            for chunk in chunks {
                tokio::time::sleep(gap).await;
                socket.write_all(chunk).await.unwrap();
                socket.flush().await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        });

        addr
    }

    fn raw_url(addr: SocketAddr, file: &str) -> String {
        format!("http://kemono.party:{}/data/{}", addr.port(), file)
    }

    fn file_url(server: &MockServer, file: &str) -> String {
        format!("http://kemono.party:{}/data/{}", server.address().port(), file)
    }

    async fn serve(server: &MockServer, file: &str, body: &'static [u8], expected_hits: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/data/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .expect(expected_hits)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_download_writes_final_file() {
        let server = MockServer::start().await;
        serve(&server, "a.png", b"pixels", 1).await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader(&server, Arc::new(NoProgress));

        let outcome = dl.download(&file_url(&server, "a.png"), tmp.path(), "a.png").await;

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                bytes: 6,
                declared: 6
            }
        );
        assert_eq!(std::fs::read(tmp.path().join("a.png")).unwrap(), b"pixels");
        assert!(!temp_path(tmp.path(), "a.png").exists());
    }

    #[tokio::test]
    async fn test_second_run_issues_no_request() {
        let server = MockServer::start().await;
        serve(&server, "a.png", b"pixels", 1).await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader(&server, Arc::new(NoProgress));
        let url = file_url(&server, "a.png");

        dl.download(&url, tmp.path(), "a.png").await;
        let second = dl.download(&url, tmp.path(), "a.png").await;

        assert_eq!(second, DownloadOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_leftover_temp_is_discarded_before_fresh_attempt() {
        let server = MockServer::start().await;
        serve(&server, "b.zip", b"complete body", 1).await;
        let tmp = TempDir::new().unwrap();
        std::fs::write(temp_path(tmp.path(), "b.zip"), b"partial").unwrap();
        assert_eq!(
            DownloadState::inspect(tmp.path(), "b.zip").await,
            DownloadState::InProgress(temp_path(tmp.path(), "b.zip"))
        );

        let dl = downloader(&server, Arc::new(NoProgress));
        dl.download(&file_url(&server, "b.zip"), tmp.path(), "b.zip").await;

        assert_eq!(
            std::fs::read(tmp.path().join("b.zip")).unwrap(),
            b"complete body"
        );
        assert_eq!(
            DownloadState::inspect(tmp.path(), "b.zip").await,
            DownloadState::Complete
        );
    }

    #[tokio::test]
    async fn test_temp_discarded_even_when_final_exists() {
        let server = MockServer::start().await;
        serve(&server, "c.txt", b"unused", 0).await;
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("c.txt"), b"done").unwrap();
        std::fs::write(temp_path(tmp.path(), "c.txt"), b"stale").unwrap();

        let dl = downloader(&server, Arc::new(NoProgress));
        let outcome = dl.download(&file_url(&server, "c.txt"), tmp.path(), "c.txt").await;

        assert_eq!(outcome, DownloadOutcome::Skipped);
        assert!(!temp_path(tmp.path(), "c.txt").exists());
        assert_eq!(std::fs::read(tmp.path().join("c.txt")).unwrap(), b"done");
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader(&server, Arc::new(NoProgress));

        let outcome = dl.download(&file_url(&server, "d.bin"), tmp.path(), "d.bin").await;

        assert_eq!(outcome, DownloadOutcome::Failed);
        assert_eq!(
            DownloadState::inspect(tmp.path(), "d.bin").await,
            DownloadState::Absent
        );
    }

    #[tokio::test]
    async fn test_non_200_success_is_not_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader(&server, Arc::new(NoProgress));

        let outcome = dl.download(&file_url(&server, "e.bin"), tmp.path(), "e.bin").await;

        assert_eq!(outcome, DownloadOutcome::Failed);
        assert!(!tmp.path().join("e.bin").exists());
    }

    #[tokio::test]
    async fn test_progress_reports_declared_total() {
        let server = MockServer::start().await;
        serve(&server, "f.bin", b"0123456789", 1).await;
        let tmp = TempDir::new().unwrap();
        let progress = Arc::new(RecordingProgress::default());
        let events = Arc::clone(&progress.events);
        let dl = downloader(&server, progress);

        dl.download(&file_url(&server, "f.bin"), tmp.path(), "f.bin").await;

        let events = events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("begin f.bin 10 Bytes"));
        assert_eq!(events.last().map(String::as_str), Some("finish"));
        let advanced: u64 = events
            .iter()
            .filter_map(|e| e.strip_prefix("advance "))
            .map(|n| n.parse::<u64>().unwrap())
            .sum();
        assert_eq!(advanced, 10);
    }

    #[tokio::test]
    async fn test_slow_body_outlives_timeout() {
        let addr = raw_server(
            "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\n",
            b"abcdefgh".chunks(1).collect(),
            Duration::from_millis(300),
        )
        .await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader_at(addr, 1, Arc::new(NoProgress));

        let outcome = dl.download(&raw_url(addr, "slow.bin"), tmp.path(), "slow.bin").await;

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                bytes: 8,
                declared: 8
            }
        );
        assert_eq!(std::fs::read(tmp.path().join("slow.bin")).unwrap(), b"abcdefgh");
    }

    #[tokio::test]
    async fn test_truncated_body_is_kept_with_mismatch() {
        let addr = raw_server(
            "HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n",
            vec![b"0123456789"],
            Duration::ZERO,
        )
        .await;
        let tmp = TempDir::new().unwrap();
        let dl = downloader_at(addr, 60, Arc::new(NoProgress));

        let outcome = dl.download(&raw_url(addr, "cut.bin"), tmp.path(), "cut.bin").await;

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                bytes: 10,
                declared: 100
            }
        );
        assert!(outcome.is_integrity_mismatch());
        assert_eq!(std::fs::read(tmp.path().join("cut.bin")).unwrap(), b"0123456789");
        assert!(!temp_path(tmp.path(), "cut.bin").exists());
    }

    #[tokio::test]
    async fn test_unknown_length_reports_zero_total() {
        let addr = raw_server(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
            vec![b"5\r\nhello\r\n", b"6\r\n world\r\n", b"0\r\n\r\n"],
            Duration::from_millis(20),
        )
        .await;
        let tmp = TempDir::new().unwrap();
        let progress = Arc::new(RecordingProgress::default());
        let events = Arc::clone(&progress.events);
        let dl = downloader_at(addr, 60, progress);

        let outcome = dl.download(&raw_url(addr, "g.txt"), tmp.path(), "g.txt").await;

        assert_eq!(
            outcome,
            DownloadOutcome::Downloaded {
                bytes: 11,
                declared: 0
            }
        );
        let events = events.lock().unwrap().clone();
        assert_eq!(events.first().map(String::as_str), Some("begin g.txt 0 Bytes"));
        assert_eq!(events.last().map(String::as_str), Some("finish"));
        let advanced: u64 = events
            .iter()
            .filter_map(|e| e.strip_prefix("advance "))
            .map(|n| n.parse::<u64>().unwrap())
            .sum();
        assert_eq!(advanced, 11);
        assert_eq!(std::fs::read(tmp.path().join("g.txt")).unwrap(), b"hello world");
    }

    #[test]
    fn test_integrity_check() {
        assert!(integrity_ok(10, 10));
        assert!(integrity_ok(10, 0));
        assert!(!integrity_ok(9, 10));
        assert!(
            DownloadOutcome::Downloaded {
                bytes: 3,
                declared: 5
            }
            .is_integrity_mismatch()
        );
        assert!(!DownloadOutcome::Skipped.is_integrity_mismatch());
    }
}
