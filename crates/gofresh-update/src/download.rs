//! Streaming release download with progress reporting
//!
//! The response body is written to disk chunk by chunk, never buffered
//! whole. Progress is decoupled from the transport through an observer so
//! the CLI can render a bar while tests record or ignore the callbacks.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use gofresh_core::{Error, Result};
use tracing::{debug, info};

const USER_AGENT: &str = concat!("gofresh/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Receives download progress, decoupled from the transport.
///
/// `total` is the size declared by the server, when known. Callers must
/// not derive a percentage when it is `None`.
pub trait ProgressObserver: Send {
    /// Called after each chunk is written to disk.
    fn on_chunk(&mut self, bytes_so_far: u64, total: Option<u64>);

    /// Called once after the final chunk.
    fn on_complete(&mut self) {}
}

/// Observer that ignores all progress.
pub struct NoopProgress;

impl ProgressObserver for NoopProgress {
    fn on_chunk(&mut self, _bytes_so_far: u64, _total: Option<u64>) {}
}

/// HTTP fetcher for release artifacts.
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| Error::fetch("<client>", e.to_string()))?;
        Ok(Self { client })
    }

    /// Download `url` to `dest`, reporting progress through `observer`.
    ///
    /// Creates or overwrites `dest`. Any network, HTTP-status, or disk
    /// error aborts the download; a partial file may remain and is the
    /// caller's to clean up.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        observer: &mut dyn ProgressObserver,
    ) -> Result<u64> {
        info!(url, dest = %dest.display(), "downloading release artifact");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::fetch(
                url,
                format!("HTTP status {}", response.status()),
            ));
        }

        // Zero or absent Content-Length both mean "unknown": no percentage.
        let total = response.content_length().filter(|&len| len > 0);
        debug!(?total, "response headers received");

        let mut file = File::create(dest)
            .map_err(|e| Error::fetch(url, format!("create {}: {}", dest.display(), e)))?;

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk: bytes::Bytes = chunk.map_err(|e| Error::fetch(url, e.to_string()))?;
            file.write_all(&chunk)
                .map_err(|e| Error::fetch(url, format!("write {}: {}", dest.display(), e)))?;

            downloaded += chunk.len() as u64;
            observer.on_chunk(downloaded, total);
        }

        file.flush()
            .map_err(|e| Error::fetch(url, format!("flush {}: {}", dest.display(), e)))?;
        observer.on_complete();

        info!(bytes = downloaded, "download complete");
        Ok(downloaded)
    }
}
