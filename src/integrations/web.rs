//! HTTP downloader
//!
//! Fetches a document's `downloadURL` with a single GET and streams the body
//! into a temp file.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::{
    Client,
    header::{self, HeaderMap, HeaderValue},
};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_util::{io::StreamReader, sync::CancellationToken};
use tracing::{debug, info, instrument, trace};
use url::Url;

use super::{Document, DocumentDownloader, DownloadError, TempDocument};

/// Timeout applied when none, or zero, is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Default)]
pub struct WebDownloaderBuilder {
    timeout: Option<Duration>,
    max_redirects: usize,
    temp_dir: Option<PathBuf>,
}

impl WebDownloaderBuilder {
    /// Bound on the whole round trip, not just connection setup
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Redirects to follow before a 3xx is treated as a failed download.
    /// Defaults to 0, so redirects surface as errors.
    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    pub fn build(self) -> Result<WebDownloader, DownloadError> {
        let timeout = self
            .timeout
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(DEFAULT_TIMEOUT);

        let redirect = if self.max_redirects == 0 {
            reqwest::redirect::Policy::none()
        } else {
            reqwest::redirect::Policy::limited(self.max_redirects)
        };

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect)
            .default_headers(headers)
            .build()
            .map_err(DownloadError::Client)?;

        Ok(WebDownloader {
            client,
            timeout,
            temp_dir: self.temp_dir.unwrap_or_else(std::env::temp_dir),
        })
    }
}

/// Downloads documents from their URL.
#[derive(Debug, Clone)]
pub struct WebDownloader {
    client: Client,
    timeout: Duration,
    temp_dir: PathBuf,
}

impl WebDownloader {
    pub fn builder() -> WebDownloaderBuilder {
        WebDownloaderBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // Stream the response body into `file`, returning the number of bytes written
    async fn download_into(&self, url: Url, file: &mut File) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(DownloadError::Request)?;

        let status = response.status();
        trace!(%status, "Got response");
        if status.as_u16() >= 300 {
            return Err(DownloadError::Status(status));
        }

        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut reader = std::pin::pin!(StreamReader::new(stream));

        let bytes = tokio::io::copy(&mut reader, file)
            .await
            .map_err(DownloadError::Copy)?;
        file.flush().await.map_err(DownloadError::Copy)?;

        Ok(bytes)
    }
}

fn parse_download_url(download_url: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(download_url).map_err(|source| DownloadError::InvalidUrl {
        url: download_url.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DownloadError::UnsupportedScheme(other.to_string())),
    }
}

#[async_trait]
impl DocumentDownloader for WebDownloader {
    #[instrument(name = "web_download", level = "debug", skip(self, doc, cancel), fields(url = %doc.download_url))]
    async fn download_document(
        &self,
        doc: &Document,
        cancel: &CancellationToken,
    ) -> Result<TempDocument, DownloadError> {
        let url = parse_download_url(&doc.download_url)?;

        let mut temp = TempDocument::create(&self.temp_dir, &doc.patient_id).await?;
        debug!(path = ?temp.path(), "Downloading file");

        // A failure from here on drops `temp`, which removes the partial file
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Download cancelled");
                return Err(DownloadError::Cancelled);
            }
            result = self.download_into(url, temp.file_mut()) => result?,
        };

        temp.rewind().await.map_err(DownloadError::Seek)?;

        info!(bytes, path = ?temp.path(), "Download completed");
        Ok(temp)
    }
}
