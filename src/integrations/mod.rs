//! Integrations for fetching and persisting documents.
//!
//! A request is served by two collaborators:
//!
//! - a [`DocumentDownloader`], which fetches the content a [`Document`] points at
//!   into a [`TempDocument`]
//! - a [`DocumentImporter`], which reads that content once and persists it
//!
//! Both are injected into the handler as trait objects, so any pairing works.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

mod directory;
mod document;
mod noop;
mod temp;
mod web;

pub use directory::DirectoryImporter;
pub use document::Document;
pub use noop::NoopIntegration;
pub use temp::TempDocument;
pub use web::{DEFAULT_TIMEOUT, WebDownloader};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid download url provided {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported download url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("unable to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("unable to create temp file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("unable to make request to download file: {0}")]
    Request(#[source] reqwest::Error),

    #[error("invalid status code received: {0}")]
    Status(reqwest::StatusCode),

    #[error("unable to copy payload to temp file: {0}")]
    Copy(#[source] std::io::Error),

    #[error("unable to seek to beginning of temp file: {0}")]
    Seek(#[source] std::io::Error),

    #[error("download cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid document for import: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] color_eyre::eyre::Report),
}

/// Fetches the content a [`Document`] refers to.
#[async_trait]
pub trait DocumentDownloader: Send + Sync {
    /// Download the document into a temp file positioned at offset 0.
    ///
    /// The returned file is removed when the [`TempDocument`] is closed or dropped.
    /// Implementations should give up with [`DownloadError::Cancelled`] once `cancel` fires.
    async fn download_document(
        &self,
        doc: &Document,
        cancel: &CancellationToken,
    ) -> Result<TempDocument, DownloadError>;
}

/// Persists downloaded document content.
#[async_trait]
pub trait DocumentImporter: Send + Sync {
    /// Import the document, reading `reader` once from its current position.
    async fn import_document(
        &self,
        doc: &Document,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), ImportError>;
}
