use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use super::{
    Document, DocumentDownloader, DocumentImporter, DownloadError, ImportError, TempDocument,
};

/// An integration that does nothing.
///
/// Downloads produce an empty temp file without touching the network, imports
/// always succeed.
#[derive(Debug, Clone)]
pub struct NoopIntegration {
    temp_dir: PathBuf,
}

impl Default for NoopIntegration {
    fn default() -> Self {
        Self::new()
    }
}

impl NoopIntegration {
    pub fn new() -> Self {
        Self {
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }
}

#[async_trait]
impl DocumentDownloader for NoopIntegration {
    async fn download_document(
        &self,
        doc: &Document,
        _cancel: &CancellationToken,
    ) -> Result<TempDocument, DownloadError> {
        tracing::debug!(document_id = %doc.document_id, "Simulating download");
        TempDocument::create(&self.temp_dir, "noop").await
    }
}

#[async_trait]
impl DocumentImporter for NoopIntegration {
    async fn import_document(
        &self,
        doc: &Document,
        _reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), ImportError> {
        tracing::debug!(document_id = %doc.document_id, "Skipping import");
        Ok(())
    }
}
