//! `POST /download`: fetch a document and hand it to an importer.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Request, State},
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::integrations::{
    Document, DocumentDownloader, DocumentImporter, DownloadError, ImportError, TempDocument,
};

/// Errors that end a download request.
///
/// The error text is sent back to the caller verbatim.
#[derive(thiserror::Error, Debug)]
pub enum HandlerError {
    #[error("inserts are disabled")]
    InsertsDisabled,

    #[error("unable to read request body: {0}")]
    Body(#[source] axum::Error),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Import(#[from] ImportError),
}

impl HandlerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::InsertsDisabled => StatusCode::SERVICE_UNAVAILABLE,
            HandlerError::Body(_) | HandlerError::Decode(_) => StatusCode::BAD_REQUEST,
            HandlerError::Download(_) | HandlerError::Import(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, "Document request failed: {:?}", self);
        } else {
            warn!(%status, "Document request rejected: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: "success" }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadHandlerConfig {
    /// When false, requests are refused before their body is read
    pub inserts_enabled: bool,
    pub max_body_bytes: usize,
}

impl Default for DownloadHandlerConfig {
    fn default() -> Self {
        Self {
            inserts_enabled: true,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Downloads a file from a url and imports it into a system
pub struct FileDownloader {
    downloader: Arc<dyn DocumentDownloader>,
    importer: Arc<dyn DocumentImporter>,
    config: DownloadHandlerConfig,
    shutdown: CancellationToken,
}

impl FileDownloader {
    pub fn new(
        downloader: Arc<dyn DocumentDownloader>,
        importer: Arc<dyn DocumentImporter>,
    ) -> Self {
        Self {
            downloader,
            importer,
            config: DownloadHandlerConfig::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: DownloadHandlerConfig) -> Self {
        self.config = config;
        self
    }

    /// Abort in-flight downloads once `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    fn can_insert_document(&self) -> bool {
        self.config.inserts_enabled
    }

    pub async fn handle(&self, body: Body) -> Result<StatusResponse, HandlerError> {
        if !self.can_insert_document() {
            // Dropping the body unread tells hyper we are done with it
            drop(body);
            return Err(HandlerError::InsertsDisabled);
        }

        let bytes = axum::body::to_bytes(body, self.config.max_body_bytes)
            .await
            .map_err(HandlerError::Body)?;
        let doc: Document = serde_json::from_slice(&bytes)?;

        info!(
            download_url = %doc.download_url,
            document_id = %doc.document_id,
            "Received request to download file"
        );

        // A dropped request drops the download with it; the token covers server shutdown
        let cancel = self.shutdown.child_token();
        let mut temp: TempDocument = self.downloader.download_document(&doc, &cancel).await?;

        let imported = self.importer.import_document(&doc, temp.file_mut()).await;

        let path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!(path = ?path, "Failed to remove temp file: {}", e);
        }

        imported?;

        info!(document_id = %doc.document_id, "Document imported");
        Ok(StatusResponse::success())
    }
}

pub async fn download_handler(
    State(downloader): State<Arc<FileDownloader>>,
    request: Request,
) -> Result<Json<StatusResponse>, HandlerError> {
    downloader.handle(request.into_body()).await.map(Json)
}
