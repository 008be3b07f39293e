//! Importer that persists documents into a local directory tree
//!
//! Documents land at `<root>/<categoryID>/<documentID>`, or `<root>/<documentID>`
//! when no category is given.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tracing::{debug, info};

use super::{Document, DocumentImporter, ImportError};

#[derive(Debug, Clone)]
pub struct DirectoryImporter {
    root: PathBuf,
}

impl DirectoryImporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `doc` will be written
    pub fn destination(&self, doc: &Document) -> Result<PathBuf, ImportError> {
        let document_id = path_segment("documentID", &doc.document_id)?;
        let mut dest = self.root.clone();
        if !doc.category_id.is_empty() {
            dest.push(path_segment("categoryID", &doc.category_id)?);
        }
        dest.push(document_id);
        Ok(dest)
    }
}

// Unique hidden file next to the destination, removed on drop unless persisted
async fn create_partial(dir: &Path, document_id: &str) -> io::Result<(std::fs::File, TempPath)> {
    let dir = dir.to_path_buf();
    let prefix = format!(".{document_id}.");
    tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".partial")
            .tempfile_in(&dir)
            .map(NamedTempFile::into_parts)
    })
    .await
    .map_err(io::Error::other)?
}

// Identifiers come straight from the request body, keep them to a single path component
fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str, ImportError> {
    if value.is_empty() {
        return Err(ImportError::InvalidDocument(format!("{field} is empty")));
    }
    if value == "." || value == ".." || value.contains(['/', '\\', '\0']) {
        return Err(ImportError::InvalidDocument(format!(
            "{field} {value:?} is not a valid file name"
        )));
    }
    Ok(value)
}

#[async_trait]
impl DocumentImporter for DirectoryImporter {
    #[tracing::instrument(name = "directory_import", skip(self, doc, reader), fields(document_id = %doc.document_id))]
    async fn import_document(
        &self,
        doc: &Document,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), ImportError> {
        let dest = self.destination(doc)?;
        let dir = dest.parent().unwrap_or(self.root.as_path()).to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        // Every import gets its own partial file; the last one persisted wins
        let (file, partial) = create_partial(&dir, &doc.document_id).await?;
        debug!(path = ?partial, "Writing document");

        let mut file = tokio::fs::File::from_std(file);
        let bytes = tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        let target = dest.clone();
        tokio::task::spawn_blocking(move || partial.persist(target))
            .await
            .map_err(io::Error::other)?
            .map_err(io::Error::from)?;

        info!(bytes, path = ?dest, "Document imported");
        Ok(())
    }
}
