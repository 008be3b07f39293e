//! Scoped temp files for downloaded content

use std::io::{self, SeekFrom};
use std::path::Path;

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;

use super::DownloadError;

/// Downloaded content backed by a temp file.
///
/// The file is deleted when this value is closed or dropped, whichever comes first.
#[derive(Debug)]
pub struct TempDocument {
    file: File,
    path: TempPath,
}

impl TempDocument {
    /// Create an empty temp file in `dir` named `<prefix>-XXXXXX.jpg`.
    ///
    /// The prefix is cosmetic, anything outside `[A-Za-z0-9_-]` is replaced.
    /// Creating the file runs on the blocking pool.
    pub async fn create(dir: &Path, prefix: &str) -> Result<Self, DownloadError> {
        let dir = dir.to_path_buf();
        let prefix = format!("{}-", sanitize_prefix(prefix));
        let (file, path) = tokio::task::spawn_blocking(move || create_in(&dir, &prefix))
            .await
            .map_err(|e| DownloadError::TempFile(io::Error::other(e)))?
            .map_err(DownloadError::TempFile)?;

        Ok(Self {
            file: File::from_std(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub async fn rewind(&mut self) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(0)).await.map(|_| ())
    }

    /// Close the handle and delete the file, reporting a failed delete.
    pub fn close(self) -> io::Result<()> {
        drop(self.file);
        self.path.close()
    }
}

fn create_in(dir: &Path, prefix: &str) -> io::Result<(std::fs::File, TempPath)> {
    let temp = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".jpg")
        .tempfile_in(dir)?;
    Ok(temp.into_parts())
}

fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
