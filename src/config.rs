//! Config module for docfetch

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, ValueEnum};

use crate::integrations::DEFAULT_TIMEOUT;

/// Which downloader the router wires into the handler
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum DownloaderKind {
    #[default]
    Web,
    Noop,
}

/// Which importer the router wires into the handler
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum ImporterKind {
    #[default]
    Noop,
    Directory,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadConfig {
    #[clap(long, env = "DOCFETCH_DOWNLOADER", value_enum, default_value = "web")]
    pub downloader: DownloaderKind,

    /// Total round-trip timeout for a single download, 0 falls back to the default
    #[clap(long, env = "DOCFETCH_DOWNLOAD_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub download_timeout_secs: u64,

    /// Redirects the web downloader follows before treating a 3xx as a failure
    #[clap(long, env = "DOCFETCH_MAX_REDIRECTS", default_value_t = 0)]
    pub max_redirects: usize,

    /// Directory for downloaded temp files, they are removed once the request completes
    #[clap(long, env = "DOCFETCH_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ImportConfig {
    #[clap(long, env = "DOCFETCH_IMPORTER", value_enum, default_value = "noop")]
    pub importer: ImporterKind,

    /// Root directory the directory importer writes documents into
    #[clap(long, env = "DOCFETCH_IMPORT_DIR")]
    #[clap(required_if_eq("importer", "directory"))]
    pub import_dir: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[clap(name = "docfetch", about = "Download documents and hand them to an importer")]
pub struct Config {
    #[clap(long, env = "DOCFETCH_HOST", default_value = "0.0.0.0:8080")]
    pub host: String,

    /// Accept new documents, when false every request is answered with 503
    #[clap(long, env = "DOCFETCH_INSERTS_ENABLED", default_value_t = true, action = ArgAction::Set)]
    pub inserts_enabled: bool,

    /// Upper bound on the JSON request body
    #[clap(long, env = "DOCFETCH_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
    pub max_body_bytes: usize,

    #[clap(flatten)]
    pub download: DownloadConfig,

    #[clap(flatten)]
    pub import: ImportConfig,
}

pub fn config() -> Config {
    Config::parse()
}
