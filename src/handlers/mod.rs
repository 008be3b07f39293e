pub mod download;

pub use download::{DownloadHandlerConfig, FileDownloader, download_handler};
