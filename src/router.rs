use std::sync::Arc;

use axum::{Router, routing::post};
use color_eyre::eyre::{Result, eyre};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{Config, DownloaderKind, ImporterKind};
use crate::handlers::{DownloadHandlerConfig, FileDownloader, download_handler};
use crate::integrations::{
    DirectoryImporter, DocumentDownloader, DocumentImporter, NoopIntegration, WebDownloader,
};

/// Bind the download handler to `POST /download`
pub fn download_router(handler: FileDownloader) -> Router {
    Router::new()
        .route("/download", post(download_handler))
        .with_state(Arc::new(handler))
}

fn build_downloader(config: &Config) -> Result<Arc<dyn DocumentDownloader>> {
    let temp_dir = config.download.temp_dir();
    match config.download.downloader {
        DownloaderKind::Web => {
            let web = WebDownloader::builder()
                .timeout(config.download.timeout())
                .max_redirects(config.download.max_redirects)
                .temp_dir(&temp_dir)
                .build()?;
            tracing::info!(
                timeout = ?web.timeout(),
                max_redirects = config.download.max_redirects,
                temp_dir = ?temp_dir,
                "Using web downloader"
            );
            Ok(Arc::new(web))
        }
        DownloaderKind::Noop => {
            tracing::warn!("Using no-op downloader, documents will not be fetched");
            Ok(Arc::new(NoopIntegration::new().with_temp_dir(temp_dir)))
        }
    }
}

fn build_importer(config: &Config) -> Result<Arc<dyn DocumentImporter>> {
    match config.import.importer {
        ImporterKind::Noop => {
            tracing::info!("Using no-op importer");
            Ok(Arc::new(NoopIntegration::new()))
        }
        ImporterKind::Directory => {
            let root = config
                .import
                .import_dir
                .clone()
                .ok_or_else(|| eyre!("directory importer needs an import directory"))?;
            let importer = DirectoryImporter::new(root);
            tracing::info!(root = ?importer.root(), "Using directory importer");
            Ok(Arc::new(importer))
        }
    }
}

/// Create the main router, wiring one downloader and one importer from `config`.
///
/// Downloads still running when `shutdown` is cancelled are aborted.
pub fn create_router(config: &Config, shutdown: CancellationToken) -> Result<Router> {
    let handler = FileDownloader::new(build_downloader(config)?, build_importer(config)?)
        .with_config(DownloadHandlerConfig {
            inserts_enabled: config.inserts_enabled,
            max_body_bytes: config.max_body_bytes,
        })
        .with_shutdown(shutdown);

    if !config.inserts_enabled {
        tracing::warn!("Inserts are disabled, every download request will be refused");
    }

    Ok(download_router(handler).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use clap::Parser;
    use http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn config(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("docfetch").chain(args.iter().copied())).unwrap()
    }

    async fn status_of(router: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_default_router_builds() {
        create_router(&config(&[]), CancellationToken::new()).unwrap();
    }

    #[tokio::test]
    async fn test_route_dispatches() {
        let config = config(&["--inserts-enabled", "false"]);
        let router = create_router(&config, CancellationToken::new()).unwrap();

        let request = Request::post("/download").body(Body::empty()).unwrap();
        let (status, body) = status_of(router.clone(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "inserts are disabled");

        let request = Request::get("/download").body(Body::empty()).unwrap();
        let (status, _) = status_of(router.clone(), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::post("/upload").body(Body::empty()).unwrap();
        let (status, _) = status_of(router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_noop_pipeline_succeeds() {
        let dir = TempDir::new().unwrap();
        let temp_dir = dir.path().to_str().unwrap();
        let router = create_router(
            &config(&["--downloader", "noop", "--temp-dir", temp_dir]),
            CancellationToken::new(),
        )
        .unwrap();

        let request = Request::post("/download")
            .body(Body::from(r#"{"downloadURL":"http://example.com","patientID":"p1"}"#))
            .unwrap();
        let (status, body) = status_of(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"success"}"#);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_directory_importer_pipeline() {
        let temp = TempDir::new().unwrap();
        let import = TempDir::new().unwrap();
        let args = [
            "--downloader",
            "noop",
            "--temp-dir",
            temp.path().to_str().unwrap(),
            "--importer",
            "directory",
            "--import-dir",
            import.path().to_str().unwrap(),
        ];
        let router = create_router(&config(&args), CancellationToken::new()).unwrap();

        let request = Request::post("/download")
            .body(Body::from(
                r#"{"downloadURL":"http://example.com","documentID":"doc-1","categoryID":"cat"}"#,
            ))
            .unwrap();
        let (status, _) = status_of(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(import.path().join("cat").join("doc-1").is_file());
    }
}
