mod config;
mod handlers;
mod integrations;
mod router;

use router::create_router;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::warn!("SIGTERM listener unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

/// Wait for a stop signal, then cancel `shutdown` so in-flight downloads abort
/// while the server drains its connections.
async fn stop_on_signal(shutdown: CancellationToken) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C listener unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let signal = tokio::select! {
        _ = interrupt => "interrupt",
        _ = terminate() => "terminate",
    };

    tracing::info!(signal, "Stopping docfetch");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    color_eyre::install()?;

    let config = config::config();
    tracing::debug!(?config, "Loaded configuration");

    let shutdown = CancellationToken::new();
    let app = create_router(&config, shutdown.clone())?;
    let listener = tokio::net::TcpListener::bind(&config.host).await?;
    tracing::info!("Listening on: {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(stop_on_signal(shutdown))
        .await?;

    Ok(())
}
