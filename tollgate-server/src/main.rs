use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tollgate::MemoryStore;
use tollgate_server::config::Config;
use tollgate_server::{AppState, app};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from file, environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tollgate={}", config.log_level).parse()?)
                .add_directive(format!("tollgate_server={}", config.log_level).parse()?),
        )
        .init();

    let bucket = config.limiter.bucket;
    let store = MemoryStore::with_capacity(bucket, config.limiter.capacity);
    tracing::info!(
        rate = bucket.refill_rate(),
        burst = bucket.burst_capacity(),
        expires_in_secs = bucket.idle_expiry().as_secs(),
        "Rate limiter initialized"
    );

    let state = AppState::new(Arc::new(store), config.trust_proxy_headers);
    if config.trust_proxy_headers {
        tracing::info!("Identifying clients by X-Forwarded-For / X-Real-IP");
    }

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Tollgate listening on {}", addr);

    axum::serve(
        listener,
        app::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Tollgate shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
