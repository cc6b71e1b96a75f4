use anyhow::{Context, Result};
use bookinfo::config::{Config, Role};
use bookinfo::{tracing_config, Components};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

fn service_name(role: Role) -> &'static str {
    match role {
        Role::All => "bookinfo",
        Role::ProductPage => "bookinfo-productpage",
        Role::Details => "bookinfo-details",
        Role::Reviews => "bookinfo-reviews",
        Role::Ratings => "bookinfo-ratings",
    }
}

async fn shutdown_signal() -> Result<()> {
    let mut signal_terminate = signal(SignalKind::terminate())?;
    let mut signal_interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = signal_terminate.recv() => tracing::debug!("Received SIGTERM."),
        _ = signal_interrupt.recv() => tracing::debug!("Received SIGINT."),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load env vars
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    let tracer_provider = tracing_config::init_tracing(service_name(config.role))
        .context("Failed to initialise tracing")?;

    info!(role = ?config.role, "Setting up components");
    let shutdown = CancellationToken::new();
    let components = Components::from_config(&config, &shutdown).await?;
    let app = bookinfo::router(config.role, &components);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "Starting webserver");
    let on_signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = shutdown_signal().await {
                tracing::error!(error = %e, "Failed to install signal handlers");
                std::future::pending::<()>().await;
            }
            on_signal.cancel();
        })
        .await?;

    shutdown.cancel();
    components.stopped().await;
    info!("Background tasks stopped");

    if let Some(provider) = tracer_provider {
        info!("Shutting down OpenTelemetry");
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "Failed to flush spans");
        }
    }

    Ok(())
}
