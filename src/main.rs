use anyhow::{Context, Result};
use skytrack::api::{create_app, ApiState};
use skytrack::config::{load_config, SkytrackConfig};
use skytrack::surface::CommandSurface;
use skytrack::tracker::LiveEntityTracker;
use skytrack::transport::{run_event_loop, tracker_router, BroadcastPublisher, TrackerHandle};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skytrack=info".into()),
        )
        .init();

    info!("Skytrack starting...");

    let mut config = match std::env::var("SKYTRACK_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration");
            load_config(&path).with_context(|| format!("Failed to load config from {}", path))?
        }
        Err(_) => SkytrackConfig::default(),
    };
    config.apply_env().context("Invalid configuration")?;

    // Rendering surface: draw commands streamed to map viewers
    let (mut surface, gate) = CommandSurface::new(config.surface.command_capacity);
    surface.initialize(config.map.view());

    let mut tracker = LiveEntityTracker::attach(surface, gate, config.surface.ready_timeout())
        .await
        .context("Rendering surface failed to initialize")?;

    if config.demo.random_planes > 0 {
        tracker
            .scatter(
                &mut rand::thread_rng(),
                config.demo.random_planes,
                config.scatter_area(),
            )
            .context("Failed to place demo planes")?;
    }

    // Single-writer event loop owning the tracker
    let publisher = BroadcastPublisher::new(config.server.event_capacity);
    let (tx, rx) = mpsc::channel(config.server.queue_capacity);
    let router = tracker_router(config.scatter_area(), config.demo.max_scatter);
    tokio::spawn(run_event_loop(
        tracker,
        router,
        Arc::new(publisher.clone()),
        rx,
    ));

    let app = create_app(ApiState {
        tracker: TrackerHandle::new(tx),
        publisher,
    });

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;

    info!(bind = %config.server.bind, "Skytrack listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Skytrack stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
