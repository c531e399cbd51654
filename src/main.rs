// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::application::dashboard_store::DashboardStore;
use crate::application::recompute_service::{RecomputeService, RecomputeSettings};
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::json_state_repository::JsonStateRepository;
use crate::infrastructure::open_meteo_source::OpenMeteoSource;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Restore persisted state (infrastructure + application layers)
    let repository = Arc::new(JsonStateRepository::new(&config.state.path));
    tracing::info!("Dashboard state file: {}", repository.path().display());
    let store = Arc::new(DashboardStore::open(repository).await);

    // Weather source and recompute pipeline
    let source = Arc::new(OpenMeteoSource::new(
        config.weather.url_template.clone(),
        config.weather.timeout(),
    )?);
    let recompute = RecomputeService::new(
        store.clone(),
        source,
        RecomputeSettings::from(&config.recompute),
    );
    let _watcher = recompute.spawn_watcher();

    // Bring restored polygons up to date for the current hour
    if !store.polygons().is_empty() {
        recompute.trigger();
    }

    // Build router (presentation layer)
    let state = Arc::new(AppState {
        store: store.clone(),
        recompute,
    });
    let router = build_router(state);

    // Start server
    let addr = config.listen_addr()?;
    tracing::info!("Starting region-telemetry service on {}", addr);

    let serve = axum::serve(tokio::net::TcpListener::bind(addr).await?, router);
    tokio::select! {
        result = serve => { result?; },
        _ = tokio::signal::ctrl_c() => { tracing::info!("Shutdown signal received"); }
    }

    // Let the last queued snapshot reach disk
    store.flush().await;

    Ok(())
}
