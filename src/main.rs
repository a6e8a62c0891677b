//! Main entry point for the Gen Task Gateway

use gen_task_gateway::{api, config::Settings, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "pretty" {
        registry.with(fmt::layer().pretty()).init();
    } else {
        registry.with(fmt::layer().json()).init();
    }

    info!("Starting Gen Task Gateway");
    info!(
        "Loaded configuration: server={}:{}",
        settings.server.host, settings.server.port
    );

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let state = AppState::from_settings(settings)?;
    if !state.credential.is_configured() {
        warn!(
            env = %state.settings.upstream.api_key_env,
            "No upstream API key configured; generation and relay calls will fail"
        );
    }

    let policy = state.pipeline.policy();
    info!(
        model = %state.settings.upstream.image_model,
        poll_interval_ms = policy.interval.as_millis() as u64,
        max_polls = policy.max_polls,
        budget_secs = policy.budget().as_secs(),
        relays = ?state.relays.names(),
        "Gateway ready"
    );

    let app = api::routes::create_router(Arc::new(state));

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
