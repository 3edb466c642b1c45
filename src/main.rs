//! capitol-sync - Legislator Import Service
//!
//! On-demand ingest of congress.gov member data into a local SQLite
//! database, triggered over HTTP by an external scheduler.

use anyhow::Result;
use std::path::Path;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use capitol_sync::{build_router, db, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting capitol-sync (Legislator Import)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Build: {} ({})", env!("GIT_HASH"), env!("BUILD_PROFILE"));

    // Configuration is resolved once; a missing API key refuses startup
    let config = Config::load()?;
    info!("Upstream API: {}", config.api_base_url);
    info!("Database: {}", config.database_path);

    let db_pool = db::init_database_pool(Path::new(&config.database_path)).await?;
    info!("Database connection established");

    let bind_address = config.bind_address.clone();
    let state = AppState::new(db_pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    info!("Trigger: http://{}/import/legislators", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
