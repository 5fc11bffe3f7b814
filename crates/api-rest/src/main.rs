//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the course widget REST API on its own.
//!
//! ## Intended use
//! Useful for development and debugging when you only want the REST server
//! (with OpenAPI/Swagger UI). The workspace's main `widget-run` binary is the
//! deployment entry point.

use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use widget_core::{
    config::{
        collection_from_env_value, DEFAULT_COURSES_COLLECTION, DEFAULT_DATASETS_COLLECTION,
        DEFAULT_DATA_DIR,
    },
    CoreConfig, JsonFileStore, StatsFieldConfig,
};

/// Main entry point for the standalone course widget REST API server.
///
/// # Environment Variables
/// - `WIDGET_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `WIDGET_DATA_DIR`: Directory holding the collection files (default: "/course_data")
/// - `WIDGET_COURSES_COLLECTION`: Courses collection name (default: "courses")
/// - `WIDGET_DATASETS_COLLECTION`: Datasets collection name (default: "datasets")
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the data directory or a collection file cannot be loaded, or
/// - the server address cannot be bound or the HTTP server fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("widget_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("WIDGET_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting course widget REST API on {}", addr);

    let data_dir = std::env::var("WIDGET_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let data_path = Path::new(&data_dir);
    if !data_path.exists() {
        anyhow::bail!("Data directory does not exist: {}", data_path.display());
    }

    let cfg = Arc::new(CoreConfig::new(
        data_path.to_path_buf(),
        collection_from_env_value(
            std::env::var("WIDGET_COURSES_COLLECTION").ok(),
            DEFAULT_COURSES_COLLECTION,
        ),
        collection_from_env_value(
            std::env::var("WIDGET_DATASETS_COLLECTION").ok(),
            DEFAULT_DATASETS_COLLECTION,
        ),
        StatsFieldConfig::default(),
    )?);

    let store = Arc::new(JsonFileStore::load(
        cfg.data_dir(),
        &[cfg.courses_collection(), cfg.datasets_collection()],
    )?);

    let app = router(AppState { cfg, store });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
