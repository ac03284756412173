/// Server setup and initialization
///
/// Wires together all components: document store, push gateway, report exporter,
/// workflow engine and HTTP routes. Provides the application factory functions
/// for creating the Axum app.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    notify::ExpoPushGateway,
    store::SqliteDocumentStore,
    workflow::{FileReportExporter, WorkflowEngine},
};
use anyhow::Result;
use axum::{routing::get, Router};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;

/// Build the router around an already-assembled engine
pub fn create_router(engine: Arc<WorkflowEngine>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/healthz", get(health_check))
        // Users, cases, notifications and reports
        .merge(create_api_routes().with_state(AppState { engine }))
}

/// Create the main Axum application with all routes
///
/// Opens the SQLite document store, builds the push relay client and the
/// report exporter, then wires them into the workflow engine.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("🏗️ Opening document store in {}", config.database.data_dir);
    let store = SqliteDocumentStore::connect(&config.database.data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open document store: {}", e))?;

    tracing::info!("📡 Push relay endpoint: {}", config.push.endpoint);
    let gateway = ExpoPushGateway::new(
        config.push.endpoint.clone(),
        Duration::from_secs(config.push.timeout_secs),
    )?;

    tracing::info!("📁 Reports exported to {}", config.export.report_dir);
    let exporter = FileReportExporter::new(&config.export.report_dir);

    tracing::info!("🚀 Initializing workflow engine");
    let engine = Arc::new(WorkflowEngine::new(
        Arc::new(store),
        Arc::new(gateway),
        Arc::new(exporter),
    ));

    let app = create_router(engine);
    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting canniflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
