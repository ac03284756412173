/// Canniflow: aircraft part cannibalization approval workflow
///
/// Main entry point for the canniflow server. Initializes configuration and starts
/// the HTTP server with the approval pipeline endpoints.

use canniflow::{config::Config, server::start_server};

/// Application entry point
///
/// The server provides:
/// - User sign-up and sign-in at /api/users and /api/sessions
/// - Case transitions at /api/cases/*
/// - Role inboxes at /api/notifications and archived reports at /api/reports
/// - Health check at /healthz
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (defaults to 0.0.0.0:3004 and data/canniflow.db)
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
