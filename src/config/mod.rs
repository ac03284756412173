/// Configuration management for the canniflow service
///
/// Handles server binding, document store location, push relay and report export settings.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Document store configuration
    pub database: DatabaseConfig,
    /// Push relay configuration
    pub push: PushConfig,
    /// Report export configuration
    pub export: ExportConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory holding the SQLite document database (default: "data")
    /// Creates: {data_dir}/canniflow.db
    pub data_dir: String,
}

/// Push relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Relay endpoint receiving one POST per notification
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Report export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving cannibalization_report_{caseId}.txt files
    pub report_dir: String,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("CANNIFLOW_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("CANNIFLOW_PORT")
                    .unwrap_or_else(|_| "3004".to_string())
                    .parse()
                    .unwrap_or(3004),
            },
            database: DatabaseConfig {
                data_dir: std::env::var("CANNIFLOW_DATA_DIR")
                    .unwrap_or_else(|_| "data".to_string()),
            },
            push: PushConfig {
                endpoint: std::env::var("CANNIFLOW_PUSH_ENDPOINT")
                    .unwrap_or_else(|_| crate::notify::expo::DEFAULT_PUSH_ENDPOINT.to_string()),
                timeout_secs: std::env::var("CANNIFLOW_PUSH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(10),
            },
            export: ExportConfig {
                report_dir: std::env::var("CANNIFLOW_REPORT_DIR")
                    .unwrap_or_else(|_| "reports".to_string()),
            },
        }
    }
}
