// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub paths: PathsConfig,
    pub docker: DockerConfig,
    pub redis: RedisConfig,
    pub postgres: PostgresConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Name reported by `/health`
    pub service_name: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Log file path (optional, stdout only if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    /// Upper bound for a whole connection, in seconds
    pub request_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
    /// Longest upload filename accepted, in characters
    pub max_filename_len: usize,
}

/// Filesystem locations used by the layer 1 handlers
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub documents_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub challenge_dir: PathBuf,
    /// File served by `/source` in place of the built-in listing
    pub source_file: Option<PathBuf>,
}

/// Container engine socket
#[derive(Debug, Deserialize, Clone)]
pub struct DockerConfig {
    pub socket_path: String,
}

/// Cache service connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: String,
    /// Connect timeout applied by the layer 3 flag check
    pub connect_timeout_secs: u64,
}

/// Relational database connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}
