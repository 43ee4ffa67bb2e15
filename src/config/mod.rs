// Configuration module entry point
// Builds the immutable configuration and the shared application state

mod state;
mod types;

use std::collections::HashMap;
use std::net::SocketAddr;

// Re-export public types
pub use state::{AppState, Probes};
pub use types::{Config, DockerConfig, LoggingConfig, PostgresConfig, RedisConfig};

/// Default config file name (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "chakravyuha";

/// Service variables of the challenge deployment and the keys they override
const SERVICE_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("REDIS_PASSWORD", "redis.password"),
    ("POSTGRES_HOST", "postgres.host"),
    ("POSTGRES_PORT", "postgres.port"),
    ("POSTGRES_DB", "postgres.database"),
    ("POSTGRES_USER", "postgres.user"),
    ("POSTGRES_PASSWORD", "postgres.password"),
];

impl Config {
    /// Load configuration from the given file path (without extension) and the
    /// process environment
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_with_env(config_path, std::env::vars().collect())
    }

    /// Load configuration against an explicit environment snapshot
    pub fn load_with_env(
        config_path: &str,
        env: HashMap<String, String>,
    ) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.service_name", "chakravyuha-layer1")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.request_timeout", 60)?
            .set_default("http.server_name", "Chakravyuha/1.0")?
            .set_default("http.max_body_size", 16_777_216)? // 16MB
            .set_default("http.max_filename_len", 255)?
            .set_default("paths.documents_dir", "documents")?
            .set_default("paths.upload_dir", "uploads")?
            .set_default("paths.challenge_dir", "../challenges")?
            .set_default("docker.socket_path", "/var/run/docker.sock")?
            .set_default("redis.host", "chakravyuha-redis")?
            .set_default("redis.port", 6379)?
            .set_default("redis.password", "ctf_redis_pass_123")?
            .set_default("redis.connect_timeout_secs", 5)?
            .set_default("postgres.host", "chakravyuha-db")?
            .set_default("postgres.port", 5432)?
            .set_default("postgres.database", "ctf_db")?
            .set_default("postgres.user", "ctf_user")?
            .set_default("postgres.password", "ctf_db_pass_456")?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("CTF")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env.clone())),
            );

        for (var, key) in SERVICE_ENV_OVERRIDES {
            builder = builder.set_override_option(*key, env.get(*var).cloned())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Create the documents, upload and challenge directories if missing
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [
            &self.paths.documents_dir,
            &self.paths.upload_dir,
            &self.paths.challenge_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
