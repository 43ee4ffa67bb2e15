// Application state module
// Read-only state shared by every request handler

use std::sync::Arc;

use super::types::Config;
use crate::probes::{self, CacheService, ContainerRuntime, Database};

/// Live or stand-in clients for the three probed dependencies
#[derive(Clone)]
pub struct Probes {
    pub containers: Arc<dyn ContainerRuntime>,
    pub cache: Arc<dyn CacheService>,
    pub database: Arc<dyn Database>,
}

/// Application state
///
/// Built once at startup and never mutated afterwards.
pub struct AppState {
    pub config: Config,
    pub probes: Probes,
}

impl AppState {
    /// Create `AppState` wired to the real container engine, cache and database
    pub fn new(config: &Config) -> Self {
        let probes = Probes {
            containers: probes::docker::connect(&config.docker),
            cache: probes::redis::connect(&config.redis),
            database: probes::postgres::connect(&config.postgres),
        };
        Self::with_probes(config, probes)
    }

    pub fn with_probes(config: &Config, probes: Probes) -> Self {
        Self {
            config: config.clone(),
            probes,
        }
    }
}
