//! External dependency probes
//!
//! Each challenge layer proves access to one external service: the container
//! engine socket (layer 2), the cache service and the relational database
//! (layer 3). Handlers only see the traits defined here. The binary wires in the
//! live clients, tests wire in fakes.
//!
//! Every call opens its own connection and closes it before returning. There is
//! no pooling and no retry.

pub mod docker;
pub mod postgres;
pub mod redis;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Failure of a live probe, rendered verbatim into probe responses
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The integration could not be constructed at startup
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("{0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("{0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Timeout connecting to server")]
    Timeout,
}

/// One running container as reported by `/docker-info`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
}

#[derive(Debug, Clone, Default)]
pub struct ContainerOverview {
    pub containers: Vec<ContainerSummary>,
    pub images_count: usize,
}

#[derive(Debug, Clone)]
pub struct CacheOverview {
    pub version: String,
    pub connected_clients: i64,
    pub used_memory: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseOverview {
    pub version: String,
    pub databases: Vec<String>,
}

/// Container engine reachable through a mounted socket
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Handshake used as proof of socket access
    async fn ping(&self) -> Result<(), ProbeError>;

    /// Running containers and image count
    async fn overview(&self) -> Result<ContainerOverview, ProbeError>;
}

/// Password protected cache service
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Authenticate and PING, optionally bounding the connect phase
    async fn ping(&self, connect_timeout: Option<Duration>) -> Result<(), ProbeError>;

    /// Server version, client count and memory usage
    async fn overview(&self) -> Result<CacheOverview, ProbeError>;
}

/// Relational database holding the layer 3 flag table
#[async_trait]
pub trait Database: Send + Sync {
    async fn overview(&self) -> Result<DatabaseOverview, ProbeError>;

    /// Flag stored for `layer`, `None` when the table has no such row
    async fn layer_flag(&self, layer: i32) -> Result<Option<String>, ProbeError>;
}

/// Stand-in installed when a live client cannot be built
///
/// Every call fails with the recorded reason.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> ProbeError {
        ProbeError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl ContainerRuntime for Unavailable {
    async fn ping(&self) -> Result<(), ProbeError> {
        Err(self.error())
    }

    async fn overview(&self) -> Result<ContainerOverview, ProbeError> {
        Err(self.error())
    }
}

#[async_trait]
impl CacheService for Unavailable {
    async fn ping(&self, _connect_timeout: Option<Duration>) -> Result<(), ProbeError> {
        Err(self.error())
    }

    async fn overview(&self) -> Result<CacheOverview, ProbeError> {
        Err(self.error())
    }
}

#[async_trait]
impl Database for Unavailable {
    async fn overview(&self) -> Result<DatabaseOverview, ProbeError> {
        Err(self.error())
    }

    async fn layer_flag(&self, _layer: i32) -> Result<Option<String>, ProbeError> {
        Err(self.error())
    }
}
