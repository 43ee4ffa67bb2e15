//! Cache service probe (Redis)

use super::{CacheOverview, CacheService, ProbeError, Unavailable};
use crate::config::RedisConfig;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, ConnectionAddr, ConnectionInfo, InfoDict, RedisConnectionInfo};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Redis server authenticated with the configured password
pub struct RedisCache {
    client: Client,
}

/// Build the cache probe for the configured endpoint
pub fn connect(config: &RedisConfig) -> Arc<dyn CacheService> {
    match Client::open(connection_info(config)) {
        Ok(client) => Arc::new(RedisCache { client }),
        Err(e) => {
            warn!(error = %e, "Redis client could not be constructed");
            Arc::new(Unavailable::new("Redis library not available"))
        }
    }
}

fn connection_info(config: &RedisConfig) -> ConnectionInfo {
    let password = (!config.password.is_empty()).then(|| config.password.clone());
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            password,
            ..Default::default()
        },
    }
}

impl RedisCache {
    /// Open a fresh connection; AUTH happens during the handshake
    async fn open(
        &self,
        connect_timeout: Option<Duration>,
    ) -> Result<MultiplexedConnection, ProbeError> {
        let connecting = self.client.get_multiplexed_async_connection();
        let connection = match connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connecting)
                .await
                .map_err(|_| ProbeError::Timeout)??,
            None => connecting.await?,
        };
        Ok(connection)
    }
}

async fn ping(connection: &mut MultiplexedConnection) -> Result<(), ProbeError> {
    let _pong: String = redis::cmd("PING").query_async(connection).await?;
    Ok(())
}

#[async_trait]
impl CacheService for RedisCache {
    async fn ping(&self, connect_timeout: Option<Duration>) -> Result<(), ProbeError> {
        let mut connection = self.open(connect_timeout).await?;
        ping(&mut connection).await
    }

    async fn overview(&self) -> Result<CacheOverview, ProbeError> {
        let mut connection = self.open(None).await?;
        ping(&mut connection).await?;

        let info: InfoDict = redis::cmd("INFO").query_async(&mut connection).await?;
        Ok(CacheOverview {
            version: info
                .get::<String>("redis_version")
                .unwrap_or_else(|| "unknown".to_string()),
            connected_clients: info.get::<i64>("connected_clients").unwrap_or(0),
            used_memory: info
                .get::<String>("used_memory_human")
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}
