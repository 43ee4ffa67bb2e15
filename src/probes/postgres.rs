//! Relational database probe (PostgreSQL)

use super::{Database, DatabaseOverview, ProbeError};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, warn};

const VERSION_QUERY: &str = "SELECT version()";
const DATABASES_QUERY: &str = "SELECT datname FROM pg_database WHERE datistemplate = false";
const FLAG_QUERY: &str = "SELECT flag FROM flags WHERE layer = $1::INT4 LIMIT 1";

/// PostgreSQL server reached with the configured credentials
pub struct PostgresDatabase {
    config: tokio_postgres::Config,
}

/// Build the database probe for the configured server
pub fn connect(config: &PostgresConfig) -> Arc<dyn Database> {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.database)
        .user(&config.user)
        .password(&config.password);
    Arc::new(PostgresDatabase { config: pg })
}

/// A single-use session; the driver task ends once the client is dropped
struct Session {
    client: Client,
    driver: JoinHandle<()>,
}

impl Session {
    async fn close(self) {
        drop(self.client);
        if let Err(e) = self.driver.await {
            debug!(error = %e, "PostgreSQL driver task ended abnormally");
        }
    }
}

impl PostgresDatabase {
    async fn open(&self) -> Result<Session, ProbeError> {
        let (client, connection) = self.config.connect(NoTls).await?;
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "PostgreSQL connection error");
            }
        });
        Ok(Session { client, driver })
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    async fn overview(&self) -> Result<DatabaseOverview, ProbeError> {
        let session = self.open().await?;
        let result = async {
            let version: String = session
                .client
                .query_one(VERSION_QUERY, &[])
                .await?
                .try_get(0)?;
            let databases = session
                .client
                .query(DATABASES_QUERY, &[])
                .await?
                .iter()
                .map(|row| row.try_get::<_, String>(0))
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, ProbeError>(DatabaseOverview { version, databases })
        }
        .await;
        session.close().await;
        result
    }

    async fn layer_flag(&self, layer: i32) -> Result<Option<String>, ProbeError> {
        let session = self.open().await?;
        let result = async {
            let flag = match session.client.query_opt(FLAG_QUERY, &[&layer]).await? {
                Some(row) => Some(row.try_get::<_, String>(0)?),
                None => None,
            };
            Ok::<_, ProbeError>(flag)
        }
        .await;
        session.close().await;
        result
    }
}
