//! Container engine probe over the Docker API socket

use super::{ContainerOverview, ContainerRuntime, ContainerSummary, ProbeError, Unavailable};
use crate::config::DockerConfig;
use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::image::ListImagesOptions;
use bollard::models::ContainerSummary as EngineContainer;
use bollard::Docker;
use std::sync::Arc;
use tracing::{debug, warn};

/// Request timeout handed to the Docker client, in seconds
const CLIENT_TIMEOUT_SECS: u64 = 120;

/// Docker engine reached through a unix socket
pub struct DockerEngine {
    socket_path: String,
}

/// Build the container probe for the configured socket
pub fn connect(config: &DockerConfig) -> Arc<dyn ContainerRuntime> {
    if config.socket_path.is_empty() {
        warn!("Docker socket path not configured");
        return Arc::new(Unavailable::new("Docker library not available"));
    }
    Arc::new(DockerEngine {
        socket_path: config.socket_path.clone(),
    })
}

impl DockerEngine {
    fn client(&self) -> Result<Docker, ProbeError> {
        debug!(socket = %self.socket_path, "Opening Docker socket");
        Ok(Docker::connect_with_unix(
            &self.socket_path,
            CLIENT_TIMEOUT_SECS,
            bollard::API_DEFAULT_VERSION,
        )?)
    }
}

#[async_trait]
impl ContainerRuntime for DockerEngine {
    async fn ping(&self) -> Result<(), ProbeError> {
        self.client()?.ping().await?;
        Ok(())
    }

    async fn overview(&self) -> Result<ContainerOverview, ProbeError> {
        let docker = self.client()?;

        // Running containers only, like `docker ps`
        let containers = docker
            .list_containers(Some(ListContainersOptions::<String>::default()))
            .await?;
        let images = docker
            .list_images(Some(ListImagesOptions::<String>::default()))
            .await?;

        Ok(ContainerOverview {
            containers: containers.iter().map(summarize).collect(),
            images_count: images.len(),
        })
    }
}

/// Reduce an engine container record to the fields shown to the player
fn summarize(container: &EngineContainer) -> ContainerSummary {
    let id = container
        .id
        .as_deref()
        .map(|id| id.chars().take(12).collect())
        .unwrap_or_default();
    let name = container
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_default();
    // Untagged images are reported by digest
    let image = match container.image.as_deref() {
        Some(image) if !image.is_empty() && !image.starts_with("sha256:") => image.to_string(),
        _ => "unknown".to_string(),
    };
    let status = container.state.clone().unwrap_or_else(|| "unknown".to_string());

    ContainerSummary {
        id,
        name,
        image,
        status,
    }
}
