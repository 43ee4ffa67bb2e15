//! Layer 2: container engine socket
//!
//! The reward is released only after a live handshake over the socket
//! succeeds in this request.

use serde_json::json;
use tracing::{error, info, warn};

use super::ApiResult;
use crate::config::AppState;
use crate::error::{ErrorKind, HandlerError};
use crate::probes::ProbeError;
use crate::rewards::LAYER2_FLAG;

const CLIENT_HINT: &str = "Layer 2 requires the Docker API client";

/// `GET /docker-info`
pub async fn docker_info(state: &AppState) -> ApiResult {
    let overview = state.probes.containers.overview().await.map_err(|e| {
        error!(error = %e, "Docker error");
        match e {
            ProbeError::Unavailable(reason) => {
                HandlerError::client_missing(ErrorKind::Internal, reason, Some(CLIENT_HINT))
            }
            e => HandlerError::probe(
                ErrorKind::Internal,
                e.to_string(),
                "Docker socket may not be properly mounted or accessible",
            ),
        }
    })?;

    info!(
        containers = overview.containers.len(),
        images = overview.images_count,
        "Docker info accessed"
    );

    Ok(json!({
        "status": "docker_socket_accessible",
        "layer": 2,
        "containers": overview.containers,
        "images_count": overview.images_count,
        "hint": "Docker socket is accessible! You can spawn containers for privilege escalation.",
    }))
}

/// `GET /layer2-flag`
pub async fn flag(state: &AppState) -> ApiResult {
    state.probes.containers.ping().await.map_err(|e| {
        warn!(error = %e, "Layer 2 flag access failed");
        match e {
            ProbeError::Unavailable(reason) => {
                HandlerError::client_missing(ErrorKind::AccessDenied, reason, None)
            }
            e => HandlerError::probe(
                ErrorKind::AccessDenied,
                "Docker socket not accessible",
                "Layer 2 requires container escape via docker socket access",
            )
            .with_details(e),
        }
    })?;

    info!("Layer 2 flag accessed, docker socket verified");
    Ok(json!({
        "status": "layer2_complete",
        "flag": LAYER2_FLAG,
        "message": "You have successfully escaped the container!",
        "hint": "You proved docker socket access by invoking the docker API",
        "next_layer": "Access Redis service on port 6379 and PostgreSQL on port 5432 for Layer 3",
    }))
}
