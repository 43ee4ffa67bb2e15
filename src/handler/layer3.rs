//! Layer 3: cache service and relational database
//!
//! The cache flag is a compiled-in constant released after an authenticated
//! PING. The database flag is whatever the `flags` table holds.

use std::time::Duration;

use serde_json::json;
use tracing::{error, info, warn};

use super::ApiResult;
use crate::config::AppState;
use crate::error::{ErrorKind, HandlerError};
use crate::probes::ProbeError;
use crate::rewards::{DATABASE_FLAG_LAYER, LAYER3_FLAG};

const CREDENTIALS_HINT_REDIS: &str =
    "Redis may not be accessible. Try discovering credentials via Layer 1 LFI";
const CREDENTIALS_HINT_POSTGRES: &str =
    "PostgreSQL may not be accessible. Try discovering credentials via Layer 1 LFI";
const CLIENT_HINT_REDIS: &str = "Layer 3 requires the Redis client";
const CLIENT_HINT_POSTGRES: &str = "Layer 3 requires the PostgreSQL client";

/// `GET /redis-info`
pub async fn redis_info(state: &AppState) -> ApiResult {
    let overview = state.probes.cache.overview().await.map_err(|e| {
        error!(error = %e, "Redis info error");
        match e {
            ProbeError::Unavailable(reason) => {
                HandlerError::client_missing(ErrorKind::Internal, reason, Some(CLIENT_HINT_REDIS))
            }
            e => HandlerError::probe(ErrorKind::Internal, e.to_string(), CREDENTIALS_HINT_REDIS),
        }
    })?;

    let redis = &state.config.redis;
    Ok(json!({
        "status": "redis_accessible",
        "layer": 3,
        "host": redis.host,
        "port": redis.port,
        "version": overview.version,
        "connected_clients": overview.connected_clients,
        "used_memory": overview.used_memory,
        "hint": "Redis is accessible! Try accessing /layer3-flag endpoint",
        "hint2": "The password may be discoverable via Layer 1 LFI exploitation",
    }))
}

/// `GET /layer3-flag`
pub async fn redis_flag(state: &AppState) -> ApiResult {
    let timeout = Duration::from_secs(state.config.redis.connect_timeout_secs);
    state.probes.cache.ping(Some(timeout)).await.map_err(|e| {
        warn!(error = %e, "Layer 3 flag access failed");
        match e {
            ProbeError::Unavailable(reason) => {
                HandlerError::client_missing(ErrorKind::AccessDenied, reason, None)
            }
            e => HandlerError::probe(
                ErrorKind::AccessDenied,
                "Redis not accessible",
                "Layer 3 requires access to Redis service with correct credentials",
            )
            .with_details(e),
        }
    })?;

    info!("Layer 3 Redis flag accessed, Redis verified");
    Ok(json!({
        "status": "layer3_redis_complete",
        "flag": LAYER3_FLAG,
        "message": "You have successfully breached Redis!",
        "hint": "You proved Redis access by authenticating with correct credentials",
        "next_layer": "Access PostgreSQL on port 5432 for database exploitation",
    }))
}

/// `GET /db-info`
pub async fn db_info(state: &AppState) -> ApiResult {
    let overview = state.probes.database.overview().await.map_err(|e| {
        error!(error = %e, "PostgreSQL info error");
        match e {
            ProbeError::Unavailable(reason) => HandlerError::client_missing(
                ErrorKind::Internal,
                reason,
                Some(CLIENT_HINT_POSTGRES),
            ),
            e => HandlerError::probe(ErrorKind::Internal, e.to_string(), CREDENTIALS_HINT_POSTGRES),
        }
    })?;

    let pg = &state.config.postgres;
    Ok(json!({
        "status": "postgresql_accessible",
        "layer": 3,
        "host": pg.host,
        "port": pg.port,
        "database": pg.database,
        "user": pg.user,
        "version": overview.version,
        "databases": overview.databases,
        "hint": "PostgreSQL is accessible! Try accessing /layer3-db-flag endpoint",
        "hint2": "Check if there are any exploitable SQL injection vectors",
    }))
}

/// `GET /layer3-db-flag`
///
/// Failures do not echo the underlying error.
pub async fn db_flag(state: &AppState) -> ApiResult {
    let row = state
        .probes
        .database
        .layer_flag(DATABASE_FLAG_LAYER)
        .await
        .map_err(|e| {
            warn!(error = %e, "Layer 3 database flag access failed");
            match e {
                ProbeError::Unavailable(reason) => {
                    HandlerError::client_missing(ErrorKind::AccessDenied, reason, None)
                }
                _ => HandlerError::probe(
                    ErrorKind::AccessDenied,
                    "PostgreSQL not accessible",
                    "Layer 3 requires access to PostgreSQL with correct credentials",
                ),
            }
        })?;

    let Some(flag) = row else {
        return Err(HandlerError::Probe {
            kind: ErrorKind::NotFound,
            message: "Layer 3 flag not found in database".to_string(),
            hint: None,
            details: None,
        });
    };

    info!("Layer 3 PostgreSQL flag accessed");
    Ok(json!({
        "status": "layer3_database_complete",
        "flag": flag,
        "message": "You have successfully breached the PostgreSQL database!",
        "next_layer": "Layer 4: Kubernetes RBAC Exploitation (requires K8s deployment)",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::{probes, state_in};
    use crate::probes::Unavailable;
    use hyper::StatusCode;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_redis_info() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(true, None));
        let info = redis_info(&state).await.unwrap();
        assert_eq!(info["status"], "redis_accessible");
        assert_eq!(info["host"], "chakravyuha-redis");
        assert_eq!(info["port"], 6379);
        assert_eq!(info["version"], "7.2.4");
        assert_eq!(info["connected_clients"], 2);

        let state = state_in(tmp.path(), probes(false, None));
        let err = redis_info(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_json()["hint"], CREDENTIALS_HINT_REDIS);
    }

    #[tokio::test]
    async fn test_redis_flag_requires_ping() {
        let tmp = TempDir::new().unwrap();

        let state = state_in(tmp.path(), probes(true, None));
        assert_eq!(redis_flag(&state).await.unwrap()["flag"], LAYER3_FLAG);

        let state = state_in(tmp.path(), probes(false, None));
        let err = redis_flag(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        let body = err.to_json();
        assert!(body.get("flag").is_none());
        assert_eq!(body["message"], "Redis not accessible");
        assert!(body.get("error_details").is_some());
    }

    #[tokio::test]
    async fn test_db_info() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(true, None));
        let info = db_info(&state).await.unwrap();
        assert_eq!(info["status"], "postgresql_accessible");
        assert_eq!(info["database"], "ctf_db");
        assert_eq!(info["user"], "ctf_user");
        assert_eq!(info["databases"], json!(["postgres", "ctf_db"]));
    }

    #[tokio::test]
    async fn test_db_flag_reads_row() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(true, Some("CTF{ROW_VALUE_FROM_TABLE}")));
        let body = db_flag(&state).await.unwrap();
        assert_eq!(body["flag"], "CTF{ROW_VALUE_FROM_TABLE}");
        assert_eq!(body["status"], "layer3_database_complete");
    }

    #[tokio::test]
    async fn test_db_flag_missing_row() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(true, None));
        let err = db_flag(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_json(),
            json!({ "status": "error", "message": "Layer 3 flag not found in database" })
        );
    }

    #[tokio::test]
    async fn test_db_flag_unreachable_hides_error() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(false, Some("CTF{X}")));
        let err = db_flag(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        let body = err.to_json();
        assert!(body.get("flag").is_none());
        assert!(body.get("error_details").is_none());
        assert_eq!(body["message"], "PostgreSQL not accessible");
    }

    #[tokio::test]
    async fn test_missing_clients() {
        let tmp = TempDir::new().unwrap();
        let mut stand_in = probes(true, Some("CTF{X}"));
        stand_in.cache = Arc::new(Unavailable::new("Redis library not available"));
        stand_in.database = Arc::new(Unavailable::new("PostgreSQL library not available"));
        let state = state_in(tmp.path(), stand_in);

        let err = redis_info(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_json()["message"], "Redis library not available");
        assert_eq!(err.to_json()["hint"], CLIENT_HINT_REDIS);

        let err = redis_flag(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_json(),
            json!({ "status": "error", "message": "Redis library not available" })
        );

        let err = db_info(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_json()["hint"], CLIENT_HINT_POSTGRES);

        let err = db_flag(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_json(),
            json!({ "status": "error", "message": "PostgreSQL library not available" })
        );
    }
}
