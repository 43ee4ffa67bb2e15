//! Welcome page, health check, reconnaissance and source disclosure

use std::collections::BTreeMap;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{pages, ApiResult, PageResult};
use crate::config::AppState;
use crate::error::HandlerError;
use crate::http::response::build_html_response;
use crate::rewards::LAYER2_FLAG;

/// Environment variable names containing any of these are echoed by `/system-info`
const ENV_HINT_MARKERS: [&str; 3] = ["LAYER", "CTF", "FLAG"];

const CAPABILITIES: &str = "SYS_PTRACE, SYS_ADMIN";

/// Listing served by `/source` unless `paths.source_file` is set
const BUILT_IN_SOURCE: [(&str, &str); 3] = [
    ("src/config/mod.rs", include_str!("../config/mod.rs")),
    ("src/handler/router.rs", include_str!("router.rs")),
    ("src/handler/documents.rs", include_str!("documents.rs")),
];

const KERNEL_HOSTNAME: &str = "/proc/sys/kernel/hostname";
const ETC_HOSTNAME: &str = "/etc/hostname";

/// `GET /`
pub fn index() -> Response<Full<Bytes>> {
    build_html_response(StatusCode::OK, pages::index())
}

/// `GET /health`, no dependency checks
pub fn health(state: &AppState) -> Value {
    json!({
        "status": "healthy",
        "service": state.config.server.service_name,
    })
}

/// `GET /system-info`
pub async fn system_info(state: &AppState) -> ApiResult {
    let hostname = read_hostname().await.map_err(|e| {
        error!(error = %e, "System info error");
        HandlerError::Internal(e.to_string())
    })?;

    let docker_accessible = state.probes.containers.ping().await.is_ok();
    info!(docker_accessible, "System info accessed");

    Ok(json!({
        "hostname": hostname,
        "docker_socket_accessible": docker_accessible,
        "layer2_flag_available": !LAYER2_FLAG.is_empty(),
        "environment_hints": environment_hints(std::env::vars_os()),
        "capabilities": CAPABILITIES,
        "hint": "Check /docker-info and /layer2-flag endpoints for more information",
    }))
}

/// Kernel node name, as `uname -n` reports it
async fn read_hostname() -> std::io::Result<String> {
    let raw = match tokio::fs::read_to_string(KERNEL_HOSTNAME).await {
        Ok(raw) => raw,
        Err(_) => tokio::fs::read_to_string(ETC_HOSTNAME).await?,
    };
    Ok(raw.trim().to_string())
}

/// Variables whose name mentions a layer, the challenge or a flag
///
/// Entries that are not valid unicode are skipped.
fn environment_hints<I>(vars: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (std::ffi::OsString, std::ffi::OsString)>,
{
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .filter(|(k, _)| ENV_HINT_MARKERS.iter().any(|m| k.contains(m)))
        .collect()
}

/// `GET /source`
pub async fn source(state: &AppState) -> PageResult {
    let content = match &state.config.paths.source_file {
        Some(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "Cannot read source");
            HandlerError::Internal("Cannot read source".to_string())
        })?,
        None => built_in_source(),
    };
    Ok(build_html_response(StatusCode::OK, pages::source(&content)))
}

fn built_in_source() -> String {
    BUILT_IN_SOURCE
        .iter()
        .map(|(name, text)| format!("// ---- {name} ----\n\n{text}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::{body_bytes, probes, state_in};
    use std::ffi::OsString;
    use tempfile::TempDir;

    #[test]
    fn test_health_body() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(false, None));
        assert_eq!(
            health(&state),
            json!({ "status": "healthy", "service": "chakravyuha-layer1" })
        );
    }

    #[test]
    fn test_environment_hints() {
        let vars = [
            ("CTF_SERVER__PORT", "5000"),
            ("LAYER", "1"),
            ("REDIS_PASSWORD", "secret"),
            ("PATH", "/usr/bin"),
            ("FEATURE_FLAGS", "on"),
        ]
        .map(|(k, v)| (OsString::from(k), OsString::from(v)));

        let hints = environment_hints(vars);
        assert_eq!(hints.len(), 3);
        assert_eq!(hints["CTF_SERVER__PORT"], "5000");
        assert!(hints.contains_key("FEATURE_FLAGS"));
        assert!(!hints.contains_key("REDIS_PASSWORD"));
    }

    #[tokio::test]
    async fn test_system_info_reports_live_ping() {
        let tmp = TempDir::new().unwrap();

        let state = state_in(tmp.path(), probes(true, None));
        let info = system_info(&state).await.unwrap();
        assert_eq!(info["docker_socket_accessible"], true);
        assert_eq!(info["layer2_flag_available"], true);
        assert_eq!(info["capabilities"], CAPABILITIES);
        assert!(info.get("flag").is_none());

        let state = state_in(tmp.path(), probes(false, None));
        let info = system_info(&state).await.unwrap();
        assert_eq!(info["docker_socket_accessible"], false);
    }

    #[tokio::test]
    async fn test_source_page_built_in() {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(false, None));
        assert!(state.config.paths.source_file.is_none());

        let html = body_bytes(source(&state).await.unwrap()).await;
        let html = String::from_utf8_lossy(&html);
        assert!(html.contains("src/config/mod.rs"));
        assert!(html.contains("ctf_redis_pass_123"));
        assert!(html.contains("ctf_db_pass_456"));
        assert!(html.contains("pub async fn handle_request"));
    }

    #[tokio::test]
    async fn test_source_page_override() {
        let tmp = TempDir::new().unwrap();
        let base = state_in(tmp.path(), probes(false, None));
        let mut config = base.config.clone();
        let path = tmp.path().join("router.rs");
        config.paths.source_file = Some(path.clone());
        let state = AppState::with_probes(&config, base.probes.clone());

        let err = source(&state).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Cannot read source");

        std::fs::write(&path, "if a < b {}").unwrap();
        let html = body_bytes(source(&state).await.unwrap()).await;
        assert!(String::from_utf8_lossy(&html).contains("if a &lt; b {}"));
    }
}
