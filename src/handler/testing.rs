// Test fixtures shared by the handler tests
// Fake probes and an application state rooted in a temporary directory

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response};
use serde_json::Value;

use crate::config::{AppState, Config, Probes};
use crate::probes::{
    CacheOverview, CacheService, ContainerOverview, ContainerRuntime, ContainerSummary,
    Database, DatabaseOverview, ProbeError,
};

/// Connection failure reported by unreachable fakes
pub fn refused() -> ProbeError {
    let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
    ProbeError::Redis(io.into())
}

pub struct FakeContainers {
    pub reachable: bool,
}

#[async_trait]
impl ContainerRuntime for FakeContainers {
    async fn ping(&self) -> Result<(), ProbeError> {
        if self.reachable { Ok(()) } else { Err(refused()) }
    }

    async fn overview(&self) -> Result<ContainerOverview, ProbeError> {
        self.ping().await?;
        Ok(ContainerOverview {
            containers: vec![ContainerSummary {
                id: "3f2a9c1b7d4e".to_string(),
                name: "chakravyuha-web".to_string(),
                image: "chakravyuha:latest".to_string(),
                status: "running".to_string(),
            }],
            images_count: 4,
        })
    }
}

pub struct FakeCache {
    pub reachable: bool,
}

#[async_trait]
impl CacheService for FakeCache {
    async fn ping(&self, _connect_timeout: Option<Duration>) -> Result<(), ProbeError> {
        if self.reachable { Ok(()) } else { Err(refused()) }
    }

    async fn overview(&self) -> Result<CacheOverview, ProbeError> {
        self.ping(None).await?;
        Ok(CacheOverview {
            version: "7.2.4".to_string(),
            connected_clients: 2,
            used_memory: "1.02M".to_string(),
        })
    }
}

pub struct FakeDatabase {
    pub reachable: bool,
    pub flag: Option<String>,
}

#[async_trait]
impl Database for FakeDatabase {
    async fn overview(&self) -> Result<DatabaseOverview, ProbeError> {
        if !self.reachable {
            return Err(refused());
        }
        Ok(DatabaseOverview {
            version: "PostgreSQL 16.2".to_string(),
            databases: vec!["postgres".to_string(), "ctf_db".to_string()],
        })
    }

    async fn layer_flag(&self, _layer: i32) -> Result<Option<String>, ProbeError> {
        if self.reachable { Ok(self.flag.clone()) } else { Err(refused()) }
    }
}

/// Probes that all succeed or all fail
pub fn probes(reachable: bool, flag: Option<&str>) -> Probes {
    Probes {
        containers: Arc::new(FakeContainers { reachable }),
        cache: Arc::new(FakeCache { reachable }),
        database: Arc::new(FakeDatabase {
            reachable,
            flag: flag.map(ToString::to_string),
        }),
    }
}

/// State whose documents and uploads live under `root/app`
pub fn state_in(root: &Path, probes: Probes) -> Arc<AppState> {
    let mut config =
        Config::load_with_env("/nonexistent/chakravyuha-test-config", HashMap::new()).unwrap();
    config.paths.documents_dir = root.join("app/documents");
    config.paths.upload_dir = root.join("app/uploads");
    config.paths.challenge_dir = root.join("challenges");
    config.ensure_directories().unwrap();
    Arc::new(AppState::with_probes(&config, probes))
}

pub fn get(uri: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .uri(uri)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response<Full<Bytes>>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// `POST /upload` with one multipart `file` part
pub fn multipart_request<T: From<Bytes>>(filename: Option<&str>, content: &str) -> Request<T> {
    const BOUNDARY: &str = "----chakravyuha-boundary";
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"file\"; filename=\"{name}\""),
        None => "form-data; name=\"file\"".to_string(),
    };
    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/plain\r\n\r\n{content}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header("Content-Type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(T::from(Bytes::from(body)))
        .unwrap()
}
