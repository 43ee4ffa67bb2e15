//! Document library: listing, viewer and the JSON read API
//!
//! The viewer and the read API join the requested name onto the documents
//! directory without checking that the result stays inside it. Reading files
//! elsewhere on the host through `../` or an absolute name is the layer 1
//! challenge.

use std::io;
use std::path::{Component, Path, PathBuf};

use hyper::body::Bytes;
use hyper::header::{IF_NONE_MATCH, RANGE};
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use tracing::{error, warn};

use super::{header_str, pages, ApiResult, PageResult};
use crate::config::AppState;
use crate::error::HandlerError;
use crate::http::conditional::{etag_for, not_modified, resolve_range, RangeOutcome};
use crate::http::mime::content_type_for;
use crate::http::query::query_param;
use crate::http::response::{
    build_304_response, build_416_response, build_file_response, build_html_response,
    build_partial_response,
};

/// `GET /documents`
pub async fn list(state: &AppState) -> PageResult {
    let names = match file_names(&state.config.paths.documents_dir).await {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            error!(error = %e, "Error listing documents");
            return Err(HandlerError::Internal("Error listing documents".to_string()));
        }
    };
    Ok(build_html_response(StatusCode::OK, pages::documents(&names)))
}

/// Regular files directly inside `dir`, sorted by name
async fn file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        // Follows symlinks
        let is_file = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_file());
        if is_file {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Character filter applied by the viewer
///
/// Only restricts the alphabet. `/` and `.` are allowed, so traversal passes.
fn is_permitted_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '/' | '-'))
}

/// `GET /view?file=NAME`
pub async fn view(req: &Request<Bytes>, state: &AppState) -> PageResult {
    let name = query_param(req.uri().query(), "file")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| HandlerError::InvalidInput("No file specified".to_string()))?;

    if !is_permitted_name(&name) {
        return Err(HandlerError::InvalidInput("Invalid filename".to_string()));
    }

    let path = state.config.paths.documents_dir.join(&name);
    let resolved = match tokio::task::spawn_blocking(move || resolve_path(&path)).await {
        Ok(Ok(resolved)) => resolved,
        Ok(Err(e)) => return Err(access_denied(Path::new(&name), &e)),
        Err(e) => return Err(HandlerError::Internal(e.to_string())),
    };

    let metadata = match tokio::fs::metadata(&resolved).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(HandlerError::NotFound("Page not found".to_string()));
        }
        Err(e) => return Err(access_denied(&resolved, &e)),
    };
    if metadata.is_dir() {
        return Err(HandlerError::Forbidden("Forbidden".to_string()));
    }

    warn!(path = %resolved.display(), "Reading file through the document viewer");
    let data = Bytes::from(
        tokio::fs::read(&resolved)
            .await
            .map_err(|e| access_denied(&resolved, &e))?,
    );

    let etag = etag_for(&data);
    if not_modified(header_str(req.headers(), IF_NONE_MATCH), &etag) {
        return Ok(build_304_response(&etag));
    }

    let content_type = content_type_for(&resolved);
    Ok(match resolve_range(header_str(req.headers(), RANGE), data.len()) {
        RangeOutcome::Full => build_file_response(data, content_type, &etag),
        RangeOutcome::Partial(span) => build_partial_response(&data, span, content_type, &etag),
        RangeOutcome::Unsatisfiable => build_416_response(data.len()),
    })
}

/// Symlink expansions followed before the rest of a path is taken literally
const MAX_SYMLINK_HOPS: usize = 40;

/// Absolute form of `path` with `..` and symlinks resolved
///
/// Components that do not exist are kept as written, and `..` removes the
/// previous component by name. `missing/../x` and `file.txt/../x` both become
/// `x`.
fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = std::env::current_dir()?;
    let mut hops = 0;
    resolve_into(&mut resolved, path, &mut hops);
    Ok(resolved)
}

fn resolve_into(resolved: &mut PathBuf, path: &Path, hops: &mut usize) {
    for component in path.components() {
        match component {
            // Absolute components replace what was built so far
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            Component::Normal(name) => {
                resolved.push(name);
                if *hops >= MAX_SYMLINK_HOPS {
                    continue;
                }
                if let Ok(target) = std::fs::read_link(&*resolved) {
                    *hops += 1;
                    resolved.pop();
                    resolve_into(resolved, &target, hops);
                }
            }
        }
    }
}

fn access_denied(path: &Path, e: &io::Error) -> HandlerError {
    error!(path = %path.display(), error = %e, "File access error");
    HandlerError::Forbidden("Forbidden".to_string())
}

/// `POST /api/read` with `{"filename": NAME}`
///
/// No character filter and no canonicalization.
pub async fn api_read(body: &Bytes, state: &AppState) -> ApiResult {
    let filename = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("filename")?.as_str().map(ToString::to_string))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| HandlerError::InvalidInput("No filename provided".to_string()))?;

    let path = state.config.paths.documents_dir.join(&filename);
    warn!(path = %path.display(), "Reading file through the read API");

    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(json!({ "content": content, "filename": filename })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(HandlerError::NotFound("File not found".to_string()))
        }
        Err(e) => Err(HandlerError::Internal(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::testing::{body_bytes, probes, state_in};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, std::sync::Arc<AppState>) {
        let tmp = TempDir::new().unwrap();
        let state = state_in(tmp.path(), probes(false, None));
        std::fs::write(state.config.paths.documents_dir.join("welcome.txt"), "Welcome, warrior.\n")
            .unwrap();
        std::fs::write(state.config.paths.documents_dir.join("manual.pdf"), b"%PDF-1.4").unwrap();
        std::fs::create_dir(state.config.paths.documents_dir.join("archive")).unwrap();
        std::fs::create_dir(tmp.path().join("etc")).unwrap();
        std::fs::write(tmp.path().join("etc/passwd"), "root:x:0:0:root:/root:/bin/bash\n").unwrap();
        (tmp, state)
    }

    fn request(uri: &str) -> Request<Bytes> {
        Request::builder().uri(uri).body(Bytes::new()).unwrap()
    }

    #[test]
    fn test_name_filter() {
        assert!(is_permitted_name("../../../etc/passwd"));
        assert!(is_permitted_name("/proc/self/environ"));
        assert!(is_permitted_name("report_2024-v1.txt"));
        assert!(!is_permitted_name("a b.txt"));
        assert!(!is_permitted_name("x;id"));
        assert!(!is_permitted_name("file\0.txt"));
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_sorts() {
        let (_tmp, state) = fixture();
        let html = body_bytes(list(&state).await.unwrap()).await;
        let html = String::from_utf8_lossy(&html);
        let manual = html.find("manual.pdf").unwrap();
        let welcome = html.find("welcome.txt").unwrap();
        assert!(manual < welcome);
        assert!(!html.contains("archive"));
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let (_tmp, state) = fixture();
        std::fs::remove_dir_all(&state.config.paths.documents_dir).unwrap();
        let resp = list(&state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_view_plain_file() {
        let (_tmp, state) = fixture();
        let resp = view(&request("/view?file=welcome.txt"), &state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"Welcome, warrior.\n"));
    }

    #[tokio::test]
    async fn test_view_traversal_leaves_documents_dir() {
        let (_tmp, state) = fixture();
        let resp = view(&request("/view?file=../../etc/passwd"), &state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_bytes(resp).await.starts_with(b"root:x:0:0"));
    }

    #[tokio::test]
    async fn test_view_traversal_through_file_or_missing_segment() {
        let (_tmp, state) = fixture();
        for name in [
            "welcome.txt/../../../etc/passwd",
            "nope/../../../etc/passwd",
            "archive/./missing/../../../../etc/passwd",
        ] {
            let uri = format!("/view?file={name}");
            let resp = view(&request(&uri), &state).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK, "{name}");
            assert!(body_bytes(resp).await.starts_with(b"root:x:0:0"), "{name}");
        }
    }

    #[test]
    fn test_resolve_path() {
        let tmp = TempDir::new().unwrap();
        let base = std::fs::canonicalize(tmp.path()).unwrap().join("docs");
        std::fs::create_dir(&base).unwrap();
        std::fs::write(base.join("a.txt"), "a").unwrap();

        assert_eq!(resolve_path(&base.join("a.txt/../b")).unwrap(), base.join("b"));
        assert_eq!(resolve_path(&base.join("x/y/../../b")).unwrap(), base.join("b"));
        assert_eq!(resolve_path(Path::new("/../../etc")).unwrap(), PathBuf::from("/etc"));

        let relative = resolve_path(Path::new("docs/../b")).unwrap();
        assert_eq!(relative, std::env::current_dir().unwrap().join("b"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_path_follows_symlinks() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real/inner");
        std::fs::create_dir_all(&real).unwrap();
        std::os::unix::fs::symlink(&real, tmp.path().join("link")).unwrap();

        // `..` applies to the link target, not the link's parent
        let resolved = resolve_path(&tmp.path().join("link/../x")).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(tmp.path()).unwrap().join("real/x"));
    }

    #[tokio::test]
    async fn test_view_absolute_path_replaces_base() {
        let (tmp, state) = fixture();
        let target = tmp.path().join("etc/passwd");
        let uri = format!("/view?file={}", target.display());
        let resp = view(&request(&uri), &state).await.unwrap();
        assert!(body_bytes(resp).await.starts_with(b"root:x"));
    }

    #[tokio::test]
    async fn test_view_errors() {
        let (_tmp, state) = fixture();
        let status = |r: PageResult| r.unwrap_err().status();

        assert_eq!(status(view(&request("/view"), &state).await), StatusCode::BAD_REQUEST);
        assert_eq!(status(view(&request("/view?file="), &state).await), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(view(&request("/view?file=a+b.txt"), &state).await),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(view(&request("/view?file=missing.txt"), &state).await),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(view(&request("/view?file=archive"), &state).await),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_view_conditional_and_range() {
        let (_tmp, state) = fixture();
        let first = view(&request("/view?file=welcome.txt"), &state).await.unwrap();
        let etag = first.headers()["ETag"].to_str().unwrap().to_string();

        let req = Request::builder()
            .uri("/view?file=welcome.txt")
            .header("If-None-Match", &etag)
            .body(Bytes::new())
            .unwrap();
        let resp = view(&req, &state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);

        let req = Request::builder()
            .uri("/view?file=welcome.txt")
            .header("Range", "bytes=0-6")
            .body(Bytes::new())
            .unwrap();
        let resp = view(&req, &state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(body_bytes(resp).await, Bytes::from_static(b"Welcome"));

        let req = Request::builder()
            .uri("/view?file=welcome.txt")
            .header("Range", "bytes=500-")
            .body(Bytes::new())
            .unwrap();
        let resp = view(&req, &state).await.unwrap();
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[tokio::test]
    async fn test_api_read() {
        let (_tmp, state) = fixture();
        let body = Bytes::from_static(br#"{"filename":"welcome.txt"}"#);
        let value = api_read(&body, &state).await.unwrap();
        assert_eq!(value["content"], "Welcome, warrior.\n");
        assert_eq!(value["filename"], "welcome.txt");

        let body = Bytes::from_static(br#"{"filename":"../../etc/passwd"}"#);
        let value = api_read(&body, &state).await.unwrap();
        assert!(value["content"].as_str().unwrap().starts_with("root:x"));
    }

    #[tokio::test]
    async fn test_api_read_errors() {
        let (_tmp, state) = fixture();

        let bodies: [&[u8]; 5] = [
            b"not json",
            b"[]",
            b"{}",
            br#"{"filename":""}"#,
            br#"{"filename":7}"#,
        ];
        for body in bodies {
            let err = api_read(&Bytes::copy_from_slice(body), &state).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_json(), json!({ "error": "No filename provided" }));
        }

        let err = api_read(&Bytes::from_static(br#"{"filename":"missing.txt"}"#), &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json(), json!({ "error": "File not found" }));

        let err = api_read(&Bytes::from_static(br#"{"filename":"archive"}"#), &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
