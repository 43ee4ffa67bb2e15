//! Document upload
//!
//! The client supplied filename is joined onto the upload directory as is.
//! `../` segments and absolute names write anywhere the process may write,
//! and existing files are overwritten.

use std::convert::Infallible;

use futures_util::stream;
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use http_body_util::Full;
use multer::Multipart;
use tracing::{debug, error, info};

use super::{header_str, pages, PageResult};
use crate::config::AppState;
use crate::error::HandlerError;
use crate::http::response::build_html_response;

/// Multipart field carrying the uploaded file
const FILE_FIELD: &str = "file";

/// `GET /upload`
pub fn form() -> Response<Full<Bytes>> {
    build_html_response(StatusCode::OK, pages::upload_form())
}

/// `POST /upload`
pub async fn store(req: &Request<Bytes>, state: &AppState) -> PageResult {
    let (filename, content) = file_part(req)
        .await
        .ok_or_else(|| HandlerError::InvalidInput("No file provided".to_string()))?;

    if filename.is_empty() {
        return Err(HandlerError::InvalidInput("No file selected".to_string()));
    }
    if filename.chars().count() > state.config.http.max_filename_len {
        return Err(HandlerError::InvalidInput("Filename too long".to_string()));
    }

    let path = state.config.paths.upload_dir.join(&filename);
    if let Err(e) = tokio::fs::write(&path, &content).await {
        error!(path = %path.display(), error = %e, "Upload error");
        return Err(HandlerError::Internal("Upload failed".to_string()));
    }
    info!(path = %path.display(), bytes = content.len(), "Stored upload");

    Ok(build_html_response(
        StatusCode::OK,
        pages::upload_success(&filename),
    ))
}

/// Filename and content of the first `file` part that declares a filename
async fn file_part(req: &Request<Bytes>) -> Option<(String, Bytes)> {
    let boundary = header_str(req.headers(), CONTENT_TYPE)
        .and_then(|ct| multer::parse_boundary(ct).ok())?;
    let body = req.body().clone();
    let mut multipart = Multipart::new(
        stream::once(async move { Ok::<_, Infallible>(body) }),
        boundary,
    );

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "Malformed multipart body");
                return None;
            }
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value, not a file
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            continue;
        };
        return field.bytes().await.ok().map(|content| (filename, content));
    }
}
