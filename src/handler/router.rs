//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: body size check, exact path and
//! method dispatch, error rendering, catch-all pages and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use http_body_util::{Full, LengthLimitError};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use tracing::{error, warn};

use super::{diagnostics, documents, header_str, layer2, layer3, pages, upload};
use super::{ApiResult, PageResult};
use crate::config::AppState;
use crate::http::body::BodyError;
use crate::http::{
    build_405_response, build_413_response, build_html_response, build_json_response,
    collect_limited, strip_body,
};
use crate::logger::{self, AccessLogEntry};

/// Every routed path with the methods it answers, for `Allow` headers
const ROUTES: &[(&str, &str)] = &[
    ("/", "GET, HEAD"),
    ("/documents", "GET, HEAD"),
    ("/view", "GET, HEAD"),
    ("/api/read", "POST"),
    ("/upload", "GET, HEAD, POST"),
    ("/source", "GET, HEAD"),
    ("/health", "GET, HEAD"),
    ("/system-info", "GET, HEAD"),
    ("/docker-info", "GET, HEAD"),
    ("/layer2-flag", "GET, HEAD"),
    ("/redis-info", "GET, HEAD"),
    ("/layer3-flag", "GET, HEAD"),
    ("/db-info", "GET, HEAD"),
    ("/layer3-db-flag", "GET, HEAD"),
];

/// Main entry point for HTTP request handling
///
/// Never fails: handler errors, unknown routes and panics all become
/// responses.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let started = Instant::now();
    let mut entry = AccessLogEntry::start(peer, req.method(), req.uri(), req.version());
    entry.referer = header_str(req.headers(), REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), USER_AGENT).map(ToString::to_string);
    let is_head = req.method() == Method::HEAD;

    let mut response = AssertUnwindSafe(process(req, &state))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            error!("Request handler panicked");
            internal_error_page()
        });

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }
    if is_head {
        response = strip_body(response);
    }

    if state.config.logging.access_log {
        let body_bytes = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        entry.finish(response.status().as_u16(), body_bytes, started.elapsed());
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Size checks and body buffering, then dispatch
async fn process<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(req.headers(), max_body_size) {
        return resp;
    }

    let (parts, body) = req.into_parts();
    let body = match collect_limited(body, max_body_size).await {
        Ok(body) => body,
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Request body exceeded {max_body_size} bytes");
            return build_413_response();
        }
        Err(e) => {
            warn!(error = %e, "Failed to read request body");
            return build_html_response(StatusCode::BAD_REQUEST, pages::error("Bad request"));
        }
    };

    route(&Request::from_parts(parts, body), state).await
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = header_str(headers, CONTENT_LENGTH)?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            warn!("Request body too large: {size} bytes (max: {max_body_size})");
            Some(build_413_response())
        }
        Err(_) => {
            warn!("Invalid Content-Length value: '{size_str}', skipping size check");
            None
        }
        _ => None,
    }
}

async fn route(req: &Request<Bytes>, state: &AppState) -> Response<Full<Bytes>> {
    // HEAD is answered as GET; the body is dropped afterwards
    let method = match *req.method() {
        Method::HEAD => Method::GET,
        ref other => other.clone(),
    };

    match (method, req.uri().path()) {
        (Method::GET, "/") => diagnostics::index(),
        (Method::GET, "/documents") => render_page(documents::list(state).await),
        (Method::GET, "/view") => render_page(documents::view(req, state).await),
        (Method::POST, "/api/read") => render_json(documents::api_read(req.body(), state).await),
        (Method::GET, "/upload") => upload::form(),
        (Method::POST, "/upload") => render_page(upload::store(req, state).await),
        (Method::GET, "/source") => render_page(diagnostics::source(state).await),
        (Method::GET, "/health") => render_json(Ok(diagnostics::health(state))),
        (Method::GET, "/system-info") => render_json(diagnostics::system_info(state).await),
        (Method::GET, "/docker-info") => render_json(layer2::docker_info(state).await),
        (Method::GET, "/layer2-flag") => render_json(layer2::flag(state).await),
        (Method::GET, "/redis-info") => render_json(layer3::redis_info(state).await),
        (Method::GET, "/layer3-flag") => render_json(layer3::redis_flag(state).await),
        (Method::GET, "/db-info") => render_json(layer3::db_info(state).await),
        (Method::GET, "/layer3-db-flag") => render_json(layer3::db_flag(state).await),
        (method, path) => match allowed_methods(path) {
            Some(allow) => {
                warn!("Method not allowed: {method} {path}");
                build_405_response(allow)
            }
            None => not_found_page(),
        },
    }
}

fn allowed_methods(path: &str) -> Option<&'static str> {
    ROUTES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, allow)| *allow)
}

/// Page handlers render their errors as the HTML error page
fn render_page(result: PageResult) -> Response<Full<Bytes>> {
    result.unwrap_or_else(|err| build_html_response(err.status(), pages::error(&err.to_string())))
}

/// API handlers render success as 200 JSON and errors as JSON bodies
fn render_json(result: ApiResult) -> Response<Full<Bytes>> {
    match result {
        Ok(body) => build_json_response(StatusCode::OK, &body),
        Err(err) => build_json_response(err.status(), &err.to_json()),
    }
}

fn not_found_page() -> Response<Full<Bytes>> {
    build_html_response(StatusCode::NOT_FOUND, pages::error("Page not found"))
}

fn internal_error_page() -> Response<Full<Bytes>> {
    build_html_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        pages::error("Internal server error"),
    )
}
