//! Request handler module
//!
//! Route dispatch plus one module per group of endpoints. Page handlers return
//! a full response, API handlers return a JSON value; the router renders
//! errors of either kind.

pub mod diagnostics;
pub mod documents;
pub mod layer2;
pub mod layer3;
pub mod pages;
pub mod router;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main entry point
pub use router::handle_request;

use crate::error::HandlerError;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::AsHeaderName;
use hyper::{HeaderMap, Response};
use serde_json::Value;

/// Outcome of an HTML page handler
pub type PageResult = Result<Response<Full<Bytes>>, HandlerError>;

/// Outcome of a JSON API handler, rendered with status 200 on success
pub type ApiResult = Result<Value, HandlerError>;

/// Header value as text, `None` when absent or not visible ASCII
fn header_str<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<&str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
