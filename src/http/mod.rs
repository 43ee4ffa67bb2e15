//! HTTP protocol layer module
//!
//! Response builders, body and query parsing, content type detection and
//! conditional/range handling, independent of any particular endpoint.

pub mod body;
pub mod conditional;
pub mod mime;
pub mod query;
pub mod response;

pub use body::collect_limited;
pub use response::{
    build_405_response, build_413_response, build_html_response, build_json_response,
    strip_body,
};
