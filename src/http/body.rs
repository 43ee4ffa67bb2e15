//! Request body collection

use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};

/// Error raised while buffering a request body
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Buffer a whole request body, failing once it exceeds `limit` bytes
pub async fn collect_limited<B>(body: B, limit: u64) -> Result<Bytes, BodyError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    Ok(Limited::new(body, limit).collect().await?.to_bytes())
}
