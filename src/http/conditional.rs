//! Conditional and partial requests for served files
//!
//! Strong `ETag`s derived from content, `If-None-Match` checks, and single
//! `bytes=` ranges (RFC 7233). Multi-range requests are answered in full.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Quoted content hash, e.g. `"9f2c41d07a3be8a1"`
pub fn etag_for(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

/// Whether `If-None-Match` lists `etag` or the `*` wildcard
pub fn not_modified(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|header| {
        header
            .split(',')
            .map(str::trim)
            .any(|candidate| candidate == "*" || candidate == etag)
    })
}

/// Inclusive byte span inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub first: usize,
    pub last: usize,
}

impl ByteSpan {
    pub const fn size(self) -> usize {
        self.last - self.first + 1
    }
}

/// Outcome of interpreting a `Range` header against a file length
#[derive(Debug, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable header, send the whole file
    Full,
    /// Send 206 with this span
    Partial(ByteSpan),
    /// Send 416
    Unsatisfiable,
}

pub fn resolve_range(header: Option<&str>, len: usize) -> RangeOutcome {
    let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if spec.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((start, end)) = spec.split_once('-') else {
        return RangeOutcome::Full;
    };

    match (start.trim(), end.trim()) {
        // bytes=-N : final N bytes
        ("", suffix) => match suffix.parse::<usize>() {
            Ok(0) => RangeOutcome::Unsatisfiable,
            Ok(n) if len > 0 => RangeOutcome::Partial(ByteSpan {
                first: len.saturating_sub(n),
                last: len - 1,
            }),
            Ok(_) => RangeOutcome::Unsatisfiable,
            Err(_) => RangeOutcome::Full,
        },
        (first, last) => {
            let Ok(first) = first.parse::<usize>() else {
                return RangeOutcome::Full;
            };
            if first >= len {
                return RangeOutcome::Unsatisfiable;
            }
            let last = if last.is_empty() {
                len - 1
            } else {
                match last.parse::<usize>() {
                    Ok(last) if last >= first => last.min(len - 1),
                    _ => return RangeOutcome::Full,
                }
            };
            RangeOutcome::Partial(ByteSpan { first, last })
        }
    }
}
