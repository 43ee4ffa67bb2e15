//! Handler error type
//!
//! Every handler returns `Result<Response, HandlerError>`. The kind of an error
//! decides its status code in one place, see [`ErrorKind::status`]. Page
//! handlers render errors as the HTML error page, API handlers as JSON.

use hyper::StatusCode;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Coarse error taxonomy shared by all endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, empty, malformed or oversized parameter
    InvalidInput,
    /// Missing file, missing database row, unknown route
    NotFound,
    /// Directory target, refused I/O, failed proof of access
    AccessDenied,
    /// Anything unexpected, including failed reconnaissance probes
    Internal,
}

impl ErrorKind {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Internal(String),

    /// Failure reported by a probe or flag endpoint
    #[error("{message}")]
    Probe {
        kind: ErrorKind,
        message: String,
        hint: Option<&'static str>,
        details: Option<String>,
    },
}

impl HandlerError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::AccessDenied,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Probe { kind, .. } => *kind,
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Probe failure of the given kind with a hint and no error text
    pub fn probe(kind: ErrorKind, message: impl Into<String>, hint: &'static str) -> Self {
        Self::Probe {
            kind,
            message: message.into(),
            hint: Some(hint),
            details: None,
        }
    }

    /// The client for a service was never constructed
    ///
    /// Info endpoints pass a hint, flag endpoints report the bare reason.
    pub fn client_missing(
        kind: ErrorKind,
        reason: impl Into<String>,
        hint: Option<&'static str>,
    ) -> Self {
        Self::Probe {
            kind,
            message: reason.into(),
            hint,
            details: None,
        }
    }

    /// Attach the underlying error text to a probe failure
    #[must_use]
    pub fn with_details(self, error: impl ToString) -> Self {
        match self {
            Self::Probe {
                kind,
                message,
                hint,
                ..
            } => Self::Probe {
                kind,
                message,
                hint,
                details: Some(error.to_string()),
            },
            other => other,
        }
    }

    /// JSON body: `{status, message, hint?, error_details?}` for probe
    /// failures, `{error}` for everything else
    pub fn to_json(&self) -> Value {
        match self {
            Self::Probe {
                message,
                hint,
                details,
                ..
            } => {
                let mut body = Map::new();
                body.insert("status".into(), json!("error"));
                body.insert("message".into(), json!(message));
                if let Some(hint) = hint {
                    body.insert("hint".into(), json!(hint));
                }
                if let Some(details) = details {
                    body.insert("error_details".into(), json!(details));
                }
                Value::Object(body)
            }
            other => json!({ "error": other.to_string() }),
        }
    }
}
