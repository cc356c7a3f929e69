use std::time::Duration;
use thiserror::Error;

/// Why a URL was rejected before any request was sent.
///
/// Match on this instead of the `reason` string, whose wording is not stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidUriKind {
    /// The URL is syntactically malformed
    ParseError,
    /// The URL has no host
    MissingAuthority,
    /// The URL has no `http://` or `https://` scheme
    MissingScheme,
}

/// Errors produced by [`HttpClient`](crate::HttpClient) and the values it returns.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpError {
    /// The `http` crate refused to assemble the request
    #[error("Failed to build request: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection, DNS or protocol failure below HTTP semantics
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The decoded response body grew past `max_body_size`
    #[error("Response body too large: limit {limit} bytes, got {actual} bytes")]
    BodyTooLarge { limit: usize, actual: usize },

    /// The server answered with a non-2xx status.
    ///
    /// `body_preview` holds at most
    /// [`ERROR_BODY_PREVIEW_LIMIT`](crate::security::ERROR_BODY_PREVIEW_LIMIT)
    /// bytes of the server's error payload.
    #[error("HTTP {status}: {body_preview}")]
    HttpStatus {
        status: http::StatusCode,
        body_preview: String,
        content_type: Option<String>,
        /// Parsed `Retry-After` header, if the server sent a usable one
        retry_after: Option<Duration>,
    },

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The request queue is full; the request was rejected without waiting
    #[error("Service overloaded: request queue is full")]
    Overloaded,

    /// The background buffer worker is gone
    #[error("Service unavailable: internal failure")]
    ServiceClosed,

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUri {
        url: String,
        kind: InvalidUriKind,
        /// Diagnostic text for logs only
        reason: String,
    },

    /// The URL scheme is not permitted by the client's
    /// [`TransportSecurity`](crate::TransportSecurity)
    #[error("URL scheme '{scheme}' not allowed: {reason}")]
    InvalidScheme { scheme: String, reason: String },
}

impl HttpError {
    /// HTTP status of a [`HttpError::HttpStatus`] error, `None` for every other variant.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<hyper::Error> for HttpError {
    fn from(err: hyper::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}

impl From<hyper_util::client::legacy::Error> for HttpError {
    fn from(err: hyper_util::client::legacy::Error) -> Self {
        HttpError::Transport(Box::new(err))
    }
}
