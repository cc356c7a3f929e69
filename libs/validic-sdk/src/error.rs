use thiserror::Error;
use validic_http::{HttpError, StatusCode};

/// Errors returned by the Validic client.
///
/// Remote failures pass through untouched as [`ValidicError::Http`]; the
/// user operations never invent errors of their own.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ValidicError {
    /// Transport failure or non-2xx answer from the API
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A 2xx body that is not valid JSON
    #[error("Invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    Figment(#[source] Box<figment::Error>),
}

impl ValidicError {
    /// HTTP status of a non-2xx answer, if that is what this error is.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http(err) => err.status(),
            _ => None,
        }
    }

    /// Error payload returned by the API for a non-2xx answer.
    #[must_use]
    pub fn body_preview(&self) -> Option<&str> {
        match self {
            Self::Http(HttpError::HttpStatus { body_preview, .. }) => Some(body_preview),
            _ => None,
        }
    }
}

impl From<figment::Error> for ValidicError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
