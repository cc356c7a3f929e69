use crate::error::HttpError;
use crate::security::ERROR_BODY_PREVIEW_LIMIT;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::time::Instant;

/// Response body after the decompression layer, type-erased.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Parse `Retry-After` as delay-seconds or an HTTP-date (RFC 9110 §10.2.3).
///
/// Returns `None` when the header is missing, unparseable, negative or in the past.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(http::header::RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<i64>() {
        return u64::try_from(seconds).ok().map(Duration::from_secs);
    }

    httpdate::parse_http_date(value)
        .ok()?
        .duration_since(SystemTime::now())
        .ok()
}

/// Response with size-limited body readers.
///
/// - [`error_for_status`](Self::error_for_status) checks the status without reading the body
/// - [`bytes`](Self::bytes) reads the body regardless of status
/// - [`checked_bytes`](Self::checked_bytes) and [`json`](Self::json) turn
///   non-2xx into [`HttpError::HttpStatus`] carrying a body preview
///
/// Body reads share the request's deadline: a server that sends headers and
/// then stalls fails with [`HttpError::Timeout`].
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
    pub(crate) deadline: Instant,
    pub(crate) timeout: Duration,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// # Errors
    /// Returns `HttpError::HttpStatus` with an empty preview if the status is not 2xx
    pub fn error_for_status(self) -> Result<Self, HttpError> {
        if self.inner.status().is_success() {
            return Ok(self);
        }

        Err(HttpError::HttpStatus {
            status: self.inner.status(),
            body_preview: String::new(),
            content_type: content_type(self.inner.headers()),
            retry_after: parse_retry_after(self.inner.headers()),
        })
    }

    /// # Errors
    /// Returns `HttpError::BodyTooLarge` if the body exceeds the limit,
    /// `HttpError::Timeout` if the deadline passes first
    pub async fn bytes(self) -> Result<Bytes, HttpError> {
        let limit = self.max_body_size;
        within(self.deadline, self.timeout, read_body_limited(self.inner, limit)).await
    }

    /// # Errors
    /// Returns `HttpError::HttpStatus` if status is not 2xx,
    /// `HttpError::BodyTooLarge` if the body exceeds the limit,
    /// `HttpError::Timeout` if the deadline passes first
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        let limit = self.max_body_size;
        within(self.deadline, self.timeout, checked_body(self.inner, limit)).await
    }

    /// # Errors
    /// Same as [`checked_bytes`](Self::checked_bytes), plus `HttpError::Json` on parse failure
    pub async fn json<T: DeserializeOwned>(self) -> Result<T, HttpError> {
        let body = self.checked_bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn within<T>(
    deadline: Instant,
    timeout: Duration,
    read: impl Future<Output = Result<T, HttpError>>,
) -> Result<T, HttpError> {
    tokio::time::timeout_at(deadline, read)
        .await
        .unwrap_or_else(|_| Err(HttpError::Timeout(timeout)))
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn checked_body(
    response: Response<ResponseBody>,
    max_body_size: usize,
) -> Result<Bytes, HttpError> {
    let status = response.status();
    if status.is_success() {
        return read_body_limited(response, max_body_size).await;
    }

    let content_type = content_type(response.headers());
    let retry_after = parse_retry_after(response.headers());

    // An oversized error body must not hide the status itself.
    let preview_limit = max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
    let body_preview = match read_body_limited(response, preview_limit).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
        Err(e) => return Err(e),
    };

    Err(HttpError::HttpStatus {
        status,
        body_preview,
        content_type,
        retry_after,
    })
}

/// Collect the decoded body, failing as soon as it passes `limit` bytes.
async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            let total = collected.len() + chunk.len();
            if total > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: total,
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}
