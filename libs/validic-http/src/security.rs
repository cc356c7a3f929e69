//! Limits that keep untrusted responses from exhausting memory.

/// Bytes of a non-2xx response body kept in [`HttpError::HttpStatus`](crate::HttpError::HttpStatus).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;
