#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Hyper-based HTTP client used by the Validic SDK.
//!
//! - TLS via rustls, HTTPS only unless insecure HTTP is explicitly allowed
//! - Connection pooling and a per-request timeout
//! - `User-Agent` injection
//! - Transparent gzip, brotli and deflate decompression
//! - Body size limits applied to decoded bytes
//!
//! # Example
//!
//! ```ignore
//! use validic_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .user_agent("validic-sdk/0.1")
//!     .build()?;
//!
//! let me: serde_json::Value = client
//!     .get("https://api.validic.com/v1/me.json?authentication_token=...")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod request;
mod response;
pub mod security;
mod tls;
mod user_agent;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TransportSecurity};
pub use error::{HttpError, InvalidUriKind};
pub use request::RequestBuilder;
pub use response::{HttpResponse, ResponseBody, parse_retry_after};
pub use user_agent::{UserAgentLayer, UserAgentService};

pub use http::{Method, StatusCode};
