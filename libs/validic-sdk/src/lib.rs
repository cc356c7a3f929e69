#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Client for the Validic organization and user management API.
//!
//! ```ignore
//! use validic_sdk::{Validic, UserOptions, UserQuery, UserStatus};
//!
//! // VALIDIC_ORGANIZATION_ID and VALIDIC_ACCESS_TOKEN supply the defaults
//! let validic = Validic::from_env(None)?;
//! let users = validic.users();
//!
//! let active = users
//!     .list_users(&UserQuery::new().status(UserStatus::Active).limit(10))
//!     .await?;
//! users.suspend_user("51552cd7fded0807c4000017", &UserOptions::new()).await?;
//! ```
//!
//! Responses are returned as [`serde_json::Value`] exactly as the API sent
//! them. Every call is a single request: no retries, no pagination, no caching.

mod client;
mod config;
mod error;
pub mod transport;
pub mod users;

pub use client::Validic;
pub use config::{
    DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, ENV_PREFIX, ValidicConfig,
};
pub use error::ValidicError;
pub use transport::{HttpTransport, Params, Transport};
pub use users::{Credentials, UserOptions, UserProfile, UserQuery, UserResource, UserStatus};

pub use secrecy::{ExposeSecret, SecretString};
pub use serde_json::Value;
pub use validic_http::{HttpError, StatusCode};
