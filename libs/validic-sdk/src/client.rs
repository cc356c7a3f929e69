use std::path::Path;
use std::sync::Arc;

use crate::config::ValidicConfig;
use crate::error::ValidicError;
use crate::transport::{HttpTransport, Transport};
use crate::users::UserResource;

/// Entry point: a configuration snapshot plus the transport every
/// resource shares.
///
/// Cloning is cheap and clones share the same transport.
///
/// ```ignore
/// let validic = Validic::new(ValidicConfig {
///     organization_id: Some("51aca5a06dedda916400002b".into()),
///     access_token: Some(SecretString::new(Box::from("ENTERPRISE_KEY"))),
///     ..ValidicConfig::default()
/// })?;
/// let users = validic.users().list_users(&UserQuery::new().limit(10)).await?;
/// ```
#[derive(Clone)]
pub struct Validic {
    config: Arc<ValidicConfig>,
    transport: Arc<dyn Transport>,
}

impl Validic {
    /// Validate `config` and connect through [`HttpTransport`].
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns `ValidicError` if the configuration is invalid or the HTTP client cannot be built
    pub fn new(config: ValidicConfig) -> Result<Self, ValidicError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Configuration from `VALIDIC_*` environment variables and the optional
    /// YAML file at `path`, see [`ValidicConfig::load`].
    ///
    /// # Errors
    /// Returns `ValidicError` if loading or validation fails
    pub fn from_env(path: Option<&Path>) -> Result<Self, ValidicError> {
        Self::new(ValidicConfig::load(path)?)
    }

    /// Use a caller-supplied transport. The configuration is taken as is.
    #[must_use]
    pub fn with_transport(config: ValidicConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    #[must_use]
    pub fn users(&self) -> UserResource {
        UserResource::new(Arc::clone(&self.transport), Arc::clone(&self.config))
    }

    #[must_use]
    pub fn config(&self) -> &ValidicConfig {
        &self.config
    }
}
