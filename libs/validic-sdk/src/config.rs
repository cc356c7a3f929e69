use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::value::{Dict, Value};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;
use validic_http::{HttpClientConfig, TransportSecurity};

use crate::error::ValidicError;

pub const DEFAULT_BASE_URL: &str = "https://api.validic.com";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_USER_AGENT: &str = concat!("validic-sdk/", env!("CARGO_PKG_VERSION"));

/// Prefix of the environment variables read by [`ValidicConfig::load`].
pub const ENV_PREFIX: &str = "VALIDIC_";

/// Environment keys taken as literal strings rather than parsed values.
const VERBATIM_ENV_KEYS: [&str; 2] = ["organization_id", "access_token"];

/// Whether this build may talk plain HTTP at all.
const INSECURE_HTTP_BUILD: bool = cfg!(any(debug_assertions, feature = "allow-insecure-http"));

/// Client configuration.
///
/// `organization_id` and `access_token` are the defaults used by every
/// user operation that does not pass its own. The snapshot is immutable once
/// handed to [`Validic`](crate::Validic).
///
/// `Debug` is manually implemented to redact [`access_token`](Self::access_token).
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ValidicConfig {
    /// Scheme and host of the API, optionally with a path prefix.
    pub base_url: String,

    /// First path segment of every request, e.g. `v1`.
    pub api_version: String,

    #[serde(
        deserialize_with = "lenient::optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_id: Option<String>,

    /// Organization access token (redacted in `Debug` output).
    #[serde(deserialize_with = "lenient::optional_secret", skip_serializing)]
    pub access_token: Option<SecretString>,

    /// Per-request timeout, humantime format (`30s`, `1m 30s`).
    #[serde(with = "lenient::duration")]
    pub request_timeout: Duration,

    /// Largest decoded response body accepted, in bytes.
    pub max_body_size: usize,

    pub user_agent: String,

    /// Accept a plain `http://` base URL. Only for local mock servers, and
    /// only honored in debug builds or with the `allow-insecure-http` feature.
    pub allow_insecure_http: bool,
}

impl Default for ValidicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            organization_id: None,
            access_token: None,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            allow_insecure_http: false,
        }
    }
}

impl Clone for ValidicConfig {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            api_version: self.api_version.clone(),
            organization_id: self.organization_id.clone(),
            access_token: self
                .access_token
                .as_ref()
                .map(|token| SecretString::new(Box::from(token.expose_secret()))),
            request_timeout: self.request_timeout,
            max_body_size: self.max_body_size,
            user_agent: self.user_agent.clone(),
            allow_insecure_http: self.allow_insecure_http,
        }
    }
}

/// `Debug` redacts `access_token` to prevent accidental exposure in logs.
impl fmt::Debug for ValidicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidicConfig")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("organization_id", &self.organization_id)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("user_agent", &self.user_agent)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish()
    }
}

impl ValidicConfig {
    /// Extract the configuration from an arbitrary figment.
    ///
    /// Keys missing from the figment keep their defaults.
    ///
    /// # Errors
    /// Returns `ValidicError::Figment` if a value has the wrong shape
    pub fn from_figment(figment: Figment) -> Result<Self, ValidicError> {
        Ok(Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(figment)
            .extract()?)
    }

    /// Load defaults, then the YAML file at `path` (when given), then
    /// `VALIDIC_*` environment variables.
    ///
    /// ```ignore
    /// // VALIDIC_ACCESS_TOKEN=... VALIDIC_ORGANIZATION_ID=...
    /// let config = ValidicConfig::load(Some(Path::new("validic.yaml")))?;
    /// ```
    ///
    /// # Errors
    /// Returns `ValidicError::Config` if `path` does not exist, or
    /// `ValidicError::Figment` if a layer cannot be parsed
    pub fn load(path: Option<&Path>) -> Result<Self, ValidicError> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ValidicError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment
            .merge(Env::prefixed(ENV_PREFIX).ignore(&VERBATIM_ENV_KEYS))
            .merge(verbatim_env());

        let config = Self::from_figment(figment)?;
        tracing::debug!(
            base_url = %config.base_url,
            api_version = %config.api_version,
            has_organization_id = config.organization_id.is_some(),
            has_access_token = config.access_token.is_some(),
            "validic configuration loaded"
        );
        Ok(config)
    }

    /// Check the values a request cannot be built without.
    ///
    /// Missing credentials are not an error: requests then go out without them.
    ///
    /// # Errors
    /// Returns `ValidicError::InvalidUrl` for a bad base URL and
    /// `ValidicError::Config` for any other rejected value
    pub fn validate(&self) -> Result<(), ValidicError> {
        self.check_insecure_http(INSECURE_HTTP_BUILD)?;

        let invalid_url = |reason: &str| ValidicError::InvalidUrl {
            url: self.base_url.clone(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(&self.base_url).map_err(|e| invalid_url(&e.to_string()))?;
        let scheme_allowed = match url.scheme() {
            "https" => true,
            "http" => self.allow_insecure_http,
            other => {
                return Err(invalid_url(&format!(
                    "unsupported scheme '{other}', expected http or https"
                )));
            }
        };
        if !scheme_allowed {
            return Err(invalid_url(
                "plain http requires allow_insecure_http = true",
            ));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid_url("missing host"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid_url("base URL must not carry a query or fragment"));
        }

        if self.api_version.trim().is_empty() {
            return Err(ValidicError::Config("api_version must not be empty".into()));
        }
        if self.api_version.contains('/') {
            return Err(ValidicError::Config(format!(
                "api_version must be a single path segment, got '{}'",
                self.api_version
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ValidicError::Config(
                "request_timeout must be greater than zero".into(),
            ));
        }
        if self.max_body_size == 0 {
            return Err(ValidicError::Config(
                "max_body_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn check_insecure_http(&self, build_allows: bool) -> Result<(), ValidicError> {
        if self.allow_insecure_http && !build_allows {
            return Err(ValidicError::Config(
                "allow_insecure_http needs a debug build or the allow-insecure-http feature"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Settings for the underlying HTTP client.
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        let transport = if self.allow_insecure_http && INSECURE_HTTP_BUILD {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        };
        HttpClientConfig {
            request_timeout: self.request_timeout,
            max_body_size: self.max_body_size,
            user_agent: self.user_agent.clone(),
            transport,
            ..HttpClientConfig::default()
        }
    }
}

/// Organization id and token exactly as written in the environment.
///
/// Figment's value parser turns `007` into `7` and `1.50` into `1.5`, so these
/// keys bypass it through the provider's raw strings.
fn verbatim_env() -> Serialized<Dict> {
    let values: Dict = Env::prefixed(ENV_PREFIX)
        .only(&VERBATIM_ENV_KEYS)
        .iter()
        .map(|(key, value)| (key.as_str().to_owned(), Value::from(value.as_str())))
        .collect();
    Serialized::defaults(values)
}

/// Deserializers that tolerate the value types produced by environment
/// variables, where `VALIDIC_ORGANIZATION_ID=12345` arrives as a number.
mod lenient {
    use std::fmt;
    use std::time::Duration;

    use secrecy::SecretString;
    use serde::de::{self, Deserializer, Visitor};
    use serde::ser::Serializer;

    struct StringOrNumber;

    impl<'de> Visitor<'de> for StringOrNumber {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string, number or boolean")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_owned()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    pub fn optional_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        d.deserialize_any(StringOrNumber)
    }

    pub fn optional_secret<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<SecretString>, D::Error> {
        Ok(optional_string(d)?.map(|s| SecretString::new(s.into_boxed_str())))
    }

    pub mod duration {
        use super::{Deserializer, Duration, Serializer, Visitor, de, fmt};

        struct HumanDuration;

        impl Visitor<'_> for HumanDuration {
            type Value = Duration;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a duration such as \"30s\" or a number of seconds")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                humantime::parse_duration(v.trim()).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Duration::from_secs(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map(Duration::from_secs)
                    .map_err(|_| E::custom("duration must not be negative"))
            }
        }

        pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(&humantime::format_duration(*value))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
            d.deserialize_any(HumanDuration)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn figment_of(value: serde_json::Value) -> Figment {
        Figment::new().merge(Serialized::defaults(value))
    }

    #[test]
    fn defaults() {
        let cfg = ValidicConfig::default();
        assert_eq!(cfg.base_url, "https://api.validic.com");
        assert_eq!(cfg.api_version, "v1");
        assert!(cfg.organization_id.is_none());
        assert!(cfg.access_token.is_none());
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert_eq!(cfg.max_body_size, 10 * 1024 * 1024);
        assert!(cfg.user_agent.starts_with("validic-sdk/"));
        assert!(!cfg.allow_insecure_http);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn insecure_http_is_refused_when_the_build_disallows_it() {
        let cfg = ValidicConfig {
            base_url: "http://127.0.0.1:8080".to_owned(),
            allow_insecure_http: true,
            ..ValidicConfig::default()
        };
        assert!(matches!(
            cfg.check_insecure_http(false),
            Err(ValidicError::Config(msg)) if msg.contains("allow-insecure-http")
        ));
        assert!(cfg.check_insecure_http(true).is_ok());
        assert!(ValidicConfig::default().check_insecure_http(false).is_ok());
    }

    #[test]
    fn from_figment_keeps_boolean_and_float_shaped_ids() {
        let cfg = ValidicConfig::from_figment(figment_of(json!({
            "organization_id": true,
            "access_token": 1.5,
        })))
        .unwrap();
        assert_eq!(cfg.organization_id.as_deref(), Some("true"));
        assert_eq!(
            cfg.access_token.as_ref().map(ExposeSecret::expose_secret),
            Some("1.5")
        );
    }

    #[test]
    fn from_figment_keeps_defaults_for_missing_keys() {
        let cfg = ValidicConfig::from_figment(figment_of(json!({
            "organization_id": "51aca5a06dedda916400002b",
            "access_token": "ENTERPRISE_KEY",
        })))
        .unwrap();

        assert_eq!(
            cfg.organization_id.as_deref(),
            Some("51aca5a06dedda916400002b")
        );
        assert_eq!(
            cfg.access_token.as_ref().map(ExposeSecret::expose_secret),
            Some("ENTERPRISE_KEY")
        );
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn from_figment_accepts_numeric_ids_and_durations() {
        let cfg = ValidicConfig::from_figment(figment_of(json!({
            "organization_id": 12345,
            "access_token": 987,
            "request_timeout": "1m 30s",
        })))
        .unwrap();
        assert_eq!(cfg.organization_id.as_deref(), Some("12345"));
        assert_eq!(
            cfg.access_token.as_ref().map(ExposeSecret::expose_secret),
            Some("987")
        );
        assert_eq!(cfg.request_timeout, Duration::from_secs(90));

        let cfg = ValidicConfig::from_figment(figment_of(json!({ "request_timeout": 5 }))).unwrap();
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn from_figment_rejects_bad_duration() {
        let result =
            ValidicConfig::from_figment(figment_of(json!({ "request_timeout": "soon" })));
        assert!(matches!(result, Err(ValidicError::Figment(_))));
    }

    #[test]
    fn debug_redacts_access_token() {
        let cfg = ValidicConfig {
            access_token: Some(SecretString::new(Box::from("super-secret-token"))),
            ..ValidicConfig::default()
        };
        let debug = format!("{cfg:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn clone_keeps_token() {
        let cfg = ValidicConfig {
            access_token: Some(SecretString::new(Box::from("tok"))),
            ..ValidicConfig::default()
        };
        let copy = cfg.clone();
        assert_eq!(
            copy.access_token.as_ref().map(ExposeSecret::expose_secret),
            Some("tok")
        );
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        for base_url in ["not a url", "ftp://api.validic.com", "https://api.validic.com/?x=1"] {
            let cfg = ValidicConfig {
                base_url: base_url.to_owned(),
                ..ValidicConfig::default()
            };
            assert!(
                matches!(cfg.validate(), Err(ValidicError::InvalidUrl { .. })),
                "{base_url} should be rejected"
            );
        }
    }

    #[test]
    fn validate_plain_http_needs_opt_in() {
        let cfg = ValidicConfig {
            base_url: "http://127.0.0.1:8080".to_owned(),
            ..ValidicConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ValidicError::InvalidUrl { .. })));

        let cfg = ValidicConfig {
            allow_insecure_http: true,
            ..cfg
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_api_version() {
        for api_version in ["", "  ", "v1/extra"] {
            let cfg = ValidicConfig {
                api_version: api_version.to_owned(),
                ..ValidicConfig::default()
            };
            assert!(matches!(cfg.validate(), Err(ValidicError::Config(_))));
        }
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let cfg = ValidicConfig {
            request_timeout: Duration::ZERO,
            ..ValidicConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ValidicError::Config(_))));

        let cfg = ValidicConfig {
            max_body_size: 0,
            ..ValidicConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ValidicError::Config(_))));
    }

    #[test]
    fn http_client_config_follows_settings() {
        let cfg = ValidicConfig {
            request_timeout: Duration::from_secs(7),
            max_body_size: 4096,
            user_agent: "my-app/2.0".to_owned(),
            allow_insecure_http: true,
            ..ValidicConfig::default()
        };
        let http = cfg.http_client_config();
        assert_eq!(http.request_timeout, Duration::from_secs(7));
        assert_eq!(http.max_body_size, 4096);
        assert_eq!(http.user_agent, "my-app/2.0");
        assert_eq!(http.transport, TransportSecurity::AllowInsecureHttp);

        let http = ValidicConfig::default().http_client_config();
        assert_eq!(http.transport, TransportSecurity::TlsOnly);
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let result = ValidicConfig::load(Some(Path::new("/definitely/not/here/validic.yaml")));
        assert!(matches!(result, Err(ValidicError::Config(msg)) if msg.contains("not found")));
    }
}
