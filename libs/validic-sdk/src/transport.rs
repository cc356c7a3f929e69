//! The seam between user operations and the network.
//!
//! [`UserResource`](crate::UserResource) only ever talks to a [`Transport`];
//! [`HttpTransport`] is the implementation used by [`Validic::new`](crate::Validic::new).

use async_trait::async_trait;
use serde_json::Value;
use url::Url;
use validic_http::{HttpClient, HttpClientBuilder, Method};

use crate::config::ValidicConfig;
use crate::error::ValidicError;

/// Request parameters: a flat JSON object, possibly with nested objects.
pub type Params = serde_json::Map<String, Value>;

/// Performs one HTTP request per call and returns the parsed response.
///
/// `path` is absolute (`/v1/me.json`) and relative to the configured base URL.
/// GET and DELETE carry `params` in the query string, POST and PUT as a JSON body.
/// `Ok(None)` means the call succeeded without a response value.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    /// Returns the transport or HTTP failure
    async fn get(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError>;

    /// # Errors
    /// Returns the transport or HTTP failure
    async fn post(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError>;

    /// # Errors
    /// Returns the transport or HTTP failure
    async fn put(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError>;

    /// # Errors
    /// Returns the transport or HTTP failure
    async fn delete(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError>;
}

/// [`Transport`] over [`validic_http::HttpClient`].
#[derive(Clone)]
pub struct HttpTransport {
    client: HttpClient,
    base_url: String,
}

impl HttpTransport {
    /// Build an HTTP client from `config`.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns `ValidicError` if the configuration is invalid or the client cannot be built
    pub fn new(config: &ValidicConfig) -> Result<Self, ValidicError> {
        config.validate()?;
        let client = HttpClientBuilder::with_config(config.http_client_config()).build()?;
        Self::with_client(client, &config.base_url)
    }

    /// Use an existing client.
    ///
    /// # Errors
    /// Returns `ValidicError::InvalidUrl` if `base_url` does not parse
    pub fn with_client(client: HttpClient, base_url: &str) -> Result<Self, ValidicError> {
        Url::parse(base_url).map_err(|e| ValidicError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str, query: Option<&Params>) -> Result<Url, ValidicError> {
        let raw = format!("{}{path}", self.base_url);
        let mut url = Url::parse(&raw).map_err(|e| ValidicError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        if let Some(params) = query {
            let pairs = encode_query(params);
            if !pairs.is_empty() {
                let encoded =
                    serde_urlencoded::to_string(&pairs).map_err(|e| ValidicError::InvalidUrl {
                        url: raw,
                        reason: e.to_string(),
                    })?;
                url.set_query(Some(&encoded));
            }
        }
        Ok(url)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<Option<Value>, ValidicError> {
        let has_body = method == Method::POST || method == Method::PUT;
        let url = self.url(path, (!has_body).then_some(params))?;

        let mut request = self
            .client
            .request(method.clone(), url.as_str())
            .header("accept", "application/json");
        if has_body {
            request = request.json(params)?;
        }

        let response = request.send().await.inspect_err(|e| {
            tracing::debug!(%method, path, error = %e, "validic request failed");
        })?;
        let status = response.status();
        tracing::debug!(%method, path, status = status.as_u16(), "validic response");

        let body = response.checked_bytes().await?;
        parse_body(&body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError> {
        self.execute(Method::GET, path, params).await
    }

    async fn post(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError> {
        self.execute(Method::POST, path, params).await
    }

    async fn put(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError> {
        self.execute(Method::PUT, path, params).await
    }

    async fn delete(&self, path: &str, params: &Params) -> Result<Option<Value>, ValidicError> {
        self.execute(Method::DELETE, path, params).await
    }
}

/// An empty body and a literal `null` both mean "no value".
fn parse_body(body: &[u8]) -> Result<Option<Value>, ValidicError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    match serde_json::from_slice(body)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

/// Flatten `params` into query pairs.
///
/// `null` values are dropped, nested objects use `key[child]` and arrays use
/// `key[]`, the convention the Validic API reads.
#[must_use]
pub fn encode_query(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((key, b.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for item in items {
                flatten(format!("{key}[]"), item, out);
            }
        }
        Value::Object(map) => {
            for (child, item) in map {
                flatten(format!("{key}[{child}]"), item, out);
            }
        }
    }
}
