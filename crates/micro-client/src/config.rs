//! Client configuration
//!
//! A [`ClientConfig`] is an explicit value describing everything a
//! [`ServiceClient`](crate::ServiceClient) needs at construction time. The
//! process environment is only consulted as a fallback when no explicit
//! scheme/host were supplied, and it is read exactly once; the resulting
//! client never watches the environment afterwards.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Configuration for constructing a [`ServiceClient`](crate::ServiceClient).
///
/// # Example
///
/// ```ignore
/// use micro_client::{ClientConfig, ServiceClient};
///
/// let config = ClientConfig::new("user")
///     .user_token("eyJ0eXAi...")
///     .url("http", "localhost:8000");
/// let client = ServiceClient::new(config);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Service name; identifies the service in log events and derives the
    /// `<NAME>_SERVICE_SCHEME` / `<NAME>_SERVICE_HOST` variable names.
    pub name: String,
    /// Opaque user token, sent as the `x-user-token` header when set.
    pub user_token: Option<String>,
    /// Opaque API key, sent as the `x-api-key` header when set.
    pub api_key: Option<String>,
    /// Additional default headers, merged over the built-in ones.
    pub headers: HeaderMap,
    /// Persistent query values merged into every request.
    pub query: Vec<(String, String)>,
    /// Explicit scheme override; takes precedence over the environment.
    pub scheme: Option<String>,
    /// Explicit host override; takes precedence over the environment.
    pub host: Option<String>,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the user token carried on every request.
    pub fn user_token(mut self, token: impl Into<String>) -> Self {
        self.user_token = Some(token.into());
        self
    }

    /// Set the API key carried on every request.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point the client at an explicit endpoint instead of the environment.
    pub fn url(mut self, scheme: impl Into<String>, host: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self.host = Some(host.into());
        self
    }

    /// Add a default header sent on every request.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a persistent query value merged into every request.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Resolve the base scheme/host: explicit overrides win, otherwise the
    /// service's environment variables are read (once, here).
    pub(crate) fn resolve_endpoint(&self) -> (String, String) {
        let scheme = self
            .scheme
            .clone()
            .unwrap_or_else(|| std::env::var(scheme_var(&self.name)).unwrap_or_default());
        let host = self
            .host
            .clone()
            .unwrap_or_else(|| std::env::var(host_var(&self.name)).unwrap_or_default());
        (scheme, host)
    }
}

/// Name of the environment variable holding the service scheme.
pub fn scheme_var(name: &str) -> String {
    format!("{}_SERVICE_SCHEME", name.to_uppercase())
}

/// Name of the environment variable holding the service host.
pub fn host_var(name: &str) -> String {
    format!("{}_SERVICE_HOST", name.to_uppercase())
}
