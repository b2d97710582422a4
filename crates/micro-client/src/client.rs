//! The service client
//!
//! A [`ServiceClient`] owns everything that is constant across calls to one
//! logical backend: its name, the base scheme/host, the default headers and
//! the persistent query values. Each request merges ad-hoc values over those
//! defaults, sends, and emits one `tracing` event with the outcome.
//!
//! Query values accumulate: extra pairs are added next to the defaults and
//! multiple values per key are kept in insertion order. Headers overwrite
//! by key: an extra header replaces the default for that name.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use url::{form_urlencoded, Url};

use crate::codec;
use crate::config::{host_var, scheme_var, ClientConfig};
use crate::envelope::Envelope;
use crate::error::ClientError;

/// Header carrying the opaque user token.
pub const USER_TOKEN_HEADER: &str = "x-user-token";

/// Header carrying the opaque API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// A retargetable service endpoint.
///
/// Anything exposing `set_url` can be pointed at a different scheme/host at
/// runtime. This is the whole capability the mock server needs to redirect a
/// client under test at its own ephemeral endpoint, so the mock side is
/// decoupled from any concrete client type.
pub trait Retarget {
    /// Repoint the endpoint at `scheme://host`. Path and query are never
    /// touched.
    fn set_url(&mut self, scheme: &str, host: &str);
}

/// Client for one micro service.
///
/// # Example
///
/// ```ignore
/// use micro_client::{ClientConfig, ServiceClient};
///
/// let client = ServiceClient::new(ClientConfig::new("user").user_token("..."));
/// client.health_check().await?;
/// ```
#[derive(Debug)]
pub struct ServiceClient {
    name: String,
    scheme: String,
    host: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    http: reqwest::Client,
}

impl ServiceClient {
    /// Create a client from `config`.
    ///
    /// The base scheme/host come from the config when set explicitly,
    /// otherwise from `<NAME>_SERVICE_SCHEME` / `<NAME>_SERVICE_HOST`, read
    /// once here. An unresolved endpoint is not an error yet; it surfaces as
    /// [`ClientError::UrlError`] on the first request.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a client with a caller-supplied `reqwest::Client`, for
    /// transport-level settings such as timeouts.
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        let (scheme, host) = config.resolve_endpoint();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.user_token {
            insert_opaque(&mut headers, USER_TOKEN_HEADER, token);
        }
        if let Some(key) = &config.api_key {
            insert_opaque(&mut headers, API_KEY_HEADER, key);
        }
        for (name, value) in config.headers.iter() {
            headers.insert(name, value.clone());
        }

        Self {
            name: config.name,
            scheme,
            host,
            headers,
            query: config.query,
            http,
        }
    }

    /// The service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base URL as currently configured, `scheme://host`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }

    /// Repoint the client at `scheme://host` in place. Chiefly used by the
    /// mock server to redirect a client under test.
    pub fn set_url(&mut self, scheme: &str, host: &str) {
        self.scheme = scheme.to_string();
        self.host = host.to_string();
    }

    /// Write the client's current scheme/host back into the environment
    /// variables it would have read at construction, so other components
    /// reading the same variables discover a dynamically bound endpoint.
    pub fn set_env(&self) {
        std::env::set_var(scheme_var(&self.name), &self.scheme);
        std::env::set_var(host_var(&self.name), &self.host);
    }

    /// Build and send one request.
    ///
    /// `extra_query` pairs are added next to the persistent defaults;
    /// `extra_headers` overwrite the defaults by key. The assembled request
    /// is sent without retries, and one `tracing` event records the outcome
    /// (status on success, the transport error otherwise).
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        extra_query: &[(&str, &str)],
        extra_headers: HeaderMap,
        body: Option<String>,
    ) -> Result<Response, ClientError> {
        let url = self.build_url(path, extra_query)?;
        let headers = self.merge_headers(extra_headers);

        let mut request = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        match request.send().await {
            Ok(response) => {
                tracing::info!(
                    service = %self.name,
                    method = %method,
                    url = %url,
                    status = response.status().as_u16(),
                    "service request"
                );
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(
                    service = %self.name,
                    method = %method,
                    url = %url,
                    error = %err,
                    "service request failed"
                );
                Err(ClientError::RequestError(err))
            }
        }
    }

    /// Ping `GET /` and decode the standard envelope.
    ///
    /// Succeeds only when the service answers 200 with a decodable envelope.
    /// A non-200 answer becomes [`ClientError::StatusError`] carrying the
    /// envelope's `errors`; a decode failure propagates as the codec error.
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self
            .request(Method::GET, "/", &[], HeaderMap::new(), None)
            .await?;
        let decoded = codec::decode::<Envelope>(response).await?;
        if decoded.status != StatusCode::OK {
            return Err(ClientError::StatusError {
                status: decoded.status.as_u16(),
                errors: decoded.value.errors,
            });
        }
        Ok(())
    }

    /// Resolve `path` + merged query against the base URL.
    ///
    /// The merged pairs are stably sorted by key before encoding, so the
    /// encoded query is deterministic and per-key insertion order survives.
    fn build_url(&self, path: &str, extra_query: &[(&str, &str)]) -> Result<Url, ClientError> {
        let base = self.base_url();
        let mut url =
            Url::parse(&base).map_err(|source| ClientError::UrlError { url: base, source })?;
        url.set_path(path);

        let mut pairs = self.query.clone();
        pairs.extend(
            extra_query
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        );
        if !pairs.is_empty() {
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            let mut encoded = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &pairs {
                encoded.append_pair(key, value);
            }
            url.set_query(Some(&encoded.finish()));
        }
        Ok(url)
    }

    fn merge_headers(&self, extra: HeaderMap) -> HeaderMap {
        let mut merged = self.headers.clone();
        for (name, value) in extra.iter() {
            merged.insert(name, value.clone());
        }
        merged
    }
}

impl Retarget for ServiceClient {
    fn set_url(&mut self, scheme: &str, host: &str) {
        ServiceClient::set_url(self, scheme, host);
    }
}

/// Insert an opaque credential as a header value, skipping it with a warning
/// when it contains characters that are not legal in a header.
fn insert_opaque(headers: &mut HeaderMap, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.insert(HeaderName::from_static(name), value);
        }
        Err(_) => {
            tracing::warn!(header = name, "credential contains invalid header characters, not set");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ServiceClient {
        ServiceClient::new(ClientConfig::new("testsvc").url("http", "localhost:8000"))
    }

    #[test]
    fn test_default_headers_contain_content_type() {
        let client = client();
        assert_eq!(
            client.headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_credentials_become_headers() {
        let client = ServiceClient::new(
            ClientConfig::new("testsvc")
                .url("http", "localhost:8000")
                .user_token("token-a")
                .api_key("key-b"),
        );
        assert_eq!(client.headers.get(USER_TOKEN_HEADER).unwrap(), "token-a");
        assert_eq!(client.headers.get(API_KEY_HEADER).unwrap(), "key-b");
    }

    #[test]
    fn test_query_merge_is_additive() {
        let client = ServiceClient::new(
            ClientConfig::new("testsvc")
                .url("http", "localhost:8000")
                .query("a", "1"),
        );
        let url = client.build_url("/items", &[("a", "2")]).unwrap();
        assert_eq!(url.query(), Some("a=1&a=2"));
    }

    #[test]
    fn test_query_keys_sort_alphabetically() {
        let client = ServiceClient::new(
            ClientConfig::new("testsvc")
                .url("http", "localhost:8000")
                .query("zeta", "26"),
        );
        let url = client.build_url("/", &[("alpha", "1")]).unwrap();
        assert_eq!(url.query(), Some("alpha=1&zeta=26"));
    }

    #[test]
    fn test_query_encoding_uses_plus_for_space() {
        let url = client().build_url("/", &[("q", "a b&c")]).unwrap();
        assert_eq!(url.query(), Some("q=a+b%26c"));
    }

    #[test]
    fn test_no_query_leaves_url_bare() {
        let url = client().build_url("/user/-", &[]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/user/-");
    }

    #[test]
    fn test_header_merge_overwrites_by_key() {
        let client = client();
        let mut extra = HeaderMap::new();
        extra.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let merged = client.merge_headers(extra);
        assert_eq!(merged.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(merged.get_all(CONTENT_TYPE).iter().count(), 1);
    }

    #[test]
    fn test_set_url_retargets_base() {
        let mut client = client();
        client.set_url("https", "10.0.0.1:9999");
        assert_eq!(client.base_url(), "https://10.0.0.1:9999");
    }

    #[test]
    fn test_unresolved_endpoint_is_a_url_error() {
        let client = ServiceClient::new(ClientConfig::new("neverconfigured"));
        let err = client.build_url("/", &[]).unwrap_err();
        assert!(matches!(err, ClientError::UrlError { .. }));
    }

    #[test]
    fn test_set_env_writes_back() {
        let mut client = ServiceClient::new(ClientConfig::new("envwriteback"));
        client.set_url("http", "127.0.0.1:4242");
        client.set_env();
        assert_eq!(
            std::env::var("ENVWRITEBACK_SERVICE_SCHEME").unwrap(),
            "http"
        );
        assert_eq!(
            std::env::var("ENVWRITEBACK_SERVICE_HOST").unwrap(),
            "127.0.0.1:4242"
        );
    }
}
