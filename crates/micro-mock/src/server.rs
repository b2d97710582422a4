//! The mock server
//!
//! Binds an ephemeral loopback endpoint, points a client under test at it
//! via the [`Retarget`] trait, and answers every inbound request from the
//! [`ExchangeQueue`]. Traffic is expected to be sequential; the queue sits
//! behind a mutex so concurrent requests cannot corrupt the replay order
//! (they serialize, and a poisoned lock panics rather than misorder).

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Router;
use micro_client::Retarget;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::exchange::{Exchange, ExchangeQueue, ExhaustedError, MockResponse, RecordedRequest};

type SharedQueue = Arc<Mutex<ExchangeQueue>>;

/// In-process HTTP server replaying queued [`Exchange`]s.
///
/// # Example
///
/// ```ignore
/// use micro_client::{ClientConfig, ServiceClient};
/// use micro_mock::{Exchange, MockResponse, MockServer};
///
/// let mut client = ServiceClient::new(ClientConfig::new("user"));
/// let server = MockServer::start(&mut client).await;
/// server.append(Exchange::new(MockResponse::new(
///     200,
///     r#"{"message":"ok","data":{},"errors":{}}"#,
/// )));
/// client.health_check().await?;
/// assert_eq!(server.transmissions(), 1);
/// ```
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    queue: SharedQueue,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind an ephemeral loopback endpoint and retarget `target` at it.
    ///
    /// Only the target's scheme and host are rewritten; path and query are
    /// left alone.
    pub async fn start<T: Retarget>(target: &mut T) -> Self {
        let server = Self::bind().await;
        target.set_url(server.scheme(), &server.host());
        server
    }

    /// Bind an ephemeral loopback endpoint without retargeting anything.
    ///
    /// For wiring via explicit configuration: feed [`scheme`](Self::scheme)
    /// and [`host`](Self::host) into a client config instead.
    pub async fn bind() -> Self {
        let queue: SharedQueue = Arc::default();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock server listener");
        let addr = listener.local_addr().expect("mock server has no local addr");

        let app = Router::new().fallback(handle).with_state(queue.clone());
        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                tracing::error!(error = %err, "mock server terminated");
            }
        });

        Self {
            addr,
            queue,
            handle,
        }
    }

    /// Scheme of the bound endpoint.
    pub fn scheme(&self) -> &'static str {
        "http"
    }

    /// Host (address:port) of the bound endpoint.
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    /// Full base URI of the bound endpoint.
    pub fn uri(&self) -> String {
        format!("{}://{}", self.scheme(), self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queue an exchange; requests are answered in append order.
    pub fn append(&self, exchange: Exchange) {
        self.queue.lock().unwrap().append(exchange);
    }

    /// Number of exchanges consumed so far.
    pub fn transmissions(&self) -> usize {
        self.queue.lock().unwrap().transmissions()
    }

    /// Snapshot of the exchange at `index`, including the recorded request
    /// once it has been consumed.
    pub fn exchange(&self, index: usize) -> Option<Exchange> {
        self.queue.lock().unwrap().exchange(index).cloned()
    }

    /// Stop the server and release the bound endpoint.
    ///
    /// Dropping the server has the same effect, so a test that panics mid-
    /// assertion still releases its endpoint.
    pub fn stop(self) {}
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Catch-all handler: record the inbound request, consume the next queued
/// exchange and replay its response.
async fn handle(State(queue): State<SharedQueue>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap_or_default();

    let recorded = RecordedRequest {
        method: parts.method.to_string(),
        uri: parts.uri.to_string(),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: body.to_vec(),
    };

    tracing::debug!(method = %recorded.method, uri = %recorded.uri, "mock exchange");

    let consumed = queue.lock().unwrap().consume(recorded);
    match consumed {
        Ok(mock) => replay(mock),
        Err(err) => exhausted(&err),
    }
}

/// Write the queued response back: status, headers (first value per key),
/// body bytes.
fn replay(mock: MockResponse) -> Response {
    let status = StatusCode::from_u16(mock.status).unwrap_or_else(|_| {
        tracing::warn!(status = mock.status, "invalid mock status code, answering 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut headers = HeaderMap::new();
    for (name, value) in &mock.headers {
        let Ok(name) = name.parse::<HeaderName>() else {
            tracing::warn!(header = %name, "invalid mock header name, skipped");
            continue;
        };
        let Ok(value) = HeaderValue::from_str(value) else {
            tracing::warn!(header = %name, "invalid mock header value, skipped");
            continue;
        };
        if !headers.contains_key(&name) {
            headers.insert(name, value);
        }
    }

    let mut response = Response::new(Body::from(mock.body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// Answer an underrun with a 500 envelope instead of tearing the process
/// down, so the client under test observes an error value.
fn exhausted(err: &ExhaustedError) -> Response {
    tracing::error!(error = %err, "mock exchange queue exhausted");

    let body = serde_json::json!({
        "message": "mock exchange queue exhausted",
        "data": {},
        "errors": { "transmission": [err.to_string()] },
    })
    .to_string();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}
