//! The mock exchange queue
//!
//! An [`Exchange`] is one request/response pair: the response is supplied by
//! the test ahead of time, the request is filled in by the mock server when
//! the exchange is consumed. The [`ExchangeQueue`] replays exchanges strictly
//! first-in-first-out, so the k-th request a test triggers is answered by the
//! k-th exchange it appended, and is recorded there for later assertions.

use thiserror::Error;

/// Returned when a request arrives after every queued exchange has been
/// consumed. The cursor never resets, so this also fires for every
/// subsequent request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Mock exchange queue exhausted after {transmissions} transmissions")]
pub struct ExhaustedError {
    pub transmissions: usize,
}

/// A canned response to be replayed by the mock server.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Add a response header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The request the mock server actually received, captured for assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Request target as sent: path plus query string.
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// First value of the named header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response queued by the test, paired with the request that consumed it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub response: MockResponse,
    /// Populated when the exchange is consumed; `None` until then.
    pub request: Option<RecordedRequest>,
}

impl Exchange {
    pub fn new(response: MockResponse) -> Self {
        Self {
            response,
            request: None,
        }
    }
}

/// Ordered, consume-once queue of exchanges.
#[derive(Debug, Default)]
pub struct ExchangeQueue {
    exchanges: Vec<Exchange>,
    transmission: usize,
}

impl ExchangeQueue {
    /// Append an exchange to the tail. Requests are answered in append
    /// order.
    pub fn append(&mut self, exchange: Exchange) {
        self.exchanges.push(exchange);
    }

    /// Bind `request` to the exchange at the cursor, advance the cursor and
    /// return the queued response. Fails with [`ExhaustedError`] once every
    /// exchange has been consumed.
    pub fn consume(&mut self, request: RecordedRequest) -> Result<MockResponse, ExhaustedError> {
        let Some(exchange) = self.exchanges.get_mut(self.transmission) else {
            return Err(ExhaustedError {
                transmissions: self.transmission,
            });
        };
        exchange.request = Some(request);
        self.transmission += 1;
        Ok(exchange.response.clone())
    }

    /// Number of exchanges consumed so far.
    pub fn transmissions(&self) -> usize {
        self.transmission
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// The exchange at `index`, consumed or not.
    pub fn exchange(&self, index: usize) -> Option<&Exchange> {
        self.exchanges.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> RecordedRequest {
        RecordedRequest {
            method: "GET".to_string(),
            uri: uri.to_string(),
            headers: vec![("x-test".to_string(), "yes".to_string())],
            body: Vec::new(),
        }
    }

    #[test]
    fn test_consume_is_fifo() {
        let mut queue = ExchangeQueue::default();
        queue.append(Exchange::new(MockResponse::new(200, "first")));
        queue.append(Exchange::new(MockResponse::new(201, "second")));

        let first = queue.consume(request("/one")).unwrap();
        let second = queue.consume(request("/two")).unwrap();
        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
    }

    #[test]
    fn test_consume_records_the_request_in_order() {
        let mut queue = ExchangeQueue::default();
        queue.append(Exchange::new(MockResponse::new(200, "a")));
        queue.append(Exchange::new(MockResponse::new(200, "b")));

        queue.consume(request("/first")).unwrap();
        queue.consume(request("/second")).unwrap();

        assert_eq!(queue.exchange(0).unwrap().request.as_ref().unwrap().uri, "/first");
        assert_eq!(queue.exchange(1).unwrap().request.as_ref().unwrap().uri, "/second");
    }

    #[test]
    fn test_exactly_n_consumes_then_exhausted() {
        let mut queue = ExchangeQueue::default();
        for _ in 0..3 {
            queue.append(Exchange::new(MockResponse::new(200, "ok")));
        }

        for _ in 0..3 {
            assert!(queue.consume(request("/")).is_ok());
        }
        let err = queue.consume(request("/")).unwrap_err();
        assert_eq!(err, ExhaustedError { transmissions: 3 });
        // the cursor never resets
        assert!(queue.consume(request("/")).is_err());
        assert_eq!(queue.transmissions(), 3);
    }

    #[test]
    fn test_empty_queue_is_exhausted_immediately() {
        let mut queue = ExchangeQueue::default();
        let err = queue.consume(request("/")).unwrap_err();
        assert_eq!(err.transmissions, 0);
    }

    #[test]
    fn test_appending_after_consume_extends_the_tail() {
        let mut queue = ExchangeQueue::default();
        queue.append(Exchange::new(MockResponse::new(200, "a")));
        queue.consume(request("/")).unwrap();

        queue.append(Exchange::new(MockResponse::new(202, "b")));
        let next = queue.consume(request("/")).unwrap();
        assert_eq!(next.status, 202);
        assert_eq!(queue.transmissions(), 2);
    }

    #[test]
    fn test_recorded_request_header_lookup_is_case_insensitive() {
        let request = request("/");
        assert_eq!(request.header("X-Test"), Some("yes"));
        assert_eq!(request.header("missing"), None);
    }
}
