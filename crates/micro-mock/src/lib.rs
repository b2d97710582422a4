//! # Micro Mock
//!
//! In-process mock server for testing micro service clients without real
//! network dependencies.
//!
//! This crate provides:
//! - An ordered [`ExchangeQueue`] of request/response pairs, replayed
//!   first-in-first-out and recording each request actually received
//! - A [`MockServer`] that binds an ephemeral loopback endpoint and
//!   redirects any [`Retarget`](micro_client::Retarget) client at it
//!
//! Once every queued exchange is consumed, further requests are answered
//! with a 500 envelope describing the underrun. The test process never
//! aborts, so "unexpected extra call" scenarios are assertable.
//!
//! ## Example
//!
//! ```ignore
//! use micro_client::{ClientConfig, ServiceClient};
//! use micro_mock::{Exchange, MockResponse, MockServer};
//!
//! let mut client = ServiceClient::new(ClientConfig::new("user"));
//! let server = MockServer::start(&mut client).await;
//!
//! server.append(Exchange::new(MockResponse::new(
//!     200,
//!     r#"{"message":"ok","data":{"alive":true},"errors":{}}"#,
//! )));
//!
//! client.health_check().await?;
//! let sent = server.exchange(0).unwrap().request.unwrap();
//! assert_eq!(sent.uri, "/");
//! ```

mod exchange;
mod server;

pub use exchange::{Exchange, ExchangeQueue, ExhaustedError, MockResponse, RecordedRequest};
pub use server::MockServer;
