//! # Micro Client
//!
//! HTTP client layer for talking to micro services.
//!
//! This crate provides:
//! - A [`ServiceClient`] owning the base URL, default headers and persistent
//!   query values for one logical backend
//! - Uniform response decoding ([`decode`], [`read_bytes`]) that surfaces
//!   raw bytes alongside typed JSON values
//! - The standard `{message, data, errors}` response [`Envelope`]
//! - The [`Retarget`] capability trait that lets the companion `micro-mock`
//!   crate redirect any client at an in-process mock server
//!
//! ## Example
//!
//! ```ignore
//! use micro_client::{ClientConfig, ServiceClient};
//!
//! // Reads USER_SERVICE_SCHEME / USER_SERVICE_HOST once, here.
//! let client = ServiceClient::new(ClientConfig::new("user").user_token("eyJ0eXAi..."));
//! client.health_check().await?;
//! ```

mod client;
mod codec;
mod config;
mod envelope;
mod error;

pub use client::{Retarget, ServiceClient, API_KEY_HEADER, USER_TOKEN_HEADER};
pub use codec::{decode, read_bytes, Decoded};
pub use config::{host_var, scheme_var, ClientConfig};
pub use envelope::{Envelope, ErrorMap};
pub use error::ClientError;
