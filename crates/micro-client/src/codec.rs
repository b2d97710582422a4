//! Response body decoding
//!
//! Every response coming back from a micro service is read through this
//! module so that failures are reported uniformly. [`read_bytes`] surfaces
//! the raw payload regardless of content; [`decode`] additionally parses it
//! as JSON. On parse failure the raw bytes are not returned; only
//! [`read_bytes`] hands out bytes unconditionally.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// A fully read and deserialized response.
///
/// The raw body travels alongside the typed value so callers can log the
/// exact payload the service produced.
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub value: T,
}

/// Read the entire response body into memory.
///
/// Returns the status and raw bytes even when the body is not valid JSON.
/// Fails with [`ClientError::ReadError`] if the underlying stream errors; the
/// connection is released when the response is consumed, on every path.
pub async fn read_bytes(response: Response) -> Result<(StatusCode, Vec<u8>), ClientError> {
    let status = response.status();
    let body = response.bytes().await.map_err(ClientError::ReadError)?;
    Ok((status, body.to_vec()))
}

/// Read the response body and deserialize it as JSON into `T`.
///
/// On parse failure returns [`ClientError::UnmarshalError`] carrying the parser
/// message; the bytes are not returned in that case. Callers that need the
/// offending payload use [`read_bytes`] instead.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<Decoded<T>, ClientError> {
    let (status, body) = read_bytes(response).await?;
    let value = serde_json::from_slice(&body)?;
    Ok(Decoded {
        status,
        body,
        value,
    })
}
