//! The response envelope shared by all micro services

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyed lists of error messages, as carried in the envelope's `errors`
/// field. Empty when the request succeeded.
pub type ErrorMap = HashMap<String, Vec<String>>;

/// Standard response envelope produced by every micro service endpoint.
///
/// `data` is endpoint-specific; it defaults to [`serde_json::Value`] so
/// callers that only care about `message`/`errors` (such as the health
/// check) can decode without naming a schema. Every field is optional on
/// the wire: an error envelope that omits `data` still decodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct Envelope<T = Value> {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: T,
    #[serde(default)]
    pub errors: ErrorMap,
}
