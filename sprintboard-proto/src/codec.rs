//! JSON encoding for task service payloads.
//!
//! Every request and response body the service exchanges is plain JSON.
//! These helpers wrap `serde_json` so callers get a single [`CodecError`]
//! type regardless of direction.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::task::{ApiErrorBody, Task};

/// Error type for codec encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization failed.
    #[error("encode error: {0}")]
    Encode(String),
    /// The bytes are not a valid body of the expected shape.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Encodes any payload as a JSON body.
///
/// # Errors
///
/// Returns `CodecError::Encode` if the value cannot be serialized.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Decodes a JSON body into the expected payload type.
///
/// # Errors
///
/// Returns `CodecError::Decode` if the bytes are not valid JSON for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}

/// Decodes the body of a `list` response.
///
/// # Errors
///
/// Returns `CodecError::Decode` if the body is not a JSON array of tasks.
pub fn decode_task_list(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    decode(bytes)
}

/// Builds the error body the service returns for a failed request.
///
/// # Errors
///
/// Returns `CodecError::Encode` if serialization fails.
pub fn encode_error(message: &str) -> Result<Vec<u8>, CodecError> {
    encode(&ApiErrorBody {
        message: message.to_string(),
    })
}
