//! Host log entries.
//!
//! State-changing operations may emit entries into the host's log. The
//! provisioning transaction surfaces its resulting addresses this way:
//! callers decode the last entry instead of polling component state.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Address;

/// An entry in the host's event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Who emitted the entry.
    pub emitter: Address,

    /// Opaque CBOR payload.
    pub data: Bytes,
}

impl LogEntry {
    /// Create a new log entry.
    pub fn new(emitter: Address, data: Bytes) -> Self {
        Self { emitter, data }
    }
}

/// Encode a two-address tuple as a CBOR log payload.
pub fn encode_address_pair(first: &Address, second: &Address) -> Bytes {
    let mut buf = Vec::new();
    ciborium::into_writer(&(first, second), &mut buf).expect("CBOR serialization failed");
    Bytes::from(buf)
}

/// Decode a two-address tuple from a CBOR log payload.
pub fn decode_address_pair(data: &[u8]) -> Result<(Address, Address), CoreError> {
    ciborium::from_reader(data).map_err(|e| CoreError::DecodingError(e.to_string()))
}
