//! Snapshot payload codec
//!
//! Each sorted-set member is a compact JSON record:
//!
//! ```text
//! {"2xx":12,"3xx":0,"4xx":1,"5xx":0,"id":"8d0c1f0e-..."}
//! ```
//!
//! The `id` makes every member unique so that the sorted set, which holds a
//! set of members, keeps two snapshots with identical counters as two
//! entries. Decoding ignores `id` and any other unknown field, and accepts
//! records written without one.

use crate::error::{Error, Result};
use crate::types::CounterSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire form of one snapshot member
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    #[serde(flatten)]
    counters: CounterSet,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
}

/// Encoder/decoder for snapshot members
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotCodec;

impl SnapshotCodec {
    /// Encode counters as a new, unique member payload
    pub fn encode(value: &CounterSet) -> Result<Vec<u8>> {
        let record = SnapshotRecord {
            counters: *value,
            id: Some(Uuid::new_v4().to_string()),
        };
        serde_json::to_vec(&record).map_err(|e| Error::Encode(e.to_string()))
    }

    /// Decode a member payload back into counters
    pub fn decode(payload: &[u8]) -> Result<CounterSet> {
        serde_json::from_slice::<SnapshotRecord>(payload)
            .map(|record| record.counters)
            .map_err(|e| Error::Decode(format!("invalid snapshot payload: {}", e)))
    }

    /// Decode every payload, aborting on the first malformed one
    pub fn decode_all<I, P>(payloads: I) -> Result<Vec<CounterSet>>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        payloads
            .into_iter()
            .map(|payload| Self::decode(payload.as_ref()))
            .collect()
    }
}

/// Serialize a structured value for scalar storage
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| Error::Encode(e.to_string()))
}

/// Deserialize a structured value read from scalar storage
pub fn from_json_bytes<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    serde_json::from_slice(payload).map_err(|e| Error::Decode(e.to_string()))
}
