use crate::domain::value_objects::{EntityKind, RecordId, RecordPayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record as persisted locally: bare payload plus sync bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub kind: EntityKind,
    pub id: RecordId,
    pub payload: RecordPayload,
    pub synced: bool,
    /// Milliseconds since the epoch of the latest local mutation.
    pub last_modified: i64,
}

impl StoredRecord {
    pub fn dirty(
        kind: EntityKind,
        id: RecordId,
        payload: RecordPayload,
        last_modified: i64,
    ) -> Self {
        Self {
            kind,
            id,
            payload,
            synced: false,
            last_modified,
        }
    }

    pub fn synced(
        kind: EntityKind,
        id: RecordId,
        payload: RecordPayload,
        last_modified: i64,
    ) -> Self {
        Self {
            kind,
            id,
            payload,
            synced: true,
            last_modified,
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        self.payload.decode()
    }
}
