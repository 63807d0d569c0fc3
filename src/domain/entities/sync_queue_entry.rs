use crate::domain::value_objects::{
    EntityKind, RecordId, RecordPatch, RecordPayload, SyncAction, SyncQueueId,
};
use serde::{Deserialize, Serialize};

/// A mutation waiting for remote acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    pub id: SyncQueueId,
    pub action: SyncAction,
    pub store: EntityKind,
    pub record_id: RecordId,
    pub data: RecordPayload,
    pub timestamp: i64,
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl SyncQueueEntry {
    pub fn target(&self) -> (EntityKind, RecordId) {
        (self.store, self.record_id.clone())
    }

    /// Rewrites the entry so it addresses `new_id`.
    pub fn retarget(&mut self, new_id: &RecordId) {
        self.record_id = new_id.clone();
        self.data = self.data.with_id(new_id);
    }
}

/// Queue entry before the store assigns its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncQueueDraft {
    pub action: SyncAction,
    pub store: EntityKind,
    pub record_id: RecordId,
    pub data: RecordPayload,
    pub timestamp: i64,
}

impl SyncQueueDraft {
    /// Carries the full record.
    pub fn create(
        store: EntityKind,
        payload: &RecordPayload,
        record_id: &RecordId,
        timestamp: i64,
    ) -> Self {
        Self {
            action: SyncAction::Create,
            store,
            record_id: record_id.clone(),
            data: payload.with_id(record_id),
            timestamp,
        }
    }

    /// Carries `{id, ...patch}`, never the merged record.
    pub fn update(
        store: EntityKind,
        record_id: &RecordId,
        patch: &RecordPatch,
        timestamp: i64,
    ) -> Self {
        Self {
            action: SyncAction::Update,
            store,
            record_id: record_id.clone(),
            data: patch.to_payload(record_id),
            timestamp,
        }
    }

    /// Carries `{id}`.
    pub fn delete(store: EntityKind, record_id: &RecordId, timestamp: i64) -> Self {
        Self {
            action: SyncAction::Delete,
            store,
            record_id: record_id.clone(),
            data: RecordPayload::identity(record_id),
            timestamp,
        }
    }
}
