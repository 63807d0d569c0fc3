use crate::domain::entities::{StoredRecord, SyncQueueDraft, SyncQueueEntry};
use crate::domain::value_objects::{EntityKind, RecordId, SyncQueueId};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// Row counts from one hydration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HydrationWrite {
    pub cleared: u64,
    pub written: u64,
}

/// Per-kind record tables.
///
/// Every local mutation takes the queue draft describing it and commits both in
/// one transaction, so a record change and its queue entry exist together or
/// not at all.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records of `kind` in storage-insertion order.
    async fn list_records(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, AppError>;
    async fn find_record(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<StoredRecord>, AppError>;
    /// Fails with `InvalidInput` when the id is already taken.
    async fn insert_record(
        &self,
        record: &StoredRecord,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError>;
    /// Fails with `NotFound` when the record does not exist.
    async fn replace_record(
        &self,
        record: &StoredRecord,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError>;
    async fn delete_record(
        &self,
        kind: EntityKind,
        id: &RecordId,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError>;
    /// Upserts without touching the queue.
    async fn bulk_save(&self, kind: EntityKind, records: &[StoredRecord]) -> Result<(), AppError>;
    async fn clear_records(&self, kind: EntityKind) -> Result<(), AppError>;
    /// In one transaction, drops settled records and writes the remote set as
    /// synced. Rows with local changes or queued entries are left untouched.
    async fn replace_synced(
        &self,
        kind: EntityKind,
        records: &[StoredRecord],
    ) -> Result<HydrationWrite, AppError>;
    async fn unsynced_ids(&self, kind: EntityKind) -> Result<Vec<RecordId>, AppError>;
}

#[async_trait]
pub trait SyncQueueStore: Send + Sync {
    async fn enqueue(&self, draft: &SyncQueueDraft) -> Result<SyncQueueId, AppError>;
    /// Every pending entry, ascending by id.
    async fn drain(&self) -> Result<Vec<SyncQueueEntry>, AppError>;
    async fn dequeue_one(&self, id: SyncQueueId) -> Result<(), AppError>;
    async fn count(&self) -> Result<u64, AppError>;
    /// Records a confirmed remote application in one transaction: removes the
    /// entry, moves the record to `server_id` (rewriting queued entries) when the
    /// remote issued a different id, and marks the record synced once no other
    /// entry for it remains.
    async fn acknowledge(
        &self,
        entry: &SyncQueueEntry,
        server_id: Option<&RecordId>,
    ) -> Result<(), AppError>;
    async fn record_failure(&self, id: SyncQueueId, message: &str) -> Result<(), AppError>;
    async fn clear_queue(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_metadata(&self, key: &str) -> Result<Option<Value>, AppError>;
    async fn set_metadata(&self, key: &str, value: &Value) -> Result<(), AppError>;
    async fn clear_metadata(&self) -> Result<(), AppError>;
}
