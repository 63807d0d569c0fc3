use super::rows::{RecordRow, SyncQueueRow};
use crate::domain::entities::{StoredRecord, SyncQueueEntry};
use crate::domain::value_objects::{
    EntityKind, RecordId, RecordPayload, SyncAction, SyncQueueId,
};
use crate::shared::error::AppError;

fn corrupt(what: &str, detail: String) -> AppError {
    AppError::Storage(format!("corrupt {what}: {detail}"))
}

pub(super) fn record_from_row(kind: EntityKind, row: RecordRow) -> Result<StoredRecord, AppError> {
    let id = RecordId::new(row.id).map_err(|e| corrupt("record id", e))?;
    let payload = RecordPayload::from_json_str(&row.payload)
        .map_err(|e| corrupt(&format!("{kind} record {id}"), e))?;

    Ok(StoredRecord {
        kind,
        id,
        payload,
        synced: row.synced,
        last_modified: row.last_modified,
    })
}

pub(super) fn queue_entry_from_row(row: SyncQueueRow) -> Result<SyncQueueEntry, AppError> {
    let id = SyncQueueId::new(row.id).map_err(|e| corrupt("sync queue id", e))?;
    let action = row
        .action
        .parse::<SyncAction>()
        .map_err(|e| corrupt(&format!("sync queue entry {id}"), e))?;
    let store = row
        .store
        .parse::<EntityKind>()
        .map_err(|e| corrupt(&format!("sync queue entry {id}"), e))?;
    let record_id = RecordId::new(row.record_id).map_err(|e| corrupt("queued record id", e))?;
    let data = RecordPayload::from_json_str(&row.data)
        .map_err(|e| corrupt(&format!("sync queue entry {id}"), e))?;

    Ok(SyncQueueEntry {
        id,
        action,
        store,
        record_id,
        data,
        timestamp: row.timestamp,
        attempts: u32::try_from(row.attempts).unwrap_or(u32::MAX),
        last_error: row.last_error,
    })
}
