use super::mappers::{queue_entry_from_row, record_from_row};
use super::queries::*;
use super::rows::{QueueDataRow, RecordRow, SyncQueueRow};
use crate::application::ports::{HydrationWrite, MetadataStore, RecordStore, SyncQueueStore};
use crate::domain::entities::{StoredRecord, SyncQueueDraft, SyncQueueEntry};
use crate::domain::value_objects::{
    EntityKind, RecordId, RecordPayload, SyncAction, SyncQueueId,
};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};

/// SQLite-backed record tables, sync queue and metadata.
#[derive(Clone)]
pub struct SqliteLocalStore {
    pool: SqlitePool,
}

impl SqliteLocalStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

async fn insert_queue_entry(
    conn: &mut SqliteConnection,
    draft: &SyncQueueDraft,
) -> Result<SyncQueueId, AppError> {
    let data = draft.data.to_json_string()?;
    let result = sqlx::query(INSERT_QUEUE_ENTRY)
        .bind(draft.action.as_str())
        .bind(draft.store.as_str())
        .bind(draft.record_id.as_str())
        .bind(data)
        .bind(draft.timestamp)
        .execute(&mut *conn)
        .await?;

    SyncQueueId::new(result.last_insert_rowid()).map_err(AppError::Storage)
}

/// Moves a record from a temporary key to the key the remote issued, carrying
/// every queued entry for it along.
async fn remap_record(
    conn: &mut SqliteConnection,
    kind: EntityKind,
    from: &RecordId,
    to: &RecordId,
) -> Result<(), AppError> {
    let collided = sqlx::query(&for_table(DELETE_RECORD, kind))
        .bind(to.as_str())
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if collided > 0 {
        tracing::warn!(
            target: "storage",
            store = %kind,
            from = %from,
            to = %to,
            "remote id already present locally; replacing it with the remapped record"
        );
    }

    let row = sqlx::query_as::<_, RecordRow>(&for_table(SELECT_RECORD_BY_ID, kind))
        .bind(from.as_str())
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(row) = row {
        let record = record_from_row(kind, row)?;
        let payload = record.payload.with_id(to).to_json_string()?;
        sqlx::query(&for_table(RENAME_RECORD, kind))
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(payload)
            .execute(&mut *conn)
            .await?;
    }

    let queued = sqlx::query_as::<_, QueueDataRow>(SELECT_QUEUE_ENTRIES_FOR_RECORD)
        .bind(kind.as_str())
        .bind(from.as_str())
        .fetch_all(&mut *conn)
        .await?;
    for row in queued {
        let data = RecordPayload::from_json_str(&row.data)
            .map_err(|e| AppError::Storage(format!("corrupt sync queue entry {}: {e}", row.id)))?
            .with_id(to)
            .to_json_string()?;
        sqlx::query(RETARGET_QUEUE_ENTRY)
            .bind(row.id)
            .bind(to.as_str())
            .bind(data)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

#[async_trait]
impl RecordStore for SqliteLocalStore {
    async fn list_records(&self, kind: EntityKind) -> Result<Vec<StoredRecord>, AppError> {
        let rows = sqlx::query_as::<_, RecordRow>(&for_table(SELECT_ALL_RECORDS, kind))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| record_from_row(kind, row))
            .collect()
    }

    async fn find_record(
        &self,
        kind: EntityKind,
        id: &RecordId,
    ) -> Result<Option<StoredRecord>, AppError> {
        let row = sqlx::query_as::<_, RecordRow>(&for_table(SELECT_RECORD_BY_ID, kind))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| record_from_row(kind, row)).transpose()
    }

    async fn insert_record(
        &self,
        record: &StoredRecord,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError> {
        let payload = record.payload.to_json_string()?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(&for_table(INSERT_RECORD, record.kind))
            .bind(record.id.as_str())
            .bind(payload)
            .bind(record.synced)
            .bind(record.last_modified)
            .execute(&mut *tx)
            .await;
        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(AppError::InvalidInput(format!(
                    "{} record {} already exists",
                    record.kind, record.id
                )));
            }
            return Err(err.into());
        }

        let queue_id = insert_queue_entry(&mut tx, mutation).await?;
        tx.commit().await?;
        Ok(queue_id)
    }

    async fn replace_record(
        &self,
        record: &StoredRecord,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError> {
        let payload = record.payload.to_json_string()?;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(&for_table(UPDATE_RECORD, record.kind))
            .bind(record.id.as_str())
            .bind(payload)
            .bind(record.synced)
            .bind(record.last_modified)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "{} record {}",
                record.kind, record.id
            )));
        }

        let queue_id = insert_queue_entry(&mut tx, mutation).await?;
        tx.commit().await?;
        Ok(queue_id)
    }

    async fn delete_record(
        &self,
        kind: EntityKind,
        id: &RecordId,
        mutation: &SyncQueueDraft,
    ) -> Result<SyncQueueId, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&for_table(DELETE_RECORD, kind))
            .bind(id.as_str())
            .execute(&mut *tx)
            .await?;

        let queue_id = insert_queue_entry(&mut tx, mutation).await?;
        tx.commit().await?;
        Ok(queue_id)
    }

    async fn bulk_save(&self, kind: EntityKind, records: &[StoredRecord]) -> Result<(), AppError> {
        let upsert = for_table(UPSERT_RECORD, kind);
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(&upsert)
                .bind(record.id.as_str())
                .bind(record.payload.to_json_string()?)
                .bind(record.synced)
                .bind(record.last_modified)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn clear_records(&self, kind: EntityKind) -> Result<(), AppError> {
        sqlx::query(&for_table(DELETE_ALL_RECORDS, kind))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn replace_synced(
        &self,
        kind: EntityKind,
        records: &[StoredRecord],
    ) -> Result<HydrationWrite, AppError> {
        let hydrate = for_table(HYDRATE_RECORD, kind);
        let mut tx = self.pool.begin().await?;

        let cleared = sqlx::query(&for_table(DELETE_SETTLED_RECORDS, kind))
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let mut written = 0;
        for record in records {
            written += sqlx::query(&hydrate)
                .bind(record.id.as_str())
                .bind(record.payload.to_json_string()?)
                .bind(record.last_modified)
                .bind(kind.as_str())
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        Ok(HydrationWrite { cleared, written })
    }

    async fn unsynced_ids(&self, kind: EntityKind) -> Result<Vec<RecordId>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(&for_table(SELECT_UNSYNCED_IDS, kind))
            .fetch_all(&self.pool)
            .await?;

        ids.into_iter()
            .map(|id| RecordId::new(id).map_err(AppError::Storage))
            .collect()
    }
}

#[async_trait]
impl SyncQueueStore for SqliteLocalStore {
    async fn enqueue(&self, draft: &SyncQueueDraft) -> Result<SyncQueueId, AppError> {
        let mut conn = self.pool.acquire().await?;
        insert_queue_entry(&mut conn, draft).await
    }

    async fn drain(&self) -> Result<Vec<SyncQueueEntry>, AppError> {
        let rows = sqlx::query_as::<_, SyncQueueRow>(SELECT_QUEUE_ENTRIES)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(queue_entry_from_row).collect()
    }

    async fn dequeue_one(&self, id: SyncQueueId) -> Result<(), AppError> {
        sqlx::query(DELETE_QUEUE_ENTRY)
            .bind(id.value())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar(COUNT_QUEUE_ENTRIES)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn acknowledge(
        &self,
        entry: &SyncQueueEntry,
        server_id: Option<&RecordId>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(DELETE_QUEUE_ENTRY)
            .bind(entry.id.value())
            .execute(&mut *tx)
            .await?;

        let mut target = entry.record_id.clone();
        if let Some(server_id) = server_id {
            if entry.action == SyncAction::Create && *server_id != entry.record_id {
                remap_record(&mut tx, entry.store, &entry.record_id, server_id).await?;
                target = server_id.clone();
            }
        }

        if entry.action != SyncAction::Delete {
            sqlx::query(&for_table(MARK_RECORD_SYNCED_IF_SETTLED, entry.store))
                .bind(target.as_str())
                .bind(entry.store.as_str())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn record_failure(&self, id: SyncQueueId, message: &str) -> Result<(), AppError> {
        sqlx::query(RECORD_QUEUE_FAILURE)
            .bind(id.value())
            .bind(message)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_queue(&self) -> Result<(), AppError> {
        sqlx::query(DELETE_ALL_QUEUE_ENTRIES)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for SqliteLocalStore {
    async fn get_metadata(&self, key: &str) -> Result<Option<Value>, AppError> {
        let raw: Option<String> = sqlx::query_scalar(SELECT_METADATA)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_metadata(&self, key: &str, value: &Value) -> Result<(), AppError> {
        sqlx::query(UPSERT_METADATA)
            .bind(key)
            .bind(serde_json::to_string(value)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_metadata(&self) -> Result<(), AppError> {
        sqlx::query(DELETE_ALL_METADATA).execute(&self.pool).await?;
        Ok(())
    }
}
