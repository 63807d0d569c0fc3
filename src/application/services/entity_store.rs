use crate::application::ports::{ChangeNotifier, RecordStore};
use crate::domain::entities::{FarmRecord, StoredRecord, SyncQueueDraft};
use crate::domain::value_objects::{RecordId, RecordPatch, RecordPayload};
use crate::shared::error::AppError;
use chrono::Utc;
use std::marker::PhantomData;
use std::sync::Arc;

/// Local store for one record kind.
///
/// Every mutation lands in the local table and the sync queue together; the
/// store itself never talks to the remote and never looks at connectivity.
pub struct EntityStore<T: FarmRecord> {
    records: Arc<dyn RecordStore>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    _kind: PhantomData<fn() -> T>,
}

impl<T: FarmRecord> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            notifier: self.notifier.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: FarmRecord> EntityStore<T> {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            notifier: None,
            _kind: PhantomData,
        }
    }

    /// Attaches the collaborator told about each committed mutation.
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn get_all(&self) -> Result<Vec<T>, AppError> {
        let stored = self.records.list_records(T::KIND).await?;
        stored
            .iter()
            .map(|record| record.decode::<T>().map_err(AppError::from))
            .collect()
    }

    pub async fn get(&self, id: &RecordId) -> Result<Option<T>, AppError> {
        match self.records.find_record(T::KIND, id).await? {
            Some(record) => Ok(Some(record.decode()?)),
            None => Ok(None),
        }
    }

    pub async fn add(&self, record: T) -> Result<T, AppError> {
        let id = record.record_id().clone();
        let payload = RecordPayload::from_record(&record).map_err(AppError::SerializationError)?;
        let now = Utc::now().timestamp_millis();

        let stored = StoredRecord::dirty(T::KIND, id.clone(), payload.clone(), now);
        let draft = SyncQueueDraft::create(T::KIND, &payload, &id, now);
        let queue_id = self.records.insert_record(&stored, &draft).await?;

        tracing::debug!(
            target: "storage",
            store = %T::KIND,
            record_id = %id,
            queue_id = %queue_id,
            "record added"
        );
        self.notify().await;
        Ok(record)
    }

    pub async fn update(&self, id: &RecordId, mut patch: RecordPatch) -> Result<T, AppError> {
        if let Some(patched_id) = patch.remove_id() {
            if patched_id.as_str() != Some(id.as_str()) {
                return Err(AppError::InvalidInput(format!(
                    "cannot change the id of {} record {id}",
                    T::KIND
                )));
            }
        }

        let existing = self
            .records
            .find_record(T::KIND, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} record {id}", T::KIND)))?;

        let merged = existing.payload.merged_with(&patch).with_id(id);
        let updated: T = merged.decode().map_err(|e| {
            AppError::InvalidInput(format!("patch leaves {} record {id} invalid: {e}", T::KIND))
        })?;

        let now = Utc::now().timestamp_millis();
        let stored = StoredRecord::dirty(T::KIND, id.clone(), merged, now);
        let draft = SyncQueueDraft::update(T::KIND, id, &patch, now);
        let queue_id = self.records.replace_record(&stored, &draft).await?;

        tracing::debug!(
            target: "storage",
            store = %T::KIND,
            record_id = %id,
            queue_id = %queue_id,
            "record updated"
        );
        self.notify().await;
        Ok(updated)
    }

    /// Removes the local copy and queues the remote delete, known id or not.
    pub async fn delete(&self, id: &RecordId) -> Result<(), AppError> {
        let now = Utc::now().timestamp_millis();
        let draft = SyncQueueDraft::delete(T::KIND, id, now);
        let queue_id = self.records.delete_record(T::KIND, id, &draft).await?;

        tracing::debug!(
            target: "storage",
            store = %T::KIND,
            record_id = %id,
            queue_id = %queue_id,
            "record deleted"
        );
        self.notify().await;
        Ok(())
    }

    /// Hydration path: writes records as already synced and bypasses the queue.
    pub async fn bulk_save(&self, records: &[T]) -> Result<(), AppError> {
        let now = Utc::now().timestamp_millis();
        let stored = records
            .iter()
            .map(|record| {
                let payload =
                    RecordPayload::from_record(record).map_err(AppError::SerializationError)?;
                Ok(StoredRecord::synced(
                    T::KIND,
                    record.record_id().clone(),
                    payload,
                    now,
                ))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        self.records.bulk_save(T::KIND, &stored).await
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.records.clear_records(T::KIND).await
    }

    /// Ids of records with changes the remote has not confirmed yet.
    pub async fn pending_ids(&self) -> Result<Vec<RecordId>, AppError> {
        self.records.unsynced_ids(T::KIND).await
    }

    async fn notify(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.changes_pending(T::KIND).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SyncQueueStore;
    use crate::domain::entities::{Field, Task, TaskStatus};
    use crate::domain::value_objects::{EntityKind, SyncAction};
    use crate::infrastructure::database::LocalDatabase;
    use crate::infrastructure::storage::SqliteLocalStore;
    use async_trait::async_trait;
    use mockall::{mock, predicate::*};

    mock! {
        pub Notifier {}

        #[async_trait]
        impl ChangeNotifier for Notifier {
            async fn changes_pending(&self, kind: EntityKind);
        }
    }

    async fn setup() -> (LocalDatabase, Arc<SqliteLocalStore>) {
        let db = LocalDatabase::in_memory().await.unwrap();
        let store = Arc::new(db.local_store());
        (db, store)
    }

    fn rid(value: &str) -> RecordId {
        RecordId::new(value.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get_returns_record() {
        let (_db, local) = setup().await;
        let fields: EntityStore<Field> = EntityStore::new(local.clone());

        let mut field = Field::new("North paddock", 12.5);
        field.crop_type = Some("wheat".to_string());
        let added = fields.add(field.clone()).await.unwrap();

        assert_eq!(added, field);
        assert_eq!(fields.get(&field.id).await.unwrap(), Some(field.clone()));
        assert_eq!(fields.get_all().await.unwrap(), vec![field.clone()]);
        assert_eq!(fields.pending_ids().await.unwrap(), vec![field.id]);
    }

    #[tokio::test]
    async fn test_each_mutation_enqueues_exactly_one_entry() {
        let (_db, local) = setup().await;
        let fields: EntityStore<Field> = EntityStore::new(local.clone());

        let field = Field::with_id(rid("f1"), "East", 3.0);
        fields.add(field).await.unwrap();
        fields
            .update(&rid("f1"), RecordPatch::new().set("area", 4.0))
            .await
            .unwrap();
        fields.delete(&rid("f1")).await.unwrap();

        let entries = local.drain().await.unwrap();
        let actions: Vec<SyncAction> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![SyncAction::Create, SyncAction::Update, SyncAction::Delete]
        );
        assert_eq!(entries[1].data.as_json()["area"], 4.0);
        assert_eq!(entries[1].data.as_json()["id"], "f1");
        assert!(entries[1].data.as_json().get("name").is_none());
        assert_eq!(entries[2].data.as_json(), &serde_json::json!({ "id": "f1" }));
        assert!(fields.get(&rid("f1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found_without_queue_entry() {
        let (_db, local) = setup().await;
        let tasks: EntityStore<Task> = EntityStore::new(local.clone());

        let result = tasks
            .update(&rid("nope"), RecordPatch::new().set("status", "completed"))
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(local.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_merges_patch_over_stored_payload() {
        let (_db, local) = setup().await;
        let tasks: EntityStore<Task> = EntityStore::new(local.clone());
        let task = tasks.add(Task::new("Spray orchard")).await.unwrap();

        let updated = tasks
            .update(&task.id, RecordPatch::new().set("status", "completed"))
            .await
            .unwrap();

        assert_eq!(updated.title, "Spray orchard");
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(tasks.get(&task.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_rejects_id_change_and_invalid_merge() {
        let (_db, local) = setup().await;
        let fields: EntityStore<Field> = EntityStore::new(local.clone());
        fields
            .add(Field::with_id(rid("f1"), "West", 2.0))
            .await
            .unwrap();

        let renamed = fields
            .update(&rid("f1"), RecordPatch::new().set("id", "f2"))
            .await;
        assert!(matches!(renamed, Err(AppError::InvalidInput(_))));

        let broken = fields
            .update(&rid("f1"), RecordPatch::new().set("area", "lots"))
            .await;
        assert!(matches!(broken, Err(AppError::InvalidInput(_))));

        assert_eq!(local.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_duplicate_id_is_invalid_input() {
        let (_db, local) = setup().await;
        let fields: EntityStore<Field> = EntityStore::new(local.clone());
        fields
            .add(Field::with_id(rid("f1"), "West", 2.0))
            .await
            .unwrap();

        let result = fields.add(Field::with_id(rid("f1"), "Again", 1.0)).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_bulk_save_bypasses_queue() {
        let (_db, local) = setup().await;
        let fields: EntityStore<Field> = EntityStore::new(local.clone());

        fields
            .bulk_save(&[
                Field::with_id(rid("a"), "A", 1.0),
                Field::with_id(rid("b"), "B", 2.0),
            ])
            .await
            .unwrap();

        assert_eq!(fields.get_all().await.unwrap().len(), 2);
        assert!(fields.pending_ids().await.unwrap().is_empty());
        assert_eq!(local.count().await.unwrap(), 0);

        fields.clear().await.unwrap();
        assert!(fields.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_is_told_after_commit() {
        let (_db, local) = setup().await;
        let mut notifier = MockNotifier::new();
        notifier
            .expect_changes_pending()
            .with(eq(EntityKind::Fields))
            .times(2)
            .returning(|_| ());

        let fields: EntityStore<Field> =
            EntityStore::new(local.clone()).with_notifier(Arc::new(notifier));
        fields
            .add(Field::with_id(rid("f1"), "West", 2.0))
            .await
            .unwrap();
        fields.delete(&rid("f1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_notify() {
        let (_db, local) = setup().await;
        let mut notifier = MockNotifier::new();
        notifier.expect_changes_pending().times(0);

        let fields: EntityStore<Field> =
            EntityStore::new(local.clone()).with_notifier(Arc::new(notifier));
        let result = fields
            .update(&rid("ghost"), RecordPatch::new().set("name", "x"))
            .await;
        assert!(result.is_err());
    }
}
