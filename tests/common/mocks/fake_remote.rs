use async_trait::async_trait;
use farmbook_lib::application::ports::{RemoteError, RemoteStore};
use farmbook_lib::domain::value_objects::{
    EntityKind, RecordId, RecordPatch, RecordPayload, SyncAction,
};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub action: SyncAction,
    pub store: EntityKind,
    pub record_id: String,
}

/// In-memory remote that behaves like a strict REST backend: duplicate creates
/// are `AlreadyExists`, missing targets are `NotFound`.
#[derive(Default)]
pub struct FakeRemoteStore {
    records: Mutex<Vec<(EntityKind, Value)>>,
    calls: Mutex<Vec<RemoteCall>>,
    rejected_ids: Mutex<HashSet<String>>,
    unreachable: AtomicBool,
    issue_server_ids: AtomicBool,
    next_server_id: AtomicU64,
    latency_ms: AtomicU64,
}

#[allow(dead_code)]
impl FakeRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Creates for temporary ids get a fresh `srv-N` id.
    pub fn issue_server_ids(&self) {
        self.issue_server_ids.store(true, Ordering::SeqCst);
    }

    pub fn reject_record(&self, id: &str) {
        self.rejected_ids.lock().unwrap().insert(id.to_string());
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn seed(&self, kind: EntityKind, record: Value) {
        self.records.lock().unwrap().push((kind, record));
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn records(&self, kind: EntityKind) -> Vec<Value> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn find(&self, kind: EntityKind, id: &str) -> Option<Value> {
        self.records(kind)
            .into_iter()
            .find(|record| record["id"] == id)
    }

    async fn enter(
        &self,
        action: SyncAction,
        store: EntityKind,
        record_id: &str,
    ) -> Result<(), RemoteError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        self.calls.lock().unwrap().push(RemoteCall {
            action,
            store,
            record_id: record_id.to_string(),
        });
        if self.rejected_ids.lock().unwrap().contains(record_id) {
            return Err(RemoteError::rejected(422, format!("record {record_id} failed validation")));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FakeRemoteStore {
    async fn create(
        &self,
        kind: EntityKind,
        record: &RecordPayload,
    ) -> Result<RecordPayload, RemoteError> {
        let sent_id = record
            .record_id()
            .map_err(|e| RemoteError::rejected(400, e))?;
        self.enter(SyncAction::Create, kind, sent_id.as_str()).await?;

        if self.find(kind, sent_id.as_str()).is_some() {
            return Err(RemoteError::AlreadyExists(sent_id.to_string()));
        }

        let stored = if self.issue_server_ids.load(Ordering::SeqCst) && sent_id.is_temporary() {
            let n = self.next_server_id.fetch_add(1, Ordering::SeqCst) + 1;
            record.with_id(&RecordId::new(format!("srv-{n}")).unwrap())
        } else {
            record.clone()
        };
        self.records
            .lock()
            .unwrap()
            .push((kind, stored.as_json().clone()));
        Ok(stored)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), RemoteError> {
        self.enter(SyncAction::Update, kind, id.as_str()).await?;

        let mut records = self.records.lock().unwrap();
        let target = records
            .iter_mut()
            .find(|(k, record)| *k == kind && record["id"] == id.as_str())
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        if let Value::Object(map) = &mut target.1 {
            for (key, value) in patch.as_map() {
                map.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), RemoteError> {
        self.enter(SyncAction::Delete, kind, id.as_str()).await?;

        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|(k, record)| !(*k == kind && record["id"] == id.as_str()));
        if records.len() == before {
            return Err(RemoteError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<RecordPayload>, RemoteError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        Ok(self
            .records(kind)
            .into_iter()
            .map(|record| RecordPayload::new(record).unwrap())
            .collect())
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RemoteError::Unreachable("connection refused".to_string()));
        }
        Ok(())
    }
}
