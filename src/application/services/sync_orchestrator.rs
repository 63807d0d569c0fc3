use crate::application::ports::{
    ChangeNotifier, ConnectivityProvider, MetadataStore, RecordStore, RemoteError, RemoteStore,
    SyncQueueStore,
};
use crate::domain::entities::{
    DrainOutcome, DrainReport, HydrationReport, IdRemap, KindHydration, StoredRecord,
    SyncFailure, SyncQueueEntry, SyncStatusSnapshot,
};
use crate::domain::value_objects::{EntityKind, RecordId, SyncAction};
use crate::domain::LAST_SYNC_TIME_KEY;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Replays the sync queue against the remote store and hydrates local stores
/// from it.
///
/// Only one drain runs at a time. A drain requested while another is in flight
/// returns `AlreadyRunning` and makes the running drain do one more pass, so no
/// entry is ever dispatched twice concurrently.
pub struct SyncOrchestrator {
    records: Arc<dyn RecordStore>,
    queue: Arc<dyn SyncQueueStore>,
    metadata: Arc<dyn MetadataStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<dyn ConnectivityProvider>,
    gate: Mutex<()>,
    rerun: AtomicBool,
}

impl SyncOrchestrator {
    pub fn new(
        records: Arc<dyn RecordStore>,
        queue: Arc<dyn SyncQueueStore>,
        metadata: Arc<dyn MetadataStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<dyn ConnectivityProvider>,
    ) -> Self {
        Self {
            records,
            queue,
            metadata,
            remote,
            connectivity,
            gate: Mutex::new(()),
            rerun: AtomicBool::new(false),
        }
    }

    pub async fn drain(&self) -> Result<DrainOutcome, AppError> {
        if !self.connectivity.is_online() {
            tracing::debug!(target: "sync::orchestrator", "offline; drain skipped");
            return Ok(DrainOutcome::Offline);
        }

        let _guard = match self.gate.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                self.rerun.store(true, Ordering::SeqCst);
                tracing::debug!(
                    target: "sync::orchestrator",
                    "drain already running; rerun requested"
                );
                return Ok(DrainOutcome::AlreadyRunning);
            }
        };

        self.drain_locked().await.map(DrainOutcome::Completed)
    }

    /// Runs passes until no rerun is pending. Callers hold `gate`.
    async fn drain_locked(&self) -> Result<DrainReport, AppError> {
        let mut report = DrainReport::default();
        loop {
            self.rerun.store(false, Ordering::SeqCst);
            let pass = self.drain_pass().await?;
            report.applied += pass.applied;
            report.rejected.extend(pass.rejected);
            report.remapped.extend(pass.remapped);
            report.retained = pass.retained;
            report.skipped = pass.skipped;
            report.interrupted = pass.interrupted;

            if report.interrupted || !self.rerun.load(Ordering::SeqCst) {
                break;
            }
        }

        if report.is_complete() {
            self.set_last_sync_time(Utc::now().timestamp_millis())
                .await?;
        }

        tracing::info!(
            target: "sync::orchestrator",
            applied = report.applied,
            retained = report.retained,
            skipped = report.skipped,
            rejected = report.rejected.len(),
            remapped = report.remapped.len(),
            interrupted = report.interrupted,
            "drain finished"
        );

        Ok(report)
    }

    async fn drain_pass(&self) -> Result<DrainReport, AppError> {
        let mut entries = self.queue.drain().await?;
        let mut blocked: HashSet<(EntityKind, RecordId)> = HashSet::new();
        let mut report = DrainReport::default();

        for index in 0..entries.len() {
            if !self.connectivity.is_online() {
                report.interrupted = true;
                tracing::warn!(
                    target: "sync::orchestrator",
                    remaining = entries.len() - index,
                    "connectivity lost during drain"
                );
                break;
            }

            let entry = entries[index].clone();
            if blocked.contains(&entry.target()) {
                report.skipped += 1;
                continue;
            }

            match self.dispatch(&entry).await {
                Ok(server_id) => {
                    let remapped = server_id.filter(|id| *id != entry.record_id);
                    self.queue.acknowledge(&entry, remapped.as_ref()).await?;
                    report.applied += 1;

                    if let Some(new_id) = remapped {
                        for later in entries[index + 1..].iter_mut() {
                            if later.store == entry.store && later.record_id == entry.record_id {
                                later.retarget(&new_id);
                            }
                        }
                        tracing::info!(
                            target: "sync::orchestrator",
                            store = %entry.store,
                            from = %entry.record_id,
                            to = %new_id,
                            "record id remapped"
                        );
                        report.remapped.push(IdRemap {
                            store: entry.store,
                            from: entry.record_id.clone(),
                            to: new_id,
                        });
                    }
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!(
                        target: "sync::orchestrator",
                        entry_id = %entry.id,
                        store = %entry.store,
                        record_id = %entry.record_id,
                        error = %err,
                        "remote unreachable; entry kept"
                    );
                    self.queue
                        .record_failure(entry.id, &err.to_string())
                        .await?;
                    blocked.insert(entry.target());
                    report.retained += 1;
                }
                Err(err) => {
                    tracing::warn!(
                        target: "sync::orchestrator",
                        entry_id = %entry.id,
                        action = entry.action.as_str(),
                        store = %entry.store,
                        record_id = %entry.record_id,
                        error = %err,
                        "remote rejected entry; dropped from queue"
                    );
                    self.queue.dequeue_one(entry.id).await?;
                    blocked.insert(entry.target());
                    report.rejected.push(SyncFailure {
                        entry_id: entry.id,
                        action: entry.action,
                        store: entry.store,
                        record_id: entry.record_id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Applies one entry remotely. `Some(id)` carries the id the remote stored
    /// a created record under.
    async fn dispatch(&self, entry: &SyncQueueEntry) -> Result<Option<RecordId>, RemoteError> {
        match entry.action {
            SyncAction::Create => match self.remote.create(entry.store, &entry.data).await {
                Ok(stored) => Ok(stored.record_id().ok()),
                Err(RemoteError::AlreadyExists(_)) => Ok(None),
                Err(err) => Err(err),
            },
            SyncAction::Update => {
                let patch = entry.data.without_id();
                self.remote
                    .update(entry.store, &entry.record_id, &patch)
                    .await
                    .map(|_| None)
            }
            SyncAction::Delete => match self.remote.delete(entry.store, &entry.record_id).await {
                Ok(()) | Err(RemoteError::NotFound(_)) => Ok(None),
                Err(err) => Err(err),
            },
        }
    }

    /// Drains, then replaces every clean local record with the remote's set.
    ///
    /// Records with unconfirmed local changes, including pending deletes, are
    /// left alone. Holds the drain gate throughout so no acknowledgement lands
    /// between the remote snapshot and the local write.
    pub async fn full_sync(&self) -> Result<HydrationReport, AppError> {
        if !self.connectivity.is_online() {
            return Err(AppError::RemoteUnreachable("device is offline".to_string()));
        }

        let _guard = self.gate.lock().await;
        let drain = if self.connectivity.is_online() {
            Some(self.drain_locked().await?)
        } else {
            None
        };

        let fetched = try_join_all(EntityKind::ALL.iter().map(|&kind| {
            let remote = Arc::clone(&self.remote);
            async move { remote.fetch_all(kind).await.map(|records| (kind, records)) }
        }))
        .await?;

        let synced_at = Utc::now().timestamp_millis();
        let mut stores = Vec::with_capacity(fetched.len());

        for (kind, remote_records) in fetched {
            let received = remote_records.len() as u32;
            let mut hydrated = Vec::with_capacity(remote_records.len());
            for payload in remote_records {
                match payload.record_id() {
                    Ok(id) => hydrated.push(StoredRecord::synced(kind, id, payload, synced_at)),
                    Err(err) => {
                        tracing::warn!(
                            target: "sync::orchestrator",
                            store = %kind,
                            error = %err,
                            "remote record without usable id ignored"
                        );
                    }
                }
            }

            let write = self.records.replace_synced(kind, &hydrated).await?;
            let written = write.written as u32;
            let kept_local = (hydrated.len() as u32).saturating_sub(written);

            tracing::info!(
                target: "sync::orchestrator",
                store = %kind,
                received,
                cleared = write.cleared,
                written,
                kept_local,
                "store hydrated"
            );
            stores.push(KindHydration {
                store: kind,
                received,
                written,
                kept_local,
            });
        }

        self.set_last_sync_time(synced_at).await?;

        // Mutations committed during hydration requested a drain that could not start.
        if self.rerun.load(Ordering::SeqCst) && self.connectivity.is_online() {
            self.drain_locked().await?;
        }

        Ok(HydrationReport {
            drain,
            stores,
            synced_at,
        })
    }

    pub async fn status(&self) -> Result<SyncStatusSnapshot, AppError> {
        let pending_changes = self.queue.count().await?;
        let last_sync_time = self
            .metadata
            .get_metadata(LAST_SYNC_TIME_KEY)
            .await?
            .and_then(|value| value.as_i64());

        Ok(SyncStatusSnapshot {
            is_online: self.connectivity.is_online(),
            pending_changes,
            last_sync_time,
        })
    }

    /// Wipes every entity store, the queue and the metadata (sign-out).
    pub async fn reset_local_state(&self) -> Result<(), AppError> {
        let _guard = self.gate.lock().await;

        for kind in EntityKind::ALL {
            self.records.clear_records(kind).await?;
        }
        self.queue.clear_queue().await?;
        self.metadata.clear_metadata().await?;

        tracing::info!(target: "sync::orchestrator", "local state reset");
        Ok(())
    }

    async fn set_last_sync_time(&self, millis: i64) -> Result<(), AppError> {
        self.metadata
            .set_metadata(LAST_SYNC_TIME_KEY, &Value::from(millis))
            .await
    }
}

#[async_trait]
impl ChangeNotifier for SyncOrchestrator {
    async fn changes_pending(&self, kind: EntityKind) {
        match self.drain().await {
            Ok(DrainOutcome::Completed(report)) if !report.rejected.is_empty() => {
                tracing::warn!(
                    target: "sync::orchestrator",
                    store = %kind,
                    rejected = report.rejected.len(),
                    "immediate sync finished with rejections"
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!(
                    target: "sync::orchestrator",
                    store = %kind,
                    error = %err,
                    "immediate sync failed"
                );
            }
        }
    }
}
