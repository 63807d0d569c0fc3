use crate::domain::value_objects::{EntityKind, RecordId, SyncAction, SyncQueueId};
use serde::{Deserialize, Serialize};

/// An entry the remote refused; it has been removed from the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub entry_id: SyncQueueId,
    pub action: SyncAction,
    pub store: EntityKind,
    pub record_id: RecordId,
    pub reason: String,
}

/// A temp id replaced by the id the remote issued.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdRemap {
    pub store: EntityKind,
    pub from: RecordId,
    pub to: RecordId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Entries acknowledged by the remote and dequeued.
    pub applied: u32,
    /// Entries kept after a retryable failure.
    pub retained: u32,
    /// Entries not attempted because an earlier entry for the same record failed.
    pub skipped: u32,
    pub rejected: Vec<SyncFailure>,
    pub remapped: Vec<IdRemap>,
    /// Connectivity dropped before the pass finished.
    pub interrupted: bool,
}

impl DrainReport {
    /// Every queued entry was either applied or explicitly rejected.
    pub fn is_complete(&self) -> bool {
        self.retained == 0 && self.skipped == 0 && !self.interrupted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    Offline,
    /// Another drain holds the queue; it will run one more pass.
    AlreadyRunning,
    Completed(DrainReport),
}

impl DrainOutcome {
    pub fn report(&self) -> Option<&DrainReport> {
        match self {
            DrainOutcome::Completed(report) => Some(report),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KindHydration {
    pub store: EntityKind,
    pub received: u32,
    pub written: u32,
    /// Remote records ignored because the local copy has unsent changes.
    pub kept_local: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HydrationReport {
    pub drain: Option<DrainReport>,
    pub stores: Vec<KindHydration>,
    pub synced_at: i64,
}

/// Status surfaced to UI and CLI collaborators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusSnapshot {
    pub is_online: bool,
    pub pending_changes: u64,
    pub last_sync_time: Option<i64>,
}
