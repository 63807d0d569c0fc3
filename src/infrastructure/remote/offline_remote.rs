use crate::application::ports::{RemoteError, RemoteStore};
use crate::domain::value_objects::{EntityKind, RecordId, RecordPatch, RecordPayload};
use async_trait::async_trait;

/// Stand-in used when no remote url is configured. Every call is unreachable,
/// so queued changes stay queued.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineRemoteStore;

const NO_REMOTE: &str = "no remote configured";

#[async_trait]
impl RemoteStore for OfflineRemoteStore {
    async fn create(
        &self,
        _kind: EntityKind,
        _record: &RecordPayload,
    ) -> Result<RecordPayload, RemoteError> {
        Err(RemoteError::Unreachable(NO_REMOTE.to_string()))
    }

    async fn update(
        &self,
        _kind: EntityKind,
        _id: &RecordId,
        _patch: &RecordPatch,
    ) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable(NO_REMOTE.to_string()))
    }

    async fn delete(&self, _kind: EntityKind, _id: &RecordId) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable(NO_REMOTE.to_string()))
    }

    async fn fetch_all(&self, _kind: EntityKind) -> Result<Vec<RecordPayload>, RemoteError> {
        Err(RemoteError::Unreachable(NO_REMOTE.to_string()))
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable(NO_REMOTE.to_string()))
    }
}
