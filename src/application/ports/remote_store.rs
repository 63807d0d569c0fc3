use crate::domain::value_objects::{EntityKind, RecordId, RecordPatch, RecordPayload};
use async_trait::async_trait;
use thiserror::Error;

/// Failure reported by the remote store, classified for the drain loop.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport failure or a transient server condition. Retried on the next drain.
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    /// The server declined the mutation. Not retried.
    #[error("remote rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// A create for this id was already applied.
    #[error("record already exists remotely: {0}")]
    AlreadyExists(String),

    #[error("record not found remotely: {0}")]
    NotFound(String),

    #[error("invalid remote response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Maps a non-success HTTP status onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            409 => Self::AlreadyExists(message),
            408 | 423 | 425 | 429 => Self::Unreachable(format!("HTTP {status}: {message}")),
            500..=599 => Self::Unreachable(format!("HTTP {status}: {message}")),
            _ => Self::rejected(status, message),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// The authoritative store on the other side of the network.
///
/// Implementations must treat a create for an existing id as `AlreadyExists`
/// and a delete for a missing id as `NotFound`; the drain loop relies on that
/// to make replays idempotent.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Returns the stored record, whose id may differ from the one sent.
    async fn create(
        &self,
        kind: EntityKind,
        record: &RecordPayload,
    ) -> Result<RecordPayload, RemoteError>;
    async fn update(
        &self,
        kind: EntityKind,
        id: &RecordId,
        patch: &RecordPatch,
    ) -> Result<(), RemoteError>;
    async fn delete(&self, kind: EntityKind, id: &RecordId) -> Result<(), RemoteError>;
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<RecordPayload>, RemoteError>;
    async fn health_check(&self) -> Result<(), RemoteError>;
}
