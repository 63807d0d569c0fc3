use crate::domain::value_objects::EntityKind;
use async_trait::async_trait;

/// Told by entity stores after a local mutation has been committed.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn changes_pending(&self, kind: EntityKind);
}
