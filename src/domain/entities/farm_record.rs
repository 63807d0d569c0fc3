use crate::domain::value_objects::{EntityKind, RecordId};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A domain payload stored in one of the entity stores.
pub trait FarmRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn record_id(&self) -> &RecordId;
}
