pub mod entity_kind;
pub mod payload;
pub mod record_id;
pub mod sync_action;
pub mod sync_queue_id;

pub use entity_kind::EntityKind;
pub use payload::{RecordPatch, RecordPayload};
pub use record_id::{RecordId, TEMP_ID_PREFIX};
pub use sync_action::SyncAction;
pub use sync_queue_id::SyncQueueId;
