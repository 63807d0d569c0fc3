pub mod expense;
pub mod farm_record;
pub mod field;
pub mod income;
pub mod stored_record;
pub mod sync_queue_entry;
pub mod sync_report;
pub mod task;

pub use expense::Expense;
pub use farm_record::FarmRecord;
pub use field::Field;
pub use income::Income;
pub use stored_record::StoredRecord;
pub use sync_queue_entry::{SyncQueueDraft, SyncQueueEntry};
pub use sync_report::{
    DrainOutcome, DrainReport, HydrationReport, IdRemap, KindHydration, SyncFailure,
    SyncStatusSnapshot,
};
pub use task::{Task, TaskPriority, TaskStatus};
