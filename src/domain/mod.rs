pub mod entities;
pub mod value_objects;

/// Metadata key holding the time of the last complete sync, in ms since the epoch.
pub const LAST_SYNC_TIME_KEY: &str = "lastSyncTime";
