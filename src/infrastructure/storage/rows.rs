use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub payload: String,
    pub synced: bool,
    pub last_modified: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncQueueRow {
    pub id: i64,
    pub action: String,
    pub store: String,
    pub record_id: String,
    pub data: String,
    pub timestamp: i64,
    pub attempts: i64,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QueueDataRow {
    pub id: i64,
    pub data: String,
}
