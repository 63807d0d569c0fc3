pub mod mocks;

use farmbook_lib::domain::value_objects::RecordId;
use farmbook_lib::shared::config::DatabaseConfig;
use farmbook_lib::{AppConfig, AppState};
use mocks::FakeRemoteStore;
use std::sync::Arc;

pub struct SyncTestContext {
    pub state: AppState,
    pub remote: Arc<FakeRemoteStore>,
}

/// In-memory store wired to a fake remote. With `auto_sync`, every committed
/// mutation drains immediately while online.
pub async fn setup_context(online: bool, auto_sync: bool) -> SyncTestContext {
    let mut config = AppConfig {
        database: DatabaseConfig::in_memory(),
        ..AppConfig::default()
    };
    config.sync.auto_sync = auto_sync;

    let remote = Arc::new(FakeRemoteStore::new());
    let state = AppState::initialize(&config, remote.clone(), online)
        .await
        .expect("app state");

    SyncTestContext { state, remote }
}

#[allow(dead_code)]
pub fn record_id(value: &str) -> RecordId {
    RecordId::new(value.to_string()).expect("record id")
}
