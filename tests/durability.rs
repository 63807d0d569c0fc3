mod common;

use common::mocks::FakeRemoteStore;
use common::record_id;
use farmbook_lib::domain::entities::Field;
use farmbook_lib::domain::value_objects::RecordPatch;
use farmbook_lib::shared::config::DatabaseConfig;
use farmbook_lib::{AppConfig, AppError, AppState};
use std::path::Path;
use std::sync::Arc;

fn file_config(path: &Path) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
            acquire_writer_lease: true,
        },
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn queue_and_records_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("nested").join("farm.db"));
    let remote = Arc::new(FakeRemoteStore::new());

    let state = AppState::initialize(&config, remote.clone(), false)
        .await
        .unwrap();
    state
        .fields
        .add(Field::with_id(record_id("f1"), "Creek paddock", 3.2))
        .await
        .unwrap();
    state
        .fields
        .update(&record_id("f1"), RecordPatch::new().set("soilType", "loam"))
        .await
        .unwrap();
    state.shutdown().await.unwrap();

    let reopened = AppState::initialize(&config, remote.clone(), true)
        .await
        .unwrap();
    let field = reopened.fields.get(&record_id("f1")).await.unwrap().unwrap();
    assert_eq!(field.soil_type.as_deref(), Some("loam"));
    assert_eq!(reopened.orchestrator.status().await.unwrap().pending_changes, 2);

    reopened.orchestrator.drain().await.unwrap();
    assert_eq!(remote.calls().len(), 2);
    assert_eq!(reopened.orchestrator.status().await.unwrap().pending_changes, 0);
    reopened.shutdown().await.unwrap();
}

#[tokio::test]
async fn second_process_is_refused_while_lease_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("farm.db"));

    let first = AppState::initialize(&config, Arc::new(FakeRemoteStore::new()), false)
        .await
        .unwrap();
    let second = AppState::initialize(&config, Arc::new(FakeRemoteStore::new()), false).await;

    match second {
        Err(AppError::Storage(message)) => assert!(message.contains("locked")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second opener must be refused"),
    }
    first.shutdown().await.unwrap();
}

#[tokio::test]
async fn reset_clears_local_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("farm.db"));
    let state = AppState::initialize(&config, Arc::new(FakeRemoteStore::new()), false)
        .await
        .unwrap();

    state
        .fields
        .add(Field::new("Temporary plot", 0.2))
        .await
        .unwrap();
    state.orchestrator.reset_local_state().await.unwrap();

    assert!(state.fields.get_all().await.unwrap().is_empty());
    let status = state.orchestrator.status().await.unwrap();
    assert_eq!(status.pending_changes, 0);
    assert!(status.last_sync_time.is_none());
    state.shutdown().await.unwrap();
}
