pub mod entity_store;
pub mod sync_orchestrator;

pub use entity_store::EntityStore;
pub use sync_orchestrator::SyncOrchestrator;
