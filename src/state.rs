use crate::application::ports::{ChangeNotifier, ConnectivityProvider, RemoteStore};
use crate::application::services::{EntityStore, SyncOrchestrator};
use crate::domain::entities::{Expense, FarmRecord, Field, Income, Task};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::infrastructure::database::LocalDatabase;
use crate::infrastructure::jobs::SyncScheduler;
use crate::infrastructure::storage::SqliteLocalStore;
use crate::shared::config::{AppConfig, SyncConfig};
use crate::shared::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Everything a client of the local store needs, wired together.
pub struct AppState {
    pub database: LocalDatabase,
    pub connectivity: Arc<ConnectivityMonitor>,
    pub remote: Arc<dyn RemoteStore>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub fields: EntityStore<Field>,
    pub expenses: EntityStore<Expense>,
    pub income: EntityStore<Income>,
    pub tasks: EntityStore<Task>,
}

impl AppState {
    pub async fn initialize(
        config: &AppConfig,
        remote: Arc<dyn RemoteStore>,
        initially_online: bool,
    ) -> Result<Self, AppError> {
        config.validate().map_err(AppError::ConfigurationError)?;

        let database = LocalDatabase::open(&config.database).await?;
        let local = Arc::new(database.local_store());
        let connectivity = ConnectivityMonitor::new(initially_online);

        let orchestrator = Arc::new(SyncOrchestrator::new(
            local.clone(),
            local.clone(),
            local.clone(),
            Arc::clone(&remote),
            connectivity.clone(),
        ));

        let notifier: Option<Arc<dyn ChangeNotifier>> = if config.sync.auto_sync {
            Some(orchestrator.clone())
        } else {
            None
        };

        Ok(Self {
            fields: entity_store(&local, &notifier),
            expenses: entity_store(&local, &notifier),
            income: entity_store(&local, &notifier),
            tasks: entity_store(&local, &notifier),
            database,
            connectivity,
            remote,
            orchestrator,
        })
    }

    /// Starts the health probe and the drain scheduler.
    pub fn spawn_background_sync(&self, config: &SyncConfig) -> BackgroundSync {
        let probe = self.connectivity.spawn_probe(
            Arc::clone(&self.remote),
            Duration::from_secs(config.probe_interval_secs),
        );
        let connectivity: Arc<dyn ConnectivityProvider> = self.connectivity.clone();
        let scheduler = SyncScheduler::spawn(
            Arc::clone(&self.orchestrator),
            connectivity,
            Duration::from_secs(config.sync_interval_secs),
        );

        BackgroundSync { probe, scheduler }
    }

    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.database.close().await
    }
}

fn entity_store<T: FarmRecord>(
    local: &Arc<SqliteLocalStore>,
    notifier: &Option<Arc<dyn ChangeNotifier>>,
) -> EntityStore<T> {
    let store = EntityStore::new(local.clone());
    match notifier {
        Some(notifier) => store.with_notifier(Arc::clone(notifier)),
        None => store,
    }
}

pub struct BackgroundSync {
    probe: JoinHandle<()>,
    scheduler: SyncScheduler,
}

impl BackgroundSync {
    pub async fn shutdown(self) {
        self.probe.abort();
        self.scheduler.shutdown().await;
    }
}
