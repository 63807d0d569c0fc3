use super::writer_lease::WriterLease;
use crate::infrastructure::storage::SqliteLocalStore;
use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

/// Handle to the device-local SQLite store.
///
/// Constructed explicitly and passed to whoever needs it; `close` releases the
/// pool and the writer lease.
pub struct LocalDatabase {
    pool: SqlitePool,
    lease: Mutex<Option<WriterLease>>,
}

impl LocalDatabase {
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let in_memory = is_in_memory_url(&config.url);
        let mut options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let mut lease = None;
        if !in_memory {
            let path = options.get_filename().to_path_buf();
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            if config.acquire_writer_lease {
                lease = Some(WriterLease::acquire(&path)?);
            }
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        // Every connection to `:memory:` is its own database, so pin a single one.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let database = Self {
            pool,
            lease: Mutex::new(lease),
        };
        database.migrate().await?;

        tracing::info!(
            target: "storage",
            in_memory,
            max_connections = config.max_connections,
            "local database opened"
        );

        Ok(database)
    }

    pub async fn in_memory() -> Result<Self, AppError> {
        Self::open(&DatabaseConfig::in_memory()).await
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn local_store(&self) -> SqliteLocalStore {
        SqliteLocalStore::new(self.pool.clone())
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    pub async fn close(&self) -> Result<(), AppError> {
        self.pool.close().await;
        let lease = match self.lease.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(lease) = lease {
            lease.release()?;
        }
        tracing::info!(target: "storage", "local database closed");
        Ok(())
    }
}

fn is_in_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
