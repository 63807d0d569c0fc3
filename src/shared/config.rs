use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Hold a lock file beside the database so only one process mutates it.
    pub acquire_writer_lease: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval_secs: u64,
    pub probe_interval_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: default_database_url(),
                max_connections: 5,
                acquire_writer_lease: true,
            },
            remote: RemoteConfig {
                base_url: None,
                api_token: None,
                timeout_secs: 15,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval_secs: 300, // 5 minutes
                probe_interval_secs: 30,
            },
        }
    }
}

impl DatabaseConfig {
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            acquire_writer_lease: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("FARMBOOK_DATABASE_URL") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.database.url = v.to_string();
            }
        }
        if let Some(value) = env_parsed::<u32>("FARMBOOK_DB_MAX_CONNECTIONS") {
            cfg.database.max_connections = value;
        }
        if let Ok(v) = std::env::var("FARMBOOK_WRITER_LEASE") {
            cfg.database.acquire_writer_lease = parse_bool(&v, cfg.database.acquire_writer_lease);
        }

        if let Ok(v) = std::env::var("FARMBOOK_REMOTE_URL") {
            let v = v.trim().trim_end_matches('/');
            cfg.remote.base_url = if v.is_empty() {
                None
            } else {
                Some(v.to_string())
            };
        }
        if let Ok(v) = std::env::var("FARMBOOK_REMOTE_TOKEN") {
            let v = v.trim();
            if !v.is_empty() {
                cfg.remote.api_token = Some(v.to_string());
            }
        }
        if let Some(value) = env_parsed::<u64>("FARMBOOK_REMOTE_TIMEOUT_SECS") {
            cfg.remote.timeout_secs = value;
        }

        if let Ok(v) = std::env::var("FARMBOOK_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Some(value) = env_parsed::<u64>("FARMBOOK_SYNC_INTERVAL_SECS") {
            cfg.sync.sync_interval_secs = value.max(1);
        }
        if let Some(value) = env_parsed::<u64>("FARMBOOK_PROBE_INTERVAL_SECS") {
            cfg.sync.probe_interval_secs = value.max(1);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.remote.timeout_secs == 0 {
            return Err("Remote timeout_secs must be greater than 0".to_string());
        }
        if let Some(url) = &self.remote.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("Remote base_url must be an http(s) url: {url}"));
            }
        }
        if self.sync.auto_sync && self.sync.sync_interval_secs == 0 {
            return Err("Sync sync_interval_secs must be greater than 0".to_string());
        }
        if self.sync.probe_interval_secs == 0 {
            return Err("Sync probe_interval_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("./data"));
    let path = base.join("farmbook").join("farmbook.db");
    format!("sqlite://{}", path.display())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
