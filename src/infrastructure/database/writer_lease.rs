//! Single-writer lease for a file-backed local store.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseMeta {
    pub pid: u32,
    pub acquired_at_ms: i64,
    pub version: String,
}

impl LeaseMeta {
    fn current() -> Self {
        Self {
            pid: std::process::id(),
            acquired_at_ms: Utc::now().timestamp_millis(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("local store is locked by another process (lease {path:?}, holder {holder})")]
    Held { path: PathBuf, holder: String },
    #[error("lease path is a symlink: {path:?}")]
    Symlink { path: PathBuf },
    #[error("lease metadata corrupted at {path:?}: {source}")]
    MetadataCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Lock file next to the database. Removed on release or drop.
#[derive(Debug)]
pub struct WriterLease {
    path: PathBuf,
    meta: LeaseMeta,
    released: bool,
}

impl WriterLease {
    pub fn lease_path_for(database_path: &Path) -> PathBuf {
        let mut name = database_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        database_path.with_file_name(name)
    }

    pub fn acquire(database_path: &Path) -> Result<Self, LeaseError> {
        let path = Self::lease_path_for(database_path);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        reject_symlink(&path)?;

        let mut file = match open_new_lock_file(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                let holder = match read_metadata(&path) {
                    Ok(meta) => format!("pid {} since {}", meta.pid, meta.acquired_at_ms),
                    Err(err) => format!("unknown ({err})"),
                };
                return Err(LeaseError::Held { path, holder });
            }
            Err(err) => return Err(LeaseError::Io(err)),
        };

        let meta = LeaseMeta::current();
        serde_json::to_writer(&mut file, &meta).map_err(|source| {
            LeaseError::MetadataCorrupt {
                path: path.clone(),
                source,
            }
        })?;
        file.sync_all()?;

        tracing::debug!(target: "storage", path = %path.display(), "writer lease acquired");

        Ok(Self {
            path,
            meta,
            released: false,
        })
    }

    pub fn meta(&self) -> &LeaseMeta {
        &self.meta
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> Result<(), LeaseError> {
        if !self.released {
            fs::remove_file(&self.path)?;
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for WriterLease {
    fn drop(&mut self) {
        if !self.released {
            let _ = fs::remove_file(&self.path);
        }
    }
}

fn reject_symlink(path: &Path) -> Result<(), LeaseError> {
    if let Ok(meta) = fs::symlink_metadata(path) {
        if meta.file_type().is_symlink() {
            return Err(LeaseError::Symlink {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}

fn read_metadata(path: &Path) -> Result<LeaseMeta, LeaseError> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|source| LeaseError::MetadataCorrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn open_new_lock_file(path: &Path) -> io::Result<fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)
    }
    #[cfg(not(unix))]
    {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("farm.db");

        let lease = WriterLease::acquire(&db_path).unwrap();
        assert_eq!(lease.path(), dir.path().join("farm.db.lock"));
        assert_eq!(lease.meta().pid, std::process::id());

        let err = WriterLease::acquire(&db_path).unwrap_err();
        assert!(matches!(err, LeaseError::Held { .. }));

        lease.release().unwrap();
        let again = WriterLease::acquire(&db_path).unwrap();
        drop(again);
        assert!(!dir.path().join("farm.db.lock").exists());
    }

    #[test]
    fn creates_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("farm.db");
        let lease = WriterLease::acquire(&db_path).unwrap();
        assert!(lease.path().exists());
    }
}
