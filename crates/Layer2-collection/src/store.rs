//! Durable status snapshot storage
//!
//! The status file is the only externally observable progress signal while a
//! job runs: a polling client reads it at any time to see every task's
//! current state. Each transition rewrites the full snapshot.

use crate::status::JobStatus;
use bundle_foundation::{Error, Result};
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::error;

/// Well-known snapshot file name under a job's base path
pub const STATUS_FILE_NAME: &str = "status.json";

/// Writes [`JobStatus`] snapshots to `status.json` under the job's base path
///
/// Safe to call from any number of task-completion paths concurrently:
/// writes are serialized by an internal lock, and the snapshot is cloned
/// inside that lock, so the last write always carries the newest state.
/// Files land via a temp-file rename, so a reader never sees a torn
/// snapshot.
#[derive(Debug)]
pub struct StatusStore {
    base_path: PathBuf,
    write_lock: Mutex<()>,
}

impl StatusStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the snapshot file
    pub fn status_file_path(&self) -> PathBuf {
        self.base_path.join(STATUS_FILE_NAME)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Persist the current snapshot
    ///
    /// An I/O failure is logged and swallowed: losing one snapshot update
    /// must not fail the job.
    pub async fn persist(&self, status: &RwLock<JobStatus>) {
        let _guard = self.write_lock.lock().await;
        let snapshot = status.read().await.clone();
        if let Err(e) = self.write_snapshot(&snapshot) {
            error!("Failed to update status file: {}", e);
        }
    }

    fn write_snapshot(&self, snapshot: &JobStatus) -> Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp_path = self.base_path.join(format!(".{}.tmp", STATUS_FILE_NAME));
        std::fs::write(&tmp_path, content)
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", tmp_path.display(), e)))?;
        std::fs::rename(&tmp_path, self.status_file_path()).map_err(|e| {
            Error::Storage(format!("Failed to replace {}: {}", STATUS_FILE_NAME, e))
        })?;
        Ok(())
    }

    /// Read the persisted snapshot back
    pub async fn load(&self) -> Result<JobStatus> {
        let path = self.status_file_path();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Storage(format!("Failed to read {}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CollectionState;
    use crate::status::TaskStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_persist_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path());

        let mut job = JobStatus::new(Uuid::new_v4());
        job.upsert(TaskStatus::queued("job: LogTask", "LogTask"));
        let status = RwLock::new(job.clone());

        store.persist(&status).await;

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.job_id, job.job_id);
        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(
            loaded.task("job: LogTask").unwrap().state,
            CollectionState::Queued
        );
    }

    #[tokio::test]
    async fn test_persist_overwrites_prior_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::new(dir.path());

        let status = RwLock::new(JobStatus::new(Uuid::new_v4()));
        store.persist(&status).await;

        status
            .write()
            .await
            .upsert(TaskStatus::queued("job: ConfigTask", "ConfigTask").with_state(CollectionState::Finished));
        store.persist(&status).await;

        let loaded = store.load().await.unwrap();
        assert_eq!(
            loaded.task("job: ConfigTask").unwrap().state,
            CollectionState::Finished
        );
    }

    #[tokio::test]
    async fn test_persist_failure_is_not_fatal() {
        // Nonexistent directory: the write fails, persist just logs
        let store = StatusStore::new("/nonexistent/bundle/dir");
        let status = RwLock::new(JobStatus::new(Uuid::new_v4()));
        store.persist(&status).await;
        assert!(store.load().await.is_err());
    }
}
