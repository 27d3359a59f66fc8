//! Collection task abstraction and job identity

use async_trait::async_trait;
use bundle_foundation::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// One collection job instance
///
/// Identifies a single invocation of the engine and the directory its tasks
/// write output (and the status snapshot) into.
#[derive(Debug, Clone)]
pub struct CollectionJob {
    /// Unique job identifier
    pub id: Uuid,

    /// Base output directory for this job
    pub base_path: PathBuf,
}

impl CollectionJob {
    /// Create a new job with a fresh id
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Stable external identifier for a task of this job
    pub fn task_name(&self, qualifier: &str) -> String {
        format!("{}: {}", self.id, qualifier)
    }
}

/// Collection task trait - implement to add new collectors
///
/// A task writes files describing some aspect of system state (logs,
/// configs, metrics) under the job's base path. Output is side-effecting;
/// failures are reported through the returned `Result`.
#[async_trait]
pub trait CollectionTask: Send + Sync {
    /// Type qualifier, used in task names and the status snapshot
    fn name(&self) -> &str;

    /// Perform the collection work
    async fn collect(&self) -> Result<()>;
}

/// Factory producing one task bound to a job's parameters
///
/// Invoked once per task kind when a job starts.
pub trait CollectionTaskFactory: Send + Sync {
    /// Create a task for the given job
    fn create(&self, job: &CollectionJob) -> Arc<dyn CollectionTask>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_name_format() {
        let job = CollectionJob::new("/tmp/bundle");
        let name = job.task_name("SystemLogTask");
        assert_eq!(name, format!("{}: SystemLogTask", job.id));
    }
}
