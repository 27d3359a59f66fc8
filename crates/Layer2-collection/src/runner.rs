//! Task attempt execution and state transitions
//!
//! One [`TaskRunner`] drives one task through its attempts: the retry cycle
//! is an explicit loop, so attempts of the same task are serialized and the
//! attempt count stays inspectable. A task's own errors never escape the
//! runner; the outcome is communicated purely through the status map.

use crate::retry::RetryPolicy;
use crate::state::CollectionState;
use crate::status::{JobStatus, TaskStatus};
use crate::store::StatusStore;
use crate::task::CollectionTask;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Executes task attempts and manages their visible state transitions
#[derive(Clone)]
pub struct TaskRunner {
    status: Arc<RwLock<JobStatus>>,
    store: Arc<StatusStore>,
    retry_policy: RetryPolicy,
}

impl TaskRunner {
    pub fn new(
        status: Arc<RwLock<JobStatus>>,
        store: Arc<StatusStore>,
        retry_policy: RetryPolicy,
    ) -> Self {
        Self {
            status,
            store,
            retry_policy,
        }
    }

    /// Run one task to a terminal state, retrying failed attempts up to the
    /// policy's bound
    ///
    /// Retries are immediate: a failed attempt cycles the status back to
    /// `Queued` with an incremented retry count and the next attempt starts
    /// right away.
    pub async fn run_attempts(&self, task: Arc<dyn CollectionTask>, task_name: &str) {
        let mut retry_count: u32 = 0;
        loop {
            self.transition(task_name, |current| {
                current.with_state(CollectionState::InProgress)
            })
            .await;

            match task.collect().await {
                Ok(()) => {
                    debug!("Task {} finished", task_name);
                    self.transition(task_name, |current| {
                        current.with_state(CollectionState::Finished)
                    })
                    .await;
                    return;
                }
                Err(e) => {
                    warn!("Task {} attempt failed: {}", task_name, e);
                    if self.retry_policy.should_retry(retry_count) {
                        retry_count += 1;
                        self.transition(task_name, |current| current.requeued(retry_count))
                            .await;
                    } else {
                        error!(
                            "Task {} reached maximum retries ({})",
                            task_name,
                            self.retry_policy.max_retries()
                        );
                        self.transition(task_name, |current| {
                            current.with_state(CollectionState::Failed)
                        })
                        .await;
                        return;
                    }
                }
            }
        }
    }

    /// Force the task's current status to `Failed`
    ///
    /// Used by the coordinator when a task times out or its handle cannot be
    /// drained.
    pub async fn force_fail(&self, task_name: &str) {
        self.transition(task_name, |current| {
            current.with_state(CollectionState::Failed)
        })
        .await;
    }

    /// Replace the task's current record and persist the snapshot
    async fn transition<F>(&self, task_name: &str, next: F)
    where
        F: FnOnce(&TaskStatus) -> TaskStatus,
    {
        {
            let mut status = self.status.write().await;
            let record = status.task(task_name).map(next);
            if let Some(record) = record {
                status.upsert(record);
            }
        }
        self.store.persist(&self.status).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bundle_foundation::{Error, Result};
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct FailNTimes {
        fail_times: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl CollectionTask for FailNTimes {
        fn name(&self) -> &str {
            "FailNTimes"
        }

        async fn collect(&self) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.fail_times {
                Err(Error::task("collection failed"))
            } else {
                Ok(())
            }
        }
    }

    fn runner_fixture(max_retries: u32, dir: &std::path::Path) -> (TaskRunner, Arc<RwLock<JobStatus>>) {
        let status = Arc::new(RwLock::new(JobStatus::new(Uuid::new_v4())));
        let store = Arc::new(StatusStore::new(dir));
        let runner = TaskRunner::new(Arc::clone(&status), store, RetryPolicy::new(max_retries));
        (runner, status)
    }

    #[tokio::test]
    async fn test_success_after_one_retry() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, status) = runner_fixture(1, dir.path());
        status
            .write()
            .await
            .upsert(TaskStatus::queued("t", "FailNTimes"));

        let task = Arc::new(FailNTimes {
            fail_times: 1,
            attempts: AtomicU32::new(0),
        });
        runner.run_attempts(task.clone(), "t").await;

        let final_status = status.read().await;
        let record = final_status.task("t").unwrap();
        assert_eq!(record.state, CollectionState::Finished);
        assert_eq!(record.retry_count, 1);
        assert_eq!(task.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, status) = runner_fixture(2, dir.path());
        status
            .write()
            .await
            .upsert(TaskStatus::queued("t", "FailNTimes"));

        let task = Arc::new(FailNTimes {
            fail_times: u32::MAX,
            attempts: AtomicU32::new(0),
        });
        runner.run_attempts(task.clone(), "t").await;

        let final_status = status.read().await;
        let record = final_status.task("t").unwrap();
        assert_eq!(record.state, CollectionState::Failed);
        assert_eq!(record.retry_count, 2);
        // first attempt plus two retries
        assert_eq!(task.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_force_fail_preserves_retry_count() {
        let dir = tempfile::tempdir().unwrap();
        let (runner, status) = runner_fixture(0, dir.path());
        status
            .write()
            .await
            .upsert(TaskStatus::queued("t", "FailNTimes").requeued(2));

        runner.force_fail("t").await;

        let final_status = status.read().await;
        let record = final_status.task("t").unwrap();
        assert_eq!(record.state, CollectionState::Failed);
        assert_eq!(record.retry_count, 2);
    }
}
