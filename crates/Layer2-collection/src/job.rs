//! Job coordinator - runs a collection job to completion
//!
//! The coordinator instantiates tasks from factories, submits them to a
//! bounded worker pool, then drains the resulting handles under each task's
//! remaining timeout budget. `run` returns only once every submitted task
//! has reached a terminal state.

use crate::retry::RetryPolicy;
use crate::runner::TaskRunner;
use crate::status::{JobStatus, TaskStatus};
use crate::store::StatusStore;
use crate::task::{CollectionJob, CollectionTask, CollectionTaskFactory};
use bundle_foundation::{CollectionConfig, Error, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::{error, info};

/// Pending result of one submitted task
///
/// Pairs the join handle of a task's attempt loop with its submission
/// timestamp. Lives only between submission and drain; the timeout budget is
/// anchored at `started_at`, so retries of the task consume the same window.
pub struct RunningTaskHandle {
    task_name: String,
    started_at: Instant,
    handle: JoinHandle<()>,
}

impl RunningTaskHandle {
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Top-level orchestrator for one collection job
pub struct JobCoordinator {
    factories: Vec<Arc<dyn CollectionTaskFactory>>,
    config: CollectionConfig,
    pool: Arc<Semaphore>,
}

impl JobCoordinator {
    /// Create a coordinator with its own worker pool sized
    /// `config.max_concurrent`
    pub fn new(factories: Vec<Arc<dyn CollectionTaskFactory>>, config: CollectionConfig) -> Self {
        // A pool with zero permits would never run anything
        let pool = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self::with_pool(factories, config, pool)
    }

    /// Create a coordinator on a caller-supplied pool
    ///
    /// Several concurrently running jobs may share one pool; each job keeps
    /// its own coordinator.
    pub fn with_pool(
        factories: Vec<Arc<dyn CollectionTaskFactory>>,
        config: CollectionConfig,
        pool: Arc<Semaphore>,
    ) -> Self {
        Self {
            factories,
            config,
            pool,
        }
    }

    /// Run the job to completion and return the final status
    ///
    /// Fails only on setup (no factories, base directory not creatable).
    /// Per-task failures and timeouts are absorbed into task state: every
    /// task ends `Finished` or `Failed`, never an error out of `run`.
    pub async fn run(&self, job: CollectionJob) -> Result<JobStatus> {
        if self.factories.is_empty() {
            return Err(Error::Setup(
                "no collection task factories registered".to_string(),
            ));
        }
        std::fs::create_dir_all(job.base_path()).map_err(|e| {
            Error::Setup(format!(
                "cannot create job directory {}: {}",
                job.base_path().display(),
                e
            ))
        })?;

        let status = Arc::new(RwLock::new(JobStatus::new(job.id)));
        let store = Arc::new(StatusStore::new(job.base_path()));
        let runner = TaskRunner::new(
            Arc::clone(&status),
            Arc::clone(&store),
            RetryPolicy::new(self.config.max_retries),
        );

        let tasks: Vec<Arc<dyn CollectionTask>> =
            self.factories.iter().map(|f| f.create(&job)).collect();
        info!(
            "Starting collection job {} with {} tasks",
            job.id,
            tasks.len()
        );

        let mut submitted = VecDeque::with_capacity(tasks.len());
        for task in tasks {
            let task_name = job.task_name(task.name());
            {
                let mut current = status.write().await;
                current.upsert(TaskStatus::queued(task_name.clone(), task.name()));
            }
            store.persist(&status).await;
            submitted.push_back(self.submit(task, task_name, &runner));
        }

        self.drain(&mut submitted, &runner).await;

        {
            let mut current = status.write().await;
            current.finalize();
        }
        store.persist(&status).await;

        let final_status = status.read().await.clone();
        info!(
            "Collection job {} completed with state {}",
            job.id, final_status.state
        );
        Ok(final_status)
    }

    /// Spawn one task's attempt loop onto the pool
    ///
    /// Never blocks the coordinating thread: pool admission happens inside
    /// the spawned future, but the timeout budget starts counting here.
    fn submit(
        &self,
        task: Arc<dyn CollectionTask>,
        task_name: String,
        runner: &TaskRunner,
    ) -> RunningTaskHandle {
        let runner = runner.clone();
        let pool = Arc::clone(&self.pool);
        let name = task_name.clone();
        let handle = tokio::spawn(async move {
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                // pool closed, nothing left to run
                Err(_) => return,
            };
            runner.run_attempts(task, &name).await;
        });
        RunningTaskHandle {
            task_name,
            started_at: Instant::now(),
            handle,
        }
    }

    /// Wait out every submitted handle, strictly in submission order
    ///
    /// Each wait is bounded by that task's remaining budget
    /// (`max_task_timeout` minus time since its submission; zero or less
    /// means an immediate timeout). A slow task at the head delays the
    /// coordinator's *observation* of later completions, not their
    /// execution, which proceeds concurrently on the pool.
    async fn drain(&self, submitted: &mut VecDeque<RunningTaskHandle>, runner: &TaskRunner) {
        while let Some(mut running) = submitted.pop_front() {
            let remaining = self
                .config
                .max_task_timeout()
                .saturating_sub(running.started_at.elapsed());
            match timeout(remaining, &mut running.handle).await {
                // Terminal state already written by the runner
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Task {} could not be drained: {}", running.task_name, e);
                    running.handle.abort();
                    runner.force_fail(&running.task_name).await;
                }
                Err(_) => {
                    error!(
                        "Task {} exceeded its {}s budget",
                        running.task_name, self.config.max_task_timeout_secs
                    );
                    // Best-effort cancellation; a non-cooperative task may
                    // run on, but its result is no longer consumed
                    running.handle.abort();
                    runner.force_fail(&running.task_name).await;
                }
            }
        }
    }
}
