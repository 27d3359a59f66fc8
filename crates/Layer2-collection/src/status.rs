//! Job and task status records
//!
//! A [`TaskStatus`] is an immutable snapshot of one task at one point in its
//! lifecycle. State changes never mutate a record in place: each transition
//! produces a new record that replaces the current one in [`JobStatus`].

use crate::state::CollectionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Current status snapshot of one collection task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Stable external identifier: `"<job-uuid>: <type qualifier>"`
    pub name: String,

    /// Type qualifier of the implementing collector
    #[serde(rename = "type")]
    pub task_type: String,

    /// Lifecycle state
    pub state: CollectionState,

    /// When the task was first registered with the job
    pub started_at: DateTime<Utc>,

    /// Retry attempts consumed so far
    #[serde(default)]
    pub retry_count: u32,
}

impl TaskStatus {
    /// Create the initial `Queued` record for a task
    pub fn queued(name: impl Into<String>, task_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_type: task_type.into(),
            state: CollectionState::Queued,
            started_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// New record with a different state, superseding this one
    pub fn with_state(&self, state: CollectionState) -> Self {
        Self {
            state,
            ..self.clone()
        }
    }

    /// New `Queued` record for a retry attempt, superseding this one
    pub fn requeued(&self, retry_count: u32) -> Self {
        Self {
            state: CollectionState::Queued,
            retry_count,
            ..self.clone()
        }
    }
}

/// Aggregate status of one collection job
///
/// Holds the current [`TaskStatus`] per task, keyed by task name, plus
/// job-level metadata. Shared between the coordinator and worker tasks
/// behind an `RwLock`; the map is only ever touched for distinct task names
/// concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job identifier
    pub job_id: Uuid,

    /// Job-level state: `InProgress` while running, then `Finished` or
    /// `Failed` depending on the task outcomes
    pub state: CollectionState,

    /// When the job started
    pub started_at: DateTime<Utc>,

    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,

    /// Current status per task, keyed by task name
    pub tasks: HashMap<String, TaskStatus>,
}

impl JobStatus {
    /// Create a fresh in-progress job status
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            state: CollectionState::InProgress,
            started_at: Utc::now(),
            finished_at: None,
            tasks: HashMap::new(),
        }
    }

    /// Insert or replace the current record for a task
    pub fn upsert(&mut self, status: TaskStatus) {
        self.tasks.insert(status.name.clone(), status);
    }

    /// Get the current record for a task
    pub fn task(&self, name: &str) -> Option<&TaskStatus> {
        self.tasks.get(name)
    }

    /// Check if every task has reached a terminal state
    pub fn all_terminal(&self) -> bool {
        self.tasks.values().all(|t| t.state.is_terminal())
    }

    /// Check if any task ended in failure
    pub fn has_failed_tasks(&self) -> bool {
        self.tasks.values().any(|t| t.state.is_failed())
    }

    /// Mark the job itself terminal, derived from the task outcomes
    pub fn finalize(&mut self) {
        self.state = if self.has_failed_tasks() {
            CollectionState::Failed
        } else {
            CollectionState::Finished
        };
        self.finished_at = Some(Utc::now());
    }
}
