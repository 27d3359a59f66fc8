//! Collection task state machine

use serde::{Deserialize, Serialize};

/// Lifecycle state of one collection task
///
/// `Queued → InProgress → {Finished | Failed}`. A failed attempt that still
/// has retry budget cycles back to `Queued`; `Finished` and `Failed` after
/// retry exhaustion are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionState {
    /// Task is waiting for a worker (initial state, and again between retries)
    Queued,

    /// Task attempt is currently running
    InProgress,

    /// Task completed successfully
    Finished,

    /// Task failed with retries exhausted, or was forced down by timeout
    Failed,
}

impl CollectionState {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, CollectionState::Finished | CollectionState::Failed)
    }

    /// Check if the task ended in failure
    pub fn is_failed(&self) -> bool {
        matches!(self, CollectionState::Failed)
    }

    /// Get display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            CollectionState::Queued => "Queued",
            CollectionState::InProgress => "InProgress",
            CollectionState::Finished => "Finished",
            CollectionState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CollectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
