//! Collection engine configuration
//!
//! Plain value structs. Loading them from a file or the environment is the
//! embedding service's concern.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one collection job run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Maximum retry attempts per task after its first failure
    pub max_retries: u32,

    /// Wall-clock budget per task in seconds, measured from submission.
    /// Retries of a task share the same budget.
    pub max_task_timeout_secs: u64,

    /// Maximum task attempts executing concurrently
    pub max_concurrent: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,              // 3 retries per task
            max_task_timeout_secs: 300,  // 5 minutes per task
            max_concurrent: 4,
        }
    }
}

impl CollectionConfig {
    /// Per-task timeout as a [`Duration`]
    pub fn max_task_timeout(&self) -> Duration {
        Duration::from_secs(self.max_task_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CollectionConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_task_timeout(), Duration::from_secs(300));
        assert_eq!(config.max_concurrent, 4);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = CollectionConfig {
            max_retries: 1,
            max_task_timeout_secs: 5,
            max_concurrent: 2,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CollectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.max_retries, 1);
        assert_eq!(parsed.max_task_timeout_secs, 5);
    }
}
