//! # config
//!
//! why: bound how many committed entries stay in memory before compaction
//! relations: read by committed.rs (maybe_compact), loaded by the owning node
//! what: LogConfig with defaults, json loading and validation

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Retention settings for the in-memory committed log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Real entries kept after a compaction triggered by the retention policy
    pub min_entries_in_memory: usize,
    /// Compaction is triggered once the log holds more real entries than this
    pub max_entries_in_memory: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            min_entries_in_memory: 100,
            max_entries_in_memory: 1000,
        }
    }
}

impl LogConfig {
    /// Parse a config from json. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LogConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries_in_memory == 0 {
            return Err(Error::InvalidConfig(
                "max_entries_in_memory must be positive".to_string(),
            ));
        }
        if self.min_entries_in_memory > self.max_entries_in_memory {
            return Err(Error::InvalidConfig(format!(
                "min_entries_in_memory {} exceeds max_entries_in_memory {}",
                self.min_entries_in_memory, self.max_entries_in_memory
            )));
        }
        Ok(())
    }
}
