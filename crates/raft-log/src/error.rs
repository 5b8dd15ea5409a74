//! # error
//!
//! why: give callers distinguishable failures for reads and compaction on the committed log
//! relations: returned by committed.rs and config.rs
//! what: Error enum, Result alias

/// Result type alias for committed log operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the committed log.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The requested entry has been compacted into a snapshot, or is the dummy boundary.
    #[error("entry {index} is compacted (dummy index {dummy_index})")]
    EntryCompacted {
        /// Requested low index.
        index: u64,
        /// Dummy index at the time of the request.
        dummy_index: u64,
    },

    /// The requested entry has not been received yet.
    #[error("entry {index} is unavailable (last index {last_index})")]
    EntryUnavailable {
        /// Requested index.
        index: u64,
        /// Last index held at the time of the request.
        last_index: u64,
    },

    /// Configuration values are inconsistent.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// True if the caller should fall back to snapshot transfer.
    pub fn is_compacted(&self) -> bool {
        matches!(self, Error::EntryCompacted { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::EntryUnavailable { .. })
    }
}
