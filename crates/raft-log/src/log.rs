//! # log
//!
//! why: define the record that raft replicates and the committed log stores
//! relations: held by committed.rs, produced by replication, consumed by the state machine
//! what: LogEntry struct and the dummy (sentinel) constructor

use serde::{Deserialize, Serialize};

/// A single entry in the replicated log
///
/// Entries are immutable once created. The command is opaque to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The term when this entry was created
    pub term: u64,
    /// The index of this entry in the log
    pub index: u64,
    /// The command to be applied to the state machine
    pub command: Vec<u8>,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(term: u64, index: u64, command: Vec<u8>) -> Self {
        Self { term, index, command }
    }

    /// Create a sentinel entry marking the last compacted or snapshotted position.
    pub fn dummy(index: u64, term: u64) -> Self {
        Self::new(term, index, Vec::new())
    }
}
