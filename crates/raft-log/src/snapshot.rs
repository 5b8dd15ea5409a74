//! # snapshot
//!
//! why: describe the log position a state machine snapshot covers
//! relations: supplied by the snapshot installation path, consumed by committed.rs
//! what: SnapshotMeta (last included index/term), RaftSnapshot with opaque content

use serde::{Deserialize, Serialize};

/// Position of the last log entry captured by a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub last_included_index: u64,
    pub last_included_term: u64,
}

impl SnapshotMeta {
    pub fn new(last_included_index: u64, last_included_term: u64) -> Self {
        Self { last_included_index, last_included_term }
    }
}

/// A state machine snapshot. The content is never interpreted by the log.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaftSnapshot {
    pub meta: SnapshotMeta,
    pub data: Vec<u8>,
}

impl RaftSnapshot {
    /// Create a snapshot carrying only metadata
    pub fn new(meta: SnapshotMeta) -> Self {
        Self { meta, data: Vec::new() }
    }

    pub fn with_data(meta: SnapshotMeta, data: Vec<u8>) -> Self {
        Self { meta, data }
    }
}
