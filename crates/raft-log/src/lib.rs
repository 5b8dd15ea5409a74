//! # raft-log
//!
//! why: keep the committed, possibly compacted, suffix of the replicated raft log in memory
//! relations: owned by the consensus module, fed by replication and snapshot installation
//! what: log entries, snapshot metadata, the committed entry manager and its error kinds

pub mod committed;
pub mod config;
pub mod error;
pub mod log;
pub mod snapshot;

pub use committed::CommittedEntryManager;
pub use config::LogConfig;
pub use error::{Error, Result};
pub use crate::log::LogEntry;
pub use snapshot::{RaftSnapshot, SnapshotMeta};
