//! # committed
//!
//! why: hold the committed part of the raft log, compacted up to a snapshot boundary
//! relations: uses log.rs for entries, snapshot.rs for boundaries, config.rs for retention
//! what: CommittedEntryManager with term lookup, range reads, compaction, snapshot and append
//!
//! The sequence always starts with a dummy entry holding the index and term of the last
//! compacted (or snapshotted) entry, followed by contiguous real entries:
//!
//! ```text
//! position | 0 (dummy) | 1 | 2 | 3
//! index    |     3     | 4 | 5 | 6
//! ```

use crate::config::LogConfig;
use crate::error::{Error, Result};
use crate::log::LogEntry;
use crate::snapshot::{RaftSnapshot, SnapshotMeta};
use ::log::{debug, warn};

/// In-memory committed log entries
///
/// Not synchronized; the owning consensus module serializes access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedEntryManager {
    /// entries[0] is the dummy, entries[i].index == entries[0].index + i
    entries: Vec<LogEntry>,
}

impl CommittedEntryManager {
    /// Create a manager from an initial entry list whose first element is the dummy.
    ///
    /// If a snapshot newer than the dummy is given, the list collapses to a single dummy
    /// at the snapshot boundary.
    ///
    /// # Panics
    ///
    /// Panics if `entries` is empty or its indexes are not contiguous.
    pub fn new(entries: Vec<LogEntry>, snapshot: Option<&RaftSnapshot>) -> Self {
        assert!(!entries.is_empty(), "committed log requires a dummy entry");
        assert!(
            is_contiguous(&entries),
            "committed entries are not contiguous"
        );

        let mut manager = Self { entries };
        if let Some(snapshot) = snapshot {
            manager.apply_snapshot(snapshot.meta);
        }
        manager
    }

    pub fn dummy_index(&self) -> u64 {
        self.entries[0].index
    }

    pub fn dummy_term(&self) -> u64 {
        self.entries[0].term
    }

    /// Index of the oldest real entry, whether or not it has been received yet.
    pub fn first_index(&self) -> u64 {
        self.dummy_index().saturating_add(1)
    }

    /// Index of the newest entry; equals the dummy index when there are no real entries.
    pub fn last_index(&self) -> u64 {
        self.last().index
    }

    pub fn last_term(&self) -> u64 {
        self.last().term
    }

    /// Number of real (non-dummy) entries.
    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, the dummy included.
    pub fn all_entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Returns the term at `index`, including the dummy's own term.
    ///
    /// `None` if the index has been compacted away or has not been received.
    pub fn term(&self, index: u64) -> Option<u64> {
        let dummy_index = self.dummy_index();
        if index < dummy_index || index > self.last_index() {
            return None;
        }
        Some(self.entries[(index - dummy_index) as usize].term)
    }

    /// Log matching check for `(prev_log_index, prev_log_term)`.
    pub fn match_term(&self, index: u64, term: u64) -> bool {
        self.term(index) == Some(term)
    }

    /// Returns the real entries in `[low, high)`. `high` is capped at `last_index + 1`.
    ///
    /// Fails with [`Error::EntryCompacted`] if `low` is at or below the dummy index.
    pub fn entries(&self, low: u64, high: u64) -> Result<&[LogEntry]> {
        let dummy_index = self.dummy_index();
        if low <= dummy_index {
            return Err(Error::EntryCompacted { index: low, dummy_index });
        }

        // Positions relative to the dummy; end is capped at the sequence length.
        let start = low - dummy_index;
        let end = high.saturating_sub(dummy_index).min(self.entries.len() as u64);
        if start >= end {
            return Ok(&[]);
        }
        Ok(&self.entries[start as usize..end as usize])
    }

    /// Discards entries below `compact_index`; the entry at `compact_index` becomes the dummy.
    ///
    /// A no-op if `compact_index` is at or below the dummy index. Fails with
    /// [`Error::EntryUnavailable`], leaving the log untouched, if it is past the last index.
    pub fn compact_entries(&mut self, compact_index: u64) -> Result<()> {
        let dummy_index = self.dummy_index();
        if compact_index <= dummy_index {
            return Ok(());
        }
        let last_index = self.last_index();
        if compact_index > last_index {
            return Err(Error::EntryUnavailable { index: compact_index, last_index });
        }

        let offset = (compact_index - dummy_index) as usize;
        self.entries.drain(..offset);
        debug!("Compacted committed log {} → {}", dummy_index, compact_index);
        Ok(())
    }

    /// Replaces the whole log with a dummy at the snapshot boundary, unless the snapshot
    /// is at or below the current dummy.
    pub fn apply_snapshot(&mut self, meta: SnapshotMeta) {
        let dummy_index = self.dummy_index();
        if meta.last_included_index <= dummy_index {
            debug!(
                "Ignoring stale snapshot at {} (dummy index {})",
                meta.last_included_index, dummy_index
            );
            return;
        }

        self.entries.clear();
        self.entries.push(LogEntry::dummy(meta.last_included_index, meta.last_included_term));
        debug!(
            "Applied snapshot at index {} term {}",
            meta.last_included_index, meta.last_included_term
        );
    }

    /// Merges replicated entries into the log using the raft log matching rule.
    ///
    /// Entries at or below the dummy index are skipped. Matching (index, term) pairs are
    /// left untouched; at the first term mismatch the existing tail is dropped and replaced
    /// by the remaining incoming entries. Entries past the last index are appended.
    ///
    /// `incoming` must be sorted by index and contiguous; a gapped batch is ignored.
    pub fn append(&mut self, incoming: &[LogEntry]) {
        if !is_contiguous(incoming) {
            warn!("Ignoring append of non-contiguous entries");
            return;
        }

        let dummy_index = self.dummy_index();
        let stale = incoming.iter().take_while(|e| e.index <= dummy_index).count();
        let incoming = &incoming[stale..];
        let Some(first) = incoming.first() else {
            return;
        };

        let offset = usize::try_from(first.index - dummy_index).unwrap_or(usize::MAX);
        if offset > self.entries.len() {
            warn!(
                "Missing log entries, ignoring append at {} (last index {})",
                first.index,
                self.last_index()
            );
            return;
        }

        // [offset..] of existing and [..overlap] of incoming cover the same indexes.
        let overlap = (self.entries.len() - offset).min(incoming.len());
        let conflict = (0..overlap).find(|&k| self.entries[offset + k].term != incoming[k].term);

        match conflict {
            Some(k) => {
                let at = &incoming[k];
                debug!(
                    "Truncating committed log at {} (term {} → {})",
                    at.index,
                    self.entries[offset + k].term,
                    at.term
                );
                self.entries.truncate(offset + k);
                self.entries.extend_from_slice(&incoming[k..]);
            }
            None => self.entries.extend_from_slice(&incoming[overlap..]),
        }
    }

    /// Index the retention policy would compact to, if the log has outgrown it.
    pub fn compaction_index(&self, config: &LogConfig) -> Option<u64> {
        if self.len() <= config.max_entries_in_memory {
            return None;
        }
        let keep = config.min_entries_in_memory.min(self.len()) as u64;
        let index = self.last_index() - keep;
        (index > self.dummy_index()).then_some(index)
    }

    /// Compacts according to the retention policy, returning the new dummy index if
    /// anything was discarded.
    pub fn maybe_compact(&mut self, config: &LogConfig) -> Result<Option<u64>> {
        let Some(index) = self.compaction_index(config) else {
            return Ok(None);
        };
        self.compact_entries(index)?;
        Ok(Some(index))
    }

    fn last(&self) -> &LogEntry {
        // Non-empty by construction; every mutation keeps the dummy.
        &self.entries[self.entries.len() - 1]
    }
}

fn is_contiguous(entries: &[LogEntry]) -> bool {
    entries.windows(2).all(|w| w[0].index.checked_add(1) == Some(w[1].index))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(u64, u64)]) -> Vec<LogEntry> {
        pairs.iter().map(|&(index, term)| LogEntry::new(term, index, Vec::new())).collect()
    }

    fn manager(pairs: &[(u64, u64)]) -> CommittedEntryManager {
        CommittedEntryManager::new(entries(pairs), None)
    }

    #[test]
    fn single_dummy_has_no_real_entries() {
        let log = manager(&[(1, 1)]);
        assert_eq!(log.dummy_index(), 1);
        assert_eq!(log.first_index(), 2);
        assert_eq!(log.last_index(), 1);
        assert!(log.is_empty());
    }

    #[test]
    #[should_panic(expected = "requires a dummy entry")]
    fn empty_initial_list_panics() {
        CommittedEntryManager::new(Vec::new(), None);
    }

    #[test]
    #[should_panic(expected = "not contiguous")]
    fn gapped_initial_list_panics() {
        manager(&[(3, 3), (5, 5)]);
    }

    #[test]
    fn snapshot_at_dummy_keeps_entries() {
        let snapshot = RaftSnapshot::new(SnapshotMeta::new(3, 3));
        let log = CommittedEntryManager::new(entries(&[(3, 3), (4, 4), (5, 5)]), Some(&snapshot));
        assert_eq!(log.last_index(), 5);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn newer_snapshot_collapses_at_construction() {
        let snapshot = RaftSnapshot::new(SnapshotMeta::new(9, 4));
        let log = CommittedEntryManager::new(entries(&[(3, 3), (4, 4)]), Some(&snapshot));
        assert_eq!(log.all_entries(), &[LogEntry::dummy(9, 4)]);
    }

    #[test]
    fn entries_with_low_past_last_is_empty() {
        let log = manager(&[(3, 3), (4, 4)]);
        assert!(log.entries(10, 20).unwrap().is_empty());
        assert!(log.entries(4, 4).unwrap().is_empty());
        assert!(log.entries(4, 2).unwrap().is_empty());
    }

    #[test]
    fn failed_compaction_leaves_log_unchanged() {
        let mut log = manager(&[(3, 3), (4, 4), (5, 5)]);
        let before = log.clone();
        let err = log.compact_entries(6).unwrap_err();
        assert!(matches!(err, Error::EntryUnavailable { index: 6, last_index: 5 }));
        assert_eq!(log, before);
    }

    #[test]
    fn compact_to_last_leaves_only_dummy() {
        let mut log = manager(&[(3, 3), (4, 4), (5, 5)]);
        log.compact_entries(5).unwrap();
        assert_eq!(log.dummy_index(), 5);
        assert_eq!(log.dummy_term(), 5);
        assert!(log.is_empty());
    }

    #[test]
    fn append_with_gap_is_ignored() {
        let mut log = manager(&[(3, 3), (4, 4)]);
        log.append(&entries(&[(7, 4), (8, 4)]));
        assert_eq!(log.all_entries(), entries(&[(3, 3), (4, 4)]).as_slice());
    }

    #[test]
    fn append_right_after_snapshot() {
        let mut log = manager(&[(3, 3), (4, 4)]);
        log.apply_snapshot(SnapshotMeta::new(10, 6));
        log.append(&entries(&[(11, 6), (12, 7)]));
        assert_eq!(log.all_entries(), entries(&[(10, 6), (11, 6), (12, 7)]).as_slice());
    }

    #[test]
    fn append_conflict_in_middle_of_incoming() {
        let mut log = manager(&[(3, 3), (4, 4), (5, 5), (6, 5)]);
        log.append(&entries(&[(4, 4), (5, 6), (6, 6), (7, 6)]));
        let expected = entries(&[(3, 3), (4, 4), (5, 6), (6, 6), (7, 6)]);
        assert_eq!(log.all_entries(), expected.as_slice());
    }

    #[test]
    fn append_matching_prefix_keeps_longer_tail() {
        let mut log = manager(&[(3, 3), (4, 4), (5, 5), (6, 5)]);
        log.append(&entries(&[(4, 4)]));
        assert_eq!(log.last_index(), 6);
    }

    #[test]
    fn matching_append_keeps_existing_commands() {
        let mut log = CommittedEntryManager::new(
            vec![LogEntry::dummy(3, 3), LogEntry::new(4, 4, b"original".to_vec())],
            None,
        );
        log.append(&[LogEntry::new(4, 4, b"resent".to_vec())]);
        assert_eq!(log.entries(4, 5).unwrap()[0].command, b"original".to_vec());
    }

    #[test]
    fn match_term_checks_index_and_term() {
        let log = manager(&[(3, 3), (4, 4), (5, 5)]);
        assert!(log.match_term(3, 3));
        assert!(log.match_term(5, 5));
        assert!(!log.match_term(5, 4));
        assert!(!log.match_term(6, 5));
        assert!(!log.match_term(2, 2));
    }

    #[test]
    fn retention_policy_keeps_min_entries() {
        let pairs: Vec<(u64, u64)> = (0..=20).map(|i| (i, 1)).collect();
        let mut log = manager(&pairs);
        let config = LogConfig { min_entries_in_memory: 5, max_entries_in_memory: 10 };

        assert_eq!(log.compaction_index(&config), Some(15));
        assert_eq!(log.maybe_compact(&config).unwrap(), Some(15));
        assert_eq!(log.dummy_index(), 15);
        assert_eq!(log.len(), 5);
        assert_eq!(log.maybe_compact(&config).unwrap(), None);
    }

    #[test]
    fn retention_policy_with_zero_min_compacts_everything() {
        let pairs: Vec<(u64, u64)> = (0..=3).map(|i| (i, 1)).collect();
        let mut log = manager(&pairs);
        let config = LogConfig { min_entries_in_memory: 0, max_entries_in_memory: 2 };

        assert_eq!(log.maybe_compact(&config).unwrap(), Some(3));
        assert!(log.is_empty());
        assert_eq!(log.dummy_index(), 3);
    }

    #[test]
    fn indexes_at_u64_max_do_not_overflow() {
        let max = u64::MAX;
        let log = manager(&[(max - 2, 1), (max - 1, 1), (max, 2)]);
        assert_eq!(log.last_index(), max);
        assert_eq!(log.term(max), Some(2));
        assert_eq!(log.entries(max - 1, max).unwrap().len(), 1);
        assert_eq!(log.entries(max - 1, max).unwrap()[0].index, max - 1);

        let log = manager(&[(max, 3)]);
        assert_eq!(log.first_index(), max);
        assert!(log.entries(max, max).unwrap_err().is_compacted());
    }

    #[test]
    #[should_panic(expected = "not contiguous")]
    fn wrapping_initial_list_panics() {
        manager(&[(u64::MAX, 1), (0, 1)]);
    }

    #[test]
    fn append_far_past_last_is_ignored() {
        let mut log = manager(&[(3, 3), (4, 4)]);
        log.append(&entries(&[(u64::MAX - 1, 5), (u64::MAX, 5)]));
        assert_eq!(log.last_index(), 4);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn retention_policy_with_min_above_max_discards_nothing() {
        let pairs: Vec<(u64, u64)> = (0..=6).map(|i| (i, 1)).collect();
        let mut log = manager(&pairs);
        let config = LogConfig { min_entries_in_memory: 10, max_entries_in_memory: 4 };

        assert_eq!(log.compaction_index(&config), None);
        assert_eq!(log.maybe_compact(&config).unwrap(), None);
        assert_eq!(log.dummy_index(), 0);
        assert_eq!(log.len(), 6);
    }
}
