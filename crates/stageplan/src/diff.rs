//! Diff computation between two snapshots

use crate::snapshot::Snapshot;
use crate::types::PathSet;
use serde::{Deserialize, Serialize};

/// Paths that differ between a new and an old snapshot
///
/// The three sets are pairwise disjoint. Paths present in both snapshots
/// with the same hash appear in none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    /// In new, not in old
    pub added: PathSet,
    /// In old, not in new
    pub removed: PathSet,
    /// In both, hash differs
    pub changed: PathSet,
}

impl ChangeSet {
    /// Check if there are no changes at all
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Total number of changed paths
    pub fn total(&self) -> usize {
        self.added.len() + self.removed.len() + self.changed.len()
    }

    /// Count summary
    pub fn summary(&self) -> DiffSummary {
        DiffSummary {
            additions: self.added.len(),
            removals: self.removed.len(),
            modifications: self.changed.len(),
        }
    }
}

/// Compute the change set from `old` to `new`
pub fn diff(new: &Snapshot, old: &Snapshot) -> ChangeSet {
    let added: PathSet = new.paths().filter(|p| !old.contains(p)).collect();
    let removed: PathSet = old.paths().filter(|p| !new.contains(p)).collect();

    let changed: PathSet = new
        .iter()
        .filter(|(path, hash)| {
            old.get(path).is_some_and(|old_hash| old_hash != *hash)
                && !added.contains(path)
                && !removed.contains(path)
        })
        .map(|(path, _)| path)
        .collect();

    ChangeSet {
        added,
        removed,
        changed,
    }
}

/// Diff summary statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Number of paths to add
    pub additions: usize,
    /// Number of paths to remove
    pub removals: usize,
    /// Number of paths to update
    pub modifications: usize,
}

impl DiffSummary {
    /// Total number of changes
    pub fn total(&self) -> usize {
        self.additions + self.removals + self.modifications
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        self.total() > 0
    }
}
