//! Snapshots and restore
//!
//! A `Snapshot` is an ordered, immutable copy of a store's live records.
//! It is the export source and the import payload. Restoring a snapshot
//! into a store reconciles the two by id (see `merge`): matching ids are
//! replaced, new ids are inserted, live records without a counterpart are
//! kept, and invalid incoming records are reported and skipped.

mod io;
mod merge;

pub use io::SnapshotLoad;
pub use merge::{plan_restore, MergeAction, MergePlan, RestoreIssue, RestoreReport};

use crate::record::Record;

/// Point-in-time copy of live records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<Record>,
}

impl Snapshot {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}
