//! The capability set shared by every backend
//!
//! Backends are chosen at startup and used through `Box<dyn RecordStore>`.
//! Bulk operations (`select`, `delete`, `update`, `make_snapshot`) have
//! default implementations in terms of the per-record primitives.

use chrono::NaiveDate;

use super::errors::{StoreError, StoreResult};
use crate::record::{Assignment, Field, Record, RecordDraft, RecordId, Selection};
use crate::snapshot::{RestoreReport, Snapshot};
use crate::validation::{ValidationFailure, Validator};

/// Live and tombstoned record counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStat {
    pub live: usize,
    /// Always 0 for backends without soft delete
    pub removed: usize,
}

/// A mutable set of records keyed by a unique positive id.
pub trait RecordStore {
    /// Short backend name used in logs and messages
    fn kind(&self) -> &'static str;

    /// Replace the validator used by every later write
    fn set_validator(&mut self, validator: Box<dyn Validator>);

    /// Validate and store a draft under a new id: one past the largest id
    /// the store has held, or 1 when it has held none. Removed ids are
    /// not handed out again.
    fn create(&mut self, draft: RecordDraft) -> StoreResult<RecordId>;

    /// Validate and store a record under its own id.
    ///
    /// Fails with `FC_DUPLICATE_ID` if the id is live; the store is unchanged.
    fn insert(&mut self, record: Record) -> StoreResult<RecordId>;

    /// Validate a draft and replace the fields of record `id`.
    ///
    /// On any failure the stored record is left exactly as it was.
    fn edit(&mut self, id: RecordId, draft: RecordDraft) -> StoreResult<()>;

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>>;

    /// All live records in storage order
    fn get_all(&self) -> StoreResult<Vec<Record>>;

    fn get_stat(&self) -> StoreResult<StoreStat>;

    /// Case-insensitive exact match; empty when nothing matches
    fn find_by_first_name(&self, first_name: &str) -> StoreResult<Vec<Record>>;

    /// Case-insensitive exact match; empty when nothing matches
    fn find_by_last_name(&self, last_name: &str) -> StoreResult<Vec<Record>>;

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<Vec<Record>>;

    /// Live records matching `selection`, in storage order
    fn select(&self, selection: &Selection) -> StoreResult<Vec<Record>> {
        let mut records = self.get_all()?;
        records.retain(|record| selection.matches(record));
        Ok(records)
    }

    /// Remove record `id`. Returns false when no such record is live.
    fn remove(&mut self, id: RecordId) -> StoreResult<bool>;

    /// Remove every record matching `selection`, returning the removed ids.
    fn delete(&mut self, selection: &Selection) -> StoreResult<Vec<RecordId>> {
        let targets: Vec<RecordId> = self.select(selection)?.iter().map(|r| r.id).collect();
        let mut removed = Vec::with_capacity(targets.len());
        for id in targets {
            if self.remove(id)? {
                removed.push(id);
            }
        }
        Ok(removed)
    }

    /// Apply `assignments` to every record matching `selection`.
    ///
    /// `Assignment` cannot target the id, so ids never change here.
    /// Each record is updated through `edit`, so a failing record is left
    /// untouched. The first failure stops the batch and is returned; records
    /// updated before it stay updated, and records after it are not
    /// attempted. The error details carry the failing id and how many
    /// records were updated before it.
    fn update(&mut self, selection: &Selection, assignments: &[Assignment]) -> StoreResult<usize> {
        let targets = self.select(selection)?;
        let mut updated = 0;
        for record in targets {
            let mut draft = record.to_draft();
            for assignment in assignments {
                assignment.apply(&mut draft);
            }
            self.edit(record.id, draft).map_err(|e| {
                e.with_details(format!(
                    "record_id: {}, updated_before_failure: {}",
                    record.id, updated
                ))
            })?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Copy of the live records
    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::new(self.get_all()?))
    }

    /// Merge a snapshot into the live records by id.
    ///
    /// Invalid incoming records are reported in the returned report and
    /// skipped; they never abort the batch.
    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport>;

    /// Compact soft-deleted records away. Returns the number of slots reclaimed.
    fn purge(&mut self) -> StoreResult<usize>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn set_validator(&mut self, validator: Box<dyn Validator>) {
        (**self).set_validator(validator)
    }

    fn create(&mut self, draft: RecordDraft) -> StoreResult<RecordId> {
        (**self).create(draft)
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        (**self).insert(record)
    }

    fn edit(&mut self, id: RecordId, draft: RecordDraft) -> StoreResult<()> {
        (**self).edit(id, draft)
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        (**self).get(id)
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        (**self).get_all()
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        (**self).get_stat()
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<Vec<Record>> {
        (**self).find_by_first_name(first_name)
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<Vec<Record>> {
        (**self).find_by_last_name(last_name)
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<Vec<Record>> {
        (**self).find_by_date_of_birth(date_of_birth)
    }

    fn select(&self, selection: &Selection) -> StoreResult<Vec<Record>> {
        (**self).select(selection)
    }

    fn remove(&mut self, id: RecordId) -> StoreResult<bool> {
        (**self).remove(id)
    }

    fn delete(&mut self, selection: &Selection) -> StoreResult<Vec<RecordId>> {
        (**self).delete(selection)
    }

    fn update(&mut self, selection: &Selection, assignments: &[Assignment]) -> StoreResult<usize> {
        (**self).update(selection, assignments)
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        (**self).make_snapshot()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        (**self).restore(snapshot)
    }

    fn purge(&mut self) -> StoreResult<usize> {
        (**self).purge()
    }
}

/// Next id after the largest one ever stored, or 1 when there is none.
pub(crate) fn next_id_after(max_id: Option<RecordId>) -> StoreResult<RecordId> {
    match max_id {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            StoreError::validation_failed(ValidationFailure::new(
                Field::Id,
                format!("no ids left after {}", max),
            ))
        }),
    }
}

/// Reject ids that are not positive
pub(crate) fn check_explicit_id(id: RecordId) -> StoreResult<()> {
    if id <= 0 {
        return Err(StoreError::validation_for_record(
            id,
            ValidationFailure::new(Field::Id, "id must be positive"),
        ));
    }
    Ok(())
}
