//! Restore planning: two-pointer merge by id
//!
//! Both sides are walked in ascending id order. For live id `l` and
//! incoming record `r`:
//!
//! - `l < r.id`: live record has no counterpart, keep it
//! - `l == r.id`: validate `r`, replace the live record in place
//! - `l > r.id` (or live side exhausted): validate `r`, insert it
//!
//! Leftover live records are kept as-is. Invalid incoming records are
//! reported and skipped; they never stop the batch. Planning is shared
//! by every backend; only committing the plan differs.

use std::cmp::Ordering;
use std::fmt;

use crate::observability::{log_event_with_fields, Event};
use crate::record::{Record, RecordId};
use crate::validation::Validator;

/// One step of a restore plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    /// Overwrite the live record with the same id
    Replace(Record),
    /// Add a record whose id is not live
    Insert(Record),
}

impl MergeAction {
    pub fn record(&self) -> &Record {
        match self {
            MergeAction::Replace(record) | MergeAction::Insert(record) => record,
        }
    }
}

/// A rejected incoming record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreIssue {
    /// Id of the record, when it could be read
    pub id: Option<RecordId>,
    pub reason: String,
}

impl RestoreIssue {
    pub fn new(id: Option<RecordId>, reason: impl Into<String>) -> Self {
        Self {
            id,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RestoreIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "record #{}: {}", id, self.reason),
            None => write!(f, "record without id: {}", self.reason),
        }
    }
}

/// Outcome of planning a restore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub actions: Vec<MergeAction>,
    pub rejected: Vec<RestoreIssue>,
}

impl MergePlan {
    fn accept(&mut self, record: &Record, matched: bool, validator: &dyn Validator) {
        match validator.validate(&record.to_draft()) {
            Ok(()) if matched => self.actions.push(MergeAction::Replace(record.clone())),
            Ok(()) => self.actions.push(MergeAction::Insert(record.clone())),
            Err(failure) => self.reject(Some(record.id), failure.to_string()),
        }
    }

    fn reject(&mut self, id: Option<RecordId>, reason: String) {
        let id_text = id.map_or_else(|| "none".to_string(), |id| id.to_string());
        log_event_with_fields(
            Event::RestoreRecordRejected,
            &[("record_id", &id_text), ("reason", &reason)],
        );
        self.rejected.push(RestoreIssue::new(id, reason));
    }
}

/// Result reported to the caller of `restore`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Incoming records replaced into live ones
    pub replaced: usize,
    /// Incoming records added as new
    pub inserted: usize,
    /// Incoming records skipped, with reasons
    pub rejected: Vec<RestoreIssue>,
}

impl RestoreReport {
    /// Number of incoming records applied
    pub fn imported(&self) -> usize {
        self.replaced + self.inserted
    }
}

/// Plan a restore of `incoming` against the live ids.
///
/// `live_ids` must be sorted ascending. `incoming` may be in any order; it
/// is sorted by id here. When the same id occurs more than once in
/// `incoming`, the last occurrence wins and earlier ones are reported.
/// Ids that are not positive are rejected.
pub fn plan_restore(
    live_ids: &[RecordId],
    incoming: &[Record],
    validator: &dyn Validator,
) -> MergePlan {
    debug_assert!(live_ids.windows(2).all(|w| w[0] < w[1]));

    let mut plan = MergePlan::default();

    let mut ordered: Vec<&Record> = Vec::with_capacity(incoming.len());
    for record in incoming {
        if record.id <= 0 {
            plan.reject(Some(record.id), "id must be positive".to_string());
        } else {
            ordered.push(record);
        }
    }
    // Stable sort keeps input order among equal ids, so the last one is the latest.
    ordered.sort_by_key(|r| r.id);

    let mut deduped: Vec<&Record> = Vec::with_capacity(ordered.len());
    for record in ordered {
        match deduped.last_mut() {
            Some(last) if last.id == record.id => {
                plan.reject(
                    Some(last.id),
                    "superseded by a later record with the same id".to_string(),
                );
                *last = record;
            }
            _ => deduped.push(record),
        }
    }

    let (mut i, mut j) = (0, 0);
    while j < deduped.len() {
        let record = deduped[j];
        match live_ids.get(i).map(|live| live.cmp(&record.id)) {
            Some(Ordering::Less) => i += 1,
            Some(Ordering::Equal) => {
                plan.accept(record, true, validator);
                i += 1;
                j += 1;
            }
            Some(Ordering::Greater) | None => {
                plan.accept(record, false, validator);
                j += 1;
            }
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Income, RecordDraft};
    use crate::validation::ValidatorBuilder;
    use chrono::NaiveDate;

    fn record(id: i32, first: &str) -> Record {
        RecordDraft::new(
            first,
            "Merge",
            NaiveDate::from_ymd_opt(1980, 1, 1).unwrap(),
            170,
            Income::from_units(10),
            'M',
        )
        .into_record(id)
    }

    fn validator() -> impl Validator {
        ValidatorBuilder::new().validate_first_name(2, 20).build()
    }

    fn ids(plan: &MergePlan) -> Vec<(char, i32)> {
        plan.actions
            .iter()
            .map(|a| match a {
                MergeAction::Replace(r) => ('R', r.id),
                MergeAction::Insert(r) => ('I', r.id),
            })
            .collect()
    }

    #[test]
    fn test_interleaved_merge() {
        let incoming = vec![record(2, "Two"), record(3, "Three"), record(4, "Four")];
        let plan = plan_restore(&[1, 3, 5], &incoming, &validator());

        assert_eq!(ids(&plan), vec![('I', 2), ('R', 3), ('I', 4)]);
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_unsorted_incoming_is_sorted() {
        let incoming = vec![record(9, "Nine"), record(1, "One"), record(5, "Five")];
        let plan = plan_restore(&[5], &incoming, &validator());
        assert_eq!(ids(&plan), vec![('I', 1), ('R', 5), ('I', 9)]);
    }

    #[test]
    fn test_invalid_records_are_skipped_not_fatal() {
        let incoming = vec![record(1, "X"), record(2, "Valid"), record(3, "Y")];
        let plan = plan_restore(&[1, 2], &incoming, &validator());

        assert_eq!(ids(&plan), vec![('R', 2)]);
        assert_eq!(plan.rejected.len(), 2);
        assert_eq!(plan.rejected[0].id, Some(1));
        assert!(plan.rejected[0].reason.contains("firstname"));
        assert_eq!(plan.rejected[1].id, Some(3));
    }

    #[test]
    fn test_empty_live_inserts_everything() {
        let incoming = vec![record(2, "Two"), record(1, "One")];
        let plan = plan_restore(&[], &incoming, &validator());
        assert_eq!(ids(&plan), vec![('I', 1), ('I', 2)]);
    }

    #[test]
    fn test_empty_incoming_keeps_live() {
        let plan = plan_restore(&[1, 2, 3], &[], &validator());
        assert!(plan.actions.is_empty());
        assert!(plan.rejected.is_empty());
    }

    #[test]
    fn test_duplicate_incoming_last_wins() {
        let incoming = vec![record(4, "First"), record(4, "Second")];
        let plan = plan_restore(&[4], &incoming, &validator());

        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].record().first_name, "Second");
        assert_eq!(plan.rejected.len(), 1);
    }

    #[test]
    fn test_non_positive_id_rejected() {
        let plan = plan_restore(&[], &[record(0, "Zero"), record(-3, "Neg")], &validator());
        assert!(plan.actions.is_empty());
        assert_eq!(plan.rejected.len(), 2);
    }

    #[test]
    fn test_report_imported_counts_applied_only() {
        let report = RestoreReport {
            replaced: 1,
            inserted: 2,
            rejected: vec![RestoreIssue::new(Some(7), "bad")],
        };
        assert_eq!(report.imported(), 3);
        assert_eq!(report.rejected[0].to_string(), "record #7: bad");
    }
}
