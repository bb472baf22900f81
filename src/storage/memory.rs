//! In-memory record store
//!
//! Records live in a `Vec` in insertion order. Three hash indexes map a
//! lowercase first name, lowercase last name, or date of birth to the ids
//! carrying it; `positions` maps an id to its slot in the `Vec`. Every
//! mutation keeps all four maps consistent with the `Vec`.
//!
//! `last_id` is the largest id ever stored, so removed ids are not handed
//! out again by `create`.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;

use super::errors::{StoreError, StoreResult};
use super::store::{check_explicit_id, next_id_after, RecordStore, StoreStat};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{FieldValue, Record, RecordDraft, RecordId, Selection};
use crate::snapshot::{plan_restore, MergeAction, RestoreReport, Snapshot};
use crate::validation::{CompositeValidator, Validator};

pub struct MemoryStore {
    records: Vec<Record>,
    positions: HashMap<RecordId, usize>,
    by_first_name: HashMap<String, Vec<RecordId>>,
    by_last_name: HashMap<String, Vec<RecordId>>,
    by_date_of_birth: HashMap<NaiveDate, Vec<RecordId>>,
    last_id: Option<RecordId>,
    validator: Box<dyn Validator>,
}

impl MemoryStore {
    pub fn new(validator: Box<dyn Validator>) -> Self {
        Self {
            records: Vec::new(),
            positions: HashMap::new(),
            by_first_name: HashMap::new(),
            by_last_name: HashMap::new(),
            by_date_of_birth: HashMap::new(),
            last_id: None,
            validator,
        }
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn validate(&self, id: RecordId, draft: &RecordDraft) -> StoreResult<()> {
        self.validator.validate(draft).map_err(|failure| {
            log_event_with_fields(
                Event::ValidationRejected,
                &[("record_id", &id.to_string()), ("reason", &failure.to_string())],
            );
            StoreError::validation_for_record(id, failure)
        })
    }

    fn push(&mut self, record: Record) {
        self.index(&record);
        self.last_id = self.last_id.max(Some(record.id));
        self.positions.insert(record.id, self.records.len());
        self.records.push(record);
    }

    fn index(&mut self, record: &Record) {
        index_add(&mut self.by_first_name, record.first_name.to_lowercase(), record.id);
        index_add(&mut self.by_last_name, record.last_name.to_lowercase(), record.id);
        index_add(&mut self.by_date_of_birth, record.date_of_birth, record.id);
    }

    fn unindex(&mut self, record: &Record) {
        index_remove(&mut self.by_first_name, &record.first_name.to_lowercase(), record.id);
        index_remove(&mut self.by_last_name, &record.last_name.to_lowercase(), record.id);
        index_remove(&mut self.by_date_of_birth, &record.date_of_birth, record.id);
    }

    /// Overwrite the fields of the record at `position`, reindexing it.
    fn replace_at(&mut self, position: usize, draft: RecordDraft) {
        let old = self.records[position].clone();
        self.unindex(&old);
        self.records[position].apply_draft(draft);
        let updated = self.records[position].clone();
        self.index(&updated);
    }

    /// Resolve index ids to records, in storage order.
    fn resolve(&self, ids: Option<&Vec<RecordId>>) -> Vec<Record> {
        let mut positions: Vec<usize> = ids
            .into_iter()
            .flatten()
            .filter_map(|id| self.positions.get(id).copied())
            .collect();
        positions.sort_unstable();
        positions.into_iter().map(|p| self.records[p].clone()).collect()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Box::new(CompositeValidator::default()))
    }
}

impl RecordStore for MemoryStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn set_validator(&mut self, validator: Box<dyn Validator>) {
        self.validator = validator;
    }

    fn create(&mut self, draft: RecordDraft) -> StoreResult<RecordId> {
        let id = next_id_after(self.last_id)?;
        self.validate(id, &draft)?;
        self.push(draft.into_record(id));
        log_event_with_fields(Event::RecordCreated, &[("record_id", &id.to_string())]);
        Ok(id)
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        check_explicit_id(record.id)?;
        if self.positions.contains_key(&record.id) {
            return Err(StoreError::duplicate_id(record.id));
        }
        self.validate(record.id, &record.to_draft())?;
        let id = record.id;
        self.push(record);
        log_event_with_fields(Event::RecordInserted, &[("record_id", &id.to_string())]);
        Ok(id)
    }

    fn edit(&mut self, id: RecordId, draft: RecordDraft) -> StoreResult<()> {
        let position = *self.positions.get(&id).ok_or_else(|| StoreError::not_found(id))?;
        self.validate(id, &draft)?;
        self.replace_at(position, draft);
        log_event_with_fields(Event::RecordEdited, &[("record_id", &id.to_string())]);
        Ok(())
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        Ok(self.positions.get(&id).map(|&p| self.records[p].clone()))
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        Ok(StoreStat {
            live: self.records.len(),
            removed: 0,
        })
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<Vec<Record>> {
        Ok(self.resolve(self.by_first_name.get(&first_name.to_lowercase())))
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<Vec<Record>> {
        Ok(self.resolve(self.by_last_name.get(&last_name.to_lowercase())))
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<Vec<Record>> {
        Ok(self.resolve(self.by_date_of_birth.get(&date_of_birth)))
    }

    fn select(&self, selection: &Selection) -> StoreResult<Vec<Record>> {
        match selection.single() {
            Some(FieldValue::Id(id)) => Ok(self.get(*id)?.into_iter().collect()),
            Some(FieldValue::FirstName(name)) => self.find_by_first_name(name),
            Some(FieldValue::LastName(name)) => self.find_by_last_name(name),
            Some(FieldValue::DateOfBirth(date)) => self.find_by_date_of_birth(*date),
            _ => Ok(self
                .records
                .iter()
                .filter(|record| selection.matches(record))
                .cloned()
                .collect()),
        }
    }

    fn remove(&mut self, id: RecordId) -> StoreResult<bool> {
        let position = match self.positions.remove(&id) {
            Some(position) => position,
            None => return Ok(false),
        };

        let record = self.records.remove(position);
        self.unindex(&record);
        for (shifted, moved) in self.records[position..].iter().enumerate() {
            self.positions.insert(moved.id, position + shifted);
        }

        log_event_with_fields(Event::RecordRemoved, &[("record_id", &id.to_string())]);
        Ok(true)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        let mut live_ids: Vec<RecordId> = self.records.iter().map(|r| r.id).collect();
        live_ids.sort_unstable();

        let plan = plan_restore(&live_ids, snapshot.records(), self.validator.as_ref());
        let mut report = RestoreReport {
            rejected: plan.rejected,
            ..RestoreReport::default()
        };

        for action in plan.actions {
            match action {
                MergeAction::Replace(record) => {
                    if let Some(&position) = self.positions.get(&record.id) {
                        self.replace_at(position, record.to_draft());
                        report.replaced += 1;
                    }
                }
                MergeAction::Insert(record) => {
                    self.push(record);
                    report.inserted += 1;
                }
            }
        }

        Ok(report)
    }

    fn purge(&mut self) -> StoreResult<usize> {
        Err(StoreError::unsupported("purge", self.kind()))
    }
}

fn index_add<K: Eq + Hash>(index: &mut HashMap<K, Vec<RecordId>>, key: K, id: RecordId) {
    index.entry(key).or_default().push(id);
}

fn index_remove<K: Eq + Hash>(index: &mut HashMap<K, Vec<RecordId>>, key: &K, id: RecordId) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|&existing| existing != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}
