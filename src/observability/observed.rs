//! Per-call tracing around any `RecordStore`
//!
//! Every call is forwarded unchanged and logged as `STORE_CALL` with the
//! method name and outcome. With timing enabled, `elapsed_us` is added.

use chrono::NaiveDate;

use super::events::Event;
use super::logger::Logger;
use super::scope::Timer;
use crate::record::{Assignment, Record, RecordDraft, RecordId, Selection};
use crate::snapshot::{RestoreReport, Snapshot};
use crate::storage::{RecordStore, StoreResult, StoreStat};
use crate::validation::Validator;

pub struct ObservedStore<S: RecordStore> {
    inner: S,
    timed: bool,
}

impl<S: RecordStore> ObservedStore<S> {
    pub fn new(inner: S, timed: bool) -> Self {
        Self { inner, timed }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn observe<T>(&self, method: &str, timer: Timer, result: &StoreResult<T>) {
        let elapsed = timer.elapsed_us();
        let mut fields: Vec<(&str, &str)> = vec![("backend", self.inner.kind()), ("method", method)];
        match result {
            Ok(_) => fields.push(("outcome", "ok")),
            Err(e) => {
                fields.push(("outcome", "error"));
                fields.push(("code", e.code().code()));
            }
        }
        if self.timed {
            fields.push(("elapsed_us", elapsed.as_str()));
        }
        Logger::log(Event::StoreCall.severity(), Event::StoreCall.as_str(), &fields);
    }
}

impl<S: RecordStore> RecordStore for ObservedStore<S> {
    fn kind(&self) -> &'static str {
        self.inner.kind()
    }

    fn set_validator(&mut self, validator: Box<dyn Validator>) {
        let timer = Timer::new();
        self.inner.set_validator(validator);
        self.observe("set_validator", timer, &Ok(()));
    }

    fn create(&mut self, draft: RecordDraft) -> StoreResult<RecordId> {
        let timer = Timer::new();
        let result = self.inner.create(draft);
        self.observe("create", timer, &result);
        result
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        let timer = Timer::new();
        let result = self.inner.insert(record);
        self.observe("insert", timer, &result);
        result
    }

    fn edit(&mut self, id: RecordId, draft: RecordDraft) -> StoreResult<()> {
        let timer = Timer::new();
        let result = self.inner.edit(id, draft);
        self.observe("edit", timer, &result);
        result
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        let timer = Timer::new();
        let result = self.inner.get(id);
        self.observe("get", timer, &result);
        result
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        let timer = Timer::new();
        let result = self.inner.get_all();
        self.observe("get_all", timer, &result);
        result
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        let timer = Timer::new();
        let result = self.inner.get_stat();
        self.observe("get_stat", timer, &result);
        result
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<Vec<Record>> {
        let timer = Timer::new();
        let result = self.inner.find_by_first_name(first_name);
        self.observe("find_by_first_name", timer, &result);
        result
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<Vec<Record>> {
        let timer = Timer::new();
        let result = self.inner.find_by_last_name(last_name);
        self.observe("find_by_last_name", timer, &result);
        result
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<Vec<Record>> {
        let timer = Timer::new();
        let result = self.inner.find_by_date_of_birth(date_of_birth);
        self.observe("find_by_date_of_birth", timer, &result);
        result
    }

    fn select(&self, selection: &Selection) -> StoreResult<Vec<Record>> {
        let timer = Timer::new();
        let result = self.inner.select(selection);
        self.observe("select", timer, &result);
        result
    }

    fn remove(&mut self, id: RecordId) -> StoreResult<bool> {
        let timer = Timer::new();
        let result = self.inner.remove(id);
        self.observe("remove", timer, &result);
        result
    }

    fn delete(&mut self, selection: &Selection) -> StoreResult<Vec<RecordId>> {
        let timer = Timer::new();
        let result = self.inner.delete(selection);
        self.observe("delete", timer, &result);
        result
    }

    fn update(&mut self, selection: &Selection, assignments: &[Assignment]) -> StoreResult<usize> {
        let timer = Timer::new();
        let result = self.inner.update(selection, assignments);
        self.observe("update", timer, &result);
        result
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        let timer = Timer::new();
        let result = self.inner.make_snapshot();
        self.observe("make_snapshot", timer, &result);
        result
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        let timer = Timer::new();
        let result = self.inner.restore(snapshot);
        self.observe("restore", timer, &result);
        result
    }

    fn purge(&mut self) -> StoreResult<usize> {
        let timer = Timer::new();
        let result = self.inner.purge();
        self.observe("purge", timer, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Income;
    use crate::storage::{MemoryStore, StoreErrorCode};

    fn draft() -> RecordDraft {
        RecordDraft::new(
            "Olga",
            "Watch",
            NaiveDate::from_ymd_opt(1975, 9, 9).unwrap(),
            165,
            Income::from_units(700),
            'V',
        )
    }

    #[test]
    fn test_forwards_results_unchanged() {
        let mut store = ObservedStore::new(MemoryStore::default(), true);
        assert_eq!(store.create(draft()).unwrap(), 1);
        assert_eq!(store.get_all().unwrap().len(), 1);
        assert_eq!(store.kind(), "memory");
        assert_eq!(store.inner().len(), 1);
    }

    #[test]
    fn test_forwards_errors_unchanged() {
        let mut store = ObservedStore::new(MemoryStore::default(), false);
        let err = store.purge().unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::UnsupportedOperation);
    }

    #[test]
    fn test_wraps_boxed_store() {
        let boxed: Box<dyn RecordStore> = Box::new(MemoryStore::default());
        let mut store = ObservedStore::new(boxed, true);
        store.create(draft()).unwrap();
        assert_eq!(store.into_inner().get_stat().unwrap().live, 1);
    }
}
