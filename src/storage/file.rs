//! File-backed record store
//!
//! The file is a sequence of fixed-width slots (see `slot`). Live ids map
//! to slot offsets in an in-memory index rebuilt by a full scan on open.
//!
//! - `create`/`insert` append at `write_offset`
//! - `edit` rewrites a slot in place
//! - `remove` only sets the tombstone byte
//! - `purge` compacts live slots to the front and truncates the tail
//!
//! Lookups by field are full scans plus a filter, O(n) in the file size.
//!
//! New ids continue from the largest id found in any slot, tombstoned
//! ones included, so a removed id is not handed out again.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::errors::{StoreError, StoreResult};
use super::reader::{read_flag_at, read_raw_at, read_slot_at, SlotReader};
use super::slot::{self, DELETED, SLOT_STRIDE, TOMBSTONE_OFFSET};
use super::store::{check_explicit_id, next_id_after, RecordStore, StoreStat};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{Record, RecordDraft, RecordId};
use crate::snapshot::{plan_restore, MergeAction, RestoreIssue, RestoreReport, Snapshot};
use crate::validation::Validator;

/// Record store over a single binary file.
///
/// The file handle is held for the lifetime of the store and synced on drop.
pub struct FileStore {
    /// Path to the storage file
    path: PathBuf,
    /// Underlying file handle
    file: File,
    /// Offset one past the last slot
    write_offset: u64,
    /// Live record id -> slot offset
    offsets: HashMap<RecordId, u64>,
    /// Largest id written to any slot
    last_id: Option<RecordId>,
    validator: Box<dyn Validator>,
}

impl FileStore {
    /// Opens or creates the store file at `path`.
    ///
    /// Creates parent directories if needed.
    ///
    /// # Errors
    ///
    /// - `FC_STORAGE_IO` if the file cannot be created or opened
    /// - `FC_DATA_CORRUPTION` (FATAL) if the file is not a whole number of
    ///   valid slots or two live slots share an id
    pub fn open(path: &Path, validator: Box<dyn Validator>) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::io_error(
                        format!("Failed to create directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(|e| {
                StoreError::io_error(format!("Failed to open store file: {}", path.display()), e)
            })?;

        let (offsets, write_offset, last_id) = Self::build_offset_index(&file).map_err(|e| {
            if e.is_fatal() {
                log_event_with_fields(
                    Event::StoreCorruption,
                    &[("path", &path.display().to_string()), ("reason", &e.to_string())],
                );
            }
            e
        })?;

        log_event_with_fields(
            Event::StoreOpened,
            &[
                ("backend", "file"),
                ("live", &offsets.len().to_string()),
                ("path", &path.display().to_string()),
            ],
        );

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_offset,
            offsets,
            last_id,
            validator,
        })
    }

    /// Scan every slot, mapping live ids to offsets.
    ///
    /// Also returns the end offset and the largest id in any slot.
    fn build_offset_index(
        file: &File,
    ) -> StoreResult<(HashMap<RecordId, u64>, u64, Option<RecordId>)> {
        let mut offsets = HashMap::new();
        let mut last_id = None;
        let mut reader = SlotReader::new(file)?;

        while let Some((offset, slot)) = reader.read_next()? {
            last_id = last_id.max(Some(slot.record.id));
            if slot.deleted {
                continue;
            }
            if let Some(previous) = offsets.insert(slot.record.id, offset) {
                return Err(StoreError::corruption_at_offset(
                    offset,
                    format!(
                        "record #{} is also live at offset {}",
                        slot.record.id, previous
                    ),
                ));
            }
        }

        Ok((offsets, reader.current_offset(), last_id))
    }

    /// Returns the path to the store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the offset where the next slot will be appended.
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Returns the slot offset of a live record.
    pub fn offset_of(&self, id: RecordId) -> Option<u64> {
        self.offsets.get(&id).copied()
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

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> StoreResult<()> {
        self.file.seek(SeekFrom::Start(offset)).map_err(|e| {
            StoreError::io_error(format!("Failed to seek to offset {}", offset), e)
        })?;
        self.file.write_all(bytes).map_err(|e| {
            StoreError::io_error(format!("Failed to write at offset {}", offset), e)
        })
    }

    fn sync(&self) -> StoreResult<()> {
        self.file
            .sync_all()
            .map_err(|e| StoreError::io_error("fsync failed on store file", e))
    }

    /// Append a live slot for `record` and index it.
    fn append(&mut self, record: &Record) -> StoreResult<()> {
        let bytes = slot::encode(record, false)?;
        let offset = self.write_offset;
        self.write_at(offset, &bytes)?;
        self.write_offset += SLOT_STRIDE;
        self.offsets.insert(record.id, offset);
        self.last_id = self.last_id.max(Some(record.id));
        Ok(())
    }

    /// Rewrite the slot at `offset` with `record`.
    ///
    /// If the write fails the previous slot image is written back before
    /// the error is returned.
    fn overwrite(&mut self, offset: u64, record: &Record) -> StoreResult<()> {
        let bytes = slot::encode(record, false)?;
        let original = read_raw_at(&self.file, offset)?;

        if let Err(e) = self.write_at(offset, &bytes) {
            self.write_at(offset, &original).map_err(|rollback| {
                rollback.with_details(format!("rollback failed after: {}", e))
            })?;
            return Err(e);
        }
        Ok(())
    }

    fn scan(&self, keep: impl Fn(&Record) -> bool) -> StoreResult<Vec<Record>> {
        let mut records = SlotReader::new(&self.file)?.read_live()?;
        records.retain(|record| keep(record));
        Ok(records)
    }
}

impl RecordStore for FileStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    fn set_validator(&mut self, validator: Box<dyn Validator>) {
        self.validator = validator;
    }

    fn create(&mut self, draft: RecordDraft) -> StoreResult<RecordId> {
        let id = next_id_after(self.last_id)?;
        self.validate(id, &draft)?;
        self.append(&draft.into_record(id))?;
        self.sync()?;
        log_event_with_fields(Event::RecordCreated, &[("record_id", &id.to_string())]);
        Ok(id)
    }

    fn insert(&mut self, record: Record) -> StoreResult<RecordId> {
        check_explicit_id(record.id)?;
        if self.offsets.contains_key(&record.id) {
            return Err(StoreError::duplicate_id(record.id));
        }
        self.validate(record.id, &record.to_draft())?;
        self.append(&record)?;
        self.sync()?;
        log_event_with_fields(Event::RecordInserted, &[("record_id", &record.id.to_string())]);
        Ok(record.id)
    }

    fn edit(&mut self, id: RecordId, draft: RecordDraft) -> StoreResult<()> {
        let offset = self.offset_of(id).ok_or_else(|| StoreError::not_found(id))?;
        self.validate(id, &draft)?;
        self.overwrite(offset, &draft.into_record(id))?;
        self.sync()?;
        log_event_with_fields(Event::RecordEdited, &[("record_id", &id.to_string())]);
        Ok(())
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        match self.offset_of(id) {
            Some(offset) => Ok(Some(read_slot_at(&self.file, offset)?.record)),
            None => Ok(None),
        }
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        SlotReader::new(&self.file)?.read_live()
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        let mut stat = StoreStat::default();
        let mut reader = SlotReader::new(&self.file)?;
        while let Some((_, deleted)) = reader.next_flag()? {
            if deleted {
                stat.removed += 1;
            } else {
                stat.live += 1;
            }
        }
        Ok(stat)
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<Vec<Record>> {
        let wanted = first_name.to_lowercase();
        self.scan(|record| record.first_name.to_lowercase() == wanted)
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<Vec<Record>> {
        let wanted = last_name.to_lowercase();
        self.scan(|record| record.last_name.to_lowercase() == wanted)
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<Vec<Record>> {
        self.scan(|record| record.date_of_birth == date_of_birth)
    }

    fn remove(&mut self, id: RecordId) -> StoreResult<bool> {
        let offset = match self.offset_of(id) {
            Some(offset) => offset,
            None => return Ok(false),
        };

        self.write_at(offset + TOMBSTONE_OFFSET as u64, &[DELETED])?;
        self.sync()?;
        self.offsets.remove(&id);

        log_event_with_fields(Event::RecordRemoved, &[("record_id", &id.to_string())]);
        Ok(true)
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        let mut live_ids: Vec<RecordId> = self.offsets.keys().copied().collect();
        live_ids.sort_unstable();

        let plan = plan_restore(&live_ids, snapshot.records(), self.validator.as_ref());
        let mut report = RestoreReport {
            rejected: plan.rejected,
            ..RestoreReport::default()
        };

        for action in plan.actions {
            let applied = match &action {
                MergeAction::Replace(record) => match self.offset_of(record.id) {
                    Some(offset) => self.overwrite(offset, record),
                    None => continue,
                },
                MergeAction::Insert(record) => self.append(record),
            };

            match applied {
                Ok(()) => match action {
                    MergeAction::Replace(_) => report.replaced += 1,
                    MergeAction::Insert(_) => report.inserted += 1,
                },
                // A record that passed the validator but does not fit a slot.
                Err(e) if e.validation_failure().is_some() => {
                    let id = action.record().id;
                    log_event_with_fields(
                        Event::RestoreRecordRejected,
                        &[("record_id", &id.to_string()), ("reason", e.message())],
                    );
                    report.rejected.push(RestoreIssue::new(Some(id), e.message()));
                }
                Err(e) => return Err(e),
            }
        }

        self.sync()?;
        Ok(report)
    }

    fn purge(&mut self) -> StoreResult<usize> {
        let slot_count = self.write_offset / SLOT_STRIDE;
        // Next position to fill; everything before it is live and packed.
        let mut fill: u64 = 0;

        for position in 0..slot_count {
            let offset = position * SLOT_STRIDE;
            if read_flag_at(&self.file, offset)? {
                continue;
            }

            if position != fill {
                let bytes = read_raw_at(&self.file, offset)?;
                let id = slot::decode(&bytes)
                    .map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))?
                    .record
                    .id;
                let target = fill * SLOT_STRIDE;

                self.write_at(offset + TOMBSTONE_OFFSET as u64, &[DELETED])?;
                self.write_at(target, &bytes)?;
                self.offsets.insert(id, target);
            }
            fill += 1;
        }

        let new_len = fill * SLOT_STRIDE;
        self.file.set_len(new_len).map_err(|e| {
            StoreError::io_error(format!("Failed to truncate store file to {}", new_len), e)
        })?;
        self.write_offset = new_len;
        self.sync()?;

        Ok((slot_count - fill) as usize)
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        let _ = self.file.sync_all();
    }
}
