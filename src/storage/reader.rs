//! Sequential slot scanner over the store file
//!
//! The reader borrows the store's file handle; it never opens the file
//! itself. A file whose length is not a whole number of slots is corrupt.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};

use super::errors::{StoreError, StoreResult};
use super::slot::{self, Slot, SLOT_SIZE, SLOT_STRIDE};
use crate::record::Record;

/// Forward scanner yielding `(offset, slot)` pairs in file order.
pub struct SlotReader<'a> {
    reader: BufReader<&'a File>,
    current_offset: u64,
    file_size: u64,
}

impl<'a> SlotReader<'a> {
    /// Start a scan at offset 0.
    pub fn new(file: &'a File) -> StoreResult<Self> {
        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io_error("Failed to read file metadata", e))?
            .len();

        check_length(file_size)?;

        let mut reader = BufReader::new(file);
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io_error("Failed to seek to start of file", e))?;

        Ok(Self {
            reader,
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the offset of the next slot to be read.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    fn has_more(&self) -> bool {
        self.current_offset < self.file_size
    }

    /// Read the next raw slot image without decoding it.
    pub fn next_raw(&mut self) -> StoreResult<Option<(u64, [u8; SLOT_SIZE])>> {
        if !self.has_more() {
            return Ok(None);
        }

        let offset = self.current_offset;
        let mut buf = [0u8; SLOT_SIZE];
        self.reader.read_exact(&mut buf).map_err(|e| {
            StoreError::corruption_at_offset(offset, format!("Failed to read slot: {}", e))
        })?;
        self.current_offset += SLOT_STRIDE;

        Ok(Some((offset, buf)))
    }

    /// Read and decode the next slot.
    pub fn read_next(&mut self) -> StoreResult<Option<(u64, Slot)>> {
        match self.next_raw()? {
            Some((offset, buf)) => {
                let slot = slot::decode(&buf)
                    .map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))?;
                Ok(Some((offset, slot)))
            }
            None => Ok(None),
        }
    }

    /// Read the tombstone flag of the next slot, skipping the rest of it.
    pub fn next_flag(&mut self) -> StoreResult<Option<(u64, bool)>> {
        match self.next_raw()? {
            Some((offset, buf)) => {
                let deleted = slot::is_deleted(&buf)
                    .map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))?;
                Ok(Some((offset, deleted)))
            }
            None => Ok(None),
        }
    }

    /// Decode every live record in file order, skipping tombstones.
    pub fn read_live(&mut self) -> StoreResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some((_, slot)) = self.read_next()? {
            if !slot.deleted {
                records.push(slot.record);
            }
        }
        Ok(records)
    }
}

/// Fails unless `len` is a whole number of slots.
pub fn check_length(len: u64) -> StoreResult<()> {
    if len % SLOT_STRIDE != 0 {
        return Err(StoreError::data_corruption(format!(
            "file length {} is not a multiple of the {}-byte slot width",
            len, SLOT_SIZE
        ))
        .with_details(format!("trailing_bytes: {}", len % SLOT_STRIDE)));
    }
    Ok(())
}

/// Read the raw image of the slot at `offset`.
pub fn read_raw_at(file: &File, offset: u64) -> StoreResult<[u8; SLOT_SIZE]> {
    let mut handle = file;
    handle.seek(SeekFrom::Start(offset)).map_err(|e| {
        StoreError::io_error(format!("Failed to seek to offset {}", offset), e)
    })?;

    let mut buf = [0u8; SLOT_SIZE];
    handle.read_exact(&mut buf).map_err(|e| {
        StoreError::corruption_at_offset(offset, format!("Failed to read slot: {}", e))
    })?;
    Ok(buf)
}

/// Read and decode the single slot at `offset`.
pub fn read_slot_at(file: &File, offset: u64) -> StoreResult<Slot> {
    let buf = read_raw_at(file, offset)?;
    slot::decode(&buf).map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))
}

/// Read only the tombstone flag of the slot at `offset`.
pub fn read_flag_at(file: &File, offset: u64) -> StoreResult<bool> {
    let mut handle = file;
    handle.seek(SeekFrom::Start(offset)).map_err(|e| {
        StoreError::io_error(format!("Failed to seek to offset {}", offset), e)
    })?;

    let mut flag = [0u8; 1];
    handle.read_exact(&mut flag).map_err(|e| {
        StoreError::corruption_at_offset(offset, format!("Failed to read tombstone flag: {}", e))
    })?;

    slot::is_deleted(&flag).map_err(|e| StoreError::corruption_at_offset(offset, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Income, RecordDraft};
    use chrono::NaiveDate;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(id: i32) -> Record {
        RecordDraft::new(
            format!("Name{}", id),
            "Tester",
            NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
            175,
            Income::from_units(500),
            'K',
        )
        .into_record(id)
    }

    fn file_with(dir: &TempDir, slots: &[(i32, bool)]) -> File {
        let path = dir.path().join("slots.db");
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        for (id, deleted) in slots {
            file.write_all(&slot::encode(&record(*id), *deleted).unwrap())
                .unwrap();
        }
        file
    }

    #[test]
    fn test_empty_file() {
        let dir = TempDir::new().unwrap();
        let file = file_with(&dir, &[]);
        let mut reader = SlotReader::new(&file).unwrap();
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_read_live_skips_tombstones() {
        let dir = TempDir::new().unwrap();
        let file = file_with(&dir, &[(1, false), (2, true), (3, false)]);

        let live = SlotReader::new(&file).unwrap().read_live().unwrap();
        let ids: Vec<i32> = live.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_offsets_advance_by_slot_width() {
        let dir = TempDir::new().unwrap();
        let file = file_with(&dir, &[(1, false), (2, true)]);

        let mut reader = SlotReader::new(&file).unwrap();
        assert_eq!(reader.next_flag().unwrap(), Some((0, false)));
        assert_eq!(reader.next_flag().unwrap(), Some((SLOT_STRIDE, true)));
        assert_eq!(reader.next_flag().unwrap(), None);
    }

    #[test]
    fn test_read_at_offset() {
        let dir = TempDir::new().unwrap();
        let file = file_with(&dir, &[(1, false), (2, false)]);

        let slot = read_slot_at(&file, SLOT_STRIDE).unwrap();
        assert_eq!(slot.record.id, 2);
        assert!(!read_flag_at(&file, 0).unwrap());
    }

    #[test]
    fn test_partial_slot_is_corruption() {
        let dir = TempDir::new().unwrap();
        let mut file = file_with(&dir, &[(1, false)]);
        file.write_all(&[0u8; 10]).unwrap();

        let err = SlotReader::new(&file).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("not a multiple"));
    }

    #[test]
    fn test_bad_flag_is_corruption() {
        let dir = TempDir::new().unwrap();
        let mut file = file_with(&dir, &[(1, false)]);
        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(&[7]).unwrap();

        let mut reader = SlotReader::new(&file).unwrap();
        let err = reader.read_next().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.details(), Some("byte_offset: 0"));
    }
}
