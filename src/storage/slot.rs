//! Fixed-width record slot codec
//!
//! Every record occupies exactly `SLOT_SIZE` bytes in the store file.
//! All integers are little-endian.
//!
//! ```text
//! offset size field
//! 0      1    tombstone flag (0 = live, 1 = deleted)
//! 1      2    reserved (zero)
//! 3      4    id (i32)
//! 7      122  first_name (u16 byte length + 120 bytes UTF-8, zero padded)
//! 129    122  last_name (same convention)
//! 251    4    date_of_birth.day (i32)
//! 255    4    date_of_birth.month (i32)
//! 259    4    date_of_birth.year (i32)
//! 263    2    patronymic_letter (UTF-16 code unit)
//! 265    16   income (i128, hundredths)
//! 281    2    height (i16)
//! ```
//!
//! The constant width is what makes offset arithmetic and in-place
//! compaction possible.

use std::io;

use chrono::{Datelike, NaiveDate};

use super::errors::{StoreError, StoreResult};
use crate::record::{Field, Income, Record};
use crate::validation::ValidationFailure;

/// Bytes of UTF-8 text a name field can hold
pub const NAME_CAPACITY: usize = 120;

const NAME_FIELD_SIZE: usize = 2 + NAME_CAPACITY;

pub const TOMBSTONE_OFFSET: usize = 0;
const RESERVED_OFFSET: usize = 1;
const ID_OFFSET: usize = 3;
const FIRST_NAME_OFFSET: usize = 7;
const LAST_NAME_OFFSET: usize = FIRST_NAME_OFFSET + NAME_FIELD_SIZE;
const DAY_OFFSET: usize = LAST_NAME_OFFSET + NAME_FIELD_SIZE;
const MONTH_OFFSET: usize = DAY_OFFSET + 4;
const YEAR_OFFSET: usize = MONTH_OFFSET + 4;
const LETTER_OFFSET: usize = YEAR_OFFSET + 4;
const INCOME_OFFSET: usize = LETTER_OFFSET + 2;
const HEIGHT_OFFSET: usize = INCOME_OFFSET + 16;

/// Width of one record slot
pub const SLOT_SIZE: usize = HEIGHT_OFFSET + 2;

/// Slot width as a file offset stride
pub const SLOT_STRIDE: u64 = SLOT_SIZE as u64;

/// Tombstone flag byte for a live slot
pub const LIVE: u8 = 0;

/// Tombstone flag byte for a deleted slot
pub const DELETED: u8 = 1;

/// One decoded slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub deleted: bool,
    pub record: Record,
}

/// Encode a record into a slot image.
///
/// Fails when a name does not fit in `NAME_CAPACITY` bytes or the
/// letter is outside the Basic Multilingual Plane.
pub fn encode(record: &Record, deleted: bool) -> StoreResult<[u8; SLOT_SIZE]> {
    let mut buf = [0u8; SLOT_SIZE];

    buf[TOMBSTONE_OFFSET] = if deleted { DELETED } else { LIVE };
    buf[RESERVED_OFFSET..ID_OFFSET].copy_from_slice(&0u16.to_le_bytes());
    buf[ID_OFFSET..FIRST_NAME_OFFSET].copy_from_slice(&record.id.to_le_bytes());

    write_name(&mut buf, FIRST_NAME_OFFSET, Field::FirstName, &record.first_name)?;
    write_name(&mut buf, LAST_NAME_OFFSET, Field::LastName, &record.last_name)?;

    let date = record.date_of_birth;
    buf[DAY_OFFSET..MONTH_OFFSET].copy_from_slice(&(date.day() as i32).to_le_bytes());
    buf[MONTH_OFFSET..YEAR_OFFSET].copy_from_slice(&(date.month() as i32).to_le_bytes());
    buf[YEAR_OFFSET..LETTER_OFFSET].copy_from_slice(&date.year().to_le_bytes());

    let letter = u16::try_from(record.patronymic_letter as u32).map_err(|_| {
        StoreError::validation_for_record(
            record.id,
            ValidationFailure::new(Field::PatronymicLetter, "letter does not fit in 16 bits"),
        )
    })?;
    buf[LETTER_OFFSET..INCOME_OFFSET].copy_from_slice(&letter.to_le_bytes());
    buf[INCOME_OFFSET..HEIGHT_OFFSET].copy_from_slice(&record.income.hundredths().to_le_bytes());
    buf[HEIGHT_OFFSET..SLOT_SIZE].copy_from_slice(&record.height.to_le_bytes());

    Ok(buf)
}

fn write_name(buf: &mut [u8], offset: usize, field: Field, value: &str) -> StoreResult<()> {
    let bytes = value.as_bytes();
    if bytes.len() > NAME_CAPACITY {
        return Err(StoreError::validation_failed(ValidationFailure::new(
            field,
            format!(
                "{} bytes of UTF-8 exceed the {}-byte slot field",
                bytes.len(),
                NAME_CAPACITY
            ),
        )));
    }
    buf[offset..offset + 2].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
    buf[offset + 2..offset + 2 + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Whether a slot image carries the tombstone flag. Only the first byte is read.
pub fn is_deleted(bytes: &[u8]) -> io::Result<bool> {
    match bytes.first() {
        Some(&LIVE) => Ok(false),
        Some(&DELETED) => Ok(true),
        Some(other) => Err(invalid(format!("invalid tombstone flag {}", other))),
        None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "empty slot")),
    }
}

/// Decode a slot image
pub fn decode(bytes: &[u8]) -> io::Result<Slot> {
    if bytes.len() < SLOT_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("slot truncated: expected {} bytes, got {}", SLOT_SIZE, bytes.len()),
        ));
    }

    let deleted = is_deleted(bytes)?;
    let id = i32::from_le_bytes(array(bytes, ID_OFFSET));
    let first_name = read_name(bytes, FIRST_NAME_OFFSET)?;
    let last_name = read_name(bytes, LAST_NAME_OFFSET)?;

    let day = i32::from_le_bytes(array(bytes, DAY_OFFSET));
    let month = i32::from_le_bytes(array(bytes, MONTH_OFFSET));
    let year = i32::from_le_bytes(array(bytes, YEAR_OFFSET));
    let date_of_birth = u32::try_from(month)
        .ok()
        .zip(u32::try_from(day).ok())
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(year, m, d))
        .ok_or_else(|| invalid(format!("invalid date {}-{}-{}", year, month, day)))?;

    let letter_code = u16::from_le_bytes(array(bytes, LETTER_OFFSET));
    let patronymic_letter = char::from_u32(letter_code as u32)
        .ok_or_else(|| invalid(format!("invalid letter code {:#06x}", letter_code)))?;

    let income = Income::from_hundredths(i128::from_le_bytes(array(bytes, INCOME_OFFSET)));
    let height = i16::from_le_bytes(array(bytes, HEIGHT_OFFSET));

    Ok(Slot {
        deleted,
        record: Record {
            id,
            first_name,
            last_name,
            date_of_birth,
            height,
            income,
            patronymic_letter,
        },
    })
}

fn read_name(bytes: &[u8], offset: usize) -> io::Result<String> {
    let len = u16::from_le_bytes(array(bytes, offset)) as usize;
    if len > NAME_CAPACITY {
        return Err(invalid(format!("name length {} exceeds capacity", len)));
    }
    let start = offset + 2;
    String::from_utf8(bytes[start..start + len].to_vec())
        .map_err(|e| invalid(format!("invalid UTF-8 in name: {}", e)))
}

fn array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
