//! Field names and typed field values
//!
//! Field names are matched case-insensitively and ignore underscores, so
//! `firstname`, `FirstName` and `first_name` all name the same field.

use std::fmt;

use chrono::NaiveDate;

use super::income::Income;
use super::types::{Record, RecordDraft, RecordId};

/// A record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    FirstName,
    LastName,
    DateOfBirth,
    Height,
    Income,
    PatronymicLetter,
}

impl Field {
    /// All fields in display order
    pub const ALL: [Field; 7] = [
        Field::Id,
        Field::FirstName,
        Field::LastName,
        Field::DateOfBirth,
        Field::Height,
        Field::Income,
        Field::PatronymicLetter,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Field::Id => "id",
            Field::FirstName => "firstname",
            Field::LastName => "lastname",
            Field::DateOfBirth => "dateofbirth",
            Field::Height => "height",
            Field::Income => "income",
            Field::PatronymicLetter => "patronymicletter",
        }
    }

    /// Parse a field name
    pub fn parse(name: &str) -> Option<Field> {
        let normalized: String = name
            .trim()
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Field::ALL.into_iter().find(|f| f.name() == normalized)
    }

    /// Parse raw text into a value for this field.
    ///
    /// Only the shape is checked here; range policy belongs to the validator.
    pub fn parse_value(&self, raw: &str) -> Result<FieldValue, String> {
        let text = raw.trim();
        match self {
            Field::Id => text
                .parse::<RecordId>()
                .map(FieldValue::Id)
                .map_err(|_| format!("'{}' is not a valid id", text)),
            Field::FirstName => Ok(FieldValue::FirstName(text.to_string())),
            Field::LastName => Ok(FieldValue::LastName(text.to_string())),
            Field::DateOfBirth => parse_date(text).map(FieldValue::DateOfBirth),
            Field::Height => text
                .parse::<i16>()
                .map(FieldValue::Height)
                .map_err(|_| format!("'{}' is not a valid height", text)),
            Field::Income => text
                .parse::<Income>()
                .map(FieldValue::Income)
                .map_err(|e| e.to_string()),
            Field::PatronymicLetter => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(FieldValue::PatronymicLetter(c)),
                    _ => Err(format!("'{}' is not a single letter", text)),
                }
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse a date in `YYYY-MM-DD` or `MM/DD/YYYY` form
pub fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%m/%d/%Y"))
        .map_err(|_| format!("'{}' is not a valid date (use YYYY-MM-DD or MM/DD/YYYY)", text))
}

/// A field paired with a typed value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Id(RecordId),
    FirstName(String),
    LastName(String),
    DateOfBirth(NaiveDate),
    Height(i16),
    Income(Income),
    PatronymicLetter(char),
}

impl FieldValue {
    /// The field this value belongs to
    pub fn field(&self) -> Field {
        match self {
            FieldValue::Id(_) => Field::Id,
            FieldValue::FirstName(_) => Field::FirstName,
            FieldValue::LastName(_) => Field::LastName,
            FieldValue::DateOfBirth(_) => Field::DateOfBirth,
            FieldValue::Height(_) => Field::Height,
            FieldValue::Income(_) => Field::Income,
            FieldValue::PatronymicLetter(_) => Field::PatronymicLetter,
        }
    }

    /// Equality test against a record. Names compare case-insensitively.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            FieldValue::Id(id) => record.id == *id,
            FieldValue::FirstName(name) => record.first_name.to_lowercase() == name.to_lowercase(),
            FieldValue::LastName(name) => record.last_name.to_lowercase() == name.to_lowercase(),
            FieldValue::DateOfBirth(date) => record.date_of_birth == *date,
            FieldValue::Height(height) => record.height == *height,
            FieldValue::Income(income) => record.income == *income,
            FieldValue::PatronymicLetter(letter) => {
                record.patronymic_letter.to_uppercase().eq(letter.to_uppercase())
            }
        }
    }

    /// Write this value into a draft. Ids are not part of a draft and are ignored.
    pub(crate) fn write_to(&self, draft: &mut RecordDraft) {
        match self {
            FieldValue::Id(_) => {}
            FieldValue::FirstName(name) => draft.first_name = name.clone(),
            FieldValue::LastName(name) => draft.last_name = name.clone(),
            FieldValue::DateOfBirth(date) => draft.date_of_birth = *date,
            FieldValue::Height(height) => draft.height = *height,
            FieldValue::Income(income) => draft.income = *income,
            FieldValue::PatronymicLetter(letter) => draft.patronymic_letter = *letter,
        }
    }
}
