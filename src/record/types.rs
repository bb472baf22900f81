//! Record and draft types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::field::Field;
use super::income::Income;

/// Store-assigned record identifier. Always positive for stored records.
pub type RecordId = i32;

/// The editable part of a record: every field except `id`.
///
/// Drafts are built by the caller, validated, and consumed once by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub height: i16,
    pub income: Income,
    pub patronymic_letter: char,
}

impl RecordDraft {
    /// Create a new draft
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        height: i16,
        income: Income,
        patronymic_letter: char,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            height,
            income,
            patronymic_letter,
        }
    }

    /// Attach an id, producing a full record
    pub fn into_record(self, id: RecordId) -> Record {
        Record {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            date_of_birth: self.date_of_birth,
            height: self.height,
            income: self.income,
            patronymic_letter: self.patronymic_letter,
        }
    }
}

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub height: i16,
    pub income: Income,
    pub patronymic_letter: char,
}

impl Record {
    /// Copy of the editable fields
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            height: self.height,
            income: self.income,
            patronymic_letter: self.patronymic_letter,
        }
    }

    /// Overwrite every editable field, keeping the id.
    pub fn apply_draft(&mut self, draft: RecordDraft) {
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.date_of_birth = draft.date_of_birth;
        self.height = draft.height;
        self.income = draft.income;
        self.patronymic_letter = draft.patronymic_letter;
    }

    /// Render one field as display text.
    ///
    /// Dates use `YYYY-MM-DD`, income always carries two decimals.
    pub fn field_text(&self, field: Field) -> String {
        match field {
            Field::Id => self.id.to_string(),
            Field::FirstName => self.first_name.clone(),
            Field::LastName => self.last_name.clone(),
            Field::DateOfBirth => self.date_of_birth.format("%Y-%m-%d").to_string(),
            Field::Height => self.height.to_string(),
            Field::Income => self.income.to_string(),
            Field::PatronymicLetter => self.patronymic_letter.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> RecordDraft {
        RecordDraft::new(
            "John",
            "Doe",
            NaiveDate::from_ymd_opt(1986, 5, 18).unwrap(),
            180,
            Income::from_hundredths(1_250_050),
            'P',
        )
    }

    #[test]
    fn test_into_record_keeps_fields() {
        let record = sample_draft().into_record(7);
        assert_eq!(record.id, 7);
        assert_eq!(record.first_name, "John");
        assert_eq!(record.to_draft(), sample_draft());
    }

    #[test]
    fn test_apply_draft_preserves_id() {
        let mut record = sample_draft().into_record(3);
        let mut draft = sample_draft();
        draft.first_name = "Jane".to_string();
        record.apply_draft(draft);

        assert_eq!(record.id, 3);
        assert_eq!(record.first_name, "Jane");
    }

    #[test]
    fn test_field_text() {
        let record = sample_draft().into_record(1);
        assert_eq!(record.field_text(Field::DateOfBirth), "1986-05-18");
        assert_eq!(record.field_text(Field::Income), "12500.50");
        assert_eq!(record.field_text(Field::PatronymicLetter), "P");
    }

    #[test]
    fn test_json_shape() {
        let record = sample_draft().into_record(1);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["date_of_birth"], "1986-05-18");
        assert_eq!(value["income"], "12500.50");
        assert_eq!(value["patronymic_letter"], "P");
    }
}
