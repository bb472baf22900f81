//! Validator trait and the per-field validators
//!
//! Validators never mutate the draft. Each field validator checks one
//! field only; `CompositeValidator` runs them in order and reports the
//! first failure.

use chrono::NaiveDate;

use super::errors::ValidationFailure;
use crate::record::{Field, Income, RecordDraft};

/// A predicate over a candidate record.
pub trait Validator {
    /// Check a draft. `Ok(())` means the draft may be committed.
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure>;
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        (**self).validate(draft)
    }
}

/// Length check for `first_name` or `last_name`, counted in characters.
#[derive(Debug, Clone)]
pub struct NameValidator {
    field: Field,
    min_len: usize,
    max_len: usize,
}

impl NameValidator {
    pub fn first_name(min_len: usize, max_len: usize) -> Self {
        Self {
            field: Field::FirstName,
            min_len,
            max_len,
        }
    }

    pub fn last_name(min_len: usize, max_len: usize) -> Self {
        Self {
            field: Field::LastName,
            min_len,
            max_len,
        }
    }
}

impl Validator for NameValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        let value = match self.field {
            Field::LastName => &draft.last_name,
            _ => &draft.first_name,
        };

        if value.trim().is_empty() {
            return Err(ValidationFailure::new(self.field, "must not be empty"));
        }

        let len = value.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(ValidationFailure::new(
                self.field,
                format!(
                    "length must be between {} and {} characters, got {}",
                    self.min_len, self.max_len, len
                ),
            ));
        }
        Ok(())
    }
}

/// Inclusive date-of-birth range
#[derive(Debug, Clone)]
pub struct DateOfBirthValidator {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateOfBirthValidator {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }
}

impl Validator for DateOfBirthValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        let date = draft.date_of_birth;
        if date < self.from || date > self.to {
            return Err(ValidationFailure::new(
                Field::DateOfBirth,
                format!(
                    "must be between {} and {}, got {}",
                    self.from.format("%Y-%m-%d"),
                    self.to.format("%Y-%m-%d"),
                    date.format("%Y-%m-%d")
                ),
            ));
        }
        Ok(())
    }
}

/// Inclusive height range
#[derive(Debug, Clone)]
pub struct HeightValidator {
    min: i16,
    max: i16,
}

impl HeightValidator {
    pub fn new(min: i16, max: i16) -> Self {
        Self { min, max }
    }
}

impl Validator for HeightValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        if draft.height < self.min || draft.height > self.max {
            return Err(ValidationFailure::new(
                Field::Height,
                format!(
                    "must be between {} and {}, got {}",
                    self.min, self.max, draft.height
                ),
            ));
        }
        Ok(())
    }
}

/// Inclusive income range
#[derive(Debug, Clone)]
pub struct IncomeValidator {
    min: Income,
    max: Income,
}

impl IncomeValidator {
    pub fn new(min: Income, max: Income) -> Self {
        Self { min, max }
    }
}

impl Validator for IncomeValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        if draft.income < self.min || draft.income > self.max {
            return Err(ValidationFailure::new(
                Field::Income,
                format!(
                    "must be between {} and {}, got {}",
                    self.min, self.max, draft.income
                ),
            ));
        }
        Ok(())
    }
}

/// Uppercase Latin letter within an inclusive range
#[derive(Debug, Clone)]
pub struct PatronymicLetterValidator {
    from: char,
    to: char,
}

impl PatronymicLetterValidator {
    pub fn new(from: char, to: char) -> Self {
        Self { from, to }
    }
}

impl Validator for PatronymicLetterValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        let letter = draft.patronymic_letter;
        if !letter.is_ascii_uppercase() {
            return Err(ValidationFailure::new(
                Field::PatronymicLetter,
                format!("must be an uppercase Latin letter, got '{}'", letter),
            ));
        }
        if letter < self.from || letter > self.to {
            return Err(ValidationFailure::new(
                Field::PatronymicLetter,
                format!(
                    "must be between '{}' and '{}', got '{}'",
                    self.from, self.to, letter
                ),
            ));
        }
        Ok(())
    }
}

/// Ordered chain of validators; the first failure wins.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn Validator>>,
}

impl CompositeValidator {
    pub fn new(validators: Vec<Box<dyn Validator>>) -> Self {
        Self { validators }
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl Validator for CompositeValidator {
    fn validate(&self, draft: &RecordDraft) -> Result<(), ValidationFailure> {
        for validator in &self.validators {
            validator.validate(draft)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> RecordDraft {
        RecordDraft::new(
            "John",
            "Doe",
            NaiveDate::from_ymd_opt(1986, 5, 18).unwrap(),
            180,
            Income::from_units(1000),
            'P',
        )
    }

    #[test]
    fn test_name_bounds() {
        let v = NameValidator::first_name(2, 5);
        assert!(v.validate(&draft()).is_ok());

        let mut d = draft();
        d.first_name = "J".into();
        assert_eq!(v.validate(&d).unwrap_err().field, Field::FirstName);

        d.first_name = "   ".into();
        assert!(v.validate(&d).unwrap_err().reason.contains("empty"));

        d.first_name = "Johnny".into();
        assert!(v.validate(&d).is_err());
    }

    #[test]
    fn test_name_counts_chars_not_bytes() {
        let v = NameValidator::last_name(2, 4);
        let mut d = draft();
        d.last_name = "Żółw".into();
        assert!(v.validate(&d).is_ok());
    }

    #[test]
    fn test_date_range_inclusive() {
        let from = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let v = DateOfBirthValidator::new(from, to);

        let mut d = draft();
        d.date_of_birth = from;
        assert!(v.validate(&d).is_ok());
        d.date_of_birth = to;
        assert!(v.validate(&d).is_ok());
        d.date_of_birth = NaiveDate::from_ymd_opt(1949, 12, 31).unwrap();
        assert!(v.validate(&d).is_err());
    }

    #[test]
    fn test_height_and_income() {
        let mut d = draft();
        d.height = 300;
        assert!(HeightValidator::new(50, 250).validate(&d).is_err());

        d.income = Income::from_units(-1);
        assert!(IncomeValidator::new(Income::default(), Income::from_units(10))
            .validate(&d)
            .is_err());
    }

    #[test]
    fn test_patronymic_letter() {
        let v = PatronymicLetterValidator::new('A', 'M');
        let mut d = draft();
        assert!(v.validate(&d).is_err());
        d.patronymic_letter = 'c';
        assert!(v.validate(&d).unwrap_err().reason.contains("uppercase"));
        d.patronymic_letter = 'C';
        assert!(v.validate(&d).is_ok());
    }

    #[test]
    fn test_composite_reports_first_failure() {
        let composite = CompositeValidator::new(vec![
            Box::new(NameValidator::first_name(10, 20)),
            Box::new(HeightValidator::new(0, 1)),
        ]);
        let failure = composite.validate(&draft()).unwrap_err();
        assert_eq!(failure.field, Field::FirstName);
        assert!(CompositeValidator::default().validate(&draft()).is_ok());
    }
}
