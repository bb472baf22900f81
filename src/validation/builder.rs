//! Fluent construction of a validator chain

use chrono::NaiveDate;

use super::validator::{
    CompositeValidator, DateOfBirthValidator, HeightValidator, IncomeValidator, NameValidator,
    PatronymicLetterValidator, Validator,
};
use crate::record::Income;

/// Collects field validators in order and builds a `CompositeValidator`.
#[derive(Default)]
pub struct ValidatorBuilder {
    validators: Vec<Box<dyn Validator>>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_first_name(self, min_len: usize, max_len: usize) -> Self {
        self.with(NameValidator::first_name(min_len, max_len))
    }

    pub fn validate_last_name(self, min_len: usize, max_len: usize) -> Self {
        self.with(NameValidator::last_name(min_len, max_len))
    }

    pub fn validate_date_of_birth(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.with(DateOfBirthValidator::new(from, to))
    }

    pub fn validate_height(self, min: i16, max: i16) -> Self {
        self.with(HeightValidator::new(min, max))
    }

    pub fn validate_income(self, min: Income, max: Income) -> Self {
        self.with(IncomeValidator::new(min, max))
    }

    pub fn validate_patronymic_letter(self, from: char, to: char) -> Self {
        self.with(PatronymicLetterValidator::new(from, to))
    }

    /// Append any validator
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn build(self) -> CompositeValidator {
        CompositeValidator::new(self.validators)
    }
}
