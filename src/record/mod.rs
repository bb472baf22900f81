//! Record model for filecabinet
//!
//! A record is one person: name, date of birth, height, income and a
//! patronymic letter, identified by a store-assigned positive id.
//!
//! This module also holds the small query vocabulary shared by both
//! storage backends: typed field values, selections (`where` clauses)
//! and assignments (`set` clauses).

mod field;
mod income;
mod selection;
mod types;

pub use field::{parse_date, Field, FieldValue};
pub use income::{Income, ParseIncomeError};
pub use selection::{Assignment, Combinator, Selection};
pub use types::{Record, RecordDraft, RecordId};
