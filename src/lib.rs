//! filecabinet - a console cabinet of personal records
//!
//! Records (name, date of birth, height, income, patronymic letter) live in
//! one of two interchangeable stores chosen at startup:
//!
//! - an in-memory store with hash indexes for name and date lookups
//! - a flat binary file of fixed-width slots with soft delete and purge
//!
//! Both are driven through the [`storage::RecordStore`] trait and share the
//! snapshot restore merge in [`snapshot`].

pub mod cli;
pub mod observability;
pub mod record;
pub mod snapshot;
pub mod storage;
pub mod validation;
