//! Storage subsystem for filecabinet
//!
//! Two interchangeable backends behind [`RecordStore`]:
//!
//! - [`MemoryStore`]: records in a `Vec`, with hash indexes for lookups by
//!   first name, last name and date of birth
//! - [`FileStore`]: fixed-width binary slots in one file, soft delete via
//!   a tombstone byte, and an id -> offset index held in memory
//!
//! The slot codec in [`slot`] is the one bit-exact on-disk format.

mod errors;
mod file;
mod memory;
mod reader;
pub mod slot;
mod store;

pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use reader::SlotReader;
pub use store::{RecordStore, StoreStat};
