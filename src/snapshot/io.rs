//! JSON snapshot reader and writer
//!
//! The export format is a JSON array of record objects. On import, a file
//! that is not a JSON array is rejected as a whole; individual elements
//! that do not decode as records are reported and skipped.

use std::io::{Read, Write};

use serde_json::Value;

use super::merge::RestoreIssue;
use super::Snapshot;
use crate::record::{Record, RecordId};
use crate::storage::{StoreError, StoreResult};

/// A snapshot parsed from input, with the elements that could not be read
#[derive(Debug, Clone, Default)]
pub struct SnapshotLoad {
    pub snapshot: Snapshot,
    pub issues: Vec<RestoreIssue>,
}

impl Snapshot {
    /// Write the records as a pretty-printed JSON array.
    pub fn write_json<W: Write>(&self, mut writer: W) -> StoreResult<()> {
        serde_json::to_writer_pretty(&mut writer, &self.records).map_err(|e| {
            StoreError::io_error(
                "Failed to write snapshot",
                std::io::Error::new(std::io::ErrorKind::Other, e),
            )
        })?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| StoreError::io_error("Failed to write snapshot", e))
    }

    /// Parse a JSON array of records.
    pub fn read_json<R: Read>(reader: R) -> StoreResult<SnapshotLoad> {
        let document: Value = serde_json::from_reader(reader)
            .map_err(|e| StoreError::malformed_input(format!("unreadable snapshot: {}", e)))?;

        let elements = match document {
            Value::Array(elements) => elements,
            other => {
                return Err(StoreError::malformed_input(format!(
                    "snapshot must be a JSON array, found {}",
                    json_type_name(&other)
                )))
            }
        };

        let mut load = SnapshotLoad::default();
        let mut records = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            let id = element
                .get("id")
                .and_then(Value::as_i64)
                .and_then(|id| RecordId::try_from(id).ok());
            match serde_json::from_value::<Record>(element) {
                Ok(record) => records.push(record),
                Err(e) => load
                    .issues
                    .push(RestoreIssue::new(id, format!("element {}: {}", index, e))),
            }
        }
        load.snapshot = Snapshot::new(records);

        Ok(load)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Income, RecordDraft};
    use crate::storage::StoreErrorCode;
    use chrono::NaiveDate;

    fn record(id: i32) -> Record {
        RecordDraft::new(
            "Export",
            "Person",
            NaiveDate::from_ymd_opt(1999, 9, 9).unwrap(),
            160,
            Income::from_hundredths(99_99),
            'E',
        )
        .into_record(id)
    }

    #[test]
    fn test_export_then_import() {
        let snapshot = Snapshot::new(vec![record(1), record(2)]);
        let mut buf = Vec::new();
        snapshot.write_json(&mut buf).unwrap();

        let load = Snapshot::read_json(buf.as_slice()).unwrap();
        assert!(load.issues.is_empty());
        assert_eq!(load.snapshot, snapshot);
    }

    #[test]
    fn test_bad_element_is_reported() {
        let json = r#"[
            {"id": 1, "first_name": "Ann", "last_name": "Lee", "date_of_birth": "1990-01-01",
             "height": 170, "income": "10.00", "patronymic_letter": "A"},
            {"id": 2, "first_name": "Bob", "last_name": "Ray", "date_of_birth": "not a date",
             "height": 170, "income": "10.00", "patronymic_letter": "B"},
            "garbage"
        ]"#;

        let load = Snapshot::read_json(json.as_bytes()).unwrap();
        assert_eq!(load.snapshot.len(), 1);
        assert_eq!(load.issues.len(), 2);
        assert_eq!(load.issues[0].id, Some(2));
        assert_eq!(load.issues[1].id, None);
    }

    #[test]
    fn test_unreadable_framing_is_fatal_to_import() {
        let err = Snapshot::read_json("{ nope".as_bytes()).unwrap_err();
        assert_eq!(err.code(), StoreErrorCode::MalformedInput);

        let err = Snapshot::read_json(r#"{"id": 1}"#.as_bytes()).unwrap_err();
        assert!(err.message().contains("object"));
    }
}
