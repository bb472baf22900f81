//! Observable events for filecabinet
//!
//! Every log line names one of these events. Each event carries a fixed
//! severity so call sites never pick one ad hoc.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Session started, store about to be opened
    SessionStart,
    /// Session ended by `exit` or end of input
    SessionEnd,
    /// Validation rule set loaded
    RulesLoaded,
    /// Store opened and index built
    StoreOpened,
    /// Storage file is not a whole number of slots or a flag byte is invalid
    StoreCorruption,

    // Mutations
    /// Record created with a generated id
    RecordCreated,
    /// Record inserted with a caller-chosen id
    RecordInserted,
    /// Record replaced by id
    RecordEdited,
    /// Record removed
    RecordRemoved,
    /// A record failed validation and was not written
    ValidationRejected,

    // Snapshot / restore
    /// Snapshot taken from the live records
    SnapshotTaken,
    /// Restore started
    RestoreStart,
    /// Restore finished
    RestoreComplete,
    /// An incoming record was skipped during restore
    RestoreRecordRejected,

    // Compaction
    /// Purge started
    PurgeStart,
    /// Purge finished
    PurgeComplete,

    // Per-call tracing
    /// A store operation returned
    StoreCall,
}

impl Event {
    /// Returns the string representation of this event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SessionStart => "SESSION_START",
            Event::SessionEnd => "SESSION_END",
            Event::RulesLoaded => "RULES_LOADED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreCorruption => "STORE_CORRUPTION",
            Event::RecordCreated => "RECORD_CREATED",
            Event::RecordInserted => "RECORD_INSERTED",
            Event::RecordEdited => "RECORD_EDITED",
            Event::RecordRemoved => "RECORD_REMOVED",
            Event::ValidationRejected => "VALIDATION_REJECTED",
            Event::SnapshotTaken => "SNAPSHOT_TAKEN",
            Event::RestoreStart => "RESTORE_START",
            Event::RestoreComplete => "RESTORE_COMPLETE",
            Event::RestoreRecordRejected => "RESTORE_RECORD_REJECTED",
            Event::PurgeStart => "PURGE_START",
            Event::PurgeComplete => "PURGE_COMPLETE",
            Event::StoreCall => "STORE_CALL",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreCorruption => Severity::Fatal,
            Event::ValidationRejected | Event::RestoreRecordRejected => Severity::Warn,
            Event::StoreCall => Severity::Trace,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates the store cannot be used
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 17] = [
        Event::SessionStart,
        Event::SessionEnd,
        Event::RulesLoaded,
        Event::StoreOpened,
        Event::StoreCorruption,
        Event::RecordCreated,
        Event::RecordInserted,
        Event::RecordEdited,
        Event::RecordRemoved,
        Event::ValidationRejected,
        Event::SnapshotTaken,
        Event::RestoreStart,
        Event::RestoreComplete,
        Event::RestoreRecordRejected,
        Event::PurgeStart,
        Event::PurgeComplete,
        Event::StoreCall,
    ];

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        for event in ALL {
            let name = event.as_str();
            assert!(!name.is_empty());
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'), "{}", name);
        }
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        let fatal: Vec<_> = ALL.iter().filter(|e| e.is_fatal()).collect();
        assert_eq!(fatal, vec![&Event::StoreCorruption]);
    }

    #[test]
    fn test_rejections_are_warnings() {
        assert_eq!(Event::RestoreRecordRejected.severity(), Severity::Warn);
        assert_eq!(Event::ValidationRejected.severity(), Severity::Warn);
        assert_eq!(Event::StoreCall.severity(), Severity::Trace);
    }

    #[test]
    fn test_event_display() {
        assert_eq!(format!("{}", Event::PurgeComplete), "PURGE_COMPLETE");
    }
}
