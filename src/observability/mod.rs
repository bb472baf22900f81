//! Observability subsystem for filecabinet
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Per-call store tracing through [`ObservedStore`]
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes a store's result
//! 2. No background threads
//! 3. Deterministic output (fields are sorted by key)
//!
//! # Usage
//!
//! ```ignore
//! use filecabinet::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::RecordCreated, &[("record_id", "7")]);
//! ```

mod events;
mod logger;
mod observed;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use observed::ObservedStore;
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event at the event's own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::SessionStart);
        log_event(Event::SessionEnd);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::StoreOpened, &[("path", "/tmp/cabinet.db")]);
    }
}
