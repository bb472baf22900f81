//! Paired start/complete logging and elapsed-time measurement

use std::cell::Cell;
use std::time::Instant;

use super::events::Event;
use super::logger::{Logger, Severity};

/// A scope that logs a start event on creation and a completion event
/// when closed
///
/// ```ignore
/// let scope = ObservationScope::new(Event::PurgeStart, Event::PurgeComplete);
/// let purged = store.purge()?;
/// scope.complete_with_fields(&[("purged", &purged.to_string())]);
/// ```
///
/// Dropping the scope without `complete` or `fail` logs the completion
/// event at WARN with `outcome=incomplete`.
pub struct ObservationScope {
    complete_event: Event,
    completed: Cell<bool>,
    fields: Vec<(&'static str, String)>,
}

impl ObservationScope {
    /// Open a scope and log `start_event`
    pub fn new(start_event: Event, complete_event: Event) -> Self {
        Self::with_fields(start_event, complete_event, &[])
    }

    /// Open a scope whose fields are repeated on every line it logs
    pub fn with_fields(
        start_event: Event,
        complete_event: Event,
        fields: &[(&'static str, &str)],
    ) -> Self {
        Logger::log(start_event.severity(), start_event.as_str(), fields);
        Self {
            complete_event,
            completed: Cell::new(false),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    /// Close the scope successfully
    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Close the scope successfully, adding result fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        self.emit(self.complete_event.severity(), "ok", extra_fields);
    }

    /// Close the scope as failed
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        self.emit(Severity::Error, "failed", &[("reason", reason)]);
    }

    /// Close the scope as failed with the store left unusable
    pub fn fail_fatal(self, reason: &str) {
        self.completed.set(true);
        self.emit(Severity::Fatal, "failed", &[("reason", reason)]);
    }

    /// Check if the scope has been closed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    fn emit(&self, severity: Severity, outcome: &str, extra_fields: &[(&str, &str)]) {
        let mut all_fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all_fields.push(("outcome", outcome));
        all_fields.extend(extra_fields.iter().copied());
        Logger::log(severity, self.complete_event.as_str(), &all_fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.completed.get() {
            self.emit(Severity::Warn, "incomplete", &[]);
        }
    }
}

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed microseconds as a string
    pub fn elapsed_us(&self) -> String {
        self.start.elapsed().as_micros().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
