//! Diagnostic reporting for the mapping handlers.
//!
//! Handlers never fail on missing or malformed off-chain data; they report
//! and fall back to defaults. Reports go through [`Reporter`] so tests can
//! capture them with [`RecordingReporter`].

use std::sync::Mutex;

use tracing::{debug, error, warn};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Verbose tracing of extracted values
    Debug,
    /// Recoverable oddity (e.g. unexpected field kind)
    Warn,
    /// Degraded result (missing data, missing parent entity)
    Error,
}

/// Sink for handler diagnostics.
pub trait Reporter: Send + Sync {
    /// Emit a diagnostic for `operation`.
    fn report(&self, severity: Severity, operation: &'static str, message: &str);

    /// Shorthand for [`Severity::Error`].
    fn error(&self, operation: &'static str, message: &str) {
        self.report(Severity::Error, operation, message);
    }

    /// Shorthand for [`Severity::Warn`].
    fn warn(&self, operation: &'static str, message: &str) {
        self.report(Severity::Warn, operation, message);
    }

    /// Shorthand for [`Severity::Debug`].
    fn debug(&self, operation: &'static str, message: &str) {
        self.report(Severity::Debug, operation, message);
    }
}

/// Reporter that forwards to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, severity: Severity, operation: &'static str, message: &str) {
        match severity {
            Severity::Debug => debug!(operation, "{}", message),
            Severity::Warn => warn!(operation, "{}", message),
            Severity::Error => error!(operation, "{}", message),
        }
    }
}

/// A captured diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Handler or procedure that emitted it
    pub operation: &'static str,
    /// Rendered message
    pub message: String,
}

/// Reporter that keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingReporter {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics recorded so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Error diagnostics recorded so far.
    pub fn errors(&self) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .collect()
    }

    /// Whether an error was recorded for `operation`.
    pub fn has_error(&self, operation: &str) -> bool {
        self.errors().iter().any(|d| d.operation == operation)
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, severity: Severity, operation: &'static str, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                severity,
                operation,
                message: message.to_string(),
            });
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, severity: Severity, operation: &'static str, message: &str) {
        (**self).report(severity, operation, message);
    }
}

impl<R: Reporter + ?Sized> Reporter for std::sync::Arc<R> {
    fn report(&self, severity: Severity, operation: &'static str, message: &str) {
        (**self).report(severity, operation, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_captures_in_order() {
        let reporter = RecordingReporter::new();
        reporter.debug("update_badge_spec_metadata", "values a b c");
        reporter.error("handle_spec_created", "Raft rafts:1 not found");

        let entries = reporter.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Debug);
        assert_eq!(entries[1].operation, "handle_spec_created");

        assert_eq!(reporter.errors().len(), 1);
        assert!(reporter.has_error("handle_spec_created"));
        assert!(!reporter.has_error("update_badge_spec_metadata"));
    }

    #[test]
    fn test_arc_reporter_forwards() {
        let inner = std::sync::Arc::new(RecordingReporter::new());
        let shared = inner.clone();
        shared.warn("handle_raft_transfer", "name is not a string");
        assert_eq!(inner.entries().len(), 1);
    }
}
