//! Collaborator sinks: where user-facing errors and finished questions go.

pub mod bank;

use std::sync::Mutex;

pub use bank::{BankEntry, JsonlQuestionBank, MemoryQuestionBank, QuestionBank};

/// Localized-error reporting sink.
///
/// Receives a stable message key and free-form context; purely for
/// user-facing messages, it has no say in control flow.
pub trait ErrorSink: Send + Sync {
    fn report(&self, key: &str, context: &str);
}

/// Reports errors through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn report(&self, key: &str, context: &str) {
        tracing::error!(key = %key, "{}", context);
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingErrorSink {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(key, context)` pairs reported so far
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl ErrorSink for RecordingErrorSink {
    fn report(&self, key: &str, context: &str) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((key.to_string(), context.to_string()));
        }
    }
}
