//! Batched compile diagnostics.
//!
//! Warnings and recoverable errors are collected in order during a compile
//! run and reported in one batch at the end, never interleaved with output.

use serde::Serialize;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Warn,
    Error,
}

/// One diagnostic: a stable code, a human-readable message, and the element
/// path it concerns (when element-scoped).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: Level,
    pub code: String,
    pub message: String,
    pub path: Option<String>,
}

/// Ordered collector for a compile run's diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, path: Option<String>) {
        self.entries.push(Diagnostic {
            level: Level::Warn,
            code: code.to_string(),
            message: message.into(),
            path,
        });
    }

    /// Records a recoverable error (element-scoped; the compile continues).
    pub fn error(&mut self, code: &str, message: impl Into<String>, path: Option<String>) {
        self.entries.push(Diagnostic {
            level: Level::Error,
            code: code.to_string(),
            message: message.into(),
            path,
        });
    }

    /// Iterates entries in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of recorded diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if any entry is [`Level::Error`].
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.level == Level::Error)
    }

    /// Consumes the collector, yielding the ordered batch.
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
