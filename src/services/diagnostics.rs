//! Board Diagnostics
//!
//! Recent problems seen by the board, kept in a ring buffer next to the log
//! output so hosts can surface them without scraping logs.

use chrono::{DateTime, Local};

use crate::constants::DIAGNOSTICS_CAPACITY;
use crate::helpers::BoundedDeque;

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    JoinFailed,
    MalformedEvent,
    UnknownStatus,
    Disconnected,
}

impl DiagnosticKind {
    pub fn label(&self) -> &'static str {
        match self {
            DiagnosticKind::JoinFailed => "JOIN",
            DiagnosticKind::MalformedEvent => "MALFORMED",
            DiagnosticKind::UnknownStatus => "STATUS",
            DiagnosticKind::Disconnected => "DISCONNECTED",
        }
    }
}

/// A single diagnostic entry
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub id: u64,
    pub kind: DiagnosticKind,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

/// Bounded history of diagnostics
#[derive(Debug)]
pub struct Diagnostics {
    entries: BoundedDeque<Diagnostic>,
    next_id: u64,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedDeque::new(capacity),
            next_id: 1,
        }
    }

    /// Record a diagnostic with the current timestamp
    pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            id: self.next_id,
            kind,
            message: message.into(),
            timestamp: Local::now(),
        });
        self.next_id += 1;
    }

    /// Entries from oldest to newest
    pub fn entries(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&Diagnostic> {
        self.entries.last()
    }

    /// Number of entries matching `kind`
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DIAGNOSTICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_assigns_ids_and_evicts() {
        let mut diagnostics = Diagnostics::new(2);
        diagnostics.record(DiagnosticKind::JoinFailed, "unauthorized");
        diagnostics.record(DiagnosticKind::MalformedEvent, "alert is missing");
        diagnostics.record(DiagnosticKind::UnknownStatus, "degraded");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.count(DiagnosticKind::JoinFailed), 0);

        let latest = diagnostics.latest().expect("latest");
        assert_eq!(latest.id, 3);
        assert_eq!(latest.kind.label(), "STATUS");
    }
}
