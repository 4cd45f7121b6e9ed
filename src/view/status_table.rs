//! Status Table View
//!
//! Keeps exactly one row per alert id, created on first sighting and updated in
//! place on every later event. Rows are never removed.

use ahash::RandomState;
use hashlink::LinkedHashMap;

use crate::domain::{AlertEvent, AlertId, ReportedStatus};
use crate::error::Error;

/// Visual state of a single row
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowState {
    /// Row identifier (`alert-<id>`)
    pub row_id: String,
    /// Severity class, unset until a known status arrives
    pub severity_class: Option<&'static str>,
    /// Status cell
    pub status: &'static str,
    /// Host cell
    pub host: String,
    /// Description cell
    pub description: String,
    /// Last update cell
    pub last_update: String,
    /// Command cell
    pub command: String,
}

impl RowState {
    /// A row with empty placeholder cells
    fn placeholder(id: &AlertId) -> Self {
        Self {
            row_id: id.row_id(),
            ..Default::default()
        }
    }
}

/// Whether an event created or updated its row
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowChange {
    Inserted,
    Updated,
}

/// Result of applying one event
#[derive(Debug)]
pub struct ApplyOutcome {
    pub change: RowChange,
    /// Set when the status was not recognized; label and class were left as-is
    pub warning: Option<Error>,
}

/// Live status table keyed by alert id, in first-sighting order
#[derive(Debug, Default)]
pub struct StatusTableView {
    rows: LinkedHashMap<AlertId, RowState, RandomState>,
}

impl StatusTableView {
    /// Create an empty view
    pub fn new() -> Self {
        Self {
            rows: LinkedHashMap::with_hasher(RandomState::new()),
        }
    }

    /// Apply an alert event to its row, creating the row if needed
    pub fn apply_event(&mut self, event: &AlertEvent) -> ApplyOutcome {
        let mut change = RowChange::Updated;
        if !self.rows.contains_key(&event.alert_id) {
            self.rows
                .insert(event.alert_id.clone(), RowState::placeholder(&event.alert_id));
            change = RowChange::Inserted;
        }

        let mut warning = None;
        if let Some(row) = self.rows.get_mut(&event.alert_id) {
            match &event.status {
                ReportedStatus::Known(status) => {
                    row.severity_class = Some(status.severity_class());
                    row.status = status.label();
                }
                ReportedStatus::Unrecognized(raw) => {
                    warning = Some(Error::UnknownStatus {
                        status: raw.to_string(),
                    });
                }
            }
            if let Some(host) = &event.host {
                row.host.clone_from(host);
            }
            if let Some(command) = &event.command {
                row.command.clone_from(command);
            }
            if let Some(result) = &event.result {
                row.description = result.text().to_string();
            }
            if let Some(last_update) = &event.last_update {
                row.last_update.clone_from(last_update);
            }
        }

        ApplyOutcome { change, warning }
    }

    /// Get a row by alert id
    pub fn row(&self, id: &AlertId) -> Option<&RowState> {
        self.rows.get(id)
    }

    /// Check whether a row exists for the id
    pub fn contains(&self, id: &AlertId) -> bool {
        self.rows.contains_key(id)
    }

    /// All rows in first-sighting order
    pub fn rows(&self) -> impl Iterator<Item = (&AlertId, &RowState)> {
        self.rows.iter()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(payload: serde_json::Value) -> AlertEvent {
        AlertEvent::from_payload(&payload).expect("valid payload")
    }

    fn ok_event() -> AlertEvent {
        event(json!({
            "alert": {"id": "7", "host": "h1", "command": "ping"},
            "status": "ok",
            "result": {"description": "all good"},
            "last_update": "t1"
        }))
    }

    fn fail_event() -> AlertEvent {
        event(json!({
            "alert": {"id": "7", "host": "h1", "command": "ping"},
            "status": "error",
            "result": "timeout",
            "last_update": "t2"
        }))
    }

    #[test]
    fn test_first_event_creates_row() {
        let mut view = StatusTableView::new();
        let outcome = view.apply_event(&ok_event());

        assert_eq!(outcome.change, RowChange::Inserted);
        assert!(outcome.warning.is_none());
        assert_eq!(view.len(), 1);

        let row = view.row(&AlertId::from("7")).expect("row");
        assert_eq!(row.row_id, "alert-7");
        assert_eq!(row.status, "OK");
        assert_eq!(row.severity_class, Some("success"));
        assert_eq!(row.description, "all good");
        assert_eq!(row.host, "h1");
        assert_eq!(row.command, "ping");
        assert_eq!(row.last_update, "t1");
    }

    #[test]
    fn test_same_id_updates_in_place() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());
        let outcome = view.apply_event(&fail_event());

        assert_eq!(outcome.change, RowChange::Updated);
        assert_eq!(view.len(), 1);

        let row = view.row(&AlertId::from("7")).expect("row");
        assert_eq!(row.status, "FAIL");
        assert_eq!(row.severity_class, Some("danger"));
        assert_eq!(row.description, "timeout");
        assert_eq!(row.last_update, "t2");
    }

    #[test]
    fn test_new_id_adds_exactly_one_row() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());
        let before = view.len();

        view.apply_event(&event(json!({
            "alert": {"id": 8, "host": "h2", "command": "http"},
            "status": "warn",
            "result": "slow",
            "last_update": "t3"
        })));

        assert_eq!(view.len(), before + 1);
        let ids: Vec<&str> = view.rows().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
    }

    #[test]
    fn test_integer_and_string_ids_share_a_row() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());
        view.apply_event(&event(json!({
            "alert": {"id": 7, "host": "h1", "command": "ping"},
            "status": "warn",
            "result": "flapping",
            "last_update": "t4"
        })));

        assert_eq!(view.len(), 1);
        assert_eq!(view.row(&AlertId::from(7u64)).expect("row").status, "WARN");
    }

    #[test]
    fn test_reapplying_identical_event_is_idempotent() {
        let mut once = StatusTableView::new();
        once.apply_event(&fail_event());

        let mut twice = StatusTableView::new();
        twice.apply_event(&fail_event());
        twice.apply_event(&fail_event());

        assert_eq!(once.len(), twice.len());
        let id = AlertId::from("7");
        assert_eq!(once.row(&id), twice.row(&id));
    }

    #[test]
    fn test_unknown_status_keeps_label_and_class() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());

        let outcome = view.apply_event(&event(json!({
            "alert": {"id": "7", "host": "h9", "command": "ping"},
            "status": "maintenance",
            "result": "paused",
            "last_update": "t5"
        })));

        assert!(matches!(outcome.warning, Some(Error::UnknownStatus { .. })));
        let row = view.row(&AlertId::from("7")).expect("row");
        assert_eq!(row.status, "OK");
        assert_eq!(row.severity_class, Some("success"));
        assert_eq!(row.host, "h9");
        assert_eq!(row.description, "paused");
        assert_eq!(row.last_update, "t5");
    }

    #[test]
    fn test_omitted_fields_keep_previous_cells() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());

        view.apply_event(&event(json!({
            "alert": {"id": "7"},
            "status": "warn"
        })));

        let row = view.row(&AlertId::from("7")).expect("row");
        assert_eq!(row.status, "WARN");
        assert_eq!(row.severity_class, Some("warn"));
        assert_eq!(row.host, "h1");
        assert_eq!(row.command, "ping");
        assert_eq!(row.description, "all good");
        assert_eq!(row.last_update, "t1");
    }

    #[test]
    fn test_null_fields_clear_cells() {
        let mut view = StatusTableView::new();
        view.apply_event(&ok_event());

        view.apply_event(&event(json!({
            "alert": {"id": "7", "host": null, "command": "ping"},
            "status": "error",
            "result": null,
            "last_update": null
        })));

        let row = view.row(&AlertId::from("7")).expect("row");
        assert_eq!(row.host, "");
        assert_eq!(row.command, "ping");
        assert_eq!(row.description, "");
        assert_eq!(row.last_update, "");
    }

    #[test]
    fn test_unknown_status_on_new_row_leaves_placeholders() {
        let mut view = StatusTableView::new();
        view.apply_event(&event(json!({
            "alert": {"id": "x", "host": "h", "command": "c"},
            "status": "???",
            "result": "r",
            "last_update": "t"
        })));

        let row = view.row(&AlertId::from("x")).expect("row");
        assert_eq!(row.status, "");
        assert_eq!(row.severity_class, None);
        assert_eq!(row.description, "r");
    }
}
