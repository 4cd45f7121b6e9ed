//! HTML Renderer
//!
//! Renders the status table as a `<tbody id="alerts">` fragment or a full page.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::constants::{SNAPSHOT_REFRESH_SECS, TABLE_CONTAINER_ID};
use crate::domain::RenderConfig;
use crate::error::Result;
use crate::view::{RowState, StatusTableView};

/// Cell classes in column order
const COLUMNS: [(&str, &str); 5] = [
    ("status", "Status"),
    ("host", "Host"),
    ("description", "Description"),
    ("last-update", "Last update"),
    ("command", "Command"),
];

/// Renders a [`StatusTableView`] to HTML
#[derive(Clone, Debug)]
pub struct HtmlRenderer {
    title: String,
    legacy_success_class: bool,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl HtmlRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            title: config.title.clone(),
            legacy_success_class: config.legacy_success_class,
        }
    }

    /// Render the table body
    pub fn render_tbody(&self, view: &StatusTableView) -> String {
        let mut out = String::new();
        let _ = write!(out, "<tbody id=\"{TABLE_CONTAINER_ID}\">");
        for (_, row) in view.rows() {
            self.render_row(&mut out, row);
        }
        out.push_str("</tbody>");
        out
    }

    fn render_row(&self, out: &mut String, row: &RowState) {
        let _ = write!(out, "<tr id=\"{}\"", escape(&row.row_id));
        if let Some(class) = row.severity_class {
            let _ = write!(out, " class=\"{}\"", self.class_token(class));
        }
        out.push('>');

        let cells = [
            row.status,
            row.host.as_str(),
            row.description.as_str(),
            row.last_update.as_str(),
            row.command.as_str(),
        ];
        for ((class, _), text) in COLUMNS.iter().zip(cells) {
            let _ = write!(out, "<td class=\"{class}\">{}</td>", escape(text));
        }
        out.push_str("</tr>");
    }

    fn class_token(&self, class: &'static str) -> &'static str {
        if self.legacy_success_class && class == "success" {
            "sucess"
        } else {
            class
        }
    }

    /// Render a standalone page around the table body
    pub fn render_page(&self, view: &StatusTableView) -> String {
        let title = escape(&self.title);
        let mut out = String::new();
        let _ = write!(
            out,
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <meta http-equiv=\"refresh\" content=\"{SNAPSHOT_REFRESH_SECS}\">\n\
             <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<table>\n<thead><tr>"
        );
        for (_, header) in COLUMNS {
            let _ = write!(out, "<th>{header}</th>");
        }
        out.push_str("</tr></thead>\n");
        out.push_str(&self.render_tbody(view));
        out.push_str("\n</table>\n</body>\n</html>\n");
        out
    }

    /// Write the page to `path`, replacing any previous snapshot
    pub fn write_snapshot(&self, view: &StatusTableView, path: &Path) -> Result<()> {
        let tmp = path.with_extension("html.tmp");
        fs::write(&tmp, self.render_page(view))?;
        fs::rename(&tmp, path)?;
        tracing::debug!("Wrote snapshot with {} rows to {}", view.len(), path.display());
        Ok(())
    }
}

/// Escape text for HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AlertEvent;
    use serde_json::json;

    fn view_with(payloads: &[serde_json::Value]) -> StatusTableView {
        let mut view = StatusTableView::new();
        for payload in payloads {
            view.apply_event(&AlertEvent::from_payload(payload).expect("valid"));
        }
        view
    }

    #[test]
    fn test_render_tbody() {
        let view = view_with(&[json!({
            "alert": {"id": "7", "host": "h1", "command": "ping"},
            "status": "ok",
            "result": {"description": "all good"},
            "last_update": "t1"
        })]);

        let html = HtmlRenderer::default().render_tbody(&view);
        assert_eq!(
            html,
            "<tbody id=\"alerts\"><tr id=\"alert-7\" class=\"success\">\
             <td class=\"status\">OK</td><td class=\"host\">h1</td>\
             <td class=\"description\">all good</td><td class=\"last-update\">t1</td>\
             <td class=\"command\">ping</td></tr></tbody>"
        );
    }

    #[test]
    fn test_render_escapes_text() {
        let view = view_with(&[json!({
            "alert": {"id": "\"x\"", "host": "<b>h</b>", "command": "a && b"},
            "status": "error",
            "result": "<script>alert('x')</script>",
            "last_update": "t"
        })]);

        let html = HtmlRenderer::default().render_tbody(&view);
        assert!(html.contains("id=\"alert-&quot;x&quot;\""));
        assert!(html.contains("&lt;b&gt;h&lt;/b&gt;"));
        assert!(html.contains("a &amp;&amp; b"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_render_keeps_first_sighting_order() {
        let row = |id: &str, status: &str| {
            json!({
                "alert": {"id": id, "host": "h", "command": "c"},
                "status": status,
                "result": "r",
                "last_update": "t"
            })
        };
        let view = view_with(&[row("b", "warn"), row("a", "ok"), row("b", "error")]);

        let html = HtmlRenderer::default().render_tbody(&view);
        let b = html.find("alert-b").expect("b");
        let a = html.find("alert-a").expect("a");
        assert!(b < a);
        assert_eq!(html.matches("<tr ").count(), 2);
    }

    #[test]
    fn test_legacy_success_class() {
        let view = view_with(&[json!({
            "alert": {"id": 1, "host": "h", "command": "c"},
            "status": "ok",
            "result": {"description": "d"},
            "last_update": "t"
        })]);

        let renderer = HtmlRenderer::new(&RenderConfig {
            legacy_success_class: true,
            ..Default::default()
        });
        assert!(renderer.render_tbody(&view).contains("class=\"sucess\""));
    }

    #[test]
    fn test_row_without_class_has_no_class_attribute() {
        let view = view_with(&[json!({
            "alert": {"id": 1, "host": "h", "command": "c"},
            "status": "paused",
            "result": "r",
            "last_update": "t"
        })]);

        let html = HtmlRenderer::default().render_tbody(&view);
        assert!(html.contains("<tr id=\"alert-1\">"));
    }

    #[test]
    fn test_render_page_and_snapshot() {
        let view = view_with(&[]);
        let renderer = HtmlRenderer::new(&RenderConfig {
            title: "Checks & Alerts".to_string(),
            ..Default::default()
        });

        let page = renderer.render_page(&view);
        assert!(page.contains("<title>Checks &amp; Alerts</title>"));
        assert!(page.contains("<tbody id=\"alerts\"></tbody>"));

        let path = std::env::temp_dir().join(format!(
            "status-board-snapshot-{}.html",
            uuid::Uuid::new_v4()
        ));
        renderer.write_snapshot(&view, &path).expect("write snapshot");
        let written = std::fs::read_to_string(&path).expect("read snapshot");
        assert_eq!(written, page);
        let _ = std::fs::remove_file(&path);
    }
}
