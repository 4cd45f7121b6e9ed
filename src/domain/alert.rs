//! Alert - Check Status Events
//!
//! Typed form of the `checks:all` payload:
//!
//! ```text
//! { alert: { id, host, command },
//!   status: "ok" | "warn" | "error",
//!   result: <string | { description: string }>,
//!   last_update: <string> }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::constants::ROW_ID_PREFIX;
use crate::error::{Error, Result};

/// Stable alert identifier
///
/// Numeric ids are normalized to their decimal text, so `7`, `7.0` and `"7"`
/// address the same row.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct AlertId(pub Arc<str>);

impl AlertId {
    /// Create a new AlertId from a string
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier of the rendered row (`alert-<id>`)
    pub fn row_id(&self) -> String {
        format!("{ROW_ID_PREFIX}{}", self.0)
    }

    fn from_wire(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Ok(Self::new(s.as_str())),
            Value::Number(n) => Ok(Self::new(number_text(n))),
            Value::Null => Err(malformed("alert.id is missing")),
            other => Err(malformed(format!(
                "alert.id must be a non-empty string or integer, got {other}"
            ))),
        }
    }
}

impl From<&str> for AlertId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AlertId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<u64> for AlertId {
    fn from(n: u64) -> Self {
        Self::new(n.to_string())
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertStatus {
    Ok,
    Warn,
    Error,
}

impl AlertStatus {
    /// Short display label
    pub fn label(self) -> &'static str {
        match self {
            AlertStatus::Ok => "OK",
            AlertStatus::Warn => "WARN",
            AlertStatus::Error => "FAIL",
        }
    }

    /// Visual severity class token
    pub fn severity_class(self) -> &'static str {
        match self {
            AlertStatus::Ok => "success",
            AlertStatus::Warn => "warn",
            AlertStatus::Error => "danger",
        }
    }

    /// Wire spelling
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Ok => "ok",
            AlertStatus::Warn => "warn",
            AlertStatus::Error => "error",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ok" => Ok(AlertStatus::Ok),
            "warn" => Ok(AlertStatus::Warn),
            "error" => Ok(AlertStatus::Error),
            other => Err(Error::UnknownStatus {
                status: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label for a wire status value
pub fn label_for(status: &str) -> Result<&'static str> {
    status.parse::<AlertStatus>().map(AlertStatus::label)
}

/// Severity class for a wire status value
pub fn severity_class_for(status: &str) -> Result<&'static str> {
    status.parse::<AlertStatus>().map(AlertStatus::severity_class)
}

/// Status as reported on the wire
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportedStatus {
    Known(AlertStatus),
    /// Anything outside ok/warn/error, kept verbatim
    Unrecognized(Arc<str>),
}

impl ReportedStatus {
    pub fn known(&self) -> Option<AlertStatus> {
        match self {
            ReportedStatus::Known(status) => Some(*status),
            ReportedStatus::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for ReportedStatus {
    fn from(raw: &str) -> Self {
        match raw.parse::<AlertStatus>() {
            Ok(status) => ReportedStatus::Known(status),
            Err(_) => ReportedStatus::Unrecognized(raw.into()),
        }
    }
}

/// Check result, selected by the status tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlertResult {
    /// `result.description` of a passing check
    Description(String),
    /// Raw result value of any other check, rendered as-is
    Raw(String),
}

impl AlertResult {
    /// Text shown in the description cell
    pub fn text(&self) -> &str {
        match self {
            AlertResult::Description(text) | AlertResult::Raw(text) => text,
        }
    }

    fn from_wire(status: &ReportedStatus, value: &Value) -> Self {
        if status.known() == Some(AlertStatus::Ok) {
            if let Some(Value::String(description)) = value.get("description") {
                return AlertResult::Description(description.clone());
            }
        }
        AlertResult::Raw(display_text(value))
    }
}

/// A single alert status event
///
/// Cell fields are `None` when the payload omits them; the row keeps its
/// previous value for those cells. An explicit `null` clears the cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlertEvent {
    pub alert_id: AlertId,
    pub status: ReportedStatus,
    pub host: Option<String>,
    pub command: Option<String>,
    pub result: Option<AlertResult>,
    /// Opaque display value, never parsed
    pub last_update: Option<String>,
}

impl AlertEvent {
    /// Parse a deserialized payload
    pub fn from_payload(payload: &Value) -> Result<Self> {
        if !payload.is_object() {
            return Err(malformed(format!("payload must be an object, got {payload}")));
        }

        let alert = match payload.get("alert") {
            Some(alert) if alert.is_object() => alert,
            None | Some(Value::Null) => return Err(malformed("alert is missing")),
            Some(other) => return Err(malformed(format!("alert must be an object, got {other}"))),
        };
        let status = match payload.get("status") {
            Some(Value::String(raw)) => ReportedStatus::from(raw.as_str()),
            None | Some(Value::Null) => return Err(malformed("status is missing")),
            Some(other) => return Err(malformed(format!("status must be a string, got {other}"))),
        };

        Ok(Self {
            alert_id: AlertId::from_wire(alert.get("id").unwrap_or(&Value::Null))?,
            result: payload
                .get("result")
                .map(|value| AlertResult::from_wire(&status, value)),
            status,
            host: alert.get("host").map(display_text),
            command: alert.get("command").map(display_text),
            last_update: payload.get("last_update").map(display_text),
        })
    }

    /// Parse a raw JSON payload
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_payload(&value)
    }
}

/// Decimal text of a numeric id; integral floats lose their fraction
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

/// Largest float below which every integer is exactly representable (2^53)
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Text of a JSON value as shown in a cell
fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedEvent {
        message: message.into(),
    }
}
