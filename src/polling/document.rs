//! Task status documents as returned by the console API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state_machine::TaskState;

/// Representation of a task resource at the time it was fetched
///
/// Only `state` drives polling. `createdAt` is advisory and every other
/// field is carried through untouched in `extra`. `state` is kept as raw JSON
/// so a non-string value decodes and is reported as malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    #[serde(rename = "taskId", default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,

    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDocument {
    /// Document carrying only a wire state
    pub fn with_state(state: impl Into<String>) -> Self {
        Self {
            state: Some(Value::String(state.into())),
            ..Self::default()
        }
    }

    /// Decode a response body, unwrapping an `entry[0].content` envelope if present
    pub fn from_response(body: Value) -> Result<Self, serde_json::Error> {
        let entry = body
            .get("entry")
            .and_then(Value::as_array)
            .and_then(|entries| entries.first())
            .cloned();

        match entry {
            Some(entry) => {
                let content = entry.get("content").cloned().unwrap_or(Value::Null);
                let mut document: TaskDocument = if content.is_null() {
                    TaskDocument::default()
                } else {
                    serde_json::from_value(content)?
                };
                if document.task_id.is_none() {
                    document.task_id = entry
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                }
                Ok(document)
            }
            None => serde_json::from_value(body),
        }
    }

    /// The reported state when it is a string
    pub fn state_str(&self) -> Option<&str> {
        self.state.as_ref().and_then(Value::as_str)
    }

    /// Parse the reported state, or explain why the document is malformed
    pub fn parse_state(&self) -> Result<TaskState, String> {
        match &self.state {
            None | Some(Value::Null) => Err("status document has no state field".to_string()),
            Some(Value::String(raw)) => TaskState::from_wire(raw)
                .ok_or_else(|| format!("unrecognized task state '{raw}'")),
            Some(other) => Err(format!("state is not a string: {other}")),
        }
    }

    /// `createdAt` (epoch seconds, number or numeric string) as a UTC timestamp
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let seconds = match self.created_at.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        let whole = seconds.trunc() as i64;
        let nanos = (seconds.fract() * 1_000_000_000.0).round() as u32;
        DateTime::from_timestamp(whole, nanos.min(999_999_999))
    }
}
