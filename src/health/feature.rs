//! Health tree nodes and the wire format they are parsed from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::error::{HealthError, HealthResult};
use crate::constants::DEFAULT_HEALTH_MAX_DEPTH;

/// Traffic-light health of a feature; only `Green` is healthy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Info,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Green)
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    /// Severity for sorting (0 = healthy, 3 = critical)
    pub fn severity_level(&self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Info => 1,
            Self::Yellow => 2,
            Self::Red => 3,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Green => write!(f, "green"),
            Self::Yellow => write!(f, "yellow"),
            Self::Red => write!(f, "red"),
            Self::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_wire(s).ok_or_else(|| format!("Invalid health status: {s}"))
    }
}

/// A named node in a health tree
///
/// `features == None` marks a leaf. Children are owned, so a tree built
/// from this type is always finite and acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthFeature {
    pub name: String,
    pub health: HealthStatus,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<HealthFeature>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl HealthFeature {
    /// A leaf feature with no auxiliary payload
    pub fn new(name: impl Into<String>, health: HealthStatus) -> Self {
        Self {
            name: name.into(),
            health,
            disabled: false,
            features: None,
            reasons: None,
            messages: None,
        }
    }

    pub fn with_features(mut self, features: Vec<HealthFeature>) -> Self {
        self.features = Some(features);
        self
    }

    pub fn with_reasons(mut self, reasons: Value) -> Self {
        self.reasons = Some(reasons);
        self
    }

    pub fn with_messages(mut self, messages: Value) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Child features, empty for leaves
    pub fn children(&self) -> &[HealthFeature] {
        self.features.as_deref().unwrap_or_default()
    }

    /// True when at least one child exists; an empty list counts as a leaf
    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// Parse `{name, content: {health, disabled, features: {<name>: {...}}}}`
    pub fn from_document(document: &Value) -> HealthResult<Self> {
        Self::from_document_with_depth(document, DEFAULT_HEALTH_MAX_DEPTH)
    }

    /// Parse a health document, failing past `max_depth` levels
    pub fn from_document_with_depth(document: &Value, max_depth: usize) -> HealthResult<Self> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| HealthError::InvalidDocument("root has no 'name'".to_string()))?;
        let content = document
            .get("content")
            .and_then(Value::as_object)
            .ok_or_else(|| HealthError::InvalidDocument("root has no 'content' object".to_string()))?;

        let mut path = vec![name.to_string()];
        parse_node(name, content, &mut path, max_depth)
    }
}

fn parse_node(
    name: &str,
    content: &Map<String, Value>,
    path: &mut Vec<String>,
    max_depth: usize,
) -> HealthResult<HealthFeature> {
    if path.len() > max_depth {
        return Err(HealthError::DepthExceeded {
            path: path.join("/"),
            max_depth,
        });
    }

    let health = match content.get("health") {
        None | Some(Value::Null) => {
            return Err(HealthError::MissingHealth {
                path: path.join("/"),
            })
        }
        Some(Value::String(raw)) => {
            HealthStatus::from_wire(raw).ok_or_else(|| HealthError::UnknownHealth {
                path: path.join("/"),
                value: raw.clone(),
            })?
        }
        Some(other) => {
            return Err(HealthError::UnknownHealth {
                path: path.join("/"),
                value: other.to_string(),
            })
        }
    };

    let features = match content.get("features") {
        None | Some(Value::Null) => None,
        Some(Value::Object(children)) => {
            let mut parsed = Vec::with_capacity(children.len());
            for (child_name, child_value) in children {
                let child_content = child_value.as_object().ok_or_else(|| {
                    HealthError::InvalidDocument(format!(
                        "feature '{}/{child_name}' is not an object",
                        path.join("/")
                    ))
                })?;
                path.push(child_name.clone());
                let child = parse_node(child_name, child_content, path, max_depth);
                path.pop();
                parsed.push(child?);
            }
            Some(parsed)
        }
        Some(_) => {
            return Err(HealthError::InvalidDocument(format!(
                "'features' of '{}' is not an object",
                path.join("/")
            )))
        }
    };

    Ok(HealthFeature {
        name: name.to_string(),
        health,
        disabled: parse_disabled(content.get("disabled")),
        features,
        reasons: content.get("reasons").filter(|v| !v.is_null()).cloned(),
        messages: content.get("messages").filter(|v| !v.is_null()).cloned(),
    })
}

/// The API reports `disabled` as a bool, `0`/`1`, or their string forms
fn parse_disabled(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "True"),
        _ => false,
    }
}
