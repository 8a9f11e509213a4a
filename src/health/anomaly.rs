use serde::Serialize;
use serde_json::Value;

use super::feature::{HealthFeature, HealthStatus};
use crate::constants::ANOMALY_PATH_SEPARATOR;

/// Chain of unhealthy feature names ending at the deepest unhealthy leaf
///
/// `health`, `reasons` and `messages` are copied from that leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyPath {
    pub names: Vec<String>,
    pub health: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
}

impl AnomalyPath {
    pub(crate) fn from_leaf(leaf: &HealthFeature, names: Vec<String>) -> Self {
        Self {
            names,
            health: leaf.health,
            reasons: leaf.reasons.clone(),
            messages: leaf.messages.clone(),
        }
    }

    pub fn leaf_name(&self) -> &str {
        self.names.last().map(String::as_str).unwrap_or_default()
    }

    /// Path rendered for a table cell, e.g. `search_scheduler | skipped_searches`
    pub fn display_label(&self) -> String {
        self.names.join(ANOMALY_PATH_SEPARATOR)
    }

    /// Human-readable reason texts of the leaf
    pub fn descriptions(&self) -> Vec<String> {
        self.reason_entries()
            .filter_map(|entry| entry.get("reason").and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Health check tags derived from each reason's `due_to_stanza`
    ///
    /// A stanza such as `feature:search_scheduler` yields `search_scheduler`.
    pub fn investigate_tags(&self) -> Vec<String> {
        self.reason_entries()
            .filter_map(|entry| entry.get("due_to_stanza").and_then(Value::as_str))
            .filter_map(|stanza| stanza.rsplit(':').next())
            .map(str::to_string)
            .collect()
    }

    /// Entries of the first reason group: `reasons = {<indicator>: {<id>: entry}}`
    fn reason_entries(&self) -> impl Iterator<Item = &Value> {
        let group = self
            .reasons
            .as_ref()
            .and_then(|reasons| match reasons {
                Value::Object(map) => map.values().next(),
                Value::Array(items) => items.first(),
                _ => None,
            });

        let entries: Vec<&Value> = match group {
            Some(Value::Object(map)) => map.values().collect(),
            Some(Value::Array(items)) => items.iter().collect(),
            _ => Vec::new(),
        };
        entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skipped_searches() -> AnomalyPath {
        let leaf = HealthFeature::new("skipped_searches", HealthStatus::Yellow).with_reasons(json!({
            "yellow": {
                "1": {
                    "indicator": "percent_searches_skipped_high_priority_last_24h",
                    "reason": "The percentage of high priority searches skipped is above 10%.",
                    "due_to_stanza": "feature:searches_skipped_in_the_last_24_hours"
                },
                "2": {
                    "reason": "The percentage of non high priority searches skipped is above 40%.",
                    "due_to_stanza": "feature:searches_skipped_in_the_last_24_hours"
                }
            }
        }));
        AnomalyPath::from_leaf(
            &leaf,
            vec!["search_scheduler".to_string(), "skipped_searches".to_string()],
        )
    }

    #[test]
    fn test_labels() {
        let anomaly = skipped_searches();
        assert_eq!(anomaly.leaf_name(), "skipped_searches");
        assert_eq!(anomaly.display_label(), "search_scheduler | skipped_searches");
        assert_eq!(anomaly.health, HealthStatus::Yellow);
    }

    #[test]
    fn test_descriptions_and_tags() {
        let anomaly = skipped_searches();
        assert_eq!(anomaly.descriptions().len(), 2);
        assert!(anomaly.descriptions()[0].contains("high priority"));
        assert_eq!(
            anomaly.investigate_tags(),
            vec![
                "searches_skipped_in_the_last_24_hours".to_string(),
                "searches_skipped_in_the_last_24_hours".to_string()
            ]
        );
    }

    #[test]
    fn test_no_reasons() {
        let leaf = HealthFeature::new("disk", HealthStatus::Red);
        let anomaly = AnomalyPath::from_leaf(&leaf, vec!["disk".to_string()]);
        assert!(anomaly.descriptions().is_empty());
        assert!(anomaly.investigate_tags().is_empty());
    }
}
