//! # Health Tree Analyzer
//!
//! Turns a nested health tree into a flat lookup index and a list of
//! anomaly paths. Nothing here mutates the input tree; paths are carried
//! alongside each queued node instead of being written back onto it.

use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

use super::anomaly::AnomalyPath;
use super::error::{HealthError, HealthResult};
use super::feature::{HealthFeature, HealthStatus};
use crate::config::HealthConfig;
use crate::constants::DEFAULT_HEALTH_MAX_DEPTH;
use crate::logging::log_health_operation;

/// Per-node entry of the flattened index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSummary {
    pub health: HealthStatus,
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasons: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
    pub has_children: bool,
}

impl From<&HealthFeature> for FeatureSummary {
    fn from(feature: &HealthFeature) -> Self {
        Self {
            health: feature.health,
            disabled: feature.disabled,
            reasons: feature.reasons.clone(),
            messages: feature.messages.clone(),
            has_children: feature.has_children(),
        }
    }
}

/// Feature name to summary; names repeated across branches keep the last one seen
pub type HealthIndex = HashMap<String, FeatureSummary>;

/// Everything derived from one health tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub root: String,
    pub health: HealthStatus,
    pub index: HealthIndex,
    pub anomalies: Vec<AnomalyPath>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }
}

/// `feature.health == green`
pub fn is_healthy(feature: &HealthFeature) -> bool {
    feature.health.is_healthy()
}

#[derive(Debug, Clone)]
pub struct HealthTreeAnalyzer {
    max_depth: usize,
}

impl Default for HealthTreeAnalyzer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HEALTH_MAX_DEPTH,
        }
    }
}

impl HealthTreeAnalyzer {
    pub fn new(config: &HealthConfig) -> Self {
        Self::with_max_depth(config.max_depth)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn is_healthy(&self, feature: &HealthFeature) -> bool {
        is_healthy(feature)
    }

    /// Index the root and every descendant by name
    pub fn flatten(&self, root: &HealthFeature) -> HealthResult<HealthIndex> {
        let mut index = HealthIndex::new();
        let mut stack: Vec<(&HealthFeature, usize)> = vec![(root, 1)];

        while let Some((node, depth)) = stack.pop() {
            if depth > self.max_depth {
                return Err(HealthError::DepthExceeded {
                    path: node.name.clone(),
                    max_depth: self.max_depth,
                });
            }

            index.insert(node.name.clone(), FeatureSummary::from(node));

            // Reversed so siblings are visited in document order
            for child in node.children().iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        Ok(index)
    }

    /// Breadth-first search for unhealthy leaves below the given top-level features
    ///
    /// Only non-green nodes are enqueued. A node is reported when it has no
    /// children; an unhealthy parent whose children are all green is dropped.
    pub fn find_anomalies(&self, features: &[HealthFeature]) -> HealthResult<Vec<AnomalyPath>> {
        let mut anomalies = Vec::new();
        let mut queue: VecDeque<(&HealthFeature, Vec<String>)> = features
            .iter()
            .filter(|feature| !is_healthy(feature))
            .map(|feature| (feature, vec![feature.name.clone()]))
            .collect();

        while let Some((node, path)) = queue.pop_front() {
            if path.len() > self.max_depth {
                return Err(HealthError::DepthExceeded {
                    path: path.join("/"),
                    max_depth: self.max_depth,
                });
            }

            if node.has_children() {
                for child in node.children().iter().filter(|child| !is_healthy(child)) {
                    let mut child_path = path.clone();
                    child_path.push(child.name.clone());
                    queue.push_back((child, child_path));
                }
            } else {
                anomalies.push(AnomalyPath::from_leaf(node, path));
            }
        }

        Ok(anomalies)
    }

    /// Flatten the tree and collect the anomalies below its root
    pub fn analyze(&self, root: &HealthFeature) -> HealthResult<HealthReport> {
        let index = self.flatten(root)?;
        let anomalies = self.find_anomalies(root.children())?;

        log_health_operation("analyze", Some(&root.name), index.len(), anomalies.len());

        Ok(HealthReport {
            root: root.name.clone(),
            health: root.health,
            index,
            anomalies,
        })
    }
}
