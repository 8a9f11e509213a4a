//! Health tree parsing and anomaly detection over realistic documents

use serde_json::{json, Value};

use taskwatch_core::health::{HealthError, HealthStatus};
use taskwatch_core::{HealthFeature, HealthTreeAnalyzer};

fn splunkd_details() -> Value {
    json!({
        "name": "splunkd",
        "content": {
            "health": "yellow",
            "disabled": false,
            "features": {
                "data_forwarding": {
                    "health": "green",
                    "features": {
                        "tcpout_autolb": { "health": "green" }
                    }
                },
                "index_processor": {
                    "health": "red",
                    "features": {
                        "buckets": {
                            "health": "red",
                            "reasons": {
                                "red": {
                                    "1": {
                                        "indicator": "buckets_created_last_60m",
                                        "reason": "The number of buckets created exceeded the threshold.",
                                        "due_to_stanza": "feature:buckets"
                                    }
                                }
                            },
                            "messages": { "info": ["bucket roll rate is high"] }
                        },
                        "disk_space": { "health": "green" }
                    }
                },
                "search_scheduler": {
                    "health": "yellow",
                    "features": {
                        "searches_delayed": { "health": "green" },
                        "skipped_searches": {
                            "health": "yellow",
                            "features": {}
                        }
                    }
                },
                "file_monitor_input": {
                    "health": "yellow",
                    "disabled": 1,
                    "features": {
                        "forwarder_ingestion_latency": { "health": "green" }
                    }
                }
            }
        }
    })
}

#[test]
fn test_analyze_details_document() {
    let root = HealthFeature::from_document(&splunkd_details()).unwrap();
    let report = HealthTreeAnalyzer::default().analyze(&root).unwrap();

    assert_eq!(report.root, "splunkd");
    assert_eq!(report.health, HealthStatus::Yellow);
    assert!(!report.is_healthy());
    assert_eq!(report.index.len(), 11);

    let labels: Vec<String> = report.anomalies.iter().map(|a| a.display_label()).collect();
    assert_eq!(
        labels,
        vec![
            "index_processor | buckets",
            "search_scheduler | skipped_searches"
        ]
    );

    let buckets = &report.anomalies[0];
    assert_eq!(buckets.health, HealthStatus::Red);
    assert_eq!(buckets.investigate_tags(), vec!["buckets".to_string()]);
    assert_eq!(
        buckets.descriptions(),
        vec!["The number of buckets created exceeded the threshold.".to_string()]
    );
    assert!(buckets.messages.is_some());
}

#[test]
fn test_index_carries_node_details() {
    let root = HealthFeature::from_document(&splunkd_details()).unwrap();
    let index = HealthTreeAnalyzer::default().flatten(&root).unwrap();

    assert!(index["file_monitor_input"].disabled);
    assert!(index["file_monitor_input"].has_children);
    assert!(!index["skipped_searches"].has_children);
    assert_eq!(index["skipped_searches"].health, HealthStatus::Yellow);
    assert!(index["buckets"].reasons.is_some());
    assert!(index["disk_space"].reasons.is_none());
}

#[test]
fn test_all_green_tree_has_no_anomalies() {
    let doc = json!({
        "name": "splunkd",
        "content": {
            "health": "green",
            "features": {
                "a": { "health": "green", "features": { "a1": { "health": "green" } } },
                "b": { "health": "green" }
            }
        }
    });

    let root = HealthFeature::from_document(&doc).unwrap();
    let report = HealthTreeAnalyzer::default().analyze(&root).unwrap();
    assert!(report.is_healthy());
    assert!(report.anomalies.is_empty());
    assert_eq!(report.index.len(), 4);
}

#[test]
fn test_unhealthy_parent_of_green_children_is_skipped() {
    let features = vec![HealthFeature::new("cluster", HealthStatus::Red).with_features(vec![
        HealthFeature::new("peer1", HealthStatus::Green),
        HealthFeature::new("peer2", HealthStatus::Green),
    ])];

    let anomalies = HealthTreeAnalyzer::default().find_anomalies(&features).unwrap();
    assert!(anomalies.is_empty());
}

#[test]
fn test_info_counts_as_unhealthy() {
    let features = vec![HealthFeature::new("license", HealthStatus::Info)];
    let anomalies = HealthTreeAnalyzer::default().find_anomalies(&features).unwrap();

    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].health, HealthStatus::Info);
}

#[test]
fn test_missing_health_is_rejected() {
    let doc = json!({
        "name": "splunkd",
        "content": {
            "health": "green",
            "features": { "broken": { "disabled": false } }
        }
    });

    let err = HealthFeature::from_document(&doc).unwrap_err();
    assert_eq!(
        err,
        HealthError::MissingHealth {
            path: "splunkd/broken".to_string()
        }
    );
}

#[test]
fn test_report_serializes_for_display() {
    let root = HealthFeature::from_document(&splunkd_details()).unwrap();
    let report = HealthTreeAnalyzer::default().analyze(&root).unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["health"], "yellow");
    assert_eq!(value["anomalies"][0]["names"], json!(["index_processor", "buckets"]));
}
