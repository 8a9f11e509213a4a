//! # Health Tree Analysis
//!
//! Parses the nested health-status document served by the console and
//! derives the two structures its displays need: a flat index by feature
//! name and the list of anomaly paths.
//!
//! ```rust
//! use taskwatch_core::health::{HealthFeature, HealthStatus, HealthTreeAnalyzer};
//!
//! let features = vec![
//!     HealthFeature::new("cluster", HealthStatus::Red).with_features(vec![
//!         HealthFeature::new("peer1", HealthStatus::Red).with_features(vec![]),
//!         HealthFeature::new("peer2", HealthStatus::Green),
//!     ]),
//! ];
//!
//! let anomalies = HealthTreeAnalyzer::default().find_anomalies(&features).unwrap();
//! assert_eq!(anomalies[0].names, vec!["cluster", "peer1"]);
//! ```

pub mod analyzer;
pub mod anomaly;
pub mod error;
pub mod feature;

pub use analyzer::{is_healthy, FeatureSummary, HealthIndex, HealthReport, HealthTreeAnalyzer};
pub use anomaly::AnomalyPath;
pub use error::{HealthError, HealthResult};
pub use feature::{HealthFeature, HealthStatus};
