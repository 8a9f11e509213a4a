//! Proptest strategies for health trees and task observations

use proptest::prelude::*;

use taskwatch_core::state_machine::TaskObservation;
use taskwatch_core::{HealthFeature, HealthStatus, TaskState};

pub fn health_status_strategy() -> impl Strategy<Value = HealthStatus> {
    prop_oneof![
        Just(HealthStatus::Green),
        Just(HealthStatus::Yellow),
        Just(HealthStatus::Red),
        Just(HealthStatus::Info),
    ]
}

/// Random trees up to five levels deep with unique feature names
pub fn health_tree_strategy() -> impl Strategy<Value = HealthFeature> {
    let leaf = (health_status_strategy(), any::<bool>()).prop_map(|(health, empty_list)| {
        let feature = HealthFeature::new("leaf", health);
        if empty_list {
            feature.with_features(vec![])
        } else {
            feature
        }
    });

    leaf.prop_recursive(4, 48, 4, |inner| {
        (health_status_strategy(), prop::collection::vec(inner, 0..4))
            .prop_map(|(health, children)| HealthFeature::new("node", health).with_features(children))
    })
    .prop_map(|mut tree| {
        let mut counter = 0;
        assign_unique_names(&mut tree, &mut counter);
        tree
    })
}

fn assign_unique_names(feature: &mut HealthFeature, counter: &mut usize) {
    feature.name = format!("feature_{counter}");
    *counter += 1;
    if let Some(children) = feature.features.as_mut() {
        for child in children {
            assign_unique_names(child, counter);
        }
    }
}

pub fn count_nodes(feature: &HealthFeature) -> usize {
    1 + feature.children().iter().map(count_nodes).sum::<usize>()
}

/// Copy of the tree with every sibling list reversed
pub fn reverse_siblings(feature: &HealthFeature) -> HealthFeature {
    let mut mirrored = feature.clone();
    if let Some(children) = feature.features.as_ref() {
        mirrored.features = Some(children.iter().rev().map(reverse_siblings).collect());
    }
    mirrored
}

/// Non-green leaves whose ancestors below the root are all non-green
pub fn reachable_unhealthy_leaves(features: &[HealthFeature]) -> usize {
    features
        .iter()
        .filter(|feature| !feature.health.is_healthy())
        .map(|feature| {
            if feature.has_children() {
                reachable_unhealthy_leaves(feature.children())
            } else {
                1
            }
        })
        .sum()
}

pub fn task_state_strategy() -> impl Strategy<Value = TaskState> {
    prop_oneof![
        Just(TaskState::New),
        Just(TaskState::Running),
        Just(TaskState::Completed),
        Just(TaskState::Failed),
    ]
}

pub fn observation_strategy() -> impl Strategy<Value = TaskObservation> {
    prop_oneof![
        4 => task_state_strategy().prop_map(TaskObservation::Reported),
        1 => "[a-z ]{1,20}".prop_map(TaskObservation::FetchFailed),
        1 => "[a-z ]{1,20}".prop_map(TaskObservation::Malformed),
    ]
}
