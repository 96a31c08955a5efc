//! Probabilistic congestion cost.
//!
//! Each cell's issues are converted into an estimated via count, the via
//! count into an estimated used capacity, and the ratio against the cell's
//! tuned capacity into a log-scaled failure cost. The factors are fitted
//! empirical constants; changing them shifts the solver's trade-off
//! between crossings and vias and must be regressed against the crossing
//! scenarios in the test suite.

use crate::issues::UnravelIssue;
use crate::section::UnravelSection;
use copperweave_mesh::{CapacityMeshNode, NodeId};
use std::cell::RefCell;
use std::collections::HashMap;

/// Estimated vias incurred per same-layer crossing.
pub const SAME_LAYER_CROSSING_VIA_FACTOR: f64 = 0.82;

/// Estimated vias incurred per entry/exit layer change.
pub const ENTRY_EXIT_CHANGE_VIA_FACTOR: f64 = 0.41;

/// Estimated vias incurred per transition via.
pub const TRANSITION_VIA_FACTOR: f64 = 0.2;

/// Exponent applied to the estimated via load.
pub const USED_CAPACITY_EXPONENT: f64 = 1.1;

/// Floor for failure probabilities inside the log mapping.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// Smooth, strictly increasing mapping from a failure probability estimate
/// to a cost contribution. Zero at zero, log-scaled above the epsilon
/// floor.
pub fn log_probability(probability: f64) -> f64 {
    if probability <= 0.0 {
        0.0
    } else {
        (probability.max(PROBABILITY_EPSILON) / PROBABILITY_EPSILON).ln()
    }
}

/// Per-cell issue tallies feeding the via estimate.
#[derive(Debug, Clone, Copy, Default)]
struct IssueTally {
    transition_vias: u32,
    same_layer_crossings: u32,
    entry_exit_changes: u32,
}

/// Deterministic cost evaluation with per-cell capacity memoization.
#[derive(Debug)]
pub struct CostModel {
    min_trace_width: f64,
    capacity_cache: RefCell<HashMap<NodeId, f64>>,
}

impl CostModel {
    /// Creates a cost model for the board's minimum trace width.
    pub fn new(min_trace_width: f64) -> Self {
        Self {
            min_trace_width,
            capacity_cache: RefCell::new(HashMap::new()),
        }
    }

    /// The cell's tuned total capacity: how much via load it can absorb.
    ///
    /// A deterministic function of the cell's width, available layer
    /// count, and the board's minimum trace width, memoized per cell id.
    pub fn tuned_total_capacity(&self, node: &CapacityMeshNode) -> f64 {
        if let Some(&capacity) = self.capacity_cache.borrow().get(&node.id) {
            return capacity;
        }
        let tracks = node.width / (8.0 * self.min_trace_width);
        let capacity = (tracks * node.available_z.len() as f64).max(1e-3);
        self.capacity_cache
            .borrow_mut()
            .insert(node.id.clone(), capacity);
        capacity
    }

    /// The total cost `g` of an issue list: the sum over cells of the
    /// log-scaled failure probability estimate. An empty issue list costs
    /// exactly zero.
    pub fn compute_g(&self, section: &UnravelSection, issues: &[UnravelIssue]) -> f64 {
        let mut tallies: HashMap<&NodeId, IssueTally> = HashMap::new();
        for issue in issues {
            let tally = tallies.entry(issue.node_id()).or_default();
            match issue {
                UnravelIssue::TransitionVia { .. } => tally.transition_vias += 1,
                UnravelIssue::SameLayerCrossing { .. } => tally.same_layer_crossings += 1,
                UnravelIssue::SingleTransitionCrossing { .. } => tally.entry_exit_changes += 1,
                UnravelIssue::DoubleTransitionCrossing { .. } => tally.entry_exit_changes += 2,
                UnravelIssue::SameLayerTraceImbalanceWithLowCapacity { .. } => {}
            }
        }

        // Sum in section node order so the float accumulation is
        // deterministic across runs.
        let mut g = 0.0;
        for node_id in &section.all_node_ids {
            let Some(tally) = tallies.get(node_id) else {
                continue;
            };
            let node = &section.nodes[node_id];
            let estimated_vias = SAME_LAYER_CROSSING_VIA_FACTOR
                * f64::from(tally.same_layer_crossings)
                + ENTRY_EXIT_CHANGE_VIA_FACTOR * f64::from(tally.entry_exit_changes)
                + TRANSITION_VIA_FACTOR * f64::from(tally.transition_vias);
            let estimated_used_capacity = (estimated_vias / 2.0).powf(USED_CAPACITY_EXPONENT);
            let estimated_failure = estimated_used_capacity / self.tuned_total_capacity(node);
            g += log_probability(estimated_failure);
        }
        g
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperweave_core::Point;

    fn node(id: &str, width: f64, layers: usize) -> CapacityMeshNode {
        CapacityMeshNode {
            id: id.to_string(),
            center: Point::new(0.0, 0.0),
            width,
            height: width,
            available_z: (0..layers as u8).collect(),
            depth: 1,
            contains_obstacle: false,
            completely_inside_obstacle: false,
            contains_target: false,
            target_connection_name: None,
        }
    }

    #[test]
    fn test_log_probability_shape() {
        assert_eq!(log_probability(0.0), 0.0);
        assert!(log_probability(0.5) > 0.0);
        assert!(log_probability(1.0) > log_probability(0.5));
        assert!(log_probability(2.0) > log_probability(1.0));
    }

    #[test]
    fn test_capacity_is_deterministic_and_memoized() {
        let model = CostModel::new(0.15);
        let wide = node("cn0", 50.0, 2);
        let narrow = node("cn1", 5.0, 1);

        let first = model.tuned_total_capacity(&wide);
        let second = model.tuned_total_capacity(&wide);
        assert_eq!(first, second);
        assert!(first > model.tuned_total_capacity(&narrow));
    }

    #[test]
    fn test_capacity_scales_with_layers() {
        let model = CostModel::new(0.15);
        let two_layer = node("cn0", 10.0, 2);
        let one_layer = node("cn1", 10.0, 1);
        let ratio =
            model.tuned_total_capacity(&two_layer) / model.tuned_total_capacity(&one_layer);
        assert!((ratio - 2.0).abs() < 1e-12);
    }
}
