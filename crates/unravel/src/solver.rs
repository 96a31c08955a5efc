//! The unravel solver.
//!
//! A best-first search over modification overlays: pop a candidate, keep
//! the cheapest seen so far, expand one neighbor per applicable operation
//! of each issue, and dedup neighbors by both the overlay hash and the
//! resolved-state hash. The reference queue discipline is a FIFO list
//! (pop head, push tail), which with the visited filter gives a
//! breadth-first-with-dedup expansion whose order is fully deterministic.

use crate::candidate::{
    candidate_full_hash, candidate_hash, PointModifications, UnravelCandidate,
};
use crate::cost::CostModel;
use crate::issues::find_issues;
use crate::operations::{apply_operation, operations_for_issue};
use crate::point::{ResolvedPoint, SegmentPointId};
use crate::section::UnravelSection;
use copperweave_core::{
    ConnectionColorMap, GraphicsObject, ProgressCallback, ProgressInfo, StepSolver, VisCircle,
    Visualize,
};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Configuration for the unravel search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnravelConfig {
    /// Maximum candidate expansions before the search gives up.
    pub max_iterations: u64,
    /// The board's minimum trace width, feeding the cost model.
    pub min_trace_width: f64,
}

impl Default for UnravelConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            min_trace_width: 0.15,
        }
    }
}

impl UnravelConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the expansion budget.
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the minimum trace width.
    pub fn with_min_trace_width(mut self, min_trace_width: f64) -> Self {
        self.min_trace_width = min_trace_width;
        self
    }
}

/// Best-first search rearranging crossing points inside a section.
///
/// The solver owns the section; candidates hold only their modification
/// overlays and issue lists. The best candidate at termination is the
/// solver's output — running out of queue before reaching zero issues is
/// stagnation, not an error.
pub struct UnravelSolver {
    section: UnravelSection,
    config: UnravelConfig,
    cost: CostModel,
    queue: VecDeque<UnravelCandidate>,
    visited_hashes: HashSet<u64>,
    original: UnravelCandidate,
    best: UnravelCandidate,
    last_processed: Option<UnravelCandidate>,
    steps: u64,
    solved: bool,
    cancelled: Arc<AtomicBool>,
}

impl UnravelSolver {
    /// Creates a solver over the given section.
    pub fn new(section: UnravelSection, config: UnravelConfig) -> Self {
        let cost = CostModel::new(config.min_trace_width);
        let original = make_candidate(&section, &cost, PointModifications::new(), 0);

        let mut visited_hashes = HashSet::new();
        visited_hashes.insert(original.candidate_hash);
        visited_hashes.insert(original.candidate_full_hash);

        let mut queue = VecDeque::new();
        queue.push_back(original.clone());

        Self {
            best: original.clone(),
            original,
            section,
            config,
            cost,
            queue,
            visited_hashes,
            last_processed: None,
            steps: 0,
            solved: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The section the solver searches over.
    pub fn section(&self) -> &UnravelSection {
        &self.section
    }

    /// The cheapest candidate found so far; the solver's output.
    pub fn best_candidate(&self) -> &UnravelCandidate {
        &self.best
    }

    /// The unmodified starting candidate.
    pub fn original_candidate(&self) -> &UnravelCandidate {
        &self.original
    }

    /// The candidate most recently expanded, for inspection between steps.
    pub fn last_processed_candidate(&self) -> Option<&UnravelCandidate> {
        self.last_processed.as_ref()
    }

    /// The best candidate's modification overlay, to be applied to the
    /// original crossing-point assignments by the caller.
    pub fn best_modifications(&self) -> &PointModifications {
        &self.best.point_modifications
    }

    /// Every section point with the best candidate's modifications
    /// applied, in dense id order.
    pub fn resolved_points(&self) -> Vec<(SegmentPointId, ResolvedPoint)> {
        self.section
            .segment_point_ids
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    self.section
                        .resolved_point(id, &self.best.point_modifications),
                )
            })
            .collect()
    }

    /// Requests cancellation; [`solve`](Self::solve) stops at the next
    /// step boundary.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Drives the search until solved, failed, or cancelled.
    pub fn solve(&mut self) {
        while !self.solved() && !self.failed() {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            self.step();
        }
    }

    /// Drives the search, reporting progress between steps.
    pub fn solve_with_progress(&mut self, callback: ProgressCallback) {
        let start = Instant::now();
        while !self.solved() && !self.failed() {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            self.step();
            callback(
                ProgressInfo::new("unravel")
                    .with_iteration(self.steps)
                    .with_queue_len(self.queue.len())
                    .with_best_cost(self.best.f)
                    .with_elapsed(start.elapsed().as_millis() as u64),
            );
        }
        callback(
            ProgressInfo::new("unravel")
                .with_iteration(self.steps)
                .with_queue_len(self.queue.len())
                .with_best_cost(self.best.f)
                .with_elapsed(start.elapsed().as_millis() as u64)
                .finished(),
        );
    }
}

/// Builds a candidate from an overlay: detect issues, score, hash.
fn make_candidate(
    section: &UnravelSection,
    cost: &CostModel,
    modifications: PointModifications,
    operations_performed: u64,
) -> UnravelCandidate {
    let issues = find_issues(section, &modifications);
    let g = cost.compute_g(section, &issues);
    let hash = candidate_hash(&modifications);
    let full_hash = candidate_full_hash(section, &modifications);
    UnravelCandidate {
        point_modifications: modifications,
        issues,
        g,
        h: 0.0,
        f: g,
        operations_performed,
        candidate_hash: hash,
        candidate_full_hash: full_hash,
    }
}

impl StepSolver for UnravelSolver {
    fn step(&mut self) {
        if self.solved || self.failed() {
            return;
        }
        let Some(candidate) = self.queue.pop_front() else {
            self.solved = true;
            return;
        };
        self.steps += 1;

        if candidate.f < self.best.f {
            self.best = candidate.clone();
        }
        if candidate.issues.is_empty() {
            self.solved = true;
            self.last_processed = Some(candidate);
            return;
        }

        for issue in &candidate.issues {
            for operation in
                operations_for_issue(&self.section, &candidate.point_modifications, issue)
            {
                let modifications =
                    apply_operation(&self.section, &candidate.point_modifications, &operation);
                let hash = candidate_hash(&modifications);
                let full_hash = candidate_full_hash(&self.section, &modifications);
                if self.visited_hashes.contains(&hash)
                    || self.visited_hashes.contains(&full_hash)
                {
                    continue;
                }
                self.visited_hashes.insert(hash);
                self.visited_hashes.insert(full_hash);
                self.queue.push_back(make_candidate(
                    &self.section,
                    &self.cost,
                    modifications,
                    candidate.operations_performed + 1,
                ));
            }
        }

        self.last_processed = Some(candidate);
    }

    fn solved(&self) -> bool {
        self.solved
    }

    fn failed(&self) -> bool {
        !self.solved && self.steps >= self.config.max_iterations
    }

    fn iterations(&self) -> u64 {
        self.steps
    }
}

impl Visualize for UnravelSolver {
    fn visualize(&self) -> GraphicsObject {
        let colors = ConnectionColorMap::new();
        let mut graphics = self.section.visualize_with_colors(&colors);
        graphics.title = Some(format!(
            "unravel @ {} (f = {:.3}, {} issues)",
            self.section.root_node_id,
            self.best.f,
            self.best.issues.len()
        ));
        for (id, modification) in &self.best.point_modifications {
            let resolved = self
                .section
                .resolved_point(id, &self.best.point_modifications);
            let changed_layer = modification.z.is_some();
            graphics.circles.push(VisCircle {
                center: resolved.position(),
                radius: 0.5,
                fill: Some(if changed_layer { "purple" } else { "gray" }.to_string()),
                label: Some(format!("{} z{}", id, resolved.z)),
            });
        }
        graphics
    }
}
