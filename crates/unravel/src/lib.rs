//! # Copperweave Unravel
//!
//! Crossing-point untangling for the copperweave PCB autorouting engine.
//!
//! After the cell router assigns one crossing point per connection to each
//! mesh segment, neighboring traces can still cross on the same layer or
//! force avoidable vias. This crate fixes that locally: the
//! [`SectionBuilder`] freezes a neighborhood of the mesh around a root
//! cell, and the [`UnravelSolver`] runs a best-first search over crossing
//! point rearrangements — layer changes and position swaps — under a
//! probabilistic congestion cost.
//!
//! ## Features
//!
//! - Section construction with a mutable core and a frozen context ring
//! - Pure-function issue detection (vias, same-layer crossings)
//! - Deterministic FIFO-with-dedup search; double hashing collapses
//!   states reached through different operation histories
//! - Memoized per-cell capacity cost model
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use copperweave_mesh::{CapacityMesh, SegmentSet};
//! use copperweave_unravel::{SectionBuilder, UnravelConfig, UnravelSolver};
//!
//! # fn demo(mesh: &CapacityMesh, segments: &SegmentSet) -> copperweave_core::Result<()> {
//! let section = SectionBuilder::new("cn0", mesh, segments)
//!     .with_mutable_hops(1)
//!     .build()?;
//!
//! let mut solver = UnravelSolver::new(section, UnravelConfig::new());
//! solver.solve();
//!
//! let result = solver.best_candidate();
//! println!("{} issues left, cost {:.3}", result.issues.len(), result.f);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod candidate;
pub mod cost;
pub mod issues;
pub mod operations;
pub mod point;
pub mod section;
pub mod solver;

// Re-exports
pub use candidate::{
    candidate_full_hash, candidate_hash, PointModification, PointModifications, UnravelCandidate,
};
pub use cost::{log_probability, CostModel};
pub use issues::{find_issues, UnravelIssue};
pub use operations::{apply_operation, operations_for_issue, UnravelOperation};
pub use point::{ResolvedPoint, SegmentPoint, SegmentPointId};
pub use section::{SectionBuilder, UnravelSection, DEFAULT_MUTABLE_HOPS};
pub use solver::{UnravelConfig, UnravelSolver};
