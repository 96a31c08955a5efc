//! Operations: the local edits proposed in response to an issue.
//!
//! Operations only ever target points on mutable segments; the issue →
//! operation mapping filters everything else out, which is what keeps the
//! search inside the section's editable region.

use crate::candidate::PointModifications;
use crate::issues::UnravelIssue;
use crate::point::SegmentPointId;
use crate::section::UnravelSection;
use copperweave_core::opposite_z;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A local edit applied on top of a candidate's modifications.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnravelOperation {
    /// Moves the listed points to `new_z`.
    ChangeLayer {
        new_z: u8,
        point_ids: Vec<SegmentPointId>,
    },
    /// Exchanges the `(x, y)` positions of two points on the same segment;
    /// layers are unchanged.
    SwapPositionOnSegment { point_ids: [SegmentPointId; 2] },
}

/// Enumerates the operations that could resolve an issue, restricted to
/// mutable segments.
///
/// - A transition via offers one layer change per mutable endpoint,
///   toward the other endpoint's layer.
/// - A same-layer crossing offers position swaps for every pair of points
///   sharing a segment across the two spans, whole-span layer flips, and
///   individual point flips.
/// - The reserved issue kinds offer nothing.
pub fn operations_for_issue(
    section: &UnravelSection,
    modifications: &PointModifications,
    issue: &UnravelIssue,
) -> Vec<UnravelOperation> {
    let mutable = |id: &SegmentPointId| section.is_segment_mutable(&section.point(id).segment_id);

    match issue {
        UnravelIssue::TransitionVia {
            segment_point_ids: [a, b],
            ..
        } => {
            let mut operations = Vec::new();
            let z_a = section.resolved_point(a, modifications).z;
            let z_b = section.resolved_point(b, modifications).z;
            if mutable(a) {
                operations.push(UnravelOperation::ChangeLayer {
                    new_z: z_b,
                    point_ids: vec![a.clone()],
                });
            }
            if mutable(b) {
                operations.push(UnravelOperation::ChangeLayer {
                    new_z: z_a,
                    point_ids: vec![b.clone()],
                });
            }
            operations
        }
        UnravelIssue::SameLayerCrossing {
            crossing_line1: [a, b],
            crossing_line2: [c, d],
            ..
        } => {
            let mut operations = Vec::new();

            // Untangle by swapping positions where the two spans meet the
            // same segment.
            for (x, y) in [(a, c), (a, d), (b, c), (b, d)] {
                if section.point(x).segment_id == section.point(y).segment_id && mutable(x) {
                    operations.push(UnravelOperation::SwapPositionOnSegment {
                        point_ids: [x.clone(), y.clone()],
                    });
                }
            }

            // Whole-span flips
            let z1 = section.resolved_point(a, modifications).z;
            if mutable(a) && mutable(b) {
                operations.push(UnravelOperation::ChangeLayer {
                    new_z: opposite_z(z1),
                    point_ids: vec![a.clone(), b.clone()],
                });
            }
            let z2 = section.resolved_point(c, modifications).z;
            if mutable(c) && mutable(d) {
                operations.push(UnravelOperation::ChangeLayer {
                    new_z: opposite_z(z2),
                    point_ids: vec![c.clone(), d.clone()],
                });
            }

            // Individual flips
            for point_id in [a, b, c, d] {
                if mutable(point_id) {
                    let z = section.resolved_point(point_id, modifications).z;
                    operations.push(UnravelOperation::ChangeLayer {
                        new_z: opposite_z(z),
                        point_ids: vec![point_id.clone()],
                    });
                }
            }

            operations
        }
        UnravelIssue::SingleTransitionCrossing { .. }
        | UnravelIssue::DoubleTransitionCrossing { .. }
        | UnravelIssue::SameLayerTraceImbalanceWithLowCapacity { .. } => Vec::new(),
    }
}

/// Applies an operation on top of a modification overlay, producing the
/// neighbor's overlay. The input is never mutated.
pub fn apply_operation(
    section: &UnravelSection,
    base: &PointModifications,
    operation: &UnravelOperation,
) -> PointModifications {
    let mut next = base.clone();
    match operation {
        UnravelOperation::ChangeLayer { new_z, point_ids } => {
            for id in point_ids {
                next.entry(id.clone()).or_default().z = Some(*new_z);
            }
        }
        UnravelOperation::SwapPositionOnSegment { point_ids: [x, y] } => {
            let resolved_x = section.resolved_point(x, base);
            let resolved_y = section.resolved_point(y, base);
            {
                let modification = next.entry(x.clone()).or_default();
                modification.x = Some(resolved_y.x);
                modification.y = Some(resolved_y.y);
            }
            {
                let modification = next.entry(y.clone()).or_default();
                modification.x = Some(resolved_x.x);
                modification.y = Some(resolved_x.y);
            }
        }
    }
    next
}
