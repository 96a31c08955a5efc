//! Issue detection.
//!
//! An issue is any local configuration inside one cell that raises its
//! congestion cost: a forced via, or two traces crossing on the same layer.
//! Detection is a pure function of the section and a modification overlay,
//! so identical inputs always yield identical issue lists.

use crate::candidate::PointModifications;
use crate::point::SegmentPointId;
use crate::section::UnravelSection;
use copperweave_core::segments_cross;
use copperweave_mesh::NodeId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A cost-raising configuration attached to a specific cell.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum UnravelIssue {
    /// Two connected points of the same net enter and exit the cell on
    /// different layers, forcing a via.
    TransitionVia {
        node_id: NodeId,
        segment_point_ids: [SegmentPointId; 2],
    },
    /// Two net spans on the same layer geometrically intersect inside the
    /// cell.
    SameLayerCrossing {
        node_id: NodeId,
        crossing_line1: [SegmentPointId; 2],
        crossing_line2: [SegmentPointId; 2],
    },
    /// A crossing where one of the spans changes layer inside the cell.
    /// Recognized by the cost model; not emitted by [`find_issues`].
    SingleTransitionCrossing {
        node_id: NodeId,
        crossing_line1: [SegmentPointId; 2],
        crossing_line2: [SegmentPointId; 2],
    },
    /// A crossing where both spans change layer inside the cell.
    /// Recognized by the cost model; not emitted by [`find_issues`].
    DoubleTransitionCrossing {
        node_id: NodeId,
        crossing_line1: [SegmentPointId; 2],
        crossing_line2: [SegmentPointId; 2],
    },
    /// More traces on one layer than the cell can carry.
    /// Reserved for an auxiliary detector.
    SameLayerTraceImbalanceWithLowCapacity { node_id: NodeId },
}

impl UnravelIssue {
    /// The cell the issue is attached to.
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::TransitionVia { node_id, .. }
            | Self::SameLayerCrossing { node_id, .. }
            | Self::SingleTransitionCrossing { node_id, .. }
            | Self::DoubleTransitionCrossing { node_id, .. }
            | Self::SameLayerTraceImbalanceWithLowCapacity { node_id } => node_id,
        }
    }
}

/// Detects all issues in the section under a modification overlay.
///
/// For every cell, the connected pairs are evaluated with modifications
/// applied: pairs whose endpoints resolve to different layers become
/// [`UnravelIssue::TransitionVia`], and pairs of same-layer spans that
/// strictly cross become [`UnravelIssue::SameLayerCrossing`]. Spans that
/// merely meet at a shared crossing point do not count.
pub fn find_issues(
    section: &UnravelSection,
    modifications: &PointModifications,
) -> Vec<UnravelIssue> {
    let mut issues = Vec::new();

    for node_id in &section.all_node_ids {
        let pairs = section.pairs_in_node(node_id);

        // Spans that stay on one layer, kept for the crossing scan below.
        let mut level_spans = Vec::new();
        for pair in pairs {
            let a = section.resolved_point(&pair.0, modifications);
            let b = section.resolved_point(&pair.1, modifications);
            if a.z != b.z {
                issues.push(UnravelIssue::TransitionVia {
                    node_id: node_id.clone(),
                    segment_point_ids: [pair.0.clone(), pair.1.clone()],
                });
            } else {
                level_spans.push((pair, a, b));
            }
        }

        for i in 0..level_spans.len() {
            for j in (i + 1)..level_spans.len() {
                let (pair1, a1, b1) = &level_spans[i];
                let (pair2, a2, b2) = &level_spans[j];
                if a1.z == a2.z
                    && segments_cross(
                        a1.position(),
                        b1.position(),
                        a2.position(),
                        b2.position(),
                    )
                {
                    issues.push(UnravelIssue::SameLayerCrossing {
                        node_id: node_id.clone(),
                        crossing_line1: [pair1.0.clone(), pair1.1.clone()],
                        crossing_line2: [pair2.0.clone(), pair2.1.clone()],
                    });
                }
            }
        }
    }

    issues
}
