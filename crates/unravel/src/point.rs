//! Segment points: one trace crossing on one segment.

use copperweave_core::Point;
use copperweave_mesh::{NodeId, SegmentId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a segment point (`"SP{n}"`, dense within a section).
pub type SegmentPointId = String;

/// One connection's crossing point on a segment, as frozen into a section.
///
/// Points are created once by the section builder and never mutated;
/// candidates override coordinates through their modification overlays.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentPoint {
    pub id: SegmentPointId,
    /// The segment this point crosses.
    pub segment_id: SegmentId,
    /// The two cells sharing that segment.
    pub node_ids: Vec<NodeId>,
    pub x: f64,
    pub y: f64,
    pub z: u8,
    pub connection_name: String,
    /// Points of the same connection on other segments that share at least
    /// one incident cell with this one (topological neighbors along the net).
    pub directly_connected_ids: Vec<SegmentPointId>,
}

impl SegmentPoint {
    /// The point's baseline 2D position.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// True if the two points have an incident cell in common.
    pub fn shares_node_with(&self, other: &SegmentPoint) -> bool {
        self.node_ids.iter().any(|id| other.node_ids.contains(id))
    }
}

/// A segment point's coordinates with a candidate's modifications applied.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedPoint {
    pub x: f64,
    pub y: f64,
    pub z: u8,
}

impl ResolvedPoint {
    /// The resolved 2D position.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, segment: &str, nodes: &[&str]) -> SegmentPoint {
        SegmentPoint {
            id: id.to_string(),
            segment_id: segment.to_string(),
            node_ids: nodes.iter().map(|n| n.to_string()).collect(),
            x: 0.0,
            y: 0.0,
            z: 0,
            connection_name: "net1".to_string(),
            directly_connected_ids: Vec::new(),
        }
    }

    #[test]
    fn test_shares_node_with() {
        let a = point("SP0", "seg0", &["cn0", "cn1"]);
        let b = point("SP1", "seg1", &["cn1", "cn2"]);
        let c = point("SP2", "seg2", &["cn3", "cn4"]);
        assert!(a.shares_node_with(&b));
        assert!(!a.shares_node_with(&c));
    }
}
