//! Capacity mesh nodes.

use copperweave_core::{Point, Rect};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a capacity mesh node (`"cn{n}"`, stable within a mesh).
pub type NodeId = String;

/// A cell of the capacity mesh: an axis-aligned rectangle at a specific
/// subdivision depth, annotated with its available layers and
/// obstacle/target flags.
///
/// Nodes are created by the mesh builder and immutable thereafter; the
/// solvers downstream read but never mutate them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CapacityMeshNode {
    pub id: NodeId,
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// The conductor layers routing may use in this cell. Nonempty subset
    /// of {0, 1}; exactly one entry for the leaves of a z-subdivision.
    pub available_z: Vec<u8>,
    /// Subdivision depth from the root (root is 0).
    pub depth: u32,
    /// Any obstacle overlaps this cell.
    pub contains_obstacle: bool,
    /// Some obstacle on one of the cell's available layers fully covers it.
    pub completely_inside_obstacle: bool,
    /// A connection endpoint lies inside this cell.
    pub contains_target: bool,
    /// Name of the contained endpoint's connection, if any.
    pub target_connection_name: Option<String>,
}

impl CapacityMeshNode {
    /// The cell's outline.
    pub fn rect(&self) -> Rect {
        Rect::new(self.center, self.width, self.height)
    }

    /// True if the cell is restricted to a single conductor layer.
    pub fn is_single_layer(&self) -> bool {
        self.available_z.len() == 1
    }

    /// Whether the cell belongs in the routing graph: cells fully buried in
    /// obstacles are dropped unless they carry a target.
    pub fn should_be_in_graph(&self) -> bool {
        !self.completely_inside_obstacle || self.contains_target
    }
}
