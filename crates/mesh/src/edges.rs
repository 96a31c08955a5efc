//! Mesh adjacency.
//!
//! Two retained cells are adjacent when they share an axis-aligned border
//! segment of positive length and can route on at least one common layer.
//! The broad phase reuses the R*-tree so adjacency stays near-linear in the
//! cell count.

use crate::mesh::CapacityMesh;
use crate::node::NodeId;
use copperweave_core::{Point, Rect};
use rstar::{RTree, RTreeObject, AABB};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const BORDER_EPSILON: f64 = 1e-9;

/// An undirected adjacency between two mesh cells.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshEdge {
    pub node_ids: [NodeId; 2],
}

/// A cell outline prepared for the adjacency broad phase.
#[derive(Debug, Clone)]
struct IndexedCell {
    aabb: [f64; 4],
    index: usize,
}

impl RTreeObject for IndexedCell {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.aabb[0], self.aabb[1]], [self.aabb[2], self.aabb[3]])
    }
}

/// The border span two touching rectangles share, if it has positive length.
pub(crate) fn shared_border(a: &Rect, b: &Rect) -> Option<(Point, Point)> {
    let y_overlap = a.max_y().min(b.max_y()) - a.min_y().max(b.min_y());
    if y_overlap > BORDER_EPSILON {
        let x = if (a.max_x() - b.min_x()).abs() < BORDER_EPSILON {
            Some(a.max_x())
        } else if (b.max_x() - a.min_x()).abs() < BORDER_EPSILON {
            Some(a.min_x())
        } else {
            None
        };
        if let Some(x) = x {
            let y0 = a.min_y().max(b.min_y());
            let y1 = a.max_y().min(b.max_y());
            return Some((Point::new(x, y0), Point::new(x, y1)));
        }
    }

    let x_overlap = a.max_x().min(b.max_x()) - a.min_x().max(b.min_x());
    if x_overlap > BORDER_EPSILON {
        let y = if (a.max_y() - b.min_y()).abs() < BORDER_EPSILON {
            Some(a.max_y())
        } else if (b.max_y() - a.min_y()).abs() < BORDER_EPSILON {
            Some(a.min_y())
        } else {
            None
        };
        if let Some(y) = y {
            let x0 = a.min_x().max(b.min_x());
            let x1 = a.max_x().min(b.max_x());
            return Some((Point::new(x0, y), Point::new(x1, y)));
        }
    }

    None
}

fn layers_intersect(a: &[u8], b: &[u8]) -> bool {
    a.iter().any(|z| b.contains(z))
}

/// Builds the adjacency relation over a finished mesh.
///
/// Output order is deterministic: edges appear in order of their first
/// node's position in the mesh, each pair emitted once.
pub fn build_edges(mesh: &CapacityMesh) -> Vec<MeshEdge> {
    let nodes = mesh.nodes();
    let entries: Vec<IndexedCell> = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let rect = node.rect();
            IndexedCell {
                aabb: [rect.min_x(), rect.min_y(), rect.max_x(), rect.max_y()],
                index,
            }
        })
        .collect();
    let tree = RTree::bulk_load(entries);

    let mut edges = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        let rect = node.rect();
        let envelope = AABB::from_corners(
            [
                rect.min_x() - BORDER_EPSILON,
                rect.min_y() - BORDER_EPSILON,
            ],
            [
                rect.max_x() + BORDER_EPSILON,
                rect.max_y() + BORDER_EPSILON,
            ],
        );
        let mut neighbors: Vec<usize> = tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.index)
            .filter(|&j| j > i)
            .collect();
        neighbors.sort_unstable();

        for j in neighbors {
            let other = &nodes[j];
            if !layers_intersect(&node.available_z, &other.available_z) {
                continue;
            }
            if shared_border(&rect, &other.rect()).is_some() {
                edges.push(MeshEdge {
                    node_ids: [node.id.clone(), other.id.clone()],
                });
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::CapacityMeshNode;

    fn cell(id: &str, cx: f64, cy: f64, size: f64, z: Vec<u8>) -> CapacityMeshNode {
        CapacityMeshNode {
            id: id.to_string(),
            center: Point::new(cx, cy),
            width: size,
            height: size,
            available_z: z,
            depth: 1,
            contains_obstacle: false,
            completely_inside_obstacle: false,
            contains_target: false,
            target_connection_name: None,
        }
    }

    #[test]
    fn test_shared_border_vertical() {
        let a = Rect::new(Point::new(0.0, 0.0), 10.0, 10.0);
        let b = Rect::new(Point::new(10.0, 0.0), 10.0, 10.0);
        let (p0, p1) = shared_border(&a, &b).unwrap();
        assert_eq!(p0, Point::new(5.0, -5.0));
        assert_eq!(p1, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_corner_touch_is_not_shared() {
        let a = Rect::new(Point::new(0.0, 0.0), 10.0, 10.0);
        let b = Rect::new(Point::new(10.0, 10.0), 10.0, 10.0);
        assert!(shared_border(&a, &b).is_none());
    }

    #[test]
    fn test_different_sizes_share_partial_border() {
        let a = Rect::new(Point::new(0.0, 0.0), 10.0, 10.0);
        let b = Rect::new(Point::new(7.5, 2.5), 5.0, 5.0);
        let (p0, p1) = shared_border(&a, &b).unwrap();
        assert_eq!(p0, Point::new(5.0, 0.0));
        assert_eq!(p1, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_edges_require_layer_overlap() {
        let mesh = CapacityMesh::new(vec![
            cell("cn0", 5.0, 5.0, 10.0, vec![0]),
            cell("cn1", 15.0, 5.0, 10.0, vec![1]),
            cell("cn2", 5.0, 15.0, 10.0, vec![0, 1]),
        ]);
        let edges = build_edges(&mesh);
        // cn0-cn1 touch but have disjoint layers; cn0-cn2 share a border and layer 0
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].node_ids, ["cn0".to_string(), "cn2".to_string()]);
    }

    #[test]
    fn test_edges_deterministic() {
        let mesh = CapacityMesh::new(vec![
            cell("cn0", 5.0, 5.0, 10.0, vec![0, 1]),
            cell("cn1", 15.0, 5.0, 10.0, vec![0, 1]),
            cell("cn2", 5.0, 15.0, 10.0, vec![0, 1]),
            cell("cn3", 15.0, 15.0, 10.0, vec![0, 1]),
        ]);
        let a = build_edges(&mesh);
        let b = build_edges(&mesh);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4, "a 2x2 grid has 4 shared borders");
    }
}
