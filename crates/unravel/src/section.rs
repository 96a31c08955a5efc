//! Section construction.
//!
//! A section freezes a local neighborhood of the mesh around a chosen root
//! cell: the cells within `mutable_hops` segment-adjacency hops may have
//! their crossing points edited, the ring one hop beyond is included as
//! read-only context, and everything the search needs — the point map, the
//! per-node and per-segment indices, and the connected-pair index — is
//! built once up front. After construction the section is immutable; search
//! candidates are small overlays on top of it.

use crate::candidate::PointModifications;
use crate::point::{ResolvedPoint, SegmentPoint, SegmentPointId};
use copperweave_core::{
    ConnectionColorMap, Error, GraphicsObject, Result, VisLine, VisPoint, VisRect,
    IMMUTABLE_CELL_COLOR, MUTABLE_CELL_COLOR,
};
use copperweave_mesh::{CapacityMesh, CapacityMeshNode, NodeId, SegmentId, SegmentSet};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Default edit radius in segment-adjacency hops.
pub const DEFAULT_MUTABLE_HOPS: u32 = 1;

/// Builds an [`UnravelSection`] from a mesh, its segments, and a root cell.
pub struct SectionBuilder<'a> {
    root_node_id: NodeId,
    mesh: &'a CapacityMesh,
    segments: &'a SegmentSet,
    mutable_hops: u32,
}

impl<'a> SectionBuilder<'a> {
    /// Creates a builder rooted at the given cell.
    pub fn new(root_node_id: impl Into<NodeId>, mesh: &'a CapacityMesh, segments: &'a SegmentSet) -> Self {
        Self {
            root_node_id: root_node_id.into(),
            mesh,
            segments,
            mutable_hops: DEFAULT_MUTABLE_HOPS,
        }
    }

    /// Sets the edit radius in hops.
    pub fn with_mutable_hops(mut self, hops: u32) -> Self {
        self.mutable_hops = hops;
        self
    }

    /// Builds the immutable section.
    pub fn build(self) -> Result<UnravelSection> {
        if self.mesh.node(&self.root_node_id).is_none() {
            return Err(Error::Internal(format!(
                "section root {} is not in the mesh",
                self.root_node_id
            )));
        }

        // BFS through the node/segment bipartite graph. Nodes found within
        // `mutable_hops` are editable; the final ring is frozen context.
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(self.root_node_id.clone());
        let mut all_node_ids = vec![self.root_node_id.clone()];
        let mut mutable_set: HashSet<NodeId> = HashSet::new();
        mutable_set.insert(self.root_node_id.clone());
        let mut frontier = vec![self.root_node_id.clone()];

        for hop in 1..=self.mutable_hops + 1 {
            let mut next = Vec::new();
            for node_id in &frontier {
                for segment_id in self.segments.segment_ids_of_node(node_id) {
                    let Some(node_ids) = self.segments.node_ids_of_segment(segment_id) else {
                        continue;
                    };
                    for neighbor in node_ids {
                        if visited.insert(neighbor.clone()) {
                            next.push(neighbor.clone());
                        }
                    }
                }
            }
            next.sort_unstable();
            for node_id in &next {
                all_node_ids.push(node_id.clone());
                if hop <= self.mutable_hops {
                    mutable_set.insert(node_id.clone());
                }
            }
            frontier = next;
        }

        let mutable_node_ids: Vec<NodeId> = all_node_ids
            .iter()
            .filter(|id| mutable_set.contains(*id))
            .cloned()
            .collect();
        let immutable_node_ids: Vec<NodeId> = all_node_ids
            .iter()
            .filter(|id| !mutable_set.contains(*id))
            .cloned()
            .collect();

        let mut mutable_segment_ids: BTreeSet<SegmentId> = BTreeSet::new();
        for node_id in &mutable_node_ids {
            for segment_id in self.segments.segment_ids_of_node(node_id) {
                mutable_segment_ids.insert(segment_id.clone());
            }
        }

        let mut nodes: HashMap<NodeId, CapacityMeshNode> = HashMap::new();
        for node_id in &all_node_ids {
            let node = self.mesh.node(node_id).ok_or_else(|| {
                Error::Internal(format!("segment references unknown node {node_id}"))
            })?;
            nodes.insert(node_id.clone(), node.clone());
        }

        // Collect the assigned points on every segment incident to the
        // section, assigning dense SP ids in discovery order.
        let all_node_set: HashSet<&NodeId> = all_node_ids.iter().collect();
        let mut section_segment_ids: Vec<SegmentId> = Vec::new();
        let mut seen_segments: HashSet<&SegmentId> = HashSet::new();
        for node_id in &all_node_ids {
            for segment_id in self.segments.segment_ids_of_node(node_id) {
                if seen_segments.insert(segment_id) {
                    section_segment_ids.push(segment_id.clone());
                }
            }
        }

        let mut segment_point_ids: Vec<SegmentPointId> = Vec::new();
        let mut segment_point_map: HashMap<SegmentPointId, SegmentPoint> = HashMap::new();
        let mut segment_points_in_segment: HashMap<SegmentId, Vec<SegmentPointId>> =
            HashMap::new();
        let mut segment_points_in_node: HashMap<NodeId, Vec<SegmentPointId>> = HashMap::new();
        for node_id in &all_node_ids {
            segment_points_in_node.insert(node_id.clone(), Vec::new());
        }

        for segment_id in &section_segment_ids {
            let segment = self.segments.segment(segment_id).ok_or_else(|| {
                Error::Internal(format!("unknown segment {segment_id} in section"))
            })?;
            for assigned in &segment.assigned_points {
                let id = format!("SP{}", segment_point_ids.len());
                let point = SegmentPoint {
                    id: id.clone(),
                    segment_id: segment_id.clone(),
                    node_ids: segment.node_ids.to_vec(),
                    x: assigned.x,
                    y: assigned.y,
                    z: assigned.z,
                    connection_name: assigned.connection_name.clone(),
                    directly_connected_ids: Vec::new(),
                };
                segment_points_in_segment
                    .entry(segment_id.clone())
                    .or_default()
                    .push(id.clone());
                for node_id in &segment.node_ids {
                    if all_node_set.contains(node_id) {
                        segment_points_in_node
                            .get_mut(node_id)
                            .expect("section node index missing")
                            .push(id.clone());
                    }
                }
                segment_point_map.insert(id.clone(), point);
                segment_point_ids.push(id);
            }
        }

        // Directly-connected relation: same net, different segments, at
        // least one shared incident cell. Symmetric by construction.
        for i in 0..segment_point_ids.len() {
            for j in (i + 1)..segment_point_ids.len() {
                let a = &segment_point_map[&segment_point_ids[i]];
                let b = &segment_point_map[&segment_point_ids[j]];
                if a.segment_id != b.segment_id
                    && a.connection_name == b.connection_name
                    && a.shares_node_with(b)
                {
                    let (a_id, b_id) = (a.id.clone(), b.id.clone());
                    segment_point_map
                        .get_mut(&a_id)
                        .expect("point map entry missing")
                        .directly_connected_ids
                        .push(b_id.clone());
                    segment_point_map
                        .get_mut(&b_id)
                        .expect("point map entry missing")
                        .directly_connected_ids
                        .push(a_id);
                }
            }
        }

        // Per-node index of connected pairs, deduplicated by construction
        // (each unordered pair is visited once per node).
        let mut segment_pairs_in_node: HashMap<NodeId, Vec<(SegmentPointId, SegmentPointId)>> =
            HashMap::new();
        for node_id in &all_node_ids {
            let ids = &segment_points_in_node[node_id];
            let mut pairs = Vec::new();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    let a = &segment_point_map[&ids[i]];
                    if a.directly_connected_ids.contains(&ids[j]) {
                        pairs.push((ids[i].clone(), ids[j].clone()));
                    }
                }
            }
            segment_pairs_in_node.insert(node_id.clone(), pairs);
        }

        Ok(UnravelSection {
            root_node_id: self.root_node_id,
            mutable_hops: self.mutable_hops,
            all_node_ids,
            mutable_node_ids,
            immutable_node_ids,
            mutable_segment_ids,
            nodes,
            segment_point_ids,
            segment_point_map,
            segment_points_in_node,
            segment_points_in_segment,
            segment_pairs_in_node,
        })
    }
}

/// A frozen neighborhood of the mesh, shared read-only by every candidate
/// of an unravel search.
#[derive(Debug, Clone)]
pub struct UnravelSection {
    pub root_node_id: NodeId,
    pub mutable_hops: u32,
    /// Root plus cells within `mutable_hops + 1` hops, in BFS order.
    pub all_node_ids: Vec<NodeId>,
    /// Cells within `mutable_hops` hops (root inclusive).
    pub mutable_node_ids: Vec<NodeId>,
    /// `all_node_ids` minus `mutable_node_ids`.
    pub immutable_node_ids: Vec<NodeId>,
    /// Segments incident to any mutable cell; the only segments a
    /// candidate may touch.
    pub mutable_segment_ids: BTreeSet<SegmentId>,
    /// The section's cells by id.
    pub nodes: HashMap<NodeId, CapacityMeshNode>,
    /// Dense point ids in creation order (`SP0..SPk`).
    pub segment_point_ids: Vec<SegmentPointId>,
    pub segment_point_map: HashMap<SegmentPointId, SegmentPoint>,
    pub segment_points_in_node: HashMap<NodeId, Vec<SegmentPointId>>,
    pub segment_points_in_segment: HashMap<SegmentId, Vec<SegmentPointId>>,
    /// Unordered directly-connected pairs with both points in the node.
    pub segment_pairs_in_node: HashMap<NodeId, Vec<(SegmentPointId, SegmentPointId)>>,
}

impl UnravelSection {
    /// Looks up a segment point.
    ///
    /// Panics on an unknown id; section ids are produced by the builder,
    /// so a miss is a programmer error.
    pub fn point(&self, id: &str) -> &SegmentPoint {
        &self.segment_point_map[id]
    }

    /// True if candidates may edit points on the given segment.
    pub fn is_segment_mutable(&self, segment_id: &str) -> bool {
        self.mutable_segment_ids.contains(segment_id)
    }

    /// The connected pairs inside a node.
    pub fn pairs_in_node(&self, node_id: &str) -> &[(SegmentPointId, SegmentPointId)] {
        self.segment_pairs_in_node
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A point's coordinates with a candidate's modifications applied.
    pub fn resolved_point(&self, id: &str, modifications: &PointModifications) -> ResolvedPoint {
        let base = self.point(id);
        let overlay = modifications.get(id);
        ResolvedPoint {
            x: overlay.and_then(|m| m.x).unwrap_or(base.x),
            y: overlay.and_then(|m| m.y).unwrap_or(base.y),
            z: overlay.and_then(|m| m.z).unwrap_or(base.z),
        }
    }

    /// Renders the section: mutable cells green, frozen cells red, points
    /// colored per connection.
    pub fn visualize_with_colors(&self, colors: &ConnectionColorMap) -> GraphicsObject {
        let mut graphics = GraphicsObject::new().with_title(format!(
            "unravel section @ {} ({} hops)",
            self.root_node_id, self.mutable_hops
        ));
        let mutable: HashSet<&NodeId> = self.mutable_node_ids.iter().collect();
        for node_id in &self.all_node_ids {
            let node = &self.nodes[node_id];
            let fill = if mutable.contains(node_id) {
                MUTABLE_CELL_COLOR
            } else {
                IMMUTABLE_CELL_COLOR
            };
            graphics.rects.push(VisRect {
                center: node.center,
                width: node.width,
                height: node.height,
                fill: Some(fill.to_string()),
                label: Some(node_id.clone()),
            });
        }
        for id in &self.segment_point_ids {
            let point = &self.segment_point_map[id];
            graphics.points.push(VisPoint {
                x: point.x,
                y: point.y,
                color: Some(colors.color_of(&point.connection_name).to_string()),
                label: Some(format!("{} z{}", point.id, point.z)),
            });
        }
        for node_id in &self.all_node_ids {
            for (a_id, b_id) in self.pairs_in_node(node_id) {
                let a = self.point(a_id);
                let b = self.point(b_id);
                graphics.lines.push(VisLine {
                    points: vec![a.position(), b.position()],
                    stroke_color: Some(colors.color_of(&a.connection_name).to_string()),
                    label: None,
                });
            }
        }
        graphics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperweave_core::Point;
    use copperweave_mesh::{AssignedPoint, CapacityMeshNode, NodePortSegment};

    fn cell(id: &str, cx: f64) -> CapacityMeshNode {
        CapacityMeshNode {
            id: id.to_string(),
            center: Point::new(cx, 0.0),
            width: 10.0,
            height: 10.0,
            available_z: vec![0, 1],
            depth: 1,
            contains_obstacle: false,
            completely_inside_obstacle: false,
            contains_target: false,
            target_connection_name: None,
        }
    }

    fn segment(id: &str, a: &str, b: &str, x: f64, points: Vec<AssignedPoint>) -> NodePortSegment {
        NodePortSegment {
            id: id.to_string(),
            node_ids: [a.to_string(), b.to_string()],
            start: Point::new(x, -5.0),
            end: Point::new(x, 5.0),
            assigned_points: points,
        }
    }

    fn assigned(name: &str, x: f64, y: f64, z: u8) -> AssignedPoint {
        AssignedPoint {
            connection_name: name.to_string(),
            x,
            y,
            z,
        }
    }

    /// A 1x4 strip of cells: cn0 - cn1 - cn2 - cn3, one net crossing all
    /// three borders.
    fn strip() -> (CapacityMesh, SegmentSet) {
        let mesh = CapacityMesh::new(vec![
            cell("cn0", 0.0),
            cell("cn1", 10.0),
            cell("cn2", 20.0),
            cell("cn3", 30.0),
        ]);
        let segments = SegmentSet::from_segments(vec![
            segment("seg0", "cn0", "cn1", 5.0, vec![assigned("net1", 5.0, 0.0, 0)]),
            segment("seg1", "cn1", "cn2", 15.0, vec![assigned("net1", 15.0, 0.0, 0)]),
            segment("seg2", "cn2", "cn3", 25.0, vec![assigned("net1", 25.0, 0.0, 0)]),
        ]);
        (mesh, segments)
    }

    #[test]
    fn test_bfs_partition() {
        let (mesh, segments) = strip();
        let section = SectionBuilder::new("cn0", &mesh, &segments)
            .with_mutable_hops(1)
            .build()
            .unwrap();

        assert_eq!(section.mutable_node_ids, vec!["cn0", "cn1"]);
        assert_eq!(section.immutable_node_ids, vec!["cn2"]);
        assert_eq!(section.all_node_ids, vec!["cn0", "cn1", "cn2"]);
        // Segments incident to mutable cells only
        assert!(section.is_segment_mutable("seg0"));
        assert!(section.is_segment_mutable("seg1"));
        assert!(!section.is_segment_mutable("seg2"));
    }

    #[test]
    fn test_dense_point_ids_and_indices() {
        let (mesh, segments) = strip();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        assert_eq!(section.segment_point_ids.len(), 3);
        assert_eq!(section.segment_point_ids[0], "SP0");
        assert_eq!(section.segment_point_ids[2], "SP2");

        // Every point is indexed under both its incident section nodes
        for id in &section.segment_point_ids {
            let point = section.point(id);
            for node_id in &point.node_ids {
                if section.nodes.contains_key(node_id) {
                    assert!(section.segment_points_in_node[node_id].contains(id));
                }
            }
        }
    }

    #[test]
    fn test_directly_connected_is_symmetric() {
        let (mesh, segments) = strip();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        for id in &section.segment_point_ids {
            let point = section.point(id);
            for other_id in &point.directly_connected_ids {
                let other = section.point(other_id);
                assert!(
                    other.directly_connected_ids.contains(id),
                    "{} -> {} is not symmetric",
                    id,
                    other_id
                );
                assert_eq!(other.connection_name, point.connection_name);
                assert_ne!(other.segment_id, point.segment_id);
            }
        }
    }

    #[test]
    fn test_pairs_in_node() {
        let (mesh, segments) = strip();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        // cn1 holds the pair (seg0 point, seg1 point)
        assert_eq!(section.pairs_in_node("cn1").len(), 1);
        // cn0 holds only the seg0 point, no pair
        assert!(section.pairs_in_node("cn0").is_empty());
    }

    #[test]
    fn test_unknown_root_rejected() {
        let (mesh, segments) = strip();
        let result = SectionBuilder::new("cn42", &mesh, &segments).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_resolved_point_applies_overlay() {
        let (mesh, segments) = strip();
        let section = SectionBuilder::new("cn1", &mesh, &segments).build().unwrap();

        let mut mods = PointModifications::new();
        let base = section.resolved_point("SP0", &mods);
        assert_eq!(base.z, 0);

        mods.insert(
            "SP0".to_string(),
            crate::candidate::PointModification {
                x: None,
                y: Some(2.5),
                z: Some(1),
            },
        );
        let resolved = section.resolved_point("SP0", &mods);
        assert_eq!(resolved.x, base.x);
        assert_eq!(resolved.y, 2.5);
        assert_eq!(resolved.z, 1);
    }
}
