//! Trace crossing segments.
//!
//! Every adjacency in the mesh carries one deduplicated segment: the border
//! span the two cells share, where the cell router assigns one crossing
//! point per connection. The segment set also exposes the bipartite
//! node ↔ segment maps the section builder walks.

use crate::edges::{shared_border, MeshEdge};
use crate::mesh::CapacityMesh;
use crate::node::NodeId;
use copperweave_core::{
    ConnectionColorMap, Error, GraphicsObject, Point, Result, VisLine, VisPoint,
};
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifier of a crossing segment (`"seg{n}"`, stable within a set).
pub type SegmentId = String;

/// A crossing point assigned to a segment: where one connection's trace
/// crosses the cell border, and on which layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AssignedPoint {
    pub connection_name: String,
    pub x: f64,
    pub y: f64,
    pub z: u8,
}

/// The shared border between two adjacent cells, with the crossing points
/// assigned to it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodePortSegment {
    pub id: SegmentId,
    /// The two cells sharing this border.
    pub node_ids: [NodeId; 2],
    pub start: Point,
    pub end: Point,
    pub assigned_points: Vec<AssignedPoint>,
}

/// The deduplicated segment list plus the bipartite node ↔ segment maps.
#[derive(Debug, Clone, Default)]
pub struct SegmentSet {
    segments: Vec<NodePortSegment>,
    index: HashMap<SegmentId, usize>,
    node_to_segments: HashMap<NodeId, Vec<SegmentId>>,
}

impl SegmentSet {
    /// Builds one segment per mesh edge, geometry taken from the shared
    /// border span.
    pub fn build(mesh: &CapacityMesh, edges: &[MeshEdge]) -> Result<Self> {
        let mut segments = Vec::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            let [a_id, b_id] = &edge.node_ids;
            let a = mesh
                .node(a_id)
                .ok_or_else(|| Error::Internal(format!("edge references unknown node {a_id}")))?;
            let b = mesh
                .node(b_id)
                .ok_or_else(|| Error::Internal(format!("edge references unknown node {b_id}")))?;
            let (start, end) = shared_border(&a.rect(), &b.rect()).ok_or_else(|| {
                Error::Internal(format!("nodes {a_id} and {b_id} share no border"))
            })?;
            segments.push(NodePortSegment {
                id: format!("seg{i}"),
                node_ids: edge.node_ids.clone(),
                start,
                end,
                assigned_points: Vec::new(),
            });
        }
        Ok(Self::from_segments(segments))
    }

    /// Wraps an existing segment list, rebuilding the lookup maps.
    pub fn from_segments(segments: Vec<NodePortSegment>) -> Self {
        let mut index = HashMap::with_capacity(segments.len());
        let mut node_to_segments: HashMap<NodeId, Vec<SegmentId>> = HashMap::new();
        for (i, segment) in segments.iter().enumerate() {
            index.insert(segment.id.clone(), i);
            for node_id in &segment.node_ids {
                node_to_segments
                    .entry(node_id.clone())
                    .or_default()
                    .push(segment.id.clone());
            }
        }
        Self {
            segments,
            index,
            node_to_segments,
        }
    }

    /// All segments, in id order.
    pub fn segments(&self) -> &[NodePortSegment] {
        &self.segments
    }

    /// Looks up a segment by id.
    pub fn segment(&self, id: &str) -> Option<&NodePortSegment> {
        self.index.get(id).map(|&i| &self.segments[i])
    }

    /// The segments incident to a node.
    pub fn segment_ids_of_node(&self, node_id: &str) -> &[SegmentId] {
        self.node_to_segments
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The two cells sharing a segment.
    pub fn node_ids_of_segment(&self, id: &str) -> Option<&[NodeId; 2]> {
        self.index.get(id).map(|&i| &self.segments[i].node_ids)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Records a crossing point on a segment.
    pub fn assign_point(&mut self, segment_id: &str, point: AssignedPoint) -> Result<()> {
        let &i = self
            .index
            .get(segment_id)
            .ok_or_else(|| Error::Internal(format!("unknown segment {segment_id}")))?;
        self.segments[i].assigned_points.push(point);
        Ok(())
    }

    /// Renders segments as lines and crossing points colored per connection.
    pub fn visualize_with_colors(&self, colors: &ConnectionColorMap) -> GraphicsObject {
        let mut graphics = GraphicsObject::new().with_title("segments");
        for segment in &self.segments {
            graphics.lines.push(VisLine {
                points: vec![segment.start, segment.end],
                stroke_color: None,
                label: Some(segment.id.clone()),
            });
            for point in &segment.assigned_points {
                graphics.points.push(VisPoint {
                    x: point.x,
                    y: point.y,
                    color: Some(colors.color_of(&point.connection_name).to_string()),
                    label: Some(format!("{} z{}", point.connection_name, point.z)),
                });
            }
        }
        graphics
    }
}
