//! Adaptive capacity mesh construction.
//!
//! The builder grows a quad-tree of routing cells over the board: cells
//! near obstacles and targets subdivide until they reach the configured
//! depth, fully buried cells drop out of the graph, and cells blocked on
//! one layer but free on the other split along z so each remaining cell
//! has clean capacity semantics.

use crate::node::{CapacityMeshNode, NodeId};
use crate::obstacles::ObstacleIndex;
use copperweave_core::{
    ConnectionColorMap, GraphicsObject, Point, ProgressCallback, ProgressInfo, Rect, Result,
    RouteRequest, StepSolver, VisRect, Visualize,
};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Configuration for mesh construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshConfig {
    /// Maximum quad-tree depth; cells at this depth are never further
    /// xy-subdivided.
    pub max_depth: u32,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

impl MeshConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum subdivision depth (clamped to at least 1).
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Picks the smallest depth whose leaf cells come within a few trace
    /// widths of the board's `min_trace_width`, capped at depth 10.
    pub fn for_board(request: &RouteRequest) -> Self {
        let max_dim = request.bounds.width().max(request.bounds.height());
        let target = request.min_trace_width * 8.0;
        let mut depth = 1u32;
        while max_dim / f64::powi(2.0, depth as i32) > target && depth < 10 {
            depth += 1;
        }
        Self { max_depth: depth }
    }
}

/// A connection endpoint prepared for target detection.
#[derive(Debug, Clone)]
struct TargetPoint {
    connection_name: String,
    point: Point,
    available_z: Vec<u8>,
}

/// Stepwise quad-tree builder producing the capacity mesh.
///
/// Each [`step`](StepSolver::step) pops one unfinished cell from the
/// worklist and produces its children; construction terminates when the
/// worklist is empty.
pub struct MeshBuilder {
    config: MeshConfig,
    obstacles: ObstacleIndex,
    targets: Vec<TargetPoint>,
    unfinished: VecDeque<CapacityMeshNode>,
    finished: Vec<CapacityMeshNode>,
    next_node_index: u64,
    steps: u64,
}

impl MeshBuilder {
    /// Creates a builder for a validated board input.
    pub fn new(request: &RouteRequest, config: MeshConfig) -> Result<Self> {
        request.validate()?;
        let layers = request.layer_assignment();
        let obstacles = ObstacleIndex::from_request(request)?;

        let mut targets = Vec::new();
        for connection in &request.connections {
            for point in &connection.points_to_connect {
                let declared_z = layers.z_of(&point.layer)?;
                let position = point.position();
                let mut available_z =
                    obstacles.free_layers_at(&position, Some(&connection.name));
                if available_z.is_empty() {
                    available_z = vec![declared_z];
                }
                targets.push(TargetPoint {
                    connection_name: connection.name.clone(),
                    point: position,
                    available_z,
                });
            }
        }

        let mut builder = Self {
            config,
            obstacles,
            targets,
            unfinished: VecDeque::new(),
            finished: Vec::new(),
            next_node_index: 0,
            steps: 0,
        };

        let bounds = request.bounds.as_rect();
        let root = CapacityMeshNode {
            id: builder.next_node_id(),
            center: bounds.center,
            width: bounds.width,
            height: bounds.height,
            available_z: layers.all_z(),
            depth: 0,
            contains_obstacle: false,
            completely_inside_obstacle: false,
            contains_target: false,
            target_connection_name: None,
        };
        builder.unfinished.push_back(root);
        Ok(builder)
    }

    /// Drives the builder to completion and returns the mesh.
    pub fn build(mut self) -> CapacityMesh {
        self.run(None);
        CapacityMesh::new(self.finished)
    }

    /// Drives the builder to completion, reporting progress between steps.
    pub fn build_with_progress(mut self, callback: ProgressCallback) -> CapacityMesh {
        let start = Instant::now();
        while !self.solved() {
            self.step();
            callback(
                ProgressInfo::new("subdivide")
                    .with_iteration(self.steps)
                    .with_queue_len(self.unfinished.len())
                    .with_elapsed(start.elapsed().as_millis() as u64),
            );
        }
        callback(
            ProgressInfo::new("subdivide")
                .with_iteration(self.steps)
                .with_elapsed(start.elapsed().as_millis() as u64)
                .finished(),
        );
        CapacityMesh::new(self.finished)
    }

    /// The finished cells so far.
    pub fn finished_nodes(&self) -> &[CapacityMeshNode] {
        &self.finished
    }

    fn next_node_id(&mut self) -> NodeId {
        let id = format!("cn{}", self.next_node_index);
        self.next_node_index += 1;
        id
    }

    /// Fills in the obstacle and target flags for a freshly cut cell,
    /// shrinking `available_z` for targets buried in obstacles.
    fn populate_flags(&mut self, node: &mut CapacityMeshNode) {
        let rect = node.rect();
        node.contains_obstacle = self.obstacles.any_overlapping(&rect);
        node.completely_inside_obstacle = node.contains_obstacle
            && self.obstacles.fully_containing(&rect, &node.available_z);

        if let Some(target) = self
            .targets
            .iter()
            .find(|target| rect.contains_point(&target.point))
        {
            node.contains_target = true;
            node.target_connection_name = Some(target.connection_name.clone());
            if node.completely_inside_obstacle {
                node.available_z = target.available_z.clone();
                node.completely_inside_obstacle =
                    self.obstacles.fully_containing(&rect, &node.available_z);
            }
        }
    }

    /// The four quadrant children of a cell, flags populated.
    fn quadrant_children(&mut self, parent: &CapacityMeshNode) -> Vec<CapacityMeshNode> {
        parent
            .rect()
            .quadrants()
            .into_iter()
            .map(|quadrant| {
                let mut child = CapacityMeshNode {
                    id: self.next_node_id(),
                    center: quadrant.center,
                    width: quadrant.width,
                    height: quadrant.height,
                    available_z: parent.available_z.clone(),
                    depth: parent.depth + 1,
                    contains_obstacle: false,
                    completely_inside_obstacle: false,
                    contains_target: false,
                    target_connection_name: None,
                };
                self.populate_flags(&mut child);
                child
            })
            .collect()
    }

    /// One single-layer sibling per available layer, same geometry,
    /// filtered to those that belong in the graph.
    fn z_subdivision_children(&mut self, node: &CapacityMeshNode) -> Vec<CapacityMeshNode> {
        let layers = node.available_z.clone();
        layers
            .into_iter()
            .filter_map(|z| {
                let mut sibling = CapacityMeshNode {
                    id: self.next_node_id(),
                    center: node.center,
                    width: node.width,
                    height: node.height,
                    available_z: vec![z],
                    depth: node.depth,
                    contains_obstacle: false,
                    completely_inside_obstacle: false,
                    contains_target: false,
                    target_connection_name: None,
                };
                self.populate_flags(&mut sibling);
                sibling.should_be_in_graph().then_some(sibling)
            })
            .collect()
    }

    fn should_be_xy_subdivided(&self, node: &CapacityMeshNode) -> bool {
        node.depth < self.config.max_depth
            && (node.contains_target
                || (node.contains_obstacle && !node.completely_inside_obstacle)
                || node.is_single_layer())
    }
}

impl StepSolver for MeshBuilder {
    fn step(&mut self) {
        let Some(parent) = self.unfinished.pop_front() else {
            return;
        };
        self.steps += 1;

        for child in self.quadrant_children(&parent) {
            // Retention: fully buried cells drop out, but a buried
            // multi-layer cell may still contribute its free layer.
            let retained = if child.should_be_in_graph() {
                vec![child]
            } else if child.available_z.len() > 1 {
                self.z_subdivision_children(&child)
            } else {
                Vec::new()
            };

            for cell in retained {
                if self.should_be_xy_subdivided(&cell) {
                    self.unfinished.push_back(cell);
                } else if !cell.contains_obstacle {
                    self.finished.push(cell);
                } else if cell.contains_target {
                    self.finished.push(cell);
                } else if cell.available_z.len() > 1 {
                    let siblings = self.z_subdivision_children(&cell);
                    self.finished.extend(siblings);
                } else {
                    self.finished.push(cell);
                }
            }
        }
    }

    fn solved(&self) -> bool {
        self.unfinished.is_empty()
    }

    fn failed(&self) -> bool {
        false
    }

    fn iterations(&self) -> u64 {
        self.steps
    }
}

impl Visualize for MeshBuilder {
    fn visualize(&self) -> GraphicsObject {
        let mesh = CapacityMesh::new(self.finished.clone());
        mesh.visualize_with_colors(&ConnectionColorMap::new())
    }
}

/// The completed capacity mesh: the retained cells plus an id lookup.
#[derive(Debug, Clone)]
pub struct CapacityMesh {
    nodes: Vec<CapacityMeshNode>,
    index: HashMap<NodeId, usize>,
}

impl CapacityMesh {
    /// Wraps a list of finished cells.
    pub fn new(nodes: Vec<CapacityMeshNode>) -> Self {
        let index = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        Self { nodes, index }
    }

    /// All cells, in creation order.
    pub fn nodes(&self) -> &[CapacityMeshNode] {
        &self.nodes
    }

    /// Looks up a cell by id.
    pub fn node(&self, id: &str) -> Option<&CapacityMeshNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the mesh has no cells.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Cells whose outline overlaps or touches the given rectangle.
    pub fn nodes_overlapping(&self, rect: &Rect) -> Vec<&CapacityMeshNode> {
        self.nodes
            .iter()
            .filter(|node| node.rect().overlaps(rect))
            .collect()
    }

    /// Renders the mesh with target cells colored per connection.
    pub fn visualize_with_colors(&self, colors: &ConnectionColorMap) -> GraphicsObject {
        let mut graphics = GraphicsObject::new().with_title("capacity mesh");
        for node in &self.nodes {
            let fill = if let Some(connection) = &node.target_connection_name {
                Some(colors.color_of(connection).to_string())
            } else if node.contains_obstacle {
                Some("orange".to_string())
            } else {
                None
            };
            graphics.rects.push(VisRect {
                center: node.center,
                width: node.width,
                height: node.height,
                fill,
                label: Some(format!(
                    "{} z{:?} d{}",
                    node.id, node.available_z, node.depth
                )),
            });
        }
        graphics
    }
}

impl Visualize for CapacityMesh {
    fn visualize(&self) -> GraphicsObject {
        self.visualize_with_colors(&ConnectionColorMap::new())
    }
}
