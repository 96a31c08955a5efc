//! # Copperweave Mesh
//!
//! Adaptive capacity mesh construction for the copperweave PCB autorouting
//! engine.
//!
//! This crate turns a board description into a quad-tree of routing cells:
//! obstacle-free regions stay coarse, regions near obstacles and connection
//! endpoints subdivide down to the configured depth, and regions blocked on
//! one conductor layer split along z so the free layer keeps its capacity.
//!
//! ## Features
//!
//! - Stepwise quad-tree subdivision with obstacle-aware pruning
//! - Z-subdivision under single-layer obstacles
//! - Target tagging (connection endpoints are always retained, even when
//!   buried in obstacles)
//! - R*-tree accelerated obstacle queries and adjacency construction
//! - Deduplicated crossing segments with node ↔ segment maps
//!
//! ## Quick Start
//!
//! ```rust
//! use copperweave_core::{BoardBounds, Connection, ConnectionPoint, RouteRequest};
//! use copperweave_mesh::{build_edges, MeshBuilder, MeshConfig, SegmentSet};
//!
//! let request = RouteRequest::new(BoardBounds::new(0.0, 100.0, 0.0, 100.0), 0.15)
//!     .with_connection(Connection::new(
//!         "net1",
//!         vec![
//!             ConnectionPoint::new(10.0, 10.0, "top"),
//!             ConnectionPoint::new(90.0, 90.0, "top"),
//!         ],
//!     ));
//!
//! let mesh = MeshBuilder::new(&request, MeshConfig::new().with_max_depth(3))
//!     .unwrap()
//!     .build();
//! let edges = build_edges(&mesh);
//! let segments = SegmentSet::build(&mesh, &edges).unwrap();
//!
//! assert!(!mesh.is_empty());
//! assert!(!segments.is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod edges;
pub mod mesh;
pub mod node;
pub mod obstacles;
pub mod segments;

// Re-exports
pub use edges::{build_edges, MeshEdge};
pub use mesh::{CapacityMesh, MeshBuilder, MeshConfig};
pub use node::{CapacityMeshNode, NodeId};
pub use obstacles::{IndexedObstacle, ObstacleIndex};
pub use segments::{AssignedPoint, NodePortSegment, SegmentId, SegmentSet};
