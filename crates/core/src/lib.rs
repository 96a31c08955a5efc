//! # Copperweave Core
//!
//! Core types and traits for the copperweave PCB autorouting engine.
//!
//! This crate provides the foundational pieces shared by the capacity mesh
//! and the unravel solver crates.
//!
//! ## Core Components
//!
//! - **Geometry primitives**: [`Point`], [`Rect`], [`segments_cross`]
//! - **Layer bookkeeping**: [`LayerAssignment`] — bijective layer-name ↔ z map
//! - **Board input**: [`RouteRequest`] with up-front validation
//! - **Stepwise execution**: [`StepSolver`] — cooperative `step()` solvers
//! - **Debug graphics**: [`GraphicsObject`], [`Visualize`], [`ConnectionColorMap`]
//!
//! ## Execution Model
//!
//! Solvers are single-threaded and cooperative: each `step()` performs one
//! unit of work and returns, so a host can interleave visualization,
//! timeboxing, or cancellation between steps with no locking.
//!
//! ## Example
//!
//! ```rust
//! use copperweave_core::{BoardBounds, Connection, ConnectionPoint, RouteRequest};
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
//! assert!(request.validate().is_ok());
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod board;
pub mod error;
pub mod geometry;
pub mod layers;
pub mod solver;
pub mod visualize;

// Re-exports
pub use board::{BoardBounds, Connection, ConnectionPoint, Obstacle, RouteRequest};
pub use error::{Error, Result};
pub use geometry::{segments_cross, Point, Rect};
pub use layers::{opposite_z, LayerAssignment, BOTTOM_Z, LAYER_COUNT, TOP_Z};
pub use solver::{ProgressCallback, ProgressInfo, StepSolver};
pub use visualize::{
    ConnectionColorMap, GraphicsObject, VisCircle, VisLine, VisPoint, VisRect, Visualize,
    DEFAULT_CONNECTION_COLOR, IMMUTABLE_CELL_COLOR, MUTABLE_CELL_COLOR,
};
