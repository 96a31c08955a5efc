//! Board input description.
//!
//! [`RouteRequest`] is the structured record handed to the router: the board
//! outline, the stackup, the obstacles, and the connections to route. It is
//! validated up front; the solvers downstream assume a well-formed board and
//! never re-check these conditions.

use crate::geometry::{Point, Rect};
use crate::layers::{LayerAssignment, LAYER_COUNT};
use crate::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The rectangular extent of the routable area.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoardBounds {
    /// Creates bounds from the two corner coordinates.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// Board width.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Board height.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// The bounds as a center/size rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::from_corners(
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.max_y),
        )
    }
}

/// An axis-aligned rectangular obstacle occupying one or more layers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Obstacle {
    /// Obstacle center.
    pub center: Point,
    pub width: f64,
    pub height: f64,
    /// Names of the layers the obstacle occupies.
    pub layers: Vec<String>,
    /// Names of the connections the obstacle is electrically part of
    /// (e.g. the pad of a net's endpoint). Such obstacles do not block
    /// their own net.
    pub connected_to: Vec<String>,
}

impl Obstacle {
    /// Creates an obstacle with no net membership.
    pub fn rect(center: Point, width: f64, height: f64, layers: Vec<String>) -> Self {
        Self {
            center,
            width,
            height,
            layers,
            connected_to: Vec::new(),
        }
    }

    /// Marks the obstacle as part of the named connections.
    pub fn with_connected_to(mut self, names: Vec<String>) -> Self {
        self.connected_to = names;
        self
    }

    /// The obstacle's outline.
    pub fn outline(&self) -> Rect {
        Rect::new(self.center, self.width, self.height)
    }
}

/// One endpoint a connection must reach, on a named layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConnectionPoint {
    pub x: f64,
    pub y: f64,
    pub layer: String,
}

impl ConnectionPoint {
    /// Creates a connection point.
    pub fn new(x: f64, y: f64, layer: impl Into<String>) -> Self {
        Self {
            x,
            y,
            layer: layer.into(),
        }
    }

    /// The point's 2D position.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A named net with the points it must connect.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Connection {
    pub name: String,
    pub points_to_connect: Vec<ConnectionPoint>,
}

impl Connection {
    /// Creates a connection between the given points.
    pub fn new(name: impl Into<String>, points_to_connect: Vec<ConnectionPoint>) -> Self {
        Self {
            name: name.into(),
            points_to_connect,
        }
    }
}

/// The full board input handed to the router.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RouteRequest {
    pub bounds: BoardBounds,
    pub layer_count: usize,
    pub min_trace_width: f64,
    pub obstacles: Vec<Obstacle>,
    pub connections: Vec<Connection>,
}

impl RouteRequest {
    /// Creates an empty request over the given bounds.
    pub fn new(bounds: BoardBounds, min_trace_width: f64) -> Self {
        Self {
            bounds,
            layer_count: LAYER_COUNT,
            min_trace_width,
            obstacles: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Adds an obstacle.
    pub fn with_obstacle(mut self, obstacle: Obstacle) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Adds a connection.
    pub fn with_connection(mut self, connection: Connection) -> Self {
        self.connections.push(connection);
        self
    }

    /// The layer assignment for this board.
    pub fn layer_assignment(&self) -> LayerAssignment {
        LayerAssignment::two_layer()
    }

    /// Validates the request, rejecting malformed input up front.
    ///
    /// Checks the layer count, that every referenced layer is declared,
    /// that every connection point lies inside the bounds, and that all
    /// dimensions are finite and positive.
    pub fn validate(&self) -> Result<()> {
        if self.layer_count != LAYER_COUNT {
            return Err(Error::UnsupportedLayerCount(self.layer_count));
        }
        if !(self.min_trace_width.is_finite() && self.min_trace_width > 0.0) {
            return Err(Error::InvalidBoard(format!(
                "min_trace_width must be finite and positive, got {}",
                self.min_trace_width
            )));
        }
        if !(self.bounds.width() > 0.0 && self.bounds.height() > 0.0) {
            return Err(Error::InvalidBoard("bounds must have positive area".into()));
        }

        let layers = self.layer_assignment();
        let board = self.bounds.as_rect();

        for obstacle in &self.obstacles {
            if !(obstacle.width.is_finite()
                && obstacle.height.is_finite()
                && obstacle.width > 0.0
                && obstacle.height > 0.0)
            {
                return Err(Error::InvalidBoard(format!(
                    "obstacle at ({}, {}) has non-positive size",
                    obstacle.center.x, obstacle.center.y
                )));
            }
            if obstacle.layers.is_empty() {
                return Err(Error::InvalidBoard(format!(
                    "obstacle at ({}, {}) occupies no layers",
                    obstacle.center.x, obstacle.center.y
                )));
            }
            for layer in &obstacle.layers {
                layers.z_of(layer)?;
            }
        }

        for connection in &self.connections {
            if connection.points_to_connect.len() < 2 {
                return Err(Error::InvalidBoard(format!(
                    "connection '{}' has fewer than 2 points",
                    connection.name
                )));
            }
            for point in &connection.points_to_connect {
                layers.z_of(&point.layer)?;
                if !(point.x.is_finite() && point.y.is_finite()) {
                    return Err(Error::InvalidBoard(format!(
                        "connection '{}' has a non-finite point",
                        connection.name
                    )));
                }
                if !board.contains_point(&point.position()) {
                    return Err(Error::InvalidBoard(format!(
                        "connection '{}' point ({}, {}) lies outside bounds",
                        connection.name, point.x, point.y
                    )));
                }
            }
        }

        Ok(())
    }
}
