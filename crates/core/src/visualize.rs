//! Debug graphics output.
//!
//! Every pipeline component can render its current state into a
//! [`GraphicsObject`] — a flat list of labeled points, lines, rectangles,
//! and circles a host can draw however it likes. Colors for trace data are
//! keyed by connection name through a [`ConnectionColorMap`]; cells render
//! green when mutable and red when frozen.

use crate::geometry::Point;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fallback color for connections without an assigned color.
pub const DEFAULT_CONNECTION_COLOR: &str = "blue";

/// Fill used for cells whose segments may be edited.
pub const MUTABLE_CELL_COLOR: &str = "green";

/// Fill used for frozen context cells.
pub const IMMUTABLE_CELL_COLOR: &str = "red";

/// A labeled point.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisPoint {
    pub x: f64,
    pub y: f64,
    pub color: Option<String>,
    pub label: Option<String>,
}

/// A polyline.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisLine {
    pub points: Vec<Point>,
    pub stroke_color: Option<String>,
    pub label: Option<String>,
}

/// A filled rectangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisRect {
    pub center: Point,
    pub width: f64,
    pub height: f64,
    pub fill: Option<String>,
    pub label: Option<String>,
}

/// A filled circle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisCircle {
    pub center: Point,
    pub radius: f64,
    pub fill: Option<String>,
    pub label: Option<String>,
}

/// A renderable collection of debug primitives.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GraphicsObject {
    pub title: Option<String>,
    pub points: Vec<VisPoint>,
    pub lines: Vec<VisLine>,
    pub rects: Vec<VisRect>,
    pub circles: Vec<VisCircle>,
}

impl GraphicsObject {
    /// Creates an empty graphics object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends all primitives of `other`.
    pub fn merge(&mut self, other: GraphicsObject) {
        self.points.extend(other.points);
        self.lines.extend(other.lines);
        self.rects.extend(other.rects);
        self.circles.extend(other.circles);
    }

    /// Total number of primitives.
    pub fn len(&self) -> usize {
        self.points.len() + self.lines.len() + self.rects.len() + self.circles.len()
    }

    /// True if nothing would be drawn.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Renders a component's current state for debugging.
pub trait Visualize {
    /// Produces the debug graphics for this component.
    fn visualize(&self) -> GraphicsObject;
}

/// Caller-supplied mapping from connection names to colors.
#[derive(Debug, Clone, Default)]
pub struct ConnectionColorMap {
    colors: HashMap<String, String>,
}

impl ConnectionColorMap {
    /// Creates an empty map; every lookup falls back to
    /// [`DEFAULT_CONNECTION_COLOR`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a color to a connection.
    pub fn insert(&mut self, connection: impl Into<String>, color: impl Into<String>) {
        self.colors.insert(connection.into(), color.into());
    }

    /// The color for a connection, or the default fallback.
    pub fn color_of(&self, connection: &str) -> &str {
        self.colors
            .get(connection)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CONNECTION_COLOR)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ConnectionColorMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_map_fallback() {
        let mut colors = ConnectionColorMap::new();
        colors.insert("net1", "crimson");
        assert_eq!(colors.color_of("net1"), "crimson");
        assert_eq!(colors.color_of("net2"), DEFAULT_CONNECTION_COLOR);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut a = GraphicsObject::new().with_title("mesh");
        a.points.push(VisPoint {
            x: 1.0,
            y: 2.0,
            color: None,
            label: None,
        });

        let mut b = GraphicsObject::new();
        b.rects.push(VisRect {
            center: Point::new(0.0, 0.0),
            width: 2.0,
            height: 2.0,
            fill: Some("green".into()),
            label: None,
        });

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert!(!a.is_empty());
        assert_eq!(a.title.as_deref(), Some("mesh"));
    }
}
