//! Obstacle lookup for mesh construction using an R*-tree.
//!
//! The mesh builder interrogates obstacles once per candidate cell, so the
//! broad phase matters: an R*-tree over obstacle outlines answers the
//! overlap, containment, and point queries without scanning the whole
//! obstacle list each time.

use copperweave_core::{Point, Rect, Result, RouteRequest};
use rstar::{RTree, RTreeObject, AABB};

/// An obstacle prepared for spatial queries: its outline, the z indices it
/// occupies, and the connections it is electrically part of.
#[derive(Debug, Clone)]
pub struct IndexedObstacle {
    pub rect: Rect,
    pub layers: Vec<u8>,
    pub connected_to: Vec<String>,
}

impl IndexedObstacle {
    /// True if the obstacle occupies the given layer.
    pub fn occupies(&self, z: u8) -> bool {
        self.layers.contains(&z)
    }

    /// True if the obstacle is electrically part of the named connection.
    pub fn is_connected_to(&self, connection: &str) -> bool {
        self.connected_to.iter().any(|name| name == connection)
    }
}

impl RTreeObject for IndexedObstacle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.rect.min_x(), self.rect.min_y()],
            [self.rect.max_x(), self.rect.max_y()],
        )
    }
}

/// Spatial index over a board's obstacles.
#[derive(Debug)]
pub struct ObstacleIndex {
    tree: RTree<IndexedObstacle>,
    all_z: Vec<u8>,
}

impl ObstacleIndex {
    /// Builds the index from a board input.
    pub fn from_request(request: &RouteRequest) -> Result<Self> {
        let layers = request.layer_assignment();
        let mut entries = Vec::with_capacity(request.obstacles.len());
        for obstacle in &request.obstacles {
            let z: Result<Vec<u8>> = obstacle.layers.iter().map(|name| layers.z_of(name)).collect();
            entries.push(IndexedObstacle {
                rect: obstacle.outline(),
                layers: z?,
                connected_to: obstacle.connected_to.clone(),
            });
        }
        Ok(Self {
            tree: RTree::bulk_load(entries),
            all_z: layers.all_z(),
        })
    }

    /// Number of indexed obstacles.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// True if the board has no obstacles.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All obstacles strictly overlapping the given rectangle.
    pub fn overlapping(&self, rect: &Rect) -> Vec<&IndexedObstacle> {
        let envelope = AABB::from_corners(
            [rect.min_x(), rect.min_y()],
            [rect.max_x(), rect.max_y()],
        );
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| entry.rect.overlaps(rect))
            .collect()
    }

    /// True if any obstacle strictly overlaps the rectangle.
    pub fn any_overlapping(&self, rect: &Rect) -> bool {
        !self.overlapping(rect).is_empty()
    }

    /// True if some obstacle occupying at least one of `available_z` fully
    /// contains the rectangle.
    pub fn fully_containing(&self, rect: &Rect, available_z: &[u8]) -> bool {
        self.overlapping(rect).iter().any(|entry| {
            entry.rect.contains_rect(rect) && available_z.iter().any(|&z| entry.occupies(z))
        })
    }

    /// The layers left unobstructed at a point, ignoring obstacles that are
    /// electrically part of `exclude_net` (a pad never blocks its own net).
    pub fn free_layers_at(&self, point: &Point, exclude_net: Option<&str>) -> Vec<u8> {
        let envelope = AABB::from_corners([point.x, point.y], [point.x, point.y]);
        let mut blocked = vec![false; self.all_z.len()];
        for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
            if !entry.rect.contains_point(point) {
                continue;
            }
            if let Some(net) = exclude_net {
                if entry.is_connected_to(net) {
                    continue;
                }
            }
            for &z in &entry.layers {
                if let Some(slot) = blocked.get_mut(z as usize) {
                    *slot = true;
                }
            }
        }
        self.all_z
            .iter()
            .copied()
            .filter(|&z| !blocked[z as usize])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copperweave_core::{BoardBounds, Obstacle};

    fn index_with(obstacles: Vec<Obstacle>) -> ObstacleIndex {
        let mut request = RouteRequest::new(BoardBounds::new(0.0, 100.0, 0.0, 100.0), 0.15);
        request.obstacles = obstacles;
        ObstacleIndex::from_request(&request).unwrap()
    }

    #[test]
    fn test_overlap_query_is_strict() {
        let index = index_with(vec![Obstacle::rect(
            Point::new(50.0, 50.0),
            20.0,
            20.0,
            vec!["top".into()],
        )]);

        // Shares only the edge x = 40
        let touching = Rect::new(Point::new(35.0, 50.0), 10.0, 10.0);
        assert!(!index.any_overlapping(&touching));

        let crossing = Rect::new(Point::new(45.0, 50.0), 12.0, 10.0);
        assert!(index.any_overlapping(&crossing));
    }

    #[test]
    fn test_fully_containing_respects_layers() {
        let index = index_with(vec![Obstacle::rect(
            Point::new(50.0, 50.0),
            40.0,
            40.0,
            vec!["top".into()],
        )]);

        let cell = Rect::new(Point::new(50.0, 50.0), 5.0, 5.0);
        assert!(index.fully_containing(&cell, &[0]));
        assert!(index.fully_containing(&cell, &[0, 1]));
        // The obstacle does not touch the bottom layer
        assert!(!index.fully_containing(&cell, &[1]));
    }

    #[test]
    fn test_free_layers_at_point() {
        let index = index_with(vec![
            Obstacle::rect(Point::new(50.0, 50.0), 20.0, 20.0, vec!["top".into()]),
            Obstacle::rect(Point::new(50.0, 50.0), 6.0, 6.0, vec!["bottom".into()])
                .with_connected_to(vec!["net1".into()]),
        ]);

        let p = Point::new(50.0, 50.0);
        // Both obstacles block the point
        assert!(index.free_layers_at(&p, None).is_empty());
        // net1's own pad does not block it, leaving the bottom free
        assert_eq!(index.free_layers_at(&p, Some("net1")), vec![1]);
        // Away from everything both layers are free
        assert_eq!(index.free_layers_at(&Point::new(5.0, 5.0), None), vec![0, 1]);
    }

    #[test]
    fn test_empty_index() {
        let index = index_with(vec![]);
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        let anywhere = Rect::new(Point::new(10.0, 10.0), 5.0, 5.0);
        assert!(!index.any_overlapping(&anywhere));
    }
}
