//! Occupancy queries against the obstacle map.

use std::sync::Arc;

use replan_types::Vec3;

use crate::octree::{Aabb, Octree};

/// Point-in-obstacle test against an external map.
///
/// Implementations must be cheap and callable concurrently from the core
/// tick and the safety tick.
pub trait OccupancyOracle: Send + Sync {
    fn is_occupied(&self, point: &Vec3) -> bool;
}

impl<T: OccupancyOracle + ?Sized> OccupancyOracle for Arc<T> {
    fn is_occupied(&self, point: &Vec3) -> bool {
        (**self).is_occupied(point)
    }
}

/// An [`Octree`] of obstacle points, inflated by a fixed margin.
///
/// A point is occupied when any obstacle lies within the cube of
/// half-width `inflation` around it.  Points outside the map bounds are
/// treated as free.
#[derive(Debug)]
pub struct OctreeMap {
    tree: Octree,
    inflation: f64,
}

impl OctreeMap {
    pub fn new(bounds: Aabb, inflation: f64) -> Self {
        Self {
            tree: Octree::new(bounds, 8),
            inflation: inflation.abs(),
        }
    }

    /// Build a map from a list of obstacle points.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(bounds: Aabb, inflation: f64, points: I) -> Self {
        let mut map = Self::new(bounds, inflation);
        let accepted = map.tree.extend(points);
        tracing::debug!(obstacles = accepted, inflation, "octree occupancy map built");
        map
    }

    pub fn obstacle_count(&self) -> usize {
        self.tree.len()
    }
}

impl OccupancyOracle for OctreeMap {
    fn is_occupied(&self, point: &Vec3) -> bool {
        self.tree.query_aabb(&Aabb::around(*point, self.inflation))
    }
}
