//! Spatial index over obstacle points.
//!
//! Partitions 3-D space using a recursive **Octree** so that occupancy
//! questions ("is there an obstacle inside this box?") stay cheap even when
//! the map holds many thousands of points.  The safety monitor asks such a
//! question up to a hundred times per second of look-ahead, so the query
//! path must not scan every point.
//!
//! # Example
//!
//! ```rust
//! use replan_perception::octree::{Aabb, Octree};
//! use replan_types::Vec3;
//!
//! let bounds = Aabb::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0));
//! let mut tree = Octree::new(bounds, 8);
//!
//! tree.insert(Vec3::new(1.0, 2.0, 3.0));
//!
//! let probe = Aabb::around(Vec3::new(1.0, 2.0, 3.0), 0.5);
//! assert!(tree.query_aabb(&probe));
//! ```

use replan_types::Vec3;

/// Axis-aligned box given by its lower and upper corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Corners may be given in any order; they are sorted per axis.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Cube of half-width `half_extent` centred on `centre`.
    pub fn around(centre: Vec3, half_extent: f64) -> Self {
        let h = Vec3::repeat(half_extent.abs());
        Self::new(centre - h, centre + h)
    }

    pub fn centre(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Closed test: points on a face count as inside.
    pub fn contains_point(&self, p: &Vec3) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    /// Closed test: touching faces count as overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Child box `index` after halving on every axis.  Bit 0 of the index
    /// selects the upper x half, bit 1 the upper y half, bit 2 the upper z
    /// half.
    fn octant(&self, index: usize) -> Aabb {
        let c = self.centre();
        let pick = |axis: usize| {
            if index & (1 << axis) == 0 {
                (self.min[axis], c[axis])
            } else {
                (c[axis], self.max[axis])
            }
        };
        let (x, y, z) = (pick(0), pick(1), pick(2));
        Aabb {
            min: Vec3::new(x.0, y.0, z.0),
            max: Vec3::new(x.1, y.1, z.1),
        }
    }

    /// Index of the octant a contained point falls into.  Points on a
    /// dividing plane go to the upper half.
    fn octant_of(&self, p: &Vec3) -> usize {
        let c = self.centre();
        (0..3).filter(|&axis| p[axis] >= c[axis]).map(|axis| 1 << axis).sum()
    }
}

/// Point octree.  A leaf splits into eight children once it holds more than
/// `capacity` points, unless it already sits at `max_depth`.
#[derive(Debug)]
pub struct Octree {
    root: Node,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

impl Octree {
    /// `capacity` is the number of points a leaf holds before it splits.
    pub fn new(bounds: Aabb, capacity: usize) -> Self {
        Self::with_max_depth(bounds, capacity, 8)
    }

    pub fn with_max_depth(bounds: Aabb, capacity: usize, max_depth: usize) -> Self {
        Self {
            root: Node::leaf(bounds),
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    /// Returns `false`, storing nothing, when `point` lies outside the tree.
    pub fn insert(&mut self, point: Vec3) -> bool {
        if !self.root.bounds.contains_point(&point) {
            return false;
        }
        self.root.insert(point, self.capacity, self.max_depth);
        self.len += 1;
        true
    }

    /// Insert every point of `points`, returning how many were accepted.
    pub fn extend<I: IntoIterator<Item = Vec3>>(&mut self, points: I) -> usize {
        points.into_iter().filter(|p| self.insert(*p)).count()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when any stored point lies inside `region`.
    pub fn query_aabb(&self, region: &Aabb) -> bool {
        self.root.any_in(region)
    }
}

#[derive(Debug)]
enum Cell {
    Leaf(Vec<Vec3>),
    Split(Box<[Node; 8]>),
}

#[derive(Debug)]
struct Node {
    bounds: Aabb,
    cell: Cell,
}

impl Node {
    fn leaf(bounds: Aabb) -> Self {
        Self {
            bounds,
            cell: Cell::Leaf(Vec::new()),
        }
    }

    /// `point` must lie inside `self.bounds`.
    fn insert(&mut self, point: Vec3, capacity: usize, depth_left: usize) {
        match &mut self.cell {
            Cell::Split(children) => {
                let i = self.bounds.octant_of(&point);
                children[i].insert(point, capacity, depth_left.saturating_sub(1));
            }
            Cell::Leaf(points) => {
                points.push(point);
                if points.len() > capacity && depth_left > 0 {
                    self.split(capacity, depth_left);
                }
            }
        }
    }

    fn split(&mut self, capacity: usize, depth_left: usize) {
        let bounds = self.bounds;
        let mut children: Box<[Node; 8]> = Box::new(std::array::from_fn(|i| Node::leaf(bounds.octant(i))));
        if let Cell::Leaf(points) = std::mem::replace(&mut self.cell, Cell::Leaf(Vec::new())) {
            for p in points {
                children[bounds.octant_of(&p)].insert(p, capacity, depth_left - 1);
            }
        }
        self.cell = Cell::Split(children);
    }

    fn any_in(&self, region: &Aabb) -> bool {
        if !self.bounds.overlaps(region) {
            return false;
        }
        match &self.cell {
            Cell::Leaf(points) => points.iter().any(|p| region.contains_point(p)),
            Cell::Split(children) => children.iter().any(|c| c.any_in(region)),
        }
    }
}
