//! `replan-perception` – occupancy side of the planner.
//!
//! The re-planning layer never builds maps itself; it only asks "is this
//! point inside an obstacle?".  This crate defines that question and one
//! answer to it.
//!
//! # Modules
//!
//! - [`octree`] – [`Octree`][octree::Octree]: recursive spatial index over
//!   3-D obstacle points with box-overlap queries.
//! - [`occupancy`] – [`OccupancyOracle`][occupancy::OccupancyOracle]: the
//!   point query consumed by the safety monitor and the simulated optimizer,
//!   and [`OctreeMap`][occupancy::OctreeMap], an inflated octree
//!   implementation of it.

pub mod occupancy;
pub mod octree;

pub use occupancy::{OccupancyOracle, OctreeMap};
pub use octree::{Aabb, Octree};
