//! `replan-sim` – In-process collaborators for headless runs.
//!
//! Lets the full re-planning stack run in tests and demos without a numerical
//! optimizer or a real vehicle.
//!
//! # Modules
//!
//! - [`polyline`] – constant-speed piecewise-linear curves.
//! - [`optimizer`] – [`SimOptimizer`][optimizer::SimOptimizer]: straight
//!   line to the target, with random lateral detours when the line is
//!   blocked and randomization is allowed.
//! - [`vehicle`] – [`SimVehicle`][vehicle::SimVehicle]: a perfect tracker
//!   that reports the committed trajectory back as odometry.

pub mod optimizer;
pub mod polyline;
pub mod vehicle;

pub use optimizer::SimOptimizer;
pub use polyline::Polyline;
pub use vehicle::SimVehicle;
