//! `replan-runtime` – Task Driver
//!
//! Runs the re-planning state machine against the event bus.
//!
//! # Modules
//!
//! - [`node`] – [`PlannerNode`][node::PlannerNode]: spawns the core tick,
//!   the safety tick and the odometry and goal ingestion loops as independent
//!   Tokio tasks, with optimizer work moved onto the blocking pool.
//! - [`bus_output`] – [`BusOutput`][bus_output::BusOutput]: the
//!   [`PlanningOutput`][replan_kernel::PlanningOutput] sink that publishes
//!   trajectories, data-display records and markers on the bus.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable live trace export
//!   to any OTLP-compatible collector.

pub mod bus_output;
pub mod node;
pub mod telemetry;

pub use bus_output::BusOutput;
pub use node::{NodeHandles, PlannerNode};
pub use telemetry::{TracerProviderGuard, init_tracing};
