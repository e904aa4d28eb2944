//! `replan-kernel` – Re-planning Decision Layer
//!
//! Decides *when* and *how aggressively* to call the trajectory optimizer,
//! watches the committed trajectory for collisions, and turns a distant goal
//! into a bounded-horizon sub-goal.  It does not optimise anything itself.
//!
//! # Modules
//!
//! - [`fsm`] – [`ReplanFsm`][fsm::ReplanFsm]: the state machine core.  Owns
//!   the other components and exposes the two periodic ticks and the two
//!   input handlers.
//! - [`escalation`] – [`EscalationController`][escalation::EscalationController]:
//!   warm start, forced re-initialisation, randomized re-initialisation, in
//!   that order, until one succeeds.
//! - [`safety_monitor`] – [`SafetyMonitor`][safety_monitor::SafetyMonitor]:
//!   collision look-ahead deciding between replan, deferral and emergency
//!   stop.
//! - [`local_target`] – [`LocalTargetSelector`][local_target::LocalTargetSelector]:
//!   line/sphere intersection producing the optimizer's sub-goal.
//! - [`context`] – [`SharedContext`][context::SharedContext]: exec state,
//!   committed trajectory, odometry and goal shared between the ticks.
//! - [`transition_counter`] – consecutive-repeat counter of exec states.
//! - [`optimizer`], [`trajectory`], [`clock`] – collaborator seams.
//! - [`config`] – [`FsmConfig`][config::FsmConfig].

pub mod clock;
pub mod config;
pub mod context;
pub mod escalation;
pub mod fsm;
pub mod local_target;
pub mod optimizer;
pub mod safety_monitor;
pub mod trajectory;
pub mod transition_counter;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FlightType, FsmConfig};
pub use context::{ActiveGoal, SharedContext};
pub use escalation::{ESCALATION_TIERS, EscalationController, Tier};
pub use fsm::ReplanFsm;
pub use local_target::{LocalTargetSelection, LocalTargetSelector};
pub use optimizer::{KinematicState, NullOutput, PlanningOutput, ReplanRequest, TrajectoryOptimizer};
pub use safety_monitor::{SafetyMonitor, SafetyVerdict};
pub use trajectory::{CommittedTrajectory, Curve, GlobalTrajectory};
pub use transition_counter::TransitionCounter;
