//! Collaborator seams of the decision layer: the trajectory optimizer and
//! the sink for everything the core publishes.

use rand::RngCore;
use replan_types::{DataDisplay, LocalTarget, TrajectoryMessage, Vec3, VisualizationMarker};

use crate::trajectory::{CommittedTrajectory, GlobalTrajectory};

/// Boundary state of a plan: position, velocity and acceleration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl KinematicState {
    pub fn new(position: Vec3, velocity: Vec3, acceleration: Vec3) -> Self {
        Self {
            position,
            velocity,
            acceleration,
        }
    }

    /// At `position` with the given velocity and no acceleration.
    pub fn moving(position: Vec3, velocity: Vec3) -> Self {
        Self::new(position, velocity, Vec3::zeros())
    }

    pub fn at_rest(position: Vec3) -> Self {
        Self::new(position, Vec3::zeros(), Vec3::zeros())
    }
}

/// One call of the escalation primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplanRequest {
    pub start: KinematicState,
    pub target: LocalTarget,
    /// The goal changed since the last call.
    pub use_new_target: bool,
    /// Discard the warm start.
    pub force_reinit: bool,
    /// Draw the re-initialised guess from the supplied random source.
    pub randomize: bool,
}

impl ReplanRequest {
    /// Whether the optimizer should throw away its previous solution.
    pub fn reinitialize(&self) -> bool {
        self.use_new_target || self.force_reinit
    }
}

/// The numerical trajectory optimizer.
///
/// Calls are synchronous and may be slow.  Implementations are driven from
/// one task at a time; the kernel serialises access.
pub trait TrajectoryOptimizer: Send {
    /// Coarse plan from `start` to `goal`, produced once per accepted goal.
    fn plan_initial(&mut self, start: &KinematicState, goal: &KinematicState) -> Option<GlobalTrajectory>;

    /// Local plan towards `request.target`.  `rng` is the only source of
    /// randomness allowed when `request.randomize` is set.
    fn replan(&mut self, request: &ReplanRequest, rng: &mut dyn RngCore) -> Option<CommittedTrajectory>;

    /// Stationary trajectory holding `position`.
    fn emergency_stop(&mut self, position: Vec3) -> CommittedTrajectory;
}

/// Everything the core publishes.  All calls are best-effort; the core never
/// inspects their outcome.
pub trait PlanningOutput: Send + Sync {
    fn publish_trajectory(&self, msg: TrajectoryMessage);
    fn publish_data_display(&self, msg: DataDisplay);
    fn visualize(&self, marker: VisualizationMarker);
}

/// Output sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl PlanningOutput for NullOutput {
    fn publish_trajectory(&self, _msg: TrajectoryMessage) {}
    fn publish_data_display(&self, _msg: DataDisplay) {}
    fn visualize(&self, _marker: VisualizationMarker) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(use_new_target: bool, force_reinit: bool) -> ReplanRequest {
        ReplanRequest {
            start: KinematicState::at_rest(Vec3::zeros()),
            target: LocalTarget {
                position: Vec3::new(1.0, 0.0, 0.0),
                velocity: Vec3::zeros(),
            },
            use_new_target,
            force_reinit,
            randomize: false,
        }
    }

    #[test]
    fn either_flag_reinitializes() {
        assert!(!request(false, false).reinitialize());
        assert!(request(true, false).reinitialize());
        assert!(request(false, true).reinitialize());
    }

    #[test]
    fn moving_state_has_no_acceleration() {
        let s = KinematicState::moving(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(s.acceleration, Vec3::zeros());
        assert_eq!(s.velocity.x, 0.5);
    }
}
