//! Replan escalation: up to three increasingly aggressive optimizer calls.
//!
//! | Tier | `force_reinit` | `randomize` |
//! |---|---|---|
//! | warm start | no | no |
//! | re-initialise | yes | no |
//! | randomized re-initialise | yes | yes |
//!
//! Tiers run strictly one after the other and the chain stops at the first
//! success.  No new tier is started while the state machine is in
//! EMERGENCY_STOP; a tier already running is never interrupted.

use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use replan_types::{ExecState, PlannerError, Vec3, VisualizationMarker};

use crate::clock::Clock;
use crate::context::SharedContext;
use crate::local_target::LocalTargetSelector;
use crate::optimizer::{KinematicState, PlanningOutput, ReplanRequest, TrajectoryOptimizer};
use crate::trajectory::{CommittedTrajectory, GlobalTrajectory};

/// Sampling step of the committed-trajectory preview (s).
const PREVIEW_STEP: f64 = 0.1;

/// Optimizer flags of one escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tier {
    pub force_reinit: bool,
    pub randomize: bool,
}

pub const ESCALATION_TIERS: [Tier; 3] = [
    Tier {
        force_reinit: false,
        randomize: false,
    },
    Tier {
        force_reinit: true,
        randomize: false,
    },
    Tier {
        force_reinit: true,
        randomize: true,
    },
];

/// Owns the optimizer and the random source handed to it.
pub struct EscalationController {
    ctx: Arc<SharedContext>,
    optimizer: Mutex<Box<dyn TrajectoryOptimizer>>,
    rng: Mutex<StdRng>,
    output: Arc<dyn PlanningOutput>,
    clock: Arc<dyn Clock>,
    selector: LocalTargetSelector,
}

impl EscalationController {
    pub fn new(
        ctx: Arc<SharedContext>,
        optimizer: Box<dyn TrajectoryOptimizer>,
        output: Arc<dyn PlanningOutput>,
        clock: Arc<dyn Clock>,
        selector: LocalTargetSelector,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            ctx,
            optimizer: Mutex::new(optimizer),
            rng: Mutex::new(rng),
            output,
            clock,
            selector,
        }
    }

    /// A single optimizer call towards the current local target.
    ///
    /// Consumes the one-shot new-target flag whether or not the call
    /// succeeds.  On success the result is committed and published.
    pub fn call_replan(
        &self,
        start: &KinematicState,
        force_reinit: bool,
        randomize: bool,
    ) -> Option<Arc<CommittedTrajectory>> {
        if self.ctx.exec_state() == ExecState::EmergencyStop {
            tracing::debug!("emergency stop active, optimizer call refused");
            return None;
        }
        let Some(active) = self.ctx.active_goal() else {
            tracing::debug!("no goal available, optimizer call skipped");
            return None;
        };

        let selection = self
            .selector
            .select(&start.position, &active.goal.final_point, &active.init_point);
        let request = ReplanRequest {
            start: *start,
            target: selection.target,
            use_new_target: self.ctx.take_new_target(),
            force_reinit,
            randomize,
        };

        let planned = {
            let mut optimizer = self.optimizer.lock().unwrap_or_else(PoisonError::into_inner);
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            optimizer.replan(&request, &mut *rng)
        };

        match planned {
            Some(traj) => Some(self.commit_and_publish(traj)),
            None => {
                tracing::debug!(
                    use_new_target = request.use_new_target,
                    force_reinit,
                    randomize,
                    "optimizer call failed"
                );
                None
            }
        }
    }

    /// Run the three tiers in order until one succeeds.
    pub fn escalate(&self, start: &KinematicState) -> Result<Arc<CommittedTrajectory>, PlannerError> {
        let mut attempts = 0u8;
        for tier in ESCALATION_TIERS {
            if self.ctx.exec_state() == ExecState::EmergencyStop {
                tracing::debug!(attempts, "escalation abandoned, emergency stop active");
                break;
            }
            attempts += 1;
            if let Some(traj) = self.call_replan(start, tier.force_reinit, tier.randomize) {
                tracing::debug!(attempts, traj_id = traj.traj_id, "replan succeeded");
                return Ok(traj);
            }
        }
        Err(PlannerError::ReplanFailure { attempts })
    }

    /// Boundary state at `now` on the committed trajectory.
    pub fn start_from_committed(&self, now: f64) -> Option<KinematicState> {
        let traj = self.ctx.committed()?;
        let t = traj.offset(now);
        Some(KinematicState::new(
            traj.position_at(t),
            traj.velocity_at(t),
            traj.acceleration_at(t),
        ))
    }

    /// Full escalation starting from where the committed trajectory says
    /// the vehicle is right now.
    pub fn replan_from_current(&self) -> Result<Arc<CommittedTrajectory>, PlannerError> {
        let Some(start) = self.start_from_committed(self.clock.now()) else {
            return Err(PlannerError::ReplanFailure { attempts: 0 });
        };
        self.escalate(&start)
    }

    pub fn plan_initial(&self, start: &KinematicState, goal: &KinematicState) -> Option<GlobalTrajectory> {
        self.optimizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .plan_initial(start, goal)
    }

    /// Commit and publish a stationary trajectory at `position`.
    pub fn emergency_stop(&self, position: Vec3) -> Arc<CommittedTrajectory> {
        let traj = self
            .optimizer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .emergency_stop(position);
        self.commit_and_publish(traj)
    }

    fn commit_and_publish(&self, traj: CommittedTrajectory) -> Arc<CommittedTrajectory> {
        let traj = self.ctx.commit(traj);
        self.output.publish_trajectory(traj.to_message());
        self.output.visualize(VisualizationMarker::CommittedPreview {
            traj_id: traj.traj_id,
            points: traj.sample_positions(PREVIEW_STEP),
        });
        traj
    }
}
