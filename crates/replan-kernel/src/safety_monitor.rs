//! Collision look-ahead on the committed trajectory.
//!
//! Each tick samples the committed trajectory from "now" to its end and asks
//! the occupancy oracle about every sample.  The first occupied sample
//! decides the outcome:
//!
//! * a replan succeeds → EXEC_TRAJ on the new trajectory;
//! * replanning fails with less than `emergency_margin` seconds left →
//!   EMERGENCY_STOP;
//! * replanning fails with more time left → REPLAN_TRAJ, the core retries on
//!   its next tick.

use std::fmt;
use std::sync::Arc;

use replan_perception::OccupancyOracle;
use replan_types::{ExecState, TransitionTag};

use crate::clock::Clock;
use crate::context::SharedContext;
use crate::escalation::EscalationController;
use crate::trajectory::CommittedTrajectory;

/// Outcome of one safety tick.  `margin` is the time (s) from now to the
/// predicted collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SafetyVerdict {
    /// Nothing to check in the current state.
    Idle,
    /// No collision ahead.
    Clear,
    /// Collision ahead, a new trajectory was committed.
    Replanned { margin: f64 },
    /// Collision ahead, replanning failed, handed back to the core.
    Deferred { margin: f64 },
    /// Collision ahead, replanning failed, too close to wait.
    EmergencyStop { margin: f64 },
}

impl fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyVerdict::Idle => write!(f, "idle"),
            SafetyVerdict::Clear => write!(f, "clear"),
            SafetyVerdict::Replanned { margin } => write!(f, "replanned ({margin:.2}s ahead)"),
            SafetyVerdict::Deferred { margin } => write!(f, "deferred ({margin:.2}s ahead)"),
            SafetyVerdict::EmergencyStop { margin } => write!(f, "emergency stop ({margin:.2}s ahead)"),
        }
    }
}

pub struct SafetyMonitor {
    ctx: Arc<SharedContext>,
    escalation: Arc<EscalationController>,
    oracle: Arc<dyn OccupancyOracle>,
    clock: Arc<dyn Clock>,
    step: f64,
    emergency_margin: f64,
}

impl SafetyMonitor {
    pub fn new(
        ctx: Arc<SharedContext>,
        escalation: Arc<EscalationController>,
        oracle: Arc<dyn OccupancyOracle>,
        clock: Arc<dyn Clock>,
        step: f64,
        emergency_margin: f64,
    ) -> Self {
        Self {
            ctx,
            escalation,
            oracle,
            clock,
            step,
            emergency_margin,
        }
    }

    /// Time from `now` to the first occupied sample of `traj`, if any.
    pub fn first_collision(&self, traj: &CommittedTrajectory, now: f64) -> Option<f64> {
        let t0 = (now - traj.start_time).max(0.0);
        if t0 > traj.duration || !(self.step > 0.0) {
            return None;
        }
        let samples = ((traj.duration - t0) / self.step).floor() as usize;
        (0..=samples)
            .map(|i| t0 + i as f64 * self.step)
            .find(|&t| self.oracle.is_occupied(&traj.position_at(t)))
            .map(|t| traj.start_time + t - now)
    }

    pub fn tick(&self) -> SafetyVerdict {
        match self.ctx.exec_state() {
            ExecState::Init | ExecState::WaitTarget | ExecState::EmergencyStop => return SafetyVerdict::Idle,
            _ => {}
        }
        let Some(traj) = self.ctx.committed() else {
            return SafetyVerdict::Idle;
        };

        let Some(margin) = self.first_collision(&traj, self.clock.now()) else {
            return SafetyVerdict::Clear;
        };
        tracing::warn!(traj_id = traj.traj_id, margin, "collision predicted on committed trajectory");

        match self.escalation.replan_from_current() {
            Ok(new) => {
                tracing::info!(traj_id = new.traj_id, margin, "collision avoided by replan");
                self.ctx.transition_if_active(ExecState::ExecTraj, TransitionTag::Safety);
                SafetyVerdict::Replanned { margin }
            }
            Err(err) if margin < self.emergency_margin => {
                tracing::error!(%err, margin, threshold = self.emergency_margin, "collision imminent, emergency stop");
                self.ctx.transition_if_active(ExecState::EmergencyStop, TransitionTag::Safety);
                SafetyVerdict::EmergencyStop { margin }
            }
            Err(err) => {
                tracing::warn!(%err, margin, "replan around collision failed, deferring to core");
                self.ctx.transition_if_active(ExecState::ReplanTraj, TransitionTag::Safety);
                SafetyVerdict::Deferred { margin }
            }
        }
    }
}
