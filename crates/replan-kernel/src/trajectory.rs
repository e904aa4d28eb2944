//! Read-side view of trajectories produced by the optimizer.
//!
//! The curve representation itself belongs to the optimizer; the decision
//! layer only evaluates curves at a time offset and reads summary fields.

use std::fmt;
use std::sync::Arc;

use replan_types::{BSPLINE_ORDER, TrajectoryMessage, Vec3};

/// A curve evaluable at a time offset from its own start (seconds).
pub trait Curve: Send + Sync + fmt::Debug {
    fn evaluate(&self, t: f64) -> Vec3;
}

/// The trajectory currently being executed.
///
/// Never mutated after construction; a replan builds a new value and the
/// shared context swaps the `Arc` that points at it.
#[derive(Debug, Clone)]
pub struct CommittedTrajectory {
    /// Start time on the planner clock (s).
    pub start_time: f64,
    pub duration: f64,
    pub traj_id: u64,
    /// Position at `t = 0`.
    pub start_pos: Vec3,
    pub position: Arc<dyn Curve>,
    pub velocity: Arc<dyn Curve>,
    pub acceleration: Arc<dyn Curve>,
    pub control_points: Vec<Vec3>,
    pub knots: Vec<f64>,
}

impl CommittedTrajectory {
    /// Time offset of `now` into this trajectory, clamped to `[0, duration]`.
    pub fn offset(&self, now: f64) -> f64 {
        (now - self.start_time).clamp(0.0, self.duration.max(0.0))
    }

    pub fn position_at(&self, t: f64) -> Vec3 {
        self.position.evaluate(t)
    }

    pub fn velocity_at(&self, t: f64) -> Vec3 {
        self.velocity.evaluate(t)
    }

    pub fn acceleration_at(&self, t: f64) -> Vec3 {
        self.acceleration.evaluate(t)
    }

    /// Positions every `step` seconds over the whole trajectory, end included.
    pub fn sample_positions(&self, step: f64) -> Vec<Vec3> {
        sample(self.position.as_ref(), self.duration, step, true)
    }

    pub fn to_message(&self) -> TrajectoryMessage {
        TrajectoryMessage {
            order: BSPLINE_ORDER,
            start_time: self.start_time,
            traj_id: self.traj_id,
            pos_pts: self.control_points.clone(),
            knots: self.knots.clone(),
        }
    }
}

/// Coarse plan from the vehicle to the final goal, produced once per goal.
#[derive(Debug, Clone)]
pub struct GlobalTrajectory {
    pub duration: f64,
    pub position: Arc<dyn Curve>,
}

impl GlobalTrajectory {
    /// Positions at `0, step, 2·step, …` strictly before `duration`.
    pub fn preview(&self, step: f64) -> Vec<Vec3> {
        sample(self.position.as_ref(), self.duration, step, false)
    }
}

fn sample(curve: &dyn Curve, duration: f64, step: f64, include_end: bool) -> Vec<Vec3> {
    if !(step > 0.0) || !(duration >= 0.0) {
        return Vec::new();
    }
    let n = (duration / step).ceil() as usize;
    let mut points: Vec<Vec3> = (0..n).map(|i| curve.evaluate(i as f64 * step)).collect();
    if include_end || n == 0 {
        points.push(curve.evaluate(duration));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StraightCurve, straight_trajectory};

    #[test]
    fn offset_is_clamped_to_duration() {
        let traj = straight_trajectory(1, 10.0, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 4.0);
        assert_eq!(traj.offset(9.0), 0.0);
        assert_eq!(traj.offset(12.0), 2.0);
        assert_eq!(traj.offset(20.0), 4.0);
    }

    #[test]
    fn message_carries_order_id_and_points() {
        let traj = straight_trajectory(42, 3.0, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 2.0);
        let msg = traj.to_message();
        assert_eq!(msg.order, 3);
        assert_eq!(msg.traj_id, 42);
        assert_eq!(msg.start_time, 3.0);
        assert_eq!(msg.pos_pts, traj.control_points);
        assert_eq!(msg.knots.len(), msg.pos_pts.len() + 4);
    }

    #[test]
    fn global_preview_samples_once_per_second() {
        let global = GlobalTrajectory {
            duration: 3.5,
            position: Arc::new(StraightCurve::new(Vec3::zeros(), Vec3::new(2.0, 0.0, 0.0))),
        };
        let points = global.preview(1.0);
        assert_eq!(points.len(), 4);
        assert_eq!(points[3], Vec3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn committed_samples_include_the_end() {
        let traj = straight_trajectory(1, 0.0, Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1.0);
        let points = traj.sample_positions(0.5);
        assert_eq!(points.len(), 3);
        assert_eq!(points.last(), Some(&Vec3::new(1.0, 0.0, 0.0)));
    }
}
