//! Stand-in for the numerical trajectory optimizer.
//!
//! Plans a straight line to the target at the velocity limit.  When the line
//! is blocked:
//!
//! * a warm start re-uses the detour of the previous solution if it is still
//!   collision free;
//! * a randomized call samples lateral detour points from the supplied rng;
//! * anything else fails, the way a local optimizer stuck in a bad basin
//!   would.

use std::sync::Arc;

use rand::{Rng, RngCore};
use replan_kernel::{
    Clock, CommittedTrajectory, GlobalTrajectory, KinematicState, ReplanRequest, TrajectoryOptimizer,
};
use replan_perception::OccupancyOracle;
use replan_types::Vec3;

use crate::polyline::{ConstantCurve, Polyline, PositionCurve, VelocityCurve};

/// Duration of the stationary stop trajectory (s).
const STOP_DURATION: f64 = 1.0;

pub struct SimOptimizer {
    oracle: Arc<dyn OccupancyOracle>,
    clock: Arc<dyn Clock>,
    max_vel: f64,
    /// Spatial step of segment collision checks (m).
    check_resolution: f64,
    detour_attempts: usize,
    detour_radius: f64,
    /// Detour vertex of the last solution, relative to its segment midpoint.
    warm_offset: Option<Vec3>,
    next_id: u64,
}

impl SimOptimizer {
    pub fn new(oracle: Arc<dyn OccupancyOracle>, clock: Arc<dyn Clock>, max_vel: f64) -> Self {
        Self {
            oracle,
            clock,
            max_vel,
            check_resolution: 0.05,
            detour_attempts: 32,
            detour_radius: 3.0,
            warm_offset: None,
            next_id: 0,
        }
    }

    fn segment_free(&self, a: &Vec3, b: &Vec3) -> bool {
        let steps = ((b - a).norm() / self.check_resolution).ceil().max(1.0) as usize;
        (0..=steps).all(|i| {
            let p = a + (b - a) * (i as f64 / steps as f64);
            !self.oracle.is_occupied(&p)
        })
    }

    fn path_free(&self, points: &[Vec3]) -> bool {
        points.windows(2).all(|w| self.segment_free(&w[0], &w[1]))
    }

    fn via(start: &Vec3, target: &Vec3, offset: &Vec3) -> Vec<Vec3> {
        let mid = (start + target) * 0.5 + offset;
        vec![*start, mid, *target]
    }

    fn random_offset(&self, rng: &mut dyn RngCore, start: &Vec3, target: &Vec3) -> Vec3 {
        let r = self.detour_radius;
        let along = (target - start).try_normalize(1e-9).unwrap_or_else(Vec3::x);
        let raw = Vec3::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r), rng.gen_range(-r / 2.0..=r / 2.0));
        // Keep only the lateral part so the detour does not double back.
        raw - along * raw.dot(&along)
    }

    fn build(&mut self, points: Vec<Vec3>) -> CommittedTrajectory {
        self.next_id += 1;
        let line = Arc::new(Polyline::through(points, self.max_vel));
        CommittedTrajectory {
            start_time: self.clock.now(),
            duration: line.duration(),
            traj_id: self.next_id,
            start_pos: line.position(0.0),
            position: Arc::new(PositionCurve(Arc::clone(&line))),
            velocity: Arc::new(VelocityCurve(Arc::clone(&line))),
            acceleration: Arc::new(ConstantCurve(Vec3::zeros())),
            control_points: line.points().to_vec(),
            knots: line.knots(),
        }
    }
}

impl TrajectoryOptimizer for SimOptimizer {
    fn plan_initial(&mut self, start: &KinematicState, goal: &KinematicState) -> Option<GlobalTrajectory> {
        let line = Arc::new(Polyline::through(vec![start.position, goal.position], self.max_vel));
        tracing::debug!(length = line.length(), "sim global plan");
        Some(GlobalTrajectory {
            duration: line.duration(),
            position: Arc::new(PositionCurve(line)),
        })
    }

    fn replan(&mut self, request: &ReplanRequest, rng: &mut dyn RngCore) -> Option<CommittedTrajectory> {
        let start = request.start.position;
        let target = request.target.position;
        if request.reinitialize() {
            self.warm_offset = None;
        }

        let straight = vec![start, target];
        if self.path_free(&straight) {
            self.warm_offset = None;
            return Some(self.build(straight));
        }

        if let Some(offset) = self.warm_offset {
            let path = Self::via(&start, &target, &offset);
            if self.path_free(&path) {
                return Some(self.build(path));
            }
        }

        if request.randomize {
            for _ in 0..self.detour_attempts {
                let offset = self.random_offset(rng, &start, &target);
                let path = Self::via(&start, &target, &offset);
                if self.path_free(&path) {
                    tracing::debug!(offset = ?offset.as_slice(), "sim detour found");
                    self.warm_offset = Some(offset);
                    return Some(self.build(path));
                }
            }
        }

        tracing::debug!(
            randomize = request.randomize,
            force_reinit = request.force_reinit,
            "sim optimizer found no collision-free path"
        );
        None
    }

    fn emergency_stop(&mut self, position: Vec3) -> CommittedTrajectory {
        self.next_id += 1;
        self.warm_offset = None;
        CommittedTrajectory {
            start_time: self.clock.now(),
            duration: STOP_DURATION,
            traj_id: self.next_id,
            start_pos: position,
            position: Arc::new(ConstantCurve(position)),
            velocity: Arc::new(ConstantCurve(Vec3::zeros())),
            acceleration: Arc::new(ConstantCurve(Vec3::zeros())),
            control_points: vec![position; 4],
            knots: vec![0.0, 0.0, 0.0, 0.0, STOP_DURATION, STOP_DURATION, STOP_DURATION, STOP_DURATION],
        }
    }
}
