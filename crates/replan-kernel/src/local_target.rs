//! Bounded-horizon sub-goal selection.
//!
//! The optimizer only ever sees a target at most `horizon` metres away from
//! the start of the plan.  The target is placed where the reference line from
//! the initial trigger point to the goal leaves the horizon sphere around the
//! current start, so successive replans keep following the same line even
//! after the vehicle drifts off it.
//!
//! ```text
//!   init ──────────●──────────────────────── goal
//!              ╲   ↑ local target
//!               ╲  |
//!                start   (sphere radius = horizon)
//! ```

use replan_types::{LocalTarget, Vec3};

const EPS: f64 = 1e-9;

/// Result of a selection.  `degenerate` is set when the reference line
/// misses the horizon sphere and a fallback point was used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTargetSelection {
    pub target: LocalTarget,
    pub degenerate: bool,
}

/// Pure geometric function of its inputs; keeps no state between calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTargetSelector {
    pub horizon: f64,
    pub max_vel: f64,
    pub max_acc: f64,
}

impl LocalTargetSelector {
    pub fn new(horizon: f64, max_vel: f64, max_acc: f64) -> Self {
        Self {
            horizon,
            max_vel,
            max_acc,
        }
    }

    pub fn braking_distance(&self) -> f64 {
        self.max_vel * self.max_vel / (2.0 * self.max_acc)
    }

    /// Sub-goal for a plan starting at `start` towards `goal`, on the line
    /// from `init` (the vehicle position when the goal was issued).
    pub fn select(&self, start: &Vec3, goal: &Vec3, init: &Vec3) -> LocalTargetSelection {
        if (goal - start).norm() <= self.horizon {
            return LocalTargetSelection {
                target: LocalTarget {
                    position: *goal,
                    velocity: Vec3::zeros(),
                },
                degenerate: false,
            };
        }

        let (position, degenerate) = self.intersect(start, goal, init);

        let dist_to_goal = (goal - position).norm();
        let brake = self.braking_distance();
        let speed = if dist_to_goal < brake {
            self.max_vel * dist_to_goal / brake
        } else {
            self.max_vel
        };
        let direction = (goal - init).try_normalize(EPS).unwrap_or_else(Vec3::zeros);

        LocalTargetSelection {
            target: LocalTarget {
                position,
                velocity: direction * speed,
            },
            degenerate,
        }
    }

    /// Forward-most point of the line `init + (goal − init)·t` on the sphere
    /// of radius `horizon` around `start`.
    fn intersect(&self, start: &Vec3, goal: &Vec3, init: &Vec3) -> (Vec3, bool) {
        let n = goal - init;
        let m = init - start;
        let a = n.norm_squared();
        let b = 2.0 * m.dot(&n);
        let c = m.norm_squared() - self.horizon * self.horizon;

        if a < EPS {
            // Goal issued from the goal itself; no line to follow.
            let dir = (goal - start).try_normalize(EPS).unwrap_or_else(Vec3::zeros);
            tracing::warn!(horizon = self.horizon, "reference line has no length, heading straight for the goal");
            return (start + dir * self.horizon, true);
        }

        let disc = b * b - 4.0 * a * c;
        if disc > 0.0 {
            let t = (-b + disc.sqrt()) / (2.0 * a);
            (init + n * t, false)
        } else {
            let t = -b / (2.0 * a);
            tracing::warn!(
                discriminant = disc,
                start = ?start.as_slice(),
                "vehicle far off the reference line, using tangent point as local target"
            );
            (init + n * t, true)
        }
    }
}
