//! A perfect trajectory tracker.

use nalgebra::UnitQuaternion;
use replan_kernel::CommittedTrajectory;
use replan_types::{OdometrySnapshot, Vec3};

/// Simulated vehicle that is always exactly where the committed trajectory
/// says it should be.  Holds its last position, at rest, when there is no
/// trajectory or the trajectory has ended.
#[derive(Debug, Clone)]
pub struct SimVehicle {
    odom: OdometrySnapshot,
}

impl SimVehicle {
    pub fn new(start: Vec3) -> Self {
        Self {
            odom: OdometrySnapshot {
                position: start,
                ..Default::default()
            },
        }
    }

    pub fn odometry(&self) -> OdometrySnapshot {
        self.odom
    }

    /// Advance to time `now` along `traj` and return the new odometry.
    pub fn step(&mut self, traj: Option<&CommittedTrajectory>, now: f64) -> OdometrySnapshot {
        let Some(traj) = traj else {
            self.odom.velocity = Vec3::zeros();
            return self.odom;
        };
        let t = traj.offset(now);
        let velocity = if now - traj.start_time >= traj.duration {
            Vec3::zeros()
        } else {
            traj.velocity_at(t)
        };
        self.odom.position = traj.position_at(t);
        self.odom.velocity = velocity;
        if velocity.xy().norm() > 1e-6 {
            self.odom.orientation = UnitQuaternion::from_euler_angles(0.0, 0.0, velocity.y.atan2(velocity.x));
        }
        self.odom
    }
}
