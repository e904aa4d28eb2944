//! Tunables of the re-planning state machine.

use std::time::Duration;

use replan_types::{PlannerError, Vec3};
use serde::{Deserialize, Serialize};

/// How goal triggers are turned into goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightType {
    /// Use the trigger's x/y at a fixed altitude.
    #[default]
    Manual,
    /// Ignore the trigger's position and cycle through configured waypoints.
    Preset,
}

impl std::fmt::Display for FlightType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightType::Manual => write!(f, "manual"),
            FlightType::Preset => write!(f, "preset"),
        }
    }
}

/// State machine configuration, usually the `[fsm]` table of the config file.
///
/// Every field has a default so partial tables deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsmConfig {
    pub flight_type: FlightType,
    /// No progress replan while the vehicle is this close to the trajectory
    /// start (m).
    pub thresh_replan: f64,
    /// No progress replan while the vehicle is this close to the goal (m).
    pub thresh_no_replan: f64,
    /// Radius of the local target sphere (m).
    pub planning_horizon: f64,
    /// Optimizer time horizon (s).  Kept in the file for the trajectory
    /// optimizer's own configuration; the decision layer never reads it.
    pub planning_horizon_time: f64,
    /// Preset goals, visited in order and wrapped.
    pub waypoints: Vec<[f64; 3]>,
    /// Use only the first `waypoint_num` waypoints when set.
    pub waypoint_num: Option<usize>,
    /// Velocity limit of the optimizer (m/s).
    pub max_vel: f64,
    /// Acceleration limit of the optimizer (m/s²).
    pub max_acc: f64,
    pub exec_period_ms: u64,
    pub safety_period_ms: u64,
    /// Collisions closer than this (s) with no alternative plan trigger an
    /// emergency stop.
    pub emergency_margin: f64,
    /// Sampling step of the collision look-ahead (s).
    pub collision_check_step: f64,
    /// Speed under which an emergency stop is considered complete (m/s).
    pub stop_speed_threshold: f64,
    /// A trajectory is finished once fewer than this many seconds remain.
    pub finish_epsilon: f64,
    /// Altitude of goals in manual mode (m).
    pub manual_altitude: f64,
    /// Triggers whose first pose is below this altitude are ignored (m).
    pub goal_altitude_floor: f64,
    /// Seed of the randomized re-initialisation source; entropy when unset.
    pub random_seed: Option<u64>,
    /// Core ticks between two status log lines.
    pub status_log_interval: u64,
}

impl Default for FsmConfig {
    fn default() -> Self {
        Self {
            flight_type: FlightType::Manual,
            thresh_replan: 1.5,
            thresh_no_replan: 2.0,
            planning_horizon: 7.5,
            planning_horizon_time: 3.0,
            waypoints: Vec::new(),
            waypoint_num: None,
            max_vel: 2.0,
            max_acc: 3.0,
            exec_period_ms: 10,
            safety_period_ms: 50,
            emergency_margin: 0.8,
            collision_check_step: 0.01,
            stop_speed_threshold: 0.1,
            finish_epsilon: 1e-2,
            manual_altitude: 1.0,
            goal_altitude_floor: -0.1,
            random_seed: None,
            status_log_interval: 100,
        }
    }
}

impl FsmConfig {
    /// Reject configurations the state machine cannot run with.
    pub fn validate(&self) -> Result<(), PlannerError> {
        let positive = [
            ("planning_horizon", self.planning_horizon),
            ("max_vel", self.max_vel),
            ("max_acc", self.max_acc),
            ("collision_check_step", self.collision_check_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(PlannerError::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.exec_period_ms == 0 || self.safety_period_ms == 0 {
            return Err(PlannerError::Config("tick periods must be non-zero".to_string()));
        }
        if let Some(n) = self.waypoint_num
            && n > self.waypoints.len()
        {
            return Err(PlannerError::Config(format!(
                "waypoint_num {n} exceeds the {} configured waypoints",
                self.waypoints.len()
            )));
        }
        if self.flight_type == FlightType::Preset && self.active_waypoints().is_empty() {
            return Err(PlannerError::Config(
                "preset flight type requires at least one waypoint".to_string(),
            ));
        }
        Ok(())
    }

    /// The waypoints cycled through in preset mode.
    pub fn active_waypoints(&self) -> Vec<Vec3> {
        let n = self.waypoint_num.unwrap_or(self.waypoints.len()).min(self.waypoints.len());
        self.waypoints[..n]
            .iter()
            .map(|w| Vec3::new(w[0], w[1], w[2]))
            .collect()
    }

    pub fn exec_period(&self) -> Duration {
        Duration::from_millis(self.exec_period_ms)
    }

    pub fn safety_period(&self) -> Duration {
        Duration::from_millis(self.safety_period_ms)
    }
}
