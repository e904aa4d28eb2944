//! `replan-types` – shared data model of the re-planning stack.
//!
//! Everything that crosses a crate boundary lives here: the execution state
//! enum, latched sensor and goal values, the wire messages published on the
//! event bus, and the single [`PlannerError`] type.

use std::fmt;

use chrono::{DateTime, Utc};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// 3-D vector in the world frame (metres, m/s or m/s² depending on use).
pub type Vec3 = Vector3<f64>;

/// Curve order of every published trajectory.
pub const BSPLINE_ORDER: u32 = 3;

// ────────────────────────────────────────────────────────────────────────────
// Execution state
// ────────────────────────────────────────────────────────────────────────────

/// Active state of the re-planning state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecState {
    /// Waiting for the first odometry sample and the first goal trigger.
    #[default]
    Init,
    /// Idle; no goal is available.
    WaitTarget,
    /// Producing the first trajectory towards a freshly accepted goal.
    GenNewTraj,
    /// Re-planning from the committed trajectory.
    ReplanTraj,
    /// Executing the committed trajectory.
    ExecTraj,
    /// Holding a stationary stop trajectory until the vehicle is at rest.
    EmergencyStop,
}

impl ExecState {
    /// Upper-case name used in logs and debug output.
    pub const fn name(self) -> &'static str {
        match self {
            ExecState::Init => "INIT",
            ExecState::WaitTarget => "WAIT_TARGET",
            ExecState::GenNewTraj => "GEN_NEW_TRAJ",
            ExecState::ReplanTraj => "REPLAN_TRAJ",
            ExecState::ExecTraj => "EXEC_TRAJ",
            ExecState::EmergencyStop => "EMERGENCY_STOP",
        }
    }
}

impl fmt::Display for ExecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Subsystem that requested a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionTag {
    /// The periodic state machine tick.
    Fsm,
    /// The collision look-ahead monitor.
    Safety,
    /// A goal trigger.
    Trig,
}

impl TransitionTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            TransitionTag::Fsm => "FSM",
            TransitionTag::Safety => "SAFETY",
            TransitionTag::Trig => "TRIG",
        }
    }
}

impl fmt::Display for TransitionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Latched inputs
// ────────────────────────────────────────────────────────────────────────────

/// Latest vehicle odometry. Each update overwrites the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OdometrySnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    pub orientation: UnitQuaternion<f64>,
}

impl OdometrySnapshot {
    /// Build a snapshot from raw message fields. The quaternion is given as
    /// `(w, x, y, z)` and normalised.
    pub fn from_raw(position: [f64; 3], velocity: [f64; 3], quat_wxyz: [f64; 4]) -> Self {
        let [w, x, y, z] = quat_wxyz;
        Self {
            position: Vec3::new(position[0], position[1], position[2]),
            velocity: Vec3::new(velocity[0], velocity[1], velocity[2]),
            orientation: UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(w, x, y, z)),
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

impl Default for OdometrySnapshot {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            velocity: Vec3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// Goal trigger as received from an operator or waypoint generator: an
/// ordered list of poses, of which only the first position is used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GoalPath {
    pub poses: Vec<Vec3>,
}

impl GoalPath {
    pub fn single(position: Vec3) -> Self {
        Self {
            poses: vec![position],
        }
    }
}

/// The final goal the vehicle is travelling to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub final_point: Vec3,
    pub final_velocity: Vec3,
}

/// Bounded-horizon sub-goal fed to the optimizer in place of the final goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalTarget {
    pub position: Vec3,
    pub velocity: Vec3,
}

// ────────────────────────────────────────────────────────────────────────────
// Outputs
// ────────────────────────────────────────────────────────────────────────────

/// Trajectory handed to the downstream tracking controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryMessage {
    /// Curve order, always [`BSPLINE_ORDER`].
    pub order: u32,
    /// Start time on the planner clock (seconds).
    pub start_time: f64,
    pub traj_id: u64,
    /// Position control points.
    pub pos_pts: Vec<Vec3>,
    pub knots: Vec<f64>,
}

/// Per-tick debug record of the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataDisplay {
    pub stamp: f64,
    pub state: ExecState,
    pub transition_count: u32,
    pub have_odom: bool,
    pub have_target: bool,
}

/// Best-effort visualization side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisualizationMarker {
    /// Coarse global plan sampled once per second, shown on goal acceptance.
    GlobalPreview { points: Vec<Vec3> },
    /// Freshly committed trajectory, shown after every successful replan.
    CommittedPreview { traj_id: u64, points: Vec<Vec3> },
    /// The accepted goal.
    Goal { position: Vec3, radius: f64 },
}

// ────────────────────────────────────────────────────────────────────────────
// Event envelope
// ────────────────────────────────────────────────────────────────────────────

/// Unified event wrapper for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g. "replan-runtime::output"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp `payload` with a fresh id and the current wall-clock time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Variants of data routed over the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Odometry(OdometrySnapshot),
    GoalTrigger(GoalPath),
    Trajectory(TrajectoryMessage),
    DataDisplay(DataDisplay),
    Visualization(VisualizationMarker),
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Error type shared by every crate of the stack.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("Initial global plan failed towards goal {goal:?}")]
    InitialPlanFailure { goal: [f64; 3] },

    #[error("Replan failed after {attempts} attempt(s)")]
    ReplanFailure { attempts: u8 },

    #[error("Invalid goal trigger: {0}")]
    InvalidGoal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel error: {0}")]
    Channel(String),
}
