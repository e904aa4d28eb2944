//! Scripted collaborators for the kernel's unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::RngCore;
use replan_perception::OccupancyOracle;
use replan_types::{DataDisplay, LocalTarget, TrajectoryMessage, Vec3, VisualizationMarker};

use crate::clock::{Clock, ManualClock};
use crate::config::FsmConfig;
use crate::context::SharedContext;
use crate::escalation::EscalationController;
use crate::fsm::ReplanFsm;
use crate::optimizer::{KinematicState, PlanningOutput, ReplanRequest, TrajectoryOptimizer};
use crate::safety_monitor::SafetyMonitor;
use crate::trajectory::{CommittedTrajectory, Curve, GlobalTrajectory};

/// Time given to every scripted local plan (s).
pub const SCRIPTED_DURATION: f64 = 4.0;

/// `origin + slope · t`.
#[derive(Debug, Clone, Copy)]
pub struct StraightCurve {
    origin: Vec3,
    slope: Vec3,
}

impl StraightCurve {
    pub fn new(origin: Vec3, slope: Vec3) -> Self {
        Self { origin, slope }
    }
}

impl Curve for StraightCurve {
    fn evaluate(&self, t: f64) -> Vec3 {
        self.origin + self.slope * t
    }
}

/// Constant-velocity trajectory from `from`.
pub fn straight_trajectory(
    traj_id: u64,
    start_time: f64,
    from: Vec3,
    velocity: Vec3,
    duration: f64,
) -> CommittedTrajectory {
    let control_points = (0..4)
        .map(|k| from + velocity * (duration * k as f64 / 3.0))
        .collect();
    let knots = (0..8).map(|k| k as f64 * duration / 7.0).collect();
    CommittedTrajectory {
        start_time,
        duration,
        traj_id,
        start_pos: from,
        position: Arc::new(StraightCurve::new(from, velocity)),
        velocity: Arc::new(StraightCurve::new(velocity, Vec3::zeros())),
        acceleration: Arc::new(StraightCurve::new(Vec3::zeros(), Vec3::zeros())),
        control_points,
        knots,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ScriptedOptimizer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedCall {
    pub start: KinematicState,
    pub target: LocalTarget,
    pub use_new_target: bool,
    pub force_reinit: bool,
    pub randomize: bool,
    /// First value drawn from the supplied rng on randomized calls.
    pub rng_draw: Option<u64>,
}

type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Script {
    outcomes: VecDeque<bool>,
    initial_outcomes: VecDeque<bool>,
    calls: Vec<RecordedCall>,
    initial_calls: Vec<(KinematicState, KinematicState)>,
    emergency_stops: usize,
    next_id: u64,
    hook: Option<Hook>,
}

/// Optimizer whose successes and failures are queued up front.  Replans fail
/// once the queue runs dry; initial plans succeed.
#[derive(Clone)]
pub struct ScriptedOptimizer {
    script: Arc<Mutex<Script>>,
    clock: Arc<ManualClock>,
}

impl ScriptedOptimizer {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                next_id: 100,
                ..Default::default()
            })),
            clock,
        }
    }

    pub fn push_outcomes<I: IntoIterator<Item = bool>>(&self, outcomes: I) {
        self.script.lock().unwrap().outcomes.extend(outcomes);
    }

    pub fn push_initial_outcomes<I: IntoIterator<Item = bool>>(&self, outcomes: I) {
        self.script.lock().unwrap().initial_outcomes.extend(outcomes);
    }

    /// Run `hook` inside every replan call, before it returns.
    pub fn set_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.script.lock().unwrap().hook = Some(Arc::new(hook));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn initial_calls(&self) -> Vec<(KinematicState, KinematicState)> {
        self.script.lock().unwrap().initial_calls.clone()
    }

    pub fn emergency_stops(&self) -> usize {
        self.script.lock().unwrap().emergency_stops
    }

    fn next_id(script: &mut Script) -> u64 {
        script.next_id += 1;
        script.next_id
    }
}

impl TrajectoryOptimizer for ScriptedOptimizer {
    fn plan_initial(&mut self, start: &KinematicState, goal: &KinematicState) -> Option<GlobalTrajectory> {
        let mut script = self.script.lock().unwrap();
        script.initial_calls.push((*start, *goal));
        if !script.initial_outcomes.pop_front().unwrap_or(true) {
            return None;
        }
        let duration = ((goal.position - start.position).norm() / 2.0).max(1.0);
        Some(GlobalTrajectory {
            duration,
            position: Arc::new(StraightCurve::new(
                start.position,
                (goal.position - start.position) / duration,
            )),
        })
    }

    fn replan(&mut self, request: &ReplanRequest, rng: &mut dyn RngCore) -> Option<CommittedTrajectory> {
        let hook = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(RecordedCall {
                start: request.start,
                target: request.target,
                use_new_target: request.use_new_target,
                force_reinit: request.force_reinit,
                randomize: request.randomize,
                rng_draw: request.randomize.then(|| rng.next_u64()),
            });
            script.hook.clone()
        };
        if let Some(hook) = hook {
            hook();
        }

        let mut script = self.script.lock().unwrap();
        if !script.outcomes.pop_front().unwrap_or(false) {
            return None;
        }
        let id = Self::next_id(&mut script);
        let velocity = (request.target.position - request.start.position) / SCRIPTED_DURATION;
        Some(straight_trajectory(
            id,
            self.clock.now(),
            request.start.position,
            velocity,
            SCRIPTED_DURATION,
        ))
    }

    fn emergency_stop(&mut self, position: Vec3) -> CommittedTrajectory {
        let mut script = self.script.lock().unwrap();
        script.emergency_stops += 1;
        let id = Self::next_id(&mut script);
        straight_trajectory(id, self.clock.now(), position, Vec3::zeros(), 1.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output and oracle
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingOutput {
    trajectories: Mutex<Vec<TrajectoryMessage>>,
    displays: Mutex<Vec<DataDisplay>>,
    markers: Mutex<Vec<VisualizationMarker>>,
}

impl RecordingOutput {
    pub fn trajectories(&self) -> Vec<TrajectoryMessage> {
        self.trajectories.lock().unwrap().clone()
    }

    pub fn displays(&self) -> Vec<DataDisplay> {
        self.displays.lock().unwrap().clone()
    }

    pub fn markers(&self) -> Vec<VisualizationMarker> {
        self.markers.lock().unwrap().clone()
    }

    pub fn previews(&self) -> usize {
        self.markers()
            .iter()
            .filter(|m| matches!(m, VisualizationMarker::CommittedPreview { .. }))
            .count()
    }
}

impl PlanningOutput for RecordingOutput {
    fn publish_trajectory(&self, msg: TrajectoryMessage) {
        self.trajectories.lock().unwrap().push(msg);
    }

    fn publish_data_display(&self, msg: DataDisplay) {
        self.displays.lock().unwrap().push(msg);
    }

    fn visualize(&self, marker: VisualizationMarker) {
        self.markers.lock().unwrap().push(marker);
    }
}

pub struct FnOracle<F>(pub F);

impl<F: Fn(&Vec3) -> bool + Send + Sync> OccupancyOracle for FnOracle<F> {
    fn is_occupied(&self, point: &Vec3) -> bool {
        (self.0)(point)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Harness
// ────────────────────────────────────────────────────────────────────────────

/// A [`ReplanFsm`] wired to scripted collaborators, with handles on each.
pub struct Harness {
    pub config: FsmConfig,
    pub fsm: ReplanFsm,
    pub ctx: Arc<SharedContext>,
    pub escalation: Arc<EscalationController>,
    pub safety: SafetyMonitor,
    pub clock: Arc<ManualClock>,
    pub optimizer: ScriptedOptimizer,
    pub output: Arc<RecordingOutput>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(FsmConfig::default(), Arc::new(FnOracle(|_: &Vec3| false)))
    }

    pub fn with_seed(seed: u64) -> Self {
        let config = FsmConfig {
            random_seed: Some(seed),
            ..Default::default()
        };
        Self::build(config, Arc::new(FnOracle(|_: &Vec3| false)))
    }

    pub fn with_oracle<F: Fn(&Vec3) -> bool + Send + Sync + 'static>(f: F) -> Self {
        Self::build(FsmConfig::default(), Arc::new(FnOracle(f)))
    }

    pub fn with_config(config: FsmConfig) -> Self {
        Self::build(config, Arc::new(FnOracle(|_: &Vec3| false)))
    }

    pub fn build(config: FsmConfig, oracle: Arc<dyn OccupancyOracle>) -> Self {
        let clock = Arc::new(ManualClock::new(0.0));
        let optimizer = ScriptedOptimizer::new(Arc::clone(&clock));
        let output = Arc::new(RecordingOutput::default());
        let fsm = ReplanFsm::new(
            config.clone(),
            Box::new(optimizer.clone()),
            Arc::clone(&oracle),
            output.clone(),
            clock.clone(),
        )
        .expect("test config is valid");
        let ctx = Arc::clone(fsm.context());
        let escalation = Arc::clone(fsm.escalation());
        let safety = SafetyMonitor::new(
            Arc::clone(&ctx),
            Arc::clone(&escalation),
            oracle,
            clock.clone(),
            config.collision_check_step,
            config.emergency_margin,
        );
        Self {
            config,
            fsm,
            ctx,
            escalation,
            safety,
            clock,
            optimizer,
            output,
        }
    }
}
