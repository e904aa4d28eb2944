//! The re-planning state machine.
//!
//! ```text
//!  INIT ──(odom ∧ trigger)──▶ WAIT_TARGET ──(goal)──▶ GEN_NEW_TRAJ ──(plan ok)──▶ EXEC_TRAJ
//!                                 ▲                        ▲                        │   ▲
//!                                 └──────(finished)────────┼────────────────────────┘   │
//!                                                          │                 (progress) │ (plan ok)
//!                                                 (at rest)│                        ▼   │
//!                                                  EMERGENCY_STOP            REPLAN_TRAJ
//! ```
//!
//! [`ReplanFsm::exec_tick`] evaluates the guards of the current state only,
//! once per call.  [`ReplanFsm::safety_tick`] runs the collision look-ahead.
//! The two are meant to be driven by independent periodic tasks and
//! synchronise only through the [`SharedContext`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use replan_perception::OccupancyOracle;
use replan_types::{
    DataDisplay, ExecState, Goal, GoalPath, OdometrySnapshot, PlannerError, TransitionTag, Vec3,
    VisualizationMarker,
};

use crate::clock::Clock;
use crate::config::{FlightType, FsmConfig};
use crate::context::SharedContext;
use crate::escalation::EscalationController;
use crate::local_target::LocalTargetSelector;
use crate::optimizer::{KinematicState, PlanningOutput, TrajectoryOptimizer};
use crate::safety_monitor::{SafetyMonitor, SafetyVerdict};

/// Radius of the goal marker (m).
const GOAL_MARKER_RADIUS: f64 = 0.3;
/// Sampling step of the global plan preview (s).
const GLOBAL_PREVIEW_STEP: f64 = 1.0;

pub struct ReplanFsm {
    config: FsmConfig,
    ctx: Arc<SharedContext>,
    escalation: Arc<EscalationController>,
    safety: SafetyMonitor,
    output: Arc<dyn PlanningOutput>,
    clock: Arc<dyn Clock>,
    waypoints: Vec<Vec3>,
    ticks: AtomicU64,
}

impl ReplanFsm {
    pub fn new(
        config: FsmConfig,
        optimizer: Box<dyn TrajectoryOptimizer>,
        oracle: Arc<dyn OccupancyOracle>,
        output: Arc<dyn PlanningOutput>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PlannerError> {
        config.validate()?;

        let ctx = Arc::new(SharedContext::new());
        let selector = LocalTargetSelector::new(config.planning_horizon, config.max_vel, config.max_acc);
        let escalation = Arc::new(EscalationController::new(
            Arc::clone(&ctx),
            optimizer,
            Arc::clone(&output),
            Arc::clone(&clock),
            selector,
            config.random_seed,
        ));
        let safety = SafetyMonitor::new(
            Arc::clone(&ctx),
            Arc::clone(&escalation),
            oracle,
            Arc::clone(&clock),
            config.collision_check_step,
            config.emergency_margin,
        );

        tracing::info!(
            flight_type = %config.flight_type,
            horizon = config.planning_horizon,
            waypoints = config.active_waypoints().len(),
            "replan state machine ready"
        );

        Ok(Self {
            waypoints: config.active_waypoints(),
            config,
            ctx,
            escalation,
            safety,
            output,
            clock,
            ticks: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &FsmConfig {
        &self.config
    }

    pub fn context(&self) -> &Arc<SharedContext> {
        &self.ctx
    }

    pub fn escalation(&self) -> &Arc<EscalationController> {
        &self.escalation
    }

    pub fn state(&self) -> ExecState {
        self.ctx.exec_state()
    }

    // ── inputs ──────────────────────────────────────────────────────────────

    pub fn on_odometry(&self, odom: OdometrySnapshot) {
        self.ctx.update_odometry(odom);
    }

    /// Handle a goal trigger.
    ///
    /// Returns `Ok(false)` when the trigger is ignored because its first pose
    /// lies below the altitude floor, `Ok(true)` when a new goal was accepted.
    pub fn on_goal_trigger(&self, path: &GoalPath) -> Result<bool, PlannerError> {
        let Some(first) = path.poses.first() else {
            tracing::warn!("goal trigger without poses ignored");
            return Err(PlannerError::InvalidGoal("empty pose list".to_string()));
        };
        if first.z < self.config.goal_altitude_floor {
            tracing::warn!(z = first.z, floor = self.config.goal_altitude_floor, "goal trigger below floor ignored");
            return Ok(false);
        }

        self.ctx.mark_triggered();
        let final_point = self.select_goal(first)?;

        let odom = self.ctx.odometry();
        if self.ctx.exec_state() == ExecState::EmergencyStop {
            // The stop still completes first; the goal is stored and picked up
            // once GEN_NEW_TRAJ is re-entered.
            tracing::debug!(goal = ?final_point.as_slice(), "goal received during emergency stop, planning it now");
        }
        let start = KinematicState::moving(odom.position, odom.velocity);
        let Some(global) = self
            .escalation
            .plan_initial(&start, &KinematicState::at_rest(final_point))
        else {
            tracing::warn!(goal = ?final_point.as_slice(), "initial global plan failed");
            return Err(PlannerError::InitialPlanFailure {
                goal: [final_point.x, final_point.y, final_point.z],
            });
        };

        self.output.visualize(VisualizationMarker::GlobalPreview {
            points: global.preview(GLOBAL_PREVIEW_STEP),
        });
        self.output.visualize(VisualizationMarker::Goal {
            position: final_point,
            radius: GOAL_MARKER_RADIUS,
        });

        self.ctx.accept_goal(
            Goal {
                final_point,
                final_velocity: Vec3::zeros(),
            },
            odom.position,
        );
        tracing::info!(goal = ?final_point.as_slice(), global_duration = global.duration, "goal accepted");
        Ok(true)
    }

    fn select_goal(&self, pose: &Vec3) -> Result<Vec3, PlannerError> {
        match self.config.flight_type {
            FlightType::Manual => Ok(Vec3::new(pose.x, pose.y, self.config.manual_altitude)),
            FlightType::Preset => {
                let idx = self.ctx.advance_waypoint(self.waypoints.len());
                self.waypoints
                    .get(idx)
                    .copied()
                    .ok_or_else(|| PlannerError::Config("no preset waypoints".to_string()))
            }
        }
    }

    // ── periodic tasks ──────────────────────────────────────────────────────

    /// One core tick.  Returns the state after the tick.
    pub fn exec_tick(&self) -> ExecState {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.status_log_interval > 0 && tick % self.config.status_log_interval == 0 {
            self.log_status();
        }

        let state = self.ctx.exec_state();
        match state {
            ExecState::Init => {
                if self.ctx.have_odom() && self.ctx.triggered() {
                    self.ctx.transition_if(state, ExecState::WaitTarget, TransitionTag::Fsm);
                }
            }
            ExecState::WaitTarget => {
                if self.ctx.have_target() {
                    self.ctx.transition_if(state, ExecState::GenNewTraj, TransitionTag::Fsm);
                }
            }
            ExecState::GenNewTraj => self.generate_new_trajectory(),
            ExecState::ExecTraj => self.check_progress(),
            ExecState::ReplanTraj => {
                let next = match self.escalation.replan_from_current() {
                    Ok(_) => ExecState::ExecTraj,
                    Err(err) => {
                        tracing::debug!(%err, "replan from current trajectory failed, retrying next tick");
                        ExecState::ReplanTraj
                    }
                };
                self.ctx.transition_if(state, next, TransitionTag::Fsm);
            }
            ExecState::EmergencyStop => self.hold_emergency_stop(),
        }

        self.publish_data_display();
        self.ctx.exec_state()
    }

    pub fn safety_tick(&self) -> SafetyVerdict {
        self.safety.tick()
    }

    fn generate_new_trajectory(&self) {
        let odom = self.ctx.odometry();
        let start = KinematicState::moving(odom.position, odom.velocity);
        let randomize = self.ctx.is_repeat();
        let next = if self.escalation.call_replan(&start, true, randomize).is_some() {
            ExecState::ExecTraj
        } else {
            ExecState::GenNewTraj
        };
        self.ctx.transition_if(ExecState::GenNewTraj, next, TransitionTag::Fsm);
    }

    fn check_progress(&self) {
        let Some(traj) = self.ctx.committed() else {
            tracing::warn!("executing without a committed trajectory");
            self.ctx.transition_if(ExecState::ExecTraj, ExecState::ReplanTraj, TransitionTag::Fsm);
            return;
        };

        let now = self.clock.now();
        if now - traj.start_time >= traj.duration - self.config.finish_epsilon {
            if self.ctx.finish_goal() {
                tracing::info!(traj_id = traj.traj_id, "trajectory finished, waiting for next goal");
            }
            return;
        }

        let pos = traj.position_at(traj.offset(now));
        let near_end = self
            .ctx
            .active_goal()
            .is_some_and(|g| (g.goal.final_point - pos).norm() < self.config.thresh_no_replan);
        if near_end {
            return;
        }
        if (traj.start_pos - pos).norm() < self.config.thresh_replan {
            return;
        }
        self.ctx.transition_if(ExecState::ExecTraj, ExecState::ReplanTraj, TransitionTag::Fsm);
    }

    fn hold_emergency_stop(&self) {
        let odom = self.ctx.odometry();
        if self.ctx.take_stop_pending() {
            let stop = self.escalation.emergency_stop(odom.position);
            tracing::warn!(traj_id = stop.traj_id, position = ?odom.position.as_slice(), "emergency stop issued");
        } else if odom.speed() < self.config.stop_speed_threshold {
            self.ctx.transition_if(ExecState::EmergencyStop, ExecState::GenNewTraj, TransitionTag::Fsm);
        }
    }

    fn publish_data_display(&self) {
        self.output.publish_data_display(DataDisplay {
            stamp: self.clock.now(),
            state: self.ctx.exec_state(),
            transition_count: self.ctx.transition_count(),
            have_odom: self.ctx.have_odom(),
            have_target: self.ctx.have_target(),
        });
    }

    fn log_status(&self) {
        tracing::info!(state = %self.ctx.exec_state(), count = self.ctx.transition_count(), "status");
        if !self.ctx.have_odom() {
            tracing::info!("no odometry");
        }
        if !self.ctx.triggered() {
            tracing::info!("waiting for goal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Harness, SCRIPTED_DURATION};

    fn odom_at(x: f64, y: f64, speed: f64) -> OdometrySnapshot {
        OdometrySnapshot::from_raw([x, y, 1.0], [speed, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0])
    }

    fn trigger(x: f64, y: f64) -> GoalPath {
        GoalPath::single(Vec3::new(x, y, 0.0))
    }

    /// Run until EXEC_TRAJ with the first plan succeeding.
    fn executing(h: &Harness, goal_x: f64) {
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        assert_eq!(h.fsm.on_goal_trigger(&trigger(goal_x, 0.0)), Ok(true));
        h.optimizer.push_outcomes([true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
        assert_eq!(h.fsm.exec_tick(), ExecState::GenNewTraj);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
    }

    #[test]
    fn init_waits_for_odometry_and_trigger() {
        let h = Harness::new();
        assert_eq!(h.fsm.exec_tick(), ExecState::Init);
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        assert_eq!(h.fsm.exec_tick(), ExecState::Init);
        h.fsm.on_goal_trigger(&trigger(5.0, 0.0)).unwrap();
        assert_eq!(h.fsm.state(), ExecState::Init, "trigger alone does not leave INIT");
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
    }

    #[test]
    fn first_plan_is_deterministic_and_reinitialised() {
        let h = Harness::new();
        executing(&h, 20.0);
        let calls = h.optimizer.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].use_new_target);
        assert!(calls[0].force_reinit);
        assert!(!calls[0].randomize);
        assert_eq!(h.output.trajectories().len(), 1);
    }

    #[test]
    fn repeated_gen_attempt_randomizes() {
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.fsm.on_goal_trigger(&trigger(20.0, 0.0)).unwrap();
        h.fsm.exec_tick();
        h.fsm.exec_tick();
        assert_eq!(h.ctx.transition_count(), 1);

        h.optimizer.push_outcomes([false, true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::GenNewTraj);
        assert_eq!(h.ctx.transition_count(), 2);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);

        let calls = h.optimizer.calls();
        assert!(!calls[0].randomize);
        assert!(calls[1].randomize);
        assert!(calls[1].rng_draw.is_some());
    }

    #[test]
    fn manual_goal_uses_fixed_altitude() {
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(1.0, 2.0, 0.0));
        h.fsm.on_goal_trigger(&trigger(8.0, -3.0)).unwrap();
        let active = h.ctx.active_goal().unwrap();
        assert_eq!(active.goal.final_point, Vec3::new(8.0, -3.0, 1.0));
        assert_eq!(active.goal.final_velocity, Vec3::zeros());
        assert_eq!(active.init_point, Vec3::new(1.0, 2.0, 1.0));
        let (start, goal) = h.optimizer.initial_calls()[0];
        assert_eq!(start.position, Vec3::new(1.0, 2.0, 1.0));
        assert_eq!(goal.position, Vec3::new(8.0, -3.0, 1.0));
    }

    #[test]
    fn preset_goals_cycle_through_waypoints() {
        let h = Harness::with_config(FsmConfig {
            flight_type: FlightType::Preset,
            waypoints: vec![[1.0, 0.0, 1.0], [2.0, 0.0, 1.0], [3.0, 0.0, 1.0]],
            waypoint_num: Some(2),
            ..Default::default()
        });
        let mut picked = Vec::new();
        for _ in 0..3 {
            h.fsm.on_goal_trigger(&trigger(99.0, 99.0)).unwrap();
            picked.push(h.ctx.active_goal().unwrap().goal.final_point.x);
        }
        assert_eq!(picked, vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn low_trigger_is_ignored() {
        let h = Harness::new();
        let accepted = h.fsm.on_goal_trigger(&GoalPath::single(Vec3::new(5.0, 0.0, -1.0))).unwrap();
        assert!(!accepted);
        assert!(!h.ctx.triggered());
        assert!(h.optimizer.initial_calls().is_empty());
    }

    #[test]
    fn empty_trigger_is_rejected() {
        let h = Harness::new();
        let err = h.fsm.on_goal_trigger(&GoalPath::default()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidGoal(_)));
    }

    #[test]
    fn initial_plan_failure_keeps_goal_unavailable() {
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.optimizer.push_initial_outcomes([false]);
        let err = h.fsm.on_goal_trigger(&trigger(5.0, 0.0)).unwrap_err();
        assert_eq!(err, PlannerError::InitialPlanFailure { goal: [5.0, 0.0, 1.0] });
        assert!(!h.ctx.have_target());
        assert!(h.output.markers().is_empty());
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
    }

    #[test]
    fn accepted_goal_publishes_preview_and_marker() {
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.fsm.on_goal_trigger(&trigger(10.0, 0.0)).unwrap();
        let markers = h.output.markers();
        assert!(matches!(&markers[0], VisualizationMarker::GlobalPreview { points } if !points.is_empty()));
        assert!(matches!(markers[1], VisualizationMarker::Goal { radius, .. } if radius == 0.3));
    }

    #[test]
    fn finished_trajectory_returns_to_wait() {
        let h = Harness::new();
        executing(&h, 5.0);
        h.clock.set(SCRIPTED_DURATION);
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
        assert!(!h.ctx.have_target());
        // Without a new goal the machine stays idle.
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);
    }

    #[test]
    fn goal_arriving_as_trajectory_finishes_is_planned() {
        let h = Harness::new();
        executing(&h, 5.0);
        h.clock.set(SCRIPTED_DURATION);
        assert_eq!(h.fsm.exec_tick(), ExecState::WaitTarget);

        assert_eq!(h.fsm.on_goal_trigger(&trigger(-5.0, 0.0)), Ok(true));
        assert_eq!(h.fsm.state(), ExecState::GenNewTraj);
        assert!(h.ctx.have_target());

        h.optimizer.push_outcomes([true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
        let last = h.optimizer.calls().pop().unwrap();
        assert!(last.use_new_target);
        assert_eq!(h.ctx.active_goal().unwrap().goal.final_point.x, -5.0);
    }

    #[test]
    fn goal_during_emergency_waits_for_the_stop() {
        let h = Harness::new();
        executing(&h, 20.0);
        h.ctx.change_exec_state(ExecState::EmergencyStop, TransitionTag::Safety);

        assert_eq!(h.fsm.on_goal_trigger(&trigger(-3.0, 0.0)), Ok(true));
        assert_eq!(h.fsm.state(), ExecState::EmergencyStop);
        assert_eq!(h.optimizer.initial_calls().len(), 2);
        assert_eq!(h.ctx.active_goal().unwrap().goal.final_point.x, -3.0);

        assert_eq!(h.fsm.exec_tick(), ExecState::EmergencyStop);
        assert_eq!(h.optimizer.emergency_stops(), 1);
        assert_eq!(h.fsm.exec_tick(), ExecState::GenNewTraj);
        h.optimizer.push_outcomes([true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
        assert!(h.optimizer.calls().last().unwrap().use_new_target);
    }

    #[test]
    fn no_progress_replan_near_start() {
        let h = Harness::new();
        executing(&h, 20.0);
        // 7.5 m over 4 s: after 0.5 s the vehicle is under 1 m from the start.
        h.clock.set(0.5);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
    }

    #[test]
    fn no_progress_replan_near_goal() {
        let h = Harness::with_config(FsmConfig {
            thresh_no_replan: 3.0,
            ..Default::default()
        });
        executing(&h, 5.0);
        // Plan goes straight to the goal; at 2.0 s it is 2.5 m away.
        h.clock.set(2.0);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
    }

    #[test]
    fn progress_triggers_replan_and_back() {
        let h = Harness::new();
        executing(&h, 20.0);
        h.clock.set(2.0);
        assert_eq!(h.fsm.exec_tick(), ExecState::ReplanTraj);

        h.optimizer.push_outcomes([false, false, false]);
        assert_eq!(h.fsm.exec_tick(), ExecState::ReplanTraj);
        assert_eq!(h.ctx.transition_count(), 2);

        h.optimizer.push_outcomes([true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
        let last = h.optimizer.calls().pop().unwrap();
        assert!(!last.force_reinit && !last.randomize);
        assert!((last.start.position - Vec3::new(3.75, 0.0, 1.0)).norm() < 1e-9);
    }

    #[test]
    fn new_goal_while_executing_replans() {
        let h = Harness::new();
        executing(&h, 20.0);
        h.fsm.on_goal_trigger(&trigger(-10.0, 0.0)).unwrap();
        assert_eq!(h.fsm.state(), ExecState::ReplanTraj);
        assert!(h.ctx.have_new_target());
        h.optimizer.push_outcomes([true]);
        assert_eq!(h.fsm.exec_tick(), ExecState::ExecTraj);
        assert!(h.optimizer.calls().last().unwrap().use_new_target);
    }

    #[test]
    fn emergency_stop_is_issued_once_then_waits_for_rest() {
        let h = Harness::new();
        executing(&h, 20.0);
        h.fsm.on_odometry(odom_at(1.0, 0.0, 1.5));
        h.ctx.change_exec_state(ExecState::EmergencyStop, TransitionTag::Safety);

        assert_eq!(h.fsm.exec_tick(), ExecState::EmergencyStop);
        assert_eq!(h.optimizer.emergency_stops(), 1);
        let stop = h.ctx.committed().unwrap();
        assert_eq!(stop.start_pos, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(h.output.trajectories().last().map(|m| m.traj_id), Some(stop.traj_id));

        assert_eq!(h.fsm.exec_tick(), ExecState::EmergencyStop);
        assert_eq!(h.optimizer.emergency_stops(), 1);

        h.fsm.on_odometry(odom_at(1.0, 0.0, 0.05));
        assert_eq!(h.fsm.exec_tick(), ExecState::GenNewTraj);
        assert_eq!(h.ctx.transition_count(), 1);
    }

    #[test]
    fn emergency_blocks_optimizer_calls() {
        let h = Harness::new();
        executing(&h, 20.0);
        h.ctx.change_exec_state(ExecState::EmergencyStop, TransitionTag::Safety);
        let before = h.optimizer.calls().len();
        h.fsm.exec_tick();
        assert_eq!(h.fsm.safety_tick(), SafetyVerdict::Idle);
        assert_eq!(h.optimizer.calls().len(), before);
    }

    #[test]
    fn stale_core_decision_is_dropped() {
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.fsm.on_goal_trigger(&trigger(20.0, 0.0)).unwrap();
        h.fsm.exec_tick();
        h.fsm.exec_tick();
        let ctx = Arc::clone(&h.ctx);
        h.optimizer.set_hook(move || {
            ctx.change_exec_state(ExecState::EmergencyStop, TransitionTag::Safety);
        });
        assert_eq!(h.fsm.exec_tick(), ExecState::EmergencyStop);
    }

    #[test]
    fn data_display_published_every_tick() {
        let h = Harness::new();
        h.fsm.exec_tick();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.fsm.exec_tick();
        let displays = h.output.displays();
        assert_eq!(displays.len(), 2);
        assert!(!displays[0].have_odom);
        assert!(displays[1].have_odom);
        assert_eq!(displays[1].state, ExecState::Init);
    }

    #[test]
    fn transitions_follow_the_table() {
        let allowed = [
            (ExecState::Init, ExecState::WaitTarget),
            (ExecState::WaitTarget, ExecState::GenNewTraj),
            (ExecState::GenNewTraj, ExecState::ExecTraj),
            (ExecState::ExecTraj, ExecState::WaitTarget),
            (ExecState::ExecTraj, ExecState::ReplanTraj),
            (ExecState::ReplanTraj, ExecState::ExecTraj),
        ];
        let h = Harness::new();
        h.fsm.on_odometry(odom_at(0.0, 0.0, 0.0));
        h.fsm.on_goal_trigger(&trigger(12.0, 0.0)).unwrap();
        h.optimizer.push_outcomes([true; 8]);

        let mut prev = h.fsm.state();
        for step in 0..40 {
            h.clock.set(step as f64 * 0.5);
            let next = h.fsm.exec_tick();
            if next != prev {
                assert!(allowed.contains(&(prev, next)), "illegal {prev} -> {next}");
            }
            prev = next;
        }
        assert_eq!(prev, ExecState::WaitTarget);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FsmConfig {
            max_vel: 0.0,
            ..Default::default()
        };
        let clock = Arc::new(crate::clock::ManualClock::new(0.0));
        let result = ReplanFsm::new(
            config,
            Box::new(crate::test_support::ScriptedOptimizer::new(Arc::clone(&clock))),
            Arc::new(crate::test_support::FnOracle(|_: &Vec3| false)),
            Arc::new(crate::optimizer::NullOutput),
            clock,
        );
        assert!(matches!(result, Err(PlannerError::Config(_))));
    }
}
