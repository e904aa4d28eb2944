//! Shared context of the two periodic tasks.
//!
//! | Field | Written by | Discipline |
//! |---|---|---|
//! | exec state, transition counter, stop flag | core, safety monitor, goal trigger | one mutex, short critical sections |
//! | committed trajectory | escalation controller, emergency stop | `Arc` swap under a write lock |
//! | odometry | odometry ingestion only | last write wins |
//! | goal, initial trigger point, target flags | goal trigger, core (completion), escalation (`have_new_target`) | one mutex |
//!
//! When both the exec and the goal lock are needed they are taken in that
//! order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use replan_types::{ExecState, Goal, OdometrySnapshot, TransitionTag, Vec3};

use crate::trajectory::CommittedTrajectory;
use crate::transition_counter::TransitionCounter;

#[derive(Debug, Default)]
struct ExecCell {
    state: ExecState,
    counter: TransitionCounter,
    /// Armed on entry into EMERGENCY_STOP, consumed when the stop trajectory
    /// is issued.
    stop_pending: bool,
}

impl ExecCell {
    fn apply(&mut self, next: ExecState, tag: TransitionTag) -> u32 {
        let prev = self.state;
        let count = self.counter.record(prev, next);
        if next == ExecState::EmergencyStop && prev != ExecState::EmergencyStop {
            self.stop_pending = true;
        }
        self.state = next;
        if prev == next {
            tracing::debug!(%tag, state = %next, count, "exec state repeated");
        } else {
            tracing::info!(%tag, from = %prev, to = %next, "exec state transition");
        }
        count
    }
}

#[derive(Debug)]
struct GoalState {
    goal: Option<Goal>,
    init_point: Vec3,
    have_target: bool,
    have_new_target: bool,
    triggered: bool,
    next_waypoint: usize,
}

impl Default for GoalState {
    fn default() -> Self {
        Self {
            goal: None,
            init_point: Vec3::zeros(),
            have_target: false,
            have_new_target: false,
            triggered: false,
            next_waypoint: 0,
        }
    }
}

/// Goal together with the reference point it was issued from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveGoal {
    pub goal: Goal,
    /// Vehicle position when the goal was accepted.
    pub init_point: Vec3,
}

/// State shared by the core tick, the safety tick and the input handlers.
#[derive(Debug, Default)]
pub struct SharedContext {
    exec: Mutex<ExecCell>,
    trajectory: RwLock<Option<Arc<CommittedTrajectory>>>,
    odometry: RwLock<OdometrySnapshot>,
    have_odom: AtomicBool,
    goal: Mutex<GoalState>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ── exec state ──────────────────────────────────────────────────────────

    pub fn exec_state(&self) -> ExecState {
        lock(&self.exec).state
    }

    pub fn transition_count(&self) -> u32 {
        lock(&self.exec).counter.count()
    }

    /// True once the current state has been entered at least twice in a row.
    pub fn is_repeat(&self) -> bool {
        lock(&self.exec).counter.is_repeat()
    }

    /// Unconditionally move to `next`, returning the updated transition count.
    pub fn change_exec_state(&self, next: ExecState, tag: TransitionTag) -> u32 {
        lock(&self.exec).apply(next, tag)
    }

    /// Move to `next` only if the state is still `expected`.
    pub fn transition_if(&self, expected: ExecState, next: ExecState, tag: TransitionTag) -> bool {
        let mut exec = lock(&self.exec);
        if exec.state != expected {
            tracing::debug!(%tag, expected = %expected, actual = %exec.state, wanted = %next,
                "stale transition dropped");
            return false;
        }
        exec.apply(next, tag);
        true
    }

    /// Move to `next` only while a trajectory is being planned or flown.
    ///
    /// Used by the safety monitor, which must neither revive a finished goal
    /// nor step out of an emergency stop.
    pub fn transition_if_active(&self, next: ExecState, tag: TransitionTag) -> bool {
        let mut exec = lock(&self.exec);
        match exec.state {
            ExecState::GenNewTraj | ExecState::ReplanTraj | ExecState::ExecTraj => {
                exec.apply(next, tag);
                true
            }
            other => {
                tracing::debug!(%tag, state = %other, wanted = %next, "transition skipped, no active trajectory");
                false
            }
        }
    }

    /// Consume the one-shot emergency stop request.
    pub fn take_stop_pending(&self) -> bool {
        std::mem::take(&mut lock(&self.exec).stop_pending)
    }

    // ── committed trajectory ────────────────────────────────────────────────

    pub fn committed(&self) -> Option<Arc<CommittedTrajectory>> {
        self.trajectory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the committed trajectory wholesale.
    pub fn commit(&self, traj: CommittedTrajectory) -> Arc<CommittedTrajectory> {
        let traj = Arc::new(traj);
        *self.trajectory.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&traj));
        traj
    }

    // ── odometry ────────────────────────────────────────────────────────────

    pub fn update_odometry(&self, odom: OdometrySnapshot) {
        *self.odometry.write().unwrap_or_else(PoisonError::into_inner) = odom;
        self.have_odom.store(true, Ordering::Release);
    }

    pub fn odometry(&self) -> OdometrySnapshot {
        *self.odometry.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn have_odom(&self) -> bool {
        self.have_odom.load(Ordering::Acquire)
    }

    // ── goal ────────────────────────────────────────────────────────────────

    pub fn mark_triggered(&self) {
        lock(&self.goal).triggered = true;
    }

    pub fn triggered(&self) -> bool {
        lock(&self.goal).triggered
    }

    pub fn have_target(&self) -> bool {
        lock(&self.goal).have_target
    }

    pub fn have_new_target(&self) -> bool {
        lock(&self.goal).have_new_target
    }

    /// The current goal, if one is available.
    pub fn active_goal(&self) -> Option<ActiveGoal> {
        let g = lock(&self.goal);
        match (g.have_target, g.goal) {
            (true, Some(goal)) => Some(ActiveGoal {
                goal,
                init_point: g.init_point,
            }),
            _ => None,
        }
    }

    /// Install a freshly planned goal, set both target flags and apply the
    /// trigger-side transition: WAIT_TARGET → GEN_NEW_TRAJ or
    /// EXEC_TRAJ → REPLAN_TRAJ.  Other states pick the new goal up on their
    /// own and yield `None`.
    ///
    /// Install and transition share one critical section, so a concurrent
    /// [`finish_goal`](Self::finish_goal) lands either wholly before (the
    /// goal then leaves WAIT_TARGET) or wholly after (it then sees
    /// REPLAN_TRAJ and does nothing).
    pub fn accept_goal(&self, goal: Goal, init_point: Vec3) -> Option<ExecState> {
        let mut exec = lock(&self.exec);
        {
            let mut g = lock(&self.goal);
            g.goal = Some(goal);
            g.init_point = init_point;
            g.have_target = true;
            g.have_new_target = true;
        }
        let next = match exec.state {
            ExecState::WaitTarget => ExecState::GenNewTraj,
            ExecState::ExecTraj => ExecState::ReplanTraj,
            _ => return None,
        };
        exec.apply(next, TransitionTag::Trig);
        Some(next)
    }

    /// Read and clear the one-shot new-target flag.
    pub fn take_new_target(&self) -> bool {
        std::mem::take(&mut lock(&self.goal).have_new_target)
    }

    /// Index of the preset waypoint to use next, advancing the cyclic cursor.
    pub fn advance_waypoint(&self, len: usize) -> usize {
        let mut g = lock(&self.goal);
        let idx = if len == 0 { 0 } else { g.next_waypoint % len };
        g.next_waypoint = if len == 0 { 0 } else { (idx + 1) % len };
        idx
    }

    /// EXEC_TRAJ → WAIT_TARGET with `have_target` cleared in the same
    /// critical section.  Returns `false` if the state moved on meanwhile.
    pub fn finish_goal(&self) -> bool {
        let mut exec = lock(&self.exec);
        if exec.state != ExecState::ExecTraj {
            return false;
        }
        lock(&self.goal).have_target = false;
        exec.apply(ExecState::WaitTarget, TransitionTag::Fsm);
        true
    }
}
