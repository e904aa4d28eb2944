//! [`TransitionCounter`] – consecutive-repeat counter for exec-state
//! transitions.
//!
//! Every transition the state machine resolves, including "stay where you
//! are" decisions such as a failed first plan, is recorded here.  The count
//! tells a first attempt (`1`) apart from a retry (`≥ 2`), which is what the
//! GEN_NEW_TRAJ handler uses to decide whether the optimizer should
//! randomize its initial guess.
//!
//! # Example
//!
//! ```rust
//! use replan_kernel::transition_counter::TransitionCounter;
//! use replan_types::ExecState;
//!
//! let mut counter = TransitionCounter::new();
//!
//! assert_eq!(counter.record(ExecState::WaitTarget, ExecState::GenNewTraj), 1);
//! assert_eq!(counter.record(ExecState::GenNewTraj, ExecState::GenNewTraj), 2);
//! assert_eq!(counter.record(ExecState::GenNewTraj, ExecState::ExecTraj), 1);
//! ```

use replan_types::ExecState;

// ─────────────────────────────────────────────────────────────────────────────
// TransitionCounter
// ─────────────────────────────────────────────────────────────────────────────

/// Number of consecutive transitions that resolved to the same state.
///
/// Starts at `0` before the first transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionCounter {
    count: u32,
}

impl TransitionCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transition from `prev` to `next` and return the new count.
    ///
    /// A self-transition increments the count; any state change resets it
    /// to `1`.
    pub fn record(&mut self, prev: ExecState, next: ExecState) -> u32 {
        self.count = if prev == next {
            self.count.saturating_add(1)
        } else {
            1
        };
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// `true` once the current state has been re-entered at least once.
    pub fn is_repeat(&self) -> bool {
        self.count >= 2
    }
}
