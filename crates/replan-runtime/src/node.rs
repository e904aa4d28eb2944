//! The planner node: periodic ticks and input ingestion as Tokio tasks.
//!
//! ```text
//!   Topic::Odometry ──► odometry task ──► ReplanFsm::on_odometry
//!   Topic::Goals    ──► goal task ─────► ReplanFsm::on_goal_trigger  (blocking pool)
//!   interval(exec)  ──► core task ─────► ReplanFsm::exec_tick        (blocking pool)
//!   interval(safe)  ──► safety task ───► ReplanFsm::safety_tick      (blocking pool)
//! ```
//!
//! Every task exits when the shutdown watch flips to `true` or its sender is
//! dropped.

use std::sync::Arc;
use std::time::Duration;

use replan_kernel::{ReplanFsm, SafetyVerdict};
use replan_middleware::{EventBus, Topic, TopicReceiver};
use replan_types::EventPayload;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

pub struct PlannerNode {
    fsm: Arc<ReplanFsm>,
    bus: EventBus,
}

/// Join handles of the spawned node tasks.
pub struct NodeHandles {
    handles: Vec<JoinHandle<()>>,
}

impl NodeHandles {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait for every task to finish.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "planner task panicked");
            }
        }
    }
}

impl PlannerNode {
    pub fn new(fsm: ReplanFsm, bus: EventBus) -> Self {
        Self {
            fsm: Arc::new(fsm),
            bus,
        }
    }

    pub fn fsm(&self) -> &Arc<ReplanFsm> {
        &self.fsm
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Spawn the four node tasks on the current runtime.
    ///
    /// Input subscriptions are taken before this returns, so events published
    /// afterwards are never missed.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> NodeHandles {
        let config = self.fsm.config();
        info!(
            exec_ms = config.exec_period_ms,
            safety_ms = config.safety_period_ms,
            "planner node starting"
        );

        let odometry = self.bus.subscribe_to(Topic::Odometry);
        let goals = self.bus.subscribe_to(Topic::Goals);

        let handles = vec![
            tokio::spawn(core_loop(Arc::clone(&self.fsm), config.exec_period(), shutdown.clone())),
            tokio::spawn(safety_loop(Arc::clone(&self.fsm), config.safety_period(), shutdown.clone())),
            tokio::spawn(odometry_loop(Arc::clone(&self.fsm), odometry, shutdown.clone())),
            tokio::spawn(goal_loop(Arc::clone(&self.fsm), goals, shutdown)),
        ];
        NodeHandles { handles }
    }
}

async fn core_loop(fsm: Arc<ReplanFsm>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fsm = Arc::clone(&fsm);
                if let Err(e) = tokio::task::spawn_blocking(move || fsm.exec_tick()).await {
                    error!(error = %e, "core tick failed");
                }
            }
            _ = stopped(&mut shutdown) => break,
        }
    }
    debug!("core task stopped");
}

async fn safety_loop(fsm: Arc<ReplanFsm>, period: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fsm = Arc::clone(&fsm);
                match tokio::task::spawn_blocking(move || fsm.safety_tick()).await {
                    Ok(SafetyVerdict::Idle | SafetyVerdict::Clear) => {}
                    Ok(verdict) => debug!(%verdict, "safety tick"),
                    Err(e) => error!(error = %e, "safety tick failed"),
                }
            }
            _ = stopped(&mut shutdown) => break,
        }
    }
    debug!("safety task stopped");
}

async fn odometry_loop(fsm: Arc<ReplanFsm>, mut rx: TopicReceiver, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            event = rx.next_event() => match event {
                Some(event) => match event.payload {
                    EventPayload::Odometry(odom) => fsm.on_odometry(odom),
                    other => warn!(?other, "unexpected payload on odometry topic"),
                },
                None => break,
            },
            _ = stopped(&mut shutdown) => break,
        }
    }
    debug!("odometry task stopped");
}

async fn goal_loop(fsm: Arc<ReplanFsm>, mut rx: TopicReceiver, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            event = rx.next_event() => {
                let Some(event) = event else { break };
                let EventPayload::GoalTrigger(path) = event.payload else {
                    warn!(source = %event.source, "unexpected payload on goal topic");
                    continue;
                };
                let fsm = Arc::clone(&fsm);
                match tokio::task::spawn_blocking(move || fsm.on_goal_trigger(&path)).await {
                    Ok(Ok(true)) => info!(source = %event.source, "goal accepted"),
                    Ok(Ok(false)) => debug!(source = %event.source, "goal ignored"),
                    Ok(Err(e)) => warn!(error = %e, "goal rejected"),
                    Err(e) => error!(error = %e, "goal handler failed"),
                }
            }
            _ = stopped(&mut shutdown) => break,
        }
    }
    debug!("goal task stopped");
}

/// Resolves once shutdown is requested or the sender is gone.
async fn stopped(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|&stop| stop).await.is_err() {
        debug!("shutdown sender dropped");
    }
}
