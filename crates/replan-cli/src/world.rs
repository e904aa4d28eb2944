//! Simulated world: occupancy map and the vehicle task.

use std::sync::Arc;
use std::time::Duration;

use replan_kernel::{Clock, SharedContext};
use replan_middleware::{EventBus, Topic};
use replan_perception::OctreeMap;
use replan_perception::octree::Aabb;
use replan_sim::SimVehicle;
use replan_types::{Event, EventPayload, OdometrySnapshot, Vec3};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::config::SimConfig;

pub fn vec3(p: [f64; 3]) -> Vec3 {
    Vec3::new(p[0], p[1], p[2])
}

pub fn build_map(sim: &SimConfig) -> OctreeMap {
    let bounds = Aabb::around(vec3(sim.start), sim.map_half_extent);
    let map = OctreeMap::from_points(bounds, sim.inflation, sim.obstacles.iter().copied().map(vec3));
    if map.obstacle_count() < sim.obstacles.len() {
        tracing::warn!(
            configured = sim.obstacles.len(),
            inserted = map.obstacle_count(),
            "some obstacles lie outside the map"
        );
    }
    map
}

/// Drive a [`SimVehicle`] along whatever trajectory is committed and publish
/// its odometry.  Returns the final odometry on shutdown.
pub fn spawn_vehicle(
    ctx: Arc<SharedContext>,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    start: Vec3,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<OdometrySnapshot> {
    tokio::spawn(async move {
        let mut vehicle = SimVehicle::new(start);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let committed = ctx.committed();
                    let odom = vehicle.step(committed.as_deref(), clock.now());
                    if let Err(e) = bus.publish_to(Topic::Odometry, Event::new("replan-cli::vehicle", EventPayload::Odometry(odom))) {
                        tracing::trace!(error = %e, "odometry dropped");
                    }
                }
                res = shutdown.wait_for(|&stop| stop) => {
                    if res.is_err() {
                        tracing::debug!("shutdown sender dropped");
                    }
                    break;
                }
            }
        }
        vehicle.odometry()
    })
}
