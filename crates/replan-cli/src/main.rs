//! `replan` – headless re-planning run against a simulated world.
//!
//! 1. Loads `~/.replan/config.toml` (or the path given as the first argument)
//!    and applies `REPLAN_*` environment overrides.
//! 2. Builds the occupancy map, the simulated optimizer and vehicle, and the
//!    planner node, all talking over one event bus.
//! 3. Publishes the configured goal and flies for `sim.duration_secs`.
//! 4. Ctrl-C stops every task early.

mod config;
mod world;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use tokio::sync::watch;
use tracing::{error, warn};

use replan_kernel::{Clock, ReplanFsm, SystemClock};
use replan_middleware::{EventBus, Topic, TopicReceiver};
use replan_runtime::{BusOutput, PlannerNode};
use replan_sim::SimOptimizer;
use replan_types::{Event, EventPayload, GoalPath, PlannerError};

use crate::config::Config;

fn main() {
    let _telemetry = replan_runtime::init_tracing("replan");

    print_banner();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(config::config_path);
    let cfg = match config::load_or_default(&path) {
        Ok(cfg) => {
            if path.exists() {
                println!("  Config loaded from {}", path.display().to_string().bold());
            } else {
                match config::save_to(&Config::default(), &path) {
                    Ok(()) => println!(
                        "  {} Default config written to {}",
                        "✓".green().bold(),
                        path.display().to_string().bold()
                    ),
                    Err(e) => warn!(error = %e, "could not write default config"),
                }
            }
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            std::process::exit(2);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    let ctrlc_tx = Arc::clone(&shutdown_tx);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the planner …".yellow().bold());
        ctrlc_tx.send_replace(true);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler");
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start the tokio runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cfg, shutdown_tx, shutdown_rx)) {
        println!("{}: {}", "Planner error".red(), e);
        std::process::exit(1);
    }
}

async fn run(
    cfg: Config,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), PlannerError> {
    let bus = EventBus::default();
    let map = Arc::new(world::build_map(&cfg.sim));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let optimizer = SimOptimizer::new(map.clone(), Arc::clone(&clock), cfg.fsm.max_vel);
    let fsm = ReplanFsm::new(
        cfg.fsm.clone(),
        Box::new(optimizer),
        map.clone(),
        Arc::new(BusOutput::new(bus.clone())),
        Arc::clone(&clock),
    )?;
    let node = PlannerNode::new(fsm, bus.clone());

    println!(
        "  Flying {} → {} with {} obstacle(s) for {}s\n",
        format!("{:?}", cfg.sim.start).cyan(),
        format!("{:?}", cfg.sim.goal).cyan(),
        map.obstacle_count(),
        cfg.sim.duration_secs
    );

    let reporter = tokio::spawn(report_trajectories(bus.subscribe_to(Topic::Trajectory), shutdown.clone()));
    let handles = node.spawn(shutdown.clone());
    let vehicle = world::spawn_vehicle(
        Arc::clone(node.fsm().context()),
        bus.clone(),
        Arc::clone(&clock),
        world::vec3(cfg.sim.start),
        Duration::from_millis(cfg.sim.vehicle_period_ms.max(1)),
        shutdown.clone(),
    );

    bus.publish_to(
        Topic::Goals,
        Event::new("replan-cli", EventPayload::GoalTrigger(GoalPath::single(world::vec3(cfg.sim.goal)))),
    )?;

    let mut stop = shutdown.clone();
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(cfg.sim.duration_secs)) => {}
        _ = stop.wait_for(|&s| s) => {}
    }
    shutdown_tx.send_replace(true);

    handles.join().await;
    if let Err(e) = reporter.await {
        warn!(error = %e, "trajectory reporter failed");
    }
    let last = vehicle
        .await
        .map_err(|e| PlannerError::Channel(format!("vehicle task failed: {e}")))?;

    let goal = world::vec3(cfg.sim.goal);
    let dist = (last.position - goal).norm();
    println!();
    println!("  Final state     : {}", node.fsm().state().to_string().bold());
    println!(
        "  Final position  : [{:.2}, {:.2}, {:.2}]",
        last.position.x, last.position.y, last.position.z
    );
    let dist_str = format!("{dist:.2} m");
    println!(
        "  Distance to goal: {}",
        if dist < 0.1 { dist_str.green() } else { dist_str.yellow() }
    );
    Ok(())
}

/// Print one line per committed trajectory.
async fn report_trajectories(mut rx: TopicReceiver, mut shutdown: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            event = rx.next_event() => match event {
                Some(Event { payload: EventPayload::Trajectory(msg), .. }) => {
                    println!(
                        "  {} trajectory #{} ({} control points, t0 = {:.2}s)",
                        "↻".cyan(),
                        msg.traj_id,
                        msg.pos_pts.len(),
                        msg.start_time
                    );
                }
                Some(_) => {}
                None => break,
            },
            _ = shutdown.wait_for(|&s| s) => break,
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   ________  ____  / /___ _____ "#.bold().cyan());
    println!("{}", r#"  / ___/ _ \/ __ \/ / __ `/ __ \"#.bold().cyan());
    println!("{}", r#" / /  /  __/ /_/ / / /_/ / / / /"#.bold().cyan());
    println!("{}", r#"/_/   \___/ .___/_/\__,_/_/ /_/ "#.bold().cyan());
    println!("{}", r#"         /_/                    "#.bold().cyan());
    println!();
    println!("  {}", "Local re-planning decision layer – simulated flight".dimmed());
    println!();
}
