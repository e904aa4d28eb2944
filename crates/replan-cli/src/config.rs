//! Reads and writes `~/.replan/config.toml`.
//!
//! ```toml
//! [fsm]
//! flight_type = "manual"
//! planning_horizon = 7.5
//! max_vel = 2.0
//!
//! [sim]
//! duration_secs = 20
//! start = [0.0, 0.0, 1.0]
//! goal = [12.0, 0.0, 1.0]
//! obstacles = [[6.0, 0.0, 1.0]]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use replan_kernel::{FlightType, FsmConfig};
use replan_types::PlannerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fsm: FsmConfig,
    #[serde(default)]
    pub sim: SimConfig,
}

/// The simulated world the CLI flies in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Wall-clock run time before shutting down (s).
    pub duration_secs: u64,
    pub start: [f64; 3],
    /// Position of the goal trigger published at startup.
    pub goal: [f64; 3],
    /// Obstacle points, inflated by `inflation`.
    pub obstacles: Vec<[f64; 3]>,
    pub inflation: f64,
    /// Half side length of the cubic map around the start (m).
    pub map_half_extent: f64,
    pub vehicle_period_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            duration_secs: 20,
            start: [0.0, 0.0, 1.0],
            goal: [12.0, 0.0, 1.0],
            obstacles: Vec::new(),
            inflation: 0.3,
            map_half_extent: 50.0,
            vehicle_period_ms: 10,
        }
    }
}

/// `~/.replan/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".replan").join("config.toml")
}

/// Load `path`, or defaults when it does not exist, then apply `REPLAN_*`
/// overrides and validate the result.
pub fn load_or_default(path: &Path) -> Result<Config, PlannerError> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    cfg.fsm.validate()?;
    Ok(cfg)
}

/// `None` if the file does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, PlannerError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| PlannerError::Config(format!("failed to read {}: {e}", path.display())))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| PlannerError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply `REPLAN_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `REPLAN_FLIGHT_TYPE` | `fsm.flight_type` (`manual` / `preset`) |
/// | `REPLAN_PLANNING_HORIZON` | `fsm.planning_horizon` |
/// | `REPLAN_MAX_VEL` | `fsm.max_vel` |
/// | `REPLAN_MAX_ACC` | `fsm.max_acc` |
/// | `REPLAN_RANDOM_SEED` | `fsm.random_seed` |
/// | `REPLAN_SIM_DURATION_SECS` | `sim.duration_secs` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("REPLAN_FLIGHT_TYPE") {
        match v.trim().to_ascii_lowercase().as_str() {
            "manual" => cfg.fsm.flight_type = FlightType::Manual,
            "preset" => cfg.fsm.flight_type = FlightType::Preset,
            _ => tracing::warn!(value = %v, "ignoring invalid REPLAN_FLIGHT_TYPE"),
        }
    }
    if let Some(v) = lookup("REPLAN_PLANNING_HORIZON")
        && let Ok(h) = v.parse::<f64>()
    {
        cfg.fsm.planning_horizon = h;
    }
    if let Some(v) = lookup("REPLAN_MAX_VEL")
        && let Ok(vel) = v.parse::<f64>()
    {
        cfg.fsm.max_vel = vel;
    }
    if let Some(v) = lookup("REPLAN_MAX_ACC")
        && let Ok(acc) = v.parse::<f64>()
    {
        cfg.fsm.max_acc = acc;
    }
    if let Some(v) = lookup("REPLAN_RANDOM_SEED")
        && let Ok(seed) = v.parse::<u64>()
    {
        cfg.fsm.random_seed = Some(seed);
    }
    if let Some(v) = lookup("REPLAN_SIM_DURATION_SECS")
        && let Ok(secs) = v.parse::<u64>()
    {
        cfg.sim.duration_secs = secs;
    }
}

/// Save to `path`, creating the parent directory.  Owner-only permissions on
/// Unix.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), PlannerError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PlannerError::Config(format!("failed to create config directory: {e}")))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| PlannerError::Config(format!("failed to restrict config directory: {e}")))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| PlannerError::Config(format!("failed to serialize config: {e}")))?;
    let write_err = |e: std::io::Error| PlannerError::Config(format!("failed to write {}: {e}", path.display()));
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(write_err)?;
        file.write_all(raw.as_bytes()).map_err(write_err)?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw).map_err(write_err)?;
    Ok(())
}
