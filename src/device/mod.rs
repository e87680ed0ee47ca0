//! Device control layer — resilient monitor power and brightness.
//!
//! ```text
//!  set_power(on)
//!      │ same as last confirmed? ──▶ NoOp
//!      ▼
//!  ┌──────────┐  fail   ┌──────┐  fail   ┌──────┐  fail   ┌──────┐
//!  │ DDC/CI   │───────▶│ CEC  │───────▶│ DPMS │───────▶│ HDMI │──▶ Exhausted
//!  │ (retry)  │         └──────┘         └──────┘         └──────┘
//!  └──────────┘   each mechanism probed first; missing tools are skipped
//! ```
//!
//! The controller caches the last confirmed power state and brightness so
//! redundant hardware commands are never issued.  A failed power command
//! clears the power cache: the next request is always sent.
//!
//! Worst-case latency of one `set_power` call is
//! `timeout × attempts + backoff × (attempts − 1) + timeout × fallbacks`
//! (see [`MonitorConfig::worst_case_latency`]); the coordinator's next
//! event waits that long behind it.

pub mod ddc;
pub mod fallback;

use core::time::Duration;

use log::{debug, error, info, warn};

use crate::app::ports::{CommandRunner, DisplayPort, Invocation};
use crate::app::state::{CommandOutcome, PowerReading, PowerState};
use crate::config::MonitorConfig;
use crate::error::HardwareError;

use ddc::DdcControl;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

// ───────────────────────────────────────────────────────────────
// Mechanism trait
// ───────────────────────────────────────────────────────────────

/// One way of switching monitor power.
pub trait PowerMechanism {
    /// Short name used in logs and config (`ddc`, `cec`, ...).
    fn name(&self) -> &'static str;

    /// The external tool this mechanism needs on `PATH`.
    fn tool(&self) -> &'static str;

    /// Whether the tool is installed.  Unavailable mechanisms are skipped
    /// without counting as failures.
    fn probe(&self, runner: &mut dyn CommandRunner) -> bool {
        probe_tool(runner, self.tool())
    }

    fn apply(&self, runner: &mut dyn CommandRunner, state: PowerState) -> Result<(), HardwareError>;

    fn query(&self, runner: &mut dyn CommandRunner) -> Result<PowerState, HardwareError>;
}

/// `which <tool>` succeeds iff the tool is installed.
pub fn probe_tool(runner: &mut dyn CommandRunner, tool: &str) -> bool {
    runner
        .run(&Invocation::new("which").arg(tool), PROBE_TIMEOUT)
        .is_ok()
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Provenance of the most recent power command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedCommand {
    pub state: PowerState,
    pub acknowledged: bool,
    /// Mechanism that acknowledged it, if any.
    pub mechanism: Option<&'static str>,
}

pub struct DeviceController<R: CommandRunner> {
    runner: R,
    ddc: DdcControl,
    /// DDC/CI first, then the configured fallbacks.
    chain: Vec<Box<dyn PowerMechanism>>,
    confirmed: Option<PowerState>,
    last_issued: Option<IssuedCommand>,
    brightness: Option<u8>,
}

impl<R: CommandRunner> DeviceController<R> {
    pub fn new(runner: R, ddc: DdcControl, fallbacks: Vec<Box<dyn PowerMechanism>>) -> Self {
        let mut chain: Vec<Box<dyn PowerMechanism>> = Vec::with_capacity(fallbacks.len() + 1);
        chain.push(Box::new(ddc.clone()));
        chain.extend(fallbacks);
        Self {
            runner,
            ddc,
            chain,
            confirmed: None,
            last_issued: None,
            brightness: None,
        }
    }

    pub fn from_config(cfg: &MonitorConfig, runner: R) -> Self {
        let fallbacks = cfg
            .fallbacks
            .iter()
            .filter_map(|name| fallback::from_name(name, cfg))
            .collect();
        Self::new(runner, DdcControl::from_config(cfg), fallbacks)
    }

    /// Names of the mechanisms in the order they are tried.
    pub fn chain_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|m| m.name()).collect()
    }

    pub fn last_issued(&self) -> Option<IssuedCommand> {
        self.last_issued
    }

    pub fn confirmed_power(&self) -> Option<PowerState> {
        self.confirmed
    }

    pub fn cached_brightness(&self) -> Option<u8> {
        self.brightness
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn apply_power(&mut self, state: PowerState) -> Result<CommandOutcome, HardwareError> {
        if self.confirmed == Some(state) {
            debug!("Monitor: already {}, skipping", state);
            return Ok(CommandOutcome::NoOp);
        }

        let mut attempted = 0;
        for mechanism in &self.chain {
            if !mechanism.probe(&mut self.runner) {
                debug!("Monitor: {} unavailable, skipping", mechanism.name());
                continue;
            }
            attempted += 1;
            match mechanism.apply(&mut self.runner, state) {
                Ok(()) => {
                    info!("Monitor: power {} via {}", state, mechanism.name());
                    self.confirmed = Some(state);
                    self.last_issued = Some(IssuedCommand {
                        state,
                        acknowledged: true,
                        mechanism: Some(mechanism.name()),
                    });
                    if state == PowerState::Off {
                        self.brightness = None;
                    }
                    return Ok(CommandOutcome::Applied);
                }
                Err(e) => warn!("Monitor: power {} via {} failed: {}", state, mechanism.name(), e),
            }
        }

        error!("Monitor: power {} failed on every mechanism", state);
        self.confirmed = None;
        self.brightness = None;
        self.last_issued = Some(IssuedCommand {
            state,
            acknowledged: false,
            mechanism: None,
        });
        Err(HardwareError::Exhausted { attempted })
    }
}

impl<R: CommandRunner> DisplayPort for DeviceController<R> {
    fn set_power(&mut self, on: bool) -> Result<CommandOutcome, HardwareError> {
        self.apply_power(PowerState::from(on))
    }

    fn set_brightness(&mut self, pct: u8) -> Result<CommandOutcome, HardwareError> {
        let pct = pct.min(100);
        if self.confirmed == Some(PowerState::Off) {
            debug!("Monitor: off, not setting brightness");
            return Ok(CommandOutcome::NoOp);
        }
        if self.brightness == Some(pct) {
            return Ok(CommandOutcome::NoOp);
        }
        match self.ddc.set_brightness(&mut self.runner, pct) {
            Ok(()) => {
                info!("Monitor: brightness {}%", pct);
                self.brightness = Some(pct);
                Ok(CommandOutcome::Applied)
            }
            Err(e) => {
                error!("Monitor: brightness {}% failed: {}", pct, e);
                Err(e)
            }
        }
    }

    fn query_power(&mut self) -> PowerReading {
        for mechanism in &self.chain {
            if !mechanism.probe(&mut self.runner) {
                continue;
            }
            match mechanism.query(&mut self.runner) {
                Ok(state) => {
                    debug!("Monitor: {} reports {}", mechanism.name(), state);
                    self.confirmed = Some(state);
                    return state.into();
                }
                Err(e) => debug!("Monitor: {} query failed: {}", mechanism.name(), e),
            }
        }
        warn!("Monitor: power state unknown");
        PowerReading::Unknown
    }

    /// Read the current brightness over DDC/CI and seed the cache with it.
    fn query_brightness(&mut self) -> Result<u8, HardwareError> {
        let pct = self.ddc.query_brightness(&mut self.runner)?;
        self.brightness = Some(pct);
        Ok(pct)
    }
}
