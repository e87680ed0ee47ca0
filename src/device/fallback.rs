//! Power fallbacks tried after DDC/CI, each a single attempt.
//!
//! | Name   | Tool         | On / Off                           | Query                  |
//! |--------|--------------|------------------------------------|------------------------|
//! | `cec`  | `cec-client` | stdin `on 0` / `standby 0`         | stdin `pow 0`          |
//! | `dpms` | `xset`       | `dpms force on` / `dpms force off` | `q`                    |
//! | `hdmi` | `vcgencmd`   | `display_power 1` / `0`            | `display_power`        |

use core::time::Duration;

use crate::app::ports::{CommandRunner, Invocation};
use crate::app::state::PowerState;
use crate::config::MonitorConfig;
use crate::error::HardwareError;

use super::PowerMechanism;

/// Build the configured fallback by name.  Unknown names yield `None`
/// (rejected earlier by config validation).
pub fn from_name(name: &str, cfg: &MonitorConfig) -> Option<Box<dyn PowerMechanism>> {
    let timeout = cfg.command_timeout();
    match name {
        "cec" => Some(Box::new(Cec { timeout })),
        "dpms" => Some(Box::new(Dpms {
            display: cfg.x_display.clone(),
            timeout,
        })),
        "hdmi" => Some(Box::new(HdmiService { timeout })),
        _ => None,
    }
}

fn unparseable(text: &str) -> HardwareError {
    HardwareError::Unparseable(text.trim().to_string())
}

// ── CEC ───────────────────────────────────────────────────────

/// HDMI-CEC via libcec's `cec-client`, addressing the TV at logical address 0.
#[derive(Debug, Clone)]
pub struct Cec {
    pub timeout: Duration,
}

impl Cec {
    fn invocation(command: &str) -> Invocation {
        Invocation::new("cec-client").args(["-s", "-d", "1"]).stdin(command)
    }
}

impl PowerMechanism for Cec {
    fn name(&self) -> &'static str {
        "cec"
    }

    fn tool(&self) -> &'static str {
        "cec-client"
    }

    fn apply(&self, runner: &mut dyn CommandRunner, state: PowerState) -> Result<(), HardwareError> {
        let command = match state {
            PowerState::On => "on 0",
            PowerState::Off => "standby 0",
        };
        runner.run(&Self::invocation(command), self.timeout).map(|_| ())
    }

    fn query(&self, runner: &mut dyn CommandRunner) -> Result<PowerState, HardwareError> {
        let text = runner.run(&Self::invocation("pow 0"), self.timeout)?;
        parse_cec_power(&text)
    }
}

pub fn parse_cec_power(text: &str) -> Result<PowerState, HardwareError> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("power status: on") {
        Ok(PowerState::On)
    } else if lower.contains("power status: standby") {
        Ok(PowerState::Off)
    } else {
        Err(unparseable(text))
    }
}

// ── DPMS ──────────────────────────────────────────────────────

/// X11 display power management on the local session.
#[derive(Debug, Clone)]
pub struct Dpms {
    pub display: String,
    pub timeout: Duration,
}

impl Dpms {
    fn invocation<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Invocation {
        Invocation::new("xset")
            .args(args)
            .env("DISPLAY", self.display.as_str())
    }
}

impl PowerMechanism for Dpms {
    fn name(&self) -> &'static str {
        "dpms"
    }

    fn tool(&self) -> &'static str {
        "xset"
    }

    fn apply(&self, runner: &mut dyn CommandRunner, state: PowerState) -> Result<(), HardwareError> {
        let mode = match state {
            PowerState::On => "on",
            PowerState::Off => "off",
        };
        runner
            .run(&self.invocation(["dpms", "force", mode]), self.timeout)
            .map(|_| ())
    }

    fn query(&self, runner: &mut dyn CommandRunner) -> Result<PowerState, HardwareError> {
        let text = runner.run(&self.invocation(["q"]), self.timeout)?;
        parse_xset_query(&text)
    }
}

pub fn parse_xset_query(text: &str) -> Result<PowerState, HardwareError> {
    if text.contains("Monitor is On") {
        Ok(PowerState::On)
    } else if ["Monitor is Off", "Monitor is in Standby", "Monitor is in Suspend"]
        .iter()
        .any(|s| text.contains(s))
    {
        Ok(PowerState::Off)
    } else {
        Err(unparseable(text))
    }
}

// ── HDMI service ──────────────────────────────────────────────

/// Raspberry Pi firmware HDMI output toggle.
#[derive(Debug, Clone)]
pub struct HdmiService {
    pub timeout: Duration,
}

impl PowerMechanism for HdmiService {
    fn name(&self) -> &'static str {
        "hdmi"
    }

    fn tool(&self) -> &'static str {
        "vcgencmd"
    }

    fn apply(&self, runner: &mut dyn CommandRunner, state: PowerState) -> Result<(), HardwareError> {
        let value = match state {
            PowerState::On => "1",
            PowerState::Off => "0",
        };
        let inv = Invocation::new("vcgencmd").args(["display_power", value]);
        runner.run(&inv, self.timeout).map(|_| ())
    }

    fn query(&self, runner: &mut dyn CommandRunner) -> Result<PowerState, HardwareError> {
        let inv = Invocation::new("vcgencmd").arg("display_power");
        let text = runner.run(&inv, self.timeout)?;
        parse_display_power(&text)
    }
}

pub fn parse_display_power(text: &str) -> Result<PowerState, HardwareError> {
    match text.trim() {
        "display_power=1" => Ok(PowerState::On),
        "display_power=0" => Ok(PowerState::Off),
        _ => Err(unparseable(text)),
    }
}
