//! DDC/CI monitor control through `ddcutil`.
//!
//! Power and brightness are VCP features addressed by bus index and a hex
//! feature code.  Every command gets a deadline; timeouts and non-zero exits
//! are retried with a fixed backoff before the caller falls back.
//!
//! ```text
//! [sudo] ddcutil --sleep-multiplier .1 --bus 1 setvcp --noverify D6 1
//! [sudo] ddcutil --sleep-multiplier .1 --bus 1 getvcp 10
//! ```

use core::time::Duration;

use log::{debug, warn};

use crate::app::ports::{CommandRunner, Invocation};
use crate::app::state::PowerState;
use crate::config::MonitorConfig;
use crate::error::HardwareError;

use super::PowerMechanism;

const DDCUTIL: &str = "ddcutil";

/// DDC/CI access parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdcControl {
    prefix: Option<String>,
    bus: u8,
    vcp_power: String,
    vcp_brightness: String,
    on_value: String,
    off_value: String,
    timeout: Duration,
    attempts: u8,
    backoff: Duration,
}

impl DdcControl {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        let prefix = cfg.command_prefix.trim();
        Self {
            prefix: (!prefix.is_empty()).then(|| prefix.to_string()),
            bus: cfg.i2c_bus,
            vcp_power: cfg.vcp_power.clone(),
            vcp_brightness: cfg.vcp_brightness.clone(),
            on_value: cfg.power_on_value.clone(),
            off_value: cfg.power_off_value.clone(),
            timeout: cfg.command_timeout(),
            attempts: cfg.retry_attempts.max(1),
            backoff: Duration::from_millis(cfg.retry_backoff_ms),
        }
    }

    /// Write a VCP feature value (no read-back verification).
    pub fn set_vcp(
        &self,
        runner: &mut dyn CommandRunner,
        code: &str,
        value: &str,
    ) -> Result<(), HardwareError> {
        let inv = self.invocation(["setvcp", "--noverify", code, value]);
        self.run_with_retries(runner, &inv).map(|_| ())
    }

    /// Read a VCP feature and return ddcutil's textual response.
    pub fn get_vcp(&self, runner: &mut dyn CommandRunner, code: &str) -> Result<String, HardwareError> {
        let inv = self.invocation(["getvcp", code]);
        self.run_with_retries(runner, &inv)
    }

    pub fn set_brightness(&self, runner: &mut dyn CommandRunner, pct: u8) -> Result<(), HardwareError> {
        self.set_vcp(runner, &self.vcp_brightness, &pct.min(100).to_string())
    }

    /// Current brightness as a percentage of the monitor's maximum.
    pub fn query_brightness(&self, runner: &mut dyn CommandRunner) -> Result<u8, HardwareError> {
        let text = self.get_vcp(runner, &self.vcp_brightness)?;
        parse_brightness_response(&text)
    }

    // ── Internal ──────────────────────────────────────────────

    fn invocation<'a>(&self, tail: impl IntoIterator<Item = &'a str>) -> Invocation {
        let base = match &self.prefix {
            Some(prefix) => Invocation::new(prefix.as_str()).arg(DDCUTIL),
            None => Invocation::new(DDCUTIL),
        };
        base.args(["--sleep-multiplier", ".1", "--bus"])
            .arg(self.bus.to_string())
            .args(tail)
    }

    fn run_with_retries(
        &self,
        runner: &mut dyn CommandRunner,
        inv: &Invocation,
    ) -> Result<String, HardwareError> {
        let mut attempt = 1;
        loop {
            match runner.run(inv, self.timeout) {
                Ok(out) => {
                    debug!("DDC: `{}` ok on attempt {}", inv.command_line(), attempt);
                    return Ok(out);
                }
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(
                        "DDC: attempt {}/{} failed ({}), retrying in {}ms",
                        attempt,
                        self.attempts,
                        e,
                        self.backoff.as_millis()
                    );
                    std::thread::sleep(self.backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl PowerMechanism for DdcControl {
    fn name(&self) -> &'static str {
        "ddc"
    }

    fn tool(&self) -> &'static str {
        DDCUTIL
    }

    fn apply(&self, runner: &mut dyn CommandRunner, state: PowerState) -> Result<(), HardwareError> {
        let value = match state {
            PowerState::On => &self.on_value,
            PowerState::Off => &self.off_value,
        };
        self.set_vcp(runner, &self.vcp_power, value)
    }

    fn query(&self, runner: &mut dyn CommandRunner) -> Result<PowerState, HardwareError> {
        let text = self.get_vcp(runner, &self.vcp_power)?;
        parse_power_response(&text, &self.on_value)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Response parsing
// ═══════════════════════════════════════════════════════════════

/// Interpret a `getvcp` power-mode response.
///
/// Checked in order: `DPMS: Standby` (off), `DPM: On`, `DPM: Off`, then the
/// numeric `current value` / `sl=` compared with the configured ON value.
/// An ON response typically also contains `DPMS: Off`, so that string is
/// not treated as off.
pub fn parse_power_response(text: &str, on_value: &str) -> Result<PowerState, HardwareError> {
    if text.contains("DPMS: Standby") {
        return Ok(PowerState::Off);
    }
    if text.contains("DPM: On") {
        return Ok(PowerState::On);
    }
    if text.contains("DPM: Off") {
        return Ok(PowerState::Off);
    }
    let on = parse_number(on_value);
    match (parse_current_value(text), on) {
        (Some(current), Some(on)) => Ok(PowerState::from(current == on)),
        _ => Err(HardwareError::Unparseable(text.trim().to_string())),
    }
}

/// Interpret a `getvcp` continuous-feature response as a percentage.
pub fn parse_brightness_response(text: &str) -> Result<u8, HardwareError> {
    let unparseable = || HardwareError::Unparseable(text.trim().to_string());
    let current = parse_current_value(text).ok_or_else(unparseable)?;
    let pct = match field_value(text, "max value =") {
        Some(max) if max > 0 => current.saturating_mul(100) / max,
        _ => current,
    };
    Ok(pct.min(100) as u8)
}

/// Extract `current value = N` (decimal or `0x` hex), falling back to the
/// `sl=0xNN` byte of non-continuous features.
pub fn parse_current_value(text: &str) -> Option<u32> {
    field_value(text, "current value =").or_else(|| field_value(text, "sl="))
}

fn field_value(text: &str, label: &str) -> Option<u32> {
    let start = text.find(label)? + label.len();
    let token = text[start..]
        .trim_start()
        .split(|c: char| c == ',' || c == ')' || c.is_whitespace())
        .next()?;
    parse_number(token)
}

fn parse_number(token: &str) -> Option<u32> {
    let token = token.trim();
    match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}
