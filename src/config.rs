//! System configuration parameters
//!
//! All tunable parameters for the hallway display, grouped by subsystem.
//! Loaded from a TOML file through [`ConfigPort`](crate::app::ports::ConfigPort);
//! every section falls back to its defaults when absent, so a partial file
//! is valid.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::schedule::parse_time_of_day;

/// Mechanism names accepted in `monitor.fallbacks`.
pub const FALLBACK_NAMES: [&str; 3] = ["cec", "dpms", "hdmi"];

/// Core system configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub schedule: ScheduleConfig,
    pub brightness: BrightnessConfig,
    pub monitor: MonitorConfig,
    pub motion: MotionConfig,
    pub light: LightConfig,
    pub touch: TouchConfig,
    pub views: ViewConfig,
    pub runtime: RuntimeConfig,
}

/// Scheduled on-windows, as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub weekday_morning_start: String,
    pub weekday_morning_end: String,
    pub weekday_evening_start: String,
    pub weekday_evening_end: String,
    pub weekend_start: String,
    pub weekend_end: String,
    /// How often the window membership is re-evaluated (seconds)
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekday_morning_start: "06:00".into(),
            weekday_morning_end: "08:00".into(),
            weekday_evening_start: "17:00".into(),
            weekday_evening_end: "23:00".into(),
            weekend_start: "08:00".into(),
            weekend_end: "23:00".into(),
            poll_interval_secs: 10,
        }
    }
}

/// Brightness bounds and the lux range they map across.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Brightness at or below `low_lux` (0-100%)
    pub min: u8,
    /// Brightness at or above `high_lux` (0-100%)
    pub max: u8,
    /// Brightness used on power-on before any light sample arrived (0-100%)
    pub night: u8,
    pub low_lux: f32,
    pub high_lux: f32,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            min: 10,
            max: 90,
            night: 15,
            low_lux: 10.0,
            high_lux: 1000.0,
        }
    }
}

/// Monitor control: DDC/CI addressing plus the power fallback chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// I2C bus index passed to `ddcutil --bus`
    pub i2c_bus: u8,
    /// Optional privilege wrapper (e.g. "sudo"); empty means none
    pub command_prefix: String,
    /// VCP feature code for power mode (hex)
    pub vcp_power: String,
    /// VCP feature code for brightness (hex)
    pub vcp_brightness: String,
    /// Value written to `vcp_power` to turn the monitor on
    pub power_on_value: String,
    /// Value written to `vcp_power` to put the monitor in standby
    pub power_off_value: String,
    /// Per-attempt deadline for any control command (seconds)
    pub command_timeout_secs: u64,
    /// Total DDC/CI attempts before falling back
    pub retry_attempts: u8,
    /// Pause between DDC/CI attempts (milliseconds)
    pub retry_backoff_ms: u64,
    /// Pause after power-on before brightness is applied (milliseconds)
    pub settle_delay_ms: u64,
    /// Fallback mechanisms tried after DDC/CI, in order
    pub fallbacks: Vec<String>,
    /// X display used by the DPMS fallback
    pub x_display: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            command_prefix: "sudo".into(),
            vcp_power: "D6".into(),
            vcp_brightness: "10".into(),
            power_on_value: "1".into(),
            power_off_value: "4".into(),
            command_timeout_secs: 5,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            settle_delay_ms: 2000,
            fallbacks: FALLBACK_NAMES.iter().map(|s| (*s).to_string()).collect(),
            x_display: ":0".into(),
        }
    }
}

impl MonitorConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Worst-case time one power command can stall the coordinator.
    pub fn worst_case_latency(&self) -> Duration {
        let ddc = self.command_timeout() * u32::from(self.retry_attempts)
            + Duration::from_millis(self.retry_backoff_ms) * u32::from(self.retry_attempts.saturating_sub(1));
        ddc + self.command_timeout() * self.fallbacks.len() as u32 + self.settle_delay()
    }
}

/// PIR motion sensor on a GPIO character device line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub gpio_chip: String,
    pub line: u32,
    /// Pin sampling interval (milliseconds)
    pub poll_interval_ms: u64,
    /// Minimum spacing between accepted rising edges (milliseconds)
    pub debounce_ms: u64,
    /// Override lifetime after the last motion (seconds)
    pub timeout_secs: u64,
    /// How often override expiry is checked (seconds)
    pub check_interval_secs: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            gpio_chip: "/dev/gpiochip0".into(),
            line: 3,
            poll_interval_ms: 100,
            debounce_ms: 300,
            timeout_secs: 180,
            check_interval_secs: 5,
        }
    }
}

/// BH1750 ambient light sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub i2c_device: String,
    pub address: u8,
    /// Sampling interval (seconds)
    pub poll_interval_secs: u64,
    /// Pause after a failed read (seconds)
    pub error_backoff_secs: u64,
    /// Minimum lux change before a new sample is reported
    pub change_threshold_lux: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            i2c_device: "/dev/i2c-1".into(),
            address: 0x23,
            poll_interval_secs: 5,
            error_backoff_secs: 10,
            change_threshold_lux: 10.0,
        }
    }
}

/// Touchscreen input device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    /// Preferred event device path
    pub device: String,
    /// Case-insensitive name fragments used when `device` is missing
    pub name_keywords: Vec<String>,
    /// Pause before reopening after an error (seconds)
    pub reconnect_delay_secs: u64,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            device: "/dev/input/by-id/usb-ILITEK_ILITEK-TP-event-if00".into(),
            name_keywords: ["touch", "ilitek", "hid", "screen"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            reconnect_delay_secs: 5,
        }
    }
}

/// The two content views and the inactivity timeout between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Pid file of the passive (dashboard) browser, written by its supervisor
    pub passive_pid_file: String,
    /// Pid file of the interactive (control panel) browser
    pub interactive_pid_file: String,
    /// Seconds without touch before reverting to the passive view
    pub inactivity_timeout_secs: u64,
    /// How often the inactivity deadline is checked (seconds)
    pub check_interval_secs: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            passive_pid_file: "/run/hallway-display/passive.pid".into(),
            interactive_pid_file: "/run/hallway-display/interactive.pid".into(),
            inactivity_timeout_secs: 30,
            check_interval_secs: 1,
        }
    }
}

/// Process-level settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Default log filter (overridden by RUST_LOG)
    pub log_level: String,
    /// How long shutdown waits for each worker (seconds)
    pub join_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            join_timeout_secs: 2,
        }
    }
}

impl SystemConfig {
    /// Reject out-of-range values rather than silently clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        for (field, value) in [
            ("weekday_morning_start", &s.weekday_morning_start),
            ("weekday_morning_end", &s.weekday_morning_end),
            ("weekday_evening_start", &s.weekday_evening_start),
            ("weekday_evening_end", &s.weekday_evening_end),
            ("weekend_start", &s.weekend_start),
            ("weekend_end", &s.weekend_end),
        ] {
            parse_time_of_day(field, value)?;
        }
        if s.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("schedule.poll_interval_secs must be > 0"));
        }

        let b = &self.brightness;
        if b.min > 100 || b.max > 100 || b.night > 100 {
            return Err(ConfigError::ValidationFailed("brightness values must be 0-100"));
        }
        if b.min > b.max {
            return Err(ConfigError::ValidationFailed("brightness.min must not exceed brightness.max"));
        }
        if !(b.low_lux.is_finite() && b.high_lux.is_finite()) || b.low_lux < 0.0 || b.low_lux >= b.high_lux {
            return Err(ConfigError::ValidationFailed("brightness.low_lux must be >= 0 and below high_lux"));
        }

        let m = &self.monitor;
        for code in [&m.vcp_power, &m.vcp_brightness] {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::ValidationFailed("monitor VCP codes must be hexadecimal"));
            }
        }
        if m.power_on_value.is_empty() || m.power_off_value.is_empty() {
            return Err(ConfigError::ValidationFailed("monitor power values must not be empty"));
        }
        if m.power_on_value == m.power_off_value {
            return Err(ConfigError::ValidationFailed("monitor power on/off values must differ"));
        }
        if m.command_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed("monitor.command_timeout_secs must be > 0"));
        }
        if m.retry_attempts == 0 {
            return Err(ConfigError::ValidationFailed("monitor.retry_attempts must be >= 1"));
        }
        if m.fallbacks.iter().any(|f| !FALLBACK_NAMES.contains(&f.as_str())) {
            return Err(ConfigError::ValidationFailed("monitor.fallbacks accepts only cec, dpms, hdmi"));
        }

        if self.motion.poll_interval_ms == 0
            || self.motion.timeout_secs == 0
            || self.motion.check_interval_secs == 0
        {
            return Err(ConfigError::ValidationFailed("motion intervals and timeout must be > 0"));
        }
        if self.light.poll_interval_secs == 0 || self.light.change_threshold_lux < 0.0 {
            return Err(ConfigError::ValidationFailed("light.poll_interval_secs must be > 0"));
        }
        if self.views.inactivity_timeout_secs == 0 || self.views.check_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("view timeouts must be > 0"));
        }
        if self.runtime.join_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed("runtime.join_timeout_secs must be > 0"));
        }
        Ok(())
    }
}
