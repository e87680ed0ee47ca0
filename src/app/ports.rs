//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Coordinator (domain)
//! ```
//!
//! Driven adapters (monitor control, window control, clocks, sensors,
//! event sinks, config files) implement these traits.  The
//! [`Coordinator`](super::coordinator::Coordinator) consumes them via
//! generics, so the domain core never touches hardware directly.
//!
//! All port errors are typed — callers must handle every variant explicitly.

use core::time::Duration;

use chrono::NaiveDateTime;

use crate::config::SystemConfig;
use crate::error::{ConfigError, HardwareError, SensorError};

use super::events::AppEvent;
use super::state::{CommandOutcome, DisplayView, PowerReading};

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → monitor)
// ───────────────────────────────────────────────────────────────

/// Monitor power and brightness control.
///
/// Implementations block for up to their command timeout per attempt and
/// must absorb every hardware failure into a typed error.
pub trait DisplayPort {
    /// Switch power.  `NoOp` when the monitor is already in that state.
    fn set_power(&mut self, on: bool) -> Result<CommandOutcome, HardwareError>;

    /// Set backlight brightness (0–100, clamped).
    fn set_brightness(&mut self, pct: u8) -> Result<CommandOutcome, HardwareError>;

    /// Best-effort query; `Unknown` when no mechanism could answer.
    fn query_power(&mut self) -> PowerReading;

    /// Read the current brightness, priming the de-duplication cache so a
    /// matching first `set_brightness` is a `NoOp`.
    fn query_brightness(&mut self) -> Result<u8, HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Window port (driven adapter: domain → window system)
// ───────────────────────────────────────────────────────────────

/// Shows and hides the browser windows behind each view.
pub trait WindowPort {
    /// Map and raise the view's window.
    fn show(&mut self, view: DisplayView) -> Result<(), HardwareError>;

    /// Unmap the view's window.
    fn hide(&mut self, view: DisplayView) -> Result<(), HardwareError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock time and blocking delays.
pub trait ClockPort {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    /// Block the calling thread (settle delays).
    fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Light sensor port (driven adapter: hardware → light source)
// ───────────────────────────────────────────────────────────────

pub trait LightSensorPort {
    /// One ambient light measurement in lux.
    fn read_lux(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Command runner port (driven adapter: domain → external tools)
// ───────────────────────────────────────────────────────────────

/// One external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Text written to the child's stdin, then closed.
    pub stdin: Option<String>,
    /// Extra environment variables.
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined for logging.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for a in &self.args {
            line.push(' ');
            line.push_str(a);
        }
        line
    }
}

/// Runs external control tools with a deadline.
///
/// Error mapping: program not found → [`HardwareError::Unavailable`],
/// deadline exceeded → [`HardwareError::Timeout`] (child killed),
/// non-zero exit → [`HardwareError::Rejected`].
pub trait CommandRunner {
    /// Run to completion and return captured stdout.
    fn run(&mut self, invocation: &Invocation, timeout: Duration) -> Result<String, HardwareError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, invocation: &Invocation, timeout: Duration) -> Result<String, HardwareError> {
        (**self).run(invocation, timeout)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ config file)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before returning or
/// persisting them.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  [`ConfigError::NotFound`] if nothing is stored.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}
