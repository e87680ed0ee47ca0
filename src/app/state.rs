//! Display state shared between the coordinator, the view manager and the
//! device layer.
//!
//! [`CoordinatorState`] is the coordinator's blackboard.  Only the
//! coordinator's single event-processing path writes it, so it needs no
//! locking.

use core::fmt;
use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};

/// Convert a configured timeout to a wall-clock offset, capped at ~49 days.
pub fn wall_delta(d: Duration) -> TimeDelta {
    TimeDelta::milliseconds(d.as_millis().min(u128::from(u32::MAX)) as i64)
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Commanded monitor power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

/// Result of a best-effort hardware power query, or the coordinator's
/// belief after a failed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerReading {
    On,
    Off,
    Unknown,
}

impl PowerReading {
    /// Only a confirmed `On` counts as powered; `Unknown` is treated as off
    /// so the next power-on attempt is not suppressed.
    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

impl From<PowerState> for PowerReading {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::On => Self::On,
            PowerState::Off => Self::Off,
        }
    }
}

/// What a device command actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A hardware command was issued and acknowledged.
    Applied,
    /// The request matched the cached state; nothing was sent.
    NoOp,
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// The two mutually exclusive foreground contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayView {
    /// Ambient dashboard.
    Passive,
    /// Touch-driven control panel.
    Interactive,
}

impl DisplayView {
    pub fn other(self) -> Self {
        match self {
            Self::Passive => Self::Interactive,
            Self::Interactive => Self::Passive,
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator blackboard
// ---------------------------------------------------------------------------

/// Coordinator mode, derived from [`CoordinatorState`] rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    SchedOff,
    SchedOn,
    MotionOverride,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorState {
    /// Last schedule evaluation.
    pub scheduled_on: bool,
    /// Override expiry; `Some` only while a motion/touch override is active.
    pub motion_active_until: Option<NaiveDateTime>,
    /// Most recent motion or touch, whether or not it started an override.
    pub last_motion: Option<NaiveDateTime>,
    /// Most recent touch forwarded to the view manager.
    pub last_interaction: Option<NaiveDateTime>,
    /// Believed monitor power.
    pub power: PowerReading,
    /// Most recent light sample; `None` until the sensor reports.
    pub last_lux: Option<f32>,
}

impl CoordinatorState {
    pub fn new(scheduled_on: bool, power: PowerReading) -> Self {
        Self {
            scheduled_on,
            motion_active_until: None,
            last_motion: None,
            last_interaction: None,
            power,
            last_lux: None,
        }
    }

    pub fn mode(&self) -> DisplayMode {
        if self.scheduled_on {
            DisplayMode::SchedOn
        } else if self.motion_active_until.is_some() {
            DisplayMode::MotionOverride
        } else {
            DisplayMode::SchedOff
        }
    }

    pub fn override_active(&self) -> bool {
        self.mode() == DisplayMode::MotionOverride
    }
}
