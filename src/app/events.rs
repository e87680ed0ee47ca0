//! Outbound application events.
//!
//! The [`Coordinator`](super::coordinator::Coordinator) emits these through
//! the [`EventSink`](super::ports::EventSink) port, in the order the
//! effects happened.  Adapters on the other side decide what to do with
//! them — log to the console, forward to a status page, etc.

use super::state::{DisplayMode, DisplayView, PowerState};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The coordinator has started (carries the reconciled mode and view).
    Started { mode: DisplayMode, view: DisplayView },

    /// The derived coordinator mode changed.
    ModeChanged { from: DisplayMode, to: DisplayMode },

    /// A power command took effect (or was already in effect).
    PowerApplied(PowerState),

    /// A power command failed on every mechanism.
    PowerFailed(PowerState),

    /// A new backlight level was sent to the monitor.
    BrightnessApplied(u8),

    /// The foreground view changed.
    ViewChanged { from: DisplayView, to: DisplayView },
}
