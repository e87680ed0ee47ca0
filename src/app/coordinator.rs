//! Coordinator — the hexagonal core.
//!
//! [`Coordinator`] owns the display state blackboard and the view manager
//! and turns [`SignalEvent`]s into monitor and window effects.  All I/O
//! flows through port traits supplied at construction, so the whole state
//! machine runs against mock adapters in tests.
//!
//! ```text
//!  EventQueue ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!                 │        Coordinator         │
//! DisplayPort ◀── │  state · view · brightness │ ──▶ WindowPort
//!                 └────────────────────────────┘
//! ```
//!
//! ## Modes
//!
//! ```text
//!                 ScheduleChanged(true)
//!   ┌──────────┐ ───────────────────────▶ ┌──────────┐
//!   │ SchedOff │ ◀─────────────────────── │ SchedOn  │
//!   └──────────┘  ScheduleChanged(false)  └──────────┘
//!      │    ▲                                  ▲
//!      │    │ MotionTimeoutTick (expired)      │ ScheduleChanged(true)
//!      ▼    │                                  │
//!   ┌────────────────┐ ────────────────────────┘
//!   │ MotionOverride │   (motion/touch while off)
//!   └────────────────┘
//! ```
//!
//! Every transition completes state-wise even when hardware fails.  A failed
//! power-on leaves power `Unknown`, so the next motion or touch retries it.

use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::brightness::BrightnessCurve;
use crate::events::{EventQueue, SignalEvent};
use crate::workers::ShutdownToken;

use super::events::AppEvent;
use super::ports::{ClockPort, DisplayPort, EventSink, WindowPort};
use super::state::{
    CommandOutcome, CoordinatorState, DisplayMode, DisplayView, PowerReading, PowerState,
    wall_delta,
};
use super::view::ViewManager;

/// Longest wait for an event before re-checking the shutdown token.
pub const RECV_SLICE: Duration = Duration::from_millis(250);

// ───────────────────────────────────────────────────────────────
// Coordinator
// ───────────────────────────────────────────────────────────────

pub struct Coordinator<D, W, S, C>
where
    D: DisplayPort,
    W: WindowPort,
    S: EventSink,
    C: ClockPort,
{
    display: D,
    view: ViewManager<W>,
    sink: S,
    clock: C,
    state: CoordinatorState,
    curve: BrightnessCurve,
    night_brightness: u8,
    motion_timeout: TimeDelta,
    settle_delay: Duration,
}

impl<D, W, S, C> Coordinator<D, W, S, C>
where
    D: DisplayPort,
    W: WindowPort,
    S: EventSink,
    C: ClockPort,
{
    /// Build the coordinator.  `scheduled_on` is the schedule evaluated at
    /// startup; the schedule worker must be seeded with the same value.
    ///
    /// Does **not** touch hardware — call [`start`](Self::start) next.
    pub fn new(
        display: D,
        windows: W,
        sink: S,
        clock: C,
        config: &SystemConfig,
        scheduled_on: bool,
    ) -> Self {
        let inactivity = Duration::from_secs(config.views.inactivity_timeout_secs);
        Self {
            display,
            view: ViewManager::new(windows, inactivity),
            sink,
            clock,
            state: CoordinatorState::new(scheduled_on, PowerReading::Unknown),
            curve: BrightnessCurve::from_config(&config.brightness),
            night_brightness: config.brightness.night.min(100),
            motion_timeout: wall_delta(Duration::from_secs(config.motion.timeout_secs)),
            settle_delay: config.monitor.settle_delay(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Reconcile hardware with the startup schedule.
    ///
    /// The view is forced to passive unconditionally, then the monitor is
    /// powered to match the schedule unless it already reports that state.
    /// A monitor found already on keeps its brightness unless it differs
    /// from the night level.
    pub fn start(&mut self) {
        self.state.power = self.display.query_power();
        info!(
            "Coordinator: scheduled_on={} power={:?}",
            self.state.scheduled_on, self.state.power
        );
        self.view.reset();
        self.sink.emit(&AppEvent::Started {
            mode: self.state.mode(),
            view: self.view.foreground(),
        });

        if self.state.scheduled_on {
            if self.state.power == PowerReading::On {
                match self.display.query_brightness() {
                    Ok(pct) => info!("Coordinator: monitor brightness {}%", pct),
                    Err(e) => debug!("Coordinator: brightness unreadable: {}", e),
                }
                self.apply_brightness(self.night_brightness);
            } else {
                self.power_on_sequence();
            }
        } else if self.state.power != PowerReading::Off {
            self.power_off();
        }
    }

    /// Consume events until `token` is cancelled.
    pub fn run(&mut self, queue: &EventQueue, token: &ShutdownToken) {
        info!("Coordinator: running");
        while !token.is_cancelled() {
            if let Some(event) = queue.recv_timeout(RECV_SLICE) {
                self.handle(event);
            }
        }
        info!("Coordinator: stopped");
    }

    // ── Event handling ────────────────────────────────────────

    /// Process one event to completion.
    pub fn handle(&mut self, event: SignalEvent) {
        let now = self.clock.now();
        match event {
            SignalEvent::ScheduleChanged(true) => {
                self.transition(|s| {
                    s.scheduled_on = true;
                    s.motion_active_until = None;
                });
                if !self.state.power.is_on() {
                    self.power_on_sequence();
                }
            }
            SignalEvent::ScheduleChanged(false) => {
                self.transition(|s| {
                    s.scheduled_on = false;
                    s.motion_active_until = None;
                });
                self.power_off();
            }
            SignalEvent::MotionDetected => self.presence(now),
            SignalEvent::TouchDetected => {
                self.presence(now);
                if !self.state.power.is_on() {
                    debug!("Coordinator: monitor not on, touch leaves view alone");
                    return;
                }
                self.state.last_interaction = Some(now);
                let from = self.view.foreground();
                if self.view.touch(now) {
                    self.sink.emit(&AppEvent::ViewChanged {
                        from,
                        to: self.view.foreground(),
                    });
                }
            }
            SignalEvent::LightSampled(lux) => {
                if !lux.is_finite() {
                    debug!("Coordinator: ignoring non-finite lux sample");
                    return;
                }
                self.state.last_lux = Some(lux);
                if self.state.power.is_on() {
                    self.apply_brightness(self.curve.level(lux));
                }
            }
            SignalEvent::MotionTimeoutTick => {
                if self.override_expired(now) {
                    info!("Coordinator: no motion for {}s", self.motion_timeout.num_seconds());
                    self.power_off();
                    self.transition(|s| s.motion_active_until = None);
                }
            }
            SignalEvent::InactivityTick => {
                let from = self.view.foreground();
                if self.view.check_inactivity(now) {
                    self.sink.emit(&AppEvent::ViewChanged {
                        from,
                        to: self.view.foreground(),
                    });
                }
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn mode(&self) -> DisplayMode {
        self.state.mode()
    }

    pub fn foreground(&self) -> DisplayView {
        self.view.foreground()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Internal ──────────────────────────────────────────────

    /// Motion or touch: power up if dark, and keep any override alive.
    fn presence(&mut self, now: NaiveDateTime) {
        if !self.state.power.is_on() {
            if !self.state.scheduled_on {
                let until = now + self.motion_timeout;
                self.transition(|s| s.motion_active_until = Some(until));
            }
            self.power_on_sequence();
        }
        self.state.last_motion = Some(now);
        if self.state.override_active() {
            self.state.motion_active_until = Some(now + self.motion_timeout);
        }
    }

    fn override_expired(&self, now: NaiveDateTime) -> bool {
        if !self.state.override_active() {
            return false;
        }
        match self.state.last_motion {
            Some(last) => now - last > self.motion_timeout,
            None => true,
        }
    }

    /// Mutate the blackboard, emitting `ModeChanged` if the mode moved.
    fn transition(&mut self, change: impl FnOnce(&mut CoordinatorState)) {
        let from = self.state.mode();
        change(&mut self.state);
        let to = self.state.mode();
        if from != to {
            self.sink.emit(&AppEvent::ModeChanged { from, to });
        }
    }

    /// Power on, let the panel settle, set brightness, then show passive.
    fn power_on_sequence(&mut self) {
        match self.display.set_power(true) {
            Ok(outcome) => {
                self.state.power = PowerReading::On;
                if outcome == CommandOutcome::Applied {
                    self.sink.emit(&AppEvent::PowerApplied(PowerState::On));
                    self.clock.sleep(self.settle_delay);
                }
            }
            Err(e) => {
                warn!("Coordinator: power on failed: {}", e);
                self.state.power = PowerReading::Unknown;
                self.sink.emit(&AppEvent::PowerFailed(PowerState::On));
                return;
            }
        }

        let level = match self.state.last_lux {
            Some(lux) => self.curve.level(lux),
            None => self.night_brightness,
        };
        self.apply_brightness(level);
        self.show_passive();
    }

    /// Passive view first, then power off.
    fn power_off(&mut self) {
        self.show_passive();
        match self.display.set_power(false) {
            Ok(outcome) => {
                self.state.power = PowerReading::Off;
                if outcome == CommandOutcome::Applied {
                    self.sink.emit(&AppEvent::PowerApplied(PowerState::Off));
                }
            }
            Err(e) => {
                warn!("Coordinator: power off failed: {}", e);
                self.state.power = PowerReading::Unknown;
                self.sink.emit(&AppEvent::PowerFailed(PowerState::Off));
            }
        }
    }

    fn show_passive(&mut self) {
        let from = self.view.foreground();
        if self.view.activate(DisplayView::Passive) {
            self.sink.emit(&AppEvent::ViewChanged {
                from,
                to: DisplayView::Passive,
            });
        }
    }

    fn apply_brightness(&mut self, pct: u8) {
        match self.display.set_brightness(pct) {
            Ok(CommandOutcome::Applied) => self.sink.emit(&AppEvent::BrightnessApplied(pct)),
            Ok(CommandOutcome::NoOp) => {}
            Err(e) => warn!("Coordinator: brightness {}% failed: {}", pct, e),
        }
    }
}
