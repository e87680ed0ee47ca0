//! Mock hardware adapters for integration tests.
//!
//! Every display, window and settle call lands in one shared, ordered
//! [`CallLog`] so tests can assert on the exact sequence of effects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hallway_display::app::events::AppEvent;
use hallway_display::app::ports::{ClockPort, DisplayPort, EventSink, WindowPort};
use hallway_display::app::state::{CommandOutcome, DisplayView, PowerReading};
use hallway_display::error::HardwareError;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Power(bool),
    Brightness(u8),
    Show(DisplayView),
    Hide(DisplayView),
    Settle(Duration),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn position(log: &CallLog, call: &Call) -> Option<usize> {
    log.borrow().iter().position(|c| c == call)
}

pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}

// ── MockDisplay ───────────────────────────────────────────────

/// Applies every command it does not already consider in effect.
pub struct MockDisplay {
    log: CallLog,
    power: Option<bool>,
    /// What a brightness query reads back; `None` fails the query.
    reported_brightness: Option<u8>,
    brightness: Option<u8>,
    /// While set, power commands are logged and then fail.
    pub fail_power: Rc<Cell<bool>>,
}

impl MockDisplay {
    pub fn new(log: CallLog, power: Option<bool>) -> Self {
        Self {
            log,
            power,
            reported_brightness: None,
            brightness: None,
            fail_power: Rc::new(Cell::new(false)),
        }
    }

    pub fn with_brightness(mut self, pct: u8) -> Self {
        self.reported_brightness = Some(pct);
        self
    }
}

impl DisplayPort for MockDisplay {
    fn set_power(&mut self, on: bool) -> Result<CommandOutcome, HardwareError> {
        if self.power == Some(on) {
            return Ok(CommandOutcome::NoOp);
        }
        self.log.borrow_mut().push(Call::Power(on));
        if self.fail_power.get() {
            self.power = None;
            return Err(HardwareError::Exhausted { attempted: 4 });
        }
        self.power = Some(on);
        if !on {
            self.brightness = None;
        }
        Ok(CommandOutcome::Applied)
    }

    fn set_brightness(&mut self, pct: u8) -> Result<CommandOutcome, HardwareError> {
        if self.brightness == Some(pct) {
            return Ok(CommandOutcome::NoOp);
        }
        self.log.borrow_mut().push(Call::Brightness(pct));
        self.brightness = Some(pct);
        Ok(CommandOutcome::Applied)
    }

    fn query_power(&mut self) -> PowerReading {
        match self.power {
            Some(true) => PowerReading::On,
            Some(false) => PowerReading::Off,
            None => PowerReading::Unknown,
        }
    }

    fn query_brightness(&mut self) -> Result<u8, HardwareError> {
        let pct = self
            .reported_brightness
            .ok_or_else(|| HardwareError::Unparseable(String::new()))?;
        self.brightness = Some(pct);
        Ok(pct)
    }
}

// ── MockWindows ───────────────────────────────────────────────

pub struct MockWindows {
    log: CallLog,
}

impl MockWindows {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl WindowPort for MockWindows {
    fn show(&mut self, view: DisplayView) -> Result<(), HardwareError> {
        self.log.borrow_mut().push(Call::Show(view));
        Ok(())
    }

    fn hide(&mut self, view: DisplayView) -> Result<(), HardwareError> {
        self.log.borrow_mut().push(Call::Hide(view));
        Ok(())
    }
}

// ── ManualClock ───────────────────────────────────────────────

/// Time only moves when a test advances it.  Settle delays are logged,
/// not slept.
#[derive(Clone)]
pub struct ManualClock {
    now: Rc<Cell<NaiveDateTime>>,
    log: CallLog,
}

impl ManualClock {
    /// Monday 2024-01-01 12:00.
    pub fn new(log: CallLog) -> Self {
        let t0 = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        Self {
            now: Rc::new(Cell::new(t0)),
            log,
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.set(self.now.get() + TimeDelta::seconds(secs));
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.log.borrow_mut().push(Call::Settle(duration));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingSink {
    pub events: Rc<RefCell<Vec<AppEvent>>>,
}

impl RecordingSink {
    pub fn position(&self, event: &AppEvent) -> Option<usize> {
        self.events.borrow().iter().position(|e| e == event)
    }

    pub fn count(&self, event: &AppEvent) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
