//! Integration tests for the Coordinator → DisplayPort / WindowPort
//! pipeline: mode transitions and the ordering of their effects.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use chrono::TimeDelta;
use hallway_display::app::coordinator::Coordinator;
use hallway_display::app::events::AppEvent;
use hallway_display::app::state::{DisplayMode, DisplayView, PowerReading, PowerState};
use hallway_display::config::SystemConfig;
use hallway_display::events::SignalEvent;

use crate::mock_hw::{
    Call, CallLog, ManualClock, MockDisplay, MockWindows, RecordingSink, count, position,
};

type Rig = Coordinator<MockDisplay, MockWindows, RecordingSink, ManualClock>;

struct Harness {
    coordinator: Rig,
    log: CallLog,
    sink: RecordingSink,
    clock: ManualClock,
    fail_power: Rc<std::cell::Cell<bool>>,
}

/// Started with the monitor already confirmed in `power`, outside or inside
/// the schedule.  The startup calls are cleared from the log.
fn harness(scheduled_on: bool, power: Option<bool>) -> Harness {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let display = MockDisplay::new(log.clone(), power);
    let fail_power = display.fail_power.clone();
    let sink = RecordingSink::default();
    let clock = ManualClock::new(log.clone());
    let mut coordinator = Coordinator::new(
        display,
        MockWindows::new(log.clone()),
        sink.clone(),
        clock.clone(),
        &SystemConfig::default(),
        scheduled_on,
    );
    coordinator.start();
    log.borrow_mut().clear();
    sink.events.borrow_mut().clear();
    Harness {
        coordinator,
        log,
        sink,
        clock,
        fail_power,
    }
}

fn power_ons(log: &CallLog) -> usize {
    count(log, |c| *c == Call::Power(true))
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_forces_passive_and_matches_schedule() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let sink = RecordingSink::default();
    let mut c = Coordinator::new(
        MockDisplay::new(log.clone(), Some(true)),
        MockWindows::new(log.clone()),
        sink.clone(),
        ManualClock::new(log.clone()),
        &SystemConfig::default(),
        false,
    );
    c.start();
    assert_eq!(
        *log.borrow(),
        vec![
            Call::Show(DisplayView::Passive),
            Call::Hide(DisplayView::Interactive),
            Call::Power(false),
        ]
    );
    assert_eq!(
        sink.events.borrow()[0],
        AppEvent::Started {
            mode: DisplayMode::SchedOff,
            view: DisplayView::Passive
        }
    );
}

fn started_on_with_brightness(reported: u8) -> (CallLog, RecordingSink) {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let sink = RecordingSink::default();
    let mut c = Coordinator::new(
        MockDisplay::new(log.clone(), Some(true)).with_brightness(reported),
        MockWindows::new(log.clone()),
        sink.clone(),
        ManualClock::new(log.clone()),
        &SystemConfig::default(),
        true,
    );
    c.start();
    (log, sink)
}

#[test]
fn startup_keeps_matching_brightness_of_a_lit_monitor() {
    let night = SystemConfig::default().brightness.night;
    let (log, sink) = started_on_with_brightness(night);
    assert_eq!(count(&log, |c| matches!(c, Call::Brightness(_))), 0);
    assert_eq!(count(&log, |c| matches!(c, Call::Power(_))), 0);
    assert_eq!(sink.count(&AppEvent::BrightnessApplied(night)), 0);
}

#[test]
fn startup_corrects_differing_brightness_of_a_lit_monitor() {
    let night = SystemConfig::default().brightness.night;
    let (log, _) = started_on_with_brightness(night.wrapping_add(17) % 101);
    assert_eq!(count(&log, |c| *c == Call::Brightness(night)), 1);
}

// ── Schedule ──────────────────────────────────────────────────

#[test]
fn schedule_on_powers_up_settles_then_sets_brightness() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::ScheduleChanged(true));
    let night = SystemConfig::default().brightness.night;
    assert_eq!(
        *h.log.borrow(),
        vec![
            Call::Power(true),
            Call::Settle(Duration::from_secs(2)),
            Call::Brightness(night),
        ]
    );
    assert_eq!(h.coordinator.mode(), DisplayMode::SchedOn);
}

#[test]
fn schedule_on_uses_latest_light_sample() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::LightSampled(505.0));
    h.coordinator.handle(SignalEvent::ScheduleChanged(true));
    assert!(position(&h.log, &Call::Brightness(50)).is_some());
}

#[test]
fn schedule_off_from_interactive_shows_passive_before_power_off() {
    let mut h = harness(true, Some(true));
    h.coordinator.handle(SignalEvent::TouchDetected);
    assert_eq!(h.coordinator.foreground(), DisplayView::Interactive);

    h.coordinator.handle(SignalEvent::ScheduleChanged(false));
    let show = position(&h.log, &Call::Show(DisplayView::Passive)).unwrap();
    let off = position(&h.log, &Call::Power(false)).unwrap();
    assert!(show < off);
    assert_eq!(h.coordinator.mode(), DisplayMode::SchedOff);
}

// ── Motion override ───────────────────────────────────────────

#[test]
fn motion_while_off_powers_on_once_and_enters_override() {
    let mut h = harness(false, Some(false));

    h.coordinator.handle(SignalEvent::MotionDetected);
    assert_eq!(power_ons(&h.log), 1);
    assert_eq!(h.coordinator.mode(), DisplayMode::MotionOverride);
    assert_eq!(
        h.sink.count(&AppEvent::ModeChanged {
            from: DisplayMode::SchedOff,
            to: DisplayMode::MotionOverride
        }),
        1
    );

    h.clock.advance(10);
    h.coordinator.handle(SignalEvent::MotionDetected);
    assert_eq!(power_ons(&h.log), 1, "second pulse must not re-trigger power-on");

    let state = h.coordinator.state();
    let refreshed = state.last_motion.unwrap() + TimeDelta::seconds(180);
    assert_eq!(state.motion_active_until, Some(refreshed));
}

#[test]
fn motion_never_changes_the_view() {
    let mut h = harness(true, Some(true));
    h.coordinator.handle(SignalEvent::TouchDetected);
    h.log.borrow_mut().clear();
    h.coordinator.handle(SignalEvent::MotionDetected);
    assert!(h.log.borrow().is_empty());
    assert_eq!(h.coordinator.foreground(), DisplayView::Interactive);
}

#[test]
fn override_expiry_shows_passive_before_power_off() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::TouchDetected);
    assert_eq!(h.coordinator.foreground(), DisplayView::Interactive);

    h.clock.advance(181);
    h.coordinator.handle(SignalEvent::MotionTimeoutTick);

    let view = h
        .sink
        .position(&AppEvent::ViewChanged {
            from: DisplayView::Interactive,
            to: DisplayView::Passive,
        })
        .expect("view reverted");
    let off = h
        .sink
        .position(&AppEvent::PowerApplied(PowerState::Off))
        .expect("power off");
    assert!(view < off);
    assert_eq!(h.coordinator.mode(), DisplayMode::SchedOff);
    assert_eq!(h.coordinator.foreground(), DisplayView::Passive);
}

#[test]
fn refreshed_motion_postpones_expiry() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::MotionDetected);
    h.clock.advance(120);
    h.coordinator.handle(SignalEvent::MotionDetected);
    h.clock.advance(120);
    h.coordinator.handle(SignalEvent::MotionTimeoutTick);
    assert_eq!(h.coordinator.mode(), DisplayMode::MotionOverride);
    assert_eq!(count(&h.log, |c| *c == Call::Power(false)), 0);
}

// ── Touch ─────────────────────────────────────────────────────

#[test]
fn touch_while_off_powers_on_then_goes_interactive() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::TouchDetected);

    let on = h
        .sink
        .position(&AppEvent::PowerApplied(PowerState::On))
        .expect("power on");
    let interactive = h
        .sink
        .position(&AppEvent::ViewChanged {
            from: DisplayView::Passive,
            to: DisplayView::Interactive,
        })
        .expect("interactive");
    assert!(on < interactive);
    assert!(
        position(&h.log, &Call::Power(true)).unwrap()
            < position(&h.log, &Call::Show(DisplayView::Interactive)).unwrap()
    );
    assert_eq!(h.coordinator.mode(), DisplayMode::MotionOverride);
}

#[test]
fn inactivity_reverts_to_passive() {
    let mut h = harness(true, Some(true));
    h.coordinator.handle(SignalEvent::TouchDetected);

    h.clock.advance(29);
    h.coordinator.handle(SignalEvent::InactivityTick);
    assert_eq!(h.coordinator.foreground(), DisplayView::Interactive);

    h.clock.advance(1);
    h.coordinator.handle(SignalEvent::InactivityTick);
    assert_eq!(h.coordinator.foreground(), DisplayView::Passive);
    assert_eq!(power_ons(&h.log), 0);
}

#[test]
fn touch_on_dark_monitor_keeps_passive_view() {
    let mut h = harness(false, Some(false));
    h.fail_power.set(true);
    h.coordinator.handle(SignalEvent::TouchDetected);
    assert_eq!(h.coordinator.foreground(), DisplayView::Passive);
    assert_eq!(count(&h.log, |c| *c == Call::Show(DisplayView::Interactive)), 0);
}

// ── Light ─────────────────────────────────────────────────────

#[test]
fn light_while_off_never_touches_brightness() {
    let mut h = harness(false, Some(false));
    h.coordinator.handle(SignalEvent::LightSampled(800.0));
    assert_eq!(count(&h.log, |c| matches!(c, Call::Brightness(_))), 0);
}

#[test]
fn light_while_on_maps_through_curve() {
    let mut h = harness(true, Some(true));
    h.coordinator.handle(SignalEvent::LightSampled(1500.0));
    h.coordinator.handle(SignalEvent::LightSampled(5.0));
    assert_eq!(*h.log.borrow(), vec![Call::Brightness(90), Call::Brightness(10)]);
}

// ── Failures ──────────────────────────────────────────────────

#[test]
fn failed_power_on_is_retried_on_next_motion() {
    let mut h = harness(false, Some(false));
    h.fail_power.set(true);
    h.coordinator.handle(SignalEvent::MotionDetected);
    assert_eq!(h.coordinator.state().power, PowerReading::Unknown);
    assert_eq!(h.sink.count(&AppEvent::PowerFailed(PowerState::On)), 1);
    assert_eq!(count(&h.log, |c| matches!(c, Call::Brightness(_))), 0);

    h.fail_power.set(false);
    h.coordinator.handle(SignalEvent::MotionDetected);
    assert_eq!(power_ons(&h.log), 2);
    assert_eq!(h.coordinator.state().power, PowerReading::On);
}
