//! End-to-end event flow: source threads → EventQueue → Coordinator::run.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use hallway_display::app::coordinator::Coordinator;
use hallway_display::app::events::AppEvent;
use hallway_display::app::state::{DisplayMode, DisplayView, PowerState};
use hallway_display::config::SystemConfig;
use hallway_display::events::{EventQueue, SignalEvent};
use hallway_display::workers::{self, ShutdownToken};

use crate::mock_hw::{CallLog, ManualClock, MockDisplay, MockWindows, RecordingSink};

#[test]
fn queued_events_are_processed_in_order_until_cancelled() {
    let log: CallLog = Rc::new(RefCell::new(Vec::new()));
    let sink = RecordingSink::default();
    let mut coordinator = Coordinator::new(
        MockDisplay::new(log.clone(), Some(false)),
        MockWindows::new(log.clone()),
        sink.clone(),
        ManualClock::new(log.clone()),
        &SystemConfig::default(),
        false,
    );
    coordinator.start();

    let queue = EventQueue::new();
    let token = ShutdownToken::new();

    let tx = queue.sender("touch");
    let producer = workers::spawn("touch", move || {
        tx.send(SignalEvent::TouchDetected);
        tx.send(SignalEvent::LightSampled(1000.0));
    })
    .unwrap();

    let canceller = token.clone();
    let stopper = workers::spawn("stopper", move || {
        std::thread::sleep(Duration::from_millis(400));
        canceller.cancel();
    })
    .unwrap();

    coordinator.run(&queue, &token);
    assert!(workers::join_all(vec![producer, stopper], Duration::from_secs(2)).is_empty());

    let events = sink.events.borrow();
    let on = events
        .iter()
        .position(|e| *e == AppEvent::PowerApplied(PowerState::On))
        .unwrap();
    let interactive = events
        .iter()
        .position(|e| {
            *e == AppEvent::ViewChanged {
                from: DisplayView::Passive,
                to: DisplayView::Interactive,
            }
        })
        .unwrap();
    let bright = events
        .iter()
        .position(|e| *e == AppEvent::BrightnessApplied(90))
        .unwrap();
    assert!(on < interactive && interactive < bright);
    assert_eq!(coordinator.mode(), DisplayMode::MotionOverride);
    assert!(queue.is_empty());
}
