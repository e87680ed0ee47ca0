//! Signal-source workers and their shared cancellation.
//!
//! Each source runs on its own named thread and feeds the coordinator
//! through an [`EventSender`].  Workers block only on their own I/O and
//! their own sliced sleeps, never on coordinator state.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  schedule   motion    light     touch    motion-tick  view-tick
//! │     │         │         │         │           │          │
//! │     ▼         ▼         ▼         ▼           ▼          ▼
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              EventQueue (bounded FIFO)                 │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                  Coordinator::run()                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Shutdown: [`ShutdownToken::cancel`] is observed by every worker within
//! [`SLEEP_SLICE`]; [`join_all`] then waits a bounded time for the threads.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use embedded_hal::digital::InputPin;
use log::{debug, info, warn};

use crate::app::ports::{ClockPort, LightSensorPort};
use crate::config::TouchConfig;
use crate::events::{EventSender, SignalEvent};
use crate::schedule::{ScheduleWatcher, WeeklySchedule};
use crate::sensors::light::LightFilter;
use crate::sensors::motion::MotionDetector;
use crate::sensors::touch::{TouchReader, find_touch_device};

/// Longest uninterrupted sleep inside a worker.
pub const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Touch node polling interval.
const TOUCH_POLL: Duration = Duration::from_millis(50);

// ═══════════════════════════════════════════════════════════════
//  Cancellation
// ═══════════════════════════════════════════════════════════════

/// Shared "keep running" flag, inverted: workers stop once it is cancelled.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken(Arc<AtomicBool>);

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sleep for `duration` in [`SLEEP_SLICE`] steps.
    /// Returns `false` if cancelled before the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Thread handles
// ═══════════════════════════════════════════════════════════════

pub struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl Worker {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Start a named worker thread.
pub fn spawn<F>(name: &'static str, body: F) -> std::io::Result<Worker>
where
    F: FnOnce() + Send + 'static,
{
    let handle = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(body)?;
    debug!("Worker '{}' started", name);
    Ok(Worker { name, handle })
}

/// Wait up to `timeout` (shared across all workers) for every thread to
/// finish.  Returns the names of the workers that did not stop in time;
/// those threads are detached.
pub fn join_all(workers: Vec<Worker>, timeout: Duration) -> Vec<&'static str> {
    let deadline = Instant::now() + timeout;
    let mut pending = workers;
    while !pending.is_empty() && Instant::now() < deadline {
        let (finished, running): (Vec<_>, Vec<_>) =
            pending.into_iter().partition(|w| w.handle.is_finished());
        for w in finished {
            if w.handle.join().is_err() {
                warn!("Worker '{}' panicked", w.name);
            } else {
                debug!("Worker '{}' stopped", w.name);
            }
        }
        pending = running;
        if !pending.is_empty() {
            std::thread::sleep(Duration::from_millis(10));
        }
    }
    let stuck: Vec<_> = pending.iter().map(|w| w.name).collect();
    for name in &stuck {
        warn!("Worker '{}' did not stop within {:?}", name, timeout);
    }
    stuck
}

// ═══════════════════════════════════════════════════════════════
//  Source loops
// ═══════════════════════════════════════════════════════════════

/// Re-evaluate the schedule every `interval`, emitting only changes.
/// A transition the queue could not take is offered again next interval.
pub fn schedule_worker<C: ClockPort>(
    schedule: WeeklySchedule,
    initial: bool,
    clock: C,
    interval: Duration,
    tx: EventSender,
    token: ShutdownToken,
) {
    let mut watcher = ScheduleWatcher::new(schedule, initial);
    loop {
        if let Some(on) = watcher.pending(clock.now()) {
            if tx.send(SignalEvent::ScheduleChanged(on)) {
                info!("Schedule: window {}", if on { "entered" } else { "left" });
                watcher.commit(on);
            }
        }
        if !token.sleep(interval) {
            break;
        }
    }
}

/// Sample the PIR line and emit one event per debounced rising edge.
pub fn motion_worker<P: InputPin>(
    mut detector: MotionDetector<P>,
    poll_interval: Duration,
    tx: EventSender,
    token: ShutdownToken,
) {
    let epoch = Instant::now();
    let mut failing = false;
    loop {
        let now_ms = u64::try_from(epoch.elapsed().as_millis()).unwrap_or(u64::MAX);
        match detector.poll(now_ms) {
            Ok(true) => {
                debug!("Motion: edge");
                tx.send(SignalEvent::MotionDetected);
                failing = false;
            }
            Ok(false) => failing = false,
            Err(e) => {
                if !failing {
                    warn!("Motion: read failed: {}", e);
                }
                failing = true;
            }
        }
        if !token.sleep(poll_interval) {
            break;
        }
    }
}

/// Sample ambient light, reporting only changes past the filter threshold.
/// A failed read sends nothing and backs off; a dropped sample is not
/// marked reported, so the next reading is compared with the last one the
/// coordinator actually saw.
pub fn light_worker<L: LightSensorPort>(
    mut sensor: L,
    mut filter: LightFilter,
    interval: Duration,
    error_backoff: Duration,
    tx: EventSender,
    token: ShutdownToken,
) {
    loop {
        let pause = match sensor.read_lux() {
            Ok(lux) => {
                if filter.should_report(lux) && tx.send(SignalEvent::LightSampled(lux)) {
                    debug!("Light: {:.1} lux", lux);
                    filter.mark_reported(lux);
                }
                interval
            }
            Err(e) => {
                warn!("Light: read failed: {}", e);
                error_backoff
            }
        };
        if !token.sleep(pause) {
            break;
        }
    }
}

/// Read touch-downs from the evdev node, reopening after any failure.
pub fn touch_worker(cfg: TouchConfig, tx: EventSender, token: ShutdownToken) {
    let reconnect = Duration::from_secs(cfg.reconnect_delay_secs);
    while !token.is_cancelled() {
        let opened = find_touch_device(Path::new(&cfg.device), &cfg.name_keywords)
            .and_then(|path| TouchReader::open(&path));
        let mut reader = match opened {
            Ok(r) => r,
            Err(e) => {
                warn!("Touch: device unavailable: {}", e);
                token.sleep(reconnect);
                continue;
            }
        };
        loop {
            match reader.poll() {
                Ok(0) => {}
                Ok(_) => {
                    tx.send(SignalEvent::TouchDetected);
                }
                Err(e) => {
                    warn!("Touch: read failed, reconnecting: {}", e);
                    token.sleep(reconnect);
                    break;
                }
            }
            if !token.sleep(TOUCH_POLL) {
                return;
            }
        }
    }
}

/// Emit `event` every `interval` until cancelled.
pub fn ticker(event: SignalEvent, interval: Duration, tx: EventSender, token: ShutdownToken) {
    while token.sleep(interval) {
        tx.send(event);
    }
}
