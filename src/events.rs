//! Signal event fan-in.
//!
//! Events are produced by one worker thread per signal source and consumed
//! by the single coordinator thread, strictly in arrival order.
//!
//! ```text
//! ┌──────────────┐
//! │ Schedule     │──┐
//! │ Motion (PIR) │──┤     ┌──────────────────┐     ┌──────────────┐
//! │ Light        │──┼────▶│ EventQueue       │────▶│ Coordinator  │
//! │ Touch        │──┤     │ bounded, FIFO    │     │ (consumer)   │
//! │ Tickers      │──┘     └──────────────────┘     └──────────────┘
//! └──────────────┘
//! ```
//!
//! Producers never block: when the queue is full the event is logged and
//! dropped, and `send` returns `false`.  Edge-triggered sources (schedule,
//! light) commit their state only after a successful send, so a dropped
//! edge is offered again on their next poll.  Ticks are coalesced: at most
//! one of each kind is pending, so a stalled coordinator cannot fill the
//! queue with them.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{trace, warn};

/// Maximum number of pending events.
pub const EVENT_QUEUE_DEPTH: usize = 32;

/// Inbound events from the signal sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SignalEvent {
    /// The schedule window membership flipped.
    ScheduleChanged(bool),
    /// Debounced rising edge on the PIR line.
    MotionDetected,
    /// A light sample that moved past the change threshold.
    LightSampled(f32),
    /// A touch-down on the panel.
    TouchDetected,
    /// Periodic override expiry check.
    MotionTimeoutTick,
    /// Periodic view inactivity check.
    InactivityTick,
}

impl SignalEvent {
    /// Coalescing slot for periodic ticks; `None` for real signals.
    fn tick_slot(self) -> Option<usize> {
        match self {
            Self::MotionTimeoutTick => Some(0),
            Self::InactivityTick => Some(1),
            _ => None,
        }
    }
}

/// Bounded multi-producer queue feeding the coordinator.
pub struct EventQueue {
    channel: Channel<CriticalSectionRawMutex, SignalEvent, EVENT_QUEUE_DEPTH>,
    /// Set while a tick of that kind sits in the channel.
    ticks_pending: [AtomicBool; 2],
}

impl EventQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channel: Channel::new(),
            ticks_pending: [AtomicBool::new(false), AtomicBool::new(false)],
        })
    }

    fn dequeued(&self, event: SignalEvent) -> SignalEvent {
        if let Some(slot) = event.tick_slot() {
            self.ticks_pending[slot].store(false, Ordering::Release);
        }
        event
    }

    /// A sending handle for one source.  `source` tags drop warnings.
    pub fn sender(self: &Arc<Self>, source: &'static str) -> EventSender {
        EventSender {
            queue: Arc::clone(self),
            source,
        }
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// Blocks the calling thread; the timer runs on the `async-io-mini`
    /// reactor so no busy-spinning occurs.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SignalEvent> {
        futures_lite::future::block_on(futures_lite::future::or(
            async { Some(self.dequeued(self.channel.receive().await)) },
            async {
                async_io_mini::Timer::after(timeout).await;
                None
            },
        ))
    }

    /// Pop the next event without waiting.
    pub fn try_recv(&self) -> Option<SignalEvent> {
        self.channel.try_receive().ok().map(|e| self.dequeued(e))
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

/// Producer half held by a source worker.
#[derive(Clone)]
pub struct EventSender {
    queue: Arc<EventQueue>,
    source: &'static str,
}

impl EventSender {
    /// Enqueue without blocking.  Returns `false` if the event was dropped.
    /// A tick whose previous instance is still queued is absorbed into it
    /// and counts as delivered.
    pub fn send(&self, event: SignalEvent) -> bool {
        let slot = event.tick_slot();
        if let Some(slot) = slot {
            if self.queue.ticks_pending[slot].swap(true, Ordering::AcqRel) {
                trace!("{}: {:?} already pending", self.source, event);
                return true;
            }
        }
        if self.queue.channel.try_send(event).is_err() {
            if let Some(slot) = slot {
                self.queue.ticks_pending[slot].store(false, Ordering::Release);
            }
            warn!("{}: event queue full, dropping {:?}", self.source, event);
            return false;
        }
        true
    }

    pub fn source(&self) -> &'static str {
        self.source
    }
}
