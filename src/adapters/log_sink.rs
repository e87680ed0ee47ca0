//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (rendered by the tracing subscriber installed in
//! `main`).  A status-page or MQTT adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { mode, view } => {
                info!("START | mode={:?} view={:?}", mode, view);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PowerApplied(state) => {
                info!("POWER | {}", state);
            }
            AppEvent::PowerFailed(state) => {
                warn!("POWER | {} failed, state unknown", state);
            }
            AppEvent::BrightnessApplied(pct) => {
                info!("LIGHT | brightness={}%", pct);
            }
            AppEvent::ViewChanged { from, to } => {
                info!("VIEW  | {:?} -> {:?}", from, to);
            }
        }
    }
}
