//! View manager: which content view is in the foreground.
//!
//! Exactly one of [`DisplayView::Passive`] and [`DisplayView::Interactive`]
//! is foreground.  Switching always shows the target before hiding the
//! other, so the screen never passes through a state with neither window
//! mapped.
//!
//! | Input                    | Passive foreground        | Interactive foreground |
//! |--------------------------|---------------------------|------------------------|
//! | touch                    | → Interactive, reset timer| reset timer            |
//! | inactivity deadline hit  | —                         | → Passive              |
//!
//! Window-control failures are logged; the manager's state still advances so
//! the next transition re-issues show/hide against the intended layout.

use core::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use log::{debug, info, warn};

use super::ports::WindowPort;
use super::state::{DisplayView, wall_delta};

pub struct ViewManager<W: WindowPort> {
    windows: W,
    foreground: DisplayView,
    inactivity_timeout: TimeDelta,
    deadline: Option<NaiveDateTime>,
}

impl<W: WindowPort> ViewManager<W> {
    pub fn new(windows: W, inactivity_timeout: Duration) -> Self {
        Self {
            windows,
            foreground: DisplayView::Passive,
            inactivity_timeout: wall_delta(inactivity_timeout),
            deadline: None,
        }
    }

    /// Force the passive layout regardless of the cached foreground.
    /// Used at startup, when the real window stacking is unknown.
    pub fn reset(&mut self) {
        self.show_then_hide(DisplayView::Passive);
        self.foreground = DisplayView::Passive;
        self.deadline = None;
    }

    /// Bring `view` to the foreground.  Returns `true` if anything changed.
    pub fn activate(&mut self, view: DisplayView) -> bool {
        if self.foreground == view {
            debug!("View: {:?} already foreground", view);
            return false;
        }
        self.show_then_hide(view);
        info!("View: {:?} -> {:?}", self.foreground, view);
        self.foreground = view;
        if view == DisplayView::Passive {
            self.deadline = None;
        }
        true
    }

    /// Push the inactivity deadline out from `now`.
    pub fn record_interaction(&mut self, now: NaiveDateTime) {
        self.deadline = Some(now + self.inactivity_timeout);
    }

    /// A touch: switch to the interactive view if needed and reset the
    /// deadline.  Returns `true` if the foreground changed.
    pub fn touch(&mut self, now: NaiveDateTime) -> bool {
        let changed = self.activate(DisplayView::Interactive);
        self.record_interaction(now);
        changed
    }

    /// Revert to the passive view once the deadline has passed.
    /// Returns `true` if the foreground changed.
    pub fn check_inactivity(&mut self, now: NaiveDateTime) -> bool {
        if self.foreground != DisplayView::Interactive {
            return false;
        }
        match self.deadline {
            Some(deadline) if now < deadline => false,
            _ => {
                info!("View: no interaction, reverting to passive");
                self.activate(DisplayView::Passive)
            }
        }
    }

    pub fn foreground(&self) -> DisplayView {
        self.foreground
    }

    pub fn deadline(&self) -> Option<NaiveDateTime> {
        self.deadline
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }

    // ── Internal ──────────────────────────────────────────────

    fn show_then_hide(&mut self, view: DisplayView) {
        if let Err(e) = self.windows.show(view) {
            warn!("View: show {:?} failed: {}", view, e);
        }
        if let Err(e) = self.windows.hide(view.other()) {
            warn!("View: hide {:?} failed: {}", view.other(), e);
        }
    }
}
