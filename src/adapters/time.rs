//! Host time adapter.
//!
//! Implements [`ClockPort`] with the local wall clock (`chrono::Local`) and
//! `std::thread::sleep`.  Schedule windows are local times of day, so the
//! system timezone is authoritative.

use core::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::app::ports::ClockPort;

/// Wall-clock time source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
