//! Ambient light to backlight brightness mapping
//!
//! Piecewise-linear, monotonic in lux and clamped to the configured bounds:
//!
//! ```text
//!  MAX ┤                    ┌──────────
//!      │                 ╱
//!      │              ╱
//!  MIN ┤────────┘
//!      └────────┬─────────┬──────────▶ lux
//!            low_lux    high_lux
//! ```

use crate::config::BrightnessConfig;

/// Brightness curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessCurve {
    min: u8,
    max: u8,
    low_lux: f32,
    high_lux: f32,
}

impl BrightnessCurve {
    pub fn new(min: u8, max: u8, low_lux: f32, high_lux: f32) -> Self {
        Self {
            min: min.min(100),
            max: max.min(100),
            low_lux,
            high_lux,
        }
    }

    pub fn from_config(cfg: &BrightnessConfig) -> Self {
        Self::new(cfg.min, cfg.max, cfg.low_lux, cfg.high_lux)
    }

    /// Brightness percentage for an ambient reading.
    ///
    /// Non-finite readings map to the minimum.
    pub fn level(&self, lux: f32) -> u8 {
        if !lux.is_finite() || lux <= self.low_lux {
            return self.min;
        }
        if lux >= self.high_lux {
            return self.max;
        }
        let span = f32::from(self.max) - f32::from(self.min);
        let fraction = (lux - self.low_lux) / (self.high_lux - self.low_lux);
        let level = f32::from(self.min) + fraction * span;
        (level as i32).clamp(0, 100) as u8
    }
}
