//! BH1750 ambient light sensor driver.
//!
//! One-time high-resolution measurement: write the mode opcode, wait for
//! the conversion, read two big-endian bytes.  `lux = raw / 1.2`.
//!
//! Generic over `embedded-hal` 1.0 [`I2c`] and [`DelayNs`] so the same
//! driver runs on `linux-embedded-hal` in production and on a mock bus in
//! tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::LightSensorPort;
use crate::error::SensorError;

/// Default address with the ADDR pin low.
pub const BH1750_ADDR: u8 = 0x23;

/// One-time H-resolution mode (1 lx, sensor powers down afterwards).
const ONE_TIME_HIGH_RES: u8 = 0x20;

/// Maximum H-resolution conversion time.
const CONVERSION_MS: u32 = 180;

pub struct Bh1750<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C: I2c, D: DelayNs> Bh1750<I2C, D> {
    pub fn new(i2c: I2C, delay: D, address: u8) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    pub fn read_raw(&mut self) -> Result<u16, SensorError> {
        self.i2c
            .write(self.address, &[ONE_TIME_HIGH_RES])
            .map_err(|_| SensorError::I2cReadFailed)?;
        self.delay.delay_ms(CONVERSION_MS);
        let mut buf = [0u8; 2];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(|_| SensorError::I2cReadFailed)?;
        Ok(u16::from_be_bytes(buf))
    }
}

impl<I2C: I2c, D: DelayNs> LightSensorPort for Bh1750<I2C, D> {
    fn read_lux(&mut self) -> Result<f32, SensorError> {
        Ok(f32::from(self.read_raw()?) / 1.2)
    }
}

/// Suppresses samples that moved less than the change threshold since the
/// last reported one.
#[derive(Debug, Clone)]
pub struct LightFilter {
    threshold: f32,
    last_reported: Option<f32>,
}

impl LightFilter {
    pub fn new(threshold_lux: f32) -> Self {
        Self {
            threshold: threshold_lux,
            last_reported: None,
        }
    }

    /// Whether `lux` moved far enough to report.  The first sample always does.
    pub fn should_report(&self, lux: f32) -> bool {
        self.last_reported
            .is_none_or(|last| (lux - last).abs() > self.threshold)
    }

    /// Record `lux` as delivered; later samples are compared against it.
    pub fn mark_reported(&mut self, lux: f32) {
        self.last_reported = Some(lux);
    }

    /// [`should_report`](Self::should_report) and
    /// [`mark_reported`](Self::mark_reported) in one step.
    pub fn accept(&mut self, lux: f32) -> Option<f32> {
        if !self.should_report(lux) {
            return None;
        }
        self.mark_reported(lux);
        Some(lux)
    }
}
