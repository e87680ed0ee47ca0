//! Hardware adapter: opens the Linux character devices behind the sensors.
//!
//! The drivers in [`crate::sensors`] are generic over `embedded-hal`; this
//! module binds them to `linux-embedded-hal` so nothing else in the crate
//! names a concrete device type.

use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay, I2cdev};
use log::info;

use crate::config::{LightConfig, MotionConfig};
use crate::error::SensorError;
use crate::sensors::light::Bh1750;
use crate::sensors::motion::MotionDetector;

const PIR_CONSUMER: &str = "hallway-pir";

pub type LightSensor = Bh1750<I2cdev, Delay>;
pub type MotionSensor = MotionDetector<CdevPin>;

fn missing(what: &str, e: impl core::fmt::Display) -> SensorError {
    SensorError::DeviceMissing(format!("{what}: {e}"))
}

/// BH1750 on the configured I2C bus.
pub fn open_light_sensor(cfg: &LightConfig) -> Result<LightSensor, SensorError> {
    let bus = I2cdev::new(&cfg.i2c_device).map_err(|e| missing(&cfg.i2c_device, e))?;
    info!(
        "Light sensor: BH1750 at {:#04x} on {}",
        cfg.address, cfg.i2c_device
    );
    Ok(Bh1750::new(bus, Delay, cfg.address))
}

/// PIR input line, requested as a plain input.
pub fn open_motion_sensor(cfg: &MotionConfig) -> Result<MotionSensor, SensorError> {
    let mut chip = Chip::new(&cfg.gpio_chip).map_err(|e| missing(&cfg.gpio_chip, e))?;
    let handle = chip
        .get_line(cfg.line)
        .and_then(|line| line.request(LineRequestFlags::INPUT, 0, PIR_CONSUMER))
        .map_err(|e| missing(&format!("{} line {}", cfg.gpio_chip, cfg.line), e))?;
    let pin = CdevPin::new(handle).map_err(|e| missing("PIR pin", e))?;
    info!("Motion sensor: {} line {}", cfg.gpio_chip, cfg.line);
    Ok(MotionDetector::new(pin, cfg.debounce_ms))
}
