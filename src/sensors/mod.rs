//! Sensor drivers feeding the coordinator.
//!
//! | Sensor   | Source                       | Produces              |
//! |----------|------------------------------|-----------------------|
//! | `light`  | BH1750 over I2C              | filtered lux samples  |
//! | `motion` | PIR on a GPIO line           | debounced rising edges|
//! | `touch`  | evdev touchscreen node       | touch-down counts     |
//!
//! Drivers are generic over `embedded-hal` traits so the same code runs on
//! `linux-embedded-hal` devices and on test doubles.

pub mod light;
pub mod motion;
pub mod touch;
