//! Closed-form control laws applied by the coordinator.

pub mod brightness;
