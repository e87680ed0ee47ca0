//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the rules for the hallway display: the coordinator
//! state machine and the view manager.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable without a real monitor, sensors or window system.

pub mod coordinator;
pub mod events;
pub mod ports;
pub mod state;
pub mod view;
