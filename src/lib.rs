//! Hallway display coordinator library.
//!
//! Exposes the domain core, adapters and workers so the binary and the
//! integration tests share one build of every module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod device;
pub mod drivers;
pub mod error;
pub mod events;
pub mod schedule;
pub mod sensors;
pub mod workers;
