//! Host process drivers.

pub mod process;
