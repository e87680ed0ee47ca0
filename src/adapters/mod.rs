//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements       | Connects to                      |
//! |---------------|------------------|----------------------------------|
//! | `config_file` | ConfigPort       | TOML file on disk                |
//! | `hardware`    | LightSensorPort  | `/dev/i2c-N` (BH1750)            |
//! |               | InputPin         | `/dev/gpiochipN` (PIR)           |
//! | `log_sink`    | EventSink        | `log` / tracing subscriber       |
//! | `time`        | ClockPort        | local wall clock                 |
//! | `windows`     | WindowPort       | `xdotool` on the X session       |

pub mod config_file;
#[cfg(target_os = "linux")]
pub mod hardware;
pub mod log_sink;
pub mod time;
pub mod windows;
