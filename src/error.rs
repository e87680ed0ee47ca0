//! Error types for the hallway display, one enum per subsystem.
//!
//! Hardware failures never escape the device layer as panics: they come
//! back as [`HardwareError`] values the coordinator logs and absorbs.
//! Startup wraps [`ConfigError`] in `anyhow` context.

use core::fmt;
use core::time::Duration;

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Failure of an external control tool.
///
/// `Timeout` and `Rejected` are retryable; `Unavailable` means the tool is
/// not installed and the mechanism should be skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// The control tool (or a file it depends on) is missing.
    Unavailable(String),
    /// The command did not finish within its deadline and was killed.
    Timeout { program: String, after: Duration },
    /// The command exited with a non-zero status.
    Rejected {
        program: String,
        status: Option<i32>,
        detail: String,
    },
    /// The command succeeded but its output matched no known form.
    Unparseable(String),
    /// Every mechanism in the power chain failed or was unavailable.
    Exhausted { attempted: usize },
}

impl HardwareError {
    /// Whether another attempt with the same mechanism may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Rejected { .. })
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(what) => write!(f, "{what} unavailable"),
            Self::Timeout { program, after } => {
                write!(f, "{program} timed out after {:.1}s", after.as_secs_f32())
            }
            Self::Rejected {
                program,
                status,
                detail,
            } => match status {
                Some(code) => write!(f, "{program} exited with status {code}: {detail}"),
                None => write!(f, "{program} terminated by signal: {detail}"),
            },
            Self::Unparseable(text) => write!(f, "unrecognised response: {text:?}"),
            Self::Exhausted { attempted } => {
                write!(f, "all power mechanisms failed ({attempted} attempted)")
            }
        }
    }
}

impl std::error::Error for HardwareError {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// A signal source read failed.  The coordinator never sees these: the
/// source worker logs them and simply emits no event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// I2C transaction with the light sensor failed.
    I2cReadFailed,
    /// GPIO line read failed.
    GpioReadFailed,
    /// No input device matched the configured path or name keywords.
    DeviceMissing(String),
    /// Opening or reading a device node failed.
    Io(std::io::ErrorKind),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I2cReadFailed => write!(f, "I2C read failed"),
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
            Self::DeviceMissing(what) => write!(f, "device missing: {what}"),
            Self::Io(kind) => write!(f, "device I/O error: {kind}"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<std::io::Error> for SensorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config file at the given path.
    NotFound(String),
    /// The file is not valid TOML for [`SystemConfig`](crate::config::SystemConfig).
    Parse(String),
    /// A schedule time string is not `HH:MM`.  Fatal at startup.
    InvalidTime { field: &'static str, value: String },
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Reading or writing the file failed.
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config not found at {path}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::InvalidTime { field, value } => {
                write!(f, "{field}: {value:?} is not a HH:MM time")
            }
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
