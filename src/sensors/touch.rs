//! Touchscreen reader on a Linux evdev node.
//!
//! Raw `struct input_event` records are decoded directly from the device
//! file.  A touch-down is either `EV_KEY/BTN_TOUCH` pressed or a new
//! multitouch contact (`EV_ABS/ABS_MT_TRACKING_ID` != -1).
//!
//! The node is opened non-blocking so the reader can return to its caller
//! (and the caller can check for shutdown) when no events are pending.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::SensorError;

pub const EV_KEY: u16 = 0x01;
pub const EV_ABS: u16 = 0x03;
pub const BTN_TOUCH: u16 = 0x14a;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;

/// `timeval` (two C longs) + type + code + value.
pub const INPUT_EVENT_SIZE: usize = 2 * core::mem::size_of::<std::ffi::c_long>() + 8;

/// Linux `O_NONBLOCK`.
#[cfg(target_os = "linux")]
const O_NONBLOCK: i32 = 0o4000;

const PROC_DEVICES: &str = "/proc/bus/input/devices";

/// The fields of an input event this reader cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl InputEvent {
    /// Decode one native-endian `input_event` record.
    /// Returns `None` if `record` is shorter than [`INPUT_EVENT_SIZE`].
    pub fn decode(record: &[u8]) -> Option<Self> {
        let tail = record.get(INPUT_EVENT_SIZE - 8..INPUT_EVENT_SIZE)?;
        Some(Self {
            kind: u16::from_ne_bytes([tail[0], tail[1]]),
            code: u16::from_ne_bytes([tail[2], tail[3]]),
            value: i32::from_ne_bytes([tail[4], tail[5], tail[6], tail[7]]),
        })
    }

    pub fn is_touch_down(&self) -> bool {
        match (self.kind, self.code) {
            (EV_KEY, BTN_TOUCH) => self.value == 1,
            (EV_ABS, ABS_MT_TRACKING_ID) => self.value != -1,
            _ => false,
        }
    }
}

/// Count touch-downs in a buffer of whole records.
pub fn count_touch_downs(buf: &[u8]) -> usize {
    buf.chunks_exact(INPUT_EVENT_SIZE)
        .filter_map(InputEvent::decode)
        .filter(InputEvent::is_touch_down)
        .count()
}

// ═══════════════════════════════════════════════════════════════
//  Device discovery
// ═══════════════════════════════════════════════════════════════

/// Bits per word in the `B: KEY=` capability bitmap (one C long each).
const KEY_WORD_BITS: usize = 8 * core::mem::size_of::<std::ffi::c_long>();

/// Whether a `B: KEY=` bitmap has `code` set.  Words are printed most
/// significant first, so word 0 is the last one on the line.
pub fn has_key_capability(bitmap: &str, code: u16) -> bool {
    let code = usize::from(code);
    let words: Vec<&str> = bitmap.split_whitespace().collect();
    let Some(index) = words.len().checked_sub(1 + code / KEY_WORD_BITS) else {
        return false;
    };
    u64::from_str_radix(words[index], 16)
        .is_ok_and(|word| (word >> (code % KEY_WORD_BITS)) & 1 == 1)
}

/// Event node names (`eventN`) of likely touchscreens, parsed from
/// `/proc/bus/input/devices` text.  Devices whose name contains a keyword
/// come first, then any other device reporting `BTN_TOUCH`.
pub fn touch_candidates(proc_text: &str, keywords: &[String]) -> Vec<String> {
    let mut by_name = Vec::new();
    let mut by_capability = Vec::new();
    for block in proc_text.split("\n\n") {
        let field = |prefix: &str| block.lines().find_map(|l| l.strip_prefix(prefix));
        let Some(node) = field("H: Handlers=")
            .and_then(|h| h.split_whitespace().find(|t| t.starts_with("event")))
        else {
            continue;
        };
        let name = field("N: Name=")
            .unwrap_or("")
            .trim_matches('"')
            .to_ascii_lowercase();
        if keywords.iter().any(|k| name.contains(&k.to_ascii_lowercase())) {
            by_name.push(node.to_string());
        } else if field("B: KEY=").is_some_and(|keys| has_key_capability(keys, BTN_TOUCH)) {
            debug!("Touch: {} reports BTN_TOUCH", name);
            by_capability.push(node.to_string());
        }
    }
    by_name.extend(by_capability);
    by_name
}

/// The configured device if it exists, else the first discovered candidate.
pub fn find_touch_device(configured: &Path, keywords: &[String]) -> Result<PathBuf, SensorError> {
    if configured.exists() {
        return Ok(configured.to_path_buf());
    }
    let text = std::fs::read_to_string(PROC_DEVICES)?;
    touch_candidates(&text, keywords)
        .into_iter()
        .map(|node| Path::new("/dev/input").join(node))
        .find(|p| p.exists())
        .ok_or_else(|| SensorError::DeviceMissing(configured.display().to_string()))
}

// ═══════════════════════════════════════════════════════════════
//  Reader
// ═══════════════════════════════════════════════════════════════

pub struct TouchReader {
    file: File,
    /// Bytes of a record split across reads.
    pending: Vec<u8>,
}

impl TouchReader {
    pub fn open(path: &Path) -> Result<Self, SensorError> {
        let mut options = OpenOptions::new();
        options.read(true);
        #[cfg(target_os = "linux")]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.custom_flags(O_NONBLOCK);
        }
        let file = options.open(path)?;
        info!("Touch: reading {}", path.display());
        Ok(Self {
            file,
            pending: Vec::with_capacity(INPUT_EVENT_SIZE * 64),
        })
    }

    /// Drain whatever is available and return the number of touch-downs.
    /// Returns `Ok(0)` immediately when nothing is pending.
    pub fn poll(&mut self) -> Result<usize, SensorError> {
        let mut buf = [0u8; INPUT_EVENT_SIZE * 64];
        let mut touches = 0;
        loop {
            match self.file.read(&mut buf) {
                Ok(0) => return Err(SensorError::Io(ErrorKind::UnexpectedEof)),
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    let whole = self.pending.len() - self.pending.len() % INPUT_EVENT_SIZE;
                    touches += count_touch_downs(&self.pending[..whole]);
                    self.pending.drain(..whole);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if touches > 0 {
            debug!("Touch: {} touch-down(s)", touches);
        }
        Ok(touches)
    }
}
