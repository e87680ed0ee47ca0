//! PIR motion detector.
//!
//! The PIR output goes high while motion is sensed.  The line is sampled
//! from the motion worker; a low→high transition is a motion pulse.  Edges
//! closer than the debounce window to the last accepted one are ignored,
//! matching the kernel-side bounce time of the GPIO line.

use embedded_hal::digital::InputPin;

use crate::error::SensorError;

pub struct MotionDetector<P> {
    pin: P,
    debounce_ms: u64,
    was_high: bool,
    last_edge_ms: Option<u64>,
}

impl<P: InputPin> MotionDetector<P> {
    pub fn new(pin: P, debounce_ms: u64) -> Self {
        Self {
            pin,
            debounce_ms,
            was_high: false,
            last_edge_ms: None,
        }
    }

    /// Sample the line at monotonic time `now_ms`.
    /// Returns `true` on a debounced rising edge.
    pub fn poll(&mut self, now_ms: u64) -> Result<bool, SensorError> {
        let high = self.pin.is_high().map_err(|_| SensorError::GpioReadFailed)?;
        let rising = high && !self.was_high;
        self.was_high = high;
        if !rising {
            return Ok(false);
        }
        if let Some(last) = self.last_edge_ms {
            if now_ms.saturating_sub(last) < self.debounce_ms {
                return Ok(false);
            }
        }
        self.last_edge_ms = Some(now_ms);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct ScriptedPin {
        levels: Vec<bool>,
    }

    impl ErrorType for ScriptedPin {
        type Error = ErrorKind;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            if self.levels.is_empty() {
                return Err(ErrorKind::Other);
            }
            Ok(self.levels.remove(0))
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    fn detector(levels: &[bool]) -> MotionDetector<ScriptedPin> {
        MotionDetector::new(
            ScriptedPin {
                levels: levels.to_vec(),
            },
            300,
        )
    }

    #[test]
    fn only_rising_edges_count() {
        let mut d = detector(&[false, true, true, true, false]);
        let pulses: Vec<bool> = (0..5).map(|i| d.poll(i * 1000).unwrap()).collect();
        assert_eq!(pulses, vec![false, true, false, false, false]);
    }

    #[test]
    fn bounces_inside_window_are_ignored() {
        let mut d = detector(&[true, false, true, false, true]);
        assert!(d.poll(0).unwrap());
        assert!(!d.poll(100).unwrap());
        assert!(!d.poll(200).unwrap());
        assert!(!d.poll(250).unwrap());
        assert!(d.poll(400).unwrap());
    }

    #[test]
    fn read_error_is_reported() {
        let mut d = detector(&[]);
        assert_eq!(d.poll(0), Err(SensorError::GpioReadFailed));
    }
}
