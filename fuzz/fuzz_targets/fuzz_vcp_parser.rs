//! Fuzz target: ddcutil response parsers
//!
//! Feeds arbitrary text to the power and brightness parsers.  They must
//! never panic, and a parsed brightness must be a valid percentage.
//!
//! cargo fuzz run fuzz_vcp_parser

#![no_main]

use hallway_display::device::ddc::{parse_brightness_response, parse_power_response};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let _ = parse_power_response(&text, "1");
    let _ = parse_power_response(&text, "0x01");

    if let Ok(pct) = parse_brightness_response(&text) {
        assert!(pct <= 100, "brightness out of range: {pct}");
    }
});
