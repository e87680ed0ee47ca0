//! Fuzz target: evdev record decoding
//!
//! Arbitrary byte streams must decode without panicking, and the touch
//! count can never exceed the number of whole records.
//!
//! cargo fuzz run fuzz_touch_events

#![no_main]

use hallway_display::sensors::touch::{INPUT_EVENT_SIZE, InputEvent, count_touch_downs};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let touches = count_touch_downs(data);
    assert!(touches <= data.len() / INPUT_EVENT_SIZE);

    for record in data.chunks(INPUT_EVENT_SIZE) {
        let decoded = InputEvent::decode(record);
        assert_eq!(decoded.is_some(), record.len() == INPUT_EVENT_SIZE);
    }
});
