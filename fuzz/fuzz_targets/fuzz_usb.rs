//! Fuzz target for the USBPcap pseudo-header decoder.
//!
//! The first byte selects the setup packet flag; the rest is the frame.
//! Only buffers shorter than the legacy header may fail.

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsift::protocol::decode_usb_frame;

fuzz_target!(|data: &[u8]| {
    let Some((flag, frame)) = data.split_first() else {
        return;
    };

    match decode_usb_frame(frame, flag & 1 == 1) {
        Ok(decoded) => {
            assert!(frame.len() >= 18);
            assert!(decoded.data_payload.len() <= decoded.data_length as usize);
            assert!(decoded.endpoint_number < 16);
        }
        Err(_) => assert!(frame.len() < 18),
    }
});
