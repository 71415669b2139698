//! Fuzz target for the SMTP session reconstructor.
//!
//! The whole input is one client message, so DATA collection, header
//! folding and the MIME scan all run over attacker-controlled text.

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsift::stream::{reconstruct_smtp, Direction, Message, StreamEndpoints};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let messages = vec![
        Message::new(0, 0.0, Direction::AtoB, "DATA\r\n"),
        Message::new(1, 0.1, Direction::AtoB, text.as_ref()),
    ];

    let session = reconstruct_smtp(&messages, &StreamEndpoints::default());
    assert!(session.has_data);
    assert!(session.attachments.iter().all(|a| a.is_attachment));
});
