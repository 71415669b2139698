//! Fuzz target for the HTTP session reconstructor.
//!
//! Splits the input into messages on NUL bytes and alternates direction
//! using the low bit of each chunk's first byte. Exercises:
//! - Request and status line classification
//! - Header splitting and the header cap
//! - Body continuation and LIFO pairing

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsift::stream::{reconstruct_http, Direction, Message};

fuzz_target!(|data: &[u8]| {
    let messages: Vec<Message> = data
        .split(|b| *b == 0)
        .enumerate()
        .map(|(i, chunk)| {
            let direction = match chunk.first() {
                Some(b) if b & 1 == 1 => Direction::BtoA,
                _ => Direction::AtoB,
            };
            Message::new(i as u64, i as f64, direction, String::from_utf8_lossy(chunk))
        })
        .collect();

    let result = reconstruct_http(&messages);
    assert!(result.sessions.len() <= result.requests.len());
    assert_eq!(
        result.stats.unmatched_responses + result.sessions.len(),
        result.responses.len()
    );
});
