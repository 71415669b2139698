//! Fuzz target for the multipart boundary-stack scanner.
//!
//! The first line of the input is used as the outer boundary, the rest as
//! the body. A small depth cap keeps nested boundary pushes bounded.
//! The boundaries found feed the fallback scan, as the SMTP decoder does.

#![no_main]

use libfuzzer_sys::fuzz_target;
use streamsift::mime::{scan_fallback_attachments, MultipartScanner};

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (boundary, body) = text.split_once('\n').unwrap_or(("b", text.as_ref()));

    let scan = MultipartScanner::new(4).scan(body, boundary.trim());

    let _ = scan_fallback_attachments(body, &scan.boundaries);
});
