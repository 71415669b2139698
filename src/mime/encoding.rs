//! Transfer-encoding decoding and content cleanup.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use tracing::debug;

/// Boundary lines emitted by some mail clients (`------=_001_NextPart<hex>_=----`).
fn next_part_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-*=_001_NextPart[0-9A-Fa-f]+_=-*").expect("valid regex"))
}

/// Whether `text` consists only of base64 alphabet characters and line breaks.
pub fn looks_like_base64(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'\r' | b'\n'))
}

/// Decode standard base64, ignoring embedded whitespace.
///
/// Returns `None` when the input is not valid base64.
pub fn decode_base64(text: &str) -> Option<String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}

/// Decode quoted-printable: `=XX` escapes and soft line breaks.
///
/// Malformed escapes are kept literally.
pub fn decode_quoted_printable(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'=' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }

        // Soft line break, allowing trailing whitespace before the newline
        let mut j = i + 1;
        while j < bytes.len() && matches!(bytes[j], b' ' | b'\t') {
            j += 1;
        }
        if bytes.get(j) == Some(&b'\n') {
            i = j + 1;
            continue;
        }
        if bytes.get(j) == Some(&b'\r') && bytes.get(j + 1) == Some(&b'\n') {
            i = j + 2;
            continue;
        }

        let hex = bytes.get(i + 1..i + 3).and_then(|pair| {
            let s = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        });
        match hex {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(b'=');
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove leftover boundary delimiters from extracted text.
pub fn strip_boundary_markers(text: &str, boundaries: &[String]) -> String {
    let mut out = text.to_string();
    for boundary in boundaries.iter().filter(|b| !b.is_empty()) {
        out = out.replace(&format!("--{boundary}--"), "");
        out = out.replace(&format!("--{boundary}"), "");
    }
    next_part_marker().replace_all(&out, "").into_owned()
}

/// Clean extracted part text.
///
/// Base64-looking content is only trimmed so its 4-byte groups stay intact;
/// anything else has whitespace runs collapsed.
pub fn clean_content(text: &str, boundaries: &[String]) -> String {
    let stripped = strip_boundary_markers(text, boundaries);
    let trimmed = stripped.trim();
    if looks_like_base64(trimmed) {
        trimmed.to_string()
    } else {
        collapse_whitespace(trimmed)
    }
}

/// Decode an inline body according to its `Content-Transfer-Encoding`.
///
/// A base64 body that fails to decode is returned still encoded.
pub fn decode_body(text: &str, encoding: Option<&str>, boundaries: &[String]) -> String {
    match encoding.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("base64") => {
            let stripped = strip_boundary_markers(text, boundaries);
            let encoded = stripped.trim();
            match decode_base64(encoded) {
                Some(decoded) => decoded.trim().to_string(),
                None => {
                    debug!(len = encoded.len(), "base64 body failed to decode, keeping encoded text");
                    encoded.to_string()
                }
            }
        }
        Some("quoted-printable") => {
            let stripped = strip_boundary_markers(text, boundaries);
            collapse_whitespace(&decode_quoted_printable(&stripped))
        }
        _ => clean_content(text, boundaries),
    }
}
