//! Regex scan for attachments that the structural scan may have missed.
//!
//! Some mailers emit malformed multipart structure (missing blank lines,
//! mismatched boundaries). The patterns here look for filename declarations
//! anywhere in the raw DATA payload and then bound each hit to the section
//! between its surrounding `--` delimiter lines.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use super::{HeaderBlock, MimePart};

fn disposition_filename() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)Content-Disposition:\s*attachment;\s*filename="?([^"\r\n]+)"?"#)
            .expect("valid regex")
    })
}

fn content_type_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)Content-Type:\s*[^;\r\n]+;\s*name="?([^"\r\n]+)"?"#).expect("valid regex")
    })
}

fn extension_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)name="?([^"\r\n;]+\.(?:rar|zip|pdf|docx|doc|xlsx|xls|pptx|ppt|exe|jpeg|jpg|png|gif|txt|csv|json))"?"#,
        )
        .expect("valid regex")
    })
}

/// Byte range of the part section containing `pos`.
///
/// The section starts after the delimiter line preceding `pos` and ends at
/// the next delimiter line (or the end of `data`).
fn enclosing_section(data: &str, pos: usize) -> (usize, usize) {
    let delimiter = match data[..pos].rfind("\n--") {
        Some(idx) => Some(idx + 1),
        None if data.starts_with("--") => Some(0),
        None => None,
    };
    let start = match delimiter {
        Some(line_start) => match data[line_start..].find('\n') {
            Some(nl) => (line_start + nl + 1).min(pos),
            None => pos,
        },
        None => 0,
    };
    let end = data[pos..]
        .find("\n--")
        .map(|idx| pos + idx + 1)
        .unwrap_or(data.len());
    (start, end)
}

/// Scan raw DATA for attachment declarations.
///
/// Each filename is reported once, in order of first appearance. The part
/// built for a hit always counts as an attachment and carries the matched
/// filename.
pub fn scan_fallback_attachments(data: &str, boundaries: &[String]) -> Vec<MimePart> {
    let mut hits: Vec<(usize, String)> = Vec::new();
    for re in [disposition_filename(), content_type_name(), extension_name()] {
        for caps in re.captures_iter(data) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let filename = name.as_str().trim();
            if !filename.is_empty() {
                hits.push((whole.start(), filename.to_string()));
            }
        }
    }
    hits.sort_by_key(|(pos, _)| *pos);

    let mut seen = HashSet::new();
    let mut parts = Vec::new();

    for (pos, filename) in hits {
        if !seen.insert(filename.clone()) {
            continue;
        }

        let (start, end) = enclosing_section(data, pos);
        let section = &data[start..end];
        let (headers, body_offset) = HeaderBlock::parse(section);

        let mut part = MimePart::from_headers(&headers, &section[body_offset..], boundaries);
        part.is_attachment = true;
        part.filename = Some(filename);

        trace!(filename = part.filename.as_deref().unwrap_or(""), "fallback attachment");
        parts.push(part);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_disposition_filename() {
        let data = "--X\r\n\
                    Content-Type: application/pdf\r\n\
                    Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
                    Content-Transfer-Encoding: base64\r\n\
                    \r\n\
                    JVBERi0xLjQ=\r\n\
                    --X--\r\n";
        let parts = scan_fallback_attachments(data, &["X".to_string()]);

        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert!(part.is_attachment);
        assert_eq!(part.filename.as_deref(), Some("report.pdf"));
        assert_eq!(part.content_type, "application/pdf");
        assert_eq!(part.content_transfer_encoding.as_deref(), Some("base64"));
        assert_eq!(part.content, "JVBERi0xLjQ=");
    }

    #[test]
    fn test_content_type_name() {
        let data = "--X\nContent-Type: image/png; name=pic.png\n\niVBORw0K\n--X--\n";
        let parts = scan_fallback_attachments(data, &[]);

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].filename.as_deref(), Some("pic.png"));
        assert_eq!(parts[0].content, "iVBORw0K");
    }

    #[test]
    fn test_extension_pattern_without_headers_context() {
        let data = "some text name=\"data.csv\" more text";
        let parts = scan_fallback_attachments(data, &[]);

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].filename.as_deref(), Some("data.csv"));
        assert!(parts[0].is_attachment);
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        // Matches all three patterns
        let data = "--X\n\
                    Content-Type: application/zip; name=\"a.zip\"\n\
                    Content-Disposition: attachment; filename=\"a.zip\"\n\
                    \n\
                    UEsDBA==\n\
                    --X--\n";
        let parts = scan_fallback_attachments(data, &[]);
        assert_eq!(parts.len(), 1);
    }

    #[test]
    fn test_unknown_extension_ignored_by_extension_pattern() {
        let parts = scan_fallback_attachments("name=\"notes.xyz\"", &[]);
        assert!(parts.is_empty());
    }

    #[test]
    fn test_enclosing_section() {
        let data = "--X\nA: 1\n\nbody\n--X--\n";
        let pos = data.find("A:").unwrap_or_default();
        let (start, end) = enclosing_section(data, pos);
        assert_eq!(&data[start..end], "A: 1\n\nbody\n");
    }
}
