//! RFC 822 style header blocks with continuation folding.

use std::sync::OnceLock;

use regex::Regex;

fn header_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([^:]+):\s*(.+)$").expect("valid regex"))
}

/// Iterate lines of `text` without their line terminator, paired with the
/// byte offset just past the terminator.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (&str, usize)> {
    let mut pos = 0;
    std::iter::from_fn(move || {
        if pos >= text.len() {
            return None;
        }
        let (line_end, next) = match text[pos..].find('\n') {
            Some(p) => (pos + p, pos + p + 1),
            None => (text.len(), text.len()),
        };
        let line = text[pos..line_end].trim_end_matches('\r');
        pos = next;
        Some((line, next))
    })
}

/// An ordered block of `name: value` headers.
///
/// Names keep their original spelling; lookups ignore ASCII case. A line
/// starting with whitespace extends the previous header's value, joined by a
/// single space. Lines that are not `name: value` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    entries: Vec<(String, String)>,
    /// Header that a continuation line would extend.
    last: Option<usize>,
}

impl HeaderBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the header block at the start of `text`.
    ///
    /// Returns the headers and the byte offset where the body begins (just
    /// past the blank line), or `text.len()` when there is no blank line.
    pub fn parse(text: &str) -> (Self, usize) {
        let mut block = Self::new();
        for (line, next) in lines_with_offsets(text) {
            if line.trim().is_empty() {
                return (block, next);
            }
            block.push_line(line);
        }
        (block, text.len())
    }

    /// Feed one non-blank header line.
    pub fn push_line(&mut self, line: &str) {
        if line.starts_with(|c: char| c == ' ' || c == '\t') {
            if let Some(idx) = self.last {
                let value = &mut self.entries[idx].1;
                let extra = line.trim();
                if !extra.is_empty() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(extra);
                }
            }
            return;
        }

        match header_line().captures(line) {
            Some(caps) => {
                self.entries
                    .push((caps[1].trim().to_string(), caps[2].trim().to_string()));
                self.last = Some(self.entries.len() - 1);
            }
            None => self.last = None,
        }
    }

    /// First header with the given name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Split a structured header value on `;`, ignoring separators inside quotes.
fn param_segments(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);
    segments
}

/// Value of parameter `key` in a header like `text/plain; charset="utf-8"`.
///
/// The key matches case-insensitively, with or without the RFC 2231 `*`
/// suffix. Surrounding quotes are removed. Empty values yield `None`.
pub fn header_param(value: &str, key: &str) -> Option<String> {
    param_segments(value).into_iter().skip(1).find_map(|segment| {
        let (k, v) = segment.split_once('=')?;
        let k = k.trim();
        let k = k.strip_suffix('*').unwrap_or(k);
        if !k.eq_ignore_ascii_case(key) {
            return None;
        }
        let v = v.trim().trim_matches('"').trim();
        (!v.is_empty()).then(|| v.to_string())
    })
}

/// Media type of a `Content-Type` value, lowercased, without parameters.
pub fn media_type(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
