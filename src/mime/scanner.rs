//! Boundary-stack scanner for (nested) multipart bodies.

use tracing::{debug, trace};

use super::{header_param, media_type, HeaderBlock, MimePart};

/// Result of scanning one multipart body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartScan {
    /// Leaf parts in document order. Containers are not included.
    pub parts: Vec<MimePart>,
    /// Every boundary seen, outer first.
    pub boundaries: Vec<String>,
}

/// A part whose lines are still being collected.
#[derive(Debug, Default)]
struct PendingPart {
    headers: HeaderBlock,
    in_headers: bool,
    container: bool,
    content: String,
}

impl PendingPart {
    fn new() -> Self {
        Self {
            in_headers: true,
            ..Self::default()
        }
    }
}

/// Line-oriented scanner that keeps a stack of open boundaries.
///
/// A `--b` line opens a new part at b's level and a `--b--` line closes
/// that level. Boundaries are matched from the innermost level outwards, so a
/// marker for an outer boundary also closes every level nested inside it.
#[derive(Debug, Clone, Copy)]
pub struct MultipartScanner {
    max_depth: usize,
}

impl MultipartScanner {
    /// Create a scanner that follows at most `max_depth` nested boundaries.
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    /// Split `body` into leaf parts, starting from the outer `boundary`.
    pub fn scan(&self, body: &str, boundary: &str) -> MultipartScan {
        let mut stack: Vec<String> = vec![boundary.to_string()];
        let mut boundaries = stack.clone();
        let mut raw: Vec<(HeaderBlock, String)> = Vec::new();
        let mut current: Option<PendingPart> = None;

        for line in body.lines() {
            let trimmed = line.trim_end();

            if let Some((level, closing)) = match_boundary(&stack, trimmed) {
                if let Some(part) = current.take() {
                    flush(part, &mut raw);
                }
                if closing {
                    stack.truncate(level);
                    trace!(level, "closed multipart level");
                } else {
                    stack.truncate(level + 1);
                    current = Some(PendingPart::new());
                }
                continue;
            }

            // Preamble and epilogue text belongs to no part
            let Some(part) = current.as_mut() else {
                continue;
            };

            if part.in_headers {
                if trimmed.is_empty() {
                    part.in_headers = false;
                    self.open_nested(part, &mut stack, &mut boundaries);
                } else {
                    part.headers.push_line(line);
                }
            } else {
                part.content.push_str(line);
                part.content.push('\n');
            }
        }

        if let Some(part) = current.take() {
            flush(part, &mut raw);
        }

        let parts = raw
            .iter()
            .map(|(headers, content)| MimePart::from_headers(headers, content, &boundaries))
            .collect();

        MultipartScan { parts, boundaries }
    }

    /// Push a nested boundary if this part is itself a multipart.
    fn open_nested(&self, part: &mut PendingPart, stack: &mut Vec<String>, all: &mut Vec<String>) {
        let Some(content_type) = part.headers.get("content-type") else {
            return;
        };
        if !media_type(content_type).starts_with("multipart/") {
            return;
        }
        let Some(nested) = header_param(content_type, "boundary") else {
            return;
        };

        part.container = true;
        if stack.len() >= self.max_depth {
            debug!(
                depth = stack.len(),
                boundary = %nested,
                "multipart nesting limit reached, dropping nested container"
            );
            return;
        }

        trace!(depth = stack.len() + 1, boundary = %nested, "opened nested multipart");
        stack.push(nested.clone());
        all.push(nested);
    }
}

/// Find which stack level `line` delimits, innermost first.
///
/// Returns the level and whether the line is a closing delimiter.
fn match_boundary(stack: &[String], line: &str) -> Option<(usize, bool)> {
    let rest = line.strip_prefix("--")?;
    stack.iter().enumerate().rev().find_map(|(level, boundary)| {
        let tail = rest.strip_prefix(boundary.as_str())?;
        match tail {
            "" => Some((level, false)),
            "--" => Some((level, true)),
            _ => None,
        }
    })
}

fn flush(part: PendingPart, raw: &mut Vec<(HeaderBlock, String)>) {
    if part.container {
        return;
    }
    if part.headers.is_empty() && part.content.trim().is_empty() {
        return;
    }
    raw.push((part.headers, part.content));
}
