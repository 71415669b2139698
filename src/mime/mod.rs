//! MIME decoding for reconstructed mail bodies.
//!
//! This module splits a multipart body into a flat list of parts and
//! classifies each one as an inline body or an attachment.
//!
//! ## Components
//!
//! - [`HeaderBlock`] - Header blocks with continuation folding
//! - [`MultipartScanner`] - Boundary-stack scanner over nested multiparts
//! - [`scan_fallback_attachments`] - Regex scan for attachments the
//!   structural scan missed
//! - [`EmailHeaders`] - The well-known top-level mail headers
//!
//! Part trees are not retained: nested containers only contribute their
//! boundary to the scanner stack, and every leaf part lands in one ordered list.

mod encoding;
mod fallback;
mod header;
mod scanner;

pub use encoding::{
    clean_content, collapse_whitespace, decode_base64, decode_body, decode_quoted_printable,
    looks_like_base64, strip_boundary_markers,
};
pub use fallback::scan_fallback_attachments;
pub use header::{header_param, media_type, HeaderBlock};
pub use scanner::{MultipartScan, MultipartScanner};

use serde::Serialize;
use tracing::trace;

/// Media type assumed for parts without a `Content-Type` header.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// One leaf part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MimePart {
    /// Lowercased media type, e.g. `text/plain`.
    pub content_type: String,
    pub charset: Option<String>,
    /// Lowercased transfer encoding, e.g. `base64`.
    pub content_transfer_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub filename: Option<String>,
    pub is_attachment: bool,
    /// Decoded text for inline bodies; cleaned, still-encoded text for attachments.
    pub content: String,
}

impl MimePart {
    /// Build a part from its headers and raw content.
    ///
    /// A part is an attachment when it names a file, declares an attachment
    /// disposition, or is neither `text/plain` nor `text/html`. Only inline
    /// bodies have their transfer encoding decoded.
    pub fn from_headers(headers: &HeaderBlock, raw_content: &str, boundaries: &[String]) -> Self {
        let raw_type = headers.get("content-type").unwrap_or(DEFAULT_CONTENT_TYPE);
        let content_type = media_type(raw_type);
        let charset = header_param(raw_type, "charset");
        let content_transfer_encoding = headers
            .get("content-transfer-encoding")
            .map(|v| v.trim().to_ascii_lowercase());
        let content_disposition = headers.get("content-disposition").map(str::to_string);

        let filename = content_disposition
            .as_deref()
            .and_then(|d| header_param(d, "filename"))
            .or_else(|| header_param(raw_type, "name"));

        let is_attachment = filename.is_some()
            || content_disposition
                .as_deref()
                .is_some_and(|d| d.to_ascii_lowercase().contains("attachment"))
            || !matches!(content_type.as_str(), "text/plain" | "text/html");

        let content = if is_attachment {
            clean_content(raw_content, boundaries)
        } else {
            decode_body(raw_content, content_transfer_encoding.as_deref(), boundaries)
        };

        trace!(
            content_type = %content_type,
            is_attachment,
            filename = filename.as_deref().unwrap_or(""),
            "classified MIME part"
        );

        Self {
            content_type,
            charset,
            content_transfer_encoding,
            content_disposition,
            filename,
            is_attachment,
            content,
        }
    }

    pub fn is_plain_text(&self) -> bool {
        self.content_type == "text/plain"
    }

    pub fn is_html(&self) -> bool {
        self.content_type == "text/html"
    }
}

/// The well-known top-level headers of a mail message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmailHeaders {
    pub date: Option<String>,
    pub subject: Option<String>,
    pub mime_version: Option<String>,
    pub message_id: Option<String>,
    pub content_type: Option<String>,
    pub x_priority: Option<String>,
    pub x_guid: Option<String>,
    pub x_has_attach: Option<String>,
    pub mailer: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl EmailHeaders {
    /// Pick the recognized headers out of a block. Others are ignored.
    pub fn from_block(block: &HeaderBlock) -> Self {
        let mut headers = Self::default();

        for (name, value) in block.iter() {
            let slot = match name.to_ascii_lowercase().as_str() {
                "date" => &mut headers.date,
                "subject" => &mut headers.subject,
                "mime-version" => &mut headers.mime_version,
                "message-id" => &mut headers.message_id,
                "content-type" => &mut headers.content_type,
                "x-priority" => &mut headers.x_priority,
                "x-guid" => &mut headers.x_guid,
                "x-has-attach" => &mut headers.x_has_attach,
                "x-mailer" => &mut headers.mailer,
                "from" => &mut headers.from,
                "to" => &mut headers.to,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }

        headers
    }
}
