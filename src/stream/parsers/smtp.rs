//! SMTP session reconstruction.
//!
//! Every message is split into lines. A line starting with a three digit
//! code and a space is a server reply; anything else is a client line. After
//! `DATA` (or a `354` reply) client lines are collected verbatim until a
//! line holding only `.`, and the collected payload is decoded as a mail
//! message: top-level headers, MIME parts, bodies and attachments.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ReconstructConfig;
use crate::mime::{
    header_param, media_type, scan_fallback_attachments, EmailHeaders, HeaderBlock, MimePart,
    MultipartScanner,
};
use crate::stream::{Message, SessionReconstructor, StreamEndpoints};

fn reply_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{3}) ").expect("valid regex"))
}

fn envelope_address() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?:MAIL FROM|RCPT TO):(.+?)(?:\s+|$)").expect("valid regex"))
}

/// Marker some servers nest inside a 250 reply after a successful AUTH.
const NESTED_AUTH_ACCEPTED: &str = "235 2.7.0 Accepted";

/// Recognized client command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmtpCommandKind {
    /// `EHLO` or `HELO`.
    Ehlo,
    MailFrom,
    RcptTo,
    Data,
    Auth,
    Quit,
}

impl SmtpCommandKind {
    /// Classify a trimmed client line by its keyword prefix, ignoring case.
    pub fn classify(line: &str) -> Option<Self> {
        let upper = line.to_ascii_uppercase();
        let kind = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            Self::Ehlo
        } else if upper.starts_with("MAIL FROM:") {
            Self::MailFrom
        } else if upper.starts_with("RCPT TO:") {
            Self::RcptTo
        } else if upper.starts_with("DATA") {
            Self::Data
        } else if upper.starts_with("AUTH") {
            Self::Auth
        } else if upper.starts_with("QUIT") {
            Self::Quit
        } else {
            return None;
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ehlo => "EHLO",
            Self::MailFrom => "MAIL_FROM",
            Self::RcptTo => "RCPT_TO",
            Self::Data => "DATA",
            Self::Auth => "AUTH",
            Self::Quit => "QUIT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpCommand {
    #[serde(rename = "type")]
    pub kind: SmtpCommandKind,
    pub raw_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmtpResponse {
    pub code: u16,
    pub raw_line: String,
}

impl SmtpResponse {
    pub fn is_error(&self) -> bool {
        self.code >= 500
    }
}

/// Outcome of the `AUTH` exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmtpAuth {
    /// Mechanism named by the client, e.g. `LOGIN`.
    pub method: Option<String>,
    pub success: bool,
}

/// Everything recovered from one SMTP stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmtpSession {
    pub client: String,
    pub server: String,
    pub commands: Vec<SmtpCommand>,
    pub responses: Vec<SmtpResponse>,
    pub mail_from: Option<String>,
    pub rcpt_to: Vec<String>,
    pub authentication: SmtpAuth,
    pub headers: EmailHeaders,
    pub plain_body: Option<String>,
    pub plain_charset: Option<String>,
    pub plain_content_type: Option<String>,
    pub html_body: Option<String>,
    pub html_charset: Option<String>,
    pub html_content_type: Option<String>,
    /// First inline body of any text type.
    pub original_body: Option<String>,
    /// Leaf parts found by the structural scan.
    pub mime_parts: Vec<MimePart>,
    /// Attachment parts, structural first, then fallback finds.
    pub attachments: Vec<MimePart>,
    pub has_data: bool,
    /// Raw DATA payload, one `\n`-terminated line per collected line.
    pub data_content: String,
}

impl SmtpSession {
    /// Record an inline body, keeping the first one of each kind.
    fn absorb_inline(&mut self, part: &MimePart) {
        if self.original_body.is_none() {
            self.original_body = Some(part.content.clone());
        }
        if part.is_plain_text() && self.plain_body.is_none() {
            self.plain_body = Some(part.content.clone());
            self.plain_charset = part.charset.clone();
            self.plain_content_type = Some(part.content_type.clone());
        } else if part.is_html() && self.html_body.is_none() {
            self.html_body = Some(part.content.clone());
            self.html_charset = part.charset.clone();
            self.html_content_type = Some(part.content_type.clone());
        }
    }

    fn has_attachment_named(&self, filename: &str) -> bool {
        self.attachments
            .iter()
            .any(|a| a.filename.as_deref() == Some(filename))
    }
}

/// Line classifier state for one pass.
#[derive(Default)]
struct LineState {
    session: SmtpSession,
    collecting: bool,
}

impl LineState {
    fn process_line(&mut self, line: &str) {
        if let Some(caps) = reply_line().captures(line) {
            let code = caps[1].parse::<u16>().unwrap_or_default();
            self.process_reply(code, line);
            return;
        }

        let trimmed = line.trim();

        if self.collecting {
            if trimmed == "." {
                self.collecting = false;
                trace!(
                    bytes = self.session.data_content.len(),
                    "DATA terminated"
                );
            } else {
                self.session.data_content.push_str(line);
                self.session.data_content.push('\n');
            }
            return;
        }

        let Some(kind) = SmtpCommandKind::classify(trimmed) else {
            if !trimmed.is_empty() {
                trace!(line = trimmed, "unrecognized SMTP client line");
            }
            return;
        };

        match kind {
            SmtpCommandKind::MailFrom => {
                self.session.mail_from = extract_address(trimmed);
            }
            SmtpCommandKind::RcptTo => {
                if let Some(address) = extract_address(trimmed) {
                    self.session.rcpt_to.push(address);
                }
            }
            SmtpCommandKind::Data => {
                self.session.has_data = true;
                if self.session.data_content.is_empty() {
                    self.collecting = true;
                }
            }
            SmtpCommandKind::Auth => {
                self.session.authentication.method =
                    trimmed.split_whitespace().nth(1).map(str::to_string);
            }
            SmtpCommandKind::Ehlo | SmtpCommandKind::Quit => {}
        }

        self.session.commands.push(SmtpCommand {
            kind,
            raw_line: trimmed.to_string(),
        });
    }

    fn process_reply(&mut self, code: u16, line: &str) {
        match code {
            354 => self.collecting = true,
            235 => self.session.authentication.success = true,
            250 if line.contains(NESTED_AUTH_ACCEPTED) => {
                self.session.authentication.success = true;
            }
            _ => {}
        }

        self.session.responses.push(SmtpResponse {
            code,
            raw_line: line.trim_end().to_string(),
        });
    }
}

/// Address from a `MAIL FROM:` or `RCPT TO:` line, without angle brackets.
fn extract_address(line: &str) -> Option<String> {
    let caps = envelope_address().captures(line)?;
    let address = caps[1].trim().trim_start_matches('<').trim_end_matches('>').trim();
    (!address.is_empty()).then(|| address.to_string())
}

/// SMTP session reconstructor.
#[derive(Debug, Clone, Default)]
pub struct SmtpReconstructor {
    config: ReconstructConfig,
    endpoints: StreamEndpoints,
}

impl SmtpReconstructor {
    pub fn new(config: ReconstructConfig, endpoints: StreamEndpoints) -> Self {
        Self { config, endpoints }
    }

    /// Reconstruct one SMTP session from ordered messages.
    pub fn reconstruct(&self, messages: &[Message]) -> SmtpSession {
        let mut state = LineState::default();
        for message in messages {
            for line in message.raw_text.lines() {
                state.process_line(line);
            }
        }

        let mut session = state.session;
        session.client = self.endpoints.client.clone();
        session.server = self.endpoints.server.clone();

        if session.has_data && !session.data_content.is_empty() {
            self.decode_payload(&mut session);
        }

        session
    }

    /// Decode the collected DATA payload into headers, bodies and attachments.
    fn decode_payload(&self, session: &mut SmtpSession) {
        let data = session.data_content.clone();
        let (block, body_offset) = HeaderBlock::parse(&data);
        session.headers = EmailHeaders::from_block(&block);
        let body = &data[body_offset..];

        let boundary = session
            .headers
            .content_type
            .as_deref()
            .filter(|ct| media_type(ct).starts_with("multipart/"))
            .and_then(|ct| header_param(ct, "boundary"));

        let (parts, boundaries) = match boundary {
            Some(boundary) => {
                let scan = MultipartScanner::new(self.config.max_mime_depth).scan(body, &boundary);
                (scan.parts, scan.boundaries)
            }
            None => (vec![MimePart::from_headers(&block, body, &[])], Vec::new()),
        };

        for part in &parts {
            if part.is_attachment {
                session.attachments.push(part.clone());
            } else {
                session.absorb_inline(part);
            }
        }
        session.mime_parts = parts;

        if self.config.fallback_scan {
            for part in scan_fallback_attachments(&data, &boundaries) {
                let filename = part.filename.as_deref().unwrap_or_default();
                if session.has_attachment_named(filename) {
                    debug!(filename, "fallback attachment already found by MIME scan");
                    continue;
                }
                session.attachments.push(part);
            }
        }
    }
}

impl SessionReconstructor for SmtpReconstructor {
    type Output = SmtpSession;

    fn name(&self) -> &'static str {
        "smtp"
    }

    fn display_name(&self) -> &'static str {
        "SMTP"
    }

    fn reconstruct(&self, messages: &[Message]) -> SmtpSession {
        SmtpReconstructor::reconstruct(self, messages)
    }
}

/// Reconstruct an SMTP session with the default configuration.
pub fn reconstruct_smtp(messages: &[Message], endpoints: &StreamEndpoints) -> SmtpSession {
    SmtpReconstructor::new(ReconstructConfig::default(), endpoints.clone()).reconstruct(messages)
}
