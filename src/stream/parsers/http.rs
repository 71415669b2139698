//! HTTP/1.x session reconstruction over an ordered message list.
//!
//! Messages are classified by their text prefix:
//! - a request line (`GET /path HTTP/1.1`) opens a new request
//! - a status line (`HTTP/1.1 200 OK`) opens a new response
//! - anything else travelling in the same direction as the open response
//!   extends that response's body
//!
//! Responses are paired with the most recently seen unmatched request (LIFO).
//! For a single client/server stream this matches the natural order; for
//! pipelined exchanges with several outstanding requests a response pairs
//! with the latest request, not the oldest.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ReconstructConfig;
use crate::stream::{Direction, HeaderMap, Message, SessionReconstructor};

fn request_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(GET|POST|PUT|DELETE|HEAD|OPTIONS|PATCH|CONNECT)\s+").expect("valid regex")
    })
}

fn response_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HTTP/\d+\.\d+\s+\d+").expect("valid regex"))
}

fn request_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\s+(\S+)\s+HTTP/(\d+\.\d+)").expect("valid regex"))
}

fn status_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^HTTP/(\d+\.\d+)\s+(\d+)[ \t]*([^\r\n]*)").expect("valid regex"))
}

/// A parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub http_version: String,
    pub headers: HeaderMap,
    pub body: String,
    pub timestamp: f64,
    pub message_id: u64,
    pub direction: Direction,
    /// The start line did not parse; method, path and version are empty.
    pub unparsed: bool,
}

/// A parsed HTTP response, possibly assembled from several messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResponse {
    pub http_version: String,
    pub status_code: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
    pub timestamp: f64,
    pub message_id: u64,
    pub direction: Direction,
    /// The status line did not parse; version, code and text are empty.
    pub unparsed: bool,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

/// A request paired with its response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpSession {
    pub request: HttpRequest,
    pub response: HttpResponse,
    /// `response.timestamp - request.timestamp`, not clamped.
    pub response_time_seconds: f64,
}

/// Aggregate counters over one reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HttpStats {
    pub total_requests: usize,
    pub total_responses: usize,
    /// 2xx responses.
    pub successful_responses: usize,
    /// 3xx responses.
    pub redirect_responses: usize,
    /// 4xx and 5xx responses.
    pub error_responses: usize,
    /// Responses that found no request to pair with.
    pub unmatched_responses: usize,
    /// Mean response time over sessions, 0 when there are none.
    pub avg_response_time_seconds: f64,
}

/// Output of [`reconstruct_http`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HttpReconstruction {
    pub requests: Vec<HttpRequest>,
    pub responses: Vec<HttpResponse>,
    pub sessions: Vec<HttpSession>,
    pub stats: HttpStats,
}

impl HttpReconstruction {
    /// Response paired with the request carried by message `request_id`.
    pub fn response_for(&self, request_id: u64) -> Option<&HttpResponse> {
        self.sessions
            .iter()
            .find(|s| s.request.message_id == request_id)
            .map(|s| &s.response)
    }
}

/// HTTP/1.x session reconstructor.
#[derive(Debug, Clone, Default)]
pub struct HttpReconstructor {
    config: ReconstructConfig,
}

impl HttpReconstructor {
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config }
    }

    /// Split a message into start line, headers and body.
    ///
    /// Header lines are `name: value` split on the first colon; lines without
    /// a colon are skipped. The header block ends at the first blank line and
    /// everything after it is the body, verbatim.
    fn split_message<'a>(&self, text: &'a str) -> (&'a str, HeaderMap, &'a str) {
        let mut headers = HeaderMap::new();
        let mut start_line = "";
        let mut pos = 0;
        let mut first = true;

        while pos < text.len() {
            let line_end = text[pos..].find('\n').map(|p| pos + p);
            let next = line_end.map(|e| e + 1).unwrap_or(text.len());
            let line = text[pos..line_end.unwrap_or(text.len())].trim_end_matches('\r');

            if first {
                start_line = line;
                first = false;
            } else if line.is_empty() {
                return (start_line, headers, &text[next..]);
            } else if headers.len() < self.config.max_headers {
                if let Some((name, value)) = line.split_once(':') {
                    headers.insert(name.trim(), value.trim());
                }
            }

            pos = next;
        }

        (start_line, headers, "")
    }

    fn parse_request(&self, message: &Message) -> HttpRequest {
        let (start, headers, body) = self.split_message(&message.raw_text);

        let mut request = HttpRequest {
            method: String::new(),
            path: String::new(),
            http_version: String::new(),
            headers,
            body: body.to_string(),
            timestamp: message.timestamp,
            message_id: message.unique_id,
            direction: message.direction,
            unparsed: true,
        };

        match request_line().captures(start) {
            Some(caps) => {
                request.method = caps[1].to_string();
                request.path = caps[2].to_string();
                request.http_version = caps[3].to_string();
                request.unparsed = false;
            }
            None => {
                debug!(
                    message_id = message.unique_id,
                    "unparseable HTTP request line, recording placeholder"
                );
            }
        }

        request
    }

    fn parse_response(&self, message: &Message) -> HttpResponse {
        let (start, headers, body) = self.split_message(&message.raw_text);

        let mut response = HttpResponse {
            http_version: String::new(),
            status_code: 0,
            status_text: String::new(),
            headers,
            body: body.to_string(),
            timestamp: message.timestamp,
            message_id: message.unique_id,
            direction: message.direction,
            unparsed: true,
        };

        let parsed = status_line().captures(start).and_then(|caps| {
            let code = caps[2].parse::<u16>().ok()?;
            Some((caps[1].to_string(), code, caps[3].trim_end().to_string()))
        });

        match parsed {
            Some((version, code, text)) => {
                response.http_version = version;
                response.status_code = code;
                response.status_text = text;
                response.unparsed = false;
            }
            None => {
                debug!(
                    message_id = message.unique_id,
                    "unparseable HTTP status line, recording placeholder"
                );
            }
        }

        response
    }

    /// Reconstruct requests, responses and sessions from ordered messages.
    pub fn reconstruct(&self, messages: &[Message]) -> HttpReconstruction {
        let mut state = PairingState::default();

        for message in messages {
            let text = message.raw_text.as_str();

            if request_start().is_match(text) {
                state.flush();
                let request = self.parse_request(message);
                state.unmatched.push(state.requests.len());
                state.requests.push(request);
            } else if response_start().is_match(text) {
                state.flush();
                state.open = Some(self.parse_response(message));
            } else if let Some(open) = state
                .open
                .as_mut()
                .filter(|open| open.direction == message.direction)
            {
                open.body.push_str(text);
            } else {
                trace!(
                    message_id = message.unique_id,
                    "message is neither HTTP start nor continuation"
                );
            }
        }

        state.flush();
        state.finish()
    }
}

impl SessionReconstructor for HttpReconstructor {
    type Output = HttpReconstruction;

    fn name(&self) -> &'static str {
        "http"
    }

    fn display_name(&self) -> &'static str {
        "HTTP"
    }

    fn reconstruct(&self, messages: &[Message]) -> HttpReconstruction {
        HttpReconstructor::reconstruct(self, messages)
    }
}

/// Reconstruct HTTP sessions with the default configuration.
pub fn reconstruct_http(messages: &[Message]) -> HttpReconstruction {
    HttpReconstructor::default().reconstruct(messages)
}

/// Working state of one reconstruction pass.
#[derive(Default)]
struct PairingState {
    requests: Vec<HttpRequest>,
    responses: Vec<HttpResponse>,
    sessions: Vec<HttpSession>,
    /// Indexes into `requests` still waiting for a response, most recent last.
    unmatched: Vec<usize>,
    open: Option<HttpResponse>,
    unmatched_responses: usize,
}

impl PairingState {
    /// Close the open response and pair it with the latest unmatched request.
    fn flush(&mut self) {
        let Some(response) = self.open.take() else {
            return;
        };

        match self.unmatched.pop() {
            Some(idx) => {
                let request = self.requests[idx].clone();
                self.sessions.push(HttpSession {
                    response_time_seconds: response.timestamp - request.timestamp,
                    request,
                    response: response.clone(),
                });
            }
            None => self.unmatched_responses += 1,
        }

        self.responses.push(response);
    }

    fn finish(self) -> HttpReconstruction {
        let avg_response_time_seconds = if self.sessions.is_empty() {
            0.0
        } else {
            self.sessions
                .iter()
                .map(|s| s.response_time_seconds)
                .sum::<f64>()
                / self.sessions.len() as f64
        };

        let stats = HttpStats {
            total_requests: self.requests.len(),
            total_responses: self.responses.len(),
            successful_responses: self.responses.iter().filter(|r| r.is_success()).count(),
            redirect_responses: self.responses.iter().filter(|r| r.is_redirect()).count(),
            error_responses: self.responses.iter().filter(|r| r.is_error()).count(),
            unmatched_responses: self.unmatched_responses,
            avg_response_time_seconds,
        };

        HttpReconstruction {
            requests: self.requests,
            responses: self.responses,
            sessions: self.sessions,
            stats,
        }
    }
}
