//! # streamsift
//!
//! Application-level reconstruction for already-dissected network captures.
//!
//! The capture layer owns packet storage and TCP reassembly; this crate takes
//! its per-stream message lists and single packets and recovers what the
//! conversation meant.
//!
//! ## Features
//!
//! - **HTTP sessions**: request/response pairing with body continuation
//!   across messages and aggregate statistics
//! - **SMTP sessions**: envelope, authentication, DATA payload, top-level
//!   mail headers, nested MIME parts and attachments
//! - **USBPcap frames**: legacy and extended pseudo-headers, control setup
//!   packets and standard request names
//! - **Protocol chains**: normalized layer labels such as `IP -> TCP -> TLS -> HTTP`
//! - **Response cache**: caller-owned memo table for request lookups
//!
//! ## Quick Start
//!
//! ```rust
//! use streamsift::prelude::*;
//!
//! let messages = vec![
//!     Message::new(1, 0.00, Direction::AtoB, "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n"),
//!     Message::new(2, 0.05, Direction::BtoA, "HTTP/1.1 200 OK\r\n\r\nhello"),
//! ];
//!
//! let result = reconstruct_http(&messages);
//! assert_eq!(result.sessions.len(), 1);
//! assert_eq!(result.sessions[0].response.body, "hello");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                           streamsift                                |
//! +---------------------------------------------------------------------+
//! |  stream/     - Message, Direction, HTTP and SMTP reconstructors     |
//! |  mime/       - Header blocks, transfer encodings, boundary scanner  |
//! |  protocol/   - USBPcap decoder, protocol chain builder              |
//! |  cache/      - Request -> response memo table                       |
//! |  config/     - Reconstruction tunables                              |
//! |  cli/        - Argument parsing and output for the binary           |
//! |  error/      - Error types                                          |
//! +---------------------------------------------------------------------+
//! ```
//!
//! All reconstructors are pure: they never re-sort their input, keep no
//! state between calls, and degrade malformed input to partial results.
//! The only hard error is a USBPcap buffer shorter than 18 bytes.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod mime;
pub mod prelude;
pub mod protocol;
pub mod stream;

pub use cache::{CacheStats, ResponseCache};
pub use config::ReconstructConfig;
pub use error::{Error, Result, UsbError};
pub use protocol::{build_protocol_chain, decode_usb_frame, Packet, ProtocolChain, UsbFrame};
pub use stream::{reconstruct_http, reconstruct_smtp, Direction, Message, StreamEndpoints};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
