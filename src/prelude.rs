//! Convenient re-exports for common usage.
//!
//! ```rust
//! use streamsift::prelude::*;
//!
//! let chain = build_protocol_chain(&Packet::new(1, "ARP"));
//! assert_eq!(chain.to_string(), "ARP");
//! ```

// Stream types
pub use crate::stream::{Direction, Message, SessionReconstructor, StreamEndpoints};

// Reconstructors
pub use crate::stream::parsers::{
    reconstruct_http, reconstruct_smtp, HttpReconstruction, HttpReconstructor, HttpRequest,
    HttpResponse, HttpSession, HttpStats, SmtpReconstructor, SmtpSession,
};

// MIME types
pub use crate::mime::{EmailHeaders, MimePart};

// Packet decoders
pub use crate::protocol::{
    build_protocol_chain, decode_usb_frame, Packet, ProtocolChain, ProtocolKind, SetupPacket,
    TransferType, UsbFrame,
};

// Cache and configuration
pub use crate::cache::ResponseCache;
pub use crate::config::ReconstructConfig;

// Error types
pub use crate::error::{Error, Result, UsbError};
