//! Stream-level reconstruction of application sessions.
//!
//! Streams arrive already reassembled: one [`Message`] per directional
//! payload, ordered by timestamp. Each reconstructor in [`parsers`] makes a
//! single pass over that list and returns a serializable result.

mod context;
mod headers;
mod parser;
pub mod parsers;

pub use context::{Direction, Message, StreamEndpoints};
pub use headers::HeaderMap;
pub use parser::SessionReconstructor;
pub use parsers::{
    reconstruct_http, reconstruct_smtp, HttpReconstruction, HttpReconstructor, HttpSession,
    SmtpReconstructor, SmtpSession,
};
