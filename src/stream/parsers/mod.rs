//! Application protocol reconstructors.

mod http;
mod smtp;

pub use http::{
    reconstruct_http, HttpReconstruction, HttpReconstructor, HttpRequest, HttpResponse,
    HttpSession, HttpStats,
};
pub use smtp::{
    reconstruct_smtp, SmtpAuth, SmtpCommand, SmtpCommandKind, SmtpReconstructor, SmtpResponse,
    SmtpSession,
};
