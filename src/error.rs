//! Error types for streamsift.
//!
//! Reconstruction is tolerant: malformed HTTP start lines, SMTP header lines
//! and undecodable bodies degrade to partial results rather than errors. The
//! only hard failure in the decoding core is a USBPcap buffer too short to
//! hold a pseudo-header:
//!
//! - [`enum@Error`] - Main error enum that wraps all error types
//! - [`UsbError`] - Errors from USBPcap pseudo-header decoding
//!
//! All errors implement `std::error::Error` and can be converted to `anyhow::Error`.

use thiserror::Error;

/// Main error type for streamsift operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Error decoding a USB capture frame
    #[error("USB decode error: {0}")]
    Usb(#[from] UsbError),

    /// Error reading or writing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to USBPcap pseudo-header decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsbError {
    /// Buffer shorter than the smallest (legacy) pseudo-header
    #[error("malformed frame: need at least {needed} bytes, have {have}")]
    MalformedFrame { needed: usize, have: usize },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
