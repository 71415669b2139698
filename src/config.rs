//! Reconstruction tunables.

use serde::{Deserialize, Serialize};

/// Default cap on nested multipart levels.
pub const DEFAULT_MAX_MIME_DEPTH: usize = 16;

/// Default number of headers kept per HTTP message.
pub const DEFAULT_MAX_HEADERS: usize = 100;

/// Configuration shared by the HTTP and SMTP reconstructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructConfig {
    /// Maximum number of boundaries on the MIME scanner stack.
    ///
    /// Parts that would open a deeper level are dropped together with
    /// their nested content.
    pub max_mime_depth: usize,
    /// Maximum headers parsed per HTTP message. Extra lines are ignored.
    pub max_headers: usize,
    /// Run the regex attachment scan over the raw DATA payload in addition
    /// to the structural MIME scan.
    pub fallback_scan: bool,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            max_mime_depth: DEFAULT_MAX_MIME_DEPTH,
            max_headers: DEFAULT_MAX_HEADERS,
            fallback_scan: true,
        }
    }
}

impl ReconstructConfig {
    pub fn with_max_mime_depth(mut self, depth: usize) -> Self {
        self.max_mime_depth = depth;
        self
    }

    pub fn with_max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    pub fn with_fallback_scan(mut self, enabled: bool) -> Self {
        self.fallback_scan = enabled;
        self
    }
}
