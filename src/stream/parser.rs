use serde::Serialize;

use super::Message;

/// A reconstructor turns one stream's ordered messages into an
/// application-level result.
///
/// Implementations are pure: the same input always yields a structurally
/// equal output and no state leaks between calls. Messages must already be
/// sorted by timestamp; reconstructors never re-sort.
pub trait SessionReconstructor {
    /// Result of reconstructing one stream.
    type Output: Serialize;

    /// Short protocol identifier (e.g., "http", "smtp").
    fn name(&self) -> &'static str;

    /// Human-readable display name.
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Reconstruct a stream from its ordered messages.
    fn reconstruct(&self, messages: &[Message]) -> Self::Output;
}
