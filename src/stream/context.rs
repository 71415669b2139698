use serde::{Deserialize, Serialize};

/// Direction of a message within a two-party stream.
///
/// `AtoB` is the direction of the stream's first packet as assigned by the
/// capture layer. Which side is the client is not implied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    AtoB,
    BtoA,
}

impl Direction {
    /// Return a string representation of the direction.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::AtoB => "A->B",
            Direction::BtoA => "B->A",
        }
    }

    /// The opposite direction.
    pub fn reverse(&self) -> Self {
        match self {
            Direction::AtoB => Direction::BtoA,
            Direction::BtoA => Direction::AtoB,
        }
    }
}

/// One directional unit of a reassembled stream.
///
/// Produced upstream by the capture layer; reconstruction never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Capture timestamp in seconds.
    pub timestamp: f64,
    pub direction: Direction,
    /// Application payload as text.
    pub raw_text: String,
    /// Capture-wide identity assigned by the packet store.
    pub unique_id: u64,
}

impl Message {
    pub fn new(
        unique_id: u64,
        timestamp: f64,
        direction: Direction,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            direction,
            raw_text: raw_text.into(),
            unique_id,
        }
    }
}

/// Addresses of the two parties of a stream, as labels supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEndpoints {
    pub client: String,
    pub server: String,
}

impl StreamEndpoints {
    pub fn new(client: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            server: server.into(),
        }
    }
}
