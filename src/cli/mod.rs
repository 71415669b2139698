//! Command-line interface module.
//!
//! This module handles:
//! - Argument parsing via clap
//! - Input loading from JSON files and hex strings
//! - Output formatting (pretty or compact JSON)

mod args;
mod output;

pub use args::{Args, Command};
pub use output::{OutputFormat, OutputFormatter};

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::protocol::{build_protocol_chain, Packet, ProtocolChain};
use crate::stream::{Message, SessionReconstructor};
use crate::Result;

/// Load an ordered message list from a JSON array file.
pub fn load_messages(path: &Path) -> Result<Vec<Message>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// One packet object or an array of packets.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PacketInput {
    One(Packet),
    Many(Vec<Packet>),
}

impl PacketInput {
    pub fn into_packets(self) -> Vec<Packet> {
        match self {
            PacketInput::One(packet) => vec![packet],
            PacketInput::Many(packets) => packets,
        }
    }
}

/// Load packets from a JSON file holding one packet or an array of them.
pub fn load_packets(path: &Path) -> Result<Vec<Packet>> {
    let text = std::fs::read_to_string(path)?;
    let input: PacketInput = serde_json::from_str(&text)?;
    Ok(input.into_packets())
}

/// Protocol chain of one packet, as printed by the `chain` command.
#[derive(Debug, Serialize)]
pub struct ChainReport {
    pub unique_id: u64,
    pub chain: ProtocolChain,
    pub label: String,
}

impl ChainReport {
    pub fn for_packet(packet: &Packet) -> Self {
        let chain = build_protocol_chain(packet);
        Self {
            unique_id: packet.unique_id,
            label: chain.to_string(),
            chain,
        }
    }
}

/// Run a reconstructor over `messages` and write its output.
pub fn run_reconstructor<R, W>(
    reconstructor: &R,
    messages: &[Message],
    formatter: &OutputFormatter,
    writer: &mut W,
) -> Result<()>
where
    R: SessionReconstructor,
    W: Write,
{
    info!(
        protocol = reconstructor.name(),
        messages = messages.len(),
        "reconstructing {} stream",
        reconstructor.display_name()
    );
    let output = reconstructor.reconstruct(messages);
    formatter.write(&output, writer)
}
