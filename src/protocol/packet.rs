//! Packet descriptions supplied by the capture layer.
//!
//! The capture layer has already dissected each packet; only the labels
//! needed to describe its layer stack are carried here.

use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Label used by the capture layer for undissected protocols.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Network layer summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLayer {
    /// IP version, 4 or 6.
    pub version: u8,
}

/// Transport layer summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportLayer {
    /// Transport type name, e.g. `TCP`.
    #[serde(rename = "type")]
    pub kind: CompactString,
}

/// Application layer summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationLayer {
    pub protocol: CompactString,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketLayers {
    #[serde(default)]
    pub network: Option<NetworkLayer>,
    #[serde(default)]
    pub transport: Option<TransportLayer>,
    #[serde(default)]
    pub application: Option<ApplicationLayer>,
}

/// A dissected packet as described by the capture layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    pub unique_id: u64,
    /// Top-level protocol label, e.g. `ARP`, `HTTPS`, `USB.BULK`.
    pub protocol: CompactString,
    #[serde(default)]
    pub layers: PacketLayers,
}

impl Packet {
    pub fn new(unique_id: u64, protocol: impl Into<CompactString>) -> Self {
        Self {
            unique_id,
            protocol: protocol.into(),
            layers: PacketLayers::default(),
        }
    }

    pub fn with_network(mut self, version: u8) -> Self {
        self.layers.network = Some(NetworkLayer { version });
        self
    }

    pub fn with_transport(mut self, kind: impl Into<CompactString>) -> Self {
        self.layers.transport = Some(TransportLayer { kind: kind.into() });
        self
    }

    pub fn with_application(mut self, protocol: impl Into<CompactString>) -> Self {
        self.layers.application = Some(ApplicationLayer {
            protocol: protocol.into(),
        });
        self
    }
}

/// Protocol identity of a label.
///
/// Labels the chain builder treats specially get their own variant; every
/// other label is carried verbatim in [`ProtocolKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    Arp,
    /// Any `USB*` label, kept verbatim.
    Usb(CompactString),
    /// Any `BLE*` label, kept verbatim.
    Ble(CompactString),
    HciUsb,
    Https,
    /// Empty or `Unknown`.
    Unknown,
    Other(CompactString),
}

impl ProtocolKind {
    /// Classify a label. Matching is exact and case-sensitive.
    pub fn from_label(label: &str) -> Self {
        match label {
            "ARP" => ProtocolKind::Arp,
            "HCI_USB" => ProtocolKind::HciUsb,
            "HTTPS" => ProtocolKind::Https,
            "" | UNKNOWN_LABEL => ProtocolKind::Unknown,
            l if l.starts_with("USB") => ProtocolKind::Usb(l.into()),
            l if l.starts_with("BLE") => ProtocolKind::Ble(l.into()),
            l => ProtocolKind::Other(l.into()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ProtocolKind::Arp => "ARP",
            ProtocolKind::Usb(label) | ProtocolKind::Ble(label) | ProtocolKind::Other(label) => {
                label.as_str()
            }
            ProtocolKind::HciUsb => "HCI_USB",
            ProtocolKind::Https => "HTTPS",
            ProtocolKind::Unknown => UNKNOWN_LABEL,
        }
    }

    /// Whether this protocol is carried outside the IP stack.
    pub fn is_link_local(&self) -> bool {
        matches!(
            self,
            ProtocolKind::Arp | ProtocolKind::Usb(_) | ProtocolKind::Ble(_) | ProtocolKind::HciUsb
        )
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
