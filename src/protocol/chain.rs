//! Protocol chain labels for a packet's layer stack.

use std::fmt;

use compact_str::CompactString;
use serde::Serialize;
use smallvec::SmallVec;

use super::{Packet, ProtocolKind};

/// Separator used when a chain is rendered as one label.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Ordered layer labels, outermost first. Never contains `Unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProtocolChain {
    labels: SmallVec<[CompactString; 4]>,
}

impl ProtocolChain {
    pub fn new() -> Self {
        Self::default()
    }

    fn single(label: &str) -> Self {
        let mut chain = Self::new();
        chain.push(label);
        chain
    }

    /// Append a label. Empty and `Unknown` labels are skipped.
    fn push(&mut self, label: &str) {
        if ProtocolKind::from_label(label) != ProtocolKind::Unknown {
            self.labels.push(label.into());
        }
    }

    fn pop(&mut self) -> Option<CompactString> {
        self.labels.pop()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(CompactString::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.labels().map(str::to_string).collect()
    }
}

impl fmt::Display for ProtocolChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, label) in self.labels().enumerate() {
            if i > 0 {
                f.write_str(CHAIN_SEPARATOR)?;
            }
            f.write_str(label)?;
        }
        Ok(())
    }
}

/// Push an application label, expanding HTTPS into its TCP/TLS/HTTP stack.
fn push_application(chain: &mut ProtocolChain, kind: &ProtocolKind) {
    match kind {
        ProtocolKind::Https => {
            // HTTPS replaces the transport label, never the network label
            if chain.len() > 1 {
                chain.pop();
            }
            chain.push("TCP");
            chain.push("TLS");
            chain.push("HTTP");
        }
        ProtocolKind::Unknown => {}
        other => chain.push(other.label()),
    }
}

/// Build the protocol chain for a packet.
///
/// ARP and the USB/BLE/HCI_USB family are not layered over IP and yield a
/// single label. Everything else is `IP` or `IPv6`, then the transport
/// type (or the packet's own protocol when no transport layer is known),
/// then the application protocol.
pub fn build_protocol_chain(packet: &Packet) -> ProtocolChain {
    let protocol = ProtocolKind::from_label(&packet.protocol);

    match &protocol {
        ProtocolKind::Arp | ProtocolKind::HciUsb => return ProtocolChain::single(protocol.label()),
        ProtocolKind::Usb(label) | ProtocolKind::Ble(label) => return ProtocolChain::single(label),
        ProtocolKind::Https | ProtocolKind::Unknown | ProtocolKind::Other(_) => {}
    }

    let layers = &packet.layers;
    let mut chain = ProtocolChain::new();

    let is_ipv6 = layers.network.is_some_and(|n| n.version == 6);
    chain.push(if is_ipv6 { "IPv6" } else { "IP" });

    match (&layers.transport, &layers.application) {
        (Some(transport), application) => {
            chain.push(&transport.kind);
            if let Some(application) = application {
                push_application(&mut chain, &ProtocolKind::from_label(&application.protocol));
            }
        }
        (None, Some(application)) => {
            chain.push(protocol.label());
            push_application(&mut chain, &ProtocolKind::from_label(&application.protocol));
        }
        // The packet's own protocol stands in for both missing layers
        (None, None) => push_application(&mut chain, &protocol),
    }

    chain
}
