//! Packet-level decoders.
//!
//! - [`usbpcap`] - USBPcap pseudo-header and setup packet decoding
//! - [`chain`] - Protocol chain labels for a dissected packet
//!
//! Packets arrive already dissected by the capture layer; [`Packet`] carries
//! the layer labels and [`ProtocolKind`] classifies them.

pub mod chain;
mod packet;
pub mod usbpcap;

pub use chain::{build_protocol_chain, ProtocolChain, CHAIN_SEPARATOR};
pub use packet::{
    ApplicationLayer, NetworkLayer, Packet, PacketLayers, ProtocolKind, TransportLayer,
    UNKNOWN_LABEL,
};
pub use usbpcap::{
    decode_usb_frame, HeaderFormat, IrpDirection, SetupPacket, TransferDirection, TransferType,
    UsbFrame,
};
