//! USBPcap pseudo-header decoder.
//!
//! Every captured USB transfer starts with a little-endian pseudo-header
//! whose first u16 is its own length. A length of 27 or 28 selects the
//! extended layout with 16-bit bus and device fields; anything else is read
//! with the legacy 18-byte layout. Control transfers may carry an 8-byte
//! setup packet right after the header.

use serde::{Serialize, Serializer};

use crate::error::UsbError;

/// Smallest buffer that can be decoded.
pub const MIN_HEADER_LEN: usize = 18;

/// Size of a control transfer setup packet.
pub const SETUP_PACKET_LEN: usize = 8;

/// Header lengths that select the extended layout.
pub mod header_len {
    pub const LEGACY: u16 = 18;
    pub const EXTENDED: u16 = 27;
    pub const EXTENDED_CONTROL: u16 = 28;
}

/// Transfer type codes.
pub mod transfer {
    pub const ISOCHRONOUS: u8 = 0;
    pub const INTERRUPT: u8 = 1;
    pub const CONTROL: u8 = 2;
    pub const BULK: u8 = 3;
}

/// Standard request codes (USB 2.0 chapter 9).
pub mod request {
    pub const GET_STATUS: u8 = 0;
    pub const CLEAR_FEATURE: u8 = 1;
    pub const SET_FEATURE: u8 = 3;
    pub const SET_ADDRESS: u8 = 5;
    pub const GET_DESCRIPTOR: u8 = 6;
    pub const SET_DESCRIPTOR: u8 = 7;
    pub const GET_CONFIGURATION: u8 = 8;
    pub const SET_CONFIGURATION: u8 = 9;
    pub const GET_INTERFACE: u8 = 10;
    pub const SET_INTERFACE: u8 = 11;
    pub const SYNCH_FRAME: u8 = 12;
}

/// Name of a standard request code.
pub fn request_name(code: u8) -> Option<&'static str> {
    let name = match code {
        request::GET_STATUS => "GET_STATUS",
        request::CLEAR_FEATURE => "CLEAR_FEATURE",
        request::SET_FEATURE => "SET_FEATURE",
        request::SET_ADDRESS => "SET_ADDRESS",
        request::GET_DESCRIPTOR => "GET_DESCRIPTOR",
        request::SET_DESCRIPTOR => "SET_DESCRIPTOR",
        request::GET_CONFIGURATION => "GET_CONFIGURATION",
        request::SET_CONFIGURATION => "SET_CONFIGURATION",
        request::GET_INTERFACE => "GET_INTERFACE",
        request::SET_INTERFACE => "SET_INTERFACE",
        request::SYNCH_FRAME => "SYNCH_FRAME",
        _ => return None,
    };
    Some(name)
}

/// Name of a descriptor type carried in the high byte of `wValue`.
pub fn descriptor_type_name(descriptor_type: u8) -> Option<&'static str> {
    let name = match descriptor_type {
        0x01 => "DEVICE",
        0x02 => "CONFIGURATION",
        0x03 => "STRING",
        0x04 => "INTERFACE",
        0x05 => "ENDPOINT",
        0x06 => "DEVICE_QUALIFIER",
        0x07 => "OTHER_SPEED_CONFIGURATION",
        0x08 => "INTERFACE_POWER",
        0x0B => "INTERFACE_ASSOCIATION",
        0x0F => "BOS",
        0x21 => "HID",
        0x22 => "REPORT",
        _ => return None,
    };
    Some(name)
}

fn serialize_hex<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes.as_ref()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeaderFormat {
    Legacy18,
    Extended27or28,
}

/// Direction of the IRP, from bit 0 of the info byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IrpDirection {
    /// Host to device stack (bit clear).
    FdoToPdo,
    /// Device stack to host (bit set).
    PdoToFdo,
}

impl IrpDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            IrpDirection::FdoToPdo => "FDO->PDO",
            IrpDirection::PdoToFdo => "PDO->FDO",
        }
    }
}

/// Data direction of an endpoint or control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferDirection {
    /// Host to device.
    Out,
    /// Device to host.
    In,
}

impl TransferDirection {
    fn from_bit7(byte: u8) -> Self {
        if byte & 0x80 != 0 {
            TransferDirection::In
        } else {
            TransferDirection::Out
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TransferType {
    Isochronous,
    Interrupt,
    Control,
    Bulk,
    /// Code outside the four defined types, kept as-is.
    Unknown(u8),
}

impl TransferType {
    pub fn from_u8(code: u8) -> Self {
        match code {
            transfer::ISOCHRONOUS => TransferType::Isochronous,
            transfer::INTERRUPT => TransferType::Interrupt,
            transfer::CONTROL => TransferType::Control,
            transfer::BULK => TransferType::Bulk,
            other => TransferType::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            TransferType::Isochronous => transfer::ISOCHRONOUS,
            TransferType::Interrupt => transfer::INTERRUPT,
            TransferType::Control => transfer::CONTROL,
            TransferType::Bulk => transfer::BULK,
            TransferType::Unknown(code) => *code,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferType::Isochronous => "ISOCHRONOUS",
            TransferType::Interrupt => "INTERRUPT",
            TransferType::Control => "CONTROL",
            TransferType::Bulk => "BULK",
            TransferType::Unknown(_) => "UNKNOWN",
        }
    }
}

/// Bits 5-6 of `bmRequestType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestKind {
    Standard,
    Class,
    Vendor,
    Reserved,
}

/// Bits 0-4 of `bmRequestType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Recipient {
    Device,
    Interface,
    Endpoint,
    Other,
    Reserved,
}

/// Control transfer setup packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupPacket {
    pub bm_request_type: u8,
    pub request_direction: TransferDirection,
    pub request_kind: RequestKind,
    pub recipient: Recipient,
    pub b_request: u8,
    /// Standard request name; `None` for codes outside the standard table.
    pub request_name: Option<&'static str>,
    pub w_value: u16,
    pub w_index: u16,
    pub w_length: u16,
    /// High byte of `wValue` for GET/SET_DESCRIPTOR.
    pub descriptor_type: Option<u8>,
    /// Low byte of `wValue` for GET/SET_DESCRIPTOR.
    pub descriptor_index: Option<u8>,
    pub descriptor_type_name: Option<&'static str>,
}

impl SetupPacket {
    /// Decode 8 setup bytes. Returns `None` if fewer are available.
    pub fn decode(data: &[u8]) -> Option<Self> {
        let bytes = data.get(..SETUP_PACKET_LEN)?;

        let bm_request_type = bytes[0];
        let b_request = bytes[1];
        let w_value = u16::from_le_bytes([bytes[2], bytes[3]]);
        let w_index = u16::from_le_bytes([bytes[4], bytes[5]]);
        let w_length = u16::from_le_bytes([bytes[6], bytes[7]]);

        let request_kind = match (bm_request_type >> 5) & 0x03 {
            0 => RequestKind::Standard,
            1 => RequestKind::Class,
            2 => RequestKind::Vendor,
            _ => RequestKind::Reserved,
        };
        let recipient = match bm_request_type & 0x1F {
            0 => Recipient::Device,
            1 => Recipient::Interface,
            2 => Recipient::Endpoint,
            3 => Recipient::Other,
            _ => Recipient::Reserved,
        };

        let (descriptor_type, descriptor_index) = match b_request {
            request::GET_DESCRIPTOR | request::SET_DESCRIPTOR => {
                let [index, kind] = w_value.to_le_bytes();
                (Some(kind), Some(index))
            }
            _ => (None, None),
        };

        Some(Self {
            bm_request_type,
            request_direction: TransferDirection::from_bit7(bm_request_type),
            request_kind,
            recipient,
            b_request,
            request_name: request_name(b_request),
            w_value,
            w_index,
            w_length,
            descriptor_type,
            descriptor_index,
            descriptor_type_name: descriptor_type.and_then(descriptor_type_name),
        })
    }
}

/// A decoded USBPcap pseudo-header with its setup packet and payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsbFrame {
    pub header_format: HeaderFormat,
    /// Raw header length field.
    pub header_length: u16,
    /// Opaque IRP identifier.
    #[serde(serialize_with = "serialize_hex")]
    pub irp_id: [u8; 8],
    /// USBD status, 0 on success.
    pub usbd_status: u32,
    pub urb_function: u16,
    pub irp_info: u8,
    pub irp_direction: IrpDirection,
    pub bus_id: u16,
    pub device_address: u16,
    pub endpoint_address: u8,
    /// Endpoint number, bits 0-3 of the endpoint address.
    pub endpoint_number: u8,
    pub endpoint_direction: TransferDirection,
    pub transfer_type: TransferType,
    pub data_length: u16,
    /// Opaque bytes closing the header, truncated to what the buffer holds.
    #[serde(serialize_with = "serialize_hex")]
    pub reserved: Vec<u8>,
    pub setup_packet: Option<SetupPacket>,
    /// Transfer data after the header (and setup packet), truncated to the buffer.
    #[serde(serialize_with = "serialize_hex")]
    pub data_payload: Vec<u8>,
}

impl UsbFrame {
    pub fn is_success(&self) -> bool {
        self.usbd_status == 0
    }

    pub fn transfer_type_name(&self) -> &'static str {
        self.transfer_type.name()
    }

    /// Byte offset where data following the header begins.
    pub fn header_offset(&self) -> usize {
        match self.header_format {
            HeaderFormat::Legacy18 => header_len::LEGACY as usize,
            HeaderFormat::Extended27or28 => self.header_length as usize,
        }
    }
}

/// Bounds-checked little-endian reads. Missing bytes read as zero.
fn byte_at(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

fn u16_le_at(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([byte_at(data, offset), byte_at(data, offset + 1)])
}

fn u32_le_at(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        byte_at(data, offset),
        byte_at(data, offset + 1),
        byte_at(data, offset + 2),
        byte_at(data, offset + 3),
    ])
}

fn slice_clamped(data: &[u8], start: usize, end: usize) -> &[u8] {
    let len = data.len();
    &data[start.min(len)..end.min(len)]
}

/// Decode a USBPcap frame.
///
/// `has_setup_packet` is supplied by the capture layer. A setup packet is
/// decoded only for control transfers, and only when its 8 bytes are present.
///
/// # Errors
///
/// [`UsbError::MalformedFrame`] when `data` is shorter than 18 bytes. Every
/// other shortfall truncates instead of failing.
pub fn decode_usb_frame(data: &[u8], has_setup_packet: bool) -> Result<UsbFrame, UsbError> {
    if data.len() < MIN_HEADER_LEN {
        return Err(UsbError::MalformedFrame {
            needed: MIN_HEADER_LEN,
            have: data.len(),
        });
    }

    let header_length = u16_le_at(data, 0);
    let mut irp_id = [0u8; 8];
    irp_id.copy_from_slice(&data[2..10]);
    let usbd_status = u32_le_at(data, 10);
    let urb_function = u16_le_at(data, 14);
    let irp_info = data[16];
    let irp_direction = if irp_info & 0x01 != 0 {
        IrpDirection::PdoToFdo
    } else {
        IrpDirection::FdoToPdo
    };

    let (header_format, header_offset) = match header_length {
        header_len::EXTENDED | header_len::EXTENDED_CONTROL => {
            (HeaderFormat::Extended27or28, header_length as usize)
        }
        _ => (HeaderFormat::Legacy18, header_len::LEGACY as usize),
    };

    let (bus_id, device_address, endpoint_address, transfer_code, data_length, reserved) =
        match header_format {
            HeaderFormat::Extended27or28 => {
                // 27-byte headers end in 4 opaque bytes, 28-byte headers in 5
                let reserved_end = 25 + if header_length == header_len::EXTENDED { 4 } else { 5 };
                (
                    u16_le_at(data, 17),
                    u16_le_at(data, 19),
                    byte_at(data, 21),
                    byte_at(data, 22),
                    u16_le_at(data, 23),
                    slice_clamped(data, 25, reserved_end),
                )
            }
            HeaderFormat::Legacy18 => (
                u16::from(byte_at(data, 17)),
                u16::from(byte_at(data, 18)),
                byte_at(data, 19),
                byte_at(data, 20),
                u16_le_at(data, 21),
                slice_clamped(data, 23, 27),
            ),
        };

    let transfer_type = TransferType::from_u8(transfer_code);

    let setup_packet = if transfer_type == TransferType::Control && has_setup_packet {
        SetupPacket::decode(slice_clamped(data, header_offset, data.len()))
    } else {
        None
    };

    let (payload_start, payload_len) = if setup_packet.is_some() {
        (
            header_offset + SETUP_PACKET_LEN,
            (data_length as usize).saturating_sub(SETUP_PACKET_LEN),
        )
    } else {
        (header_offset, data_length as usize)
    };
    let data_payload = slice_clamped(data, payload_start, payload_start + payload_len).to_vec();

    Ok(UsbFrame {
        header_format,
        header_length,
        irp_id,
        usbd_status,
        urb_function,
        irp_info,
        irp_direction,
        bus_id,
        device_address,
        endpoint_address,
        endpoint_number: endpoint_address & 0x0F,
        endpoint_direction: TransferDirection::from_bit7(endpoint_address),
        transfer_type,
        data_length,
        reserved: reserved.to_vec(),
        setup_packet,
        data_payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 27-byte extended header on bus 1, device 5, endpoint 0 IN.
    fn extended_header(transfer: u8, data_length: u16) -> Vec<u8> {
        let mut frame = vec![
            0x1B, 0x00, // Header length: 27
            0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80, // IRP ID
            0x00, 0x00, 0x00, 0x00, // USBD status: success
            0x08, 0x00, // URB function
            0x00, // IRP info: FDO->PDO
            0x01, 0x00, // Bus ID
            0x05, 0x00, // Device address
            0x80, // Endpoint 0, IN
            transfer,
        ];
        frame.extend_from_slice(&data_length.to_le_bytes());
        frame.extend_from_slice(&[0xAA, 0xBB]); // Reserved
        frame
    }

    #[test]
    fn test_short_buffer_is_malformed() {
        let err = decode_usb_frame(&[0u8; 17], false).unwrap_err();
        assert_eq!(err, UsbError::MalformedFrame { needed: 18, have: 17 });
    }

    #[test]
    fn test_extended_27_layout() {
        let frame = decode_usb_frame(&extended_header(transfer::BULK, 0), false).unwrap();

        assert_eq!(frame.header_format, HeaderFormat::Extended27or28);
        assert_eq!(frame.header_length, 27);
        assert_eq!(frame.irp_id, [0x10, 0x20, 0x30, 0x40, 0x50, 0x60, 0x70, 0x80]);
        assert!(frame.is_success());
        assert_eq!(frame.urb_function, 8);
        assert_eq!(frame.irp_direction, IrpDirection::FdoToPdo);
        assert_eq!(frame.bus_id, 1);
        assert_eq!(frame.device_address, 5);
        assert_eq!(frame.endpoint_number, 0);
        assert_eq!(frame.endpoint_direction, TransferDirection::In);
        assert_eq!(frame.transfer_type, TransferType::Bulk);
        assert_eq!(frame.reserved, vec![0xAA, 0xBB]);
        assert_eq!(frame.header_offset(), 27);
        assert!(frame.data_payload.is_empty());
    }

    #[test]
    fn test_legacy_18_layout() {
        let data = [
            0x12, 0x00, // Header length: 18
            0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, // IRP ID
            0x01, 0x00, 0x00, 0xC0, // USBD status
            0x09, 0x00, // URB function
            0x01, // IRP info: PDO->FDO
            0x03, // Bus ID
            0x07, // Device address
            0x02, // Endpoint 2, OUT
            0x01, // Interrupt
            0x04, 0x00, // Data length
            0xEE, 0xEE, 0xEE, 0xEE, // Reserved
        ];
        let frame = decode_usb_frame(&data, false).unwrap();

        assert_eq!(frame.header_format, HeaderFormat::Legacy18);
        assert_eq!(frame.usbd_status, 0xC000_0001);
        assert!(!frame.is_success());
        assert_eq!(frame.irp_direction, IrpDirection::PdoToFdo);
        assert_eq!(frame.irp_direction.as_str(), "PDO->FDO");
        assert_eq!(frame.bus_id, 3);
        assert_eq!(frame.device_address, 7);
        assert_eq!(frame.endpoint_number, 2);
        assert_eq!(frame.endpoint_direction, TransferDirection::Out);
        assert_eq!(frame.transfer_type_name(), "INTERRUPT");
        assert_eq!(frame.data_length, 4);
        assert_eq!(frame.header_offset(), 18);
        // Payload starts at 18 and overlaps the tail of the legacy field block
        assert_eq!(frame.data_payload, vec![0x07, 0x02, 0x01, 0x04]);
    }

    #[test]
    fn test_legacy_minimum_buffer_does_not_fail() {
        let mut data = [0u8; 18];
        data[0] = 0x12;
        let frame = decode_usb_frame(&data, true).unwrap();

        assert_eq!(frame.header_format, HeaderFormat::Legacy18);
        assert_eq!(frame.bus_id, 0);
        assert!(frame.reserved.is_empty());
        assert!(frame.data_payload.is_empty());
    }

    #[test]
    fn test_setup_packet_get_descriptor() {
        let mut data = extended_header(transfer::CONTROL, 8);
        data.extend_from_slice(&[
            0x80, // Device-to-host, standard, device
            0x06, // GET_DESCRIPTOR
            0x00, 0x01, // wValue: DEVICE descriptor, index 0
            0x00, 0x00, // wIndex
            0x12, 0x00, // wLength: 18
        ]);
        let frame = decode_usb_frame(&data, true).unwrap();
        let setup = frame.setup_packet.expect("setup packet");

        assert_eq!(setup.request_name, Some("GET_DESCRIPTOR"));
        assert_eq!(setup.request_direction, TransferDirection::In);
        assert_eq!(setup.request_kind, RequestKind::Standard);
        assert_eq!(setup.recipient, Recipient::Device);
        assert_eq!(setup.w_value, 0x0100);
        assert_eq!(setup.descriptor_type, Some(1));
        assert_eq!(setup.descriptor_index, Some(0));
        assert_eq!(setup.descriptor_type_name, Some("DEVICE"));
        assert_eq!(setup.w_length, 18);
        assert!(frame.data_payload.is_empty());
    }

    #[test]
    fn test_setup_packet_requires_flag_and_control() {
        let mut data = extended_header(transfer::CONTROL, 8);
        data.extend_from_slice(&[0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let frame = decode_usb_frame(&data, false).unwrap();
        assert!(frame.setup_packet.is_none());
        assert_eq!(frame.data_payload.len(), 8);

        let mut bulk = extended_header(transfer::BULK, 8);
        bulk.extend_from_slice(&[0u8; 8]);
        assert!(decode_usb_frame(&bulk, true).unwrap().setup_packet.is_none());
    }

    #[test]
    fn test_setup_packet_truncated_is_absent() {
        let mut data = extended_header(transfer::CONTROL, 8);
        data.extend_from_slice(&[0x00, 0x09, 0x01]);
        let frame = decode_usb_frame(&data, true).unwrap();
        assert!(frame.setup_packet.is_none());
    }

    #[test]
    fn test_unknown_request_keeps_code() {
        let mut data = extended_header(transfer::CONTROL, 8);
        data.extend_from_slice(&[0x40, 0xA5, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let setup = decode_usb_frame(&data, true).unwrap().setup_packet.unwrap();

        assert_eq!(setup.b_request, 0xA5);
        assert_eq!(setup.request_name, None);
        assert_eq!(setup.request_kind, RequestKind::Vendor);
        assert_eq!(setup.descriptor_type, None);
    }

    #[test]
    fn test_payload_truncated() {
        let mut data = extended_header(transfer::BULK, 100);
        data.extend_from_slice(b"abc");
        let frame = decode_usb_frame(&data, false).unwrap();

        assert_eq!(frame.data_length, 100);
        assert_eq!(frame.data_payload, b"abc".to_vec());
    }

    #[test]
    fn test_extended_28_reserved_bytes() {
        let mut data = extended_header(transfer::CONTROL, 0);
        data[0] = 0x1C;
        data.push(0x01); // Control stage
        data.extend_from_slice(&[0xCC, 0xDD]);
        let frame = decode_usb_frame(&data, false).unwrap();

        assert_eq!(frame.header_length, 28);
        assert_eq!(frame.reserved, vec![0xAA, 0xBB, 0x01, 0xCC, 0xDD]);
        assert_eq!(frame.header_offset(), 28);
        assert!(frame.data_payload.is_empty());
    }

    #[test]
    fn test_unknown_transfer_type() {
        let frame = decode_usb_frame(&extended_header(0x7F, 0), false).unwrap();
        assert_eq!(frame.transfer_type, TransferType::Unknown(0x7F));
        assert_eq!(frame.transfer_type.as_u8(), 0x7F);
        assert_eq!(frame.transfer_type_name(), "UNKNOWN");
    }

    #[test]
    fn test_serializes_bytes_as_hex() {
        let frame = decode_usb_frame(&extended_header(transfer::BULK, 0), false).unwrap();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["irp_id"], "1020304050607080");
        assert_eq!(json["reserved"], "aabb");
    }
}
