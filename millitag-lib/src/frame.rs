//! Raw wire layout of the 149-byte ciNet frame.
//!
//! The frame is three regions: a 51-byte plain header, a 96-byte payload that
//! is encrypted in place, and a 2-byte footer checksum. Both structured
//! regions are mapped field-for-field by zerocopy structs with big-endian
//! integer fields, so the layout is checked at compile time.

use bytes::Bytes;
use num_enum::{FromPrimitive, IntoPrimitive};
use zerocopy::byteorder::big_endian::{I32, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::constants::{FRAME_LEN, HEADER_LEN, PAYLOAD_LEN, PAYLOAD_OFFSET};

/// Device category byte carried in the header.
///
/// The protocol reserves the byte for future categories; `Millitag` is the
/// only one deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, FromPrimitive)]
#[repr(u8)]
pub enum DeviceCategory {
    Millitag = 0x44,

    #[num_enum(catch_all)]
    Unknown(u8),
}

/// Plain-text header, bytes 0..51.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct HeaderRaw {
    pub start: u8,          // constant 0x24 '$'
    pub packet_type: u8,    // constant 0x55 'U'
    pub length: U16,        // constant 149
    pub sequence: u8,
    pub device_key: U32,
    pub category: u8,
    pub source_type: [u8; 12], // null-padded device-type string
    pub serial: [u8; 24],      // null-padded serial / source id
    pub timestamp: [u8; 5],    // packed build time
}

/// Payload region, bytes 51..147, encrypted in place after assembly.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct PayloadRaw {
    pub data_len: U16,          // constant 96
    pub checksum_inv: [u8; 2],  // complemented CRC-16, low byte first
    pub message_type: u8,       // constant 0x02
    pub client_name: [u8; 20],
    pub latitude: I32,          // degrees * 60000
    pub longitude: I32,         // degrees * 60000
    pub heading: U16,           // degrees * 100, 0xFFFF = none
    pub speed: U16,
    pub fix_timestamp: [u8; 5], // packed fix time
    pub hdop: U16,              // HDOP * 100
    pub fix_valid: u8,
    pub motion: u8,
    pub alarm: u8,              // constant 0xFF
    pub device_data_len: U16,   // constant 0x2E
    pub battery: u8,
    pub temperature: u8,        // i8 two's complement, Celsius
    pub satellites: u8,
    pub rssi: I32,
    pub bit_error_rate: I32,
    pub status_flags: U16,
    pub lac: U16,
    pub cell_id: U16,
    pub act: U16,
    pub operator: [u8; 8],
    pub fw_major: u8,
    pub fw_minor: u8,
    pub fw_patch: u8,
    pub log_earliest: U32,
    pub log_latest: U32,
    pub mode: u8,
    pub motion_sensitivity: u8,
    pub wake_trigger: u8,
    pub output_state: u8,
    pub geozone: u8,
    pub input_state: u8,
    pub alerts: U16,
    pub padding: u8,
}

const _: () = assert!(size_of::<HeaderRaw>() == HEADER_LEN);
const _: () = assert!(size_of::<PayloadRaw>() == PAYLOAD_LEN);
const _: () = assert!(HEADER_LEN == PAYLOAD_OFFSET);
const _: () = assert!(HEADER_LEN + PAYLOAD_LEN + 2 == FRAME_LEN);

/// A sealed 149-byte frame: checksummed, encrypted, immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Seal an assembled buffer. Only the frame builder constructs these,
    /// after both checksums are stored and the payload is encrypted.
    pub(crate) fn seal(bytes: [u8; FRAME_LEN]) -> Self {
        Frame { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    /// Sequence byte carried in the header.
    pub fn sequence(&self) -> u8 {
        self.bytes[4]
    }

    /// Copy into a [`Bytes`] handle for the transport.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::offset_of;

    #[test]
    fn header_field_offsets() {
        assert_eq!(offset_of!(HeaderRaw, start), 0);
        assert_eq!(offset_of!(HeaderRaw, length), 2);
        assert_eq!(offset_of!(HeaderRaw, sequence), 4);
        assert_eq!(offset_of!(HeaderRaw, device_key), 5);
        assert_eq!(offset_of!(HeaderRaw, category), 9);
        assert_eq!(offset_of!(HeaderRaw, source_type), 10);
        assert_eq!(offset_of!(HeaderRaw, serial), 22);
        assert_eq!(offset_of!(HeaderRaw, timestamp), 46);
    }

    #[test]
    fn payload_field_offsets() {
        // Offsets within the payload; add PAYLOAD_OFFSET for frame positions.
        assert_eq!(offset_of!(PayloadRaw, checksum_inv), 53 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, message_type), 55 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, client_name), 56 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, latitude), 76 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, longitude), 80 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, heading), 84 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, fix_timestamp), 88 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, hdop), 93 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, device_data_len), 98 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, battery), 100 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, rssi), 103 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, operator), 119 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, fw_major), 127 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, log_earliest), 130 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, alerts), 144 - PAYLOAD_OFFSET);
        assert_eq!(offset_of!(PayloadRaw, padding), 146 - PAYLOAD_OFFSET);
    }

    #[test]
    fn category_round_trips_through_byte() {
        assert_eq!(u8::from(DeviceCategory::Millitag), 0x44);
        assert_eq!(DeviceCategory::from_primitive(0x44), DeviceCategory::Millitag);
        assert_eq!(
            DeviceCategory::from_primitive(0x45),
            DeviceCategory::Unknown(0x45)
        );
    }
}
