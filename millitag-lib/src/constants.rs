// Protocol constants for the ciNet/Millitag frame

/// Total frame length on the wire (header + payload + footer checksum)
pub const FRAME_LEN: usize = 149;

/// Length of the plain-text header (bytes 0..51)
pub const HEADER_LEN: usize = 51;

/// Length of the encrypted payload region (bytes 51..147)
pub const PAYLOAD_LEN: usize = 96;

/// Offset of the payload region within the frame
pub const PAYLOAD_OFFSET: usize = 51;

/// Number of independent 8-byte cipher blocks in the payload
pub const PAYLOAD_BLOCKS: usize = 12;

/// Offset of the 2-byte complemented payload checksum field
pub const PAYLOAD_CRC_FIELD: usize = 53;

/// Offset of the payload checksum's data span (excludes the 2-byte length
/// field and the 2-byte checksum field itself)
pub const PAYLOAD_CRC_START: usize = 55;

/// Length of the payload checksum's data span (bytes 55..147)
pub const PAYLOAD_CRC_LEN: usize = 92;

/// Offset of the 2-byte footer checksum (covers bytes 0..147)
pub const FRAME_CRC_OFFSET: usize = 147;

/// Frame start marker, `'$'`
pub const START_BYTE: u8 = 0x24;

/// Packet-type marker, `'U'`
pub const PACKET_TYPE: u8 = 0x55;

/// Message-type byte inside the payload (position report)
pub const MESSAGE_TYPE: u8 = 0x02;

/// Default alarm byte
pub const ALARM_DEFAULT: u8 = 0xFF;

/// Length field of the device-specific trailing block (46 bytes)
pub const DEVICE_DATA_LEN: u16 = 0x2E;

/// Heading field value meaning "no heading available"
pub const HEADING_INVALID: u16 = 0xFFFF;
