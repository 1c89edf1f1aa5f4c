//! Frame assembly: deterministically serialize one report into the sealed
//! 149-byte wire frame.
//!
//! Build order is fixed by the protocol: plain header, payload fields,
//! payload checksum (over the pre-encryption bytes), in-place encryption of
//! the 12 payload blocks, then the whole-frame checksum. The sequence counter
//! is written as-is and incremented afterwards, wrapping mod 256.

use chrono::NaiveDateTime;
use zerocopy::IntoBytes;
use zerocopy::byteorder::big_endian::{I32, U16, U32};

use crate::blowfish::Blowfish;
use crate::config::DeviceIdentity;
use crate::constants::{
    ALARM_DEFAULT, DEVICE_DATA_LEN, FRAME_CRC_OFFSET, FRAME_LEN, HEADER_LEN, HEADING_INVALID,
    MESSAGE_TYPE, PACKET_TYPE, PAYLOAD_BLOCKS, PAYLOAD_CRC_FIELD, PAYLOAD_CRC_LEN,
    PAYLOAD_CRC_START, PAYLOAD_LEN, PAYLOAD_OFFSET, START_BYTE,
};
use crate::crc::{crc16_range, inverted_bytes};
use crate::error::BeaconError;
use crate::frame::{Frame, HeaderRaw, PayloadRaw};
use crate::kdf::derive_key;
use crate::telemetry::{DeviceStatus, PositionFix};
use crate::timestamp::PackedTimestamp;

/// Copy a string into a fixed-width null-padded field. Overlong values are
/// truncated to width - 1 so the field always keeps a NUL terminator.
fn string_field<const N: usize>(value: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let bytes = value.as_bytes();
    let len = bytes.len().min(N - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Builds ciNet frames for one device session.
///
/// Owns the cipher schedule (derived once from the passphrase) and the
/// rolling sequence counter. The single control loop is the only caller;
/// frames are built strictly in sequence order.
pub struct FrameBuilder {
    identity: DeviceIdentity,
    cipher: Blowfish,
    sequence: u8,
}

impl FrameBuilder {
    /// Derive the key, expand the cipher schedule and cache the identity.
    ///
    /// Fails with a fatal error on an empty passphrase or rejected key
    /// material; nothing can be encrypted in that case.
    pub fn new(identity: DeviceIdentity, passphrase: &str) -> Result<Self, BeaconError> {
        let key = derive_key(passphrase)?;
        let cipher = Blowfish::new(key.as_bytes())?;
        Ok(FrameBuilder {
            identity,
            cipher,
            sequence: 0,
        })
    }

    /// The sequence value the next frame will carry.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Assemble, checksum and encrypt one frame.
    ///
    /// `now` is the build wall-clock written into the plain header; the fix's
    /// own timestamp goes into the payload. An out-of-range field rejects
    /// this frame only; the caller skips the report cycle and the sequence
    /// counter is not consumed.
    pub fn build(
        &mut self,
        fix: &PositionFix,
        status: &DeviceStatus,
        now: NaiveDateTime,
    ) -> Result<Frame, BeaconError> {
        if fix.heading_cdeg == Some(HEADING_INVALID) {
            // 0xFFFF is the "no heading" sentinel on the wire.
            return Err(BeaconError::Encoding {
                field: "heading",
                value: HEADING_INVALID as i64,
            });
        }

        let build_ts = PackedTimestamp::from_datetime(now)?;
        let fix_ts = PackedTimestamp::from_datetime(fix.timestamp)?;

        let header = HeaderRaw {
            start: START_BYTE,
            packet_type: PACKET_TYPE,
            length: U16::new(FRAME_LEN as u16),
            sequence: self.sequence,
            device_key: U32::new(self.identity.device_key),
            category: self.identity.category.into(),
            source_type: string_field(&self.identity.source_type),
            serial: string_field(&self.identity.serial),
            timestamp: build_ts.into_bytes(),
        };

        let payload = PayloadRaw {
            data_len: U16::new(PAYLOAD_LEN as u16),
            checksum_inv: [0, 0], // filled after the payload CRC below
            message_type: MESSAGE_TYPE,
            client_name: string_field(&self.identity.client_name),
            latitude: I32::new(fix.lat),
            longitude: I32::new(fix.lon),
            heading: U16::new(fix.heading_cdeg.unwrap_or(HEADING_INVALID)),
            speed: U16::new(fix.speed),
            fix_timestamp: fix_ts.into_bytes(),
            hdop: U16::new(fix.hdop),
            fix_valid: fix.valid as u8,
            motion: status.motion,
            alarm: ALARM_DEFAULT,
            device_data_len: U16::new(DEVICE_DATA_LEN),
            battery: status.battery.min(100),
            temperature: status.temperature as u8,
            satellites: fix.satellites,
            rssi: I32::new(status.rssi),
            bit_error_rate: I32::new(status.bit_error_rate),
            status_flags: U16::new(status.status_flags),
            lac: U16::new(status.lac),
            cell_id: U16::new(status.cell_id),
            act: U16::new(status.act),
            operator: string_field(&status.operator),
            fw_major: status.firmware.0,
            fw_minor: status.firmware.1,
            fw_patch: status.firmware.2,
            log_earliest: U32::new(status.log_earliest),
            log_latest: U32::new(status.log_latest),
            mode: status.mode,
            motion_sensitivity: status.motion_sensitivity,
            wake_trigger: status.wake_trigger,
            output_state: status.output_state,
            geozone: status.geozone,
            input_state: status.input_state,
            alerts: U16::new(status.alerts.bits()),
            padding: 0,
        };

        let mut buf = [0u8; FRAME_LEN];
        buf[..HEADER_LEN].copy_from_slice(header.as_bytes());
        buf[PAYLOAD_OFFSET..FRAME_CRC_OFFSET].copy_from_slice(payload.as_bytes());

        // Payload checksum over the data span, stored complemented before
        // encryption covers it.
        let payload_crc = crc16_range(&buf, PAYLOAD_CRC_START, PAYLOAD_CRC_LEN)?;
        buf[PAYLOAD_CRC_FIELD..PAYLOAD_CRC_FIELD + 2]
            .copy_from_slice(&inverted_bytes(payload_crc));

        self.cipher
            .encrypt_independent_blocks(&mut buf, PAYLOAD_OFFSET, PAYLOAD_BLOCKS)?;

        let frame_crc = crc16_range(&buf, 0, FRAME_CRC_OFFSET)?;
        buf[FRAME_CRC_OFFSET..].copy_from_slice(&inverted_bytes(frame_crc));

        self.sequence = self.sequence.wrapping_add(1);
        Ok(Frame::seal(buf))
    }

    /// Decrypt a frame's payload region. Test and diagnostics use only; the
    /// device never decrypts on the reporting path.
    #[doc(hidden)]
    pub fn decrypt_payload(&self, frame: &Frame) -> Result<[u8; PAYLOAD_LEN], BeaconError> {
        let mut buf = *frame.as_bytes();
        self.cipher
            .decrypt_independent_blocks(&mut buf, PAYLOAD_OFFSET, PAYLOAD_BLOCKS)?;
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[PAYLOAD_OFFSET..FRAME_CRC_OFFSET]);
        Ok(payload)
    }
}
