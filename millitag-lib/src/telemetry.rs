//! Device-side data model feeding the frame builder: the position fix from
//! the GPS collaborator and the status block gathered from the runtime.

use chrono::NaiveDateTime;
use modular_bitfield::prelude::*;

use crate::error::BeaconError;

/// Fixed-point scale for latitude/longitude: degrees * 60000.
pub const COORD_SCALE: f64 = 60000.0;

/// HDOP value reported before any fix has been seen (99.9 * 100).
pub const HDOP_UNKNOWN: u16 = 9990;

/// A position fix as produced by the GPS collaborator. Read-only to the codec.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    /// Latitude, degrees * 60000, signed.
    pub lat: i32,
    /// Longitude, degrees * 60000, signed.
    pub lon: i32,
    /// Heading in centidegrees; `None` encodes as 0xFFFF.
    pub heading_cdeg: Option<u16>,
    pub speed: u16,
    /// Horizontal dilution of precision * 100.
    pub hdop: u16,
    pub satellites: u8,
    pub valid: bool,
    pub timestamp: NaiveDateTime,
}

impl PositionFix {
    /// A fix from already-scaled fixed-point coordinates.
    pub fn new(lat: i32, lon: i32, timestamp: NaiveDateTime) -> Self {
        PositionFix {
            lat,
            lon,
            heading_cdeg: None,
            speed: 0,
            hdop: HDOP_UNKNOWN,
            satellites: 0,
            valid: false,
            timestamp,
        }
    }

    /// A fix from floating-point degrees, truncating toward zero like the
    /// deployed encoder.
    pub fn from_degrees(
        lat_deg: f64,
        lon_deg: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Self, BeaconError> {
        if !lat_deg.is_finite() || lat_deg.abs() > 90.0 {
            return Err(BeaconError::Encoding {
                field: "latitude",
                value: (lat_deg * COORD_SCALE) as i64,
            });
        }
        if !lon_deg.is_finite() || lon_deg.abs() > 180.0 {
            return Err(BeaconError::Encoding {
                field: "longitude",
                value: (lon_deg * COORD_SCALE) as i64,
            });
        }
        Ok(Self::new(
            (lat_deg * COORD_SCALE) as i32,
            (lon_deg * COORD_SCALE) as i32,
            timestamp,
        ))
    }
}

/// Alert bitmap carried in the payload. Bit assignments match the deployed
/// alert table; five high bits are reserved.
#[bitfield(bytes = 2)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertFlags {
    pub low_battery: bool,
    pub motion_start: bool,
    pub motion_stop: bool,
    pub input_change: bool,
    pub tamper: bool,
    pub external_power_lost: bool,
    pub external_power_restored: bool,
    pub geofence_enter: bool,
    pub geofence_exit: bool,
    pub connection_lost: bool,
    pub connection_restored: bool,
    #[skip]
    reserved: B5,
}

impl AlertFlags {
    /// The bitmap as the u16 written (big-endian) into the frame.
    pub fn bits(&self) -> u16 {
        u16::from_le_bytes(self.into_bytes())
    }
}

/// Runtime status snapshot included in every report. Read-only to the codec.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceStatus {
    /// Battery percentage; clamped to 100 at encode time.
    pub battery: u8,
    /// Temperature in Celsius.
    pub temperature: i8,
    /// Motion state: 0 stationary, 1 moving.
    pub motion: u8,
    /// Cellular signal strength in dBm.
    pub rssi: i32,
    pub bit_error_rate: i32,
    pub status_flags: u16,
    /// Location-area code.
    pub lac: u16,
    pub cell_id: u16,
    /// Access technology code.
    pub act: u16,
    /// Numeric operator name, 8-byte field.
    pub operator: String,
    pub firmware: (u8, u8, u8),
    /// Earliest locally logged point, epoch seconds; 0 when no log.
    pub log_earliest: u32,
    /// Latest locally logged point, epoch seconds; 0 when no log.
    pub log_latest: u32,
    pub mode: u8,
    pub motion_sensitivity: u8,
    pub wake_trigger: u8,
    pub output_state: u8,
    pub geozone: u8,
    pub input_state: u8,
    pub alerts: AlertFlags,
}

impl Default for DeviceStatus {
    fn default() -> Self {
        DeviceStatus {
            battery: 100,
            temperature: 20,
            motion: 0,
            rssi: 0,
            bit_error_rate: 0,
            status_flags: 0,
            lac: 0,
            cell_id: 0,
            act: 7,
            operator: String::new(),
            firmware: (1, 0, 0),
            log_earliest: 0,
            log_latest: 0,
            mode: 0,
            motion_sensitivity: 1,
            wake_trigger: 0,
            output_state: 0,
            geozone: 0,
            input_state: 0,
            alerts: AlertFlags::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 40)
            .unwrap()
    }

    #[test]
    fn degrees_truncate_toward_zero() {
        let fix = PositionFix::from_degrees(53.82720, -1.66470, ts()).unwrap();
        assert_eq!(fix.lat, 3229632);
        assert_eq!(fix.lon, -99882);
    }

    #[test]
    fn out_of_range_degrees_rejected() {
        assert!(matches!(
            PositionFix::from_degrees(90.1, 0.0, ts()),
            Err(BeaconError::Encoding { field: "latitude", .. })
        ));
        assert!(matches!(
            PositionFix::from_degrees(0.0, -180.5, ts()),
            Err(BeaconError::Encoding { field: "longitude", .. })
        ));
        assert!(PositionFix::from_degrees(f64::NAN, 0.0, ts()).is_err());
    }

    #[test]
    fn alert_bit_assignments() {
        assert_eq!(AlertFlags::new().with_low_battery(true).bits(), 0x0001);
        assert_eq!(AlertFlags::new().with_motion_start(true).bits(), 0x0002);
        assert_eq!(AlertFlags::new().with_motion_stop(true).bits(), 0x0004);
        assert_eq!(AlertFlags::new().with_input_change(true).bits(), 0x0008);
        assert_eq!(AlertFlags::new().with_tamper(true).bits(), 0x0010);
        assert_eq!(AlertFlags::new().with_external_power_lost(true).bits(), 0x0020);
        assert_eq!(
            AlertFlags::new().with_external_power_restored(true).bits(),
            0x0040
        );
        assert_eq!(AlertFlags::new().with_geofence_enter(true).bits(), 0x0080);
        assert_eq!(AlertFlags::new().with_geofence_exit(true).bits(), 0x0100);
        assert_eq!(AlertFlags::new().with_connection_lost(true).bits(), 0x0200);
        assert_eq!(AlertFlags::new().with_connection_restored(true).bits(), 0x0400);
    }

    #[test]
    fn status_defaults_match_deployed_values() {
        let status = DeviceStatus::default();
        assert_eq!(status.battery, 100);
        assert_eq!(status.temperature, 20);
        assert_eq!(status.act, 7);
        assert_eq!(status.motion_sensitivity, 1);
        assert_eq!(status.alerts.bits(), 0);
    }
}
