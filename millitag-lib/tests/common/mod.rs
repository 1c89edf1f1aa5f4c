//! Common test utilities and shared imports

// Allow unused imports and dead code since this is a shared module
// used across multiple test files - not all items are used in every test file
#[allow(unused_imports)]
pub use bytes::Bytes;
#[allow(unused_imports)]
pub use chrono::{NaiveDate, NaiveDateTime};
#[allow(unused_imports)]
pub use millitag_lib::config::{BeaconConfig, DeviceIdentity};
#[allow(unused_imports)]
pub use millitag_lib::constants::*;
#[allow(unused_imports)]
pub use millitag_lib::error::BeaconError;
#[allow(unused_imports)]
pub use millitag_lib::frame::DeviceCategory;
#[allow(unused_imports)]
pub use millitag_lib::message::FrameBuilder;
#[allow(unused_imports)]
pub use millitag_lib::telemetry::{AlertFlags, DeviceStatus, PositionFix};

/// Decode hex string to bytes for testing
#[allow(dead_code)]
pub fn hex_to_bytes(hex_data: &str) -> Vec<u8> {
    hex::decode(hex_data).expect("Failed to decode hex")
}

/// The device identity used by the pinned end-to-end vectors.
#[allow(dead_code)]
pub fn test_identity() -> DeviceIdentity {
    DeviceIdentity {
        device_key: 0x06EA83A3,
        category: DeviceCategory::Millitag,
        source_type: "Millitag".to_string(),
        serial: "0001576627".to_string(),
        client_name: "Beacon Test".to_string(),
    }
}

/// The fixed position fix used by the pinned end-to-end vectors:
/// 53.82720 N, 1.66470 W at 2026-01-15 10:30:40.
#[allow(dead_code)]
pub fn test_fix() -> PositionFix {
    PositionFix {
        lat: 3229632,
        lon: -99882,
        heading_cdeg: None,
        speed: 0,
        hdop: 150,
        satellites: 10,
        valid: true,
        timestamp: ymd_hms(2026, 1, 15, 10, 30, 40),
    }
}

/// The fixed status snapshot used by the pinned end-to-end vectors.
#[allow(dead_code)]
pub fn test_status() -> DeviceStatus {
    DeviceStatus {
        battery: 100,
        temperature: 20,
        rssi: -70,
        operator: "O2 - UK".to_string(),
        firmware: (2, 7, 4),
        ..DeviceStatus::default()
    }
}

#[allow(dead_code)]
pub fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .expect("valid date")
        .and_hms_opt(h, mi, s)
        .expect("valid time")
}
