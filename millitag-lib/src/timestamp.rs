//! The 5-byte packed calendar timestamp used twice per frame: once in the
//! plain header (message build time) and once inside the encrypted payload
//! (fix time). Two independent encodings, never one shared value.
//!
//! Bit layout, most significant bits first within each byte:
//!
//! ```text
//! byte 0: day[4..0]     month[3..1]
//! byte 1: month[0]      year-1980[6..0]
//! byte 2: hour[4..0]    minute[5..3]
//! byte 3: minute[2..0]  second[5..1]
//! byte 4: second[0]     0000000
//! ```

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::BeaconError;

/// Encoded length in bytes.
pub const PACKED_LEN: usize = 5;

/// First representable year (7-bit offset base).
pub const YEAR_MIN: u16 = 1980;

/// Last representable year.
pub const YEAR_MAX: u16 = 2107;

/// A calendar date/time packed into the proprietary 5-byte layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedTimestamp([u8; PACKED_LEN]);

impl PackedTimestamp {
    /// Pack calendar fields. Device-side encoding only; [`decode`] exists for
    /// tests and log replay.
    ///
    /// [`decode`]: PackedTimestamp::decode
    pub fn encode(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, BeaconError> {
        if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
            return Err(BeaconError::Encoding {
                field: "year",
                value: year as i64,
            });
        }
        if month < 1 || month > 12 {
            return Err(BeaconError::Encoding {
                field: "month",
                value: month as i64,
            });
        }
        if day < 1 || day > 31 {
            return Err(BeaconError::Encoding {
                field: "day",
                value: day as i64,
            });
        }
        if hour > 23 {
            return Err(BeaconError::Encoding {
                field: "hour",
                value: hour as i64,
            });
        }
        if minute > 59 {
            return Err(BeaconError::Encoding {
                field: "minute",
                value: minute as i64,
            });
        }
        if second > 59 {
            return Err(BeaconError::Encoding {
                field: "second",
                value: second as i64,
            });
        }

        let year_off = (year - YEAR_MIN) as u8;
        let mut packed = [0u8; PACKED_LEN];
        packed[0] = ((day & 0x1F) << 3) | ((month >> 1) & 0x07);
        packed[1] = ((month & 0x01) << 7) | (year_off & 0x7F);
        packed[2] = ((hour & 0x1F) << 3) | ((minute >> 3) & 0x07);
        packed[3] = ((minute & 0x07) << 5) | ((second >> 1) & 0x1F);
        packed[4] = (second & 0x01) << 7;
        Ok(PackedTimestamp(packed))
    }

    /// Pack a `chrono` timestamp (seconds precision; sub-second dropped).
    pub fn from_datetime(dt: NaiveDateTime) -> Result<Self, BeaconError> {
        let year = i64::from(dt.year());
        if year < YEAR_MIN as i64 || year > YEAR_MAX as i64 {
            return Err(BeaconError::Encoding {
                field: "year",
                value: year,
            });
        }
        Self::encode(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        )
    }

    /// Unpack to `(year, month, day, hour, minute, second)`.
    pub fn decode(&self) -> (u16, u8, u8, u8, u8, u8) {
        let b = &self.0;
        let day = (b[0] >> 3) & 0x1F;
        let month = ((b[0] & 0x07) << 1) | ((b[1] >> 7) & 0x01);
        let year = (b[1] & 0x7F) as u16 + YEAR_MIN;
        let hour = (b[2] >> 3) & 0x1F;
        let minute = ((b[2] & 0x07) << 3) | ((b[3] >> 5) & 0x07);
        let second = ((b[3] & 0x1F) << 1) | ((b[4] >> 7) & 0x01);
        (year, month, day, hour, minute, second)
    }

    pub fn as_bytes(&self) -> &[u8; PACKED_LEN] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; PACKED_LEN] {
        self.0
    }
}

impl From<[u8; PACKED_LEN]> for PackedTimestamp {
    fn from(bytes: [u8; PACKED_LEN]) -> Self {
        PackedTimestamp(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_encodings() {
        let ts = PackedTimestamp::encode(2026, 1, 15, 10, 30, 45).unwrap();
        assert_eq!(hex::encode(ts.as_bytes()), "78ae53d680");

        let ts = PackedTimestamp::encode(2024, 12, 26, 4, 37, 0).unwrap();
        assert_eq!(hex::encode(ts.as_bytes()), "d62c24a000");
    }

    #[test]
    fn decode_inverts_encode() {
        let cases = [
            (2026u16, 1u8, 15u8, 10u8, 30u8, 45u8),
            (1980, 1, 1, 0, 0, 0),
            (2107, 12, 31, 23, 59, 59),
            (2000, 2, 29, 12, 8, 1),
        ];
        for (y, mo, d, h, mi, s) in cases {
            let ts = PackedTimestamp::encode(y, mo, d, h, mi, s).unwrap();
            assert_eq!(ts.decode(), (y, mo, d, h, mi, s));
        }
    }

    #[test]
    fn year_bounds() {
        assert!(matches!(
            PackedTimestamp::encode(1979, 12, 31, 23, 59, 59),
            Err(BeaconError::Encoding { field: "year", .. })
        ));
        assert!(matches!(
            PackedTimestamp::encode(2108, 1, 1, 0, 0, 0),
            Err(BeaconError::Encoding { field: "year", .. })
        ));
    }

    #[test]
    fn field_bounds() {
        assert!(PackedTimestamp::encode(2026, 0, 1, 0, 0, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 13, 1, 0, 0, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 1, 0, 0, 0, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 1, 32, 0, 0, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 1, 1, 24, 0, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 1, 1, 0, 60, 0).is_err());
        assert!(PackedTimestamp::encode(2026, 1, 1, 0, 0, 60).is_err());
    }

    #[test]
    fn from_datetime_matches_field_encoding() {
        let dt = chrono::NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 45)
            .unwrap();
        assert_eq!(
            PackedTimestamp::from_datetime(dt).unwrap(),
            PackedTimestamp::encode(2026, 1, 15, 10, 30, 45).unwrap()
        );
    }
}
