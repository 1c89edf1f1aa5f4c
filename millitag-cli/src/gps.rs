//! A simulated fix source so the beacon can run without GPS hardware.
//!
//! Stands in for the out-of-scope NMEA driver: a short cold start, then a
//! slow north-east drift with plausible fix quality.

use chrono::Utc;
use millitag_lib::BeaconError;
use millitag_lib::gps::FixSource;
use millitag_lib::telemetry::PositionFix;

pub struct SimulatedFixSource {
    lat_deg: f64,
    lon_deg: f64,
    polls: u32,
}

impl SimulatedFixSource {
    pub fn new(lat_deg: f64, lon_deg: f64) -> Self {
        SimulatedFixSource {
            lat_deg,
            lon_deg,
            polls: 0,
        }
    }
}

impl FixSource for SimulatedFixSource {
    async fn current_fix(&mut self) -> Result<Option<PositionFix>, BeaconError> {
        self.polls += 1;
        if self.polls < 3 {
            return Ok(None); // receiver still acquiring
        }
        self.lat_deg += 0.00005;
        self.lon_deg += 0.00008;

        let mut fix =
            PositionFix::from_degrees(self.lat_deg, self.lon_deg, Utc::now().naive_utc())?;
        fix.valid = true;
        fix.satellites = 9;
        fix.hdop = 120;
        fix.heading_cdeg = Some(5800);
        fix.speed = 4;
        Ok(Some(fix))
    }
}
