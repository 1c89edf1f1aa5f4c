//! Beacon configuration: device identity, passphrase, server endpoint and
//! reporting cadence. Loaded once at startup and read-only afterwards.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::BeaconError;
use crate::frame::DeviceCategory;

/// Immutable device identity written into every frame header.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceIdentity {
    /// 4-byte device key, configured in dotted-hex form ("06.EA.83.A3").
    pub device_key: u32,
    pub category: DeviceCategory,
    /// Device-type string, 12-byte frame field.
    pub source_type: String,
    /// Serial / source identifier, 24-byte frame field.
    pub serial: String,
    /// Display name, 20-byte payload field.
    pub client_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BeaconConfig {
    // Identity
    pub passphrase: String,
    pub device_key: String,
    pub serial_number: String,
    pub client_name: String,
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default = "default_firmware")]
    pub firmware: (u8, u8, u8),

    // Server endpoint
    pub server_host: String,
    pub server_port: u16,

    // Reporting cadence
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
    #[serde(default)]
    pub adaptive_reporting: bool,
    #[serde(default = "default_moving_interval")]
    pub moving_interval_secs: u64,
    #[serde(default = "default_stationary_interval")]
    pub stationary_interval_secs: u64,
    /// Speed above which the device counts as moving (same unit as the fix
    /// speed field).
    #[serde(default = "default_moving_speed")]
    pub moving_speed_threshold: u16,

    // Timeouts and retry bounds
    #[serde(default = "default_gps_timeout")]
    pub gps_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub connect_retries: u8,
    #[serde(default = "default_retries")]
    pub send_retries: u8,
    #[serde(default = "default_backoff")]
    pub error_backoff_secs: u64,
}

fn default_source_type() -> String {
    "Millitag".to_string()
}

fn default_firmware() -> (u8, u8, u8) {
    (1, 0, 0)
}

fn default_report_interval() -> u64 {
    10
}

fn default_moving_interval() -> u64 {
    10
}

fn default_stationary_interval() -> u64 {
    60
}

fn default_moving_speed() -> u16 {
    2
}

fn default_gps_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_send_timeout() -> u64 {
    10
}

fn default_retries() -> u8 {
    3
}

fn default_backoff() -> u64 {
    5
}

impl BeaconConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BeaconError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, BeaconError> {
        let config: BeaconConfig = serde_json::from_str(raw)
            .map_err(|e| BeaconError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BeaconError> {
        if self.passphrase.is_empty() {
            return Err(BeaconError::Config("passphrase must not be empty".into()));
        }
        if self.serial_number.is_empty() {
            return Err(BeaconError::Config("serial_number must not be empty".into()));
        }
        if self.server_host.is_empty() {
            return Err(BeaconError::Config("server_host must not be empty".into()));
        }
        if self.report_interval_secs == 0 {
            return Err(BeaconError::Config(
                "report_interval_secs must be positive".into(),
            ));
        }
        parse_device_key(&self.device_key)?;
        Ok(())
    }

    /// Assemble the immutable identity written into every frame.
    pub fn identity(&self) -> Result<DeviceIdentity, BeaconError> {
        Ok(DeviceIdentity {
            device_key: parse_device_key(&self.device_key)?,
            category: DeviceCategory::Millitag,
            source_type: self.source_type.clone(),
            serial: self.serial_number.clone(),
            client_name: self.client_name.clone(),
        })
    }

    pub fn gps_timeout(&self) -> Duration {
        Duration::from_secs(self.gps_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }
}

/// Parse a device key in the deployed dotted-hex form, e.g. "06.EA.83.A3".
pub fn parse_device_key(raw: &str) -> Result<u32, BeaconError> {
    let parts: Vec<&str> = raw.split('.').collect();
    if parts.len() != 4 {
        return Err(BeaconError::Config(format!(
            "device_key `{raw}` must be four dotted hex octets"
        )));
    }
    let mut key = 0u32;
    for part in parts {
        let octet = u8::from_str_radix(part, 16).map_err(|_| {
            BeaconError::Config(format!("device_key `{raw}` has invalid octet `{part}`"))
        })?;
        key = (key << 8) | octet as u32;
    }
    Ok(key)
}
