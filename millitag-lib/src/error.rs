use std::io;
use std::time::Duration;
use thiserror::Error;

/// The primary error type for the `millitag-lib` library.
///
/// Only `Config` and `CipherSchedule` are fatal to the process; everything
/// else is recovered locally by the reporting state machine.
#[derive(Error, Debug)]
pub enum BeaconError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("field `{field}` value {value} is out of range")]
    Encoding { field: &'static str, value: i64 },

    #[error("cipher key material rejected: {0} bytes, expected 4..=56")]
    CipherSchedule(usize),

    #[error("checksum range {start}..{start}+{len} outside buffer of {buf_len} bytes")]
    ChecksumRange {
        start: usize,
        len: usize,
        buf_len: usize,
    },

    #[error("no valid GPS fix within {0:?}")]
    GpsTimeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BeaconError {
    /// Fatal errors abort the process at startup; everything else is handled
    /// by the state machine and surfaced as observability events.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BeaconError::Config(_) | BeaconError::CipherSchedule(_)
        )
    }
}
