//! Passphrase-to-key stretching for the payload cipher.
//!
//! PBKDF2-HMAC-SHA1 with a fixed salt and iteration count, matching the
//! deployed key scheme. SHA-1 is a protocol requirement here, not a
//! recommendation.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;

use crate::error::BeaconError;

/// Salt shared by every deployed device.
pub const KEY_SALT: [u8; 8] = [0x74, 0xC4, 0x89, 0x4C, 0x4F, 0x38, 0xFF, 0xCC];

/// PBKDF2 iteration count.
pub const KEY_ITERATIONS: u32 = 1000;

/// Derived key length in bytes.
pub const KEY_LEN: usize = 32;

/// The 32-byte cipher key stretched from the configured passphrase.
///
/// Computed once per passphrase value and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

// Key material stays out of logs.
impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Stretch `passphrase` into the session cipher key.
///
/// Deterministic: the same passphrase always yields the same key. Runs once
/// at startup, never on the per-message path.
pub fn derive_key(passphrase: &str) -> Result<DerivedKey, BeaconError> {
    if passphrase.is_empty() {
        return Err(BeaconError::Config("passphrase must not be empty".into()));
    }
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha1>(passphrase.as_bytes(), &KEY_SALT, KEY_ITERATIONS, &mut key);
    Ok(DerivedKey(key))
}
