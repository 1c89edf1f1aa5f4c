//! The legacy 64-bit block cipher protecting the frame payload.
//!
//! Classic Blowfish: 16-round Feistel network over 8-byte blocks, P-array and
//! S-boxes seeded from the hexadecimal digits of pi and mixed with the session
//! key. The schedule is built once per session and reused for every block.
//!
//! The payload is encrypted in *independent* blocks, with no chaining and no IV.
//! Each ciphertext block depends only on its own plaintext and the shared
//! schedule. That is a known weakness of the deployed protocol; server-side
//! decryption expects exactly this, so the mode is kept and named explicitly
//! rather than hidden in a call-site loop.

mod consts;

use crate::error::BeaconError;

/// Cipher block size in bytes.
pub const BLOCK_LEN: usize = 8;

const ROUNDS: usize = 16;

/// A Blowfish instance holding the expanded key schedule.
///
/// Construction runs the full key schedule (521 block encryptions); encrypting
/// a block afterwards is cheap. Recomputed only if the passphrase changes.
pub struct Blowfish {
    p: [u32; ROUNDS + 2],
    s: [[u32; 256]; 4],
}

impl Blowfish {
    /// Build the key schedule from `key`.
    ///
    /// Accepts the classic 4..=56 byte key range; in this protocol the key is
    /// always the 32-byte derived key.
    pub fn new(key: &[u8]) -> Result<Self, BeaconError> {
        if key.len() < 4 || key.len() > 56 {
            return Err(BeaconError::CipherSchedule(key.len()));
        }

        let mut cipher = Blowfish {
            p: consts::P_INIT,
            s: consts::S_INIT,
        };

        // XOR the key cyclically into the P-array.
        let mut k = 0;
        for entry in cipher.p.iter_mut() {
            let mut word = 0u32;
            for _ in 0..4 {
                word = (word << 8) | key[k] as u32;
                k = (k + 1) % key.len();
            }
            *entry ^= word;
        }

        // Replace the P-array and S-boxes with successive encryptions of an
        // all-zero block, chaining each result into the next.
        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..cipher.p.len()).step_by(2) {
            (l, r) = cipher.encrypt_words(l, r);
            cipher.p[i] = l;
            cipher.p[i + 1] = r;
        }
        for box_idx in 0..4 {
            for i in (0..256).step_by(2) {
                (l, r) = cipher.encrypt_words(l, r);
                cipher.s[box_idx][i] = l;
                cipher.s[box_idx][i + 1] = r;
            }
        }

        Ok(cipher)
    }

    fn feistel(&self, x: u32) -> u32 {
        let a = (x >> 24) as usize;
        let b = (x >> 16) as usize & 0xFF;
        let c = (x >> 8) as usize & 0xFF;
        let d = x as usize & 0xFF;
        (self.s[0][a]
            .wrapping_add(self.s[1][b])
            ^ self.s[2][c])
            .wrapping_add(self.s[3][d])
    }

    fn encrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in 0..ROUNDS {
            l ^= self.p[i];
            r ^= self.feistel(l);
            (l, r) = (r, l);
        }
        (l, r) = (r, l);
        r ^= self.p[ROUNDS];
        l ^= self.p[ROUNDS + 1];
        (l, r)
    }

    fn decrypt_words(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        for i in (2..ROUNDS + 2).rev() {
            l ^= self.p[i];
            r ^= self.feistel(l);
            (l, r) = (r, l);
        }
        (l, r) = (r, l);
        r ^= self.p[1];
        l ^= self.p[0];
        (l, r)
    }

    /// Encrypt one 8-byte block. Words are big-endian within the block.
    pub fn encrypt_block(&self, block: [u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
        let l = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let r = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let (l, r) = self.encrypt_words(l, r);
        let mut out = [0u8; BLOCK_LEN];
        out[..4].copy_from_slice(&l.to_be_bytes());
        out[4..].copy_from_slice(&r.to_be_bytes());
        out
    }

    /// Decrypt one 8-byte block. The device never decrypts on the reporting
    /// path; this exists for schedule validation and tests.
    pub fn decrypt_block(&self, block: [u8; BLOCK_LEN]) -> [u8; BLOCK_LEN] {
        let l = u32::from_be_bytes([block[0], block[1], block[2], block[3]]);
        let r = u32::from_be_bytes([block[4], block[5], block[6], block[7]]);
        let (l, r) = self.decrypt_words(l, r);
        let mut out = [0u8; BLOCK_LEN];
        out[..4].copy_from_slice(&l.to_be_bytes());
        out[4..].copy_from_slice(&r.to_be_bytes());
        out
    }

    /// Encrypt `block_count` independent 8-byte blocks of `buf` in place,
    /// starting at `offset`. No chaining between blocks.
    pub fn encrypt_independent_blocks(
        &self,
        buf: &mut [u8],
        offset: usize,
        block_count: usize,
    ) -> Result<(), BeaconError> {
        let span = block_count * BLOCK_LEN;
        let end = offset
            .checked_add(span)
            .filter(|&end| end <= buf.len())
            .ok_or_else(|| {
                BeaconError::Config(format!(
                    "cipher span {offset}+{span} exceeds buffer of {} bytes",
                    buf.len()
                ))
            })?;
        for chunk in buf[offset..end].chunks_exact_mut(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&self.encrypt_block(block));
        }
        Ok(())
    }

    /// Inverse of [`encrypt_independent_blocks`]. Test and validation use only.
    ///
    /// [`encrypt_independent_blocks`]: Blowfish::encrypt_independent_blocks
    pub fn decrypt_independent_blocks(
        &self,
        buf: &mut [u8],
        offset: usize,
        block_count: usize,
    ) -> Result<(), BeaconError> {
        let span = block_count * BLOCK_LEN;
        let end = offset
            .checked_add(span)
            .filter(|&end| end <= buf.len())
            .ok_or_else(|| {
                BeaconError::Config(format!(
                    "cipher span {offset}+{span} exceeds buffer of {} bytes",
                    buf.len()
                ))
            })?;
        for chunk in buf[offset..end].chunks_exact_mut(BLOCK_LEN) {
            let mut block = [0u8; BLOCK_LEN];
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&self.decrypt_block(block));
        }
        Ok(())
    }
}
