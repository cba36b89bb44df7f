//! Key Material
//!
//! Expanded AES round keys and the GHASH subkey powers. Both are derived once
//! per session in software and then consumed by whichever kernel is active.

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::constants::{HASH_POWERS, MAX_ROUND_KEYS, RCON};
use super::portable::utils::{aesimc, gf128_mul, SBOX};
use crate::types::{Block, EngineError, KeySize, BLOCK_SIZE};

// =============================================================================
// ROUND KEYS
// =============================================================================

/// FIPS-197 key schedule in the layout AES-NI expects.
///
/// `enc[0..=Nr]` drive `AESENC`/`AESENCLAST`. `dec[0..=Nr]` hold the
/// equivalent-inverse-cipher keys for `AESDEC`/`AESDECLAST`:
/// `dec[0] = enc[Nr]`, `dec[i] = InvMixColumns(enc[Nr - i])`, `dec[Nr] = enc[0]`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeySchedule {
    enc: [Block; MAX_ROUND_KEYS],
    dec: [Block; MAX_ROUND_KEYS],
    #[zeroize(skip)]
    size: KeySize,
}

impl KeySchedule {
    /// Expand a raw 16, 24 or 32-byte key.
    ///
    /// # Errors
    /// `InvalidKeySize` for any other length.
    pub fn new(key: &[u8]) -> Result<Self, EngineError> {
        let size = KeySize::from_len(key.len()).ok_or(EngineError::InvalidKeySize(key.len()))?;
        let nk = size.key_len() / 4;
        let nr = size.rounds();
        let total = 4 * (nr + 1);

        let mut w = [[0u8; 4]; 4 * MAX_ROUND_KEYS];
        for (i, word) in w.iter_mut().enumerate().take(nk) {
            word.copy_from_slice(&key[4 * i..4 * i + 4]);
        }

        for i in nk..total {
            let mut t = w[i - 1];
            if i % nk == 0 {
                t.rotate_left(1);
                t = t.map(|b| SBOX[b as usize]);
                t[0] ^= RCON[i / nk - 1];
            } else if nk > 6 && i % nk == 4 {
                t = t.map(|b| SBOX[b as usize]);
            }
            for (j, b) in t.iter().enumerate() {
                w[i][j] = w[i - nk][j] ^ b;
            }
        }

        let mut enc = [[0u8; BLOCK_SIZE]; MAX_ROUND_KEYS];
        for (r, rk) in enc.iter_mut().enumerate().take(nr + 1) {
            for c in 0..4 {
                rk[4 * c..4 * c + 4].copy_from_slice(&w[4 * r + c]);
            }
        }
        w.zeroize();

        let mut dec = [[0u8; BLOCK_SIZE]; MAX_ROUND_KEYS];
        dec[0] = enc[nr];
        for i in 1..nr {
            dec[i] = aesimc(enc[nr - i]);
        }
        dec[nr] = enc[0];

        Ok(Self { enc, dec, size })
    }

    /// Key-size variant this schedule was expanded for.
    #[must_use]
    pub const fn size(&self) -> KeySize {
        self.size
    }

    /// Number of rounds (10, 12 or 14).
    #[must_use]
    pub const fn rounds(&self) -> usize {
        self.size.rounds()
    }

    /// Encryption round keys, `rounds() + 1` entries.
    #[must_use]
    pub fn enc_keys(&self) -> &[Block] {
        &self.enc[..=self.rounds()]
    }

    /// Decryption round keys, `rounds() + 1` entries.
    #[must_use]
    pub fn dec_keys(&self) -> &[Block] {
        &self.dec[..=self.rounds()]
    }
}

// =============================================================================
// HASH SUBKEY
// =============================================================================

/// GHASH subkey `H = E(K, 0^128)` and its powers `H^1..H^4`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HashKey {
    powers: [Block; HASH_POWERS],
}

impl HashKey {
    /// Precompute the powers of `h`.
    #[must_use]
    pub fn new(h: Block) -> Self {
        let mut powers = [[0u8; BLOCK_SIZE]; HASH_POWERS];
        powers[0] = h;
        for i in 1..HASH_POWERS {
            powers[i] = gf128_mul(&powers[i - 1], &h);
        }
        Self { powers }
    }

    /// The subkey `H` itself.
    #[must_use]
    pub const fn h(&self) -> &Block {
        &self.powers[0]
    }

    /// `H^n` for `n` in `1..=4`.
    #[must_use]
    pub const fn power(&self, n: usize) -> &Block {
        &self.powers[n - 1]
    }
}
