//! Kernel Dispatcher
//!
//! Hardware-specific implementations of the AES block operations and GHASH.
//!
//! Every kernel exposes the same six operations through a [`Kernel`] table.
//! All operations work on whole 16-byte blocks: `input.len()` must be a
//! multiple of `BLOCK_SIZE` and `output` at least as long as `input`. Trailing
//! bytes past the last whole block are ignored.

#[cfg(target_arch = "x86_64")]
pub mod aesni;
#[cfg(target_arch = "x86_64")]
pub mod avx512;
pub mod constants;
pub mod portable;
mod schedule;

pub use schedule::{HashKey, KeySchedule};

use crate::types::{Block, CodePath};

// =============================================================================
// KERNEL TABLE
// =============================================================================

/// ECB transform of whole blocks: `fn(schedule, input, output)`.
pub type BlocksFn = fn(&KeySchedule, &[u8], &mut [u8]);

/// Chained transform carrying 16 bytes of state between calls
/// (CBC chaining value or CTR counter block).
pub type ChainFn = fn(&KeySchedule, &mut Block, &[u8], &mut [u8]);

/// GHASH fold of whole blocks into the accumulator.
pub type GhashFn = fn(&HashKey, &mut Block, &[u8]);

/// Function table for one code path.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// Code path implementing this table
    pub path: CodePath,
    /// Encrypt independent blocks
    pub encrypt_blocks: BlocksFn,
    /// Decrypt independent blocks
    pub decrypt_blocks: BlocksFn,
    /// CBC encrypt; the chaining value ends as the last ciphertext block
    pub cbc_encrypt: ChainFn,
    /// CBC decrypt; the chaining value ends as the last ciphertext block
    pub cbc_decrypt: ChainFn,
    /// CTR keystream XOR; the counter ends one past the last block used
    pub ctr_apply: ChainFn,
    /// GHASH over whole blocks
    pub ghash: GhashFn,
}

/// Increment the low 32 bits of a GCM counter block (big-endian, wrapping).
#[inline]
pub fn inc32(counter: &mut Block) {
    let ctr = u32::from_be_bytes([counter[12], counter[13], counter[14], counter[15]]);
    counter[12..].copy_from_slice(&ctr.wrapping_add(1).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inc32_wraps_low_word_only() {
        let mut c = [0xffu8; 16];
        inc32(&mut c);
        assert_eq!(&c[..12], &[0xffu8; 12]);
        assert_eq!(&c[12..], &[0, 0, 0, 0]);

        let mut c = [0u8; 16];
        c[15] = 0xfe;
        inc32(&mut c);
        inc32(&mut c);
        assert_eq!(&c[12..], &[0, 0, 1, 0]);
    }
}
