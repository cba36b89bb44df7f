//! Portable software emulation of the AES round instructions and the GHASH multiply.
//!
//! Each `aes*` function reproduces the exact semantics of the matching AES-NI
//! instruction so the portable kernel and the hardware kernels share one key
//! schedule layout and produce byte-identical output.

use crate::kernels::constants::{GF_POLY, GHASH_R};
use crate::types::{Block, BLOCK_SIZE};

// AES S-Box. Indexed by secret state bytes, so lookups are not constant time.
#[rustfmt::skip]
pub(crate) const SBOX: [u8; 256] = [
    0x63, 0x7c, 0x77, 0x7b, 0xf2, 0x6b, 0x6f, 0xc5, 0x30, 0x01, 0x67, 0x2b, 0xfe, 0xd7, 0xab, 0x76,
    0xca, 0x82, 0xc9, 0x7d, 0xfa, 0x59, 0x47, 0xf0, 0xad, 0xd4, 0xa2, 0xaf, 0x9c, 0xa4, 0x72, 0xc0,
    0xb7, 0xfd, 0x93, 0x26, 0x36, 0x3f, 0xf7, 0xcc, 0x34, 0xa5, 0xe5, 0xf1, 0x71, 0xd8, 0x31, 0x15,
    0x04, 0xc7, 0x23, 0xc3, 0x18, 0x96, 0x05, 0x9a, 0x07, 0x12, 0x80, 0xe2, 0xeb, 0x27, 0xb2, 0x75,
    0x09, 0x83, 0x2c, 0x1a, 0x1b, 0x6e, 0x5a, 0xa0, 0x52, 0x3b, 0xd6, 0xb3, 0x29, 0xe3, 0x2f, 0x84,
    0x53, 0xd1, 0x00, 0xed, 0x20, 0xfc, 0xb1, 0x5b, 0x6a, 0xcb, 0xbe, 0x39, 0x4a, 0x4c, 0x58, 0xcf,
    0xd0, 0xef, 0xaa, 0xfb, 0x43, 0x4d, 0x33, 0x85, 0x45, 0xf9, 0x02, 0x7f, 0x50, 0x3c, 0x9f, 0xa8,
    0x51, 0xa3, 0x40, 0x8f, 0x92, 0x9d, 0x38, 0xf5, 0xbc, 0xb6, 0xda, 0x21, 0x10, 0xff, 0xf3, 0xd2,
    0xcd, 0x0c, 0x13, 0xec, 0x5f, 0x97, 0x44, 0x17, 0xc4, 0xa7, 0x7e, 0x3d, 0x64, 0x5d, 0x19, 0x73,
    0x60, 0x81, 0x4f, 0xdc, 0x22, 0x2a, 0x90, 0x88, 0x46, 0xee, 0xb8, 0x14, 0xde, 0x5e, 0x0b, 0xdb,
    0xe0, 0x32, 0x3a, 0x0a, 0x49, 0x06, 0x24, 0x5c, 0xc2, 0xd3, 0xac, 0x62, 0x91, 0x95, 0xe4, 0x79,
    0xe7, 0xc8, 0x37, 0x6d, 0x8d, 0xd5, 0x4e, 0xa9, 0x6c, 0x56, 0xf4, 0xea, 0x65, 0x7a, 0xae, 0x08,
    0xba, 0x78, 0x25, 0x2e, 0x1c, 0xa6, 0xb4, 0xc6, 0xe8, 0xdd, 0x74, 0x1f, 0x4b, 0xbd, 0x8b, 0x8a,
    0x70, 0x3e, 0xb5, 0x66, 0x48, 0x03, 0xf6, 0x0e, 0x61, 0x35, 0x57, 0xb9, 0x86, 0xc1, 0x1d, 0x9e,
    0xe1, 0xf8, 0x98, 0x11, 0x69, 0xd9, 0x8e, 0x94, 0x9b, 0x1e, 0x87, 0xe9, 0xce, 0x55, 0x28, 0xdf,
    0x8c, 0xa1, 0x89, 0x0d, 0xbf, 0xe6, 0x42, 0x68, 0x41, 0x99, 0x2d, 0x0f, 0xb0, 0x54, 0xbb, 0x16
];

/// Inverse S-Box, derived from `SBOX` at compile time.
const INV_SBOX: [u8; 256] = invert_sbox(&SBOX);

const fn invert_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut inv = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inv[sbox[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

// =============================================================================
// BLOCK HELPERS
// =============================================================================

/// Copy the first 16 bytes of `bytes` into a block.
#[inline]
pub fn load(bytes: &[u8]) -> Block {
    let mut b = [0u8; BLOCK_SIZE];
    b.copy_from_slice(&bytes[..BLOCK_SIZE]);
    b
}

/// Byte-wise XOR of two blocks.
#[inline]
pub fn xor(a: &Block, b: &Block) -> Block {
    let mut res = [0u8; BLOCK_SIZE];
    for (i, r) in res.iter_mut().enumerate() {
        *r = a[i] ^ b[i];
    }
    res
}

// =============================================================================
// ROUND STEPS
// =============================================================================

/// GF(2^8) multiplication by 2 (used in `MixColumns`).
/// Branchless: `b >> 7` extracts the MSB as 0 or 1; multiplying by `GF_POLY`
/// produces the conditional reduction polynomial without a data-dependent branch.
const fn gf_double(b: u8) -> u8 {
    (b << 1) ^ ((b >> 7) * GF_POLY)
}

/// AES `MixColumns` on a single 4-byte column.
fn mix_column(c: &mut [u8]) {
    let t = [c[0], c[1], c[2], c[3]];
    c[0] = gf_double(t[0] ^ t[1]) ^ t[1] ^ t[2] ^ t[3];
    c[1] = gf_double(t[1] ^ t[2]) ^ t[2] ^ t[3] ^ t[0];
    c[2] = gf_double(t[2] ^ t[3]) ^ t[3] ^ t[0] ^ t[1];
    c[3] = gf_double(t[3] ^ t[0]) ^ t[0] ^ t[1] ^ t[2];
}

/// AES `InvMixColumns` on a single 4-byte column (multipliers 0e, 0b, 0d, 09).
fn inv_mix_column(c: &mut [u8]) {
    let t = [c[0], c[1], c[2], c[3]];
    let x2 = t.map(gf_double);
    let x4 = x2.map(gf_double);
    let x8 = x4.map(gf_double);
    let m9 = |i: usize| x8[i] ^ t[i];
    let m11 = |i: usize| x8[i] ^ x2[i] ^ t[i];
    let m13 = |i: usize| x8[i] ^ x4[i] ^ t[i];
    let m14 = |i: usize| x8[i] ^ x4[i] ^ x2[i];
    c[0] = m14(0) ^ m11(1) ^ m13(2) ^ m9(3);
    c[1] = m9(0) ^ m14(1) ^ m11(2) ^ m13(3);
    c[2] = m13(0) ^ m9(1) ^ m14(2) ^ m11(3);
    c[3] = m11(0) ^ m13(1) ^ m9(2) ^ m14(3);
}

/// `SubBytes` + `ShiftRows`. State byte `r + 4c` is row `r`, column `c`.
fn sub_shift(s: &Block) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    for c in 0..4 {
        for r in 0..4 {
            out[r + 4 * c] = SBOX[s[r + 4 * ((c + r) % 4)] as usize];
        }
    }
    out
}

/// `InvShiftRows` + `InvSubBytes`.
fn inv_sub_shift(s: &Block) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    for c in 0..4 {
        for r in 0..4 {
            out[r + 4 * c] = INV_SBOX[s[r + 4 * ((c + 4 - r) % 4)] as usize];
        }
    }
    out
}

// =============================================================================
// INSTRUCTION EMULATION
// =============================================================================

/// `AESENC`: one full encryption round.
pub fn aesenc(state: Block, key: Block) -> Block {
    let mut s = sub_shift(&state);
    for col in s.chunks_exact_mut(4) {
        mix_column(col);
    }
    xor(&s, &key)
}

/// `AESENCLAST`: final encryption round (no `MixColumns`).
pub fn aesenclast(state: Block, key: Block) -> Block {
    xor(&sub_shift(&state), &key)
}

/// `AESDEC`: one equivalent-inverse-cipher round.
pub fn aesdec(state: Block, key: Block) -> Block {
    let mut s = inv_sub_shift(&state);
    for col in s.chunks_exact_mut(4) {
        inv_mix_column(col);
    }
    xor(&s, &key)
}

/// `AESDECLAST`: final decryption round (no `InvMixColumns`).
pub fn aesdeclast(state: Block, key: Block) -> Block {
    xor(&inv_sub_shift(&state), &key)
}

/// `AESIMC`: `InvMixColumns` on a round key.
pub fn aesimc(key: Block) -> Block {
    let mut k = key;
    for col in k.chunks_exact_mut(4) {
        inv_mix_column(col);
    }
    k
}

// =============================================================================
// GHASH MULTIPLY
// =============================================================================

/// Multiply two elements of GF(2^128) in the GCM bit order.
///
/// Branchless: each bit of `y` and the carry out of `v` are turned into
/// all-ones/all-zeros masks via `wrapping_neg`, so the loop runs the same
/// instruction sequence regardless of the operands.
pub fn gf128_mul(x: &Block, y: &Block) -> Block {
    let y = u128::from_be_bytes(*y);
    let mut v = u128::from_be_bytes(*x);
    let mut z = 0u128;

    for i in (0..128).rev() {
        let mask = ((y >> i) & 1).wrapping_neg();
        z ^= v & mask;
        let carry = (v & 1).wrapping_neg();
        v = (v >> 1) ^ (GHASH_R & carry);
    }
    z.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_u64s(lo: u64, hi: u64) -> Block {
        let mut b = [0u8; 16];
        b[0..8].copy_from_slice(&lo.to_le_bytes());
        b[8..16].copy_from_slice(&hi.to_le_bytes());
        b
    }

    #[test]
    fn test_aesenc_manual_verification() {
        let c0 = 0xB172_17F7_D1CF_79AB;
        let seed = 0xDEAD_BEEF;

        let res = aesenc(from_u64s(c0, c0 + 1), from_u64s(seed, seed));

        let res_lo = u64::from_le_bytes([
            res[0], res[1], res[2], res[3], res[4], res[5], res[6], res[7],
        ]);
        let res_hi = u64::from_le_bytes([
            res[8], res[9], res[10], res[11], res[12], res[13], res[14], res[15],
        ]);

        assert_eq!(res_lo, 0x321c_e16f_8973_6a62, "Low 64-bit mismatch");
        assert_eq!(res_hi, 0x321c_e16f_8780_999f, "High 64-bit mismatch");
    }

    #[test]
    fn test_inverse_sbox() {
        for i in 0..=255u8 {
            assert_eq!(INV_SBOX[SBOX[i as usize] as usize], i);
        }
    }

    #[test]
    fn test_mix_columns_inverse() {
        // FIPS-197 MixColumns example column: db 13 53 45 -> 8e 4d a1 bc
        let mut col = [0xdb, 0x13, 0x53, 0x45];
        mix_column(&mut col);
        assert_eq!(col, [0x8e, 0x4d, 0xa1, 0xbc]);
        inv_mix_column(&mut col);
        assert_eq!(col, [0xdb, 0x13, 0x53, 0x45]);
    }

    #[test]
    fn test_gf128_identity_and_commutativity() {
        // The multiplicative identity is x^0: the leftmost bit of the block.
        let mut one = [0u8; 16];
        one[0] = 0x80;
        let a: Block = core::array::from_fn(|i| (i as u8).wrapping_mul(29) ^ 0x5a);
        let b: Block = core::array::from_fn(|i| (i as u8).wrapping_mul(71) ^ 0xc3);

        assert_eq!(gf128_mul(&a, &one), a);
        assert_eq!(gf128_mul(&one, &b), b);
        assert_eq!(gf128_mul(&a, &b), gf128_mul(&b, &a));
        assert_eq!(gf128_mul(&a, &[0u8; 16]), [0u8; 16]);
    }
}
