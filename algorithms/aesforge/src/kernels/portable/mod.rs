//! Portable implementation of the AES kernels.
//!
//! Fully self-contained: no SIMD, no lookup tables beyond the S-Box, producing
//! byte-identical results to AES-NI / VAES.
//!
//! # Timing
//!
//! The round functions index the S-Box with key- and data-dependent bytes, so
//! this path is **not constant time**: cache timing can leak key material to a
//! co-located attacker. The GHASH multiply is branch- and table-free. The
//! dispatcher only lands here when AES-NI is unavailable or when
//! `AESFORGE_CPU_VARIANT=portable` forces it.

use self::utils::{aesdec, aesdeclast, aesenc, aesenclast, gf128_mul, load, xor};
use crate::kernels::{inc32, HashKey, KeySchedule};
use crate::types::{Block, BLOCK_SIZE};

pub(crate) mod utils;

// =============================================================================
// SINGLE BLOCK
// =============================================================================

/// Encrypt one block with the emulated `AESENC` round sequence.
fn encrypt_block(ks: &KeySchedule, block: &Block) -> Block {
    let rk = ks.enc_keys();
    let nr = rk.len() - 1;
    let mut s = xor(block, &rk[0]);
    for k in &rk[1..nr] {
        s = aesenc(s, *k);
    }
    aesenclast(s, rk[nr])
}

/// Decrypt one block with the equivalent inverse cipher.
fn decrypt_block(ks: &KeySchedule, block: &Block) -> Block {
    let rk = ks.dec_keys();
    let nr = rk.len() - 1;
    let mut s = xor(block, &rk[0]);
    for k in &rk[1..nr] {
        s = aesdec(s, *k);
    }
    aesdeclast(s, rk[nr])
}

// =============================================================================
// KERNEL ENTRY POINTS
// =============================================================================

/// ECB encrypt of whole blocks.
pub fn encrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        dst.copy_from_slice(&encrypt_block(ks, &load(src)));
    }
}

/// ECB decrypt of whole blocks.
pub fn decrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        dst.copy_from_slice(&decrypt_block(ks, &load(src)));
    }
}

/// CBC encrypt. Serial by construction.
pub fn cbc_encrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        let c = encrypt_block(ks, &xor(&load(src), chain));
        dst.copy_from_slice(&c);
        *chain = c;
    }
}

/// CBC decrypt.
pub fn cbc_decrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        let c = load(src);
        dst.copy_from_slice(&xor(&decrypt_block(ks, &c), chain));
        *chain = c;
    }
}

/// CTR keystream XOR with a 32-bit big-endian counter.
pub fn ctr_apply(ks: &KeySchedule, counter: &mut Block, input: &[u8], output: &mut [u8]) {
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        let keystream = encrypt_block(ks, counter);
        inc32(counter);
        dst.copy_from_slice(&xor(&load(src), &keystream));
    }
}

/// GHASH: `acc = (acc ^ x_i) * H` for each block.
pub fn ghash(hk: &HashKey, acc: &mut Block, data: &[u8]) {
    for x in data.chunks_exact(BLOCK_SIZE) {
        *acc = gf128_mul(&xor(acc, &load(x)), hk.h());
    }
}
