//! AES-NI Block Operations
//!
//! ECB, CBC and CTR over whole blocks. Independent blocks are processed
//! four at a time to hide the `AESENC` latency (4-way ILP); CBC encrypt is
//! inherently serial and runs one block at a time.

#![allow(clippy::similar_names)]

use crate::kernels::constants::{MAX_ROUND_KEYS, NARROW_INTERLEAVE};
use crate::kernels::{inc32, KeySchedule};
use crate::types::{Block, BLOCK_SIZE};

use core::arch::x86_64::{
    __m128i, _mm_aesdec_si128, _mm_aesdeclast_si128, _mm_aesenc_si128, _mm_aesenclast_si128,
    _mm_loadu_si128, _mm_setzero_si128, _mm_storeu_si128, _mm_xor_si128,
};

/// Bytes per interleaved group.
const GROUP: usize = NARROW_INTERLEAVE * BLOCK_SIZE;

// =============================================================================
// ROUND HELPERS
// =============================================================================

/// Load round keys into registers. Unused slots stay zero.
// SAFETY: Requires SSE2. `keys` is a slice of 16-byte arrays, every load is in bounds.
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
pub(crate) unsafe fn load_keys(keys: &[Block]) -> [__m128i; MAX_ROUND_KEYS] {
    let mut rk = [_mm_setzero_si128(); MAX_ROUND_KEYS];
    for (dst, k) in rk.iter_mut().zip(keys) {
        *dst = _mm_loadu_si128(k.as_ptr().cast());
    }
    rk
}

#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
pub(crate) unsafe fn encrypt1(rk: &[__m128i], nr: usize, b: __m128i) -> __m128i {
    let mut s = _mm_xor_si128(b, rk[0]);
    for &k in &rk[1..nr] {
        s = _mm_aesenc_si128(s, k);
    }
    _mm_aesenclast_si128(s, rk[nr])
}

#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
pub(crate) unsafe fn decrypt1(rk: &[__m128i], nr: usize, b: __m128i) -> __m128i {
    let mut s = _mm_xor_si128(b, rk[0]);
    for &k in &rk[1..nr] {
        s = _mm_aesdec_si128(s, k);
    }
    _mm_aesdeclast_si128(s, rk[nr])
}

#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
unsafe fn encrypt4(rk: &[__m128i], nr: usize, b: [__m128i; 4]) -> [__m128i; 4] {
    let mut s0 = _mm_xor_si128(b[0], rk[0]);
    let mut s1 = _mm_xor_si128(b[1], rk[0]);
    let mut s2 = _mm_xor_si128(b[2], rk[0]);
    let mut s3 = _mm_xor_si128(b[3], rk[0]);
    for &k in &rk[1..nr] {
        s0 = _mm_aesenc_si128(s0, k);
        s1 = _mm_aesenc_si128(s1, k);
        s2 = _mm_aesenc_si128(s2, k);
        s3 = _mm_aesenc_si128(s3, k);
    }
    [
        _mm_aesenclast_si128(s0, rk[nr]),
        _mm_aesenclast_si128(s1, rk[nr]),
        _mm_aesenclast_si128(s2, rk[nr]),
        _mm_aesenclast_si128(s3, rk[nr]),
    ]
}

#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
unsafe fn decrypt4(rk: &[__m128i], nr: usize, b: [__m128i; 4]) -> [__m128i; 4] {
    let mut s0 = _mm_xor_si128(b[0], rk[0]);
    let mut s1 = _mm_xor_si128(b[1], rk[0]);
    let mut s2 = _mm_xor_si128(b[2], rk[0]);
    let mut s3 = _mm_xor_si128(b[3], rk[0]);
    for &k in &rk[1..nr] {
        s0 = _mm_aesdec_si128(s0, k);
        s1 = _mm_aesdec_si128(s1, k);
        s2 = _mm_aesdec_si128(s2, k);
        s3 = _mm_aesdec_si128(s3, k);
    }
    [
        _mm_aesdeclast_si128(s0, rk[nr]),
        _mm_aesdeclast_si128(s1, rk[nr]),
        _mm_aesdeclast_si128(s2, rk[nr]),
        _mm_aesdeclast_si128(s3, rk[nr]),
    ]
}

// SAFETY (all loaders below): every pointer comes from a `chunks_exact` slice of
// the matching width, so each 16-byte access is in bounds.

#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
unsafe fn load4(group: &[u8]) -> [__m128i; 4] {
    [
        _mm_loadu_si128(group[0..16].as_ptr().cast()),
        _mm_loadu_si128(group[16..32].as_ptr().cast()),
        _mm_loadu_si128(group[32..48].as_ptr().cast()),
        _mm_loadu_si128(group[48..64].as_ptr().cast()),
    ]
}

#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
unsafe fn store4(group: &mut [u8], v: [__m128i; 4]) {
    for (dst, x) in group.chunks_exact_mut(BLOCK_SIZE).zip(v) {
        _mm_storeu_si128(dst.as_mut_ptr().cast(), x);
    }
}

// =============================================================================
// KERNEL ENTRY POINTS
// =============================================================================

/// ECB encrypt of whole blocks.
// SAFETY: Requires AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn encrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = load_keys(ks.enc_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (input, output) = (&input[..n], &mut output[..n]);

    let mut groups_in = input.chunks_exact(GROUP);
    let mut groups_out = output.chunks_exact_mut(GROUP);
    for (src, dst) in groups_in.by_ref().zip(groups_out.by_ref()) {
        store4(dst, encrypt4(&rk, nr, load4(src)));
    }
    for (src, dst) in groups_in
        .remainder()
        .chunks_exact(BLOCK_SIZE)
        .zip(groups_out.into_remainder().chunks_exact_mut(BLOCK_SIZE))
    {
        let c = encrypt1(&rk, nr, _mm_loadu_si128(src.as_ptr().cast()));
        _mm_storeu_si128(dst.as_mut_ptr().cast(), c);
    }
}

/// ECB decrypt of whole blocks.
// SAFETY: Requires AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn decrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = load_keys(ks.dec_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (input, output) = (&input[..n], &mut output[..n]);

    let mut groups_in = input.chunks_exact(GROUP);
    let mut groups_out = output.chunks_exact_mut(GROUP);
    for (src, dst) in groups_in.by_ref().zip(groups_out.by_ref()) {
        store4(dst, decrypt4(&rk, nr, load4(src)));
    }
    for (src, dst) in groups_in
        .remainder()
        .chunks_exact(BLOCK_SIZE)
        .zip(groups_out.into_remainder().chunks_exact_mut(BLOCK_SIZE))
    {
        let p = decrypt1(&rk, nr, _mm_loadu_si128(src.as_ptr().cast()));
        _mm_storeu_si128(dst.as_mut_ptr().cast(), p);
    }
}

/// CBC encrypt, one block at a time.
// SAFETY: Requires AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn cbc_encrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = load_keys(ks.enc_keys());
    let mut iv = _mm_loadu_si128(chain.as_ptr().cast());
    for (src, dst) in input
        .chunks_exact(BLOCK_SIZE)
        .zip(output.chunks_exact_mut(BLOCK_SIZE))
    {
        let p = _mm_loadu_si128(src.as_ptr().cast());
        iv = encrypt1(&rk, nr, _mm_xor_si128(p, iv));
        _mm_storeu_si128(dst.as_mut_ptr().cast(), iv);
    }
    _mm_storeu_si128(chain.as_mut_ptr().cast(), iv);
}

/// CBC decrypt, four blocks in flight.
// SAFETY: Requires AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn cbc_decrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = load_keys(ks.dec_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (input, output) = (&input[..n], &mut output[..n]);
    let mut iv = _mm_loadu_si128(chain.as_ptr().cast());

    let mut groups_in = input.chunks_exact(GROUP);
    let mut groups_out = output.chunks_exact_mut(GROUP);
    for (src, dst) in groups_in.by_ref().zip(groups_out.by_ref()) {
        let c = load4(src);
        let p = decrypt4(&rk, nr, c);
        store4(
            dst,
            [
                _mm_xor_si128(p[0], iv),
                _mm_xor_si128(p[1], c[0]),
                _mm_xor_si128(p[2], c[1]),
                _mm_xor_si128(p[3], c[2]),
            ],
        );
        iv = c[3];
    }
    for (src, dst) in groups_in
        .remainder()
        .chunks_exact(BLOCK_SIZE)
        .zip(groups_out.into_remainder().chunks_exact_mut(BLOCK_SIZE))
    {
        let c = _mm_loadu_si128(src.as_ptr().cast());
        let p = _mm_xor_si128(decrypt1(&rk, nr, c), iv);
        _mm_storeu_si128(dst.as_mut_ptr().cast(), p);
        iv = c;
    }
    _mm_storeu_si128(chain.as_mut_ptr().cast(), iv);
}

/// CTR keystream XOR, four counter blocks in flight.
// SAFETY: Requires AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn ctr_apply(ks: &KeySchedule, counter: &mut Block, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = load_keys(ks.enc_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (input, output) = (&input[..n], &mut output[..n]);

    let mut groups_in = input.chunks_exact(GROUP);
    let mut groups_out = output.chunks_exact_mut(GROUP);
    for (src, dst) in groups_in.by_ref().zip(groups_out.by_ref()) {
        let mut ctrs = [[0u8; BLOCK_SIZE]; NARROW_INTERLEAVE];
        for c in &mut ctrs {
            *c = *counter;
            inc32(counter);
        }
        let keystream = encrypt4(&rk, nr, load4(ctrs.as_flattened()));
        let data = load4(src);
        store4(
            dst,
            [
                _mm_xor_si128(data[0], keystream[0]),
                _mm_xor_si128(data[1], keystream[1]),
                _mm_xor_si128(data[2], keystream[2]),
                _mm_xor_si128(data[3], keystream[3]),
            ],
        );
    }
    for (src, dst) in groups_in
        .remainder()
        .chunks_exact(BLOCK_SIZE)
        .zip(groups_out.into_remainder().chunks_exact_mut(BLOCK_SIZE))
    {
        let keystream = encrypt1(&rk, nr, _mm_loadu_si128(counter.as_ptr().cast()));
        inc32(counter);
        let data = _mm_loadu_si128(src.as_ptr().cast());
        _mm_storeu_si128(dst.as_mut_ptr().cast(), _mm_xor_si128(data, keystream));
    }
}
