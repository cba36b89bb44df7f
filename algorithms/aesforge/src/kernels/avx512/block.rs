//! VAES Block Operations
//!
//! Four AES blocks per 512-bit register, four registers in flight per round
//! (16 blocks). Tails shorter than one register fall through to the AES-NI
//! kernel, which the wide path always has available.

#![allow(clippy::similar_names)]

use crate::kernels::aesni;
use crate::kernels::constants::{MAX_ROUND_KEYS, WIDE_LANES};
use crate::kernels::{inc32, KeySchedule};
use crate::types::{Block, BLOCK_SIZE};

use core::arch::x86_64::{
    __m512i, _mm512_aesdec_epi128, _mm512_aesdeclast_epi128, _mm512_aesenc_epi128,
    _mm512_aesenclast_epi128, _mm512_broadcast_i32x4, _mm512_loadu_si512, _mm512_setzero_si512,
    _mm512_storeu_si512, _mm512_xor_si512, _mm_loadu_si128,
};

/// Bytes per 512-bit register.
const LANE_BYTES: usize = WIDE_LANES * BLOCK_SIZE;

/// Registers in flight per iteration.
const UNROLL: usize = 4;

/// Bytes per unrolled iteration.
const GROUP: usize = UNROLL * LANE_BYTES;

// =============================================================================
// ROUND HELPERS
// =============================================================================

/// Broadcast each round key to all four lanes.
// SAFETY: `keys` is a slice of 16-byte arrays, every load is in bounds.
#[target_feature(enable = "avx512f")]
#[allow(unsafe_code)]
#[inline]
unsafe fn broadcast_keys(keys: &[Block]) -> [__m512i; MAX_ROUND_KEYS] {
    let mut rk = [_mm512_setzero_si512(); MAX_ROUND_KEYS];
    for (dst, k) in rk.iter_mut().zip(keys) {
        *dst = _mm512_broadcast_i32x4(_mm_loadu_si128(k.as_ptr().cast()));
    }
    rk
}

#[target_feature(enable = "avx512f")]
#[allow(unsafe_code)]
#[inline]
unsafe fn load(bytes: &[u8]) -> __m512i {
    _mm512_loadu_si512(bytes[..LANE_BYTES].as_ptr().cast())
}

#[target_feature(enable = "avx512f")]
#[allow(unsafe_code)]
#[inline]
unsafe fn store(bytes: &mut [u8], v: __m512i) {
    _mm512_storeu_si512(bytes[..LANE_BYTES].as_mut_ptr().cast(), v);
}

#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[allow(unsafe_code)]
#[inline]
unsafe fn encrypt_x4(rk: &[__m512i], nr: usize, b: [__m512i; UNROLL]) -> [__m512i; UNROLL] {
    let mut s = b;
    for v in &mut s {
        *v = _mm512_xor_si512(*v, rk[0]);
    }
    for &k in &rk[1..nr] {
        for v in &mut s {
            *v = _mm512_aesenc_epi128(*v, k);
        }
    }
    for v in &mut s {
        *v = _mm512_aesenclast_epi128(*v, rk[nr]);
    }
    s
}

#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[allow(unsafe_code)]
#[inline]
unsafe fn decrypt_x4(rk: &[__m512i], nr: usize, b: [__m512i; UNROLL]) -> [__m512i; UNROLL] {
    let mut s = b;
    for v in &mut s {
        *v = _mm512_xor_si512(*v, rk[0]);
    }
    for &k in &rk[1..nr] {
        for v in &mut s {
            *v = _mm512_aesdec_epi128(*v, k);
        }
    }
    for v in &mut s {
        *v = _mm512_aesdeclast_epi128(*v, rk[nr]);
    }
    s
}

#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[allow(unsafe_code)]
#[inline]
unsafe fn encrypt_x1(rk: &[__m512i], nr: usize, b: __m512i) -> __m512i {
    let mut s = _mm512_xor_si512(b, rk[0]);
    for &k in &rk[1..nr] {
        s = _mm512_aesenc_epi128(s, k);
    }
    _mm512_aesenclast_epi128(s, rk[nr])
}

#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[allow(unsafe_code)]
#[inline]
unsafe fn decrypt_x1(rk: &[__m512i], nr: usize, b: __m512i) -> __m512i {
    let mut s = _mm512_xor_si512(b, rk[0]);
    for &k in &rk[1..nr] {
        s = _mm512_aesdec_epi128(s, k);
    }
    _mm512_aesdeclast_epi128(s, rk[nr])
}

/// Split `n` whole-block bytes into (unrolled groups, single registers, narrow tail).
const fn split(n: usize) -> (usize, usize) {
    let groups = n / GROUP * GROUP;
    let regs = (n - groups) / LANE_BYTES * LANE_BYTES;
    (groups, groups + regs)
}

// =============================================================================
// KERNEL ENTRY POINTS
// =============================================================================

/// ECB encrypt of whole blocks.
// SAFETY: Requires AVX-512F/VAES + AES/SSE2 (enforced by dispatcher). All loads
// and stores go through bounds-checked 64-byte subslices.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn encrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = broadcast_keys(ks.enc_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (groups, regs) = split(n);

    for (src, dst) in input[..groups]
        .chunks_exact(GROUP)
        .zip(output[..groups].chunks_exact_mut(GROUP))
    {
        let mut b = [_mm512_setzero_si512(); UNROLL];
        for (i, v) in b.iter_mut().enumerate() {
            *v = load(&src[i * LANE_BYTES..]);
        }
        for (i, v) in encrypt_x4(&rk, nr, b).into_iter().enumerate() {
            store(&mut dst[i * LANE_BYTES..], v);
        }
    }
    for (src, dst) in input[groups..regs]
        .chunks_exact(LANE_BYTES)
        .zip(output[groups..regs].chunks_exact_mut(LANE_BYTES))
    {
        store(dst, encrypt_x1(&rk, nr, load(src)));
    }
    aesni::encrypt_blocks(ks, &input[regs..n], &mut output[regs..n]);
}

/// ECB decrypt of whole blocks.
// SAFETY: Requires AVX-512F/VAES + AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn decrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = broadcast_keys(ks.dec_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (groups, regs) = split(n);

    for (src, dst) in input[..groups]
        .chunks_exact(GROUP)
        .zip(output[..groups].chunks_exact_mut(GROUP))
    {
        let mut b = [_mm512_setzero_si512(); UNROLL];
        for (i, v) in b.iter_mut().enumerate() {
            *v = load(&src[i * LANE_BYTES..]);
        }
        for (i, v) in decrypt_x4(&rk, nr, b).into_iter().enumerate() {
            store(&mut dst[i * LANE_BYTES..], v);
        }
    }
    for (src, dst) in input[groups..regs]
        .chunks_exact(LANE_BYTES)
        .zip(output[groups..regs].chunks_exact_mut(LANE_BYTES))
    {
        store(dst, decrypt_x1(&rk, nr, load(src)));
    }
    aesni::decrypt_blocks(ks, &input[regs..n], &mut output[regs..n]);
}

/// CBC encrypt. The chaining dependency leaves nothing to vectorize, so this
/// is the narrow kernel.
// SAFETY: Requires AES/SSE2 (implied by the wide capability set).
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn cbc_encrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    aesni::cbc_encrypt(ks, chain, input, output);
}

/// CBC decrypt, 16 blocks in flight.
///
/// The XOR mask for register `r` is the ciphertext shifted back one block:
/// `[chain, c0, c1, c2]` for the first register, then an unaligned load
/// starting 16 bytes before each later register.
// SAFETY: Requires AVX-512F/VAES + AES/SSE2 (enforced by dispatcher). The
// shifted loads start at `off - 16` with `off >= 16` and end inside `input[..n]`.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn cbc_decrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = broadcast_keys(ks.dec_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (groups, regs) = split(n);

    let mut first = [0u8; LANE_BYTES];
    first[..BLOCK_SIZE].copy_from_slice(chain);

    let mut off = 0;
    while off < regs {
        let count = if off < groups { UNROLL } else { 1 };
        let mut c = [_mm512_setzero_si512(); UNROLL];
        let mut mask = [_mm512_setzero_si512(); UNROLL];
        for i in 0..count {
            let at = off + i * LANE_BYTES;
            c[i] = load(&input[at..]);
            mask[i] = if at == 0 {
                first[BLOCK_SIZE..].copy_from_slice(&input[..LANE_BYTES - BLOCK_SIZE]);
                load(&first)
            } else {
                load(&input[at - BLOCK_SIZE..])
            };
        }
        let p = if count == UNROLL {
            decrypt_x4(&rk, nr, c)
        } else {
            [
                decrypt_x1(&rk, nr, c[0]),
                c[1],
                c[2],
                c[3],
            ]
        };
        for i in 0..count {
            store(
                &mut output[off + i * LANE_BYTES..],
                _mm512_xor_si512(p[i], mask[i]),
            );
        }
        off += count * LANE_BYTES;
    }

    if regs > 0 {
        chain.copy_from_slice(&input[regs - BLOCK_SIZE..regs]);
    }
    aesni::cbc_decrypt(ks, chain, &input[regs..n], &mut output[regs..n]);
}

/// CTR keystream XOR, 16 counter blocks in flight.
// SAFETY: Requires AVX-512F/VAES + AES/SSE2 (enforced by dispatcher).
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "vaes")]
#[target_feature(enable = "aes")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn ctr_apply(ks: &KeySchedule, counter: &mut Block, input: &[u8], output: &mut [u8]) {
    let nr = ks.rounds();
    let rk = broadcast_keys(ks.enc_keys());
    let n = input.len().min(output.len()) / BLOCK_SIZE * BLOCK_SIZE;
    let (groups, regs) = split(n);

    let mut off = 0;
    while off < regs {
        let count = if off < groups { UNROLL } else { 1 };
        let mut ctrs = [[0u8; BLOCK_SIZE]; UNROLL * WIDE_LANES];
        for c in ctrs.iter_mut().take(count * WIDE_LANES) {
            *c = *counter;
            inc32(counter);
        }
        let flat = ctrs.as_flattened();
        let mut b = [_mm512_setzero_si512(); UNROLL];
        for (i, v) in b.iter_mut().enumerate().take(count) {
            *v = load(&flat[i * LANE_BYTES..]);
        }
        let keystream = if count == UNROLL {
            encrypt_x4(&rk, nr, b)
        } else {
            [encrypt_x1(&rk, nr, b[0]), b[1], b[2], b[3]]
        };
        for (i, &k) in keystream.iter().enumerate().take(count) {
            let at = off + i * LANE_BYTES;
            let data = load(&input[at..]);
            store(&mut output[at..], _mm512_xor_si512(data, k));
        }
        off += count * LANE_BYTES;
    }
    aesni::ctr_apply(ks, counter, &input[regs..n], &mut output[regs..n]);
}
