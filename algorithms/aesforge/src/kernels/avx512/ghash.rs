//! VPCLMULQDQ GHASH
//!
//! Aggregated reduction over four blocks per 512-bit register:
//!
//! ```text
//! Y' = (Y ^ X0)·H^4 ^ X1·H^3 ^ X2·H^2 ^ X3·H
//! ```
//!
//! Each lane runs the same shift-then-reduce multiply as the narrow kernel;
//! the four reduced lane products are then folded with XOR.

#![allow(clippy::similar_names)]

use crate::kernels::aesni;
use crate::kernels::constants::WIDE_LANES;
use crate::kernels::HashKey;
use crate::types::{Block, BLOCK_SIZE};

use core::arch::x86_64::{
    __m128i, __m512i, _mm512_broadcast_i32x4, _mm512_bslli_epi128, _mm512_bsrli_epi128,
    _mm512_clmulepi64_epi128, _mm512_extracti32x4_epi32, _mm512_inserti32x4, _mm512_loadu_si512,
    _mm512_or_si512, _mm512_setzero_si512, _mm512_shuffle_epi8, _mm512_slli_epi32,
    _mm512_srli_epi32, _mm512_xor_si512, _mm_loadu_si128, _mm_shuffle_epi8, _mm_storeu_si128,
    _mm_xor_si128,
};

const LANE_BYTES: usize = WIDE_LANES * BLOCK_SIZE;

/// Lane-wise GF(2^128) multiply of byte-reflected operands.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[target_feature(enable = "vpclmulqdq")]
#[allow(unsafe_code)]
#[inline]
unsafe fn gfmul_x4(a: __m512i, b: __m512i) -> __m512i {
    let mut tmp3 = _mm512_clmulepi64_epi128::<0x00>(a, b);
    let mut tmp4 = _mm512_clmulepi64_epi128::<0x10>(a, b);
    let mut tmp5 = _mm512_clmulepi64_epi128::<0x01>(a, b);
    let mut tmp6 = _mm512_clmulepi64_epi128::<0x11>(a, b);

    tmp4 = _mm512_xor_si512(tmp4, tmp5);
    tmp5 = _mm512_bslli_epi128::<8>(tmp4);
    tmp4 = _mm512_bsrli_epi128::<8>(tmp4);
    tmp3 = _mm512_xor_si512(tmp3, tmp5);
    tmp6 = _mm512_xor_si512(tmp6, tmp4);

    let mut tmp7 = _mm512_srli_epi32::<31>(tmp3);
    let mut tmp8 = _mm512_srli_epi32::<31>(tmp6);
    tmp3 = _mm512_slli_epi32::<1>(tmp3);
    tmp6 = _mm512_slli_epi32::<1>(tmp6);

    let mut tmp9 = _mm512_bsrli_epi128::<12>(tmp7);
    tmp8 = _mm512_bslli_epi128::<4>(tmp8);
    tmp7 = _mm512_bslli_epi128::<4>(tmp7);
    tmp3 = _mm512_or_si512(tmp3, tmp7);
    tmp6 = _mm512_or_si512(tmp6, tmp8);
    tmp6 = _mm512_or_si512(tmp6, tmp9);

    tmp7 = _mm512_slli_epi32::<31>(tmp3);
    tmp8 = _mm512_slli_epi32::<30>(tmp3);
    tmp9 = _mm512_slli_epi32::<25>(tmp3);
    tmp7 = _mm512_xor_si512(tmp7, tmp8);
    tmp7 = _mm512_xor_si512(tmp7, tmp9);
    tmp8 = _mm512_bsrli_epi128::<4>(tmp7);
    tmp7 = _mm512_bslli_epi128::<12>(tmp7);
    tmp3 = _mm512_xor_si512(tmp3, tmp7);

    let mut tmp2 = _mm512_srli_epi32::<1>(tmp3);
    tmp4 = _mm512_srli_epi32::<2>(tmp3);
    tmp5 = _mm512_srli_epi32::<7>(tmp3);
    tmp2 = _mm512_xor_si512(tmp2, tmp4);
    tmp2 = _mm512_xor_si512(tmp2, tmp5);
    tmp2 = _mm512_xor_si512(tmp2, tmp8);
    tmp3 = _mm512_xor_si512(tmp3, tmp2);
    _mm512_xor_si512(tmp6, tmp3)
}

/// XOR the four 128-bit lanes together.
#[target_feature(enable = "avx512f")]
#[allow(unsafe_code)]
#[inline]
unsafe fn fold_lanes(v: __m512i) -> __m128i {
    let a = _mm_xor_si128(
        _mm512_extracti32x4_epi32::<0>(v),
        _mm512_extracti32x4_epi32::<1>(v),
    );
    let b = _mm_xor_si128(
        _mm512_extracti32x4_epi32::<2>(v),
        _mm512_extracti32x4_epi32::<3>(v),
    );
    _mm_xor_si128(a, b)
}

/// GHASH over whole blocks; tails shorter than four blocks use the narrow kernel.
// SAFETY: Requires AVX-512F/BW + VPCLMULQDQ + PCLMULQDQ/SSSE3 (enforced by
// dispatcher). Loads go through bounds-checked 64-byte subslices.
#[target_feature(enable = "avx512f")]
#[target_feature(enable = "avx512bw")]
#[target_feature(enable = "vpclmulqdq")]
#[target_feature(enable = "pclmulqdq")]
#[target_feature(enable = "ssse3")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn ghash(hk: &HashKey, acc: &mut Block, data: &[u8]) {
    let n = data.len() / LANE_BYTES * LANE_BYTES;
    if n > 0 {
        let mask128 = aesni::ghash::bswap_mask();
        let mask = _mm512_broadcast_i32x4(mask128);

        // Lane i multiplies block i of each group by H^(4 - i)
        let mut powers = [0u8; LANE_BYTES];
        for (i, dst) in powers.chunks_exact_mut(BLOCK_SIZE).enumerate() {
            dst.copy_from_slice(hk.power(WIDE_LANES - i));
        }
        let h = _mm512_shuffle_epi8(_mm512_loadu_si512(powers.as_ptr().cast()), mask);

        let mut y = _mm_shuffle_epi8(_mm_loadu_si128(acc.as_ptr().cast()), mask128);
        for x in data[..n].chunks_exact(LANE_BYTES) {
            let x = _mm512_shuffle_epi8(_mm512_loadu_si512(x.as_ptr().cast()), mask);
            let x = _mm512_xor_si512(x, _mm512_inserti32x4::<0>(_mm512_setzero_si512(), y));
            y = fold_lanes(gfmul_x4(x, h));
        }
        _mm_storeu_si128(acc.as_mut_ptr().cast(), _mm_shuffle_epi8(y, mask128));
    }
    aesni::ghash(hk, acc, &data[n..]);
}
