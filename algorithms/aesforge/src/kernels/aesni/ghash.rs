//! PCLMULQDQ GHASH
//!
//! Carry-less multiply with the shift-then-reduce sequence from Intel's
//! "Carry-Less Multiplication and Its Usage for Computing the GCM Mode"
//! (Algorithm 5). Operands are byte-reflected on load and store so the
//! multiply works on the GCM bit order directly.

#![allow(clippy::similar_names)]

use crate::kernels::HashKey;
use crate::types::{Block, BLOCK_SIZE};

use core::arch::x86_64::{
    __m128i, _mm_clmulepi64_si128, _mm_loadu_si128, _mm_or_si128, _mm_set_epi8,
    _mm_shuffle_epi8, _mm_slli_epi32, _mm_slli_si128, _mm_srli_epi32, _mm_srli_si128,
    _mm_storeu_si128, _mm_xor_si128,
};

/// `PSHUFB` mask reversing the 16 bytes of a register.
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
pub(crate) unsafe fn bswap_mask() -> __m128i {
    _mm_set_epi8(0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15)
}

/// GF(2^128) multiply of two byte-reflected operands, result byte-reflected.
#[target_feature(enable = "pclmulqdq")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
#[inline]
pub(crate) unsafe fn gfmul(a: __m128i, b: __m128i) -> __m128i {
    // 256-bit carry-less product tmp6:tmp3
    let mut tmp3 = _mm_clmulepi64_si128::<0x00>(a, b);
    let mut tmp4 = _mm_clmulepi64_si128::<0x10>(a, b);
    let mut tmp5 = _mm_clmulepi64_si128::<0x01>(a, b);
    let mut tmp6 = _mm_clmulepi64_si128::<0x11>(a, b);

    tmp4 = _mm_xor_si128(tmp4, tmp5);
    tmp5 = _mm_slli_si128::<8>(tmp4);
    tmp4 = _mm_srli_si128::<8>(tmp4);
    tmp3 = _mm_xor_si128(tmp3, tmp5);
    tmp6 = _mm_xor_si128(tmp6, tmp4);

    // Shift the product left by one bit (bit-reflected operands)
    let mut tmp7 = _mm_srli_epi32::<31>(tmp3);
    let mut tmp8 = _mm_srli_epi32::<31>(tmp6);
    tmp3 = _mm_slli_epi32::<1>(tmp3);
    tmp6 = _mm_slli_epi32::<1>(tmp6);

    let mut tmp9 = _mm_srli_si128::<12>(tmp7);
    tmp8 = _mm_slli_si128::<4>(tmp8);
    tmp7 = _mm_slli_si128::<4>(tmp7);
    tmp3 = _mm_or_si128(tmp3, tmp7);
    tmp6 = _mm_or_si128(tmp6, tmp8);
    tmp6 = _mm_or_si128(tmp6, tmp9);

    // Reduction, first phase
    tmp7 = _mm_slli_epi32::<31>(tmp3);
    tmp8 = _mm_slli_epi32::<30>(tmp3);
    tmp9 = _mm_slli_epi32::<25>(tmp3);
    tmp7 = _mm_xor_si128(tmp7, tmp8);
    tmp7 = _mm_xor_si128(tmp7, tmp9);
    tmp8 = _mm_srli_si128::<4>(tmp7);
    tmp7 = _mm_slli_si128::<12>(tmp7);
    tmp3 = _mm_xor_si128(tmp3, tmp7);

    // Reduction, second phase
    let mut tmp2 = _mm_srli_epi32::<1>(tmp3);
    tmp4 = _mm_srli_epi32::<2>(tmp3);
    tmp5 = _mm_srli_epi32::<7>(tmp3);
    tmp2 = _mm_xor_si128(tmp2, tmp4);
    tmp2 = _mm_xor_si128(tmp2, tmp5);
    tmp2 = _mm_xor_si128(tmp2, tmp8);
    tmp3 = _mm_xor_si128(tmp3, tmp2);
    _mm_xor_si128(tmp6, tmp3)
}

/// GHASH over whole blocks, one multiply per block.
// SAFETY: Requires PCLMULQDQ/SSSE3/SSE2 (enforced by dispatcher). Every load and
// store targets a 16-byte array or a `chunks_exact(16)` slice.
#[target_feature(enable = "pclmulqdq")]
#[target_feature(enable = "ssse3")]
#[target_feature(enable = "sse2")]
#[allow(unsafe_code)]
pub unsafe fn ghash(hk: &HashKey, acc: &mut Block, data: &[u8]) {
    let mask = bswap_mask();
    let h = _mm_shuffle_epi8(_mm_loadu_si128(hk.h().as_ptr().cast()), mask);
    let mut y = _mm_shuffle_epi8(_mm_loadu_si128(acc.as_ptr().cast()), mask);
    for x in data.chunks_exact(BLOCK_SIZE) {
        let x = _mm_shuffle_epi8(_mm_loadu_si128(x.as_ptr().cast()), mask);
        y = gfmul(_mm_xor_si128(y, x), h);
    }
    _mm_storeu_si128(acc.as_mut_ptr().cast(), _mm_shuffle_epi8(y, mask));
}
