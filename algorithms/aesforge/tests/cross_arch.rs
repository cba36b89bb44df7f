//! Cross-Architecture Consistency Tests
//!
//! Verifies that the AVX-512, AES-NI and Portable kernels produce IDENTICAL
//! bytes for every block operation and for GHASH, and that full sessions
//! agree no matter which code path the factory picks.
//!
//! Coverage:
//! - ECB block transforms (all key sizes, ragged block counts)
//! - CBC chaining (including the chaining value left behind)
//! - CTR keystream (including 32-bit counter wrap)
//! - GHASH aggregation (lane remainders)
//! - Session-level GCM and CBC across capability ceilings

#![cfg(target_arch = "x86_64")]
#![allow(unsafe_code)]
#![allow(missing_docs)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]

use aesforge::kernels::{self, HashKey, KeySchedule};
use aesforge::{CapabilityRecord, CpuVariant, Direction, EngineFactory};

const KEY_LENS: [usize; 3] = [16, 24, 32];
const BLOCK_COUNTS: [usize; 11] = [0, 1, 2, 3, 4, 5, 15, 16, 17, 33, 64];

fn is_aesni_supported() -> bool {
    is_x86_feature_detected!("aes")
        && is_x86_feature_detected!("pclmulqdq")
        && is_x86_feature_detected!("ssse3")
}

fn is_avx512_supported() -> bool {
    is_aesni_supported()
        && is_x86_feature_detected!("avx512f")
        && is_x86_feature_detected!("avx512bw")
        && is_x86_feature_detected!("vaes")
        && is_x86_feature_detected!("vpclmulqdq")
}

/// Deterministic filler so failures are reproducible.
fn pattern(len: usize, seed: u64) -> Vec<u8> {
    let mut x = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (x >> 56) as u8
        })
        .collect()
}

fn schedule(key_len: usize) -> KeySchedule {
    KeySchedule::new(&pattern(key_len, key_len as u64)).unwrap()
}

// =============================================================================
// ECB
// =============================================================================

#[test]
fn test_ecb_consistency() {
    if !is_aesni_supported() {
        println!("Skipping: AES-NI not supported.");
        return;
    }
    let wide = is_avx512_supported();

    for key_len in KEY_LENS {
        let ks = schedule(key_len);
        for blocks in BLOCK_COUNTS {
            let input = pattern(blocks * 16, blocks as u64);
            let mut reference = vec![0u8; input.len()];
            kernels::portable::encrypt_blocks(&ks, &input, &mut reference);

            let mut narrow = vec![0u8; input.len()];
            unsafe { kernels::aesni::encrypt_blocks(&ks, &input, &mut narrow) };
            assert_eq!(narrow, reference, "AES-NI encrypt: key {key_len}, {blocks} blocks");

            let mut back = vec![0u8; input.len()];
            unsafe { kernels::aesni::decrypt_blocks(&ks, &reference, &mut back) };
            assert_eq!(back, input, "AES-NI decrypt: key {key_len}, {blocks} blocks");

            if wide {
                let mut out = vec![0u8; input.len()];
                unsafe { kernels::avx512::encrypt_blocks(&ks, &input, &mut out) };
                assert_eq!(out, reference, "AVX-512 encrypt: key {key_len}, {blocks} blocks");
                unsafe { kernels::avx512::decrypt_blocks(&ks, &reference, &mut out) };
                assert_eq!(out, input, "AVX-512 decrypt: key {key_len}, {blocks} blocks");
            }
        }
    }
}

// =============================================================================
// CBC
// =============================================================================

#[test]
fn test_cbc_consistency() {
    if !is_aesni_supported() {
        println!("Skipping: AES-NI not supported.");
        return;
    }
    let wide = is_avx512_supported();
    let iv: [u8; 16] = pattern(16, 99).try_into().unwrap();

    for key_len in KEY_LENS {
        let ks = schedule(key_len);
        for blocks in BLOCK_COUNTS {
            let pt = pattern(blocks * 16, 1000 + blocks as u64);

            let mut ref_chain = iv;
            let mut ct = vec![0u8; pt.len()];
            kernels::portable::cbc_encrypt(&ks, &mut ref_chain, &pt, &mut ct);

            let mut chain = iv;
            let mut out = vec![0u8; pt.len()];
            unsafe { kernels::aesni::cbc_encrypt(&ks, &mut chain, &pt, &mut out) };
            assert_eq!(out, ct, "AES-NI CBC encrypt: key {key_len}, {blocks} blocks");
            assert_eq!(chain, ref_chain, "AES-NI CBC encrypt chain");

            let mut chain = iv;
            unsafe { kernels::aesni::cbc_decrypt(&ks, &mut chain, &ct, &mut out) };
            assert_eq!(out, pt, "AES-NI CBC decrypt: key {key_len}, {blocks} blocks");
            assert_eq!(chain, ref_chain, "AES-NI CBC decrypt chain");

            if wide {
                let mut chain = iv;
                unsafe { kernels::avx512::cbc_decrypt(&ks, &mut chain, &ct, &mut out) };
                assert_eq!(out, pt, "AVX-512 CBC decrypt: key {key_len}, {blocks} blocks");
                assert_eq!(chain, ref_chain, "AVX-512 CBC decrypt chain");
            }
        }
    }
}

// =============================================================================
// CTR
// =============================================================================

#[test]
fn test_ctr_consistency() {
    if !is_aesni_supported() {
        println!("Skipping: AES-NI not supported.");
        return;
    }
    let wide = is_avx512_supported();

    // Second counter sits three blocks below the 32-bit wrap
    let mut near_wrap = [0x11u8; 16];
    near_wrap[12..].copy_from_slice(&[0xff, 0xff, 0xff, 0xfd]);
    let counters = [[0u8; 16], near_wrap];

    for key_len in KEY_LENS {
        let ks = schedule(key_len);
        for start in counters {
            for blocks in BLOCK_COUNTS {
                let input = pattern(blocks * 16, 2000 + blocks as u64);

                let mut ref_ctr = start;
                let mut expected = vec![0u8; input.len()];
                kernels::portable::ctr_apply(&ks, &mut ref_ctr, &input, &mut expected);

                let mut ctr = start;
                let mut out = vec![0u8; input.len()];
                unsafe { kernels::aesni::ctr_apply(&ks, &mut ctr, &input, &mut out) };
                assert_eq!(out, expected, "AES-NI CTR: key {key_len}, {blocks} blocks");
                assert_eq!(ctr, ref_ctr, "AES-NI CTR final counter");

                if wide {
                    let mut ctr = start;
                    unsafe { kernels::avx512::ctr_apply(&ks, &mut ctr, &input, &mut out) };
                    assert_eq!(out, expected, "AVX-512 CTR: key {key_len}, {blocks} blocks");
                    assert_eq!(ctr, ref_ctr, "AVX-512 CTR final counter");
                }
            }
        }
    }
}

// =============================================================================
// GHASH
// =============================================================================

#[test]
fn test_ghash_consistency() {
    if !is_aesni_supported() {
        println!("Skipping: PCLMULQDQ not supported.");
        return;
    }
    let wide = is_avx512_supported();

    for seed in 0..4u64 {
        let h: [u8; 16] = pattern(16, 500 + seed).try_into().unwrap();
        let hk = HashKey::new(h);
        let start: [u8; 16] = pattern(16, 600 + seed).try_into().unwrap();

        for blocks in BLOCK_COUNTS {
            let data = pattern(blocks * 16, 3000 + blocks as u64);

            let mut expected = start;
            kernels::portable::ghash(&hk, &mut expected, &data);

            let mut acc = start;
            unsafe { kernels::aesni::ghash(&hk, &mut acc, &data) };
            assert_eq!(acc, expected, "PCLMULQDQ GHASH: {blocks} blocks");

            if wide {
                let mut acc = start;
                unsafe { kernels::avx512::ghash(&hk, &mut acc, &data) };
                assert_eq!(acc, expected, "VPCLMULQDQ GHASH: {blocks} blocks");
            }
        }
    }
}

// =============================================================================
// SESSIONS ACROSS CAPABILITY CEILINGS
// =============================================================================

fn seal_with(factory: &EngineFactory, key: &[u8], nonce: &[u8], aad: &[u8], pt: &[u8]) -> Vec<u8> {
    let mut gcm = factory.gcm(Direction::Encrypt, key.len()).unwrap();
    gcm.init(Direction::Encrypt, key, nonce, aad, 16).unwrap();
    let mut out = vec![0u8; gcm.output_size(pt.len())];
    let n = gcm.process_bytes(pt, &mut out).unwrap();
    let m = gcm.do_final(&mut out[n..]).unwrap();
    out.truncate(n + m);
    out
}

#[test]
fn test_session_consistency() {
    let probed = *CapabilityRecord::probe();
    let portable = EngineFactory::with_capabilities(CapabilityRecord::portable());
    let narrow = EngineFactory::with_capabilities(probed.restricted_to(CpuVariant::Narrow));
    let best = EngineFactory::with_capabilities(probed);

    let scenarios: Vec<(&str, usize, usize)> = vec![
        ("Empty", 0, 0),
        ("AAD only", 0, 20),
        ("Single byte", 1, 0),
        ("Exact block", 16, 16),
        ("Unaligned (63)", 63, 13),
        ("Wide stride (256)", 256, 64),
        ("Unaligned (1000)", 1000, 3),
        ("Large (4096)", 4096, 100),
    ];

    for key_len in KEY_LENS {
        let key = pattern(key_len, 7);
        for nonce_len in [12, 8, 60] {
            let nonce = pattern(nonce_len, 8);
            for (name, pt_len, aad_len) in &scenarios {
                let pt = pattern(*pt_len, 9);
                let aad = pattern(*aad_len, 10);

                let reference = seal_with(&portable, &key, &nonce, &aad, &pt);
                let narrow_out = seal_with(&narrow, &key, &nonce, &aad, &pt);
                assert_eq!(narrow_out, reference, "Narrow GCM: {name}");
                let best_out = seal_with(&best, &key, &nonce, &aad, &pt);
                assert_eq!(best_out, reference, "Best GCM: {name}");
            }
        }

        // CBC decrypt is the one CBC direction that can go wide
        let iv = pattern(16, 11);
        let pt = pattern(16 * 37, 12);
        let ct = aesforge::cbc_encrypt(&key, &iv, &pt).unwrap();
        for factory in [&portable, &narrow, &best] {
            let mut dec = factory.cbc(Direction::Decrypt, key_len).unwrap();
            dec.init(&key, &iv).unwrap();
            let mut out = vec![0u8; ct.len()];
            dec.process_blocks(&ct, 37, &mut out).unwrap();
            assert_eq!(out, pt, "CBC decrypt on {}", dec.path().name());
        }
    }
}
