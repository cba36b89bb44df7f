//! Known-Answer Tests for aesforge
//!
//! Verifies every reachable code path against the canonical JSON vectors
//! (FIPS-197 single blocks, SP 800-38A CBC, and the GCM reference cases).

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use aesforge::{
    kernel_for, AesPrimitive, CapabilityRecord, CpuVariant, Direction, EngineFactory, Mode,
};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;

#[derive(Deserialize)]
struct BlockVector {
    name: String,
    key: String,
    plaintext: String,
    ciphertext: String,
}

#[derive(Deserialize)]
struct CbcVector {
    name: String,
    key: String,
    iv: String,
    plaintext: String,
    ciphertext: String,
}

#[derive(Deserialize)]
struct GcmVector {
    name: String,
    key: String,
    nonce: String,
    aad: String,
    plaintext: String,
    ciphertext: String,
    tag: String,
}

#[derive(Deserialize)]
struct TestVectors {
    block: Vec<BlockVector>,
    cbc: Vec<CbcVector>,
    gcm: Vec<GcmVector>,
}

fn load() -> TestVectors {
    let file = File::open("tests/test_vectors.json").expect("Failed to open test_vectors.json");
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).expect("Failed to parse JSON")
}

fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).expect("bad hex in vector file")
}

/// One factory per capability ceiling. Ceilings above the CPU collapse onto
/// the best path it has, so the same path may be exercised more than once.
fn factories() -> Vec<(CpuVariant, EngineFactory)> {
    let probed = *CapabilityRecord::probe();
    [CpuVariant::Portable, CpuVariant::Narrow, CpuVariant::Wide]
        .into_iter()
        .map(|v| (v, EngineFactory::with_capabilities(probed.restricted_to(v))))
        .collect()
}

// =============================================================================
// BLOCK CIPHER
// =============================================================================

#[test]
fn test_block_vectors() {
    let data = load();
    println!("\n=== Verifying Block Cipher Vectors ===");

    for (variant, factory) in factories() {
        let path = factory.select_path(Mode::Gcm, Direction::Encrypt);
        let kernel = kernel_for(path, factory.capabilities()).expect("selected path has a kernel");

        for v in &data.block {
            let aes = AesPrimitive::new(&unhex(&v.key), kernel).unwrap();
            let mut pt = [0u8; 16];
            pt.copy_from_slice(&unhex(&v.plaintext));

            let ct = aes.encrypt_block(&pt);
            assert_eq!(hex::encode(ct), v.ciphertext, "{} encrypt on {variant:?}", v.name);
            assert_eq!(aes.decrypt_block(&ct), pt, "{} decrypt on {variant:?}", v.name);
            println!("✅ {:<16} | {:<20} | {}", v.name, path.name(), hex::encode(ct));
        }
    }
    println!("======================================\n");
}

// =============================================================================
// CBC
// =============================================================================

#[test]
fn test_cbc_vectors() {
    let data = load();
    println!("\n=== Verifying CBC Vectors ===");

    for (variant, factory) in factories() {
        for v in &data.cbc {
            let key = unhex(&v.key);
            let iv = unhex(&v.iv);
            let pt = unhex(&v.plaintext);
            let blocks = pt.len() / 16;

            let mut enc = factory.cbc(Direction::Encrypt, key.len()).unwrap();
            enc.init(&key, &iv).unwrap();
            let mut ct = vec![0u8; pt.len()];
            assert_eq!(enc.process_blocks(&pt, blocks, &mut ct).unwrap(), pt.len());
            assert_eq!(hex::encode(&ct), v.ciphertext, "{} encrypt on {variant:?}", v.name);

            let mut dec = factory.cbc(Direction::Decrypt, key.len()).unwrap();
            dec.init(&key, &iv).unwrap();
            let mut back = vec![0u8; ct.len()];
            dec.process_blocks(&ct, blocks, &mut back).unwrap();
            assert_eq!(back, pt, "{} decrypt on {variant:?}", v.name);

            let (enc_path, dec_path) = (enc.path().name(), dec.path().name());
            println!("✅ {:<16} | enc {:<20} | dec {}", v.name, enc_path, dec_path);
        }
    }
    println!("=============================\n");
}

// =============================================================================
// GCM
// =============================================================================

#[test]
fn test_gcm_vectors() {
    let data = load();
    println!("\n=== Verifying GCM Vectors ===");

    for (variant, factory) in factories() {
        for v in &data.gcm {
            let key = unhex(&v.key);
            let nonce = unhex(&v.nonce);
            let aad = unhex(&v.aad);
            let pt = unhex(&v.plaintext);
            let expected = format!("{}{}", v.ciphertext, v.tag);

            let mut enc = factory.gcm(Direction::Encrypt, key.len()).unwrap();
            enc.init(Direction::Encrypt, &key, &nonce, &aad, 16).unwrap();
            let mut out = vec![0u8; enc.output_size(pt.len())];
            let n = enc.process_bytes(&pt, &mut out).unwrap();
            let m = enc.do_final(&mut out[n..]).unwrap();
            assert_eq!(n + m, out.len());
            assert_eq!(hex::encode(&out), expected, "{} seal on {variant:?}", v.name);
            assert_eq!(hex::encode(enc.mac().unwrap()), v.tag);

            let mut dec = factory.gcm(Direction::Decrypt, key.len()).unwrap();
            dec.init(Direction::Decrypt, &key, &nonce, &aad, 16).unwrap();
            let mut back = vec![0u8; dec.output_size(out.len())];
            let n = dec.process_bytes(&out, &mut back).unwrap();
            let m = dec.do_final(&mut back[n..]).unwrap();
            assert_eq!(&back[..n + m], pt.as_slice(), "{} open on {variant:?}", v.name);

            println!("✅ {:<16} | {:<20} | {}", v.name, enc.path().name(), v.tag);
        }
    }
    println!("=============================\n");
}

#[test]
fn test_gcm_vectors_truncated_tags() {
    let data = load();
    let v = &data.gcm[3];
    let key = unhex(&v.key);
    let full_tag = unhex(&v.tag);

    for tag_len in [4, 8, 12, 13, 15] {
        let (nonce, aad, pt) = (unhex(&v.nonce), unhex(&v.aad), unhex(&v.plaintext));
        let sealed = aesforge::gcm_seal(&key, &nonce, &aad, &pt, tag_len).unwrap();
        let (ct, tag) = sealed.split_at(sealed.len() - tag_len);
        assert_eq!(hex::encode(ct), v.ciphertext);
        assert_eq!(tag, &full_tag[..tag_len], "tag is a prefix of the full tag");
    }
}
