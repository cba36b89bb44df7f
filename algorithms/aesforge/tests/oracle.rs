//! Reference Oracle Tests
//!
//! Compares aesforge against the RustCrypto `aes-gcm` crate across key sizes,
//! nonce lengths, tag lengths and message shapes, on every code path.

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

use aes_gcm::aead::consts::{U12, U13, U16, U8};
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::{AesGcm, Nonce};
use aesforge::{CapabilityRecord, CpuVariant, Direction, EngineFactory};

struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.next() as u8).collect()
    }

    fn below(&mut self, n: u64) -> usize {
        (self.next() % n) as usize
    }
}

fn forge_seal(
    factory: &EngineFactory,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    pt: &[u8],
    tag_len: usize,
) -> Vec<u8> {
    let mut gcm = factory.gcm(Direction::Encrypt, key.len()).unwrap();
    gcm.init(Direction::Encrypt, key, nonce, aad, tag_len).unwrap();
    let mut out = vec![0u8; gcm.output_size(pt.len())];
    let n = gcm.process_bytes(pt, &mut out).unwrap();
    let m = gcm.do_final(&mut out[n..]).unwrap();
    out.truncate(n + m);
    out
}

fn oracle_seal(key: &[u8], nonce: &[u8], aad: &[u8], pt: &[u8]) -> Vec<u8> {
    let payload = Payload { msg: pt, aad };
    macro_rules! seal {
        ($aes:ty, $nonce:ty) => {
            AesGcm::<$aes, $nonce>::new_from_slice(key)
                .expect("key length")
                .encrypt(Nonce::<$nonce>::from_slice(nonce), payload)
                .expect("oracle encrypt")
        };
    }
    match (key.len(), nonce.len()) {
        (16, 12) => seal!(Aes128, U12),
        (24, 12) => seal!(Aes192, U12),
        (32, 12) => seal!(Aes256, U12),
        (16, 8) => seal!(Aes128, U8),
        (32, 13) => seal!(Aes256, U13),
        (16, 16) => seal!(Aes128, U16),
        other => panic!("no oracle for {other:?}"),
    }
}

fn factories() -> Vec<EngineFactory> {
    let probed = *CapabilityRecord::probe();
    vec![
        EngineFactory::with_capabilities(CapabilityRecord::portable()),
        EngineFactory::with_capabilities(probed.restricted_to(CpuVariant::Narrow)),
        EngineFactory::with_capabilities(probed),
    ]
}

// =============================================================================
// SEAL / OPEN
// =============================================================================

#[test]
fn test_matches_aes_gcm_crate() {
    let mut rng = Lcg(0xA11C_E5ED);
    let shapes = [(16, 12), (24, 12), (32, 12), (16, 8), (32, 13), (16, 16)];

    for factory in factories() {
        for _ in 0..40 {
            let (key_len, nonce_len) = shapes[rng.below(shapes.len() as u64)];
            let key = rng.bytes(key_len);
            let nonce = rng.bytes(nonce_len);
            let aad_len = rng.below(70);
            let aad = rng.bytes(aad_len);
            let pt_len = rng.below(600);
            let pt = rng.bytes(pt_len);

            let expected = oracle_seal(&key, &nonce, &aad, &pt);
            let got = forge_seal(&factory, &key, &nonce, &aad, &pt, 16);
            assert_eq!(
                got, expected,
                "key {key_len}, nonce {nonce_len}, aad {aad_len}, pt {pt_len}"
            );

            let opened = aesforge::gcm_open(&key, &nonce, &aad, &expected, 16).unwrap();
            assert_eq!(opened, pt);
        }
    }
}

#[test]
fn test_truncated_tag_matches_aes_gcm_crate() {
    type Aes128Gcm12 = AesGcm<Aes128, U12, U12>;
    let key = [0x3cu8; 16];
    let nonce = [0xc3u8; 12];
    let pt = b"twelve byte tags are a common compromise";

    let expected = Aes128Gcm12::new_from_slice(&key)
        .unwrap()
        .encrypt(Nonce::<U12>::from_slice(&nonce), Payload { msg: pt, aad: b"aad" })
        .unwrap();
    let got = aesforge::gcm_seal(&key, &nonce, b"aad", pt, 12).unwrap();
    assert_eq!(got, expected);
}

// =============================================================================
// CBC VIA ECB ORACLE
// =============================================================================

#[test]
fn test_cbc_matches_block_cipher_chain() {
    use aes_gcm::aes::cipher::BlockEncrypt;
    use aes_gcm::aes::Block;

    let mut rng = Lcg(0xCBC);
    for key_len in [16, 24, 32] {
        let key = rng.bytes(key_len);
        let iv = rng.bytes(16);
        let pt = rng.bytes(16 * 23);

        let mut chain = [0u8; 16];
        chain.copy_from_slice(&iv);
        let mut expected = Vec::with_capacity(pt.len());
        for block in pt.chunks_exact(16) {
            let mut b = Block::default();
            for ((d, p), c) in b.iter_mut().zip(block).zip(&chain) {
                *d = p ^ c;
            }
            match key_len {
                16 => Aes128::new_from_slice(&key).unwrap().encrypt_block(&mut b),
                24 => Aes192::new_from_slice(&key).unwrap().encrypt_block(&mut b),
                _ => Aes256::new_from_slice(&key).unwrap().encrypt_block(&mut b),
            }
            chain.copy_from_slice(&b);
            expected.extend_from_slice(&b);
        }

        for factory in factories() {
            let mut cbc = factory.cbc(Direction::Encrypt, key_len).unwrap();
            cbc.init(&key, &iv).unwrap();
            let mut ct = vec![0u8; pt.len()];
            cbc.process_blocks(&pt, 23, &mut ct).unwrap();
            assert_eq!(ct, expected, "CBC encrypt, key {key_len}, {}", cbc.path().name());

            let mut dec = factory.cbc(Direction::Decrypt, key_len).unwrap();
            dec.init(&key, &iv).unwrap();
            let mut back = vec![0u8; ct.len()];
            dec.process_blocks(&ct, 23, &mut back).unwrap();
            assert_eq!(back, pt, "CBC decrypt, key {key_len}, {}", dec.path().name());
        }
    }
}
