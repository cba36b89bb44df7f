#![no_main]

use aesforge::{EngineError, MAX_TAG_LEN, MIN_TAG_LEN};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // =============================================================================
    // PREPARATION
    // =============================================================================

    if data.len() < 33 {
        return;
    }
    let knob = data[0];
    let key_len = [16, 24, 32][knob as usize % 3];
    let tag_len = MIN_TAG_LEN + (knob as usize >> 2) % (MAX_TAG_LEN - MIN_TAG_LEN + 1);
    let key = &data[1..1 + key_len];
    let nonce = &data[1 + key_len..][..12usize.min(data.len() - 1 - key_len)];
    let msg = &data[1 + key_len + nonce.len()..];
    if nonce.is_empty() {
        return;
    }

    // =============================================================================
    // 1. AUTHENTICATED ROUNDTRIP
    // =============================================================================

    let sealed = aesforge::gcm_seal(key, nonce, b"fuzz", msg, tag_len).unwrap();
    assert_eq!(sealed.len(), msg.len() + tag_len);

    let opened = aesforge::gcm_open(key, nonce, b"fuzz", &sealed, tag_len).unwrap();
    assert_eq!(opened, msg, "Roundtrip failed");

    // =============================================================================
    // 2. TAMPER DETECTION
    // =============================================================================

    // Flip one bit, position chosen by the message itself
    let mut tampered = sealed.clone();
    let pos = msg.first().map_or(0, |&b| b as usize) % tampered.len();
    tampered[pos] ^= 1;
    assert!(
        matches!(
            aesforge::gcm_open(key, nonce, b"fuzz", &tampered, tag_len),
            Err(EngineError::AuthenticationFailure)
        ),
        "Tampered packet accepted"
    );

    // Wrong AAD
    assert!(
        aesforge::gcm_open(key, nonce, b"fuzZ", &sealed, tag_len).is_err(),
        "Wrong AAD accepted"
    );

    // =============================================================================
    // 3. CBC ROUNDTRIP
    // =============================================================================

    let aligned = &msg[..msg.len() / 16 * 16];
    let iv = [knob; 16];
    let ct = aesforge::cbc_encrypt(key, &iv, aligned).unwrap();
    assert_eq!(aesforge::cbc_decrypt(key, &iv, &ct).unwrap(), aligned, "CBC roundtrip failed");
});
