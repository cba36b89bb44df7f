use aesforge::{cbc_decrypt, cbc_encrypt, gcm_open, gcm_seal, EngineError};
use bolero::check;

#[test]
fn fuzz_gcm_roundtrip_and_tamper() {
    check!()
        .with_type::<(Vec<u8>, Vec<u8>, [u8; 32], u8)>()
        .for_each(|(data, aad, key, knob)| {
            // =============================================================================
            // POSITIVE TEST
            // =============================================================================

            let key = &key[..[16, 24, 32][usize::from(*knob) % 3]];
            let nonce_len = 1 + usize::from(*knob) % 24;
            let nonce: Vec<u8> = (0..nonce_len).map(|i| i as u8 ^ knob).collect();
            let tag_len = 4 + usize::from(*knob) % 13;

            let sealed = gcm_seal(key, &nonce, aad, data, tag_len).unwrap();
            assert_eq!(sealed.len(), data.len() + tag_len);
            assert_eq!(&gcm_open(key, &nonce, aad, &sealed, tag_len).unwrap(), data);

            // =============================================================================
            // NEGATIVE TESTS (CORRUPTION)
            // =============================================================================

            let idx = usize::from(*knob) % sealed.len();
            let mut bad = sealed.clone();
            bad[idx] ^= 0x80;
            assert_eq!(
                gcm_open(key, &nonce, aad, &bad, tag_len),
                Err(EngineError::AuthenticationFailure),
                "Corrupted byte {idx} accepted"
            );
        });
}

#[test]
fn fuzz_cbc_roundtrip() {
    check!().with_type::<(Vec<u8>, [u8; 16])>().for_each(|(data, iv)| {
        let key = [0x5au8; 24];
        let whole = data.len() / 16 * 16;
        let ct = cbc_encrypt(&key, iv, &data[..whole]).unwrap();
        assert_eq!(ct.len(), whole);
        assert_eq!(cbc_decrypt(&key, iv, &ct).unwrap(), &data[..whole]);

        if whole != data.len() {
            assert!(matches!(
                cbc_encrypt(&key, iv, data),
                Err(EngineError::InputLength { .. })
            ));
        }
    });
}
