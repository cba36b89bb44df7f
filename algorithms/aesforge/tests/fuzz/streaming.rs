use aesforge::{gcm_seal, Direction, EngineFactory};
use bolero::check;

const KEY: [u8; 16] = [0x42; 16];
const NONCE: [u8; 12] = [0x24; 12];

#[test]
fn fuzz_streaming_consistency() {
    check!().with_type::<Vec<u8>>().for_each(|data| {
        // =============================================================================
        // BASELINE (ONE-SHOT)
        // =============================================================================
        let expected = gcm_seal(&KEY, &NONCE, b"", data, 16).unwrap();
        let factory = EngineFactory::new();

        let run = |chunks: &[&[u8]]| -> Vec<u8> {
            let mut gcm = factory.gcm(Direction::Encrypt, KEY.len()).unwrap();
            gcm.init(Direction::Encrypt, &KEY, &NONCE, b"", 16).unwrap();
            let mut out = vec![0u8; gcm.output_size(data.len())];
            let mut at = 0;
            for chunk in chunks {
                at += gcm.process_bytes(chunk, &mut out[at..]).unwrap();
            }
            at += gcm.do_final(&mut out[at..]).unwrap();
            out.truncate(at);
            out
        };

        // =============================================================================
        // STREAMING VARIATIONS
        // =============================================================================

        // 1. Single Update
        assert_eq!(run(&[data.as_slice()]), expected, "Streaming single update mismatch");

        // 2. Byte-by-Byte (Small Inputs Only)
        if data.len() < 256 {
            let bytes: Vec<&[u8]> = data.chunks(1).collect();
            assert_eq!(run(&bytes), expected, "Byte-by-byte streaming mismatch");
        }

        // 3. Arbitrary Split Points
        if data.len() > 1 {
            for split_idx in [1, data.len() / 2, data.len() - 1] {
                let (first, second) = data.split_at(split_idx);
                assert_eq!(run(&[first, second]), expected, "Split at {split_idx} mismatch");
            }
        }
    });
}

#[test]
fn fuzz_streaming_decrypt_holdback() {
    check!().with_type::<(Vec<u8>, u8)>().for_each(|(data, split)| {
        let sealed = gcm_seal(&KEY, &NONCE, b"", data, 16).unwrap();
        let split = usize::from(*split) % (sealed.len() + 1);
        let (first, second) = sealed.split_at(split);

        let mut gcm = EngineFactory::new().gcm(Direction::Decrypt, KEY.len()).unwrap();
        gcm.init(Direction::Decrypt, &KEY, &NONCE, b"", 16).unwrap();
        let mut out = vec![0u8; gcm.output_size(sealed.len())];
        let mut at = gcm.process_bytes(first, &mut out).unwrap();
        at += gcm.process_bytes(second, &mut out[at..]).unwrap();
        at += gcm.do_final(&mut out[at..]).unwrap();

        assert_eq!(&out[..at], data.as_slice(), "Split decrypt at {split} mismatch");
    });
}
