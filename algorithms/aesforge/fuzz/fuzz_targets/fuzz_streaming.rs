#![no_main]

use aesforge::{Direction, EngineFactory};
use libfuzzer_sys::fuzz_target;

const KEY: [u8; 16] = [0x2b; 16];
const NONCE: [u8; 12] = [0x0c; 12];

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    // Chunk size (1 to 255) and AAD split point come from the first two bytes
    let chunk_size = (data[0] as usize % 255) + 1;
    let body = &data[2..];
    let aad_len = (data[1] as usize).min(body.len());
    let (aad, msg) = body.split_at(aad_len);

    // One-shot reference
    let reference = aesforge::gcm_seal(&KEY, &NONCE, aad, msg, 16).unwrap();

    // Streaming: AAD and message both fed in arbitrary chunks
    let mut gcm = EngineFactory::new().gcm(Direction::Encrypt, KEY.len()).unwrap();
    gcm.init(Direction::Encrypt, &KEY, &NONCE, b"", 16).unwrap();
    for chunk in aad.chunks(chunk_size) {
        gcm.process_aad_bytes(chunk).unwrap();
    }
    let mut out = vec![0u8; gcm.output_size(msg.len())];
    let mut written = 0;
    for chunk in msg.chunks(chunk_size) {
        written += gcm.process_bytes(chunk, &mut out[written..]).unwrap();
    }
    written += gcm.do_final(&mut out[written..]).unwrap();
    out.truncate(written);

    assert_eq!(reference, out, "Streaming and one-shot sealing differ!");

    // Streaming decrypt must give the message back
    let mut gcm = EngineFactory::new().gcm(Direction::Decrypt, KEY.len()).unwrap();
    gcm.init(Direction::Decrypt, &KEY, &NONCE, aad, 16).unwrap();
    let mut plain = vec![0u8; gcm.output_size(out.len())];
    let mut written = 0;
    for chunk in out.chunks(chunk_size) {
        written += gcm.process_bytes(chunk, &mut plain[written..]).unwrap();
    }
    written += gcm.do_final(&mut plain[written..]).unwrap();
    assert_eq!(&plain[..written], msg, "Streaming decrypt lost the message!");
});
