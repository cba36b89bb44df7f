//! aesforge Basic Example
//!
//! Minimal usage: `let sealed = aesforge::gcm_seal(&key, &nonce, aad, &data, 16)?;`

#![allow(clippy::pedantic, clippy::nursery)]

fn main() -> Result<(), aesforge::EngineError> {
    let key = [0x42u8; 32];
    let nonce = [0x24u8; 12];
    let data = b"Hello, World!";

    let sealed = aesforge::gcm_seal(&key, &nonce, b"header", data, 16)?;
    let opened = aesforge::gcm_open(&key, &nonce, b"header", &sealed, 16)?;

    let backend = aesforge::active_backend(aesforge::Mode::Gcm, aesforge::Direction::Encrypt);
    println!("Engine: {backend}");
    println!("Data:   {:?}", String::from_utf8_lossy(&opened));
    println!("Sealed: {}", hex::encode(sealed));
    Ok(())
}
