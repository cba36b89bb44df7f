//! One-Shot Packet API
//!
//! Whole-message helpers on top of the streaming sessions, using the probed
//! capability record.

use zeroize::Zeroize;

use crate::engine::EngineFactory;
use crate::types::{Direction, EngineError, KeySize, BLOCK_SIZE};

fn check_key(key: &[u8]) -> Result<(), EngineError> {
    KeySize::from_len(key.len())
        .map(|_| ())
        .ok_or(EngineError::InvalidKeySize(key.len()))
}

// =============================================================================
// GCM
// =============================================================================

/// Encrypt and authenticate a message. Returns `ciphertext || tag`.
///
/// # Errors
/// `InvalidKeySize`, `InvalidIvLength`, `InvalidTagLength` or
/// `DataLimitExceeded`.
///
/// # Example
/// ```rust
/// let key = [0x42u8; 32];
/// let nonce = [0x24u8; 12];
/// let sealed = aesforge::gcm_seal(&key, &nonce, b"header", b"payload", 16)?;
/// let opened = aesforge::gcm_open(&key, &nonce, b"header", &sealed, 16)?;
/// assert_eq!(opened, b"payload");
/// # Ok::<(), aesforge::EngineError>(())
/// ```
pub fn gcm_seal(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
    tag_len: usize,
) -> Result<Vec<u8>, EngineError> {
    check_key(key)?;
    let mut gcm = EngineFactory::new().gcm(Direction::Encrypt, key.len())?;
    gcm.init(Direction::Encrypt, key, nonce, aad, tag_len)?;

    let mut out = vec![0u8; gcm.output_size(plaintext.len())];
    let n = gcm.process_bytes(plaintext, &mut out)?;
    let m = gcm.do_final(&mut out[n..])?;
    out.truncate(n + m);
    Ok(out)
}

/// Verify and decrypt `ciphertext || tag`.
///
/// Unlike the streaming session, no plaintext is returned unless the tag
/// verified; on failure the scratch buffer is wiped.
///
/// # Errors
/// `AuthenticationFailure` on tag mismatch or when the input is shorter than
/// the tag, plus the parameter errors of [`gcm_seal`].
pub fn gcm_open(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    sealed: &[u8],
    tag_len: usize,
) -> Result<Vec<u8>, EngineError> {
    check_key(key)?;
    let mut gcm = EngineFactory::new().gcm(Direction::Decrypt, key.len())?;
    gcm.init(Direction::Decrypt, key, nonce, aad, tag_len)?;
    if sealed.len() < tag_len {
        return Err(EngineError::AuthenticationFailure);
    }

    let mut out = vec![0u8; gcm.output_size(sealed.len())];
    let result = gcm
        .process_bytes(sealed, &mut out)
        .and_then(|n| gcm.do_final(&mut out[n..]).map(|m| n + m));
    match result {
        Ok(len) => {
            out.truncate(len);
            Ok(out)
        }
        Err(e) => {
            out.zeroize();
            Err(e)
        }
    }
}

// =============================================================================
// CBC
// =============================================================================

fn cbc_oneshot(
    direction: Direction,
    key: &[u8],
    iv: &[u8],
    data: &[u8],
) -> Result<Vec<u8>, EngineError> {
    check_key(key)?;
    if data.len() % BLOCK_SIZE != 0 {
        return Err(EngineError::InputLength {
            needed: data.len().next_multiple_of(BLOCK_SIZE),
            available: data.len(),
        });
    }
    let mut cbc = EngineFactory::new().cbc(direction, key.len())?;
    cbc.init(key, iv)?;
    let mut out = vec![0u8; data.len()];
    cbc.process_blocks(data, data.len() / BLOCK_SIZE, &mut out)?;
    Ok(out)
}

/// CBC-encrypt whole blocks (no padding).
///
/// # Errors
/// `InvalidKeySize`, `InvalidIvLength`, or `InputLength` when `data` is not a
/// multiple of 16 bytes.
pub fn cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, EngineError> {
    cbc_oneshot(Direction::Encrypt, key, iv, data)
}

/// CBC-decrypt whole blocks (no padding).
///
/// # Errors
/// Same as [`cbc_encrypt`].
pub fn cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, EngineError> {
    cbc_oneshot(Direction::Decrypt, key, iv, data)
}
