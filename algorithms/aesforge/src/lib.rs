//! # aesforge
//!
//! Hardware-accelerated AES-CBC and AES-GCM engines.
//! Accelerated by VAES + VPCLMULQDQ (AVX-512) or AES-NI + PCLMULQDQ, with a
//! portable fallback that produces identical bytes.

//! # Usage
//! ```rust
//! use aesforge::{Direction, EngineFactory};
//!
//! let factory = EngineFactory::new();
//! let key = [7u8; 16];
//! let nonce = [9u8; 12];
//!
//! // 1. Streaming AEAD
//! let mut enc = factory.gcm(Direction::Encrypt, key.len())?;
//! enc.init(Direction::Encrypt, &key, &nonce, b"header", 16)?;
//! let mut sealed = vec![0u8; enc.output_size(5)];
//! let n = enc.process_bytes(b"hello", &mut sealed)?;
//! let m = enc.do_final(&mut sealed[n..])?;
//! sealed.truncate(n + m);
//!
//! // 2. One-shot verify-then-release
//! let opened = aesforge::gcm_open(&key, &nonce, b"header", &sealed, 16)?;
//! assert_eq!(opened, b"hello");
//!
//! // 3. CBC over whole blocks
//! let ct = aesforge::cbc_encrypt(&key, &[0u8; 16], &[1u8; 32])?;
//! assert_eq!(aesforge::cbc_decrypt(&key, &[0u8; 16], &ct)?, [1u8; 32]);
//! # Ok::<(), aesforge::EngineError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

mod engine;
pub mod ffi;
// Re-export internal kernels for benchmarking/testing if needed, but hide from docs
#[doc(hidden)]
pub mod kernels; // Public for test/bench use only
mod modes;
mod packet;
mod primitive;
pub(crate) mod types;

// =============================================================================
// EXPORTS
// =============================================================================

pub use engine::dispatcher::{kernel_for, select_path};
pub use engine::{
    active_backend, create, CapabilityRecord, CpuVariant, Engine, EngineFactory, CPU_VARIANT_ENV,
};
pub use modes::{CbcCipher, GcmCipher};
pub use packet::{cbc_decrypt, cbc_encrypt, gcm_open, gcm_seal};
pub use primitive::AesPrimitive;
pub use types::{
    Block, CodePath, Direction, EngineError, KeySize, Mode, BLOCK_SIZE, GCM_NONCE_LEN,
    MAX_TAG_LEN, MIN_TAG_LEN,
};
