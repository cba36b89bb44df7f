//! AVX-512 Kernel Module
//!
//! Wide path: VAES + VPCLMULQDQ on 512-bit registers, four AES blocks per
//! instruction.

mod block;
mod ghash;

// Re-export public API
pub use block::{cbc_decrypt, cbc_encrypt, ctr_apply, decrypt_blocks, encrypt_blocks};
pub use ghash::ghash;
