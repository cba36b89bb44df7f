//! AES-NI Kernel Module
//!
//! Narrow path: one block per `AESENC` and `PCLMULQDQ`, with 4-way
//! interleaving wherever blocks are independent.

// =============================================================================
// MODULES
// =============================================================================

pub(crate) mod block;
pub(crate) mod ghash;

// =============================================================================
// EXPORTS
// =============================================================================

pub use block::{cbc_decrypt, cbc_encrypt, ctr_apply, decrypt_blocks, encrypt_blocks};
pub use ghash::ghash;
