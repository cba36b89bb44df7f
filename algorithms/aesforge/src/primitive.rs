//! Block Primitive Adapter
//!
//! One expanded key bound to one kernel table. Sessions own an `AesPrimitive`
//! exclusively; nothing here is shared between sessions.

use crate::kernels::{HashKey, Kernel, KeySchedule};
use crate::types::{Block, CodePath, EngineError, KeySize, BLOCK_SIZE};

/// Expanded AES key plus the kernel that runs it.
#[derive(Clone)]
pub struct AesPrimitive {
    schedule: KeySchedule,
    kernel: &'static Kernel,
}

impl AesPrimitive {
    /// Expand `key` for use with `kernel`.
    ///
    /// # Errors
    /// `InvalidKeySize` unless `key` is 16, 24 or 32 bytes.
    pub fn new(key: &[u8], kernel: &'static Kernel) -> Result<Self, EngineError> {
        Ok(Self {
            schedule: KeySchedule::new(key)?,
            kernel,
        })
    }

    /// Key-size variant of the expanded key.
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.schedule.size()
    }

    /// Code path of the bound kernel.
    #[must_use]
    pub const fn path(&self) -> CodePath {
        self.kernel.path
    }

    /// Encrypt a single block.
    #[must_use]
    pub fn encrypt_block(&self, block: &Block) -> Block {
        let mut out = [0u8; BLOCK_SIZE];
        (self.kernel.encrypt_blocks)(&self.schedule, block, &mut out);
        out
    }

    /// Decrypt a single block.
    #[must_use]
    pub fn decrypt_block(&self, block: &Block) -> Block {
        let mut out = [0u8; BLOCK_SIZE];
        (self.kernel.decrypt_blocks)(&self.schedule, block, &mut out);
        out
    }

    /// ECB-encrypt whole blocks from `input` into `output`.
    pub fn encrypt_blocks(&self, input: &[u8], output: &mut [u8]) {
        (self.kernel.encrypt_blocks)(&self.schedule, input, output);
    }

    /// ECB-decrypt whole blocks from `input` into `output`.
    pub fn decrypt_blocks(&self, input: &[u8], output: &mut [u8]) {
        (self.kernel.decrypt_blocks)(&self.schedule, input, output);
    }

    /// Derive the GHASH subkey `H = E(K, 0^128)`.
    #[must_use]
    pub fn hash_key(&self) -> HashKey {
        HashKey::new(self.encrypt_block(&[0u8; BLOCK_SIZE]))
    }

    pub(crate) fn cbc_encrypt(&self, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        (self.kernel.cbc_encrypt)(&self.schedule, chain, input, output);
    }

    pub(crate) fn cbc_decrypt(&self, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        (self.kernel.cbc_decrypt)(&self.schedule, chain, input, output);
    }

    pub(crate) fn ctr_apply(&self, counter: &mut Block, input: &[u8], output: &mut [u8]) {
        (self.kernel.ctr_apply)(&self.schedule, counter, input, output);
    }

    pub(crate) fn ghash(&self, hk: &HashKey, acc: &mut Block, data: &[u8]) {
        (self.kernel.ghash)(hk, acc, data);
    }
}
