//! Chained-Block Mode Engine
//!
//! Classic CBC over whole blocks, no padding and no internal buffering.
//! Encryption is serial; decryption has no inter-block dependency beyond the
//! XOR mask, which is what the wide kernel exploits.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kernels::Kernel;
use crate::primitive::AesPrimitive;
use crate::types::{Block, CodePath, Direction, EngineError, KeySize, BLOCK_SIZE};

/// CBC session bound to one key size and direction.
///
/// `init` (re)keys the session; every `process_blocks` call continues the
/// chain from where the previous call stopped. The IV and chaining value are
/// wiped on drop, the key schedule wipes itself.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct CbcCipher {
    #[zeroize(skip)]
    key_size: KeySize,
    #[zeroize(skip)]
    direction: Direction,
    #[zeroize(skip)]
    kernel: &'static Kernel,
    #[zeroize(skip)]
    primitive: Option<AesPrimitive>,
    iv: Block,
    chain: Block,
}

impl CbcCipher {
    /// New uninitialized session.
    #[must_use]
    pub const fn new(key_size: KeySize, direction: Direction, kernel: &'static Kernel) -> Self {
        Self {
            key_size,
            direction,
            kernel,
            primitive: None,
            iv: [0u8; BLOCK_SIZE],
            chain: [0u8; BLOCK_SIZE],
        }
    }

    /// Key the session and load the IV. Calling again re-keys (with any
    /// supported key size) and restarts the chain.
    ///
    /// # Errors
    /// - `InvalidKeySize` unless `key` is 16, 24 or 32 bytes.
    /// - `InvalidIvLength` unless `iv` is exactly one block.
    pub fn init(&mut self, key: &[u8], iv: &[u8]) -> Result<(), EngineError> {
        let key_size =
            KeySize::from_len(key.len()).ok_or(EngineError::InvalidKeySize(key.len()))?;
        if iv.len() != BLOCK_SIZE {
            return Err(EngineError::InvalidIvLength(iv.len()));
        }
        self.primitive = Some(AesPrimitive::new(key, self.kernel)?);
        self.key_size = key_size;
        self.iv.copy_from_slice(iv);
        self.chain = self.iv;
        Ok(())
    }

    /// Transform `block_count` blocks from `input` into `output`.
    ///
    /// Returns the number of bytes written (`block_count * 16`). Batching is
    /// invisible: any split of the same data across calls yields the same bytes.
    ///
    /// # Errors
    /// - `InvalidStateTransition` before `init`.
    /// - `InputLength` / `OutputLength` if either buffer is shorter than
    ///   `block_count * 16` bytes. Nothing is consumed on error.
    pub fn process_blocks(
        &mut self,
        input: &[u8],
        block_count: usize,
        output: &mut [u8],
    ) -> Result<usize, EngineError> {
        let primitive = self
            .primitive
            .as_ref()
            .ok_or(EngineError::InvalidStateTransition {
                state: "Uninitialized",
                operation: "process_blocks",
            })?;
        let needed = block_count
            .checked_mul(BLOCK_SIZE)
            .ok_or(EngineError::InputLength {
                needed: usize::MAX,
                available: input.len(),
            })?;
        if input.len() < needed {
            return Err(EngineError::InputLength {
                needed,
                available: input.len(),
            });
        }
        if output.len() < needed {
            return Err(EngineError::OutputLength {
                needed,
                available: output.len(),
            });
        }

        let (src, dst) = (&input[..needed], &mut output[..needed]);
        match self.direction {
            Direction::Encrypt => primitive.cbc_encrypt(&mut self.chain, src, dst),
            Direction::Decrypt => primitive.cbc_decrypt(&mut self.chain, src, dst),
        }
        Ok(needed)
    }

    /// Rewind the chaining value to the IV from the last `init`. The key
    /// schedule is kept.
    pub fn reset(&mut self) {
        self.chain = self.iv;
    }

    /// Always 16.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Key size of the current key (or the creation-time size before `init`).
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Cipher direction.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Code path of the bound kernel.
    #[must_use]
    pub const fn path(&self) -> CodePath {
        self.kernel.path
    }

    /// Whether `init` has succeeded at least once.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.primitive.is_some()
    }
}

impl core::fmt::Debug for CbcCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CbcCipher")
            .field("key_size", &self.key_size)
            .field("direction", &self.direction)
            .field("path", &self.kernel.path)
            .field("initialized", &self.primitive.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dispatcher::PORTABLE;

    #[test]
    fn test_process_before_init_fails() {
        let mut c = CbcCipher::new(KeySize::Aes128, Direction::Encrypt, &PORTABLE);
        let mut out = [0u8; 16];
        assert!(matches!(
            c.process_blocks(&[0u8; 16], 1, &mut out),
            Err(EngineError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_init_rekeys_across_key_sizes() {
        let mut c = CbcCipher::new(KeySize::Aes256, Direction::Decrypt, &PORTABLE);
        assert_eq!(
            c.init(&[0u8; 20], &[0u8; 16]),
            Err(EngineError::InvalidKeySize(20))
        );
        assert!(c.init(&[0u8; 16], &[0u8; 16]).is_ok());
        assert_eq!(c.key_size(), KeySize::Aes128);
        assert_eq!(
            c.init(&[0u8; 32], &[0u8; 12]),
            Err(EngineError::InvalidIvLength(12))
        );
        assert!(c.init(&[0u8; 32], &[0u8; 16]).is_ok());
        assert_eq!(c.key_size(), KeySize::Aes256);
    }

    #[test]
    fn test_short_buffers_rejected() {
        let mut c = CbcCipher::new(KeySize::Aes128, Direction::Encrypt, &PORTABLE);
        c.init(&[1u8; 16], &[2u8; 16]).unwrap();
        let mut out = [0u8; 32];
        assert_eq!(
            c.process_blocks(&[0u8; 16], 2, &mut out),
            Err(EngineError::InputLength {
                needed: 32,
                available: 16
            })
        );
        assert_eq!(
            c.process_blocks(&[0u8; 48], 3, &mut out),
            Err(EngineError::OutputLength {
                needed: 48,
                available: 32
            })
        );
        assert_eq!(c.process_blocks(&[], 0, &mut out), Ok(0));
    }

    #[test]
    fn test_reset_restarts_chain() {
        let mut c = CbcCipher::new(KeySize::Aes128, Direction::Encrypt, &PORTABLE);
        c.init(&[9u8; 16], &[3u8; 16]).unwrap();
        let mut first = [0u8; 16];
        let mut second = [0u8; 16];
        c.process_blocks(&[5u8; 16], 1, &mut first).unwrap();
        c.reset();
        c.process_blocks(&[5u8; 16], 1, &mut second).unwrap();
        assert_eq!(first, second);
    }
}
