//! Authenticated Counter-Mode Engine (AES-GCM)
//!
//! Streaming state machine:
//!
//! ```text
//! Uninitialized --init--> Aad --process_bytes--> Data --do_final--> Finalized
//!                          ^                                          |
//!                          +------------------reset(true)-------------+
//! ```
//!
//! GHASH always covers the ciphertext. In the decrypt direction the last
//! `tag_len` bytes of the stream are the tag, so they are held back in the
//! carry buffer until `do_final`.
//!
//! Decrypted plaintext is released block by block before the tag has been
//! checked. A caller that sees `AuthenticationFailure` from `do_final` must
//! discard everything this session produced. Use [`crate::gcm_open`] when the
//! message fits in memory and no unverified plaintext may escape.

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::kernels::constants::GCM_MAX_DATA_LEN;
use crate::kernels::{inc32, HashKey, Kernel};
use crate::primitive::AesPrimitive;
use crate::types::{
    Block, CodePath, Direction, EngineError, KeySize, BLOCK_SIZE, GCM_NONCE_LEN, MAX_TAG_LEN,
    MIN_TAG_LEN,
};

/// Carry buffer: one partial block plus a held-back tag.
const CARRY_LEN: usize = BLOCK_SIZE + MAX_TAG_LEN;

// =============================================================================
// PHASE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Aad,
    Data,
    Finalized,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "Uninitialized",
            Self::Aad => "AadPhase",
            Self::Data => "DataPhase",
            Self::Finalized => "Finalized",
        }
    }
}

// =============================================================================
// KEYED STATE
// =============================================================================

/// Key schedule and hash subkey; both wipe themselves on drop.
#[derive(Clone)]
struct GcmKeys {
    primitive: AesPrimitive,
    hash_key: HashKey,
}

impl GcmKeys {
    fn ghash(&self, acc: &mut Block, data: &[u8]) {
        self.primitive.ghash(&self.hash_key, acc, data);
    }

    /// Pre-counter block J0.
    fn derive_j0(&self, nonce: &[u8]) -> Block {
        let mut j0 = [0u8; BLOCK_SIZE];
        if nonce.len() == GCM_NONCE_LEN {
            j0[..GCM_NONCE_LEN].copy_from_slice(nonce);
            j0[BLOCK_SIZE - 1] = 1;
        } else {
            // J0 = GHASH(nonce || 0-pad || 0^64 || [len(nonce)]_64)
            let padded = nonce.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
            let mut blocks = vec![0u8; padded + BLOCK_SIZE];
            blocks[..nonce.len()].copy_from_slice(nonce);
            blocks[padded + 8..].copy_from_slice(&(nonce.len() as u64 * 8).to_be_bytes());
            self.ghash(&mut j0, &blocks);
        }
        j0
    }
}

/// Per-message streaming state.
#[derive(Zeroize)]
struct Stream {
    j0: Block,
    counter: Block,
    acc: Block,
    aad_buf: Block,
    aad_buf_len: usize,
    buf: [u8; CARRY_LEN],
    buf_len: usize,
    aad_len: u64,
    data_len: u64,
}

impl Stream {
    const fn new() -> Self {
        Self {
            j0: [0u8; BLOCK_SIZE],
            counter: [0u8; BLOCK_SIZE],
            acc: [0u8; BLOCK_SIZE],
            aad_buf: [0u8; BLOCK_SIZE],
            aad_buf_len: 0,
            buf: [0u8; CARRY_LEN],
            buf_len: 0,
            aad_len: 0,
            data_len: 0,
        }
    }

    /// Fold AAD, carrying a partial block across calls.
    fn absorb_aad(&mut self, keys: &GcmKeys, mut data: &[u8]) {
        self.aad_len += data.len() as u64;

        if self.aad_buf_len > 0 {
            let take = (BLOCK_SIZE - self.aad_buf_len).min(data.len());
            self.aad_buf[self.aad_buf_len..self.aad_buf_len + take].copy_from_slice(&data[..take]);
            self.aad_buf_len += take;
            data = &data[take..];
            if self.aad_buf_len == BLOCK_SIZE {
                keys.ghash(&mut self.acc, &self.aad_buf);
                self.aad_buf_len = 0;
            }
        }

        let full = data.len() / BLOCK_SIZE * BLOCK_SIZE;
        keys.ghash(&mut self.acc, &data[..full]);

        let rest = &data[full..];
        if !rest.is_empty() {
            self.aad_buf[..rest.len()].copy_from_slice(rest);
            self.aad_buf_len = rest.len();
        }
    }

    /// Zero-pad and fold the trailing partial AAD block.
    fn close_aad(&mut self, keys: &GcmKeys) {
        if self.aad_buf_len > 0 {
            self.aad_buf[self.aad_buf_len..].fill(0);
            keys.ghash(&mut self.acc, &self.aad_buf);
            self.aad_buf_len = 0;
        }
    }

    /// Encrypt or decrypt whole blocks, hashing the ciphertext side.
    fn crypt(&mut self, keys: &GcmKeys, direction: Direction, src: &[u8], dst: &mut [u8]) {
        let dst = &mut dst[..src.len()];
        match direction {
            Direction::Encrypt => {
                keys.primitive.ctr_apply(&mut self.counter, src, dst);
                keys.ghash(&mut self.acc, dst);
            }
            Direction::Decrypt => {
                keys.ghash(&mut self.acc, src);
                keys.primitive.ctr_apply(&mut self.counter, src, dst);
            }
        }
        self.data_len += src.len() as u64;
    }

    /// Handle a trailing partial block (`src.len() < 16`) and return the full
    /// 16-byte GHASH output.
    fn finish(
        &mut self,
        keys: &GcmKeys,
        direction: Direction,
        src: &[u8],
        dst: &mut [u8],
    ) -> Block {
        let n = src.len();
        if n > 0 {
            let mut block = [0u8; BLOCK_SIZE];
            block[..n].copy_from_slice(src);
            let mut out = [0u8; BLOCK_SIZE];
            keys.primitive.ctr_apply(&mut self.counter, &block, &mut out);

            let mut hashed = if direction == Direction::Encrypt { out } else { block };
            hashed[n..].fill(0);
            keys.ghash(&mut self.acc, &hashed);

            dst[..n].copy_from_slice(&out[..n]);
            block.zeroize();
            out.zeroize();
            self.data_len += n as u64;
        }

        let mut lengths = [0u8; BLOCK_SIZE];
        lengths[..8].copy_from_slice(&(self.aad_len * 8).to_be_bytes());
        lengths[8..].copy_from_slice(&(self.data_len * 8).to_be_bytes());
        keys.ghash(&mut self.acc, &lengths);

        let mask = keys.primitive.encrypt_block(&self.j0);
        let mut tag = [0u8; BLOCK_SIZE];
        for (t, (a, m)) in tag.iter_mut().zip(self.acc.iter().zip(mask.iter())) {
            *t = a ^ m;
        }
        tag
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// AES-GCM session bound to one key size.
///
/// Sessions are single-owner; the binding layer serializes access. Key
/// schedule, hash subkey, buffers and the tag are wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GcmCipher {
    #[zeroize(skip)]
    key_size: KeySize,
    #[zeroize(skip)]
    kernel: &'static Kernel,
    #[zeroize(skip)]
    direction: Direction,
    #[zeroize(skip)]
    phase: Phase,
    #[zeroize(skip)]
    keys: Option<GcmKeys>,
    nonce: Vec<u8>,
    initial_aad: Vec<u8>,
    stream: Stream,
    tag_len: usize,
    mac: [u8; MAX_TAG_LEN],
}

impl GcmCipher {
    /// New uninitialized session.
    #[must_use]
    pub const fn new(key_size: KeySize, direction: Direction, kernel: &'static Kernel) -> Self {
        Self {
            key_size,
            kernel,
            direction,
            phase: Phase::Uninitialized,
            keys: None,
            nonce: Vec::new(),
            initial_aad: Vec::new(),
            stream: Stream::new(),
            tag_len: MAX_TAG_LEN,
            mac: [0u8; MAX_TAG_LEN],
        }
    }

    /// Key the session, derive H and J0, fold `aad` and enter the AAD phase.
    ///
    /// Any nonce length other than 12 takes the slower hashed-nonce path.
    ///
    /// # Errors
    /// - `InvalidKeySize` unless `key` is 16, 24 or 32 bytes. Any supported
    ///   size re-keys the session, whatever size it was created for.
    /// - `InvalidIvLength` for an empty nonce.
    /// - `InvalidTagLength` unless `4 <= tag_len <= 16`.
    pub fn init(
        &mut self,
        direction: Direction,
        key: &[u8],
        nonce: &[u8],
        aad: &[u8],
        tag_len: usize,
    ) -> Result<(), EngineError> {
        let key_size =
            KeySize::from_len(key.len()).ok_or(EngineError::InvalidKeySize(key.len()))?;
        if nonce.is_empty() {
            return Err(EngineError::InvalidIvLength(0));
        }
        if !(MIN_TAG_LEN..=MAX_TAG_LEN).contains(&tag_len) {
            return Err(EngineError::InvalidTagLength(tag_len));
        }

        let primitive = AesPrimitive::new(key, self.kernel)?;
        let hash_key = primitive.hash_key();
        self.keys = Some(GcmKeys {
            primitive,
            hash_key,
        });
        self.key_size = key_size;
        self.direction = direction;
        self.tag_len = tag_len;
        self.nonce.zeroize();
        self.nonce.extend_from_slice(nonce);
        self.initial_aad.zeroize();
        self.initial_aad.extend_from_slice(aad);
        self.restart();
        Ok(())
    }

    /// Clear per-message state, re-derive the counter and re-fold the AAD from `init`.
    fn restart(&mut self) {
        self.stream.zeroize();
        self.mac.zeroize();
        let Some(keys) = self.keys.as_ref() else {
            self.phase = Phase::Uninitialized;
            return;
        };
        self.stream.j0 = keys.derive_j0(&self.nonce);
        self.stream.counter = self.stream.j0;
        inc32(&mut self.stream.counter);
        self.stream.absorb_aad(keys, &self.initial_aad);
        self.phase = Phase::Aad;
    }

    fn invalid(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidStateTransition {
            state: self.phase.name(),
            operation,
        }
    }

    // -------------------------------------------------------------------------
    // AAD
    // -------------------------------------------------------------------------

    /// Fold one byte of associated data.
    ///
    /// # Errors
    /// `InvalidStateTransition` outside the AAD phase.
    pub fn process_aad_byte(&mut self, byte: u8) -> Result<(), EngineError> {
        self.process_aad_bytes(&[byte])
    }

    /// Fold associated data.
    ///
    /// # Errors
    /// `InvalidStateTransition` outside the AAD phase.
    pub fn process_aad_bytes(&mut self, aad: &[u8]) -> Result<(), EngineError> {
        match (self.phase, self.keys.as_ref()) {
            (Phase::Aad, Some(keys)) => {
                self.stream.absorb_aad(keys, aad);
                Ok(())
            }
            _ => Err(self.invalid("process_aad_bytes")),
        }
    }

    // -------------------------------------------------------------------------
    // DATA
    // -------------------------------------------------------------------------

    /// Stream one byte of data. Returns the bytes written (0 or 16).
    ///
    /// # Errors
    /// See [`GcmCipher::process_bytes`].
    pub fn process_byte(&mut self, byte: u8, output: &mut [u8]) -> Result<usize, EngineError> {
        self.process_bytes(&[byte], output)
    }

    /// Stream data through the cipher.
    ///
    /// Emits whole blocks only, so the return value may be smaller than
    /// `input.len()`; the rest is carried to the next call. The first
    /// non-empty call closes the AAD phase. Empty input is a no-op.
    ///
    /// # Errors
    /// - `InvalidStateTransition` before `init` or after `do_final`.
    /// - `OutputLength` if `output` is shorter than `update_output_size(input.len())`.
    /// - `DataLimitExceeded` past 2^36 - 32 bytes of confidential data.
    ///
    /// On error nothing is consumed and no counter advances.
    pub fn process_bytes(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, EngineError> {
        let keys = match (self.phase, self.keys.as_ref()) {
            (Phase::Aad | Phase::Data, Some(keys)) => keys,
            _ => return Err(self.invalid("process_bytes")),
        };
        if input.is_empty() {
            return Ok(0);
        }

        let total = self.update_output_size(input.len());
        if output.len() < total {
            return Err(EngineError::OutputLength {
                needed: total,
                available: output.len(),
            });
        }
        let pending = (self.stream.buf_len + input.len()).saturating_sub(self.held_back());
        if self.stream.data_len + pending as u64 > GCM_MAX_DATA_LEN {
            return Err(EngineError::DataLimitExceeded);
        }

        if self.phase == Phase::Aad {
            self.stream.close_aad(keys);
            self.phase = Phase::Data;
        }

        let direction = self.direction;
        let stream = &mut self.stream;
        let mut input = input;
        let mut done = 0;

        // Blocks that start in the carry buffer
        while done < total && stream.buf_len > 0 {
            if stream.buf_len < BLOCK_SIZE {
                let take = (BLOCK_SIZE - stream.buf_len).min(input.len());
                stream.buf[stream.buf_len..stream.buf_len + take].copy_from_slice(&input[..take]);
                stream.buf_len += take;
                input = &input[take..];
            }
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(&stream.buf[..BLOCK_SIZE]);
            stream.crypt(keys, direction, &block, &mut output[done..done + BLOCK_SIZE]);
            block.zeroize();
            stream.buf.copy_within(BLOCK_SIZE..stream.buf_len, 0);
            stream.buf_len -= BLOCK_SIZE;
            done += BLOCK_SIZE;
        }

        // Bulk straight from the caller's buffer
        if done < total {
            let n = total - done;
            stream.crypt(keys, direction, &input[..n], &mut output[done..total]);
            input = &input[n..];
        }

        // Carry the rest
        stream.buf[stream.buf_len..stream.buf_len + input.len()].copy_from_slice(input);
        stream.buf_len += input.len();

        Ok(total)
    }

    /// Finish the message.
    ///
    /// Encrypt: writes the last partial ciphertext block followed by the tag.
    /// Decrypt: writes the last partial plaintext block, then checks the
    /// held-back tag in constant time.
    ///
    /// The session is `Finalized` afterwards, also when authentication fails.
    ///
    /// # Errors
    /// - `InvalidStateTransition` before `init` or when already finalized.
    /// - `OutputLength` if `output` is shorter than `output_size(0)`.
    /// - `AuthenticationFailure` on tag mismatch, or when the stream was
    ///   shorter than the tag.
    pub fn do_final(&mut self, output: &mut [u8]) -> Result<usize, EngineError> {
        let keys = match (self.phase, self.keys.as_ref()) {
            (Phase::Aad | Phase::Data, Some(keys)) => keys,
            _ => return Err(self.invalid("do_final")),
        };
        let buffered = self.stream.buf_len;
        let tag_len = self.tag_len;

        match self.direction {
            Direction::Encrypt => {
                let needed = buffered + tag_len;
                if output.len() < needed {
                    return Err(EngineError::OutputLength {
                        needed,
                        available: output.len(),
                    });
                }
                self.stream.close_aad(keys);
                let mut partial = [0u8; BLOCK_SIZE];
                partial[..buffered].copy_from_slice(&self.stream.buf[..buffered]);
                let tag = self.stream.finish(
                    keys,
                    Direction::Encrypt,
                    &partial[..buffered],
                    &mut output[..buffered],
                );
                partial.zeroize();
                output[buffered..needed].copy_from_slice(&tag[..tag_len]);
                self.mac[..tag_len].copy_from_slice(&tag[..tag_len]);
                self.phase = Phase::Finalized;
                Ok(needed)
            }
            Direction::Decrypt => {
                if buffered < tag_len {
                    self.phase = Phase::Finalized;
                    return Err(EngineError::AuthenticationFailure);
                }
                let n = buffered - tag_len;
                if output.len() < n {
                    return Err(EngineError::OutputLength {
                        needed: n,
                        available: output.len(),
                    });
                }
                self.stream.close_aad(keys);
                let mut partial = [0u8; BLOCK_SIZE];
                partial[..n].copy_from_slice(&self.stream.buf[..n]);
                let mut received = [0u8; MAX_TAG_LEN];
                received[..tag_len].copy_from_slice(&self.stream.buf[n..buffered]);

                let tag = self
                    .stream
                    .finish(keys, Direction::Decrypt, &partial[..n], &mut output[..n]);
                self.mac[..tag_len].copy_from_slice(&tag[..tag_len]);
                self.phase = Phase::Finalized;

                if bool::from(tag[..tag_len].ct_eq(&received[..tag_len])) {
                    Ok(n)
                } else {
                    Err(EngineError::AuthenticationFailure)
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // SIZING
    // -------------------------------------------------------------------------

    /// Bytes the carry buffer must keep back from output.
    const fn held_back(&self) -> usize {
        match self.direction {
            Direction::Encrypt => 0,
            Direction::Decrypt => self.tag_len,
        }
    }

    /// Exact number of bytes `process_bytes(len bytes)` will write.
    #[must_use]
    pub const fn update_output_size(&self, len: usize) -> usize {
        let avail = (self.stream.buf_len + len).saturating_sub(self.held_back());
        avail / BLOCK_SIZE * BLOCK_SIZE
    }

    /// Bytes `process_bytes(len)` followed by `do_final` will write in total.
    #[must_use]
    pub const fn output_size(&self, len: usize) -> usize {
        let avail = self.stream.buf_len + len;
        match self.direction {
            Direction::Encrypt => avail + self.tag_len,
            Direction::Decrypt => avail.saturating_sub(self.tag_len),
        }
    }

    // -------------------------------------------------------------------------
    // TAG / LIFECYCLE
    // -------------------------------------------------------------------------

    /// Tag produced by an encrypt-direction `do_final`.
    ///
    /// # Errors
    /// `InvalidStateTransition` in any other state.
    pub fn mac(&self) -> Result<&[u8], EngineError> {
        if self.phase == Phase::Finalized && self.direction == Direction::Encrypt {
            Ok(&self.mac[..self.tag_len])
        } else {
            Err(self.invalid("mac"))
        }
    }

    /// Return to the AAD phase for another message.
    ///
    /// With `keep_key` the key, nonce and initial AAD from `init` are reused.
    /// Without it the whole session is wiped and `init` is required again.
    pub fn reset(&mut self, keep_key: bool) {
        if keep_key {
            self.restart();
        } else {
            self.keys = None;
            self.zeroize();
            self.phase = Phase::Uninitialized;
        }
    }

    /// Key size of the current key (or the creation-time size before `init`).
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        self.key_size
    }

    /// Direction from the last `init` (or creation).
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Requested tag length in bytes.
    #[must_use]
    pub const fn tag_len(&self) -> usize {
        self.tag_len
    }

    /// Code path of the bound kernel.
    #[must_use]
    pub const fn path(&self) -> CodePath {
        self.kernel.path
    }

    /// Whether the session holds a key.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.keys.is_some()
    }

    /// Always 16.
    #[must_use]
    pub const fn block_size(&self) -> usize {
        BLOCK_SIZE
    }
}

impl core::fmt::Debug for GcmCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GcmCipher")
            .field("key_size", &self.key_size)
            .field("direction", &self.direction)
            .field("path", &self.kernel.path)
            .field("phase", &self.phase)
            .field("tag_len", &self.tag_len)
            .finish_non_exhaustive()
    }
}
