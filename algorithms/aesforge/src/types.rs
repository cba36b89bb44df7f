//! Shared types used across the aesforge library.

use thiserror::Error;

// =============================================================================
// SIZES
// =============================================================================

/// AES block size in bytes. Both modes operate on this unit.
pub const BLOCK_SIZE: usize = 16;

/// A single 16-byte AES block.
pub type Block = [u8; BLOCK_SIZE];

/// Shortest GCM tag accepted by `init` (32 bits).
pub const MIN_TAG_LEN: usize = 4;

/// Longest GCM tag (the full 128-bit hash output).
pub const MAX_TAG_LEN: usize = 16;

/// Canonical GCM nonce length; any other length takes the hashed-nonce path.
pub const GCM_NONCE_LEN: usize = 12;

// =============================================================================
// KEY SIZE
// =============================================================================

/// AES key-size variant. Only the round count differs between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 16-byte key, 10 rounds
    Aes128,
    /// 24-byte key, 12 rounds
    Aes192,
    /// 32-byte key, 14 rounds
    Aes256,
}

impl KeySize {
    /// Map a raw key length in bytes to its variant.
    #[must_use]
    pub const fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(Self::Aes128),
            24 => Some(Self::Aes192),
            32 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Key length in bytes.
    #[must_use]
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Number of AES rounds.
    #[must_use]
    pub const fn rounds(self) -> usize {
        match self {
            Self::Aes128 => 10,
            Self::Aes192 => 12,
            Self::Aes256 => 14,
        }
    }
}

// =============================================================================
// DIRECTION / MODE / PATH
// =============================================================================

/// Cipher direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Plaintext in, ciphertext out
    Encrypt,
    /// Ciphertext in, plaintext out
    Decrypt,
}

impl Direction {
    /// `true` maps to `Encrypt`, matching the binding layer's boolean flag.
    #[must_use]
    pub const fn from_encrypting(encrypting: bool) -> Self {
        if encrypting {
            Self::Encrypt
        } else {
            Self::Decrypt
        }
    }
}

/// Block-cipher mode served by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Cipher-block chaining
    Cbc,
    /// Galois/counter mode (AEAD)
    Gcm,
}

/// Instruction-set code path backing an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CodePath {
    /// Pure Rust, no SIMD
    Portable,
    /// AES-NI + PCLMULQDQ, one block per instruction
    Narrow,
    /// VAES + VPCLMULQDQ on 512-bit registers, four blocks per instruction
    Wide,
}

impl CodePath {
    /// Human-readable backend name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Portable => "Portable",
            Self::Narrow => "AES-NI (Narrow)",
            Self::Wide => "VAES AVX-512 (Wide)",
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the cipher engines.
///
/// None of these are transient: the engine never retries, and a failed call
/// leaves committed session state untouched except where noted on the
/// operation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Key length is not 16, 24 or 32 bytes, or differs from the engine's key size.
    #[error("invalid key size: {0} bytes")]
    InvalidKeySize(usize),
    /// CBC IV is not one block long, or the GCM nonce is empty.
    #[error("invalid IV length: {0} bytes")]
    InvalidIvLength(usize),
    /// GCM tag length outside 4..=16 bytes (or not a whole number of bytes).
    #[error("invalid tag length: {0}")]
    InvalidTagLength(usize),
    /// Operation not permitted in the session's current phase.
    #[error("{operation} is not valid in state {state}")]
    InvalidStateTransition {
        /// Phase the session was in
        state: &'static str,
        /// Rejected operation
        operation: &'static str,
    },
    /// Destination buffer smaller than required.
    #[error("output buffer too short: need {needed} bytes, have {available}")]
    OutputLength {
        /// Bytes the call would write
        needed: usize,
        /// Bytes the caller provided
        available: usize,
    },
    /// Source buffer shorter than the declared block count.
    #[error("input buffer too short: need {needed} bytes, have {available}")]
    InputLength {
        /// Bytes the call would read
        needed: usize,
        /// Bytes the caller provided
        available: usize,
    },
    /// Tag mismatch (or truncated stream) on decrypt finalization.
    #[error("authentication failed: tag mismatch")]
    AuthenticationFailure,
    /// No engine variant exists for the requested key size.
    #[error("unsupported key size: {0} bytes")]
    UnsupportedKeySize(usize),
    /// GCM message exceeds 2^36 - 32 bytes of confidential data.
    #[error("GCM data limit exceeded")]
    DataLimitExceeded,
}

impl EngineError {
    /// Stable negative code used by the C ABI and JNI layers.
    ///
    /// `-1`, `-2` and `-3` are reserved by the FFI layer for null pointers,
    /// panics and mode mismatches.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidKeySize(_) => -10,
            Self::InvalidIvLength(_) => -11,
            Self::InvalidTagLength(_) => -12,
            Self::InvalidStateTransition { .. } => -13,
            Self::OutputLength { .. } => -14,
            Self::InputLength { .. } => -15,
            Self::AuthenticationFailure => -16,
            Self::UnsupportedKeySize(_) => -17,
            Self::DataLimitExceeded => -18,
        }
    }
}
