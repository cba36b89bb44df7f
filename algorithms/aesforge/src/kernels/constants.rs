//! Kernel Constants
//!
//! AES key-schedule and field constants shared by every code path.
//!
//! ```text
//! AES field      : GF(2^8)   mod x^8 + x^4 + x^3 + x + 1         (0x1b)
//! GHASH field    : GF(2^128) mod x^128 + x^7 + x^2 + x + 1       (0xe1 || 0^120, reflected)
//! ```

// =============================================================================
// ROUNDS
// =============================================================================

/// Round keys for the largest variant (AES-256: 14 rounds + whitening key).
pub const MAX_ROUND_KEYS: usize = 15;

/// Round constants for the key expansion. AES-128 consumes all ten.
pub const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// `MixColumns` reduction polynomial (low byte of x^8 + x^4 + x^3 + x + 1).
pub const GF_POLY: u8 = 0x1b;

/// GHASH reduction constant in the bit-reflected big-endian representation.
pub const GHASH_R: u128 = 0xe1 << 120;

// =============================================================================
// STRUCTURAL CONSTANTS
// =============================================================================

/// Blocks per 512-bit register on the wide path.
pub const WIDE_LANES: usize = 4;

/// Independent blocks in flight on the narrow path (4-way ILP).
pub const NARROW_INTERLEAVE: usize = 4;

/// Hash-key powers kept per session (H^1..H^4), one per wide lane.
pub const HASH_POWERS: usize = WIDE_LANES;

/// Maximum confidential bytes per GCM message: 2^32 - 2 counter blocks.
pub const GCM_MAX_DATA_LEN: u64 = (1 << 36) - 32;
