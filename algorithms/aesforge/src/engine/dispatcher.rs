//! Hardware Dispatcher
//!
//! Maps a capability record and a (mode, direction) request to a code path,
//! and a code path to a kernel table. The hardware tables hold safe wrappers
//! around `unsafe` `#[target_feature]` kernels; they are only handed out when
//! the record confirms the features each wrapper needs.

use super::capabilities::CapabilityRecord;
use crate::kernels::{self, Kernel};
use crate::types::{CodePath, Direction, Mode};

// =============================================================================
// PATH SELECTION
// =============================================================================

/// Whether `caps` can run `mode` on `path`.
const fn supports(caps: &CapabilityRecord, mode: Mode, path: CodePath) -> bool {
    match (path, mode) {
        (CodePath::Portable, _) => true,
        (CodePath::Narrow, Mode::Cbc) => caps.narrow_cipher(),
        (CodePath::Narrow, Mode::Gcm) => caps.narrow_hash(),
        (CodePath::Wide, Mode::Cbc) => caps.wide_cipher(),
        (CodePath::Wide, Mode::Gcm) => caps.wide_hash(),
    }
}

/// Pick the fastest code path for a request. Deterministic for a given record.
///
/// CBC encryption never takes the wide path: each block depends on the
/// previous ciphertext, so there is nothing to vectorize.
#[must_use]
pub const fn select_path(caps: &CapabilityRecord, mode: Mode, direction: Direction) -> CodePath {
    let wide_allowed = !matches!((mode, direction), (Mode::Cbc, Direction::Encrypt));
    if wide_allowed && supports(caps, mode, CodePath::Wide) {
        CodePath::Wide
    } else if supports(caps, mode, CodePath::Narrow) {
        CodePath::Narrow
    } else {
        CodePath::Portable
    }
}

/// Kernel table for `path`, or `None` if `caps` cannot run it.
///
/// A hardware path whose cipher kernel is available but whose GHASH kernel is
/// not (CBC-only capability sets) gets a table with the next GHASH down.
#[must_use]
pub fn kernel_for(path: CodePath, caps: &CapabilityRecord) -> Option<&'static Kernel> {
    match path {
        CodePath::Portable => Some(&PORTABLE),
        #[cfg(target_arch = "x86_64")]
        CodePath::Narrow if caps.narrow_hash() => Some(&x86::NARROW),
        #[cfg(target_arch = "x86_64")]
        CodePath::Narrow if caps.narrow_cipher() => Some(&x86::NARROW_CIPHER),
        #[cfg(target_arch = "x86_64")]
        CodePath::Wide if caps.wide_hash() => Some(&x86::WIDE),
        #[cfg(target_arch = "x86_64")]
        CodePath::Wide if caps.wide_cipher() && caps.narrow_hash() => {
            Some(&x86::WIDE_NARROW_HASH)
        }
        #[cfg(target_arch = "x86_64")]
        CodePath::Wide if caps.wide_cipher() => Some(&x86::WIDE_CIPHER),
        _ => {
            let _ = caps;
            None
        }
    }
}

// =============================================================================
// TABLES
// =============================================================================

/// Pure Rust kernel. Always available.
pub static PORTABLE: Kernel = Kernel {
    path: CodePath::Portable,
    encrypt_blocks: kernels::portable::encrypt_blocks,
    decrypt_blocks: kernels::portable::decrypt_blocks,
    cbc_encrypt: kernels::portable::cbc_encrypt,
    cbc_decrypt: kernels::portable::cbc_decrypt,
    ctr_apply: kernels::portable::ctr_apply,
    ghash: kernels::portable::ghash,
};

#[cfg(target_arch = "x86_64")]
mod x86 {
    use crate::kernels::{self, HashKey, Kernel, KeySchedule};
    use crate::types::{Block, CodePath};

    const NARROW_TABLE: Kernel = Kernel {
        path: CodePath::Narrow,
        encrypt_blocks: narrow_encrypt_blocks,
        decrypt_blocks: narrow_decrypt_blocks,
        cbc_encrypt: narrow_cbc_encrypt,
        cbc_decrypt: narrow_cbc_decrypt,
        ctr_apply: narrow_ctr_apply,
        ghash: narrow_ghash,
    };

    const WIDE_TABLE: Kernel = Kernel {
        path: CodePath::Wide,
        encrypt_blocks: wide_encrypt_blocks,
        decrypt_blocks: wide_decrypt_blocks,
        cbc_encrypt: wide_cbc_encrypt,
        cbc_decrypt: wide_cbc_decrypt,
        ctr_apply: wide_ctr_apply,
        ghash: wide_ghash,
    };

    pub static NARROW: Kernel = NARROW_TABLE;

    /// AES-NI without PCLMULQDQ.
    pub static NARROW_CIPHER: Kernel = Kernel {
        ghash: kernels::portable::ghash,
        ..NARROW_TABLE
    };

    pub static WIDE: Kernel = WIDE_TABLE;

    /// VAES without VPCLMULQDQ.
    pub static WIDE_NARROW_HASH: Kernel = Kernel {
        ghash: narrow_ghash,
        ..WIDE_TABLE
    };

    /// VAES without any carry-less multiply.
    pub static WIDE_CIPHER: Kernel = Kernel {
        ghash: kernels::portable::ghash,
        ..WIDE_TABLE
    };

    // =========================================================================
    // WRAPPERS
    // =========================================================================

    // SAFETY (narrow cipher wrappers): only reachable through `NARROW` or
    // `NARROW_CIPHER`, which `kernel_for` returns only when the record reports
    // AES-NI + SSE2.

    #[allow(unsafe_code)]
    fn narrow_encrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::aesni::encrypt_blocks(ks, input, output) }
    }

    #[allow(unsafe_code)]
    fn narrow_decrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::aesni::decrypt_blocks(ks, input, output) }
    }

    #[allow(unsafe_code)]
    fn narrow_cbc_encrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::aesni::cbc_encrypt(ks, chain, input, output) }
    }

    #[allow(unsafe_code)]
    fn narrow_cbc_decrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::aesni::cbc_decrypt(ks, chain, input, output) }
    }

    #[allow(unsafe_code)]
    fn narrow_ctr_apply(ks: &KeySchedule, counter: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::aesni::ctr_apply(ks, counter, input, output) }
    }

    #[allow(unsafe_code)]
    fn narrow_ghash(hk: &HashKey, acc: &mut Block, data: &[u8]) {
        // SAFETY: only installed in `NARROW` and `WIDE_NARROW_HASH`, which
        // require PCLMULQDQ + SSSE3.
        unsafe { kernels::aesni::ghash(hk, acc, data) }
    }

    // SAFETY (wide cipher wrappers): only reachable through the `WIDE*` tables,
    // which `kernel_for` returns only when the record reports VAES +
    // AVX-512F/BW on top of AES-NI.

    #[allow(unsafe_code)]
    fn wide_encrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::avx512::encrypt_blocks(ks, input, output) }
    }

    #[allow(unsafe_code)]
    fn wide_decrypt_blocks(ks: &KeySchedule, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::avx512::decrypt_blocks(ks, input, output) }
    }

    #[allow(unsafe_code)]
    fn wide_cbc_encrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::avx512::cbc_encrypt(ks, chain, input, output) }
    }

    #[allow(unsafe_code)]
    fn wide_cbc_decrypt(ks: &KeySchedule, chain: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::avx512::cbc_decrypt(ks, chain, input, output) }
    }

    #[allow(unsafe_code)]
    fn wide_ctr_apply(ks: &KeySchedule, counter: &mut Block, input: &[u8], output: &mut [u8]) {
        // SAFETY: see above.
        unsafe { kernels::avx512::ctr_apply(ks, counter, input, output) }
    }

    #[allow(unsafe_code)]
    fn wide_ghash(hk: &HashKey, acc: &mut Block, data: &[u8]) {
        // SAFETY: only installed in `WIDE`, which requires VPCLMULQDQ and the
        // narrow GHASH features used for the tail.
        unsafe { kernels::avx512::ghash(hk, acc, data) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::capabilities::CpuVariant;

    #[test]
    fn test_portable_record_selects_portable() {
        let caps = CapabilityRecord::portable();
        for mode in [Mode::Cbc, Mode::Gcm] {
            for dir in [Direction::Encrypt, Direction::Decrypt] {
                assert_eq!(select_path(&caps, mode, dir), CodePath::Portable);
            }
        }
        assert!(kernel_for(CodePath::Narrow, &caps).is_none());
        assert!(kernel_for(CodePath::Wide, &caps).is_none());
    }

    #[test]
    fn test_cbc_encrypt_never_wide() {
        let caps = *CapabilityRecord::probe();
        assert_ne!(
            select_path(&caps, Mode::Cbc, Direction::Encrypt),
            CodePath::Wide
        );
    }

    #[test]
    fn test_selected_path_has_kernel() {
        let caps = *CapabilityRecord::probe();
        for variant in [CpuVariant::Auto, CpuVariant::Narrow, CpuVariant::Portable] {
            let caps = caps.restricted_to(variant);
            for mode in [Mode::Cbc, Mode::Gcm] {
                for dir in [Direction::Encrypt, Direction::Decrypt] {
                    let path = select_path(&caps, mode, dir);
                    let kernel = kernel_for(path, &caps);
                    assert_eq!(kernel.map(|k| k.path), Some(path));
                }
            }
        }
    }
}
