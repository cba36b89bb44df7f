//! Capability Detector
//!
//! Probes the host CPU once per process and caches an immutable record.
//! The probe is pure, and the cache is a `OnceLock`, so concurrent first
//! callers block on a single initialization and all observe the same record.

use std::sync::OnceLock;

use tracing::{debug, warn};

/// Environment variable restricting the probed record (`auto`, `portable`,
/// `narrow`, `wide`; case-insensitive).
pub const CPU_VARIANT_ENV: &str = "AESFORGE_CPU_VARIANT";

// =============================================================================
// CPU VARIANT
// =============================================================================

/// Upper bound on the code paths an engine may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpuVariant {
    /// Whatever the CPU supports
    Auto,
    /// Software only
    Portable,
    /// AES-NI at most
    Narrow,
    /// VAES/AVX-512 at most (same as `Auto` on current hardware)
    Wide,
}

impl CpuVariant {
    /// Parse a variant name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Some(Self::Auto),
            "portable" => Some(Self::Portable),
            "narrow" => Some(Self::Narrow),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }
}

// =============================================================================
// CAPABILITY RECORD
// =============================================================================

/// Immutable snapshot of the CPU features relevant to the engines.
///
/// Records only come from the probe, from [`CapabilityRecord::portable`], or
/// from [`CapabilityRecord::restricted_to`] applied to one of those. A record
/// can therefore never claim a feature the CPU lacks, which is what keeps the
/// hardware kernels sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::struct_excessive_bools)]
pub struct CapabilityRecord {
    aes: bool,
    clmul: bool,
    vaes: bool,
    vpclmulqdq: bool,
    avx512: bool,
    sha: bool,
    sha3: bool,
    neon: bool,
    little_endian: bool,
}

static RECORD: OnceLock<CapabilityRecord> = OnceLock::new();

impl CapabilityRecord {
    /// Cached process-wide record, probed on first call.
    ///
    /// Honours `AESFORGE_CPU_VARIANT`; an unrecognised value logs a warning
    /// and behaves like `auto`.
    pub fn probe() -> &'static Self {
        RECORD.get_or_init(|| {
            let variant = match std::env::var(CPU_VARIANT_ENV) {
                Ok(value) => CpuVariant::parse(&value).unwrap_or_else(|| {
                    warn!(value = %value, "unknown {CPU_VARIANT_ENV}, using auto");
                    CpuVariant::Auto
                }),
                Err(_) => CpuVariant::Auto,
            };
            let record = Self::detect().restricted_to(variant);
            debug!(?record, ?variant, "probed CPU capabilities");
            record
        })
    }

    /// Record with every acceleration flag cleared.
    #[must_use]
    pub const fn portable() -> Self {
        Self {
            aes: false,
            clmul: false,
            vaes: false,
            vpclmulqdq: false,
            avx512: false,
            sha: false,
            sha3: false,
            neon: false,
            little_endian: cfg!(target_endian = "little"),
        }
    }

    /// Query the CPU directly. Unsupported architectures report nothing.
    #[allow(clippy::missing_const_for_fn)]
    fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                aes: is_x86_feature_detected!("aes") && is_x86_feature_detected!("sse2"),
                clmul: is_x86_feature_detected!("pclmulqdq") && is_x86_feature_detected!("ssse3"),
                vaes: is_x86_feature_detected!("vaes"),
                vpclmulqdq: is_x86_feature_detected!("vpclmulqdq"),
                avx512: is_x86_feature_detected!("avx512f")
                    && is_x86_feature_detected!("avx512bw"),
                sha: is_x86_feature_detected!("sha"),
                sha3: false,
                neon: false,
                little_endian: cfg!(target_endian = "little"),
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            use std::arch::is_aarch64_feature_detected;
            Self {
                aes: is_aarch64_feature_detected!("aes"),
                clmul: is_aarch64_feature_detected!("pmull"),
                vaes: false,
                vpclmulqdq: false,
                avx512: false,
                sha: is_aarch64_feature_detected!("sha2"),
                sha3: is_aarch64_feature_detected!("sha3"),
                neon: is_aarch64_feature_detected!("neon"),
                little_endian: cfg!(target_endian = "little"),
            }
        }
        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            Self::portable()
        }
    }

    /// Lower this record to at most `variant`. Never adds a feature.
    #[must_use]
    pub const fn restricted_to(self, variant: CpuVariant) -> Self {
        let mut r = self;
        match variant {
            CpuVariant::Auto | CpuVariant::Wide => {}
            CpuVariant::Narrow => {
                r.vaes = false;
                r.vpclmulqdq = false;
                r.avx512 = false;
            }
            CpuVariant::Portable => {
                r.aes = false;
                r.clmul = false;
                r.vaes = false;
                r.vpclmulqdq = false;
                r.avx512 = false;
            }
        }
        r
    }

    // -------------------------------------------------------------------------
    // Raw flags
    // -------------------------------------------------------------------------

    /// Hardware AES rounds (AES-NI, or the ARMv8 crypto extension).
    #[must_use]
    pub const fn has_aes(&self) -> bool {
        self.aes
    }

    /// 64-bit carry-less multiply (PCLMULQDQ + SSSE3, or PMULL).
    #[must_use]
    pub const fn has_clmul(&self) -> bool {
        self.clmul
    }

    /// Vector AES on 512-bit registers.
    #[must_use]
    pub const fn has_vaes(&self) -> bool {
        self.vaes
    }

    /// Vector carry-less multiply.
    #[must_use]
    pub const fn has_vpclmulqdq(&self) -> bool {
        self.vpclmulqdq
    }

    /// AVX-512 Foundation + Byte/Word.
    #[must_use]
    pub const fn has_avx512(&self) -> bool {
        self.avx512
    }

    /// SHA-1/SHA-256 digest acceleration.
    #[must_use]
    pub const fn has_sha(&self) -> bool {
        self.sha
    }

    /// SHA-3 digest acceleration.
    #[must_use]
    pub const fn has_sha3(&self) -> bool {
        self.sha3
    }

    /// ARM Advanced SIMD.
    #[must_use]
    pub const fn has_neon(&self) -> bool {
        self.neon
    }

    /// Host byte order.
    #[must_use]
    pub const fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// Widest AES vector in bits: 512 (VAES), 128 (AES-NI) or 0.
    #[must_use]
    pub const fn vector_width(&self) -> u32 {
        if self.wide_cipher() {
            512
        } else if self.aes {
            128
        } else {
            0
        }
    }

    // -------------------------------------------------------------------------
    // Kernel requirements
    // -------------------------------------------------------------------------

    /// The AES-NI block kernel can run.
    #[must_use]
    pub const fn narrow_cipher(&self) -> bool {
        cfg!(target_arch = "x86_64") && self.aes
    }

    /// The PCLMULQDQ GHASH kernel can run.
    #[must_use]
    pub const fn narrow_hash(&self) -> bool {
        self.narrow_cipher() && self.clmul
    }

    /// The VAES block kernel can run.
    #[must_use]
    pub const fn wide_cipher(&self) -> bool {
        self.narrow_cipher() && self.vaes && self.avx512
    }

    /// The VPCLMULQDQ GHASH kernel can run.
    #[must_use]
    pub const fn wide_hash(&self) -> bool {
        self.wide_cipher() && self.narrow_hash() && self.vpclmulqdq
    }
}
