//! Engine Factory
//!
//! Builds a CBC or GCM session for a (mode, direction, key size) request on
//! the fastest code path the capability record allows. The factory keeps no
//! reference to what it creates.

use tracing::debug;

use super::capabilities::CapabilityRecord;
use super::dispatcher::{kernel_for, select_path, PORTABLE};
use crate::modes::{CbcCipher, GcmCipher};
use crate::types::{CodePath, Direction, EngineError, KeySize, Mode};

// =============================================================================
// ENGINE
// =============================================================================

/// A constructed cipher session.
#[derive(Debug)]
pub enum Engine {
    /// Chained-block mode session
    Cbc(CbcCipher),
    /// Authenticated counter-mode session
    Gcm(GcmCipher),
}

impl Engine {
    /// Mode served by this engine.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        match self {
            Self::Cbc(_) => Mode::Cbc,
            Self::Gcm(_) => Mode::Gcm,
        }
    }

    /// Code path backing this engine.
    #[must_use]
    pub const fn path(&self) -> CodePath {
        match self {
            Self::Cbc(c) => c.path(),
            Self::Gcm(g) => g.path(),
        }
    }

    /// Key size the engine was created for.
    #[must_use]
    pub const fn key_size(&self) -> KeySize {
        match self {
            Self::Cbc(c) => c.key_size(),
            Self::Gcm(g) => g.key_size(),
        }
    }

    /// The CBC session, if this is one.
    pub fn as_cbc_mut(&mut self) -> Option<&mut CbcCipher> {
        match self {
            Self::Cbc(c) => Some(c),
            Self::Gcm(_) => None,
        }
    }

    /// The GCM session, if this is one.
    pub fn as_gcm_mut(&mut self) -> Option<&mut GcmCipher> {
        match self {
            Self::Gcm(g) => Some(g),
            Self::Cbc(_) => None,
        }
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Session factory over a fixed capability record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineFactory {
    caps: CapabilityRecord,
}

impl Default for EngineFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineFactory {
    /// Factory over the process-wide probed record.
    #[must_use]
    pub fn new() -> Self {
        Self {
            caps: *CapabilityRecord::probe(),
        }
    }

    /// Factory over an explicit record, e.g. `CapabilityRecord::portable()`
    /// to force the software path.
    #[must_use]
    pub const fn with_capabilities(caps: CapabilityRecord) -> Self {
        Self { caps }
    }

    /// Record this factory selects against.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilityRecord {
        &self.caps
    }

    /// Code path a request would get.
    #[must_use]
    pub const fn select_path(&self, mode: Mode, direction: Direction) -> CodePath {
        select_path(&self.caps, mode, direction)
    }

    /// Construct an engine, or `None` when `key_size_bytes` is not 16, 24 or 32.
    #[must_use]
    pub fn create(
        &self,
        mode: Mode,
        direction: Direction,
        key_size_bytes: usize,
    ) -> Option<Engine> {
        let Some(key_size) = KeySize::from_len(key_size_bytes) else {
            debug!(?mode, ?direction, key_size_bytes, "no engine for key size");
            return None;
        };
        let path = self.select_path(mode, direction);
        let kernel = kernel_for(path, &self.caps).unwrap_or(&PORTABLE);
        debug!(
            ?mode,
            ?direction,
            key_bits = key_size_bytes * 8,
            path = kernel.path.name(),
            "engine selected"
        );

        Some(match mode {
            Mode::Cbc => Engine::Cbc(CbcCipher::new(key_size, direction, kernel)),
            Mode::Gcm => Engine::Gcm(GcmCipher::new(key_size, direction, kernel)),
        })
    }

    /// [`EngineFactory::create`] with the absent case mapped to `UnsupportedKeySize`.
    ///
    /// # Errors
    /// `UnsupportedKeySize` when `key_size_bytes` is not 16, 24 or 32.
    pub fn try_create(
        &self,
        mode: Mode,
        direction: Direction,
        key_size_bytes: usize,
    ) -> Result<Engine, EngineError> {
        self.create(mode, direction, key_size_bytes)
            .ok_or(EngineError::UnsupportedKeySize(key_size_bytes))
    }

    /// New CBC session. Shorthand for `create(Mode::Cbc, ..)`.
    ///
    /// # Errors
    /// `UnsupportedKeySize` when `key_size_bytes` is not 16, 24 or 32.
    pub fn cbc(
        &self,
        direction: Direction,
        key_size_bytes: usize,
    ) -> Result<CbcCipher, EngineError> {
        match self.try_create(Mode::Cbc, direction, key_size_bytes)? {
            Engine::Cbc(c) => Ok(c),
            Engine::Gcm(_) => Err(EngineError::UnsupportedKeySize(key_size_bytes)),
        }
    }

    /// New GCM session. Shorthand for `create(Mode::Gcm, ..)`.
    ///
    /// # Errors
    /// `UnsupportedKeySize` when `key_size_bytes` is not 16, 24 or 32.
    pub fn gcm(
        &self,
        direction: Direction,
        key_size_bytes: usize,
    ) -> Result<GcmCipher, EngineError> {
        match self.try_create(Mode::Gcm, direction, key_size_bytes)? {
            Engine::Gcm(g) => Ok(g),
            Engine::Cbc(_) => Err(EngineError::UnsupportedKeySize(key_size_bytes)),
        }
    }
}

// =============================================================================
// CONVENIENCE
// =============================================================================

/// Construct an engine on the probed record.
#[must_use]
pub fn create(mode: Mode, direction: Direction, key_size_bytes: usize) -> Option<Engine> {
    EngineFactory::new().create(mode, direction, key_size_bytes)
}

/// Name of the code path the probed record selects for a request.
#[must_use]
pub fn active_backend(mode: Mode, direction: Direction) -> &'static str {
    EngineFactory::new().select_path(mode, direction).name()
}
