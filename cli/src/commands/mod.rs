//! CLI Commands
//!
//! All aesforge CLI commands organized as separate modules.

mod cbc;
mod features;
mod gcm;

pub use cbc::cbc_files;
pub use features::print_features;
pub use gcm::{open_files, seal_files};

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use zeroize::Zeroizing;

/// Read buffer per file.
pub const CHUNK: usize = 128 * 1024;

// =============================================================================
// KEY ARGUMENT
// =============================================================================

#[derive(Args)]
pub struct KeyArg {
    /// AES key as hex (32, 48 or 64 hex digits)
    #[arg(short, long, env = "AESFORGE_KEY", hide_env_values = true)]
    key: String,
}

impl KeyArg {
    /// Decode the key. The buffer is wiped when dropped.
    pub fn decode(&self) -> Result<Zeroizing<Vec<u8>>> {
        let key = Zeroizing::new(hex::decode(self.key.trim()).context("Key is not valid hex")?);
        if !matches!(key.len(), 16 | 24 | 32) {
            anyhow::bail!("Key must be 16, 24 or 32 bytes, got {}", key.len());
        }
        Ok(key)
    }
}

/// Tag length in bits to bytes.
pub fn tag_bytes(bits: u32) -> Result<usize> {
    if bits % 8 != 0 || !(32..=128).contains(&bits) {
        anyhow::bail!("Tag length must be a multiple of 8 in 32..=128 bits, got {bits}");
    }
    Ok(bits as usize / 8)
}

/// `path` with `.ext` appended.
pub fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// `path` without a trailing `.ext`, or with `.out` appended if it has none.
pub fn strip_suffix(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some_and(|e| e == ext) {
        path.with_extension("")
    } else {
        with_suffix(path, "out")
    }
}

// =============================================================================
// PARALLEL DRIVER
// =============================================================================

/// Run `op` over every file (Rayon parallelizes when beneficial) and report
/// `input -> output` lines in the original order.
pub fn for_each_file<F>(files: &[PathBuf], verb: &str, op: F) -> Result<()>
where
    F: Fn(&Path) -> Result<PathBuf> + Sync,
{
    let results = Mutex::new(Vec::with_capacity(files.len()));
    let errors = Mutex::new(Vec::new());

    files.par_iter().for_each(|file_path| match op(file_path) {
        Ok(out) => results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((file_path.clone(), out)),
        Err(e) => errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((file_path.clone(), e)),
    });

    let mut results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
    results.sort_by_key(|(path, _)| files.iter().position(|p| p == path).unwrap_or(usize::MAX));

    for (file_path, out) in results {
        println!("{} -> {}", file_path.display(), out.display());
    }

    let errors = errors.into_inner().unwrap_or_else(PoisonError::into_inner);
    for (file_path, error) in &errors {
        eprintln!("Error: {}: {:#}", file_path.display(), error);
    }

    if !errors.is_empty() {
        anyhow::bail!("Failed to {verb} {} file(s)", errors.len());
    }

    Ok(())
}
