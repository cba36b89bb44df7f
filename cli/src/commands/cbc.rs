//! CBC Command
//!
//! Whole-file AES-CBC. Inputs must be a multiple of 16 bytes.

use super::{for_each_file, strip_suffix, with_suffix};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const EXT: &str = "cbc";

fn cbc_file(path: &Path, key: &[u8], iv: &[u8], decrypt: bool) -> Result<PathBuf> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read: {}", path.display()))?;
    let (out, out_path) = if decrypt {
        (aesforge::cbc_decrypt(key, iv, &data)?, strip_suffix(path, EXT))
    } else {
        (aesforge::cbc_encrypt(key, iv, &data)?, with_suffix(path, EXT))
    };
    std::fs::write(&out_path, out)
        .with_context(|| format!("Failed to write: {}", out_path.display()))?;
    Ok(out_path)
}

/// Encrypt (or decrypt) every file with the same key and IV.
pub fn cbc_files(files: &[PathBuf], key: &[u8], iv_hex: &str, decrypt: bool) -> Result<()> {
    let iv = hex::decode(iv_hex.trim()).context("IV is not valid hex")?;
    let verb = if decrypt { "decrypt" } else { "encrypt" };
    for_each_file(files, verb, |path| cbc_file(path, key, &iv, decrypt))
}
