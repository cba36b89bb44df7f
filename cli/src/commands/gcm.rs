//! Seal / Open Commands
//!
//! Streaming AES-GCM over files. A sealed file is `nonce || ciphertext || tag`
//! with a fresh random 12-byte nonce per file.

use super::{for_each_file, strip_suffix, tag_bytes, with_suffix, CHUNK};
use aesforge::{Direction, EngineFactory, BLOCK_SIZE, GCM_NONCE_LEN, MAX_TAG_LEN};
use anyhow::{Context, Result};
use rand::prelude::*;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const EXT: &str = "gcm";

// =============================================================================
// SEAL
// =============================================================================

fn seal_file(
    factory: &EngineFactory,
    path: &Path,
    key: &[u8],
    aad: &[u8],
    tag_len: usize,
) -> Result<PathBuf> {
    let mut nonce = [0u8; GCM_NONCE_LEN];
    rand::rng().fill(&mut nonce[..]);

    let mut gcm = factory.gcm(Direction::Encrypt, key.len())?;
    gcm.init(Direction::Encrypt, key, &nonce, aad, tag_len)?;
    debug!(file = %path.display(), path = gcm.path().name(), "sealing");

    let mut reader =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let out_path = with_suffix(path, EXT);
    let mut writer = BufWriter::new(
        File::create(&out_path)
            .with_context(|| format!("Failed to create: {}", out_path.display()))?,
    );
    writer.write_all(&nonce)?;

    let mut buffer = vec![0u8; CHUNK];
    let mut out = vec![0u8; CHUNK + BLOCK_SIZE + MAX_TAG_LEN];
    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        let written = gcm.process_bytes(&buffer[..n], &mut out)?;
        writer.write_all(&out[..written])?;
    }
    let written = gcm.do_final(&mut out)?;
    writer.write_all(&out[..written])?;
    writer.flush()?;

    Ok(out_path)
}

/// Seal every file to `FILE.gcm`.
pub fn seal_files(files: &[PathBuf], key: &[u8], aad: &[u8], tag_bits: u32) -> Result<()> {
    let tag_len = tag_bytes(tag_bits)?;
    let factory = EngineFactory::new();
    for_each_file(files, "seal", |path| seal_file(&factory, path, key, aad, tag_len))
}

// =============================================================================
// OPEN
// =============================================================================

/// Decrypt into `FILE.part`, renamed into place only once the tag verified.
/// The streaming engine releases plaintext before verification, so the
/// partial file is removed on any failure.
fn open_file(
    factory: &EngineFactory,
    path: &Path,
    key: &[u8],
    aad: &[u8],
    tag_len: usize,
) -> Result<PathBuf> {
    let mut reader =
        File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;
    let mut nonce = [0u8; GCM_NONCE_LEN];
    reader.read_exact(&mut nonce).context("File too short for a nonce header")?;

    let mut gcm = factory.gcm(Direction::Decrypt, key.len())?;
    gcm.init(Direction::Decrypt, key, &nonce, aad, tag_len)?;
    debug!(file = %path.display(), path = gcm.path().name(), "opening");

    let out_path = strip_suffix(path, EXT);
    let part_path = with_suffix(&out_path, "part");

    let result = (|| -> Result<()> {
        let mut writer = BufWriter::new(
            File::create(&part_path)
                .with_context(|| format!("Failed to create: {}", part_path.display()))?,
        );
        let mut buffer = vec![0u8; CHUNK];
        let mut out = vec![0u8; CHUNK + BLOCK_SIZE + MAX_TAG_LEN];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            let written = gcm.process_bytes(&buffer[..n], &mut out)?;
            writer.write_all(&out[..written])?;
        }
        let written = gcm.do_final(&mut out).context("Authentication failed")?;
        writer.write_all(&out[..written])?;
        writer.flush()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&part_path);
        return Err(e);
    }
    std::fs::rename(&part_path, &out_path)
        .with_context(|| format!("Failed to move into place: {}", out_path.display()))?;
    Ok(out_path)
}

/// Verify and decrypt every `FILE.gcm` to `FILE`.
pub fn open_files(files: &[PathBuf], key: &[u8], aad: &[u8], tag_bits: u32) -> Result<()> {
    let tag_len = tag_bytes(tag_bits)?;
    let factory = EngineFactory::new();
    for_each_file(files, "open", |path| open_file(&factory, path, key, aad, tag_len))
}
