//! C-API Bindings
//!
//! Exposes the engines to C/C++ via FFI with pointer safety and panic boundaries.
//!
//! Every fallible function returns a non-negative value on success (a byte
//! count, or `0`) and a negative code on failure:
//!
//! | Code        | Meaning                                  |
//! |-------------|------------------------------------------|
//! | `-1`        | Null pointer                             |
//! | `-2`        | Panic                                    |
//! | `-3`        | Operation does not match the engine mode |
//! | `-10..=-18` | [`EngineError::code`]                    |

#![allow(unsafe_code)]

use crate::engine::{CapabilityRecord, Engine, EngineFactory};
use crate::modes::{CbcCipher, GcmCipher};
use crate::types::{CodePath, Direction, EngineError, Mode, BLOCK_SIZE};

use std::ffi::{c_char, CStr};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::slice;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Null pointer argument.
pub const AESFORGE_ERR_NULL: i32 = -1;
/// Panic caught at the boundary.
pub const AESFORGE_ERR_PANIC: i32 = -2;
/// CBC call on a GCM engine or vice versa.
pub const AESFORGE_ERR_MODE: i32 = -3;

/// `mode` value selecting CBC.
pub const AESFORGE_MODE_CBC: u32 = 0;
/// `mode` value selecting GCM.
pub const AESFORGE_MODE_GCM: u32 = 1;

// =============================================================================
// HELPERS
// =============================================================================

/// Opaque engine handle for C.
pub struct AesforgeEngine(Engine);

type FfiResult = Result<usize, i32>;

impl From<EngineError> for i32 {
    fn from(e: EngineError) -> Self {
        e.code()
    }
}

/// Run `f` behind a panic boundary and flatten the result to a C return value.
fn guard(f: impl FnOnce() -> FfiResult) -> isize {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(n)) => isize::try_from(n).unwrap_or(isize::MAX),
        Ok(Err(code)) => code as isize,
        Err(_) => AESFORGE_ERR_PANIC as isize,
    }
}

fn guard_i32(f: impl FnOnce() -> FfiResult) -> i32 {
    i32::try_from(guard(f)).unwrap_or(i32::MAX)
}

/// Borrow an input buffer. A null pointer is accepted only for `len == 0`.
unsafe fn input<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], i32> {
    if ptr.is_null() {
        return if len == 0 { Ok(&[]) } else { Err(AESFORGE_ERR_NULL) };
    }
    Ok(slice::from_raw_parts(ptr, len))
}

/// Borrow an output buffer. A null pointer is accepted only for `len == 0`.
unsafe fn output<'a>(ptr: *mut u8, len: usize) -> Result<&'a mut [u8], i32> {
    if ptr.is_null() {
        return if len == 0 { Ok(&mut []) } else { Err(AESFORGE_ERR_NULL) };
    }
    Ok(slice::from_raw_parts_mut(ptr, len))
}

unsafe fn cbc<'a>(handle: *mut AesforgeEngine) -> Result<&'a mut CbcCipher, i32> {
    let engine = handle.as_mut().ok_or(AESFORGE_ERR_NULL)?;
    engine.0.as_cbc_mut().ok_or(AESFORGE_ERR_MODE)
}

unsafe fn gcm<'a>(handle: *mut AesforgeEngine) -> Result<&'a mut GcmCipher, i32> {
    let engine = handle.as_mut().ok_or(AESFORGE_ERR_NULL)?;
    engine.0.as_gcm_mut().ok_or(AESFORGE_ERR_MODE)
}

const fn mode_from(mode: u32) -> Option<Mode> {
    match mode {
        AESFORGE_MODE_CBC => Some(Mode::Cbc),
        AESFORGE_MODE_GCM => Some(Mode::Gcm),
        _ => None,
    }
}

/// Tag length in bits to bytes; partial bytes are rejected.
fn tag_bytes(bits: u32) -> Result<usize, i32> {
    if bits % 8 == 0 {
        Ok(bits as usize / 8)
    } else {
        Err(EngineError::InvalidTagLength(bits as usize).code())
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Create an engine for `key_size` bytes (16, 24 or 32).
///
/// Returns NULL for an unsupported key size or mode. Caller must free with
/// `aesforge_engine_free`.
#[no_mangle]
pub extern "C" fn aesforge_engine_new(
    key_size: usize,
    encrypt: bool,
    mode: u32,
) -> *mut AesforgeEngine {
    let Some(mode) = mode_from(mode) else {
        return std::ptr::null_mut();
    };
    let built = catch_unwind(|| {
        EngineFactory::new().create(mode, Direction::from_encrypting(encrypt), key_size)
    });
    match built {
        Ok(Some(engine)) => Box::into_raw(Box::new(AesforgeEngine(engine))),
        _ => std::ptr::null_mut(),
    }
}

/// Free an engine, wiping its key material.
///
/// # Safety
/// - `handle` must come from `aesforge_engine_new` and not have been freed, or be null
#[no_mangle]
pub unsafe extern "C" fn aesforge_engine_free(handle: *mut AesforgeEngine) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Block size in bytes (always 16).
#[no_mangle]
pub extern "C" fn aesforge_engine_block_size() -> usize {
    BLOCK_SIZE
}

// =============================================================================
// CBC
// =============================================================================

/// Key a CBC engine and load its IV.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `key` / `iv` must be valid for `key_len` / `iv_len` bytes
///
/// # Returns
/// `0` on success, a negative code otherwise.
#[no_mangle]
pub unsafe extern "C" fn aesforge_cbc_init(
    handle: *mut AesforgeEngine,
    key: *const u8,
    key_len: usize,
    iv: *const u8,
    iv_len: usize,
) -> i32 {
    guard_i32(|| {
        let cbc = cbc(handle)?;
        cbc.init(input(key, key_len)?, input(iv, iv_len)?)?;
        Ok(0)
    })
}

/// Transform `block_count` whole blocks.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `in_ptr` must be valid for `in_len` bytes, `out_ptr` for `out_len` writable bytes
/// - the buffers must not overlap
///
/// # Returns
/// Bytes written, or a negative code.
#[no_mangle]
pub unsafe extern "C" fn aesforge_cbc_process_blocks(
    handle: *mut AesforgeEngine,
    in_ptr: *const u8,
    in_len: usize,
    block_count: usize,
    out_ptr: *mut u8,
    out_len: usize,
) -> isize {
    guard(|| {
        let cbc = cbc(handle)?;
        Ok(cbc.process_blocks(input(in_ptr, in_len)?, block_count, output(out_ptr, out_len)?)?)
    })
}

/// Rewind the chain to the IV.
///
/// # Safety
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn aesforge_cbc_reset(handle: *mut AesforgeEngine) -> i32 {
    guard_i32(|| {
        cbc(handle)?.reset();
        Ok(0)
    })
}

// =============================================================================
// GCM
// =============================================================================

/// Key a GCM engine. `tag_bits` must be a multiple of 8 in `32..=128`.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - each pointer must be valid for its length (null allowed for zero length)
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn aesforge_gcm_init(
    handle: *mut AesforgeEngine,
    encrypt: bool,
    key: *const u8,
    key_len: usize,
    nonce: *const u8,
    nonce_len: usize,
    aad: *const u8,
    aad_len: usize,
    tag_bits: u32,
) -> i32 {
    guard_i32(|| {
        let gcm = gcm(handle)?;
        gcm.init(
            Direction::from_encrypting(encrypt),
            input(key, key_len)?,
            input(nonce, nonce_len)?,
            input(aad, aad_len)?,
            tag_bytes(tag_bits)?,
        )?;
        Ok(0)
    })
}

/// Fold one AAD byte.
///
/// # Safety
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_process_aad_byte(
    handle: *mut AesforgeEngine,
    byte: u8,
) -> i32 {
    guard_i32(|| {
        gcm(handle)?.process_aad_byte(byte)?;
        Ok(0)
    })
}

/// Fold AAD bytes.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `aad` must be valid for `len` bytes
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_process_aad_bytes(
    handle: *mut AesforgeEngine,
    aad: *const u8,
    len: usize,
) -> i32 {
    guard_i32(|| {
        gcm(handle)?.process_aad_bytes(input(aad, len)?)?;
        Ok(0)
    })
}

/// Stream one data byte.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `out_ptr` must be valid for `out_len` writable bytes
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_process_byte(
    handle: *mut AesforgeEngine,
    byte: u8,
    out_ptr: *mut u8,
    out_len: usize,
) -> isize {
    guard(|| Ok(gcm(handle)?.process_byte(byte, output(out_ptr, out_len)?)?))
}

/// Stream data bytes.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `in_ptr` must be valid for `in_len` bytes, `out_ptr` for `out_len` writable bytes
/// - the buffers must not overlap
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_process_bytes(
    handle: *mut AesforgeEngine,
    in_ptr: *const u8,
    in_len: usize,
    out_ptr: *mut u8,
    out_len: usize,
) -> isize {
    guard(|| {
        let gcm = gcm(handle)?;
        Ok(gcm.process_bytes(input(in_ptr, in_len)?, output(out_ptr, out_len)?)?)
    })
}

/// Finish the message (tag appended on encrypt, verified on decrypt).
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `out_ptr` must be valid for `out_len` writable bytes
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_do_final(
    handle: *mut AesforgeEngine,
    out_ptr: *mut u8,
    out_len: usize,
) -> isize {
    guard(|| Ok(gcm(handle)?.do_final(output(out_ptr, out_len)?)?))
}

/// Bytes the next `process_bytes(len)` call will write.
///
/// # Safety
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_update_output_size(
    handle: *mut AesforgeEngine,
    len: usize,
) -> isize {
    guard(|| Ok(gcm(handle)?.update_output_size(len)))
}

/// Bytes `process_bytes(len)` plus `do_final` will write.
///
/// # Safety
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_output_size(
    handle: *mut AesforgeEngine,
    len: usize,
) -> isize {
    guard(|| Ok(gcm(handle)?.output_size(len)))
}

/// Copy the tag of a finalized encrypt session.
///
/// # Safety
/// - `handle` must be a live engine handle
/// - `out_ptr` must be valid for `out_len` writable bytes
///
/// # Returns
/// Tag length in bytes, or a negative code.
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_get_mac(
    handle: *mut AesforgeEngine,
    out_ptr: *mut u8,
    out_len: usize,
) -> isize {
    guard(|| {
        let gcm = gcm(handle)?;
        let mac = gcm.mac()?;
        let out = output(out_ptr, out_len)?;
        if out.len() < mac.len() {
            return Err(EngineError::OutputLength {
                needed: mac.len(),
                available: out.len(),
            }
            .code());
        }
        out[..mac.len()].copy_from_slice(mac);
        Ok(mac.len())
    })
}

/// Return to the AAD phase (`keep_key`) or wipe the session.
///
/// # Safety
/// - `handle` must be a live engine handle
#[no_mangle]
pub unsafe extern "C" fn aesforge_gcm_reset(handle: *mut AesforgeEngine, keep_key: bool) -> i32 {
    guard_i32(|| {
        gcm(handle)?.reset(keep_key);
        Ok(0)
    })
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// `1` if the CPU has hardware AES, else `0`.
#[no_mangle]
pub extern "C" fn aesforge_has_aes() -> i32 {
    i32::from(CapabilityRecord::probe().has_aes())
}

/// `1` if the CPU has VAES on 512-bit registers, else `0`.
#[no_mangle]
pub extern "C" fn aesforge_has_vaes() -> i32 {
    i32::from(CapabilityRecord::probe().wide_cipher())
}

/// `1` if the CPU has a carry-less multiply, else `0`.
#[no_mangle]
pub extern "C" fn aesforge_has_clmul() -> i32 {
    i32::from(CapabilityRecord::probe().has_clmul())
}

/// `1` if the CPU accelerates SHA digests, else `0`.
#[no_mangle]
pub extern "C" fn aesforge_has_sha() -> i32 {
    i32::from(CapabilityRecord::probe().has_sha())
}

/// Name of the code path selected for `mode` and direction.
///
/// # Returns
/// A pointer to a static, null-terminated C string. Must NOT be freed by the
/// caller. Unknown modes yield `"Unknown"`.
#[no_mangle]
pub extern "C" fn aesforge_backend_name(mode: u32, encrypt: bool) -> *const c_char {
    let direction = Direction::from_encrypting(encrypt);
    let name: &'static CStr = match mode_from(mode) {
        Some(mode) => match EngineFactory::new().select_path(mode, direction) {
            CodePath::Portable => c"Portable",
            CodePath::Narrow => c"AES-NI (Narrow)",
            CodePath::Wide => c"VAES AVX-512 (Wide)",
        },
        None => c"Unknown",
    };
    name.as_ptr()
}
