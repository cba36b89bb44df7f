//! aesforge Java JNI Bindings
//!
//! Native implementation for the `org.aesforge.AESNativeCBC`,
//! `org.aesforge.AESNativeGCM` and `org.aesforge.NativeFeatures` classes.
//!
//! Engines live behind a `jlong` handle from `makeInstance` and must be
//! released with `dispose`. Engine errors surface as Java exceptions:
//!
//! | Error                                   | Exception                                    |
//! |-----------------------------------------|----------------------------------------------|
//! | `OutputLength`                          | `org.aesforge.OutputLengthException`         |
//! | `InputLength`                           | `org.aesforge.DataLengthException`           |
//! | `AuthenticationFailure`                 | `org.aesforge.InvalidCipherTextException`    |
//! | `InvalidStateTransition`, data limit    | `java.lang.IllegalStateException`            |
//! | key / IV / tag / mode parameter errors  | `java.lang.IllegalArgumentException`         |
//! | offset / length outside the array       | `java.lang.IndexOutOfBoundsException`        |
//! | disposed (zero) handle                  | `java.lang.NullPointerException`             |

use aesforge::{
    CapabilityRecord, CbcCipher, Direction, EngineError, EngineFactory, GcmCipher, Mode,
    BLOCK_SIZE,
};
use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{
    jboolean, jbyte, jbyteArray, jint, jlong, jobject, jstring, JNI_FALSE, JNI_TRUE,
};
use jni::JNIEnv;
use std::ops::Range;
use zeroize::Zeroizing;

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Engine(EngineError),
    Bounds(&'static str),
    UnknownMode(jint),
    NullHandle,
    Jni,
}

impl From<EngineError> for Failure {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl From<jni::errors::Error> for Failure {
    fn from(_: jni::errors::Error) -> Self {
        Self::Jni
    }
}

const fn exception_class(e: &EngineError) -> &'static str {
    match e {
        EngineError::OutputLength { .. } => "org/aesforge/OutputLengthException",
        EngineError::InputLength { .. } => "org/aesforge/DataLengthException",
        EngineError::AuthenticationFailure => "org/aesforge/InvalidCipherTextException",
        EngineError::InvalidStateTransition { .. } | EngineError::DataLimitExceeded => {
            "java/lang/IllegalStateException"
        }
        EngineError::InvalidKeySize(_)
        | EngineError::InvalidIvLength(_)
        | EngineError::InvalidTagLength(_)
        | EngineError::UnsupportedKeySize(_) => "java/lang/IllegalArgumentException",
    }
}

/// Java exception class and message for a failure.
fn exception_for(failure: &Failure) -> (&'static str, String) {
    match failure {
        Failure::Engine(e) => (exception_class(e), e.to_string()),
        Failure::Bounds(what) => ("java/lang/IndexOutOfBoundsException", (*what).to_owned()),
        Failure::UnknownMode(mode) => (
            "java/lang/IllegalArgumentException",
            format!("unknown mode {mode} (0 = CBC, 1 = GCM)"),
        ),
        Failure::NullHandle => ("java/lang/NullPointerException", "engine disposed".to_owned()),
        Failure::Jni => ("java/lang/IllegalStateException", "JNI failure".to_owned()),
    }
}

/// Raise the matching Java exception unless one is already pending.
fn throw(env: &mut JNIEnv, failure: &Failure) {
    // A pending JNI exception already describes the problem
    if env.exception_check().unwrap_or(true) {
        return;
    }
    let (class, message) = exception_for(failure);
    let _ = env.throw_new(class, message);
}

/// Unwrap `result`, raising the matching Java exception on failure.
fn finish<T: Default>(env: &mut JNIEnv, result: Result<T, Failure>) -> T {
    result.unwrap_or_else(|failure| {
        throw(env, &failure);
        T::default()
    })
}

/// Like [`finish`] for object returns: `null` on failure.
fn finish_object(env: &mut JNIEnv, result: Result<jobject, Failure>) -> jobject {
    result.unwrap_or_else(|failure| {
        throw(env, &failure);
        std::ptr::null_mut()
    })
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// `[off, off + len)` checked against an array of `array_len` bytes.
fn region(off: jint, len: jint, array_len: usize) -> Result<Range<usize>, Failure> {
    let start = usize::try_from(off).map_err(|_| Failure::Bounds("negative offset"))?;
    let len = usize::try_from(len).map_err(|_| Failure::Bounds("negative length"))?;
    let end = start.checked_add(len).ok_or(Failure::Bounds("range overflow"))?;
    if end > array_len {
        return Err(Failure::Bounds("range outside array"));
    }
    Ok(start..end)
}

/// Bytes writable from `off` in an array of `array_len` bytes.
fn room_after(off: jint, array_len: usize) -> Result<usize, Failure> {
    let off = usize::try_from(off).map_err(|_| Failure::Bounds("negative output offset"))?;
    array_len
        .checked_sub(off)
        .ok_or(Failure::Bounds("output offset past array end"))
}

/// Tag length in bytes from the Java-side bit count.
fn tag_len_from_bits(bits: jint) -> Result<usize, Failure> {
    match usize::try_from(bits) {
        Ok(bits) if bits % 8 == 0 => Ok(bits / 8),
        Ok(bits) => Err(EngineError::InvalidTagLength(bits).into()),
        Err(_) => Err(EngineError::InvalidTagLength(0).into()),
    }
}

/// Java mode constant (0 = CBC, 1 = GCM).
const fn mode_from(mode: jint) -> Result<Mode, Failure> {
    match mode {
        0 => Ok(Mode::Cbc),
        1 => Ok(Mode::Gcm),
        other => Err(Failure::UnknownMode(other)),
    }
}

fn to_jint(n: usize) -> jint {
    jint::try_from(n).unwrap_or(jint::MAX)
}

fn non_negative(n: jint) -> usize {
    usize::try_from(n).unwrap_or(0)
}

// =============================================================================
// ARRAY ACCESS
// =============================================================================

/// # Safety
/// `array` must be null or a live local reference handed in by the JVM.
unsafe fn byte_array<'a>(array: jbyteArray) -> JByteArray<'a> {
    JByteArray::from_raw(array)
}

fn array_len(env: &JNIEnv, array: &JByteArray) -> Result<usize, Failure> {
    if array.is_null() {
        return Ok(0);
    }
    Ok(usize::try_from(env.get_array_length(array)?).unwrap_or(0))
}

/// Whole array, or empty for `null`.
fn read_array(env: &JNIEnv, array: jbyteArray) -> Result<Vec<u8>, Failure> {
    // SAFETY: `array` comes straight from the JNI call.
    let obj = unsafe { byte_array(array) };
    if obj.is_null() {
        return Ok(Vec::new());
    }
    Ok(env.convert_byte_array(&obj)?)
}

/// Copy only `[off, off + len)` out of a Java array.
fn read_region(
    env: &JNIEnv,
    array: jbyteArray,
    off: jint,
    len: jint,
) -> Result<Zeroizing<Vec<u8>>, Failure> {
    // SAFETY: `array` comes straight from the JNI call.
    let obj = unsafe { byte_array(array) };
    let range = region(off, len, array_len(env, &obj)?)?;
    let mut signed = Zeroizing::new(vec![0 as jbyte; range.len()]);
    if !signed.is_empty() {
        env.get_byte_array_region(&obj, off, &mut signed)?;
    }
    Ok(Zeroizing::new(signed.iter().map(|&b| b as u8).collect()))
}

/// Bytes writable in `array` from `off`.
fn room(env: &JNIEnv, array: jbyteArray, off: jint) -> Result<usize, Failure> {
    // SAFETY: `array` comes straight from the JNI call.
    let obj = unsafe { byte_array(array) };
    room_after(off, array_len(env, &obj)?)
}

fn write_region(env: &JNIEnv, array: jbyteArray, off: jint, data: &[u8]) -> Result<(), Failure> {
    if data.is_empty() {
        return Ok(());
    }
    // SAFETY: `array` comes straight from the JNI call.
    let obj = unsafe { byte_array(array) };
    let signed: Zeroizing<Vec<jbyte>> = Zeroizing::new(data.iter().map(|&b| b as jbyte).collect());
    env.set_byte_array_region(&obj, off, &signed)?;
    Ok(())
}

/// # Safety
/// `handle` must be 0 or a live pointer from the matching `makeInstance`.
unsafe fn handle<'a, T>(handle: jlong) -> Result<&'a mut T, Failure> {
    (handle as *mut T).as_mut().ok_or(Failure::NullHandle)
}

// =============================================================================
// CBC
// =============================================================================

/// Create a CBC engine. Returns 0 (with an exception pending) for a bad key size.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_makeInstance(
    mut env: JNIEnv,
    _class: JClass,
    key_len: jint,
    encryption: jboolean,
) -> jlong {
    let direction = Direction::from_encrypting(encryption == JNI_TRUE);
    let result = EngineFactory::new()
        .cbc(direction, non_negative(key_len))
        .map(|cbc| Box::into_raw(Box::new(cbc)) as jlong)
        .map_err(Failure::from);
    finish(&mut env, result)
}

/// Key the engine and load the IV. Any supported key size re-keys.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `CbcCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_init(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    key: jbyteArray,
    iv: jbyteArray,
) {
    let result = (|| -> Result<_, Failure> {
        let cbc = handle::<CbcCipher>(handle_ref)?;
        let key = Zeroizing::new(read_array(&env, key)?);
        cbc.init(&key, &read_array(&env, iv)?)?;
        Ok(())
    })();
    finish(&mut env, result);
}

/// Transform `blocks` whole blocks. Returns the bytes written.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `CbcCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_process(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    input: jbyteArray,
    in_off: jint,
    blocks: jint,
    output: jbyteArray,
    out_off: jint,
) -> jint {
    let result = (|| -> Result<_, Failure> {
        let cbc = handle::<CbcCipher>(handle_ref)?;
        let len = non_negative(blocks).saturating_mul(BLOCK_SIZE);
        let src = read_region(&env, input, in_off, to_jint(len))?;
        let mut dst = Zeroizing::new(vec![0u8; room(&env, output, out_off)?.min(len)]);
        let n = cbc.process_blocks(&src, non_negative(blocks), &mut dst)?;
        write_region(&env, output, out_off, &dst[..n])?;
        Ok(to_jint(n))
    })();
    finish(&mut env, result)
}

/// Always 16.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_getBlockSize(
    _env: JNIEnv,
    _class: JClass,
    _handle_ref: jlong,
) -> jint {
    to_jint(BLOCK_SIZE)
}

/// Rewind the chain to the IV.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `CbcCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_reset(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
) {
    let result = handle::<CbcCipher>(handle_ref).map(|cbc| cbc.reset());
    finish(&mut env, result);
}

/// Free the engine. The key schedule is wiped on drop.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It manually drops the `CbcCipher` pointed to by `handle`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeCBC_dispose(
    _env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
) {
    if handle_ref != 0 {
        drop(Box::from_raw(handle_ref as *mut CbcCipher));
    }
}

// =============================================================================
// GCM
// =============================================================================

/// Create a GCM engine. Returns 0 (with an exception pending) for a bad key size.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_makeInstance(
    mut env: JNIEnv,
    _class: JClass,
    key_len: jint,
    encryption: jboolean,
) -> jlong {
    let direction = Direction::from_encrypting(encryption == JNI_TRUE);
    let result = EngineFactory::new()
        .gcm(direction, non_negative(key_len))
        .map(|gcm| Box::into_raw(Box::new(gcm)) as jlong)
        .map_err(Failure::from);
    finish(&mut env, result)
}

/// Key the engine. `mac_size_bits` must be a multiple of 8 in 32..=128.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_initNative(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    for_encryption: jboolean,
    key: jbyteArray,
    nonce: jbyteArray,
    aad: jbyteArray,
    mac_size_bits: jint,
) {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        let tag_len = tag_len_from_bits(mac_size_bits)?;
        let key = Zeroizing::new(read_array(&env, key)?);
        gcm.init(
            Direction::from_encrypting(for_encryption == JNI_TRUE),
            &key,
            &read_array(&env, nonce)?,
            &read_array(&env, aad)?,
            tag_len,
        )?;
        Ok(())
    })();
    finish(&mut env, result);
}

/// Fold one byte of associated data.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_processAADByte(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    byte: jbyte,
) {
    let result = (|| -> Result<_, Failure> {
        handle::<GcmCipher>(handle_ref)?.process_aad_byte(byte as u8)?;
        Ok(())
    })();
    finish(&mut env, result);
}

/// Fold `len` bytes of associated data from `aad[off..]`.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_processAADBytes(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    aad: jbyteArray,
    off: jint,
    len: jint,
) {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        gcm.process_aad_bytes(&read_region(&env, aad, off, len)?)?;
        Ok(())
    })();
    finish(&mut env, result);
}

/// Stream one data byte. Returns the bytes written (0 or 16).
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_processByte(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    byte: jbyte,
    output: jbyteArray,
    out_off: jint,
) -> jint {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        let mut dst = Zeroizing::new(vec![0u8; room(&env, output, out_off)?.min(BLOCK_SIZE)]);
        let n = gcm.process_byte(byte as u8, &mut dst)?;
        write_region(&env, output, out_off, &dst[..n])?;
        Ok(to_jint(n))
    })();
    finish(&mut env, result)
}

/// Stream `len` data bytes from `input[in_off..]`. Returns the bytes written.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_processBytes(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    input: jbyteArray,
    in_off: jint,
    len: jint,
    output: jbyteArray,
    out_off: jint,
) -> jint {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        let src = read_region(&env, input, in_off, len)?;
        let needed = gcm.update_output_size(src.len());
        let mut dst = Zeroizing::new(vec![0u8; room(&env, output, out_off)?.min(needed)]);
        let n = gcm.process_bytes(&src, &mut dst)?;
        write_region(&env, output, out_off, &dst[..n])?;
        Ok(to_jint(n))
    })();
    finish(&mut env, result)
}

/// Finish the message. Throws `InvalidCipherTextException` on tag mismatch.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_doFinal(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    output: jbyteArray,
    out_off: jint,
) -> jint {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        let needed = gcm.output_size(0);
        let mut dst = Zeroizing::new(vec![0u8; room(&env, output, out_off)?.min(needed)]);
        let n = gcm.do_final(&mut dst)?;
        write_region(&env, output, out_off, &dst[..n])?;
        Ok(to_jint(n))
    })();
    finish(&mut env, result)
}

/// Bytes the next `processBytes(len)` will write.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_getUpdateOutputSize(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    len: jint,
) -> jint {
    let result = handle::<GcmCipher>(handle_ref)
        .map(|gcm| to_jint(gcm.update_output_size(non_negative(len))));
    finish(&mut env, result)
}

/// Bytes `processBytes(len)` plus `doFinal` will write.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_getOutputSize(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
    len: jint,
) -> jint {
    let result =
        handle::<GcmCipher>(handle_ref).map(|gcm| to_jint(gcm.output_size(non_negative(len))));
    finish(&mut env, result)
}

/// Tag of the finished encrypt message.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_getMac(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
) -> jbyteArray {
    let result = (|| -> Result<_, Failure> {
        let gcm = handle::<GcmCipher>(handle_ref)?;
        let mac = gcm.mac()?;
        Ok(env.byte_array_from_slice(mac)?.into_raw())
    })();
    finish_object(&mut env, result)
}

/// Restart the message with the key, nonce and AAD from `initNative`.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It casts the `handle` jlong to a raw pointer to `GcmCipher`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_reset(
    mut env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
) {
    let result = handle::<GcmCipher>(handle_ref).map(|gcm| gcm.reset(true));
    finish(&mut env, result);
}

/// Free the engine. Key schedule, hash key and buffers are wiped on drop.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
/// It manually drops the `GcmCipher` pointed to by `handle`.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_AESNativeGCM_dispose(
    _env: JNIEnv,
    _class: JClass,
    handle_ref: jlong,
) {
    if handle_ref != 0 {
        drop(Box::from_raw(handle_ref as *mut GcmCipher));
    }
}

// =============================================================================
// FEATURES
// =============================================================================

const fn flag(on: bool) -> jboolean {
    if on {
        JNI_TRUE
    } else {
        JNI_FALSE
    }
}

/// Hardware AES rounds available.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeAES(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    flag(CapabilityRecord::probe().narrow_cipher())
}

/// CBC runs on a hardware path.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeCBC(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    flag(CapabilityRecord::probe().narrow_cipher())
}

/// GCM runs on a hardware path (AES rounds and carry-less multiply).
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeGCM(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    flag(CapabilityRecord::probe().narrow_hash())
}

/// VAES on 512-bit registers.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeVAES(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    flag(CapabilityRecord::probe().wide_cipher())
}

/// SHA digest acceleration.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeSHA(
    _env: JNIEnv,
    _class: JClass,
) -> jboolean {
    flag(CapabilityRecord::probe().has_sha())
}

/// Name of the code path used for `mode` (0 = CBC, 1 = GCM) and direction.
/// Any other mode throws `IllegalArgumentException` and returns `null`.
/// # Safety
///
/// This function is called from Java and expects valid JNI environment and object pointers.
#[no_mangle]
pub unsafe extern "system" fn Java_org_aesforge_NativeFeatures_nativeBackend(
    mut env: JNIEnv,
    _class: JClass,
    mode: jint,
    encryption: jboolean,
) -> jstring {
    let result = (|| -> Result<_, Failure> {
        let direction = Direction::from_encrypting(encryption == JNI_TRUE);
        let name = aesforge::active_backend(mode_from(mode)?, direction);
        Ok(env.new_string(name).map(JString::into_raw)?)
    })();
    finish_object(&mut env, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_bounds() {
        assert_eq!(region(0, 0, 0), Ok(0..0));
        assert_eq!(region(4, 8, 12), Ok(4..12));
        assert_eq!(region(12, 0, 12), Ok(12..12));
        assert_eq!(region(5, 8, 12), Err(Failure::Bounds("range outside array")));
        assert_eq!(region(13, 0, 12), Err(Failure::Bounds("range outside array")));
        assert_eq!(region(-1, 4, 12), Err(Failure::Bounds("negative offset")));
        assert_eq!(region(0, -4, 12), Err(Failure::Bounds("negative length")));
        assert!(region(jint::MAX, jint::MAX, usize::MAX).is_ok());
    }

    #[test]
    fn test_room_after() {
        assert_eq!(room_after(0, 32), Ok(32));
        assert_eq!(room_after(32, 32), Ok(0));
        assert!(room_after(33, 32).is_err());
        assert!(room_after(-1, 32).is_err());
    }

    #[test]
    fn test_tag_bits() {
        assert_eq!(tag_len_from_bits(128), Ok(16));
        assert_eq!(tag_len_from_bits(32), Ok(4));
        // Range is checked by the engine; only whole bytes are checked here
        assert_eq!(tag_len_from_bits(8), Ok(1));
        assert_eq!(
            tag_len_from_bits(100),
            Err(Failure::Engine(EngineError::InvalidTagLength(100)))
        );
        assert_eq!(
            tag_len_from_bits(-8),
            Err(Failure::Engine(EngineError::InvalidTagLength(0)))
        );
    }

    #[test]
    fn test_mode_mapping() {
        assert_eq!(mode_from(0), Ok(Mode::Cbc));
        assert_eq!(mode_from(1), Ok(Mode::Gcm));
        assert_eq!(mode_from(2), Err(Failure::UnknownMode(2)));
        assert_eq!(mode_from(-1), Err(Failure::UnknownMode(-1)));
    }

    #[test]
    fn test_exception_mapping() {
        let cases = [
            (
                Failure::Engine(EngineError::OutputLength {
                    needed: 16,
                    available: 0,
                }),
                "org/aesforge/OutputLengthException",
            ),
            (
                Failure::Engine(EngineError::InputLength {
                    needed: 16,
                    available: 0,
                }),
                "org/aesforge/DataLengthException",
            ),
            (
                Failure::Engine(EngineError::AuthenticationFailure),
                "org/aesforge/InvalidCipherTextException",
            ),
            (
                Failure::Engine(EngineError::InvalidStateTransition {
                    state: "DataPhase",
                    operation: "process_aad_bytes",
                }),
                "java/lang/IllegalStateException",
            ),
            (
                Failure::Engine(EngineError::DataLimitExceeded),
                "java/lang/IllegalStateException",
            ),
            (
                Failure::Engine(EngineError::InvalidKeySize(5)),
                "java/lang/IllegalArgumentException",
            ),
            (
                Failure::Engine(EngineError::InvalidIvLength(0)),
                "java/lang/IllegalArgumentException",
            ),
            (
                Failure::Engine(EngineError::InvalidTagLength(3)),
                "java/lang/IllegalArgumentException",
            ),
            (
                Failure::Engine(EngineError::UnsupportedKeySize(20)),
                "java/lang/IllegalArgumentException",
            ),
            (Failure::UnknownMode(9), "java/lang/IllegalArgumentException"),
            (Failure::Bounds("x"), "java/lang/IndexOutOfBoundsException"),
            (Failure::NullHandle, "java/lang/NullPointerException"),
            (Failure::Jni, "java/lang/IllegalStateException"),
        ];
        for (failure, class) in cases {
            assert_eq!(exception_for(&failure).0, class, "{failure:?}");
        }

        let (_, message) = exception_for(&Failure::Engine(EngineError::InvalidStateTransition {
            state: "DataPhase",
            operation: "process_aad_bytes",
        }));
        assert!(message.contains("DataPhase"));
    }
}
