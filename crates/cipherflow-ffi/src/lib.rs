//! cipherflow C FFI bindings.
//!
//! Exposes digests, keys and ciphers as opaque heap handles.
//!
#![allow(clippy::doc_overindented_list_items)]
//! # Memory contract
//!
//! - `*mut CfDigest`, `*mut CfKey` and `*mut CfCipher` are Rust `Box`es and
//!   **must** be released with [`cf_digest_free`], [`cf_key_free`] and
//!   [`cf_cipher_free`] respectively.
//! - A cipher holds its own reference to the key, so a key may be freed
//!   while ciphers built from it are still in use.
//! - The string returned by [`cf_version`] is static and must **not** be
//!   freed.
//!
//! # Null handles
//!
//! Every function accepts a null handle. It does nothing and returns the
//! neutral value for its type: `false`, null, `0`, or `CF_ERR_NULL_PTR` for
//! functions returning a signed count.
//!
//! # Error codes
//!
//! | Constant                 | Value | Meaning                              |
//! |--------------------------|-------|--------------------------------------|
//! | `CF_ERR_NULL_PTR`        | -1    | A required pointer was null          |
//! | `CF_ERR_INVALID_UTF8`    | -2    | A string was not valid UTF-8         |
//! | `CF_ERR_BLOCK_SIZE`      | -3    | Input or output not block-sized      |
//! | `CF_ERR_BUFFER_TOO_SMALL`| -4    | Output buffer too short              |
//! | `CF_ERR_CRYPTO`          | -5    | The backend rejected the operation   |

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;

use libc::{c_int, c_uint};

use cipherflow::{Cipher, CipherAlgorithm, CryptoError, Digest, DigestAlgorithm, Key, KeyKind};

// ── Error codes ───────────────────────────────────────────────────────────────

/// A required pointer argument was null.
pub const CF_ERR_NULL_PTR: c_int = -1;
/// A string argument contained invalid UTF-8.
pub const CF_ERR_INVALID_UTF8: c_int = -2;
/// Input was not a whole block, or a tail was longer than one block.
pub const CF_ERR_BLOCK_SIZE: c_int = -3;
/// An output buffer was too short.
pub const CF_ERR_BUFFER_TOO_SMALL: c_int = -4;
/// The primitive rejected the operation.
pub const CF_ERR_CRYPTO: c_int = -5;

// ── Handles ───────────────────────────────────────────────────────────────────

/// Opaque digest handle.
pub struct CfDigest(Digest);

/// Opaque key handle.
pub struct CfKey(Arc<Key>);

/// Opaque cipher handle.
pub struct CfCipher(Cipher);

/// C padding callback: fill `block[filled..block_len]`.
pub type CfPaddingFn = unsafe extern "C" fn(block: *mut u8, block_len: usize, filled: usize);

// ── Internal helpers ──────────────────────────────────────────────────────────

/// # Safety
///
/// `ptr` must be null or a valid, null-terminated C string.
unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Result<&'a str, c_int> {
    if ptr.is_null() {
        return Err(CF_ERR_NULL_PTR);
    }
    CStr::from_ptr(ptr).to_str().map_err(|_| CF_ERR_INVALID_UTF8)
}

/// # Safety
///
/// `ptr` must be null (only when `len == 0`) or valid for `len` reads.
unsafe fn bytes<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        return Some(&[]);
    }
    if ptr.is_null() {
        return None;
    }
    Some(std::slice::from_raw_parts(ptr, len))
}

/// Map a [`CryptoError`] to one of the `CF_ERR_*` constants.
fn map_error(e: &CryptoError) -> c_int {
    match e {
        CryptoError::BlockSize { .. } => CF_ERR_BLOCK_SIZE,
        CryptoError::BufferTooSmall { .. } => CF_ERR_BUFFER_TOO_SMALL,
        _ => CF_ERR_CRYPTO,
    }
}

fn into_count(result: cipherflow::Result<usize>) -> c_int {
    match result {
        Ok(n) => c_int::try_from(n).unwrap_or(CF_ERR_BUFFER_TOO_SMALL),
        Err(e) => {
            log::debug!("ffi call failed: {e}");
            map_error(&e)
        }
    }
}

// ── Version ───────────────────────────────────────────────────────────────────

/// Return the library version as a static null-terminated string.
#[no_mangle]
pub extern "C" fn cf_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// ── Digests ───────────────────────────────────────────────────────────────────

/// Create a digest by name (`"sha256"`, `"SHA1"`, …). Null if unknown.
///
/// # Safety
///
/// `name` must be null or a valid C string.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_new(name: *const c_char) -> *mut CfDigest {
    let Ok(name) = cstr_to_str(name) else {
        return std::ptr::null_mut();
    };
    match name.parse::<DigestAlgorithm>() {
        Ok(alg) => Box::into_raw(Box::new(CfDigest(Digest::new(alg)))),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Feed `len` bytes. False on a null handle or a finished digest.
///
/// # Safety
///
/// `digest` must be null or a live handle; `data` must be valid for `len`
/// reads.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_update(digest: *mut CfDigest, data: *const u8, len: usize) -> bool {
    let (Some(digest), Some(data)) = (digest.as_mut(), bytes(data, len)) else {
        return false;
    };
    digest.0.update(data).is_ok()
}

/// Finish the digest and copy it into `out`. Returns the digest size, or a
/// negative `CF_ERR_*` code.
///
/// # Safety
///
/// `digest` must be null or a live handle; `out` must be valid for
/// `out_len` writes.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_finish(digest: *mut CfDigest, out: *mut u8, out_len: usize) -> isize {
    let Some(digest) = digest.as_mut() else {
        return CF_ERR_NULL_PTR as isize;
    };
    if out.is_null() {
        return CF_ERR_NULL_PTR as isize;
    }
    let result = digest.0.finish();
    if out_len < result.len() {
        return CF_ERR_BUFFER_TOO_SMALL as isize;
    }
    std::ptr::copy_nonoverlapping(result.as_ptr(), out, result.len());
    result.len() as isize
}

/// Reset to the initial state.
///
/// # Safety
///
/// `digest` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_reset(digest: *mut CfDigest) -> bool {
    match digest.as_mut() {
        Some(digest) => {
            digest.0.reset();
            true
        }
        None => false,
    }
}

/// Independent copy of a digest, cached result included.
///
/// # Safety
///
/// `digest` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_clone(digest: *const CfDigest) -> *mut CfDigest {
    match digest.as_ref() {
        Some(digest) => Box::into_raw(Box::new(CfDigest(digest.0.clone()))),
        None => std::ptr::null_mut(),
    }
}

/// Overwrite `dst` with the state of `src`. False if either is null or the
/// algorithms differ.
///
/// # Safety
///
/// Both handles must be null or live, and must not alias.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_copy(dst: *mut CfDigest, src: *const CfDigest) -> bool {
    match (dst.as_mut(), src.as_ref()) {
        (Some(dst), Some(src)) => dst.0.copy_from(&src.0).is_ok(),
        _ => false,
    }
}

/// Digest size in bytes; 0 for a null handle.
///
/// # Safety
///
/// `digest` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_size(digest: *const CfDigest) -> usize {
    digest.as_ref().map(|d| d.0.size()).unwrap_or(0)
}

/// Release a digest. Null is a no-op.
///
/// # Safety
///
/// `digest` must be null or a handle not already freed.
#[no_mangle]
pub unsafe extern "C" fn cf_digest_free(digest: *mut CfDigest) {
    if !digest.is_null() {
        drop(Box::from_raw(digest));
    }
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Build an AES key from `key || iv` bytes. `kind` is `"aes128"`,
/// `"aes192"` or `"aes256"`. Null on failure.
///
/// # Safety
///
/// `kind` must be a valid C string; `data` must be valid for `len` reads.
#[no_mangle]
pub unsafe extern "C" fn cf_key_aes_new(kind: *const c_char, data: *const u8, len: usize) -> *mut CfKey {
    let (Ok(kind), Some(data)) = (cstr_to_str(kind), bytes(data, len)) else {
        return std::ptr::null_mut();
    };
    let key = kind
        .parse::<KeyKind>()
        .and_then(|kind| Key::aes_from_bytes(kind, data));
    match key {
        Ok(key) => Box::into_raw(Box::new(CfKey(Arc::new(key)))),
        Err(e) => {
            log::debug!("cf_key_aes_new: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Generate an RSA key of `bits` bits. With `private` false only the
/// public half is returned.
#[no_mangle]
pub extern "C" fn cf_key_rsa_generate(bits: c_uint, private: bool) -> *mut CfKey {
    let key = match Key::generate_rsa(bits as usize) {
        Ok(key) => key,
        Err(e) => {
            log::debug!("cf_key_rsa_generate: {e}");
            return std::ptr::null_mut();
        }
    };
    let key = if private { Some(key) } else { key.public_key() };
    match key {
        Some(key) => Box::into_raw(Box::new(CfKey(Arc::new(key)))),
        None => std::ptr::null_mut(),
    }
}

/// Public half of an RSA key as a new handle. Null for AES keys.
///
/// # Safety
///
/// `key` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_key_public(key: *const CfKey) -> *mut CfKey {
    match key.as_ref().and_then(|k| k.0.public_key()) {
        Some(public) => Box::into_raw(Box::new(CfKey(Arc::new(public)))),
        None => std::ptr::null_mut(),
    }
}

/// Release a key handle. Null is a no-op.
///
/// # Safety
///
/// `key` must be null or a handle not already freed.
#[no_mangle]
pub unsafe extern "C" fn cf_key_free(key: *mut CfKey) {
    if !key.is_null() {
        drop(Box::from_raw(key));
    }
}

// ── Ciphers ───────────────────────────────────────────────────────────────────

/// Whether the named cipher can use `key`.
///
/// # Safety
///
/// `cipher_name` must be null or a valid C string; `key` null or live.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_type_supports_key(cipher_name: *const c_char, key: *const CfKey) -> bool {
    let (Ok(name), Some(key)) = (cstr_to_str(cipher_name), key.as_ref()) else {
        return false;
    };
    name.parse::<CipherAlgorithm>()
        .map(|alg| alg.supports_key(key.0.kind()))
        .unwrap_or(false)
}

/// Bind the named cipher (`"aes-cbc-encrypt"`, `"rsa-decrypt"`, …) to
/// `key`. Null on failure.
///
/// # Safety
///
/// `name` must be null or a valid C string; `key` null or live.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_new(name: *const c_char, key: *const CfKey) -> *mut CfCipher {
    let (Ok(name), Some(key)) = (cstr_to_str(name), key.as_ref()) else {
        return std::ptr::null_mut();
    };
    let cipher = name
        .parse::<CipherAlgorithm>()
        .and_then(|alg| Cipher::new(alg, key.0.clone()));
    match cipher {
        Ok(cipher) => Box::into_raw(Box::new(CfCipher(cipher))),
        Err(e) => {
            log::debug!("cf_cipher_new: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Input block size; 0 for a null handle.
///
/// # Safety
///
/// `cipher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_input_block_size(cipher: *const CfCipher) -> c_int {
    cipher
        .as_ref()
        .map(|c| c_int::try_from(c.0.input_block_size()).unwrap_or(0))
        .unwrap_or(0)
}

/// Output block size; 0 for a null handle.
///
/// # Safety
///
/// `cipher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_output_block_size(cipher: *const CfCipher) -> c_int {
    cipher
        .as_ref()
        .map(|c| c_int::try_from(c.0.output_block_size()).unwrap_or(0))
        .unwrap_or(0)
}

/// Transform one input block into `output`. Returns the bytes written or a
/// negative `CF_ERR_*` code.
///
/// # Safety
///
/// `input` must be valid for one input block of reads and `output` for one
/// output block of writes.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_step(cipher: *mut CfCipher, input: *const u8, output: *mut u8) -> c_int {
    let Some(cipher) = cipher.as_mut() else {
        return CF_ERR_NULL_PTR;
    };
    if input.is_null() || output.is_null() {
        return CF_ERR_NULL_PTR;
    }
    let input = std::slice::from_raw_parts(input, cipher.0.input_block_size());
    let output = std::slice::from_raw_parts_mut(output, cipher.0.output_block_size());
    into_count(cipher.0.step(input, output))
}

/// Transform the final `len` bytes (at most one input block). Returns the
/// bytes written or a negative `CF_ERR_*` code.
///
/// # Safety
///
/// `input` must be valid for `len` reads and `output` for one output block
/// of writes.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_finish(
    cipher: *mut CfCipher,
    input: *const u8,
    len: usize,
    output: *mut u8,
) -> c_int {
    let Some(cipher) = cipher.as_mut() else {
        return CF_ERR_NULL_PTR;
    };
    let Some(input) = bytes(input, len) else {
        return CF_ERR_NULL_PTR;
    };
    if output.is_null() {
        return CF_ERR_NULL_PTR;
    }
    let output = std::slice::from_raw_parts_mut(output, cipher.0.output_block_size());
    into_count(cipher.0.finish(input, output))
}

/// Install a padding callback, or restore the default with `NULL`. False
/// for a null handle or a cipher that does not take custom padding.
///
/// # Safety
///
/// `cipher` must be null or a live handle. `padding` must stay callable for
/// the life of the cipher and its clones.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_set_padding_func(
    cipher: *mut CfCipher,
    padding: Option<CfPaddingFn>,
) -> bool {
    let Some(cipher) = cipher.as_mut() else {
        return false;
    };
    let result = match padding {
        Some(f) => cipher.0.set_padding_with(move |block: &mut [u8], filled: usize| {
            // SAFETY: the caller guarantees `f` is a valid padding callback.
            f(block.as_mut_ptr(), block.len(), filled)
        }),
        None => cipher.0.set_padding_func(None),
    };
    result.is_ok()
}

/// Copy of a cipher with the same chaining state, sharing its key.
///
/// # Safety
///
/// `cipher` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_clone(cipher: *const CfCipher) -> *mut CfCipher {
    match cipher.as_ref() {
        Some(cipher) => Box::into_raw(Box::new(CfCipher(cipher.0.clone()))),
        None => std::ptr::null_mut(),
    }
}

/// Release a cipher handle. Null is a no-op.
///
/// # Safety
///
/// `cipher` must be null or a handle not already freed.
#[no_mangle]
pub unsafe extern "C" fn cf_cipher_free(cipher: *mut CfCipher) {
    if !cipher.is_null() {
        drop(Box::from_raw(cipher));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
