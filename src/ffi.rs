//! C ABI for [`crate::concat::concat`].
//!
//! Buffers returned by [`strconcat`] belong to the caller and must be
//! released with [`strconcat_free`], never with the C `free`.
//!
//! The crate also builds as a `cdylib` and a `staticlib`, so C callers can
//! link these symbols directly.

use core::ffi::{CStr, c_char};
use core::ptr;
use std::ffi::CString;

/// Concatenate two C strings into a newly allocated C string.
///
/// Returns null if either argument is null or the allocation fails.
///
/// # Safety
///
/// - `str1` and `str2` must each be null or point to a valid
///   null-terminated string that stays alive for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strconcat(str1: *const c_char, str2: *const c_char) -> *mut c_char {
    if str1.is_null() || str2.is_null() {
        return ptr::null_mut();
    }

    // SAFETY: both pointers are non-null and terminated per the contract.
    let (a, b) = unsafe { (CStr::from_ptr(str1), CStr::from_ptr(str2)) };

    crate::concat::concat(Some(a.to_bytes()), Some(b.to_bytes()))
        .and_then(|buf| CString::from_vec_with_nul(buf).ok())
        .map_or(ptr::null_mut(), CString::into_raw)
}

/// Release a buffer returned by [`strconcat`].
///
/// Passing null is a no-op.
///
/// # Safety
///
/// - `s` must be null or a pointer returned by [`strconcat`] that has not
///   been released yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn strconcat_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    // SAFETY: `s` came from `CString::into_raw` in `strconcat`.
    drop(unsafe { CString::from_raw(s) });
}
