//! RAII wrapper for JSC strings

use jscore_sys::*;
use std::ffi::CString;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::slice;
use std::str::FromStr;

use crate::error::{JscError, JscResult};

/// RAII wrapper for JSStringRef with automatic release
///
/// Every `JscString` owns exactly one reference: cloning retains, dropping
/// releases.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because JSC strings should not be
/// shared across threads.
pub struct JscString {
    raw: JSStringRef,
    /// Marker to make this type !Send + !Sync
    _not_send: PhantomData<*mut ()>,
}

impl JscString {
    /// Create a new JSC string from a Rust string
    ///
    /// Strings containing NUL bytes are rejected; use [`JscString::from_utf16`]
    /// for those.
    pub fn new(s: &str) -> JscResult<Self> {
        let c_str = CString::new(s)?;
        // SAFETY: c_str is valid null-terminated UTF-8
        let raw = unsafe { JSStringCreateWithUTF8CString(c_str.as_ptr()) };
        // SAFETY: raw is a fresh Create result
        unsafe { Self::from_raw(raw) }
    }

    /// Create a JSC string from UTF-16 code units
    pub fn from_utf16(units: &[u16]) -> JscResult<Self> {
        // SAFETY: units is a valid slice for its length
        let raw = unsafe { JSStringCreateWithCharacters(units.as_ptr(), units.len()) };
        // SAFETY: raw is a fresh Create result
        unsafe { Self::from_raw(raw) }
    }

    /// Take ownership of a string returned by a Create or Copy function
    ///
    /// # Safety
    /// `raw` must be null or a JSStringRef whose reference the caller owns.
    pub unsafe fn from_raw(raw: JSStringRef) -> JscResult<Self> {
        if raw.is_null() {
            return Err(JscError::null_pointer("JSStringCreate"));
        }
        Ok(Self {
            raw,
            _not_send: PhantomData,
        })
    }

    /// Retain a string the caller does not own
    ///
    /// # Safety
    /// `raw` must be null or a valid JSStringRef.
    pub unsafe fn retained(raw: JSStringRef) -> JscResult<Self> {
        if raw.is_null() {
            return Err(JscError::null_pointer("JSStringRetain"));
        }
        // SAFETY: raw is valid per caller contract
        let raw = unsafe { JSStringRetain(raw) };
        // SAFETY: JSStringRetain hands back the reference we now own
        unsafe { Self::from_raw(raw) }
    }

    /// Give up ownership; the caller must eventually call `JSStringRelease`
    pub fn into_raw(self) -> JSStringRef {
        let raw = self.raw;
        mem::forget(self);
        raw
    }

    /// Get the raw JSStringRef
    pub fn raw(&self) -> JSStringRef {
        self.raw
    }

    /// Get the length in UTF-16 code units
    pub fn len(&self) -> usize {
        // SAFETY: self.raw is valid
        unsafe { JSStringGetLength(self.raw) }
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the UTF-16 code units backing this string
    pub fn as_utf16(&self) -> &[u16] {
        let len = self.len();
        if len == 0 {
            return &[];
        }
        // SAFETY: the buffer lives as long as self holds its reference
        unsafe {
            let chars = JSStringGetCharactersPtr(self.raw);
            if chars.is_null() {
                return &[];
            }
            slice::from_raw_parts(chars, len)
        }
    }

    /// Decode to a Rust `String`, replacing unpaired surrogates
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(self.as_utf16())
    }
}

impl Clone for JscString {
    fn clone(&self) -> Self {
        // SAFETY: self.raw is valid
        let raw = unsafe { JSStringRetain(self.raw) };
        Self {
            raw,
            _not_send: PhantomData,
        }
    }
}

impl Drop for JscString {
    fn drop(&mut self) {
        if !self.raw.is_null() {
            // SAFETY: we own one reference to self.raw
            unsafe { JSStringRelease(self.raw) };
        }
    }
}

impl FromStr for JscString {
    type Err = JscError;

    fn from_str(s: &str) -> JscResult<Self> {
        Self::new(s)
    }
}

impl PartialEq for JscString {
    fn eq(&self, other: &Self) -> bool {
        // SAFETY: both handles are valid
        unsafe { JSStringIsEqual(self.raw, other.raw) }
    }
}

impl Eq for JscString {}

impl PartialEq<str> for JscString {
    fn eq(&self, other: &str) -> bool {
        match CString::new(other) {
            // SAFETY: self.raw is valid and c_str is null-terminated
            Ok(c_str) => unsafe { JSStringIsEqualToUTF8CString(self.raw, c_str.as_ptr()) },
            Err(_) => self.as_utf16().iter().copied().eq(other.encode_utf16()),
        }
    }
}

impl PartialEq<&str> for JscString {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl fmt::Display for JscString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: self.raw is valid
        write!(f, "{}", unsafe { js_string_to_rust(self.raw) })
    }
}

impl fmt::Debug for JscString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JscString")
            .field(&self.to_string_lossy())
            .finish()
    }
}

/// Convert JSStringRef to Rust String
///
/// Decodes the UTF-16 contents directly; unpaired surrogates become U+FFFD
/// instead of failing the whole conversion.
///
/// # Safety
/// The js_str must be a valid JSStringRef or null
pub unsafe fn js_string_to_rust(js_str: JSStringRef) -> String {
    if js_str.is_null() {
        return String::new();
    }

    // SAFETY: js_str is valid per caller contract and owns its buffer
    unsafe {
        let len = JSStringGetLength(js_str);
        let chars = JSStringGetCharactersPtr(js_str);
        if len == 0 || chars.is_null() {
            return String::new();
        }
        String::from_utf16_lossy(slice::from_raw_parts(chars, len))
    }
}
