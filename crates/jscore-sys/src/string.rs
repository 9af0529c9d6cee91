//! `JSStringRef.h`: UTF-16 engine strings

use crate::base::JSStringRef;
use std::os::raw::c_char;

/// A UTF-16 code unit. One or more code units make up a Unicode character.
pub type JSChar = u16;

unsafe extern "C" {
    /// Creates a string from a buffer of UTF-16 code units. Ownership follows the Create Rule.
    pub fn JSStringCreateWithCharacters(chars: *const JSChar, num_chars: usize) -> JSStringRef;
    /// Creates a string from a null-terminated UTF-8 string. Ownership follows the Create Rule.
    pub fn JSStringCreateWithUTF8CString(string: *const c_char) -> JSStringRef;
    pub fn JSStringRetain(string: JSStringRef) -> JSStringRef;
    pub fn JSStringRelease(string: JSStringRef);

    /// Returns the number of UTF-16 code units in the string.
    pub fn JSStringGetLength(string: JSStringRef) -> usize;
    /// Returns a pointer to the string's UTF-16 code units, valid while the string lives.
    pub fn JSStringGetCharactersPtr(string: JSStringRef) -> *const JSChar;
    /// Returns the worst-case buffer size needed to hold the string as UTF-8, including the NUL.
    pub fn JSStringGetMaximumUTF8CStringSize(string: JSStringRef) -> usize;
    /// Writes the string as null-terminated UTF-8 and returns the bytes written, including the NUL.
    pub fn JSStringGetUTF8CString(
        string: JSStringRef,
        buffer: *mut c_char,
        buffer_size: usize,
    ) -> usize;

    pub fn JSStringIsEqual(a: JSStringRef, b: JSStringRef) -> bool;
    pub fn JSStringIsEqualToUTF8CString(a: JSStringRef, b: *const c_char) -> bool;
}
