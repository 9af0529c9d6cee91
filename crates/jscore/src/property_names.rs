//! Property name arrays and accumulators

use jscore_sys::*;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{JscError, JscResult};
use crate::string::JscString;

/// Owned snapshot of an object's enumerable property names
pub struct PropertyNameArray {
    raw: JSPropertyNameArrayRef,
    _not_send: PhantomData<*mut ()>,
}

impl PropertyNameArray {
    /// Take ownership of an array returned by `JSObjectCopyPropertyNames`
    ///
    /// # Safety
    /// `raw` must be null or a JSPropertyNameArrayRef whose reference the caller owns.
    pub unsafe fn from_raw(raw: JSPropertyNameArrayRef) -> JscResult<Self> {
        if raw.is_null() {
            return Err(JscError::null_pointer("JSObjectCopyPropertyNames"));
        }
        Ok(Self {
            raw,
            _not_send: PhantomData,
        })
    }

    /// Get the raw JSPropertyNameArrayRef
    pub fn raw(&self) -> JSPropertyNameArrayRef {
        self.raw
    }

    pub fn len(&self) -> usize {
        // SAFETY: self.raw is valid
        unsafe { JSPropertyNameArrayGetCount(self.raw) }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the name at `index`, retained so it outlives the array
    pub fn get(&self, index: usize) -> Option<JscString> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: index is in bounds; the array owns the returned string
        unsafe { JscString::retained(JSPropertyNameArrayGetNameAtIndex(self.raw, index)).ok() }
    }

    pub fn iter(&self) -> PropertyNames<'_> {
        PropertyNames {
            array: self,
            index: 0,
        }
    }
}

impl Clone for PropertyNameArray {
    fn clone(&self) -> Self {
        // SAFETY: self.raw is valid
        let raw = unsafe { JSPropertyNameArrayRetain(self.raw) };
        Self {
            raw,
            _not_send: PhantomData,
        }
    }
}

impl Drop for PropertyNameArray {
    fn drop(&mut self) {
        // SAFETY: we own one reference
        unsafe { JSPropertyNameArrayRelease(self.raw) };
    }
}

impl fmt::Debug for PropertyNameArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over a [`PropertyNameArray`]
pub struct PropertyNames<'a> {
    array: &'a PropertyNameArray,
    index: usize,
}

impl Iterator for PropertyNames<'_> {
    type Item = JscString;

    fn next(&mut self) -> Option<JscString> {
        let name = self.array.get(self.index)?;
        self.index += 1;
        Some(name)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl<'a> IntoIterator for &'a PropertyNameArray {
    type Item = JscString;
    type IntoIter = PropertyNames<'a>;

    fn into_iter(self) -> PropertyNames<'a> {
        self.iter()
    }
}

/// Collector handed to a class's get-property-names callback
///
/// Only valid for the duration of the callback that received it.
pub struct PropertyNameAccumulator<'a> {
    raw: JSPropertyNameAccumulatorRef,
    _callback: PhantomData<&'a mut ()>,
    _not_send: PhantomData<*mut ()>,
}

impl<'a> PropertyNameAccumulator<'a> {
    /// Wrap the accumulator passed to a `JSObjectGetPropertyNamesCallback`
    ///
    /// # Safety
    /// `raw` must be the non-null accumulator of a callback that is still running.
    pub unsafe fn from_raw(raw: JSPropertyNameAccumulatorRef) -> Self {
        Self {
            raw,
            _callback: PhantomData,
            _not_send: PhantomData,
        }
    }

    /// Add a name to the enumeration
    pub fn add(&mut self, name: &JscString) {
        // SAFETY: the accumulator is live for 'a and retains the name
        unsafe { JSPropertyNameAccumulatorAddName(self.raw, name.raw()) }
    }

    /// Add a name given as a Rust string
    pub fn add_str(&mut self, name: &str) -> JscResult<()> {
        self.add(&JscString::new(name)?);
        Ok(())
    }
}
