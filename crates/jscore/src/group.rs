//! Context groups
//!
//! Contexts created in the same group share a heap, so values may be passed
//! between them. Contexts in different groups must never exchange values.

use jscore_sys::*;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

use crate::error::{JscError, JscResult};

/// Owned reference to a JSContextGroupRef
pub struct ContextGroup {
    raw: JSContextGroupRef,
    _not_send: PhantomData<*mut ()>,
}

impl ContextGroup {
    /// Create a new, empty context group
    pub fn new() -> JscResult<Self> {
        // SAFETY: no preconditions
        let raw = unsafe { JSContextGroupCreate() };
        if raw.is_null() {
            return Err(JscError::context_creation("JSContextGroupCreate returned null"));
        }
        debug!(group = ?raw, "Created JavaScriptCore context group");
        Ok(Self {
            raw,
            _not_send: PhantomData,
        })
    }

    /// Retain a group handle the caller does not own
    ///
    /// # Safety
    /// `raw` must be null or a valid JSContextGroupRef.
    pub unsafe fn from_raw_retained(raw: JSContextGroupRef) -> JscResult<Self> {
        if raw.is_null() {
            return Err(JscError::null_pointer("JSContextGetGroup"));
        }
        // SAFETY: raw is valid per caller contract
        let raw = unsafe { JSContextGroupRetain(raw) };
        Ok(Self {
            raw,
            _not_send: PhantomData,
        })
    }

    /// Get the raw JSContextGroupRef
    pub fn raw(&self) -> JSContextGroupRef {
        self.raw
    }
}

impl Clone for ContextGroup {
    fn clone(&self) -> Self {
        // SAFETY: self.raw is valid
        let raw = unsafe { JSContextGroupRetain(self.raw) };
        Self {
            raw,
            _not_send: PhantomData,
        }
    }
}

impl Drop for ContextGroup {
    fn drop(&mut self) {
        // SAFETY: we own one reference
        unsafe { JSContextGroupRelease(self.raw) };
    }
}

impl PartialEq for ContextGroup {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ContextGroup {}

impl fmt::Debug for ContextGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextGroup").field(&self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JscContext;

    #[test]
    fn test_group_identity() {
        let a = ContextGroup::new().unwrap();
        let b = ContextGroup::new().unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_contexts_share_group() {
        let group = ContextGroup::new().unwrap();
        let first = JscContext::in_group(&group).unwrap();
        let second = JscContext::in_group(&group).unwrap();

        assert_eq!(first.group().unwrap(), group);
        assert!(first.same_group(&second));

        let standalone = JscContext::new().unwrap();
        assert!(!first.same_group(&standalone));
    }

    #[test]
    fn test_group_outlives_handle() {
        let ctx = {
            let group = ContextGroup::new().unwrap();
            JscContext::in_group(&group).unwrap()
        };
        assert_eq!(ctx.eval("1 + 1").unwrap().to_number().unwrap(), 2.0);
    }

    #[test]
    fn test_values_cross_contexts_in_group() {
        let group = ContextGroup::new().unwrap();
        let producer = JscContext::in_group(&group).unwrap();
        let consumer = JscContext::in_group(&group).unwrap();

        let value = producer.eval("({ answer: 42 })").unwrap();
        consumer.set_global("shared", &value).unwrap();
        let answer = consumer.eval("shared.answer").unwrap();
        assert_eq!(answer.to_number().unwrap(), 42.0);
    }
}
