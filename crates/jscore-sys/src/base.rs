//! `JSBase.h`: opaque handle types, script evaluation and garbage collection

use std::ffi::c_void;
use std::marker::{PhantomData, PhantomPinned};
use std::os::raw::c_int;

macro_rules! opaque_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(C)]
        pub struct $name {
            _data: [u8; 0],
            _marker: PhantomData<(*mut u8, PhantomPinned)>,
        }
    };
}

opaque_type!(
    /// Native storage behind a `JSContextGroupRef`
    OpaqueJSContextGroup
);
opaque_type!(
    /// Native storage behind `JSContextRef` and `JSGlobalContextRef`
    OpaqueJSContext
);
opaque_type!(
    /// Native storage behind a `JSStringRef`
    OpaqueJSString
);
opaque_type!(
    /// Native storage behind a `JSClassRef`
    OpaqueJSClass
);
opaque_type!(
    /// Native storage behind a `JSPropertyNameArrayRef`
    OpaqueJSPropertyNameArray
);
opaque_type!(
    /// Native storage behind a `JSPropertyNameAccumulatorRef`
    OpaqueJSPropertyNameAccumulator
);
opaque_type!(
    /// Native storage behind `JSValueRef` and `JSObjectRef`
    OpaqueJSValue
);

/// A group that associates JavaScript contexts with one another.
///
/// Contexts in the same group may share and exchange JavaScript objects.
pub type JSContextGroupRef = *const OpaqueJSContextGroup;

/// A JavaScript execution context. Holds the global object and other execution state.
pub type JSContextRef = *const OpaqueJSContext;

/// A global JavaScript execution context. A global context is a context.
pub type JSGlobalContextRef = *mut OpaqueJSContext;

/// A UTF-16 character buffer. The fundamental string representation in JavaScript.
pub type JSStringRef = *mut OpaqueJSString;

/// A JavaScript class. Used with `JSObjectMake` to construct objects with custom behavior.
pub type JSClassRef = *mut OpaqueJSClass;

/// An array of JavaScript property names.
pub type JSPropertyNameArrayRef = *mut OpaqueJSPropertyNameArray;

/// An ordered set used to collect the names of a JavaScript object's properties.
pub type JSPropertyNameAccumulatorRef = *mut OpaqueJSPropertyNameAccumulator;

/// A function used to deallocate bytes passed to a typed array constructor.
pub type JSTypedArrayBytesDeallocator =
    Option<unsafe extern "C" fn(bytes: *mut c_void, deallocator_context: *mut c_void)>;

/// A JavaScript value. The base type for all JavaScript values.
pub type JSValueRef = *const OpaqueJSValue;

/// A JavaScript object. An object is a value.
pub type JSObjectRef = *mut OpaqueJSValue;

unsafe extern "C" {
    /// Evaluates a string of JavaScript.
    ///
    /// `this_object` may be null to use the global object as `this`, and
    /// `source_url` may be null. `starting_line_number` is one-based; invalid
    /// values are clamped to 1. Returns null if an exception is thrown.
    pub fn JSEvaluateScript(
        ctx: JSContextRef,
        script: JSStringRef,
        this_object: JSObjectRef,
        source_url: JSStringRef,
        starting_line_number: c_int,
        exception: *mut JSValueRef,
    ) -> JSValueRef;

    /// Checks for syntax errors in a string of JavaScript.
    pub fn JSCheckScriptSyntax(
        ctx: JSContextRef,
        script: JSStringRef,
        source_url: JSStringRef,
        starting_line_number: c_int,
        exception: *mut JSValueRef,
    ) -> bool;

    /// Performs a JavaScript garbage collection.
    ///
    /// Values on the machine stack, in a register, protected by
    /// `JSValueProtect`, set as the global object of a context, or reachable
    /// from any such value are not collected.
    pub fn JSGarbageCollect(ctx: JSContextRef);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;
    use std::ptr;

    #[test]
    fn test_handles_are_pointer_sized() {
        assert_eq!(size_of::<JSContextRef>(), size_of::<*const c_void>());
        assert_eq!(size_of::<JSObjectRef>(), size_of::<*const c_void>());
        assert_eq!(size_of::<OpaqueJSValue>(), 0);
    }

    #[test]
    fn test_global_context_coerces_to_context() {
        let global: JSGlobalContextRef = ptr::null_mut();
        let ctx: JSContextRef = global;
        assert_eq!(ctx, global as JSContextRef);
    }

    #[test]
    fn test_object_coerces_to_value() {
        let object: JSObjectRef = ptr::null_mut();
        let value: JSValueRef = object;
        assert!(value.is_null());
    }

    #[test]
    fn test_deallocator_is_nullable_pointer() {
        assert_eq!(
            size_of::<JSTypedArrayBytesDeallocator>(),
            size_of::<*const c_void>()
        );
    }
}
