//! `JSObjectRef.h`: classes, object construction, properties and calls

use crate::base::*;
use crate::value::JSType;
use std::ffi::c_void;
use std::os::raw::{c_char, c_int, c_uint};
use std::ptr;

// Property attributes
pub type JSPropertyAttributes = c_uint;
pub const K_JS_PROPERTY_ATTRIBUTE_NONE: JSPropertyAttributes = 0;
pub const K_JS_PROPERTY_ATTRIBUTE_READ_ONLY: JSPropertyAttributes = 1 << 1;
pub const K_JS_PROPERTY_ATTRIBUTE_DONT_ENUM: JSPropertyAttributes = 1 << 2;
pub const K_JS_PROPERTY_ATTRIBUTE_DONT_DELETE: JSPropertyAttributes = 1 << 3;

// Class attributes
pub type JSClassAttributes = c_uint;
pub const K_JS_CLASS_ATTRIBUTE_NONE: JSClassAttributes = 0;
pub const K_JS_CLASS_ATTRIBUTE_NO_AUTOMATIC_PROTOTYPE: JSClassAttributes = 1 << 1;

/// Invoked when an object is first created. Parent classes run first.
pub type JSObjectInitializeCallback =
    Option<unsafe extern "C" fn(ctx: JSContextRef, object: JSObjectRef)>;

/// Invoked when an object is finalized. May run on any thread, and must not
/// call anything that takes a `JSContextRef`.
pub type JSObjectFinalizeCallback = Option<unsafe extern "C" fn(object: JSObjectRef)>;

pub type JSObjectHasPropertyCallback = Option<
    unsafe extern "C" fn(ctx: JSContextRef, object: JSObjectRef, property_name: JSStringRef) -> bool,
>;

/// Returns null to forward the lookup to static values, parents and the prototype chain.
pub type JSObjectGetPropertyCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef,
>;

pub type JSObjectSetPropertyCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool,
>;

pub type JSObjectDeletePropertyCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        exception: *mut JSValueRef,
    ) -> bool,
>;

pub type JSObjectGetPropertyNamesCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_names: JSPropertyNameAccumulatorRef,
    ),
>;

pub type JSObjectCallAsFunctionCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        function: JSObjectRef,
        this_object: JSObjectRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef,
>;

pub type JSObjectCallAsConstructorCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        constructor: JSObjectRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef,
>;

pub type JSObjectHasInstanceCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        constructor: JSObjectRef,
        possible_instance: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool,
>;

pub type JSObjectConvertToTypeCallback = Option<
    unsafe extern "C" fn(
        ctx: JSContextRef,
        object: JSObjectRef,
        type_: JSType,
        exception: *mut JSValueRef,
    ) -> JSValueRef,
>;

/// A statically declared value property.
///
/// Arrays of these are terminated by an entry whose `name` is null.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct JSStaticValue {
    pub name: *const c_char,
    pub get_property: JSObjectGetPropertyCallback,
    pub set_property: JSObjectSetPropertyCallback,
    pub attributes: JSPropertyAttributes,
}

impl JSStaticValue {
    /// The terminating entry of a static value table
    pub const NULL: Self = Self {
        name: ptr::null(),
        get_property: None,
        set_property: None,
        attributes: K_JS_PROPERTY_ATTRIBUTE_NONE,
    };
}

/// A statically declared function property.
///
/// Arrays of these are terminated by an entry whose `name` is null.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct JSStaticFunction {
    pub name: *const c_char,
    pub call_as_function: JSObjectCallAsFunctionCallback,
    pub attributes: JSPropertyAttributes,
}

impl JSStaticFunction {
    /// The terminating entry of a static function table
    pub const NULL: Self = Self {
        name: ptr::null(),
        call_as_function: None,
        attributes: K_JS_PROPERTY_ATTRIBUTE_NONE,
    };
}

/// Properties and callbacks that define a type of object.
///
/// Field order matches the C header exactly. The engine copies everything it
/// needs during `JSClassCreate`, including names and static tables.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct JSClassDefinition {
    /// The only supported version is 0
    pub version: c_int,
    pub attributes: JSClassAttributes,
    pub class_name: *const c_char,
    pub parent_class: JSClassRef,
    pub static_values: *const JSStaticValue,
    pub static_functions: *const JSStaticFunction,
    pub initialize: JSObjectInitializeCallback,
    pub finalize: JSObjectFinalizeCallback,
    pub has_property: JSObjectHasPropertyCallback,
    pub get_property: JSObjectGetPropertyCallback,
    pub set_property: JSObjectSetPropertyCallback,
    pub delete_property: JSObjectDeletePropertyCallback,
    pub get_property_names: JSObjectGetPropertyNamesCallback,
    pub call_as_function: JSObjectCallAsFunctionCallback,
    pub call_as_constructor: JSObjectCallAsConstructorCallback,
    pub has_instance: JSObjectHasInstanceCallback,
    pub convert_to_type: JSObjectConvertToTypeCallback,
}

/// A class definition with every field zeroed, equivalent to `kJSClassDefinitionEmpty`.
pub const K_JS_CLASS_DEFINITION_EMPTY: JSClassDefinition = JSClassDefinition {
    version: 0,
    attributes: K_JS_CLASS_ATTRIBUTE_NONE,
    class_name: ptr::null(),
    parent_class: ptr::null_mut(),
    static_values: ptr::null(),
    static_functions: ptr::null(),
    initialize: None,
    finalize: None,
    has_property: None,
    get_property: None,
    set_property: None,
    delete_property: None,
    get_property_names: None,
    call_as_function: None,
    call_as_constructor: None,
    has_instance: None,
    convert_to_type: None,
};

impl Default for JSClassDefinition {
    fn default() -> Self {
        K_JS_CLASS_DEFINITION_EMPTY
    }
}

unsafe extern "C" {
    // Classes
    /// Creates a class suitable for use with `JSObjectMake`. Ownership follows the Create Rule.
    pub fn JSClassCreate(definition: *const JSClassDefinition) -> JSClassRef;
    pub fn JSClassRetain(js_class: JSClassRef) -> JSClassRef;
    pub fn JSClassRelease(js_class: JSClassRef);

    // Object creation
    /// Creates an object. A null class creates a plain object; `data` is stored as private data.
    pub fn JSObjectMake(ctx: JSContextRef, js_class: JSClassRef, data: *mut c_void) -> JSObjectRef;
    pub fn JSObjectMakeFunctionWithCallback(
        ctx: JSContextRef,
        name: JSStringRef,
        call_as_function: JSObjectCallAsFunctionCallback,
    ) -> JSObjectRef;
    pub fn JSObjectMakeConstructor(
        ctx: JSContextRef,
        js_class: JSClassRef,
        call_as_constructor: JSObjectCallAsConstructorCallback,
    ) -> JSObjectRef;
    pub fn JSObjectMakeArray(
        ctx: JSContextRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;
    pub fn JSObjectMakeDate(
        ctx: JSContextRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;
    pub fn JSObjectMakeError(
        ctx: JSContextRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;
    pub fn JSObjectMakeRegExp(
        ctx: JSContextRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;
    pub fn JSObjectMakeDeferredPromise(
        ctx: JSContextRef,
        resolve: *mut JSObjectRef,
        reject: *mut JSObjectRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;
    pub fn JSObjectMakeFunction(
        ctx: JSContextRef,
        name: JSStringRef,
        parameter_count: c_uint,
        parameter_names: *const JSStringRef,
        body: JSStringRef,
        source_url: JSStringRef,
        starting_line_number: c_int,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;

    // Prototype
    pub fn JSObjectGetPrototype(ctx: JSContextRef, object: JSObjectRef) -> JSValueRef;
    pub fn JSObjectSetPrototype(ctx: JSContextRef, object: JSObjectRef, value: JSValueRef);

    // Properties by name
    pub fn JSObjectHasProperty(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
    ) -> bool;
    pub fn JSObjectGetProperty(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSObjectSetProperty(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        value: JSValueRef,
        attributes: JSPropertyAttributes,
        exception: *mut JSValueRef,
    );
    pub fn JSObjectDeleteProperty(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_name: JSStringRef,
        exception: *mut JSValueRef,
    ) -> bool;

    // Properties by key value (strings, symbols, numbers)
    pub fn JSObjectHasPropertyForKey(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_key: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool;
    pub fn JSObjectGetPropertyForKey(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_key: JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSObjectSetPropertyForKey(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_key: JSValueRef,
        value: JSValueRef,
        attributes: JSPropertyAttributes,
        exception: *mut JSValueRef,
    );
    pub fn JSObjectDeletePropertyForKey(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_key: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool;

    // Indexed properties
    pub fn JSObjectGetPropertyAtIndex(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_index: c_uint,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSObjectSetPropertyAtIndex(
        ctx: JSContextRef,
        object: JSObjectRef,
        property_index: c_uint,
        value: JSValueRef,
        exception: *mut JSValueRef,
    );

    // Private data
    pub fn JSObjectGetPrivate(object: JSObjectRef) -> *mut c_void;
    /// Returns false if the object's class does not allocate private storage.
    pub fn JSObjectSetPrivate(object: JSObjectRef, data: *mut c_void) -> bool;

    // Calls
    pub fn JSObjectIsFunction(ctx: JSContextRef, object: JSObjectRef) -> bool;
    pub fn JSObjectCallAsFunction(
        ctx: JSContextRef,
        object: JSObjectRef,
        this_object: JSObjectRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSObjectIsConstructor(ctx: JSContextRef, object: JSObjectRef) -> bool;
    pub fn JSObjectCallAsConstructor(
        ctx: JSContextRef,
        object: JSObjectRef,
        argument_count: usize,
        arguments: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;

    // Property names
    /// Gets the names of an object's enumerable properties. Ownership follows the Create Rule.
    pub fn JSObjectCopyPropertyNames(ctx: JSContextRef, object: JSObjectRef)
    -> JSPropertyNameArrayRef;
    pub fn JSPropertyNameArrayRetain(array: JSPropertyNameArrayRef) -> JSPropertyNameArrayRef;
    pub fn JSPropertyNameArrayRelease(array: JSPropertyNameArrayRef);
    pub fn JSPropertyNameArrayGetCount(array: JSPropertyNameArrayRef) -> usize;
    /// The returned string is owned by the array.
    pub fn JSPropertyNameArrayGetNameAtIndex(
        array: JSPropertyNameArrayRef,
        index: usize,
    ) -> JSStringRef;
    pub fn JSPropertyNameAccumulatorAddName(
        accumulator: JSPropertyNameAccumulatorRef,
        property_name: JSStringRef,
    );
}
