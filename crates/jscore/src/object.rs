//! Safe wrapper for JSC objects with property access and function support

use jscore_sys::*;
use std::ffi::c_void;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::{BitOr, BitOrAssign};
use std::ptr;

use crate::class::JscClass;
use crate::context::JscContext;
use crate::error::{JscError, JscResult, check_exception};
use crate::property_names::PropertyNameArray;
use crate::string::JscString;
use crate::value::{JscValue, raw_args};

macro_rules! attribute_flags {
    (
        $(#[$meta:meta])*
        $name:ident($raw:ty) {
            $($(#[$flag_meta:meta])* $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($raw);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: Self = Self($value);)*

            /// Build from raw engine bits
            pub const fn from_bits(bits: $raw) -> Self {
                Self(bits)
            }

            /// The raw engine bits
            pub const fn bits(self) -> $raw {
                self.0
            }

            /// Whether every bit of `other` is set
            pub const fn contains(self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }
    };
}

attribute_flags! {
    /// Attributes of a property set through the API
    PropertyAttributes(JSPropertyAttributes) {
        NONE = K_JS_PROPERTY_ATTRIBUTE_NONE;
        /// Assignments are ignored (or throw in strict mode)
        READ_ONLY = K_JS_PROPERTY_ATTRIBUTE_READ_ONLY;
        /// Hidden from `for...in` and `Object.keys`
        DONT_ENUM = K_JS_PROPERTY_ATTRIBUTE_DONT_ENUM;
        /// `delete` fails
        DONT_DELETE = K_JS_PROPERTY_ATTRIBUTE_DONT_DELETE;
    }
}

attribute_flags! {
    /// Attributes of a class definition
    ClassAttributes(JSClassAttributes) {
        NONE = K_JS_CLASS_ATTRIBUTE_NONE;
        /// Objects start with `Object.prototype` instead of a class prototype
        NO_AUTOMATIC_PROTOTYPE = K_JS_CLASS_ATTRIBUTE_NO_AUTOMATIC_PROTOTYPE;
    }
}

/// A JavaScript object with automatic GC protection
///
/// Every object is also a value: [`JscObject::as_value`] borrows it as one and
/// `JscValue::from` converts it without touching its protection.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because JavaScript objects are tied to
/// their context's thread. Cross-thread access causes undefined behavior.
pub struct JscObject {
    object: JSObjectRef,
    ctx: JscContext,
}

impl JscObject {
    /// Create a new JscObject wrapper
    ///
    /// # Safety
    /// `object` must be null or a valid JSObjectRef from `ctx`
    pub unsafe fn new(ctx: &JscContext, object: JSObjectRef) -> Self {
        if !object.is_null() {
            // SAFETY: ctx and object are valid per preconditions
            unsafe { JSValueProtect(ctx.raw(), object) };
        }
        Self {
            object,
            ctx: ctx.clone(),
        }
    }

    /// Wrap an engine result, treating null as a failed call
    pub(crate) unsafe fn from_result(
        ctx: &JscContext,
        object: JSObjectRef,
        operation: &str,
    ) -> JscResult<Self> {
        if object.is_null() {
            return Err(JscError::null_pointer(operation));
        }
        // SAFETY: object is a live object of ctx
        Ok(unsafe { Self::new(ctx, object) })
    }

    /// Create an empty JavaScript object
    pub fn empty(ctx: &JscContext) -> Self {
        // SAFETY: JSObjectMake with null class creates a plain object
        unsafe { Self::new(ctx, JSObjectMake(ctx.raw(), ptr::null_mut(), ptr::null_mut())) }
    }

    /// Create an instance of `class` carrying `data` as its private data
    ///
    /// The class callbacks own the interpretation of `data`; a finalize
    /// callback is the place to free it.
    ///
    /// Calling it outside an `unsafe` block does not compile:
    ///
    /// ```compile_fail
    /// use jscore::{ClassDefinition, JscContext, JscObject};
    ///
    /// let ctx = JscContext::new().unwrap();
    /// let class = ClassDefinition::new("Slot").build().unwrap();
    /// let _ = JscObject::with_class(&ctx, &class, std::ptr::null_mut());
    /// ```
    ///
    /// # Safety
    /// `data` must be null or a pointer that every callback of `class` (and
    /// of its parents) accepts as this object's private data, valid for as
    /// long as those callbacks may read it.
    pub unsafe fn with_class(
        ctx: &JscContext,
        class: &JscClass,
        data: *mut c_void,
    ) -> JscResult<Self> {
        // SAFETY: ctx and class are valid
        unsafe {
            let object = JSObjectMake(ctx.raw(), class.raw(), data);
            Self::from_result(ctx, object, "JSObjectMake")
        }
    }

    /// Create a constructor whose `prototype` is the class prototype and
    /// whose `new` runs `callback`
    pub fn make_constructor(
        ctx: &JscContext,
        class: Option<&JscClass>,
        callback: JSObjectCallAsConstructorCallback,
    ) -> JscResult<Self> {
        let class = class.map_or(ptr::null_mut(), JscClass::raw);
        // SAFETY: ctx is valid, class is null or valid
        unsafe {
            let constructor = JSObjectMakeConstructor(ctx.raw(), class, callback);
            Self::from_result(ctx, constructor, "JSObjectMakeConstructor")
        }
    }

    /// Get the raw object reference
    pub fn raw(&self) -> JSObjectRef {
        self.object
    }

    /// Get the context
    pub fn context(&self) -> &JscContext {
        &self.ctx
    }

    fn raw_ctx(&self) -> JSContextRef {
        self.ctx.raw()
    }

    /// View this object as a value
    pub fn as_value(&self) -> JscValue {
        // SAFETY: self.ctx and self.object are valid
        unsafe { JscValue::new(&self.ctx, self.object) }
    }

    /// Check if the object is a function
    pub fn is_function(&self) -> bool {
        // SAFETY: self.ctx and self.object are valid
        unsafe { JSObjectIsFunction(self.raw_ctx(), self.object) }
    }

    /// Check if the object can be used with `new`
    pub fn is_constructor(&self) -> bool {
        // SAFETY: self.ctx and self.object are valid
        unsafe { JSObjectIsConstructor(self.raw_ctx(), self.object) }
    }

    /// Check if the object is an array
    pub fn is_array(&self) -> bool {
        // SAFETY: self.ctx and self.object are valid
        unsafe { JSValueIsArray(self.raw_ctx(), self.object) }
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> JscResult<JscValue> {
        let name = JscString::new(name)?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and name are valid
        unsafe {
            let value = JSObjectGetProperty(self.raw_ctx(), self.object, name.raw(), &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            JscValue::from_result(&self.ctx, value, "JSObjectGetProperty")
        }
    }

    /// Set a property by name
    pub fn set(&self, name: &str, value: &JscValue) -> JscResult<()> {
        self.set_with_attributes(name, value, PropertyAttributes::NONE)
    }

    /// Set a property by name with explicit attributes
    pub fn set_with_attributes(
        &self,
        name: &str,
        value: &JscValue,
        attributes: PropertyAttributes,
    ) -> JscResult<()> {
        let name = JscString::new(name)?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object, name and value are valid
        unsafe {
            JSObjectSetProperty(
                self.raw_ctx(),
                self.object,
                name.raw(),
                value.raw(),
                attributes.bits(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)
        }
    }

    /// Check whether the object or its prototype chain has a property
    pub fn has(&self, name: &str) -> JscResult<bool> {
        let name = JscString::new(name)?;
        // SAFETY: ctx, object and name are valid
        Ok(unsafe { JSObjectHasProperty(self.raw_ctx(), self.object, name.raw()) })
    }

    /// Delete a property; returns false if it is not deletable
    pub fn delete(&self, name: &str) -> JscResult<bool> {
        let name = JscString::new(name)?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and name are valid
        unsafe {
            let deleted =
                JSObjectDeleteProperty(self.raw_ctx(), self.object, name.raw(), &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(deleted)
        }
    }

    /// Get a property by key value (string, number or symbol)
    pub fn get_key(&self, key: &JscValue) -> JscResult<JscValue> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and key are valid
        unsafe {
            let value =
                JSObjectGetPropertyForKey(self.raw_ctx(), self.object, key.raw(), &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            JscValue::from_result(&self.ctx, value, "JSObjectGetPropertyForKey")
        }
    }

    /// Set a property by key value
    pub fn set_key(
        &self,
        key: &JscValue,
        value: &JscValue,
        attributes: PropertyAttributes,
    ) -> JscResult<()> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object, key and value are valid
        unsafe {
            JSObjectSetPropertyForKey(
                self.raw_ctx(),
                self.object,
                key.raw(),
                value.raw(),
                attributes.bits(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)
        }
    }

    /// Check for a property by key value
    pub fn has_key(&self, key: &JscValue) -> JscResult<bool> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and key are valid
        unsafe {
            let found =
                JSObjectHasPropertyForKey(self.raw_ctx(), self.object, key.raw(), &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(found)
        }
    }

    /// Delete a property by key value
    pub fn delete_key(&self, key: &JscValue) -> JscResult<bool> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and key are valid
        unsafe {
            let deleted =
                JSObjectDeletePropertyForKey(self.raw_ctx(), self.object, key.raw(), &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(deleted)
        }
    }

    /// Get array element by index
    pub fn get_index(&self, index: u32) -> JscResult<JscValue> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx and object are valid
        unsafe {
            let value =
                JSObjectGetPropertyAtIndex(self.raw_ctx(), self.object, index, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            JscValue::from_result(&self.ctx, value, "JSObjectGetPropertyAtIndex")
        }
    }

    /// Set array element by index
    pub fn set_index(&self, index: u32, value: &JscValue) -> JscResult<()> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx, object and value are valid
        unsafe {
            JSObjectSetPropertyAtIndex(
                self.raw_ctx(),
                self.object,
                index,
                value.raw(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)
        }
    }

    /// Get array length (for array objects)
    pub fn length(&self) -> JscResult<u32> {
        let len_value = self.get("length")?;
        let len = len_value.to_number()?;
        Ok(len as u32)
    }

    /// Get the prototype
    pub fn prototype(&self) -> JscValue {
        // SAFETY: ctx and object are valid; every object has a prototype value
        unsafe { JscValue::new(&self.ctx, JSObjectGetPrototype(self.raw_ctx(), self.object)) }
    }

    /// Replace the prototype; non-object values other than null are ignored
    pub fn set_prototype(&self, prototype: &JscValue) {
        // SAFETY: ctx, object and prototype are valid
        unsafe { JSObjectSetPrototype(self.raw_ctx(), self.object, prototype.raw()) }
    }

    /// Get the private data pointer, or null if the class stores none
    pub fn private_data(&self) -> *mut c_void {
        // SAFETY: self.object is valid
        unsafe { JSObjectGetPrivate(self.object) }
    }

    /// Replace the private data pointer
    ///
    /// Returns false if the object's class does not allocate private storage.
    /// The previous pointer is not freed.
    ///
    /// ```compile_fail
    /// use jscore::JscContext;
    ///
    /// let ctx = JscContext::new().unwrap();
    /// let f = ctx.create_closure("f", |ctx, _, _| Ok(ctx.undefined())).unwrap();
    /// f.set_private_data(std::ptr::null_mut());
    /// ```
    ///
    /// # Safety
    /// `data` must be null or a pointer the callbacks of this object's class
    /// accept as its private data. Functions from
    /// [`JscContext::create_closure`] own their slot and must never be
    /// given a different pointer.
    pub unsafe fn set_private_data(&self, data: *mut c_void) -> bool {
        // SAFETY: self.object is valid
        unsafe { JSObjectSetPrivate(self.object, data) }
    }

    /// Call this object as a function with arguments
    pub fn call(&self, this: Option<&JscObject>, args: &[&JscValue]) -> JscResult<JscValue> {
        if !self.is_function() {
            return Err(JscError::type_error("function", "non-function"));
        }

        let this_obj = this.map_or(ptr::null_mut(), |o| o.object);
        let arg_values = raw_args(args);
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: ctx and object are valid, args are valid values
        unsafe {
            let result = JSObjectCallAsFunction(
                self.raw_ctx(),
                self.object,
                this_obj,
                arg_values.len(),
                arg_values.as_ptr(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)?;
            JscValue::from_result(&self.ctx, result, "JSObjectCallAsFunction")
        }
    }

    /// Call this object as a constructor, as `new` would
    pub fn construct(&self, args: &[&JscValue]) -> JscResult<JscObject> {
        if !self.is_constructor() {
            return Err(JscError::type_error("constructor", "non-constructor"));
        }

        let arg_values = raw_args(args);
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: ctx and object are valid, args are valid values
        unsafe {
            let result = JSObjectCallAsConstructor(
                self.raw_ctx(),
                self.object,
                arg_values.len(),
                arg_values.as_ptr(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)?;
            Self::from_result(&self.ctx, result, "JSObjectCallAsConstructor")
        }
    }

    /// Copy the names of the object's enumerable properties
    pub fn property_name_array(&self) -> JscResult<PropertyNameArray> {
        // SAFETY: ctx and object are valid; the copy follows the Create Rule
        unsafe {
            PropertyNameArray::from_raw(JSObjectCopyPropertyNames(self.raw_ctx(), self.object))
        }
    }

    /// The names of the object's enumerable properties
    pub fn property_names(&self) -> JscResult<Vec<String>> {
        Ok(self
            .property_name_array()?
            .iter()
            .map(|name| name.to_string())
            .collect())
    }
}

impl From<JscObject> for JscValue {
    fn from(object: JscObject) -> Self {
        let object = ManuallyDrop::new(object);
        // SAFETY: the object's protection and context reference move into the value
        unsafe { JscValue::adopt(ptr::read(&object.ctx), object.object) }
    }
}

impl Clone for JscObject {
    fn clone(&self) -> Self {
        // SAFETY: self.object is live; protection nests
        unsafe { Self::new(&self.ctx, self.object) }
    }
}

impl Drop for JscObject {
    fn drop(&mut self) {
        if !self.object.is_null() {
            // SAFETY: object was protected in new(), now unprotecting
            unsafe { JSValueUnprotect(self.ctx.raw(), self.object) };
        }
    }
}

impl PartialEq for JscObject {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object
    }
}

impl Eq for JscObject {}

impl fmt::Debug for JscObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JscObject({:?})", self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);
        assert!(!obj.is_function());
        assert!(!obj.is_array());
        assert!(!obj.is_constructor());
    }

    #[test]
    fn test_property_access() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);

        let value = ctx.number(42.0);
        obj.set("foo", &value).unwrap();

        assert!(obj.has("foo").unwrap());
        assert!(!obj.has("bar").unwrap());

        let got = obj.get("foo").unwrap();
        assert_eq!(got.to_number().unwrap(), 42.0);
        assert!(obj.get("bar").unwrap().is_undefined());
    }

    #[test]
    fn test_delete_property() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);

        let value = ctx.number(42.0);
        obj.set("foo", &value).unwrap();
        assert!(obj.has("foo").unwrap());

        assert!(obj.delete("foo").unwrap());
        assert!(!obj.has("foo").unwrap());
    }

    #[test]
    fn test_property_attributes() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);
        let attrs = PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE;
        obj.set_with_attributes("fixed", &ctx.number(1.0), attrs)
            .unwrap();

        ctx.set_global("obj", &obj.as_value()).unwrap();
        ctx.eval("obj.fixed = 2").unwrap();
        assert_eq!(obj.get("fixed").unwrap().to_number().unwrap(), 1.0);
        assert!(!obj.delete("fixed").unwrap());

        obj.set_with_attributes("hidden", &ctx.number(3.0), PropertyAttributes::DONT_ENUM)
            .unwrap();
        assert_eq!(obj.property_names().unwrap(), vec!["fixed".to_string()]);
    }

    #[test]
    fn test_attribute_flags() {
        let mut attrs = PropertyAttributes::READ_ONLY;
        attrs |= PropertyAttributes::DONT_ENUM;
        assert!(attrs.contains(PropertyAttributes::READ_ONLY));
        assert!(attrs.contains(PropertyAttributes::DONT_ENUM));
        assert!(!attrs.contains(PropertyAttributes::DONT_DELETE));
        assert_eq!(attrs.bits(), (1 << 1) | (1 << 2));
        assert_eq!(PropertyAttributes::default(), PropertyAttributes::NONE);
        assert_eq!(
            ClassAttributes::from_bits(2),
            ClassAttributes::NO_AUTOMATIC_PROTOTYPE
        );
    }

    #[test]
    fn test_key_access() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);
        let symbol = ctx.symbol("secret").unwrap();

        obj.set_key(&symbol, &ctx.string("hidden").unwrap(), PropertyAttributes::NONE)
            .unwrap();
        assert!(obj.has_key(&symbol).unwrap());
        assert_eq!(obj.get_key(&symbol).unwrap().to_string().unwrap(), "hidden");
        // Symbol keys never show up as names
        assert!(obj.property_names().unwrap().is_empty());

        let numeric = ctx.number(7.0);
        obj.set_key(&numeric, &ctx.boolean(true), PropertyAttributes::NONE)
            .unwrap();
        assert!(obj.get("7").unwrap().to_bool());

        assert!(obj.delete_key(&symbol).unwrap());
        assert!(!obj.has_key(&symbol).unwrap());
    }

    #[test]
    fn test_array_access() {
        let ctx = JscContext::new().unwrap();
        let result = ctx.eval("[1, 2, 3]").unwrap();
        let array = result.to_object().unwrap();
        assert!(array.is_array());
        assert_eq!(array.length().unwrap(), 3);
        assert_eq!(array.get_index(1).unwrap().to_number().unwrap(), 2.0);

        array.set_index(5, &ctx.number(6.0)).unwrap();
        assert_eq!(array.length().unwrap(), 6);
        assert!(array.get_index(4).unwrap().is_undefined());
    }

    #[test]
    fn test_prototype() {
        let ctx = JscContext::new().unwrap();
        let base = ctx.eval("({ greet() { return 'hi'; } })").unwrap();
        let obj = JscObject::empty(&ctx);
        obj.set_prototype(&base);

        assert!(obj.prototype().strict_eq(&base));
        let greet = obj.get("greet").unwrap().to_object().unwrap();
        assert_eq!(greet.call(Some(&obj), &[]).unwrap().to_string().unwrap(), "hi");
    }

    #[test]
    fn test_call_function() {
        let ctx = JscContext::new().unwrap();
        let func = ctx
            .eval("(function (a, b) { return this.base + a + b; })")
            .unwrap()
            .to_object()
            .unwrap();
        let receiver = ctx.eval("({ base: 100 })").unwrap().to_object().unwrap();

        let result = func
            .call(Some(&receiver), &[&ctx.number(1.0), &ctx.number(2.0)])
            .unwrap();
        assert_eq!(result.to_number().unwrap(), 103.0);

        let not_a_function = JscObject::empty(&ctx);
        assert!(matches!(
            not_a_function.call(None, &[]),
            Err(JscError::TypeError { .. })
        ));
    }

    #[test]
    fn test_call_propagates_exception() {
        let ctx = JscContext::new().unwrap();
        let thrower = ctx
            .eval("(() => { throw new TypeError('bad arg'); })")
            .unwrap()
            .to_object()
            .unwrap();
        let err = thrower.call(None, &[]).unwrap_err();
        assert_eq!(err.error_type(), "TypeError");
        assert_eq!(err.js_message(), "bad arg");
    }

    #[test]
    fn test_construct() {
        let ctx = JscContext::new().unwrap();
        let map_ctor = ctx.get_global("Map").unwrap().to_object().unwrap();
        assert!(map_ctor.is_constructor());

        let map = map_ctor.construct(&[]).unwrap();
        assert_eq!(map.get("size").unwrap().to_number().unwrap(), 0.0);

        let arrow = ctx.eval("(() => 1)").unwrap().to_object().unwrap();
        assert!(arrow.is_function());
        assert!(!arrow.is_constructor());
        assert!(arrow.construct(&[]).is_err());
    }

    #[test]
    fn test_property_names() {
        let ctx = JscContext::new().unwrap();
        let obj = ctx.eval("({ a: 1, b: 2, c: 3 })").unwrap().to_object().unwrap();
        assert_eq!(obj.property_names().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_object_is_a_value() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);
        let raw = obj.raw();

        let borrowed = obj.as_value();
        assert!(borrowed.is_object());

        let value: JscValue = obj.into();
        assert_eq!(value.raw(), raw as JSValueRef);
        assert!(value.strict_eq(&borrowed));
    }

    #[test]
    fn test_private_data_on_plain_object() {
        let ctx = JscContext::new().unwrap();
        let obj = JscObject::empty(&ctx);
        assert!(obj.private_data().is_null());
        let mut slot = 0u8;
        assert!(!unsafe { obj.set_private_data(&mut slot as *mut u8 as *mut c_void) });
    }
}
