//! Custom object classes
//!
//! [`ClassDefinition`] collects the pieces of a `JSClassDefinition` with
//! owned names; [`ClassDefinition::build`] hands them to the engine, which
//! copies what it needs.

use jscore_sys::*;
use std::ffi::CString;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use tracing::debug;

use crate::error::{JscError, JscResult};
use crate::object::{ClassAttributes, PropertyAttributes};

struct StaticValue {
    name: String,
    get: JSObjectGetPropertyCallback,
    set: JSObjectSetPropertyCallback,
    attributes: PropertyAttributes,
}

struct StaticFunction {
    name: String,
    call: JSObjectCallAsFunctionCallback,
    attributes: PropertyAttributes,
}

/// Builder for a JavaScript class
///
/// # Example
///
/// ```no_run
/// use jscore::{ClassDefinition, JscContext, JscObject};
/// use jscore::sys::{JSContextRef, JSObjectRef, JSValueRef, JSValueMakeNumber};
///
/// unsafe extern "C" fn answer(
///     ctx: JSContextRef,
///     _function: JSObjectRef,
///     _this: JSObjectRef,
///     _argc: usize,
///     _argv: *const JSValueRef,
///     _exception: *mut JSValueRef,
/// ) -> JSValueRef {
///     unsafe { JSValueMakeNumber(ctx, 42.0) }
/// }
///
/// let class = ClassDefinition::new("Oracle")
///     .static_function("answer", Some(answer), Default::default())
///     .build()?;
///
/// let ctx = JscContext::new()?;
/// // SAFETY: the class has no callbacks that read private data
/// let oracle = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }?;
/// ctx.set_global("oracle", &oracle.into())?;
/// assert_eq!(ctx.eval("oracle.answer()")?.to_number()?, 42.0);
/// # Ok::<(), jscore::JscError>(())
/// ```
pub struct ClassDefinition {
    name: String,
    parent: Option<JscClass>,
    static_values: Vec<StaticValue>,
    static_functions: Vec<StaticFunction>,
    callbacks: JSClassDefinition,
}

impl ClassDefinition {
    /// Start a class definition
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            static_values: Vec::new(),
            static_functions: Vec::new(),
            callbacks: JSClassDefinition::default(),
        }
    }

    /// Inherit callbacks and statics from `parent`
    pub fn parent(mut self, parent: &JscClass) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Set class attributes
    pub fn attributes(mut self, attributes: ClassAttributes) -> Self {
        self.callbacks.attributes = attributes.bits();
        self
    }

    /// Add a static value property served by callbacks
    pub fn static_value(
        mut self,
        name: impl Into<String>,
        get: JSObjectGetPropertyCallback,
        set: JSObjectSetPropertyCallback,
        attributes: PropertyAttributes,
    ) -> Self {
        self.static_values.push(StaticValue {
            name: name.into(),
            get,
            set,
            attributes,
        });
        self
    }

    /// Add a static function property
    pub fn static_function(
        mut self,
        name: impl Into<String>,
        call: JSObjectCallAsFunctionCallback,
        attributes: PropertyAttributes,
    ) -> Self {
        self.static_functions.push(StaticFunction {
            name: name.into(),
            call,
            attributes,
        });
        self
    }

    pub fn initialize(mut self, callback: JSObjectInitializeCallback) -> Self {
        self.callbacks.initialize = callback;
        self
    }

    /// Called when an instance is collected; may run on any thread
    pub fn finalize(mut self, callback: JSObjectFinalizeCallback) -> Self {
        self.callbacks.finalize = callback;
        self
    }

    pub fn has_property(mut self, callback: JSObjectHasPropertyCallback) -> Self {
        self.callbacks.has_property = callback;
        self
    }

    pub fn get_property(mut self, callback: JSObjectGetPropertyCallback) -> Self {
        self.callbacks.get_property = callback;
        self
    }

    pub fn set_property(mut self, callback: JSObjectSetPropertyCallback) -> Self {
        self.callbacks.set_property = callback;
        self
    }

    pub fn delete_property(mut self, callback: JSObjectDeletePropertyCallback) -> Self {
        self.callbacks.delete_property = callback;
        self
    }

    /// Add names to enumeration via a [`PropertyNameAccumulator`](crate::PropertyNameAccumulator)
    pub fn get_property_names(mut self, callback: JSObjectGetPropertyNamesCallback) -> Self {
        self.callbacks.get_property_names = callback;
        self
    }

    pub fn call_as_function(mut self, callback: JSObjectCallAsFunctionCallback) -> Self {
        self.callbacks.call_as_function = callback;
        self
    }

    pub fn call_as_constructor(mut self, callback: JSObjectCallAsConstructorCallback) -> Self {
        self.callbacks.call_as_constructor = callback;
        self
    }

    pub fn has_instance(mut self, callback: JSObjectHasInstanceCallback) -> Self {
        self.callbacks.has_instance = callback;
        self
    }

    pub fn convert_to_type(mut self, callback: JSObjectConvertToTypeCallback) -> Self {
        self.callbacks.convert_to_type = callback;
        self
    }

    /// Create the class
    pub fn build(&self) -> JscResult<JscClass> {
        let class_name = CString::new(self.name.as_str())?;

        let value_names = self
            .static_values
            .iter()
            .map(|v| CString::new(v.name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut values: Vec<JSStaticValue> = self
            .static_values
            .iter()
            .zip(&value_names)
            .map(|(v, name)| JSStaticValue {
                name: name.as_ptr(),
                get_property: v.get,
                set_property: v.set,
                attributes: v.attributes.bits(),
            })
            .collect();
        values.push(JSStaticValue::NULL);

        let function_names = self
            .static_functions
            .iter()
            .map(|f| CString::new(f.name.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut functions: Vec<JSStaticFunction> = self
            .static_functions
            .iter()
            .zip(&function_names)
            .map(|(f, name)| JSStaticFunction {
                name: name.as_ptr(),
                call_as_function: f.call,
                attributes: f.attributes.bits(),
            })
            .collect();
        functions.push(JSStaticFunction::NULL);

        let mut definition = self.callbacks;
        definition.class_name = class_name.as_ptr();
        definition.parent_class = self.parent.as_ref().map_or(ptr::null_mut(), JscClass::raw);
        definition.static_values = if self.static_values.is_empty() {
            ptr::null()
        } else {
            values.as_ptr()
        };
        definition.static_functions = if self.static_functions.is_empty() {
            ptr::null()
        } else {
            functions.as_ptr()
        };

        // SAFETY: every pointer in definition outlives the call, and the
        // engine copies names and tables before returning
        let raw = unsafe { JSClassCreate(&definition) };
        if raw.is_null() {
            return Err(JscError::null_pointer("JSClassCreate"));
        }

        debug!(
            class = %self.name,
            static_values = self.static_values.len(),
            static_functions = self.static_functions.len(),
            "Created JavaScriptCore class"
        );
        Ok(JscClass {
            raw,
            _not_send: PhantomData,
        })
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("static_values", &self.static_values.len())
            .field("static_functions", &self.static_functions.len())
            .finish()
    }
}

/// Owned reference to a JSClassRef
pub struct JscClass {
    raw: JSClassRef,
    _not_send: PhantomData<*mut ()>,
}

impl JscClass {
    /// Take ownership of a class returned by `JSClassCreate`
    ///
    /// # Safety
    /// `raw` must be null or a JSClassRef whose reference the caller owns.
    pub unsafe fn from_raw(raw: JSClassRef) -> JscResult<Self> {
        if raw.is_null() {
            return Err(JscError::null_pointer("JSClassCreate"));
        }
        Ok(Self {
            raw,
            _not_send: PhantomData,
        })
    }

    /// Get the raw JSClassRef
    pub fn raw(&self) -> JSClassRef {
        self.raw
    }
}

impl Clone for JscClass {
    fn clone(&self) -> Self {
        // SAFETY: self.raw is valid
        let raw = unsafe { JSClassRetain(self.raw) };
        Self {
            raw,
            _not_send: PhantomData,
        }
    }
}

impl Drop for JscClass {
    fn drop(&mut self) {
        // SAFETY: we own one reference
        unsafe { JSClassRelease(self.raw) };
    }
}

impl PartialEq for JscClass {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for JscClass {}

impl fmt::Debug for JscClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JscClass").field(&self.raw).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextOptions, JscContext, JscObject, JscValue};
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicUsize, Ordering};

    unsafe extern "C" fn read_counter(
        ctx: JSContextRef,
        object: JSObjectRef,
        _name: JSStringRef,
        _exception: *mut JSValueRef,
    ) -> JSValueRef {
        unsafe {
            let counter = JSObjectGetPrivate(object) as *const u32;
            let value = if counter.is_null() { -1.0 } else { *counter as f64 };
            JSValueMakeNumber(ctx, value)
        }
    }

    unsafe extern "C" fn double_it(
        ctx: JSContextRef,
        _function: JSObjectRef,
        _this: JSObjectRef,
        argc: usize,
        argv: *const JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef {
        unsafe {
            if argc == 0 {
                return JSValueMakeUndefined(ctx);
            }
            let n = JSValueToNumber(ctx, *argv, exception);
            JSValueMakeNumber(ctx, n * 2.0)
        }
    }

    unsafe extern "C" fn make_instance(
        ctx: JSContextRef,
        _constructor: JSObjectRef,
        _argc: usize,
        _argv: *const JSValueRef,
        _exception: *mut JSValueRef,
    ) -> JSObjectRef {
        unsafe {
            let object = JSObjectMake(ctx, std::ptr::null_mut(), std::ptr::null_mut());
            let name = crate::JscString::new("made").unwrap();
            JSObjectSetProperty(
                ctx,
                object,
                name.raw(),
                JSValueMakeBoolean(ctx, true),
                K_JS_PROPERTY_ATTRIBUTE_NONE,
                std::ptr::null_mut(),
            );
            object
        }
    }

    static INITIALIZED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_initialize(_ctx: JSContextRef, _object: JSObjectRef) {
        INITIALIZED.fetch_add(1, Ordering::SeqCst);
    }

    unsafe fn name_of(name: JSStringRef) -> String {
        unsafe { crate::js_string_to_rust(name) }
    }

    unsafe extern "C" fn name_length(
        ctx: JSContextRef,
        _object: JSObjectRef,
        name: JSStringRef,
        _exception: *mut JSValueRef,
    ) -> JSValueRef {
        unsafe {
            let name = name_of(name);
            match name.strip_prefix("dyn_") {
                Some(rest) => JSValueMakeNumber(ctx, rest.len() as f64),
                None => std::ptr::null(),
            }
        }
    }

    unsafe extern "C" fn has_ghost(
        _ctx: JSContextRef,
        _object: JSObjectRef,
        name: JSStringRef,
    ) -> bool {
        unsafe { name_of(name) == "ghost" }
    }

    static CAPTURED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn capture_writes(
        ctx: JSContextRef,
        _object: JSObjectRef,
        name: JSStringRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool {
        unsafe {
            if name_of(name) != "captured" {
                return false;
            }
            let n = JSValueToNumber(ctx, value, exception);
            CAPTURED.store(n as usize, Ordering::SeqCst);
            true
        }
    }

    static EPHEMERAL_DELETES: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn delete_ephemeral(
        _ctx: JSContextRef,
        _object: JSObjectRef,
        name: JSStringRef,
        _exception: *mut JSValueRef,
    ) -> bool {
        unsafe {
            if name_of(name) != "ephemeral" {
                return false;
            }
        }
        EPHEMERAL_DELETES.fetch_add(1, Ordering::SeqCst);
        true
    }

    unsafe extern "C" fn above_ten(
        ctx: JSContextRef,
        _constructor: JSObjectRef,
        candidate: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool {
        unsafe {
            JSValueIsNumber(ctx, candidate) && JSValueToNumber(ctx, candidate, exception) > 10.0
        }
    }

    unsafe extern "C" fn numeric_forty_two(
        ctx: JSContextRef,
        _object: JSObjectRef,
        type_: JSType,
        _exception: *mut JSValueRef,
    ) -> JSValueRef {
        unsafe {
            if type_ == K_JS_TYPE_NUMBER {
                JSValueMakeNumber(ctx, 42.0)
            } else {
                std::ptr::null()
            }
        }
    }

    static FINALIZED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn count_finalize(_object: JSObjectRef) {
        FINALIZED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_build_and_identity() {
        let class = ClassDefinition::new("Plain").build().unwrap();
        let other = ClassDefinition::new("Plain").build().unwrap();
        assert_eq!(class, class.clone());
        assert_ne!(class, other);
    }

    #[test]
    fn test_invalid_name() {
        let err = ClassDefinition::new("Bad\0Name").build().unwrap_err();
        assert!(matches!(err, JscError::StringEncoding(_)));
    }

    #[test]
    fn test_static_value_reads_private_data() {
        let class = ClassDefinition::new("Counter")
            .static_value("count", Some(read_counter), None, PropertyAttributes::READ_ONLY)
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let count = Box::into_raw(Box::new(5u32));
        let counter = unsafe { JscObject::with_class(&ctx, &class, count as *mut c_void) }.unwrap();
        ctx.set_global("counter", &counter.clone().into()).unwrap();

        assert_eq!(ctx.eval("counter.count").unwrap().to_number().unwrap(), 5.0);
        unsafe { *count = 9 };
        assert_eq!(ctx.eval("counter.count").unwrap().to_number().unwrap(), 9.0);

        // Detach before freeing the counter
        assert!(unsafe { counter.set_private_data(std::ptr::null_mut()) });
        drop(unsafe { Box::from_raw(count) });
        assert_eq!(ctx.eval("counter.count").unwrap().to_number().unwrap(), -1.0);
    }

    #[test]
    fn test_static_function_and_class_check() {
        let class = ClassDefinition::new("Doubler")
            .static_function("double", Some(double_it), PropertyAttributes::DONT_ENUM)
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let doubler = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        assert!(doubler.as_value().is_object_of_class(&class));
        assert!(!ctx.create_object().as_value().is_object_of_class(&class));

        ctx.set_global("doubler", &doubler.into()).unwrap();
        assert_eq!(ctx.eval("doubler.double(21)").unwrap().to_number().unwrap(), 42.0);
    }

    #[test]
    fn test_parent_class_statics_are_inherited() {
        let parent = ClassDefinition::new("Base")
            .static_function("double", Some(double_it), PropertyAttributes::NONE)
            .build()
            .unwrap();
        let child = ClassDefinition::new("Derived").parent(&parent).build().unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &child, std::ptr::null_mut()) }.unwrap();
        assert!(object.as_value().is_object_of_class(&parent));
        ctx.set_global("derived", &object.into()).unwrap();
        assert_eq!(ctx.eval("derived.double(4)").unwrap().to_number().unwrap(), 8.0);
    }

    #[test]
    fn test_call_as_function_class() {
        let class = ClassDefinition::new("Callable")
            .call_as_function(Some(double_it))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let callable =
            unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        assert!(callable.is_function());
        let result = callable.call(None, &[&ctx.number(1.5)]).unwrap();
        assert_eq!(result.to_number().unwrap(), 3.0);
    }

    #[test]
    fn test_make_constructor() {
        let class = ClassDefinition::new("Widget").build().unwrap();
        let ctx = JscContext::new().unwrap();
        let constructor =
            JscObject::make_constructor(&ctx, Some(&class), Some(make_instance)).unwrap();
        assert!(constructor.is_constructor());

        let made = constructor.construct(&[]).unwrap();
        assert!(made.get("made").unwrap().to_bool());
    }

    #[test]
    fn test_initialize_runs_per_instance() {
        let class = ClassDefinition::new("Tracked")
            .initialize(Some(count_initialize))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let before = INITIALIZED.load(Ordering::SeqCst);
        let _a = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        let _b = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        assert_eq!(INITIALIZED.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn test_no_automatic_prototype() {
        let class = ClassDefinition::new("Bare")
            .attributes(ClassAttributes::NO_AUTOMATIC_PROTOTYPE)
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        let object_prototype = ctx.eval("Object.prototype").unwrap();
        assert!(object.prototype().strict_eq(&object_prototype));
    }

    #[test]
    fn test_custom_global_class() {
        let global = ClassDefinition::new("CustomGlobal")
            .static_function("double", Some(double_it), PropertyAttributes::NONE)
            .build()
            .unwrap();
        let ctx = JscContext::with_options(ContextOptions::new().global_class(global.clone()))
            .unwrap();

        let global_value: JscValue = ctx.global_object().into();
        assert!(global_value.is_object_of_class(&global));
        assert_eq!(ctx.eval("double(10)").unwrap().to_number().unwrap(), 20.0);
    }

    #[test]
    fn test_get_property_callback() {
        let class = ClassDefinition::new("Dynamic")
            .get_property(Some(name_length))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        object.set("plain", &ctx.number(1.0)).unwrap();
        ctx.set_global("dynamic", &object.clone().into()).unwrap();

        assert_eq!(ctx.eval("dynamic.dyn_abc").unwrap().to_number().unwrap(), 3.0);
        assert_eq!(object.get("dyn_").unwrap().to_number().unwrap(), 0.0);
        // Null from the callback falls through to ordinary lookup
        assert_eq!(object.get("plain").unwrap().to_number().unwrap(), 1.0);
        assert!(ctx.eval("dynamic.missing").unwrap().is_undefined());
    }

    #[test]
    fn test_has_property_callback() {
        let class = ClassDefinition::new("Haunted")
            .has_property(Some(has_ghost))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        ctx.set_global("haunted", &object.clone().into()).unwrap();

        assert!(object.has("ghost").unwrap());
        assert!(!object.has("other").unwrap());
        assert!(ctx.eval("'ghost' in haunted").unwrap().to_bool());
        assert!(!ctx.eval("'other' in haunted").unwrap().to_bool());
    }

    #[test]
    fn test_set_property_callback() {
        let class = ClassDefinition::new("Sink")
            .set_property(Some(capture_writes))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        ctx.set_global("sink", &object.clone().into()).unwrap();

        ctx.eval("sink.captured = 12; sink.other = 3").unwrap();
        assert_eq!(CAPTURED.load(Ordering::SeqCst), 12);
        // Handled writes are not stored on the object
        assert!(!object.has("captured").unwrap());
        assert_eq!(object.get("other").unwrap().to_number().unwrap(), 3.0);
    }

    #[test]
    fn test_delete_property_callback() {
        let class = ClassDefinition::new("Volatile")
            .delete_property(Some(delete_ephemeral))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let object = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        object.set("kept", &ctx.number(1.0)).unwrap();
        ctx.set_global("volatile", &object.clone().into()).unwrap();

        let before = EPHEMERAL_DELETES.load(Ordering::SeqCst);
        assert!(ctx.eval("delete volatile.ephemeral").unwrap().to_bool());
        assert!(object.delete("ephemeral").unwrap());
        assert_eq!(EPHEMERAL_DELETES.load(Ordering::SeqCst) - before, 2);

        assert!(object.delete("kept").unwrap());
        assert!(!object.has("kept").unwrap());
        assert_eq!(EPHEMERAL_DELETES.load(Ordering::SeqCst) - before, 2);
    }

    #[test]
    fn test_has_instance_callback() {
        let class = ClassDefinition::new("Big")
            .has_instance(Some(above_ten))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let big = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        ctx.set_global("Big", &big.into()).unwrap();

        assert!(ctx.eval("11 instanceof Big").unwrap().to_bool());
        assert!(!ctx.eval("5 instanceof Big").unwrap().to_bool());
        assert!(!ctx.eval("'20' instanceof Big").unwrap().to_bool());
    }

    #[test]
    fn test_call_as_constructor_class() {
        let class = ClassDefinition::new("Maker")
            .call_as_constructor(Some(make_instance))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let maker = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        assert!(maker.is_constructor());
        assert!(maker.construct(&[]).unwrap().get("made").unwrap().to_bool());

        ctx.set_global("Maker", &maker.into()).unwrap();
        assert!(ctx.eval("new Maker().made").unwrap().to_bool());
    }

    #[test]
    fn test_convert_to_type_callback() {
        let class = ClassDefinition::new("Answer")
            .convert_to_type(Some(numeric_forty_two))
            .build()
            .unwrap();

        let ctx = JscContext::new().unwrap();
        let answer = unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
        assert_eq!(answer.as_value().to_number().unwrap(), 42.0);

        ctx.set_global("answer", &answer.into()).unwrap();
        assert_eq!(ctx.eval("answer * 2").unwrap().to_number().unwrap(), 84.0);
    }

    #[test]
    fn test_finalize_runs_when_context_is_destroyed() {
        let class = ClassDefinition::new("Finalized")
            .finalize(Some(count_finalize))
            .build()
            .unwrap();

        let before = FINALIZED.load(Ordering::SeqCst);
        {
            let ctx = JscContext::new().unwrap();
            for _ in 0..3 {
                let object =
                    unsafe { JscObject::with_class(&ctx, &class, std::ptr::null_mut()) }.unwrap();
                drop(object);
            }
        }
        // Releasing the last handle tears down the context's own heap
        assert_eq!(FINALIZED.load(Ordering::SeqCst) - before, 3);
    }
}
