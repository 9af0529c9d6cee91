//! Core JSC Context wrapper with safe evaluation and object management

use jscore_sys::*;
use parking_lot::Mutex;
use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::ptr;
use tracing::{debug, trace};

use crate::class::JscClass;
use crate::config::ContextOptions;
use crate::error::{JscError, JscResult, check_exception};
use crate::group::ContextGroup;
use crate::object::JscObject;
use crate::string::{JscString, js_string_to_rust};
use crate::value::{JscValue, raw_args};

/// JSC's initialization is not fully thread-safe, so context creation is serialized.
static CONTEXT_CREATION_LOCK: Mutex<()> = Mutex::new(());

/// A JavaScript execution context
///
/// Wraps a JSGlobalContext and provides safe methods for script evaluation
/// and value creation. Cloning retains the same global context; the context
/// is destroyed once the last clone (including those held by values and
/// objects created in it) is dropped.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because JavaScriptCore contexts are not
/// thread-safe. Accessing a context from multiple threads causes undefined behavior.
pub struct JscContext {
    ctx: JSGlobalContextRef,
    /// Marker to make this type !Send + !Sync
    _not_send: PhantomData<*mut ()>,
}

impl JscContext {
    /// Create a new JavaScript context in a group of its own
    pub fn new() -> JscResult<Self> {
        Self::with_options(ContextOptions::default())
    }

    /// Create a new JavaScript context inside `group`
    pub fn in_group(group: &ContextGroup) -> JscResult<Self> {
        Self::with_options(ContextOptions::new().group(group.clone()))
    }

    /// Create a new JavaScript context from explicit options
    pub fn with_options(options: ContextOptions) -> JscResult<Self> {
        let group = options
            .group
            .as_ref()
            .map_or(ptr::null(), ContextGroup::raw);
        let global_class = options
            .global_class
            .as_ref()
            .map_or(ptr::null_mut(), JscClass::raw);

        let ctx = {
            let _guard = CONTEXT_CREATION_LOCK.lock();
            // SAFETY: a null group and null class select the engine defaults
            unsafe { JSGlobalContextCreateInGroup(group, global_class) }
        };
        if ctx.is_null() {
            return Err(JscError::context_creation(
                "JSGlobalContextCreateInGroup returned null",
            ));
        }

        let context = Self {
            ctx,
            _not_send: PhantomData,
        };
        if let Some(name) = &options.name {
            context.set_name(name)?;
        }
        if options.inspectable {
            context.set_inspectable(true);
        }

        debug!(
            ctx = ?ctx,
            shared_group = options.group.is_some(),
            custom_global = options.global_class.is_some(),
            "Created JavaScriptCore context"
        );
        Ok(context)
    }

    /// Obtain an owning handle for the global context behind `ctx`
    ///
    /// Callbacks receive a plain `JSContextRef`; this walks to its global
    /// context and retains it.
    ///
    /// # Safety
    /// `ctx` must be null or a valid JSContextRef.
    pub unsafe fn from_raw_retained(ctx: JSContextRef) -> JscResult<Self> {
        if ctx.is_null() {
            return Err(JscError::null_pointer("JSContextRef"));
        }
        // SAFETY: ctx is valid per caller contract
        let global = unsafe { JSContextGetGlobalContext(ctx) };
        if global.is_null() {
            return Err(JscError::null_pointer("JSContextGetGlobalContext"));
        }
        // SAFETY: global is a live global context
        let global = unsafe { JSGlobalContextRetain(global) };
        Ok(Self {
            ctx: global,
            _not_send: PhantomData,
        })
    }

    /// Get the raw context pointer
    pub fn raw(&self) -> JSContextRef {
        self.ctx
    }

    /// Get the raw global context pointer
    pub fn raw_global(&self) -> JSGlobalContextRef {
        self.ctx
    }

    /// Get the global object
    pub fn global_object(&self) -> JscObject {
        // SAFETY: self.ctx is valid and always has a global object
        unsafe { JscObject::new(self, JSContextGetGlobalObject(self.ctx)) }
    }

    /// Get the group this context belongs to
    pub fn group(&self) -> JscResult<ContextGroup> {
        // SAFETY: self.ctx is valid; the group reference is retained by from_raw_retained
        unsafe { ContextGroup::from_raw_retained(JSContextGetGroup(self.ctx)) }
    }

    /// Whether both contexts share a group and may exchange values
    pub fn same_group(&self, other: &JscContext) -> bool {
        // SAFETY: both contexts are valid
        unsafe { JSContextGetGroup(self.ctx) == JSContextGetGroup(other.ctx) }
    }

    /// Get the debugger name, if one was set
    pub fn name(&self) -> Option<String> {
        // SAFETY: self.ctx is valid; CopyName follows the Create Rule
        let name = unsafe { JscString::from_raw(JSGlobalContextCopyName(self.ctx)) }.ok()?;
        Some(name.to_string())
    }

    /// Set the debugger name
    pub fn set_name(&self, name: &str) -> JscResult<()> {
        let name = JscString::new(name)?;
        // SAFETY: self.ctx and name are valid; the engine retains the name
        unsafe { JSGlobalContextSetName(self.ctx, name.raw()) };
        Ok(())
    }

    /// Whether remote debuggers may inspect this context
    pub fn is_inspectable(&self) -> bool {
        // SAFETY: self.ctx is valid
        unsafe { JSGlobalContextIsInspectable(self.ctx) }
    }

    /// Allow or forbid remote inspection
    pub fn set_inspectable(&self, inspectable: bool) {
        // SAFETY: self.ctx is valid
        unsafe { JSGlobalContextSetInspectable(self.ctx, inspectable) }
    }

    /// Evaluate a JavaScript script and return the result
    pub fn eval(&self, script: &str) -> JscResult<JscValue> {
        self.eval_with_source(script, "<eval>", 1)
    }

    /// Evaluate a JavaScript script with source URL and starting line (for better error messages)
    pub fn eval_with_source(
        &self,
        script: &str,
        source_url: &str,
        starting_line: i32,
    ) -> JscResult<JscValue> {
        self.evaluate(script, None, source_url, starting_line)
    }

    /// Evaluate a script with `this` bound to `this_object`
    pub fn eval_with_this(&self, script: &str, this_object: &JscObject) -> JscResult<JscValue> {
        self.evaluate(script, Some(this_object), "<eval>", 1)
    }

    fn evaluate(
        &self,
        script: &str,
        this_object: Option<&JscObject>,
        source_url: &str,
        starting_line: c_int,
    ) -> JscResult<JscValue> {
        let script = JscString::new(script)?;
        let source = JscString::new(source_url)?;
        let this = this_object.map_or(ptr::null_mut(), JscObject::raw);
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: strings and ctx are valid, this is null or an object of this context
        unsafe {
            let result = JSEvaluateScript(
                self.ctx,
                script.raw(),
                this,
                source.raw(),
                starting_line,
                &mut exception,
            );
            check_exception(self.ctx, exception)?;
            JscValue::from_result(self, result, "JSEvaluateScript")
        }
    }

    /// Check a script for syntax errors without running it
    pub fn check_syntax(&self, script: &str, source_url: &str) -> JscResult<()> {
        let script = JscString::new(script)?;
        let source = JscString::new(source_url)?;
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: strings and ctx are valid
        unsafe {
            let valid =
                JSCheckScriptSyntax(self.ctx, script.raw(), source.raw(), 1, &mut exception);
            check_exception(self.ctx, exception)?;
            if valid {
                Ok(())
            } else {
                Err(JscError::syntax_error("invalid script"))
            }
        }
    }

    /// Set a property on the global object
    pub fn set_global(&self, name: &str, value: &JscValue) -> JscResult<()> {
        self.global_object().set(name, value)
    }

    /// Get a property from the global object
    pub fn get_global(&self, name: &str) -> JscResult<JscValue> {
        self.global_object().get(name)
    }

    /// Inject a JSON object as a global variable
    pub fn inject_json(&self, name: &str, json: &str) -> JscResult<()> {
        let value = self.json(json)?;
        self.set_global(name, &value)
    }

    /// Serialize a Rust value and inject it as a global variable
    pub fn inject<T: serde::Serialize>(&self, name: &str, value: &T) -> JscResult<()> {
        let json = serde_json::to_string(value)?;
        self.inject_json(name, &json)
    }

    /// Register a native function callback
    ///
    /// The callback will be exposed to JavaScript with the given name on the global object.
    pub fn register_function(
        &self,
        name: &str,
        callback: JSObjectCallAsFunctionCallback,
    ) -> JscResult<()> {
        let function = self.create_function_with_callback(name, callback)?;
        self.set_global(name, &function.into())
    }

    /// Create a function object backed by a native callback
    pub fn create_function_with_callback(
        &self,
        name: &str,
        callback: JSObjectCallAsFunctionCallback,
    ) -> JscResult<JscObject> {
        let name = JscString::new(name)?;
        // SAFETY: ctx and name are valid
        unsafe {
            let function = JSObjectMakeFunctionWithCallback(self.ctx, name.raw(), callback);
            JscObject::from_result(self, function, "JSObjectMakeFunctionWithCallback")
        }
    }

    /// Force garbage collection
    pub fn gc(&self) {
        trace!(ctx = ?self.ctx, "Forcing garbage collection");
        // SAFETY: ctx is valid
        unsafe { JSGarbageCollect(self.ctx) };
        crate::function::release_retired_closures();
    }

    /// Create an undefined value
    pub fn undefined(&self) -> JscValue {
        // SAFETY: JSValueMakeUndefined always returns a valid value
        unsafe { JscValue::new(self, JSValueMakeUndefined(self.ctx)) }
    }

    /// Create a null value
    pub fn null(&self) -> JscValue {
        // SAFETY: JSValueMakeNull always returns a valid value
        unsafe { JscValue::new(self, JSValueMakeNull(self.ctx)) }
    }

    /// Create a boolean value
    pub fn boolean(&self, b: bool) -> JscValue {
        // SAFETY: JSValueMakeBoolean always returns a valid value
        unsafe { JscValue::new(self, JSValueMakeBoolean(self.ctx, b)) }
    }

    /// Create a number value
    pub fn number(&self, n: f64) -> JscValue {
        // SAFETY: JSValueMakeNumber always returns a valid value
        unsafe { JscValue::new(self, JSValueMakeNumber(self.ctx, n)) }
    }

    /// Create a string value
    pub fn string(&self, s: &str) -> JscResult<JscValue> {
        let js_str = JscString::new(s)?;
        Ok(self.js_string(&js_str))
    }

    /// Create a string value from an existing JSC string
    pub fn js_string(&self, s: &JscString) -> JscValue {
        // SAFETY: the engine copies what it needs from s
        unsafe { JscValue::new(self, JSValueMakeString(self.ctx, s.raw())) }
    }

    /// Create a new unique symbol
    pub fn symbol(&self, description: &str) -> JscResult<JscValue> {
        let description = JscString::new(description)?;
        // SAFETY: ctx and description are valid
        unsafe {
            let value = JSValueMakeSymbol(self.ctx, description.raw());
            JscValue::from_result(self, value, "JSValueMakeSymbol")
        }
    }

    /// Create a BigInt from a signed integer
    pub fn bigint_from_i64(&self, integer: i64) -> JscResult<JscValue> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid
        unsafe {
            let value = JSBigIntCreateWithInt64(self.ctx, integer, &mut exception);
            check_exception(self.ctx, exception)?;
            JscValue::from_result(self, value, "JSBigIntCreateWithInt64")
        }
    }

    /// Create a BigInt from an unsigned integer
    pub fn bigint_from_u64(&self, integer: u64) -> JscResult<JscValue> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid
        unsafe {
            let value = JSBigIntCreateWithUInt64(self.ctx, integer, &mut exception);
            check_exception(self.ctx, exception)?;
            JscValue::from_result(self, value, "JSBigIntCreateWithUInt64")
        }
    }

    /// Create a BigInt from a double; non-integral values throw a RangeError
    pub fn bigint_from_f64(&self, value: f64) -> JscResult<JscValue> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid
        unsafe {
            let value = JSBigIntCreateWithDouble(self.ctx, value, &mut exception);
            check_exception(self.ctx, exception)?;
            JscValue::from_result(self, value, "JSBigIntCreateWithDouble")
        }
    }

    /// Parse a BigInt from its decimal (or `0x`/`0o`/`0b` prefixed) text
    pub fn bigint_from_str(&self, digits: &str) -> JscResult<JscValue> {
        let digits = JscString::new(digits)?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx and digits are valid
        unsafe {
            let value = JSBigIntCreateWithString(self.ctx, digits.raw(), &mut exception);
            check_exception(self.ctx, exception)?;
            JscValue::from_result(self, value, "JSBigIntCreateWithString")
        }
    }

    /// Create a value from JSON string
    pub fn json(&self, json: &str) -> JscResult<JscValue> {
        let js_str = JscString::new(json)?;
        // SAFETY: ctx and js_str are valid
        let value = unsafe { JSValueMakeFromJSONString(self.ctx, js_str.raw()) };
        if value.is_null() {
            return Err(JscError::JsonError(serde_json::Error::io(
                std::io::Error::new(std::io::ErrorKind::InvalidData, "Invalid JSON"),
            )));
        }
        // SAFETY: value is a live value of this context
        Ok(unsafe { JscValue::new(self, value) })
    }

    /// Create an empty JavaScript object
    pub fn create_object(&self) -> JscObject {
        JscObject::empty(self)
    }

    /// Create an array holding `items`
    pub fn create_array(&self, items: &[&JscValue]) -> JscResult<JscObject> {
        let items = raw_args(items);
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid and items points to items.len() live values
        unsafe {
            let array =
                JSObjectMakeArray(self.ctx, items.len(), items.as_ptr(), &mut exception);
            check_exception(self.ctx, exception)?;
            JscObject::from_result(self, array, "JSObjectMakeArray")
        }
    }

    /// Create a Date, passing `args` to the Date constructor
    pub fn create_date(&self, args: &[&JscValue]) -> JscResult<JscObject> {
        let args = raw_args(args);
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid and args points to args.len() live values
        unsafe {
            let date = JSObjectMakeDate(self.ctx, args.len(), args.as_ptr(), &mut exception);
            check_exception(self.ctx, exception)?;
            JscObject::from_result(self, date, "JSObjectMakeDate")
        }
    }

    /// Create an Error object with the given message
    pub fn create_error(&self, message: &str) -> JscResult<JscObject> {
        let message = self.string(message)?;
        let args = [message.raw()];
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid and args holds one live value
        unsafe {
            let error = JSObjectMakeError(self.ctx, args.len(), args.as_ptr(), &mut exception);
            check_exception(self.ctx, exception)?;
            JscObject::from_result(self, error, "JSObjectMakeError")
        }
    }

    /// Create a RegExp from a pattern and flags such as `"gi"`
    pub fn create_regexp(&self, pattern: &str, flags: &str) -> JscResult<JscObject> {
        let pattern = self.string(pattern)?;
        let flags = self.string(flags)?;
        let args = [pattern.raw(), flags.raw()];
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid and args holds two live values
        unsafe {
            let regexp = JSObjectMakeRegExp(self.ctx, args.len(), args.as_ptr(), &mut exception);
            check_exception(self.ctx, exception)?;
            JscObject::from_result(self, regexp, "JSObjectMakeRegExp")
        }
    }

    /// Compile a function from parameter names and a body
    pub fn create_function(
        &self,
        name: &str,
        parameters: &[&str],
        body: &str,
    ) -> JscResult<JscObject> {
        let name = JscString::new(name)?;
        let body = JscString::new(body)?;
        let parameters = parameters
            .iter()
            .map(|p| JscString::new(p))
            .collect::<JscResult<Vec<_>>>()?;
        let raw_parameters: Vec<JSStringRef> = parameters.iter().map(JscString::raw).collect();
        let count = u32::try_from(raw_parameters.len())
            .map_err(|_| JscError::CallError("too many parameters".into()))?;
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: all strings outlive the call
        unsafe {
            let function = JSObjectMakeFunction(
                self.ctx,
                name.raw(),
                count,
                raw_parameters.as_ptr(),
                body.raw(),
                ptr::null_mut(),
                1,
                &mut exception,
            );
            check_exception(self.ctx, exception)?;
            JscObject::from_result(self, function, "JSObjectMakeFunction")
        }
    }

    /// Create a pending promise along with its resolve and reject functions
    pub fn create_promise(&self) -> JscResult<(JscObject, JscObject, JscObject)> {
        let mut resolve: JSObjectRef = ptr::null_mut();
        let mut reject: JSObjectRef = ptr::null_mut();
        let mut exception: JSValueRef = ptr::null();

        // SAFETY: ctx is valid and the out-pointers are writable
        unsafe {
            let promise =
                JSObjectMakeDeferredPromise(self.ctx, &mut resolve, &mut reject, &mut exception);
            check_exception(self.ctx, exception)?;
            Ok((
                JscObject::from_result(self, promise, "JSObjectMakeDeferredPromise")?,
                JscObject::from_result(self, resolve, "JSObjectMakeDeferredPromise")?,
                JscObject::from_result(self, reject, "JSObjectMakeDeferredPromise")?,
            ))
        }
    }
}

impl Clone for JscContext {
    fn clone(&self) -> Self {
        // SAFETY: self.ctx is valid
        let ctx = unsafe { JSGlobalContextRetain(self.ctx) };
        Self {
            ctx,
            _not_send: PhantomData,
        }
    }
}

impl Drop for JscContext {
    fn drop(&mut self) {
        // SAFETY: we own one reference to ctx
        unsafe { JSGlobalContextRelease(self.ctx) };
    }
}

impl PartialEq for JscContext {
    fn eq(&self, other: &Self) -> bool {
        self.ctx == other.ctx
    }
}

impl Eq for JscContext {}

impl fmt::Debug for JscContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: self.ctx is valid; CopyName follows the Create Rule
        let name = unsafe {
            let raw = JSGlobalContextCopyName(self.ctx);
            let name = js_string_to_rust(raw);
            if !raw.is_null() {
                JSStringRelease(raw);
            }
            name
        };
        f.debug_struct("JscContext")
            .field("ctx", &self.ctx)
            .field("name", &name)
            .finish()
    }
}
