//! Safe wrapper around JSC values with automatic GC protection

use jscore_sys::*;
use std::cmp::Ordering;
use std::fmt;
use std::ptr;

use crate::class::JscClass;
use crate::context::JscContext;
use crate::error::{JscError, JscResult, check_exception};
use crate::object::JscObject;
use crate::string::JscString;
use crate::typed_array::TypedArrayKind;

/// The type of a JavaScript value, as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Object,
    Symbol,
    BigInt,
}

impl JsType {
    /// Map an engine `JSType` to the enum
    pub fn from_raw(raw: JSType) -> Option<Self> {
        match raw {
            K_JS_TYPE_UNDEFINED => Some(Self::Undefined),
            K_JS_TYPE_NULL => Some(Self::Null),
            K_JS_TYPE_BOOLEAN => Some(Self::Boolean),
            K_JS_TYPE_NUMBER => Some(Self::Number),
            K_JS_TYPE_STRING => Some(Self::String),
            K_JS_TYPE_OBJECT => Some(Self::Object),
            K_JS_TYPE_SYMBOL => Some(Self::Symbol),
            K_JS_TYPE_BIG_INT => Some(Self::BigInt),
            _ => None,
        }
    }

    /// The engine `JSType` for this variant
    pub fn to_raw(self) -> JSType {
        match self {
            Self::Undefined => K_JS_TYPE_UNDEFINED,
            Self::Null => K_JS_TYPE_NULL,
            Self::Boolean => K_JS_TYPE_BOOLEAN,
            Self::Number => K_JS_TYPE_NUMBER,
            Self::String => K_JS_TYPE_STRING,
            Self::Object => K_JS_TYPE_OBJECT,
            Self::Symbol => K_JS_TYPE_SYMBOL,
            Self::BigInt => K_JS_TYPE_BIG_INT,
        }
    }
}

impl fmt::Display for JsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Object => "object",
            Self::Symbol => "symbol",
            Self::BigInt => "bigint",
        };
        f.write_str(name)
    }
}

/// Result of a relational comparison between two values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// The values are unordered, e.g. one side is NaN
    Undefined,
    Equal,
    GreaterThan,
    LessThan,
}

impl Relation {
    /// Map an engine `JSRelationCondition`; unknown values are unordered
    pub fn from_raw(raw: JSRelationCondition) -> Self {
        match raw {
            K_JS_RELATION_CONDITION_EQUAL => Self::Equal,
            K_JS_RELATION_CONDITION_GREATER_THAN => Self::GreaterThan,
            K_JS_RELATION_CONDITION_LESS_THAN => Self::LessThan,
            _ => Self::Undefined,
        }
    }

    /// Convert to a Rust ordering; `None` when unordered
    pub fn to_ordering(self) -> Option<Ordering> {
        match self {
            Self::Undefined => None,
            Self::Equal => Some(Ordering::Equal),
            Self::GreaterThan => Some(Ordering::Greater),
            Self::LessThan => Some(Ordering::Less),
        }
    }
}

/// A JavaScript value with automatic GC protection
///
/// When created, the value is protected from garbage collection.
/// When dropped, the protection is removed. Each value keeps its global
/// context alive, so it may safely outlive the `JscContext` it came from.
///
/// # Thread Safety
///
/// This type is `!Send` and `!Sync` because JavaScript values are tied to
/// their context's thread. Cross-thread access causes undefined behavior.
pub struct JscValue {
    value: JSValueRef,
    ctx: JscContext,
}

impl JscValue {
    /// Create a new protected value
    ///
    /// # Safety
    /// The value must be null or valid for the given context
    pub unsafe fn new(ctx: &JscContext, value: JSValueRef) -> Self {
        if !value.is_null() {
            // SAFETY: ctx and value are valid per caller contract
            unsafe { JSValueProtect(ctx.raw(), value) };
        }
        Self {
            value,
            ctx: ctx.clone(),
        }
    }

    /// Wrap a value that already carries one protection owned by the caller
    pub(crate) unsafe fn adopt(ctx: JscContext, value: JSValueRef) -> Self {
        Self { value, ctx }
    }

    /// Wrap an engine result, treating null as a failed call
    pub(crate) unsafe fn from_result(
        ctx: &JscContext,
        value: JSValueRef,
        operation: &str,
    ) -> JscResult<Self> {
        if value.is_null() {
            return Err(JscError::null_pointer(operation));
        }
        // SAFETY: value is a live value of ctx
        Ok(unsafe { Self::new(ctx, value) })
    }

    /// Get the raw value reference
    pub fn raw(&self) -> JSValueRef {
        self.value
    }

    /// Get the context
    pub fn context(&self) -> &JscContext {
        &self.ctx
    }

    fn raw_ctx(&self) -> JSContextRef {
        self.ctx.raw()
    }

    /// Get the type of the value
    pub fn js_type(&self) -> JscResult<JsType> {
        // SAFETY: self.ctx and self.value are valid
        let raw = unsafe { JSValueGetType(self.raw_ctx(), self.value) };
        JsType::from_raw(raw)
            .ok_or_else(|| JscError::internal(format!("unknown JSType {}", raw)))
    }

    /// Check if the value is undefined
    pub fn is_undefined(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsUndefined(self.raw_ctx(), self.value) }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsNull(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a boolean
    pub fn is_boolean(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsBoolean(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a number
    pub fn is_number(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsNumber(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a string
    pub fn is_string(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsString(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a symbol
    pub fn is_symbol(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsSymbol(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a BigInt
    pub fn is_bigint(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsBigInt(self.raw_ctx(), self.value) }
    }

    /// Check if the value is an object
    pub fn is_object(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsObject(self.raw_ctx(), self.value) }
    }

    /// Check if the value is an object created from `class` (or a subclass)
    pub fn is_object_of_class(&self, class: &JscClass) -> bool {
        // SAFETY: self.ctx, self.value and class are valid
        unsafe { JSValueIsObjectOfClass(self.raw_ctx(), self.value, class.raw()) }
    }

    /// Check if the value is an array
    pub fn is_array(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsArray(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a Date
    pub fn is_date(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueIsDate(self.raw_ctx(), self.value) }
    }

    /// Check if the value is a Promise
    ///
    /// Checks if the object is an instance of the context's current global
    /// `Promise`. A script that reassigns `globalThis.Promise` changes the
    /// answer, and a promise from another context is not recognized through
    /// a value of this one.
    pub fn is_promise(&self) -> bool {
        if !self.is_object() {
            return false;
        }

        let Ok(promise_ctor) = self.ctx.get_global("Promise") else {
            return false;
        };
        promise_ctor
            .as_object()
            .is_some_and(|ctor| self.instance_of(&ctor).unwrap_or(false))
    }

    /// Get the typed array kind, or `None` for anything that is not a typed
    /// array or ArrayBuffer
    pub fn typed_array_type(&self) -> JscResult<Option<TypedArrayKind>> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let raw = JSValueGetTypedArrayType(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(TypedArrayKind::from_raw(raw))
        }
    }

    /// Loose equality, as the `==` operator; may run user code
    pub fn loose_eq(&self, other: &JscValue) -> JscResult<bool> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: both values are valid in self.ctx
        unsafe {
            let equal = JSValueIsEqual(self.raw_ctx(), self.value, other.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(equal)
        }
    }

    /// Strict equality, as the `===` operator
    pub fn strict_eq(&self, other: &JscValue) -> bool {
        // SAFETY: both values are valid in self.ctx
        unsafe { JSValueIsStrictEqual(self.raw_ctx(), self.value, other.value) }
    }

    /// `instanceof` check against a constructor
    pub fn instance_of(&self, constructor: &JscObject) -> JscResult<bool> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: value and constructor are valid in self.ctx
        unsafe {
            let result = JSValueIsInstanceOfConstructor(
                self.raw_ctx(),
                self.value,
                constructor.raw(),
                &mut exception,
            );
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Relational comparison, as `<` and `>` would see it
    pub fn compare(&self, other: &JscValue) -> JscResult<Relation> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: both values are valid in self.ctx
        unsafe {
            let raw = JSValueCompare(self.raw_ctx(), self.value, other.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(Relation::from_raw(raw))
        }
    }

    /// Compare against a signed integer without converting it to a double
    pub fn compare_i64(&self, other: i64) -> JscResult<Relation> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let raw = JSValueCompareInt64(self.raw_ctx(), self.value, other, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(Relation::from_raw(raw))
        }
    }

    /// Compare against an unsigned integer without converting it to a double
    pub fn compare_u64(&self, other: u64) -> JscResult<Relation> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let raw = JSValueCompareUInt64(self.raw_ctx(), self.value, other, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(Relation::from_raw(raw))
        }
    }

    /// Compare against a double
    pub fn compare_f64(&self, other: f64) -> JscResult<Relation> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let raw = JSValueCompareDouble(self.raw_ctx(), self.value, other, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(Relation::from_raw(raw))
        }
    }

    /// Convert to boolean
    pub fn to_bool(&self) -> bool {
        // SAFETY: self.ctx and self.value are valid
        unsafe { JSValueToBoolean(self.raw_ctx(), self.value) }
    }

    /// Convert to number
    pub fn to_number(&self) -> JscResult<f64> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let result = JSValueToNumber(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Convert with ToInt32 semantics (wrapping, NaN becomes 0)
    pub fn to_i32(&self) -> JscResult<i32> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let result = JSValueToInt32(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Convert with ToUint32 semantics
    pub fn to_u32(&self) -> JscResult<u32> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let result = JSValueToUInt32(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Convert to a 64-bit signed integer; BigInts keep full precision
    pub fn to_i64(&self) -> JscResult<i64> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let result = JSValueToInt64(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Convert to a 64-bit unsigned integer; BigInts keep full precision
    pub fn to_u64(&self) -> JscResult<u64> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let result = JSValueToUInt64(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            Ok(result)
        }
    }

    /// Convert to string
    pub fn to_string(&self) -> JscResult<String> {
        Ok(self.to_js_string()?.to_string())
    }

    /// Convert to an engine string
    pub fn to_js_string(&self) -> JscResult<JscString> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid; the copy follows the Create Rule
        unsafe {
            let js_str = JSValueToStringCopy(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            JscString::from_raw(js_str)
        }
    }

    /// Convert to an object, boxing primitives; throws for null and undefined
    pub fn to_object(&self) -> JscResult<JscObject> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let object = JSValueToObject(self.raw_ctx(), self.value, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            JscObject::from_result(&self.ctx, object, "JSValueToObject")
        }
    }

    /// View the value as an object without conversion
    pub fn as_object(&self) -> Option<JscObject> {
        if self.is_object() {
            // SAFETY: the value is an object of self.ctx
            Some(unsafe { JscObject::new(&self.ctx, self.value as JSObjectRef) })
        } else {
            None
        }
    }

    /// Convert to JSON string, indenting nested levels by `indent` spaces
    pub fn to_json(&self, indent: u32) -> JscResult<String> {
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: self.ctx and self.value are valid
        unsafe {
            let js_str = JSValueCreateJSONString(self.raw_ctx(), self.value, indent, &mut exception);
            check_exception(self.raw_ctx(), exception)?;
            if js_str.is_null() {
                let actual = self.js_type().map(|t| t.to_string())?;
                return Err(JscError::type_error("JSON-serializable value", actual));
            }
            Ok(JscString::from_raw(js_str)?.to_string())
        }
    }

    /// Deserialize from JSON to Rust type
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> JscResult<T> {
        let json = self.to_json(0)?;
        serde_json::from_str(&json).map_err(JscError::JsonError)
    }
}

impl Clone for JscValue {
    fn clone(&self) -> Self {
        // SAFETY: self.value is live; protection nests
        unsafe { Self::new(&self.ctx, self.value) }
    }
}

impl Drop for JscValue {
    fn drop(&mut self) {
        if !self.value.is_null() {
            // SAFETY: value was protected in new(), now unprotecting
            unsafe { JSValueUnprotect(self.ctx.raw(), self.value) };
        }
    }
}

impl PartialEq for JscValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl fmt::Debug for JscValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_string() {
            Ok(s) => write!(f, "JscValue({})", s),
            Err(_) => write!(f, "JscValue(<opaque>)"),
        }
    }
}

/// Collect raw handles for an argument list
pub(crate) fn raw_args(args: &[&JscValue]) -> Vec<JSValueRef> {
    args.iter().map(|v| v.raw()).collect()
}
