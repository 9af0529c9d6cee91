//! `JSValueRef.h`: type queries, comparison, creation and conversion of values

use crate::base::*;
use std::os::raw::c_uint;

/// The type of a JavaScript value.
pub type JSType = c_uint;
pub const K_JS_TYPE_UNDEFINED: JSType = 0;
pub const K_JS_TYPE_NULL: JSType = 1;
pub const K_JS_TYPE_BOOLEAN: JSType = 2;
pub const K_JS_TYPE_NUMBER: JSType = 3;
pub const K_JS_TYPE_STRING: JSType = 4;
pub const K_JS_TYPE_OBJECT: JSType = 5;
pub const K_JS_TYPE_SYMBOL: JSType = 6;
pub const K_JS_TYPE_BIG_INT: JSType = 7;

/// The kind of a typed array or array buffer.
pub type JSTypedArrayType = c_uint;
pub const K_JS_TYPED_ARRAY_TYPE_INT8_ARRAY: JSTypedArrayType = 0;
pub const K_JS_TYPED_ARRAY_TYPE_INT16_ARRAY: JSTypedArrayType = 1;
pub const K_JS_TYPED_ARRAY_TYPE_INT32_ARRAY: JSTypedArrayType = 2;
pub const K_JS_TYPED_ARRAY_TYPE_UINT8_ARRAY: JSTypedArrayType = 3;
pub const K_JS_TYPED_ARRAY_TYPE_UINT8_CLAMPED_ARRAY: JSTypedArrayType = 4;
pub const K_JS_TYPED_ARRAY_TYPE_UINT16_ARRAY: JSTypedArrayType = 5;
pub const K_JS_TYPED_ARRAY_TYPE_UINT32_ARRAY: JSTypedArrayType = 6;
pub const K_JS_TYPED_ARRAY_TYPE_FLOAT32_ARRAY: JSTypedArrayType = 7;
pub const K_JS_TYPED_ARRAY_TYPE_FLOAT64_ARRAY: JSTypedArrayType = 8;
pub const K_JS_TYPED_ARRAY_TYPE_ARRAY_BUFFER: JSTypedArrayType = 9;
pub const K_JS_TYPED_ARRAY_TYPE_NONE: JSTypedArrayType = 10;
pub const K_JS_TYPED_ARRAY_TYPE_BIG_INT64_ARRAY: JSTypedArrayType = 11;
pub const K_JS_TYPED_ARRAY_TYPE_BIG_UINT64_ARRAY: JSTypedArrayType = 12;

/// The result of comparing two values with `JSValueCompare*`.
pub type JSRelationCondition = c_uint;
pub const K_JS_RELATION_CONDITION_UNDEFINED: JSRelationCondition = 0;
pub const K_JS_RELATION_CONDITION_EQUAL: JSRelationCondition = 1;
pub const K_JS_RELATION_CONDITION_GREATER_THAN: JSRelationCondition = 2;
pub const K_JS_RELATION_CONDITION_LESS_THAN: JSRelationCondition = 3;

unsafe extern "C" {
    // Type queries
    pub fn JSValueGetType(ctx: JSContextRef, value: JSValueRef) -> JSType;
    pub fn JSValueIsUndefined(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsNull(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsBoolean(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsNumber(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsString(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsSymbol(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsBigInt(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsObject(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsObjectOfClass(ctx: JSContextRef, value: JSValueRef, js_class: JSClassRef)
    -> bool;
    pub fn JSValueIsArray(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueIsDate(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueGetTypedArrayType(
        ctx: JSContextRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSTypedArrayType;

    // Comparison
    /// Tests whether two values are equal, as compared by the JS `==` operator.
    pub fn JSValueIsEqual(
        ctx: JSContextRef,
        a: JSValueRef,
        b: JSValueRef,
        exception: *mut JSValueRef,
    ) -> bool;
    /// Tests whether two values are strict equal, as compared by the JS `===` operator.
    pub fn JSValueIsStrictEqual(ctx: JSContextRef, a: JSValueRef, b: JSValueRef) -> bool;
    pub fn JSValueIsInstanceOfConstructor(
        ctx: JSContextRef,
        value: JSValueRef,
        constructor: JSObjectRef,
        exception: *mut JSValueRef,
    ) -> bool;
    pub fn JSValueCompare(
        ctx: JSContextRef,
        left: JSValueRef,
        right: JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSRelationCondition;
    pub fn JSValueCompareInt64(
        ctx: JSContextRef,
        left: JSValueRef,
        right: i64,
        exception: *mut JSValueRef,
    ) -> JSRelationCondition;
    pub fn JSValueCompareUInt64(
        ctx: JSContextRef,
        left: JSValueRef,
        right: u64,
        exception: *mut JSValueRef,
    ) -> JSRelationCondition;
    pub fn JSValueCompareDouble(
        ctx: JSContextRef,
        left: JSValueRef,
        right: f64,
        exception: *mut JSValueRef,
    ) -> JSRelationCondition;

    // Creation
    pub fn JSValueMakeUndefined(ctx: JSContextRef) -> JSValueRef;
    pub fn JSValueMakeNull(ctx: JSContextRef) -> JSValueRef;
    pub fn JSValueMakeBoolean(ctx: JSContextRef, boolean: bool) -> JSValueRef;
    pub fn JSValueMakeNumber(ctx: JSContextRef, number: f64) -> JSValueRef;
    pub fn JSValueMakeString(ctx: JSContextRef, string: JSStringRef) -> JSValueRef;
    pub fn JSValueMakeSymbol(ctx: JSContextRef, description: JSStringRef) -> JSValueRef;

    // BigInt
    pub fn JSBigIntCreateWithDouble(
        ctx: JSContextRef,
        value: f64,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSBigIntCreateWithInt64(
        ctx: JSContextRef,
        integer: i64,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSBigIntCreateWithUInt64(
        ctx: JSContextRef,
        integer: u64,
        exception: *mut JSValueRef,
    ) -> JSValueRef;
    pub fn JSBigIntCreateWithString(
        ctx: JSContextRef,
        string: JSStringRef,
        exception: *mut JSValueRef,
    ) -> JSValueRef;

    // JSON
    /// Parses a JSON string. Returns null if the string is not valid JSON.
    pub fn JSValueMakeFromJSONString(ctx: JSContextRef, string: JSStringRef) -> JSValueRef;
    /// Serializes a value to JSON. Ownership of the result follows the Create Rule.
    pub fn JSValueCreateJSONString(
        ctx: JSContextRef,
        value: JSValueRef,
        indent: c_uint,
        exception: *mut JSValueRef,
    ) -> JSStringRef;

    // Conversion
    pub fn JSValueToBoolean(ctx: JSContextRef, value: JSValueRef) -> bool;
    pub fn JSValueToNumber(ctx: JSContextRef, value: JSValueRef, exception: *mut JSValueRef)
    -> f64;
    pub fn JSValueToInt32(ctx: JSContextRef, value: JSValueRef, exception: *mut JSValueRef)
    -> i32;
    pub fn JSValueToUInt32(
        ctx: JSContextRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> u32;
    pub fn JSValueToInt64(ctx: JSContextRef, value: JSValueRef, exception: *mut JSValueRef)
    -> i64;
    pub fn JSValueToUInt64(
        ctx: JSContextRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> u64;
    /// Converts a value to a string. Ownership of the result follows the Create Rule.
    pub fn JSValueToStringCopy(
        ctx: JSContextRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSStringRef;
    pub fn JSValueToObject(
        ctx: JSContextRef,
        value: JSValueRef,
        exception: *mut JSValueRef,
    ) -> JSObjectRef;

    // Garbage collection
    /// Protects a value from garbage collection. Calls nest.
    pub fn JSValueProtect(ctx: JSContextRef, value: JSValueRef);
    pub fn JSValueUnprotect(ctx: JSContextRef, value: JSValueRef);
}
