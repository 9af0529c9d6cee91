//! Core error types for JavaScriptCore operations
//!
//! This module provides a structured error hierarchy that preserves
//! JavaScript exception details including stack traces, line numbers,
//! and error types, plus the conversion from engine exception values.

use jscore_sys::*;
use std::ffi::NulError;
use std::ptr;
use thiserror::Error;

use crate::string::{JscString, js_string_to_rust};

/// Result type alias for JSC operations
pub type JscResult<T> = Result<T, JscError>;

/// Structured error types for JavaScriptCore operations
#[derive(Debug, Error)]
pub enum JscError {
    /// Failed to create a context or context group
    #[error("Context creation failed: {message}")]
    ContextCreation { message: String },

    /// JavaScript syntax error during parsing
    #[error("Syntax error{}: {message}", format_location(file, line, column))]
    SyntaxError {
        message: String,
        file: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
    },

    /// JavaScript runtime error (throw, TypeError, etc.)
    #[error("{error_type}: {message}")]
    ScriptError {
        error_type: String,
        message: String,
        file: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
        stack: Option<String>,
    },

    /// Type conversion error
    #[error("Type error: expected {expected}, got {actual}")]
    TypeError { expected: String, actual: String },

    /// Null pointer returned from JSC API
    #[error("Internal JSC error: {operation} returned null")]
    NullPointer { operation: String },

    /// String encoding error
    #[error("String encoding error: {0}")]
    StringEncoding(String),

    /// Function call error
    #[error("Call error: {0}")]
    CallError(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Internal/unexpected error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_location(file: &Option<String>, line: &Option<u32>, column: &Option<u32>) -> String {
    match (file, line, column) {
        (Some(f), Some(l), Some(c)) => format!(" at {}:{}:{}", f, l, c),
        (Some(f), Some(l), None) => format!(" at {}:{}", f, l),
        (None, Some(l), Some(c)) => format!(" at line {}:{}", l, c),
        (None, Some(l), None) => format!(" at line {}", l),
        _ => String::new(),
    }
}

impl JscError {
    /// Create a script error from error type and message
    pub fn script_error(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ScriptError {
            error_type: error_type.into(),
            message: message.into(),
            file: None,
            line: None,
            column: None,
            stack: None,
        }
    }

    /// Create a script error with location info
    pub fn script_error_with_location(
        error_type: impl Into<String>,
        message: impl Into<String>,
        file: Option<String>,
        line: Option<u32>,
        column: Option<u32>,
        stack: Option<String>,
    ) -> Self {
        Self::ScriptError {
            error_type: error_type.into(),
            message: message.into(),
            file,
            line,
            column,
            stack,
        }
    }

    /// Create a syntax error
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::SyntaxError {
            message: message.into(),
            file: None,
            line: None,
            column: None,
        }
    }

    /// Create a type error
    pub fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a context creation error
    pub fn context_creation(message: impl Into<String>) -> Self {
        Self::ContextCreation {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a null pointer error
    pub fn null_pointer(operation: impl Into<String>) -> Self {
        Self::NullPointer {
            operation: operation.into(),
        }
    }

    /// Check if this is a user-facing script error
    pub fn is_script_error(&self) -> bool {
        matches!(self, Self::ScriptError { .. } | Self::SyntaxError { .. })
    }

    /// Get the stack trace if available
    pub fn stack_trace(&self) -> Option<&str> {
        match self {
            Self::ScriptError { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }

    /// Get source location if available
    pub fn location(&self) -> Option<(Option<&str>, Option<u32>, Option<u32>)> {
        match self {
            Self::ScriptError {
                file, line, column, ..
            }
            | Self::SyntaxError {
                file, line, column, ..
            } => Some((file.as_deref(), *line, *column)),
            _ => None,
        }
    }

    /// Get the error type name (e.g., "TypeError", "ReferenceError")
    pub fn error_type(&self) -> &str {
        match self {
            Self::ScriptError { error_type, .. } => error_type,
            Self::SyntaxError { .. } => "SyntaxError",
            Self::TypeError { .. } => "TypeError",
            Self::ContextCreation { .. } => "ContextError",
            Self::NullPointer { .. } => "InternalError",
            Self::StringEncoding(_) => "EncodingError",
            Self::CallError(_) => "CallError",
            Self::JsonError(_) => "JsonError",
            Self::Internal(_) => "InternalError",
        }
    }

    /// The message to use when this error is thrown back into JavaScript
    pub(crate) fn js_message(&self) -> String {
        match self {
            Self::ScriptError { message, .. } | Self::SyntaxError { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<NulError> for JscError {
    fn from(err: NulError) -> Self {
        Self::StringEncoding(format!(
            "interior NUL byte at position {}",
            err.nul_position()
        ))
    }
}

/// Turn a filled-in exception slot into an error
///
/// # Safety
/// `ctx` must be a valid context and `exception` null or a value from it.
pub(crate) unsafe fn check_exception(ctx: JSContextRef, exception: JSValueRef) -> JscResult<()> {
    if exception.is_null() {
        Ok(())
    } else {
        // SAFETY: forwarded from the caller
        Err(unsafe { extract_exception(ctx, exception) })
    }
}

/// Extract a structured error from a JS exception value
///
/// Error objects yield their `name`, `message`, `stack` and source location.
/// Anything else that was thrown is stringified into a generic `Error`.
///
/// # Safety
/// - `ctx` must be a valid JSContextRef
/// - `exception` can be null (returns Internal error in that case)
pub unsafe fn extract_exception(ctx: JSContextRef, exception: JSValueRef) -> JscError {
    if exception.is_null() {
        return JscError::Internal("Null exception".into());
    }

    // SAFETY: ctx and exception are valid per caller contract
    unsafe {
        if JSValueIsObject(ctx, exception) {
            extract_error_object(ctx, exception as JSObjectRef)
        } else {
            let message =
                value_to_string(ctx, exception).unwrap_or_else(|| "Unknown error".to_string());
            JscError::script_error("Error", message)
        }
    }
}

unsafe fn extract_error_object(ctx: JSContextRef, obj: JSObjectRef) -> JscError {
    // SAFETY: ctx and obj are valid per caller contract
    unsafe {
        let error_type =
            get_string_property(ctx, obj, "name").unwrap_or_else(|| "Error".to_string());
        let message = get_string_property(ctx, obj, "message").unwrap_or_else(|| {
            value_to_string(ctx, obj).unwrap_or_else(|| "Unknown error".to_string())
        });
        let stack = get_string_property(ctx, obj, "stack");

        // JSC names these differently from other engines
        let file = get_string_property(ctx, obj, "sourceURL")
            .or_else(|| get_string_property(ctx, obj, "fileName"));
        let line = get_number_property(ctx, obj, "line")
            .or_else(|| get_number_property(ctx, obj, "lineNumber"))
            .map(|n| n as u32);
        let column = get_number_property(ctx, obj, "column")
            .or_else(|| get_number_property(ctx, obj, "columnNumber"))
            .map(|n| n as u32);

        if error_type == "SyntaxError" {
            JscError::SyntaxError {
                message,
                file,
                line,
                column,
            }
        } else {
            JscError::script_error_with_location(error_type, message, file, line, column, stack)
        }
    }
}

unsafe fn get_property(ctx: JSContextRef, obj: JSObjectRef, name: &str) -> Option<JSValueRef> {
    let js_name = JscString::new(name).ok()?;
    let mut exception: JSValueRef = ptr::null();
    // SAFETY: ctx and obj are valid per caller contract
    let value = unsafe { JSObjectGetProperty(ctx, obj, js_name.raw(), &mut exception) };
    if exception.is_null() && !value.is_null() {
        Some(value)
    } else {
        None
    }
}

unsafe fn get_string_property(ctx: JSContextRef, obj: JSObjectRef, name: &str) -> Option<String> {
    // SAFETY: ctx and obj are valid per caller contract
    unsafe {
        let value = get_property(ctx, obj, name)?;
        if JSValueIsUndefined(ctx, value) {
            None
        } else {
            value_to_string(ctx, value)
        }
    }
}

unsafe fn get_number_property(ctx: JSContextRef, obj: JSObjectRef, name: &str) -> Option<f64> {
    // SAFETY: ctx and obj are valid per caller contract
    unsafe {
        let value = get_property(ctx, obj, name)?;
        if !JSValueIsNumber(ctx, value) {
            return None;
        }
        let mut exception: JSValueRef = ptr::null();
        let num = JSValueToNumber(ctx, value, &mut exception);
        (exception.is_null() && !num.is_nan()).then_some(num)
    }
}

unsafe fn value_to_string(ctx: JSContextRef, value: JSValueRef) -> Option<String> {
    // SAFETY: ctx and value are valid per caller contract
    unsafe {
        let mut exception: JSValueRef = ptr::null();
        let js_str = JSValueToStringCopy(ctx, value, &mut exception);
        if js_str.is_null() || !exception.is_null() {
            return None;
        }
        let result = js_string_to_rust(js_str);
        JSStringRelease(js_str);
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JscContext;

    #[test]
    fn test_script_error_display() {
        let err = JscError::script_error("TypeError", "undefined is not a function");
        assert_eq!(err.to_string(), "TypeError: undefined is not a function");
    }

    #[test]
    fn test_script_error_with_location() {
        let err = JscError::script_error_with_location(
            "ReferenceError",
            "x is not defined",
            Some("script.js".into()),
            Some(10),
            Some(5),
            Some("at foo (script.js:10:5)".into()),
        );

        assert!(err.is_script_error());
        assert_eq!(err.stack_trace(), Some("at foo (script.js:10:5)"));
        assert_eq!(err.error_type(), "ReferenceError");

        let (file, line, col) = err.location().unwrap();
        assert_eq!(file, Some("script.js"));
        assert_eq!(line, Some(10));
        assert_eq!(col, Some(5));
    }

    #[test]
    fn test_syntax_error_display() {
        let err = JscError::SyntaxError {
            message: "Unexpected token".into(),
            file: Some("test.js".into()),
            line: Some(1),
            column: Some(10),
        };

        assert!(err.to_string().contains("Syntax error"));
        assert!(err.to_string().contains("test.js:1:10"));
        assert!(err.is_script_error());
    }

    #[test]
    fn test_type_error() {
        let err = JscError::type_error("string", "number");
        assert!(err.to_string().contains("expected string"));
        assert!(err.to_string().contains("got number"));
        assert_eq!(err.error_type(), "TypeError");
    }

    #[test]
    fn test_null_pointer() {
        let err = JscError::null_pointer("JSEvaluateScript");
        assert!(err.to_string().contains("JSEvaluateScript"));
        assert!(err.to_string().contains("returned null"));
    }

    #[test]
    fn test_error_type_names() {
        let cases = [
            (JscError::syntax_error("bad"), "SyntaxError"),
            (JscError::context_creation("no vm"), "ContextError"),
            (JscError::null_pointer("JSObjectMake"), "InternalError"),
            (JscError::StringEncoding("nul".into()), "EncodingError"),
            (JscError::CallError("too many parameters".into()), "CallError"),
            (JscError::internal("boom"), "InternalError"),
        ];
        for (err, expected) in cases {
            assert_eq!(err.error_type(), expected, "{err}");
        }
    }

    #[test]
    fn test_nul_error_conversion() {
        let err: JscError = std::ffi::CString::new("a\0b").unwrap_err().into();
        assert!(matches!(err, JscError::StringEncoding(_)));
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_js_message_strips_type_prefix() {
        let err = JscError::script_error("RangeError", "too big");
        assert_eq!(err.js_message(), "too big");
        let err = JscError::internal("boom");
        assert_eq!(err.js_message(), "Internal error: boom");
    }

    #[test]
    fn test_location_none() {
        let err = JscError::Internal("test".into());
        assert!(err.location().is_none());
        assert!(err.stack_trace().is_none());
    }

    #[test]
    fn test_extract_thrown_error_object() {
        let ctx = JscContext::new().unwrap();
        let err = ctx
            .eval_with_source("null.foo", "thrower.js", 1)
            .unwrap_err();
        assert_eq!(err.error_type(), "TypeError");
        let (file, line, _) = err.location().unwrap();
        assert_eq!(file, Some("thrower.js"));
        assert_eq!(line, Some(1));
    }

    #[test]
    fn test_extract_thrown_primitive() {
        let ctx = JscContext::new().unwrap();
        let err = ctx.eval("throw 'plain string'").unwrap_err();
        assert_eq!(err.error_type(), "Error");
        assert_eq!(err.js_message(), "plain string");
    }

    #[test]
    fn test_extract_null_exception() {
        let err = unsafe { extract_exception(ptr::null(), ptr::null()) };
        assert!(matches!(err, JscError::Internal(_)));
    }
}
