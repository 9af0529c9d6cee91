//! Compile-fail tests for thread safety
//!
//! These tests verify that engine handles cannot be sent across threads.
//! The `compile_fail` doc tests ensure that attempting to send these types
//! to another thread results in a compilation error.

/// ```compile_fail
/// use jscore::JscContext;
/// use std::thread;
///
/// let ctx = JscContext::new().unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: JscContext is !Send
///     let _ = ctx.eval("1 + 1");
/// });
/// ```
fn _context_not_send() {}

/// ```compile_fail
/// use jscore::JscContext;
/// use std::sync::Arc;
///
/// let ctx = Arc::new(JscContext::new().unwrap());
/// let ctx2 = ctx.clone();
/// std::thread::spawn(move || {
///     // This should fail to compile: JscContext is !Sync
///     let _ = ctx2;
/// });
/// ```
fn _context_not_sync() {}

/// ```compile_fail
/// use jscore::ContextGroup;
/// use std::thread;
///
/// let group = ContextGroup::new().unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: ContextGroup is !Send
///     let _ = group.raw();
/// });
/// ```
fn _group_not_send() {}

/// ```compile_fail
/// use jscore::JscContext;
/// use std::thread;
///
/// let ctx = JscContext::new().unwrap();
/// let value = ctx.eval("42").unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: JscValue is !Send
///     let _ = value.to_number();
/// });
/// ```
fn _value_not_send() {}

/// ```compile_fail
/// use jscore::JscString;
/// use std::thread;
///
/// let s = JscString::new("hello").unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: JscString is !Send
///     let _ = s.to_string();
/// });
/// ```
fn _string_not_send() {}

/// ```compile_fail
/// use jscore::{JscContext, JscObject};
/// use std::thread;
///
/// let ctx = JscContext::new().unwrap();
/// let obj = JscObject::empty(&ctx);
/// thread::spawn(move || {
///     // This should fail to compile: JscObject is !Send
///     let _ = obj.is_array();
/// });
/// ```
fn _object_not_send() {}

/// ```compile_fail
/// use jscore::ClassDefinition;
/// use std::thread;
///
/// let class = ClassDefinition::new("Point").build().unwrap();
/// thread::spawn(move || {
///     // This should fail to compile: JscClass is !Send
///     let _ = class.raw();
/// });
/// ```
fn _class_not_send() {}

/// ```compile_fail
/// use jscore::JscContext;
///
/// fn needs_send<T: Send>(_: T) {}
///
/// let ctx = JscContext::new().unwrap();
/// let names = ctx.create_object().property_name_array().unwrap();
/// // This should fail to compile: PropertyNameArray is !Send
/// needs_send(names);
/// ```
fn _property_names_not_send() {}
