//! Safe wrappers for the JavaScriptCore C API.
//!
//! This crate provides memory-safe, RAII-based wrappers around the raw
//! bindings in `jscore-sys`: context groups and global contexts, values and
//! objects that keep themselves alive, script evaluation with structured
//! errors, custom classes, typed arrays and Rust closures callable from
//! JavaScript.
//!
//! # Example
//!
//! ```no_run
//! use jscore::JscContext;
//!
//! let ctx = JscContext::new().unwrap();
//! let result = ctx.eval("1 + 1").unwrap();
//! assert_eq!(result.to_number().unwrap(), 2.0);
//!
//! ctx.register_closure("greet", |ctx, _this, args| {
//!     let who = match args.first() {
//!         Some(arg) => arg.to_string()?,
//!         None => "world".to_string(),
//!     };
//!     ctx.string(&format!("hello, {who}"))
//! })
//! .unwrap();
//! let greeting = ctx.eval("greet('jsc')").unwrap();
//! assert_eq!(greeting.to_string().unwrap(), "hello, jsc");
//! ```
//!
//! # Lifetimes
//!
//! Every [`JscValue`] and [`JscObject`] protects its engine value from
//! garbage collection and holds a reference to its global context, so it
//! stays usable after the [`JscContext`] it came from has been dropped.
//!
//! # Thread Safety
//!
//! All types in this crate are `!Send` and `!Sync`. JavaScriptCore locks
//! internally, but handles tied to one context are meant to be used from the
//! thread that created them.
//!
//! ```compile_fail
//! use jscore::JscContext;
//! use std::thread;
//!
//! let ctx = JscContext::new().unwrap();
//! thread::spawn(move || {
//!     ctx.eval("1 + 1"); // Error: JscContext is !Send
//! });
//! ```

// Raw pointers passed to the `unsafe fn` constructors are documented in their
// Safety sections; everything else takes owned handles.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

mod class;
mod config;
mod context;
mod error;
mod function;
mod group;
mod object;
mod property_names;
pub mod string;
mod typed_array;
mod value;

pub use class::{ClassDefinition, JscClass};
pub use config::ContextOptions;
pub use context::JscContext;
pub use error::{JscError, JscResult, extract_exception};
pub use function::HostFunction;
pub use group::ContextGroup;
pub use object::{ClassAttributes, JscObject, PropertyAttributes};
pub use property_names::{PropertyNameAccumulator, PropertyNameArray, PropertyNames};
pub use string::{JscString, js_string_to_rust};
pub use typed_array::TypedArrayKind;
pub use value::{JsType, JscValue, Relation};

// Re-export the raw bindings for callbacks and direct FFI access
pub use jscore_sys as sys;
