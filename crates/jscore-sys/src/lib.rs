//! Raw FFI bindings to the JavaScriptCore C API
//!
//! This crate mirrors the public C headers of JavaScriptCore one module per
//! header:
//!
//! | Module          | Header            |
//! |-----------------|-------------------|
//! | [`base`]        | `JSBase.h`        |
//! | [`context`]     | `JSContextRef.h`  |
//! | [`string`]      | `JSStringRef.h`   |
//! | [`value`]       | `JSValueRef.h`    |
//! | [`object`]      | `JSObjectRef.h`   |
//! | [`typed_array`] | `JSTypedArray.h`  |
//!
//! Everything is re-exported at the crate root, so `use jscore_sys::*` gives
//! the same surface a C program gets from `<JavaScriptCore/JavaScript.h>`.
//! Use the safe wrappers in `jscore` for higher-level access.
//!
//! # Handle "inheritance"
//!
//! The C API models two is-a relationships through const-ness: a
//! `JSGlobalContextRef` is a mutable `JSContextRef`, and a `JSObjectRef` is a
//! mutable `JSValueRef`. The aliases here keep that shape, so a
//! `JSGlobalContextRef` or `JSObjectRef` coerces implicitly wherever a
//! `JSContextRef` or `JSValueRef` is expected.
//!
//! # Ownership
//!
//! Functions whose name contains `Create` or `Copy` return a handle the caller
//! owns and must release with the matching `*Release` function.
//!
//! # Linking
//!
//! Linking is handled by `build.rs`: the system framework on Apple platforms,
//! a statically linked bun-webkit build on Linux and Windows, or the
//! distribution's shared library with the `system-jsc` feature.

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

pub mod base;
pub mod context;
pub mod object;
pub mod string;
pub mod typed_array;
pub mod value;

// Embedder-provided WTF run-loop timer for statically linked WebKit
#[cfg(jscore_static_webkit)]
pub mod run_loop_timer;

pub use base::*;
pub use context::*;
pub use object::*;
pub use string::*;
pub use typed_array::*;
pub use value::*;
