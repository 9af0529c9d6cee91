//! Native functions backed by Rust closures
//!
//! `JSObjectMakeFunctionWithCallback` carries no user data, so closures are
//! hosted by a per-thread class instead: each function object is an instance
//! whose private data is the boxed closure. The class's finalizer retires the
//! box; retired closures are dropped the next time this thread is back in a
//! position to call the engine, since finalizers must not.

use jscore_sys::*;
use std::cell::RefCell;
use std::ffi::c_void;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::slice;
use tracing::{debug, warn};

use crate::class::{ClassDefinition, JscClass};
use crate::context::JscContext;
use crate::error::{JscError, JscResult};
use crate::object::{JscObject, PropertyAttributes};
use crate::string::JscString;
use crate::value::JscValue;

/// Signature of a closure exposed to JavaScript
///
/// Receives the calling context, `this` (if any) and the arguments. An `Err`
/// is thrown into JavaScript as an `Error`.
pub type HostFunction = dyn Fn(&JscContext, Option<&JscObject>, &[JscValue]) -> JscResult<JscValue>;

struct ClosureData {
    name: String,
    callback: Box<HostFunction>,
}

thread_local! {
    static CLOSURE_CLASS: RefCell<Option<JscClass>> = const { RefCell::new(None) };
    static RETIRED_CLOSURES: RefCell<Vec<Box<ClosureData>>> = const { RefCell::new(Vec::new()) };
}

fn closure_class() -> JscResult<JscClass> {
    CLOSURE_CLASS.with(|cell| {
        if let Some(class) = cell.borrow().as_ref() {
            return Ok(class.clone());
        }

        let class = ClassDefinition::new("RustFunction")
            .call_as_function(Some(call_closure))
            .finalize(Some(finalize_closure))
            .build()?;
        *cell.borrow_mut() = Some(class.clone());
        Ok(class)
    })
}

/// Drop closures whose function objects have been collected on this thread
pub(crate) fn release_retired_closures() {
    let retired = RETIRED_CLOSURES
        .try_with(|cell| cell.try_borrow_mut().map(|mut v| mem::take(&mut *v)).unwrap_or_default())
        .unwrap_or_default();
    if !retired.is_empty() {
        debug!(count = retired.len(), "Releasing collected closures");
    }
    drop(retired);
}

unsafe extern "C" fn finalize_closure(object: JSObjectRef) {
    // SAFETY: the private data of RustFunction instances is always a ClosureData box
    let data = unsafe { JSObjectGetPrivate(object) } as *mut ClosureData;
    if data.is_null() {
        return;
    }
    // If the thread-local is gone or busy the closure leaks; dropping it here
    // could reach back into the engine.
    let _ = RETIRED_CLOSURES.try_with(|cell| {
        if let Ok(mut retired) = cell.try_borrow_mut() {
            // SAFETY: set in create_closure and reclaimed nowhere else
            retired.push(unsafe { Box::from_raw(data) });
        }
    });
}

unsafe extern "C" fn call_closure(
    ctx: JSContextRef,
    function: JSObjectRef,
    this_object: JSObjectRef,
    argument_count: usize,
    arguments: *const JSValueRef,
    exception: *mut JSValueRef,
) -> JSValueRef {
    release_retired_closures();

    // SAFETY: function is a RustFunction instance
    let data = unsafe { JSObjectGetPrivate(function) } as *const ClosureData;
    if data.is_null() {
        // SAFETY: ctx is valid for the duration of the callback
        return unsafe { JSValueMakeUndefined(ctx) };
    }
    // SAFETY: the box lives until the function object is finalized
    let data = unsafe { &*data };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: the engine passes argument_count live values in arguments
        unsafe { invoke(data, ctx, this_object, argument_count, arguments) }
    }));

    let err = match outcome {
        Ok(Ok(value)) => return value.raw(),
        Ok(Err(err)) => err,
        Err(panic) => {
            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                format!("Rust panic in {}: {}", data.name, s)
            } else if let Some(s) = panic.downcast_ref::<String>() {
                format!("Rust panic in {}: {}", data.name, s)
            } else {
                format!("Rust panic in {}: unknown error", data.name)
            };
            warn!("{}", message);
            JscError::internal(message)
        }
    };

    // SAFETY: ctx and exception come from the engine
    unsafe {
        throw_error(ctx, exception, &err);
        JSValueMakeUndefined(ctx)
    }
}

unsafe fn invoke(
    data: &ClosureData,
    ctx: JSContextRef,
    this_object: JSObjectRef,
    argument_count: usize,
    arguments: *const JSValueRef,
) -> JscResult<JscValue> {
    // SAFETY: ctx is valid for the duration of the callback
    let context = unsafe { JscContext::from_raw_retained(ctx) }?;
    let this = if this_object.is_null() {
        None
    } else {
        // SAFETY: this_object is a live object of ctx
        Some(unsafe { JscObject::new(&context, this_object) })
    };
    let raw_args: &[JSValueRef] = if argument_count == 0 || arguments.is_null() {
        &[]
    } else {
        // SAFETY: the engine passes argument_count live values
        unsafe { slice::from_raw_parts(arguments, argument_count) }
    };
    let args: Vec<JscValue> = raw_args
        .iter()
        // SAFETY: every argument is a live value of ctx
        .map(|&value| unsafe { JscValue::new(&context, value) })
        .collect();

    (data.callback)(&context, this.as_ref(), &args)
}

/// Store an `Error` describing `err` in the exception slot
unsafe fn throw_error(ctx: JSContextRef, exception: *mut JSValueRef, err: &JscError) {
    if exception.is_null() {
        return;
    }

    let units: Vec<u16> = err.js_message().encode_utf16().collect();
    let Ok(message) = JscString::from_utf16(&units) else {
        return;
    };

    // SAFETY: ctx is valid and exception is writable
    unsafe {
        let message = JSValueMakeString(ctx, message.raw());
        let args = [message];
        let error = JSObjectMakeError(ctx, args.len(), args.as_ptr(), ptr::null_mut());
        if error.is_null() {
            *exception = message;
            return;
        }

        let error_type = err.error_type();
        if error_type != "Error" {
            if let (Ok(key), Ok(name)) = (JscString::new("name"), JscString::new(error_type)) {
                JSObjectSetProperty(
                    ctx,
                    error,
                    key.raw(),
                    JSValueMakeString(ctx, name.raw()),
                    PropertyAttributes::DONT_ENUM.bits(),
                    ptr::null_mut(),
                );
            }
        }
        *exception = error;
    }
}

impl JscContext {
    /// Create a function object that runs `f` when called from JavaScript
    pub fn create_closure<F>(&self, name: &str, f: F) -> JscResult<JscObject>
    where
        F: Fn(&JscContext, Option<&JscObject>, &[JscValue]) -> JscResult<JscValue> + 'static,
    {
        release_retired_closures();

        let class = closure_class()?;
        let data = Box::into_raw(Box::new(ClosureData {
            name: name.to_string(),
            callback: Box::new(f),
        }));

        // SAFETY: ctx and class are valid; the object owns data from here on
        let object = unsafe { JSObjectMake(self.raw(), class.raw(), data as *mut c_void) };
        if object.is_null() {
            // SAFETY: the engine never saw data
            drop(unsafe { Box::from_raw(data) });
            return Err(JscError::null_pointer("JSObjectMake"));
        }
        // SAFETY: object is a live object of this context
        let function = unsafe { JscObject::new(self, object) };

        if let Some(prototype) = self.get_global("Function")?.as_object() {
            function.set_prototype(&prototype.get("prototype")?);
        }
        function.set_with_attributes(
            "name",
            &self.string(name)?,
            PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM,
        )?;

        Ok(function)
    }

    /// Expose a Rust closure as a global function
    ///
    /// # Example
    ///
    /// ```no_run
    /// use jscore::JscContext;
    ///
    /// let ctx = JscContext::new()?;
    /// ctx.register_closure("add", |ctx, _this, args| {
    ///     let sum = args.iter().map(|a| a.to_number()).sum::<Result<f64, _>>()?;
    ///     Ok(ctx.number(sum))
    /// })?;
    /// assert_eq!(ctx.eval("add(1, 2, 3)")?.to_number()?, 6.0);
    /// # Ok::<(), jscore::JscError>(())
    /// ```
    pub fn register_closure<F>(&self, name: &str, f: F) -> JscResult<()>
    where
        F: Fn(&JscContext, Option<&JscObject>, &[JscValue]) -> JscResult<JscValue> + 'static,
    {
        let function = self.create_closure(name, f)?;
        self.set_global(name, &function.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_closure_receives_arguments() {
        let ctx = JscContext::new().unwrap();
        ctx.register_closure("sum", |ctx, _this, args| {
            let mut total = 0.0;
            for arg in args {
                total += arg.to_number()?;
            }
            Ok(ctx.number(total))
        })
        .unwrap();

        assert_eq!(ctx.eval("sum(1, 2, 3.5)").unwrap().to_number().unwrap(), 6.5);
        assert_eq!(ctx.eval("sum()").unwrap().to_number().unwrap(), 0.0);
    }

    #[test]
    fn test_closure_captures_state() {
        let ctx = JscContext::new().unwrap();
        let calls = Rc::new(Cell::new(0u32));
        let counter = calls.clone();
        ctx.register_closure("tick", move |ctx, _this, _args| {
            counter.set(counter.get() + 1);
            Ok(ctx.number(counter.get() as f64))
        })
        .unwrap();

        ctx.eval("tick(); tick(); tick();").unwrap();
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_closure_sees_this() {
        let ctx = JscContext::new().unwrap();
        let describe = ctx
            .create_closure("describe", |ctx, this, _args| match this {
                Some(this) => this.get("label"),
                None => Ok(ctx.undefined()),
            })
            .unwrap();
        ctx.set_global("describe", &describe.into()).unwrap();

        let label = ctx
            .eval("({ label: 'mine', describe }).describe()")
            .unwrap();
        assert_eq!(label.to_string().unwrap(), "mine");
    }

    #[test]
    fn test_closure_looks_like_a_function() {
        let ctx = JscContext::new().unwrap();
        ctx.register_closure("named", |ctx, _this, _args| Ok(ctx.null()))
            .unwrap();

        assert_eq!(ctx.eval("typeof named").unwrap().to_string().unwrap(), "function");
        assert_eq!(ctx.eval("named.name").unwrap().to_string().unwrap(), "named");
        assert!(ctx.eval("named.call(null) === null").unwrap().to_bool());
        assert!(ctx.eval("named instanceof Function").unwrap().to_bool());
    }

    #[test]
    fn test_closure_error_becomes_exception() {
        let ctx = JscContext::new().unwrap();
        ctx.register_closure("fail", |_ctx, _this, _args| {
            Err(JscError::script_error("RangeError", "out of range"))
        })
        .unwrap();

        let caught = ctx
            .eval("try { fail(); 'no' } catch (e) { `${e.name}:${e.message}:${e instanceof Error}` }")
            .unwrap();
        assert_eq!(caught.to_string().unwrap(), "RangeError:out of range:true");

        let err = ctx.eval("fail()").unwrap_err();
        assert_eq!(err.error_type(), "RangeError");
        assert_eq!(err.js_message(), "out of range");
    }

    #[test]
    fn test_nested_js_exception_propagates() {
        let ctx = JscContext::new().unwrap();
        ctx.register_closure("invoke", |_ctx, _this, args| {
            let callback = args
                .first()
                .and_then(JscValue::as_object)
                .ok_or_else(|| JscError::type_error("function", "nothing"))?;
            callback.call(None, &[])
        })
        .unwrap();

        let err = ctx
            .eval("invoke(() => { throw new SyntaxError('inner'); })")
            .unwrap_err();
        assert_eq!(err.js_message(), "inner");
        assert_eq!(err.error_type(), "SyntaxError");

        let err = ctx.eval("invoke()").unwrap_err();
        assert_eq!(err.error_type(), "TypeError");
    }

    #[test]
    fn test_panic_is_caught() {
        let ctx = JscContext::new().unwrap();
        ctx.register_closure("explode", |_ctx, _this, _args| -> JscResult<JscValue> {
            panic!("boom")
        })
        .unwrap();

        let err = ctx.eval("explode()").unwrap_err();
        assert!(err.js_message().contains("boom"));
        assert!(err.js_message().contains("explode"));

        // The context stays usable afterwards
        assert_eq!(ctx.eval("1 + 1").unwrap().to_number().unwrap(), 2.0);
    }

    #[test]
    fn test_closure_captures_dropped_after_gc() {
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        {
            let ctx = JscContext::new().unwrap();
            let flag = Flag(dropped.clone());
            ctx.register_closure("held", move |ctx, _this, _args| {
                let _ = &flag;
                Ok(ctx.undefined())
            })
            .unwrap();
            ctx.eval("held()").unwrap();
        }
        // The finalizer only retires the closure; its captures stay alive
        assert!(!dropped.get());

        JscContext::new().unwrap().gc();
        assert!(dropped.get());
    }

    #[test]
    fn test_class_is_shared_per_thread() {
        let first = closure_class().unwrap();
        let second = closure_class().unwrap();
        assert_eq!(first, second);
    }
}
