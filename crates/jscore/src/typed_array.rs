//! Typed arrays and array buffers

use jscore_sys::*;
use std::ffi::c_void;
use std::ptr;
use std::slice;

use crate::context::JscContext;
use crate::error::{JscError, JscResult, check_exception};
use crate::object::JscObject;

/// Element type of a typed array, or `ArrayBuffer` for the buffer itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    Int8,
    Int16,
    Int32,
    Uint8,
    Uint8Clamped,
    Uint16,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
    ArrayBuffer,
}

impl TypedArrayKind {
    /// Map an engine `JSTypedArrayType`; `kJSTypedArrayTypeNone` maps to `None`
    pub fn from_raw(raw: JSTypedArrayType) -> Option<Self> {
        let kind = match raw {
            K_JS_TYPED_ARRAY_TYPE_INT8_ARRAY => Self::Int8,
            K_JS_TYPED_ARRAY_TYPE_INT16_ARRAY => Self::Int16,
            K_JS_TYPED_ARRAY_TYPE_INT32_ARRAY => Self::Int32,
            K_JS_TYPED_ARRAY_TYPE_UINT8_ARRAY => Self::Uint8,
            K_JS_TYPED_ARRAY_TYPE_UINT8_CLAMPED_ARRAY => Self::Uint8Clamped,
            K_JS_TYPED_ARRAY_TYPE_UINT16_ARRAY => Self::Uint16,
            K_JS_TYPED_ARRAY_TYPE_UINT32_ARRAY => Self::Uint32,
            K_JS_TYPED_ARRAY_TYPE_FLOAT32_ARRAY => Self::Float32,
            K_JS_TYPED_ARRAY_TYPE_FLOAT64_ARRAY => Self::Float64,
            K_JS_TYPED_ARRAY_TYPE_BIG_INT64_ARRAY => Self::BigInt64,
            K_JS_TYPED_ARRAY_TYPE_BIG_UINT64_ARRAY => Self::BigUint64,
            K_JS_TYPED_ARRAY_TYPE_ARRAY_BUFFER => Self::ArrayBuffer,
            _ => return None,
        };
        Some(kind)
    }

    /// The engine `JSTypedArrayType`
    pub fn to_raw(self) -> JSTypedArrayType {
        match self {
            Self::Int8 => K_JS_TYPED_ARRAY_TYPE_INT8_ARRAY,
            Self::Int16 => K_JS_TYPED_ARRAY_TYPE_INT16_ARRAY,
            Self::Int32 => K_JS_TYPED_ARRAY_TYPE_INT32_ARRAY,
            Self::Uint8 => K_JS_TYPED_ARRAY_TYPE_UINT8_ARRAY,
            Self::Uint8Clamped => K_JS_TYPED_ARRAY_TYPE_UINT8_CLAMPED_ARRAY,
            Self::Uint16 => K_JS_TYPED_ARRAY_TYPE_UINT16_ARRAY,
            Self::Uint32 => K_JS_TYPED_ARRAY_TYPE_UINT32_ARRAY,
            Self::Float32 => K_JS_TYPED_ARRAY_TYPE_FLOAT32_ARRAY,
            Self::Float64 => K_JS_TYPED_ARRAY_TYPE_FLOAT64_ARRAY,
            Self::BigInt64 => K_JS_TYPED_ARRAY_TYPE_BIG_INT64_ARRAY,
            Self::BigUint64 => K_JS_TYPED_ARRAY_TYPE_BIG_UINT64_ARRAY,
            Self::ArrayBuffer => K_JS_TYPED_ARRAY_TYPE_ARRAY_BUFFER,
        }
    }

    /// Bytes per element; 1 for `ArrayBuffer`
    pub fn element_size(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 | Self::Uint8Clamped | Self::ArrayBuffer => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 | Self::BigInt64 | Self::BigUint64 => 8,
        }
    }

    fn element_kind(self) -> JscResult<Self> {
        match self {
            Self::ArrayBuffer => Err(JscError::type_error("typed array kind", "ArrayBuffer")),
            kind => Ok(kind),
        }
    }
}

/// Deallocator for storage handed over by `typed_array_from_vec` and friends
unsafe extern "C" fn drop_boxed_bytes(_bytes: *mut c_void, context: *mut c_void) {
    if !context.is_null() {
        // SAFETY: context came from Box::into_raw in hand_over
        drop(unsafe { Box::from_raw(context as *mut Vec<u8>) });
    }
}

/// Box the vector so its heap buffer stays put until the engine releases it
fn hand_over(bytes: Vec<u8>) -> (*mut c_void, usize, *mut c_void) {
    let mut boxed = Box::new(bytes);
    let data = boxed.as_mut_ptr() as *mut c_void;
    let len = boxed.len();
    (data, len, Box::into_raw(boxed) as *mut c_void)
}

impl JscContext {
    /// Create a zero-filled typed array of `length` elements
    pub fn create_typed_array(&self, kind: TypedArrayKind, length: usize) -> JscResult<JscObject> {
        let kind = kind.element_kind()?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx is valid
        unsafe {
            let array = JSObjectMakeTypedArray(self.raw(), kind.to_raw(), length, &mut exception);
            check_exception(self.raw(), exception)?;
            JscObject::from_result(self, array, "JSObjectMakeTypedArray")
        }
    }

    /// Create a typed array that takes ownership of `bytes` without copying
    ///
    /// The length must be a multiple of the element size. Buffers that are
    /// empty or not aligned for the element type are copied instead.
    pub fn typed_array_from_vec(
        &self,
        kind: TypedArrayKind,
        bytes: Vec<u8>,
    ) -> JscResult<JscObject> {
        let kind = kind.element_kind()?;
        let element_size = kind.element_size();
        if bytes.len() % element_size != 0 {
            return Err(JscError::type_error(
                format!("byte length divisible by {}", element_size),
                bytes.len().to_string(),
            ));
        }

        if bytes.is_empty() || bytes.as_ptr() as usize % element_size != 0 {
            let array = self.create_typed_array(kind, bytes.len() / element_size)?;
            array.write_typed_array_bytes(0, &bytes)?;
            return Ok(array);
        }

        let (data, len, owner) = hand_over(bytes);
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: data stays valid until drop_boxed_bytes runs with owner. Once
        // the engine has wrapped the storage it calls the deallocator even if
        // creating the view then fails.
        unsafe {
            let array = JSObjectMakeTypedArrayWithBytesNoCopy(
                self.raw(),
                kind.to_raw(),
                data,
                len,
                Some(drop_boxed_bytes),
                owner,
                &mut exception,
            );
            check_exception(self.raw(), exception)?;
            JscObject::from_result(self, array, "JSObjectMakeTypedArrayWithBytesNoCopy")
        }
    }

    /// Create an ArrayBuffer that takes ownership of `bytes` without copying
    pub fn array_buffer_from_vec(&self, bytes: Vec<u8>) -> JscResult<JscObject> {
        let (data, len, owner) = hand_over(bytes);
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: data stays valid until drop_boxed_bytes runs with owner
        unsafe {
            let buffer = JSObjectMakeArrayBufferWithBytesNoCopy(
                self.raw(),
                data,
                len,
                Some(drop_boxed_bytes),
                owner,
                &mut exception,
            );
            check_exception(self.raw(), exception)?;
            JscObject::from_result(self, buffer, "JSObjectMakeArrayBufferWithBytesNoCopy")
        }
    }

    /// Create a typed array view over an existing ArrayBuffer
    ///
    /// With `range` of `None` the view covers the whole buffer; otherwise it
    /// is `(byte_offset, length_in_elements)`.
    pub fn typed_array_on_buffer(
        &self,
        kind: TypedArrayKind,
        buffer: &JscObject,
        range: Option<(usize, usize)>,
    ) -> JscResult<JscObject> {
        let kind = kind.element_kind()?;
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx and buffer are valid
        unsafe {
            let array = match range {
                None => JSObjectMakeTypedArrayWithArrayBuffer(
                    self.raw(),
                    kind.to_raw(),
                    buffer.raw(),
                    &mut exception,
                ),
                Some((byte_offset, length)) => JSObjectMakeTypedArrayWithArrayBufferAndOffset(
                    self.raw(),
                    kind.to_raw(),
                    buffer.raw(),
                    byte_offset,
                    length,
                    &mut exception,
                ),
            };
            check_exception(self.raw(), exception)?;
            JscObject::from_result(self, array, "JSObjectMakeTypedArrayWithArrayBuffer")
        }
    }
}

impl JscObject {
    fn typed_query<T>(
        &self,
        query: unsafe extern "C" fn(JSContextRef, JSObjectRef, *mut JSValueRef) -> T,
    ) -> JscResult<T> {
        let ctx = self.context().raw();
        let mut exception: JSValueRef = ptr::null();
        // SAFETY: ctx and object are valid
        unsafe {
            let result = query(ctx, self.raw(), &mut exception);
            check_exception(ctx, exception)?;
            Ok(result)
        }
    }

    /// Number of elements; 0 if this is not a typed array
    pub fn typed_array_len(&self) -> JscResult<usize> {
        self.typed_query(JSObjectGetTypedArrayLength)
    }

    /// Length of the view in bytes
    pub fn typed_array_byte_len(&self) -> JscResult<usize> {
        self.typed_query(JSObjectGetTypedArrayByteLength)
    }

    /// Offset of the view into its buffer, in bytes
    pub fn typed_array_byte_offset(&self) -> JscResult<usize> {
        self.typed_query(JSObjectGetTypedArrayByteOffset)
    }

    /// The ArrayBuffer backing this typed array
    pub fn typed_array_buffer(&self) -> JscResult<JscObject> {
        let buffer = self.typed_query(JSObjectGetTypedArrayBuffer)?;
        // SAFETY: buffer came from this object's context
        unsafe { JscObject::from_result(self.context(), buffer, "JSObjectGetTypedArrayBuffer") }
    }

    /// Copy the bytes visible through this typed array
    pub fn typed_array_bytes(&self) -> JscResult<Vec<u8>> {
        // SAFETY: the copy does not reach the engine or any other view
        unsafe { self.with_typed_array_bytes_mut(|bytes| bytes.to_vec()) }
    }

    /// Overwrite the view's bytes starting at `byte_offset` with `src`
    pub fn write_typed_array_bytes(&self, byte_offset: usize, src: &[u8]) -> JscResult<()> {
        // SAFETY: the copy does not reach the engine or any other view
        unsafe {
            self.with_typed_array_bytes_mut(|bytes| {
                let end = byte_offset
                    .checked_add(src.len())
                    .filter(|&end| end <= bytes.len())
                    .ok_or_else(|| {
                        JscError::type_error(
                            format!("range within {} bytes", bytes.len()),
                            format!("{} bytes at offset {}", src.len(), byte_offset),
                        )
                    })?;
                bytes[byte_offset..end].copy_from_slice(src);
                Ok(())
            })?
        }
    }

    /// Run `f` over the bytes visible through this typed array
    ///
    /// The slice aliases engine memory, so this cannot be called from safe code:
    ///
    /// ```compile_fail
    /// # let ctx = jscore::JscContext::new().unwrap();
    /// let array = ctx.create_typed_array(jscore::TypedArrayKind::Uint8, 4).unwrap();
    /// array.with_typed_array_bytes_mut(|bytes| bytes[0] = 1).unwrap();
    /// ```
    ///
    /// # Safety
    /// Until `f` returns nothing else may touch the same buffer. `f` must not
    /// run JavaScript, call into the engine for this array or any view
    /// sharing its buffer, or nest another call over the same memory. Any
    /// of those can alias the slice or detach the buffer under it.
    pub unsafe fn with_typed_array_bytes_mut<R>(
        &self,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> JscResult<R> {
        let byte_len = self.typed_array_byte_len()?;
        let byte_offset = self.typed_array_byte_offset()?;
        if byte_len == 0 {
            return Ok(f(&mut []));
        }

        let base = self.typed_query(JSObjectGetTypedArrayBytesPtr)?;
        if base.is_null() {
            return Err(JscError::type_error("typed array", "object"));
        }
        // The pointer is the start of the backing buffer, not of the view
        // SAFETY: offset and length describe the live view inside the buffer
        let bytes = unsafe {
            slice::from_raw_parts_mut((base as *mut u8).add(byte_offset), byte_len)
        };
        Ok(f(bytes))
    }

    /// Length of this ArrayBuffer in bytes
    pub fn array_buffer_byte_len(&self) -> JscResult<usize> {
        self.typed_query(JSObjectGetArrayBufferByteLength)
    }

    /// Copy the contents of this ArrayBuffer
    pub fn array_buffer_bytes(&self) -> JscResult<Vec<u8>> {
        let len = self.array_buffer_byte_len()?;
        if len == 0 {
            return Ok(Vec::new());
        }
        let data = self.typed_query(JSObjectGetArrayBufferBytesPtr)?;
        if data.is_null() {
            return Err(JscError::type_error("ArrayBuffer", "object"));
        }
        // SAFETY: data points at len live bytes and nothing runs in between
        Ok(unsafe { slice::from_raw_parts(data as *const u8, len) }.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_kind_mapping() {
        for raw in 0..=12 {
            match TypedArrayKind::from_raw(raw) {
                Some(kind) => assert_eq!(kind.to_raw(), raw),
                None => assert_eq!(raw, K_JS_TYPED_ARRAY_TYPE_NONE),
            }
        }
        assert_eq!(TypedArrayKind::Float64.element_size(), 8);
        assert_eq!(TypedArrayKind::Uint16.element_size(), 2);
    }

    #[test]
    fn test_create_zeroed() {
        let ctx = JscContext::new().unwrap();
        let array = ctx.create_typed_array(TypedArrayKind::Int32, 4).unwrap();
        assert_eq!(array.typed_array_len().unwrap(), 4);
        assert_eq!(array.typed_array_byte_len().unwrap(), 16);
        assert_eq!(array.typed_array_bytes().unwrap(), vec![0; 16]);
        assert_eq!(
            array.as_value().typed_array_type().unwrap(),
            Some(TypedArrayKind::Int32)
        );
    }

    #[test]
    fn test_array_buffer_kind_rejected() {
        let ctx = JscContext::new().unwrap();
        let err = ctx
            .create_typed_array(TypedArrayKind::ArrayBuffer, 1)
            .unwrap_err();
        assert!(matches!(err, JscError::TypeError { .. }));
    }

    #[test]
    fn test_from_vec_is_visible_to_js() {
        let ctx = JscContext::new().unwrap();
        let array = ctx
            .typed_array_from_vec(TypedArrayKind::Uint8, vec![1, 2, 3, 4])
            .unwrap();
        ctx.set_global("bytes", &array.as_value()).unwrap();

        let sum = ctx.eval("bytes.reduce((a, b) => a + b, 0)").unwrap();
        assert_eq!(sum.to_number().unwrap(), 10.0);

        ctx.eval("bytes[0] = 200").unwrap();
        assert_eq!(array.typed_array_bytes().unwrap(), vec![200, 2, 3, 4]);
    }

    #[test]
    fn test_from_vec_wide_elements() {
        let ctx = JscContext::new().unwrap();
        let bytes: Vec<u8> = [1u16, 2, 3].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let array = ctx.typed_array_from_vec(TypedArrayKind::Uint16, bytes).unwrap();
        assert_eq!(array.typed_array_len().unwrap(), 3);
        ctx.set_global("wide", &array.as_value()).unwrap();
        assert_eq!(ctx.eval("wide[2]").unwrap().to_number().unwrap(), 3.0);
    }

    #[test]
    fn test_from_vec_rejects_partial_elements() {
        let ctx = JscContext::new().unwrap();
        let err = ctx
            .typed_array_from_vec(TypedArrayKind::Float32, vec![0; 6])
            .unwrap_err();
        assert!(matches!(err, JscError::TypeError { .. }));
    }

    #[test]
    fn test_from_empty_vec() {
        let ctx = JscContext::new().unwrap();
        let array = ctx
            .typed_array_from_vec(TypedArrayKind::Float64, Vec::new())
            .unwrap();
        assert_eq!(array.typed_array_len().unwrap(), 0);
        assert!(array.typed_array_bytes().unwrap().is_empty());
    }

    #[test]
    fn test_array_buffer_round_trip() {
        let ctx = JscContext::new().unwrap();
        let buffer = ctx.array_buffer_from_vec(vec![9, 8, 7, 6]).unwrap();
        assert_eq!(buffer.array_buffer_byte_len().unwrap(), 4);
        assert_eq!(buffer.array_buffer_bytes().unwrap(), vec![9, 8, 7, 6]);
        assert_eq!(
            buffer.as_value().typed_array_type().unwrap(),
            Some(TypedArrayKind::ArrayBuffer)
        );
    }

    #[test]
    fn test_view_on_buffer() {
        let ctx = JscContext::new().unwrap();
        let buffer = ctx.array_buffer_from_vec(vec![0, 1, 2, 3, 4, 5, 6, 7]).unwrap();

        let whole = ctx
            .typed_array_on_buffer(TypedArrayKind::Uint8, &buffer, None)
            .unwrap();
        assert_eq!(whole.typed_array_len().unwrap(), 8);

        let window = ctx
            .typed_array_on_buffer(TypedArrayKind::Uint8, &buffer, Some((2, 3)))
            .unwrap();
        assert_eq!(window.typed_array_byte_offset().unwrap(), 2);
        assert_eq!(window.typed_array_bytes().unwrap(), vec![2, 3, 4]);
        assert!(window.typed_array_buffer().unwrap().as_value().strict_eq(&buffer.as_value()));

        assert!(
            ctx.typed_array_on_buffer(TypedArrayKind::Uint8, &buffer, Some((6, 4)))
                .is_err()
        );
    }

    #[test]
    fn test_write_respects_view_bounds() {
        let ctx = JscContext::new().unwrap();
        let buffer = ctx.array_buffer_from_vec(vec![0; 8]).unwrap();
        let window = ctx
            .typed_array_on_buffer(TypedArrayKind::Uint8, &buffer, Some((4, 4)))
            .unwrap();

        window.write_typed_array_bytes(1, &[7, 8]).unwrap();
        assert_eq!(buffer.array_buffer_bytes().unwrap(), vec![0, 0, 0, 0, 0, 7, 8, 0]);

        let err = window.write_typed_array_bytes(3, &[1, 2]).unwrap_err();
        assert!(matches!(err, JscError::TypeError { .. }));
        assert!(window.write_typed_array_bytes(usize::MAX, &[1]).is_err());
        assert_eq!(buffer.array_buffer_bytes().unwrap(), vec![0, 0, 0, 0, 0, 7, 8, 0]);
    }

    #[test]
    fn test_plain_object_is_not_typed() {
        let ctx = JscContext::new().unwrap();
        let obj = ctx.create_object();
        assert_eq!(obj.as_value().typed_array_type().unwrap(), None);
        assert_eq!(obj.typed_array_len().unwrap(), 0);
        assert!(obj.typed_array_bytes().unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn test_handed_over_buffers_are_released() {
        let ctx = JscContext::new().unwrap();
        for _ in 0..64 {
            let array = ctx
                .typed_array_from_vec(TypedArrayKind::Uint8, vec![0xAB; 4096])
                .unwrap();
            drop(array);
        }
        ctx.gc();
        let survivor = ctx.array_buffer_from_vec(vec![1]).unwrap();
        assert_eq!(survivor.array_buffer_bytes().unwrap(), vec![1]);
    }
}
