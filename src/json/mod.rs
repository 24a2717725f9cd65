//! JSON capability consumed by the features.
//!
//! The SDK does not parse JSON itself. Features are generic over a document
//! type implementing [`JsonObject`], which exposes key lookup, indexed access,
//! typed extraction, size measurement and serialization. With the `alloc`
//! feature an implementation for [`serde_json::Value`] is provided.
//!
//! Outbound documents with a fixed shape are written with
//! [`serde_json_core`] into stack buffers, see [`JsonWriter`].

#[cfg(feature = "alloc")]
mod value;

use serde::Serialize;

use crate::error::Error;

/// A parsed JSON value.
pub trait JsonObject: Sized {
    /// Parses `bytes` into a document. Returns `None` for malformed input.
    fn parse(bytes: &[u8]) -> Option<Self>;

    /// Whether this is the JSON `null` literal.
    fn is_null(&self) -> bool;

    /// Whether this is a JSON object.
    fn is_object(&self) -> bool;

    /// Member `key` of an object; `None` for missing keys and non-objects.
    fn get(&self, key: &str) -> Option<&Self>;

    /// Element `index` of an array; `None` when out of range or not an array.
    fn get_index(&self, index: usize) -> Option<&Self>;

    /// Number of members of an object or elements of an array, zero otherwise.
    fn len(&self) -> usize;

    /// The string content, if this is a string.
    fn as_str(&self) -> Option<&str>;

    /// The value as an unsigned integer, if it is one.
    fn as_u64(&self) -> Option<u64>;

    /// The value as a signed integer, if it is one.
    fn as_i64(&self) -> Option<i64>;

    /// The value as a float, if it is a number.
    fn as_f64(&self) -> Option<f64>;

    /// The value as a boolean, if it is one.
    fn as_bool(&self) -> Option<bool>;

    /// Size in bytes of the compact serialization.
    fn measure(&self) -> usize;

    /// Writes the compact serialization into `buffer`, returning the number
    /// of bytes written, or `None` if it does not fit.
    fn serialize_into(&self, buffer: &mut [u8]) -> Option<usize>;

    /// Whether `key` is a member of this object.
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Whether [`len`](JsonObject::len) is zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Incremental JSON writer over a caller-provided buffer.
///
/// Structural characters are written raw. Strings go through
/// [`serde_json_core`] so they are escaped, and embedded documents use
/// [`JsonObject::serialize_into`].
#[derive(Debug)]
pub struct JsonWriter<'b> {
    buffer: &'b mut [u8],
    written: usize,
}

impl<'b> JsonWriter<'b> {
    /// Starts writing at the beginning of `buffer`.
    pub fn new(buffer: &'b mut [u8]) -> Self {
        Self { buffer, written: 0 }
    }

    /// Appends `bytes` verbatim.
    pub fn raw(&mut self, bytes: &[u8]) -> Result<&mut Self, Error> {
        let end = self.written + bytes.len();
        if end > self.buffer.len() {
            return Err(Error::BufferTooSmall);
        }
        self.buffer[self.written..end].copy_from_slice(bytes);
        self.written = end;
        Ok(self)
    }

    /// Appends `value` as a quoted, escaped JSON string.
    pub fn string(&mut self, value: &str) -> Result<&mut Self, Error> {
        self.serialize(value)
    }

    /// Appends any serializable value.
    pub fn serialize<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<&mut Self, Error> {
        let len = serde_json_core::to_slice(value, &mut self.buffer[self.written..])
            .map_err(|_| Error::BufferTooSmall)?;
        self.written += len;
        Ok(self)
    }

    /// Appends `value` serialized compactly.
    pub fn document<J: JsonObject>(&mut self, value: &J) -> Result<&mut Self, Error> {
        let len = value
            .serialize_into(&mut self.buffer[self.written..])
            .ok_or(Error::BufferTooSmall)?;
        self.written += len;
        Ok(self)
    }

    /// Bytes written so far.
    pub fn finish(self) -> usize {
        self.written
    }
}
