//! The codec entry points.
//!
//! Every call opens a fresh reference-tracker session, recurses through
//! the value or text graph, and returns a fully materialized result or a
//! typed error. Nothing is recovered internally and no partial result is
//! ever handed back.

mod decode;
mod encode;
mod scan;

use crate::error::{DecodeError, EncodeError};
use crate::info::{Described, WireKind};
use crate::registry::TypeRegistry;
use crate::value::{Codable, Handle, Obj, Value};

use decode::Decoder;
use encode::Encoder;

// -----------------------------------------------------------------------------
// Codec

/// An encoder/decoder bound to a [`TypeRegistry`].
///
/// A `Codec` is cheap to construct and holds no session state; each
/// entry point opens its own tracker session. Concurrent callers simply
/// construct their own `Codec`; there is no global state to share.
///
/// # Examples
///
/// ```
/// use knotwire::derive::Codable;
/// use knotwire::{Codec, TypeRegistry, obj};
///
/// #[derive(Codable, Default, Debug, PartialEq)]
/// #[codable(default)]
/// struct Person {
///     #[codable(rename = "full_name", required)]
///     name: String,
///     age: i32,
///     company: Option<String>,
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Person>();
/// let codec = Codec::new(&registry);
///
/// let ann = obj(Person { name: "Ann".into(), age: 30, company: None });
/// let text = codec.encode_obj(&ann).unwrap();
/// assert_eq!(text, r#"{"$id":"ref_1","full_name":"Ann","age":30}"#);
///
/// let back = codec.decode_obj::<Person>(&text).unwrap();
/// assert_eq!(*back.borrow(), *ann.borrow());
/// ```
pub struct Codec<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Codec<'r> {
    /// Creates a codec over the given registry.
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Encodes a value graph to wire text.
    ///
    /// An object instance reached twice is written once in full and
    /// afterwards as a `{"$ref": ...}` marker; reaching an instance
    /// whose own expansion is still in progress fails with
    /// [`EncodeError::CircularReference`].
    pub fn encode(&self, value: &Value) -> Result<String, EncodeError> {
        Encoder::new(self.registry).encode(value)
    }

    /// Encodes a shared object handle. Convenience over
    /// [`encode`](Self::encode).
    pub fn encode_obj<T: Codable>(&self, value: &Obj<T>) -> Result<String, EncodeError> {
        self.encode(&Value::Object(Handle::from_obj(value.clone())))
    }

    /// Encodes `value`, first checking that `type_name` resolves to a
    /// registered type and that `value` is an instance of it.
    pub fn encode_as_type(&self, type_name: &str, value: &Value) -> Result<String, EncodeError> {
        let Some(descriptor) = self.registry.get_with_name(type_name) else {
            return Err(EncodeError::UnknownType {
                type_name: type_name.into(),
            });
        };
        match value {
            Value::Object(handle) if handle.ty_id() == descriptor.ty_id() => self.encode(value),
            _ => Err(EncodeError::UnknownType {
                type_name: type_name.into(),
            }),
        }
    }

    /// Decodes wire text against a declared kind.
    ///
    /// The kind of any encodable type is available through
    /// [`Wire::kind`](crate::Wire::kind):
    ///
    /// ```
    /// use knotwire::{Codec, TypeRegistry, Value, Wire};
    ///
    /// let registry = TypeRegistry::new();
    /// let codec = Codec::new(&registry);
    ///
    /// let value = codec.decode("[1, 2, 3]", &<Vec<i64>>::kind()).unwrap();
    /// assert_eq!(
    ///     value,
    ///     Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
    /// );
    /// ```
    ///
    /// Hand-written wire text can close a reference cycle the encoder
    /// would have rejected; the decoder materializes it, producing an
    /// `Rc` cycle the caller must break to reclaim memory.
    pub fn decode(&self, text: &str, target: &WireKind) -> Result<Value, DecodeError> {
        Decoder::new().decode(text, target)
    }

    /// Decodes wire text into a shared handle of the target type.
    pub fn decode_obj<T: Described>(&self, text: &str) -> Result<Obj<T>, DecodeError> {
        let descriptor = T::type_descriptor();
        match Decoder::new().decode_as(text, descriptor)? {
            Value::Object(handle) => match handle.downcast::<T>() {
                Some(instance) => Ok(instance),
                None => Err(DecodeError::TypeMismatch {
                    expected: descriptor.name().into(),
                    found: handle.type_name().into(),
                }),
            },
            other => Err(DecodeError::TypeMismatch {
                expected: format!("`{}` object", descriptor.name()),
                found: other.kind_name().into(),
            }),
        }
    }

    /// Decodes wire text against a type resolved by wire name.
    pub fn decode_as_type(&self, text: &str, type_name: &str) -> Result<Value, DecodeError> {
        let Some(descriptor) = self.registry.get_with_name(type_name) else {
            return Err(DecodeError::UnknownType {
                type_name: type_name.into(),
            });
        };
        Decoder::new().decode_as(text, descriptor)
    }
}
