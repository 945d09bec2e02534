use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::error::ValueError;
use crate::info::{Described, WireKind};
use crate::registry::TypeRegistry;
use crate::value::{Handle, Obj, Value};

// -----------------------------------------------------------------------------
// Wire

/// Conversion between a concrete field type and the runtime [`Value`]
/// model, plus the declared [`WireKind`] the decoder parses against.
///
/// Implemented for primitives, `String`, `char`, `Option<T>`, sequences
/// (`Vec<T>`, `[T; N]`), sets (`HashSet`, `BTreeSet`), string-keyed maps
/// (`HashMap`, `BTreeMap`) and object handles (`Obj<T>`). Every field of
/// a `#[derive(Codable)]` struct must implement it.
///
/// Containers forward [`register_dependencies`](Wire::register_dependencies)
/// to their element type so that registering a type pulls in the whole
/// reachable object schema.
pub trait Wire: Sized {
    /// The declared kind of this type on the wire.
    fn kind() -> WireKind;

    /// Converts a borrowed field into the runtime value model.
    fn to_value(&self) -> Value;

    /// Converts a decoded value back into the concrete type.
    fn from_value(value: Value) -> Result<Self, ValueError>;

    /// Registers the object types reachable through this type.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}

// -----------------------------------------------------------------------------
// Primitives

macro_rules! impl_wire_int {
    ($($ty:ty),* $(,)?) => {$(
        impl Wire for $ty {
            fn kind() -> WireKind {
                WireKind::Int
            }

            #[inline]
            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::Int(n) => <$ty>::try_from(n).map_err(|_| ValueError::Mismatch {
                        expected: stringify!($ty),
                        found: "integer (out of range)",
                    }),
                    other => Err(ValueError::Mismatch {
                        expected: stringify!($ty),
                        found: other.kind_name(),
                    }),
                }
            }
        }
    )*};
}

impl_wire_int!(i8, i16, i32, u8, u16, u32);

impl Wire for i64 {
    fn kind() -> WireKind {
        WireKind::Int
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(n) => Ok(n),
            other => Err(ValueError::Mismatch {
                expected: "i64",
                found: other.kind_name(),
            }),
        }
    }
}

macro_rules! impl_wire_float {
    ($($ty:ty),* $(,)?) => {$(
        impl Wire for $ty {
            fn kind() -> WireKind {
                WireKind::Float
            }

            #[inline]
            fn to_value(&self) -> Value {
                Value::Float(*self as f64)
            }

            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value {
                    Value::Float(f) => Ok(f as $ty),
                    // Untagged wire numbers: an integer-shaped literal may
                    // land in a float field.
                    Value::Int(n) => Ok(n as $ty),
                    other => Err(ValueError::Mismatch {
                        expected: stringify!($ty),
                        found: other.kind_name(),
                    }),
                }
            }
        }
    )*};
}

impl_wire_float!(f32, f64);

impl Wire for bool {
    fn kind() -> WireKind {
        WireKind::Bool
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ValueError::Mismatch {
                expected: "bool",
                found: other.kind_name(),
            }),
        }
    }
}

impl Wire for char {
    fn kind() -> WireKind {
        WireKind::Char
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Char(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(ValueError::Mismatch {
                expected: "char",
                found: other.kind_name(),
            }),
        }
    }
}

impl Wire for String {
    fn kind() -> WireKind {
        WireKind::Str
    }

    #[inline]
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(ValueError::Mismatch {
                expected: "string",
                found: other.kind_name(),
            }),
        }
    }
}

// -----------------------------------------------------------------------------
// Option

impl<T: Wire> Wire for Option<T> {
    fn kind() -> WireKind {
        WireKind::Nullable(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        T::register_dependencies(registry);
    }
}

// -----------------------------------------------------------------------------
// Sequences

impl<T: Wire> Wire for Vec<T> {
    fn kind() -> WireKind {
        WireKind::List(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Wire::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::Mismatch {
                expected: "list",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        T::register_dependencies(registry);
    }
}

impl<T: Wire, const N: usize> Wire for [T; N] {
    fn kind() -> WireKind {
        WireKind::Array(Box::new(T::kind()), N)
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Wire::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => {
                let items: Vec<T> = items
                    .into_iter()
                    .map(T::from_value)
                    .collect::<Result<_, _>>()?;
                <[T; N]>::try_from(items).map_err(|_| ValueError::Mismatch {
                    expected: "fixed-size array",
                    found: "list of another length",
                })
            }
            other => Err(ValueError::Mismatch {
                expected: "fixed-size array",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        T::register_dependencies(registry);
    }
}

// -----------------------------------------------------------------------------
// Sets

impl<T: Wire + Eq + Hash> Wire for HashSet<T> {
    fn kind() -> WireKind {
        WireKind::Set(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Wire::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::Mismatch {
                expected: "set",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        T::register_dependencies(registry);
    }
}

impl<T: Wire + Ord> Wire for BTreeSet<T> {
    fn kind() -> WireKind {
        WireKind::Set(Box::new(T::kind()))
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Wire::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(ValueError::Mismatch {
                expected: "set",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        T::register_dependencies(registry);
    }
}

// -----------------------------------------------------------------------------
// Maps

impl<V: Wire> Wire for HashMap<String, V> {
    fn kind() -> WireKind {
        WireKind::Map(Box::new(V::kind()))
    }

    fn to_value(&self) -> Value {
        let mut entries: Vec<(String, Value)> = self
            .iter()
            .map(|(key, value)| (key.clone(), value.to_value()))
            .collect();
        // Hash maps iterate in arbitrary order; sort for deterministic
        // wire output.
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Map(entries)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| V::from_value(value).map(|value| (key, value)))
                .collect(),
            other => Err(ValueError::Mismatch {
                expected: "map",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        V::register_dependencies(registry);
    }
}

impl<V: Wire> Wire for BTreeMap<String, V> {
    fn kind() -> WireKind {
        WireKind::Map(Box::new(V::kind()))
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(key, value)| (key.clone(), value.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| V::from_value(value).map(|value| (key, value)))
                .collect(),
            other => Err(ValueError::Mismatch {
                expected: "map",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        V::register_dependencies(registry);
    }
}

// -----------------------------------------------------------------------------
// Objects

impl<T: Described> Wire for Obj<T> {
    fn kind() -> WireKind {
        WireKind::Object(T::type_descriptor)
    }

    fn to_value(&self) -> Value {
        Value::Object(Handle::from_obj(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Object(handle) => match handle.downcast::<T>() {
                Some(instance) => Ok(instance),
                None => Err(ValueError::Mismatch {
                    expected: T::type_descriptor().name(),
                    found: handle.type_name(),
                }),
            },
            other => Err(ValueError::Mismatch {
                expected: "object",
                found: other.kind_name(),
            }),
        }
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_range_is_checked() {
        assert_eq!(u8::from_value(Value::Int(255)).unwrap(), 255);
        let err = u8::from_value(Value::Int(256)).unwrap_err();
        assert!(matches!(err, ValueError::Mismatch { .. }));
    }

    #[test]
    fn floats_accept_integer_literals() {
        assert_eq!(f64::from_value(Value::Int(30)).unwrap(), 30.0);
        assert_eq!(f32::from_value(Value::Float(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn option_round_trips_null() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(Some(4i32).to_value(), Value::Int(4));
    }

    #[test]
    fn array_length_is_checked() {
        let ok = <[u8; 2]>::from_value(Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert_eq!(ok.unwrap(), [1, 2]);

        let err = <[u8; 2]>::from_value(Value::List(vec![Value::Int(1)])).unwrap_err();
        assert!(matches!(err, ValueError::Mismatch { .. }));
    }

    #[test]
    fn hash_map_output_is_sorted() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), 2i32);
        map.insert("a".to_string(), 1i32);

        let Value::Map(entries) = map.to_value() else {
            panic!("expected a map value");
        };
        let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a", "b"]);
    }

    #[test]
    fn set_decodes_with_deduplication() {
        let decoded = BTreeSet::<i64>::from_value(Value::List(vec![
            Value::Int(2),
            Value::Int(1),
            Value::Int(2),
        ]))
        .unwrap();
        assert_eq!(decoded.len(), 2);
    }
}
