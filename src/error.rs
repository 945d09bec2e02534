use thiserror::Error;

// -----------------------------------------------------------------------------
// EncodeError

/// An enumeration of all error outcomes that might happen while encoding
/// a value graph to wire text.
///
/// None of these are recovered internally; a failing encode aborts the
/// session and produces no output.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A composite object's type has no entry in the [`TypeRegistry`].
    ///
    /// [`TypeRegistry`]: crate::TypeRegistry
    #[error("type `{type_name}` is not registered for serialization")]
    NotSerializable { type_name: &'static str },

    /// An instance was reached again while its own expansion was still in
    /// progress. A repeat encounter of a *completed* instance is a
    /// legitimate reference; this is not.
    #[error("circular reference: `{type_name}` was reached again while still being encoded")]
    CircularReference { type_name: &'static str },

    /// A by-name entry point could not resolve the requested type, or the
    /// supplied value is not an instance of it.
    #[error("unknown type `{type_name}`")]
    UnknownType { type_name: String },
}

// -----------------------------------------------------------------------------
// DecodeError

/// An enumeration of all error outcomes that might happen while decoding
/// wire text back into a value graph.
///
/// A failed decode never hands back a partially populated result.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The text does not match the expected shape at the current parse
    /// position: missing brace or bracket, unterminated string, bad escape.
    #[error("malformed input: {detail}")]
    MalformedInput { detail: String },

    /// A `{"$ref": ...}` marker names an id with no registered instance.
    ///
    /// Ids resolve backwards only; a forward reference also ends here.
    #[error("unresolved reference `{id}`")]
    UnresolvedReference { id: String },

    /// A field marked required is absent from a decoded object body.
    #[error("type `{type_name}` is missing required field `{field}`")]
    MissingRequiredField {
        type_name: &'static str,
        field: &'static str,
    },

    /// The target type registered no default constructor
    /// (`#[codable(default)]`).
    #[error("type `{type_name}` has no registered constructor")]
    InstantiationFailure { type_name: &'static str },

    /// A literal cannot be parsed as the declared kind, or a decoded value
    /// cannot be assigned to the field's type.
    #[error("expected {expected}, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    /// A by-name entry point could not resolve the requested type.
    #[error("unknown type `{type_name}`")]
    UnknownType { type_name: String },

    /// Context wrapper naming the type and field a nested failure occurred
    /// in.
    #[error("in field `{field}` of `{type_name}`: {source}")]
    Field {
        type_name: &'static str,
        field: &'static str,
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    #[inline]
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            detail: detail.into(),
        }
    }

    #[inline]
    pub(crate) fn in_field(self, type_name: &'static str, field: &'static str) -> Self {
        Self::Field {
            type_name,
            field,
            source: Box::new(self),
        }
    }
}

// -----------------------------------------------------------------------------
// ValueError

/// An error converting between a [`Value`](crate::Value) and a concrete
/// field type, surfaced through
/// [`Codable::set_field`](crate::Codable::set_field).
#[derive(Debug, Error)]
pub enum ValueError {
    /// The value's kind does not fit the field's type.
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// No field with the given name exists on the target type.
    #[error("no field named `{name}`")]
    NoSuchField { name: String },
}

impl From<ValueError> for DecodeError {
    fn from(value: ValueError) -> Self {
        match value {
            ValueError::Mismatch { expected, found } => Self::TypeMismatch {
                expected: expected.into(),
                found: found.into(),
            },
            ValueError::NoSuchField { name } => Self::malformed(format!("no field named `{name}`")),
        }
    }
}
