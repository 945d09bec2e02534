use crate::convert::Wire;
use crate::info::TypeDescriptor;

// -----------------------------------------------------------------------------
// WireKind

/// The declared kind of an encodable position: a field, an element, or a
/// decode target.
///
/// The decoder drives its recursive descent off this schema; the wire
/// text itself carries no type tags. In particular numeric literals are
/// untagged: the same literal parses as an integer or a float depending
/// on the kind it is decoded against.
///
/// Kind trees are built by [`Wire::kind`] and stored once per type in
/// the field descriptors.
#[derive(Clone, Debug)]
pub enum WireKind {
    Bool,
    Int,
    Float,
    Char,
    Str,
    /// Accepts the `null` literal in place of the inner kind.
    Nullable(Box<WireKind>),
    /// Growable ordered sequence.
    List(Box<WireKind>),
    /// Unordered collection; arrays on the wire, deduplicated on decode.
    Set(Box<WireKind>),
    /// Fixed-size sequence of exactly the given length.
    Array(Box<WireKind>, usize),
    /// String-keyed mapping.
    Map(Box<WireKind>),
    /// Composite object. The descriptor is reached through a function
    /// pointer so that mutually recursive types stay constructible.
    Object(fn() -> &'static TypeDescriptor),
}

impl WireKind {
    /// A short human-readable name, used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            WireKind::Bool => "boolean",
            WireKind::Int => "integer",
            WireKind::Float => "float",
            WireKind::Char => "char",
            WireKind::Str => "string",
            WireKind::Nullable(_) => "nullable",
            WireKind::List(_) => "list",
            WireKind::Set(_) => "set",
            WireKind::Array(_, _) => "array",
            WireKind::Map(_) => "map",
            WireKind::Object(_) => "object",
        }
    }
}

// -----------------------------------------------------------------------------
// FieldDescriptor

/// Declarative metadata for one field of a composite type.
///
/// Identity is the declaring attribute `name`; `wire_name` is what
/// appears on the wire. Defaults: order `0`, not required, not excluded.
///
/// # Examples
///
/// ```
/// use knotwire::info::FieldDescriptor;
///
/// let field = FieldDescriptor::new::<i32>("age", "age").with_order(2);
/// assert_eq!(field.wire_name(), "age");
/// assert_eq!(field.order(), 2);
/// assert!(!field.required());
/// ```
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    name: &'static str,
    wire_name: &'static str,
    order: i32,
    required: bool,
    excluded: bool,
    kind: WireKind,
}

impl FieldDescriptor {
    /// Creates a descriptor for a field of type `T`, keyed by the
    /// declaring attribute `name` and emitted as `wire_name`.
    pub fn new<T: Wire>(name: &'static str, wire_name: &'static str) -> Self {
        Self {
            name,
            wire_name,
            order: 0,
            required: false,
            excluded: false,
            kind: T::kind(),
        }
    }

    /// Sets the declared emission order (ascending; ties keep declaration
    /// sequence).
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Marks the field required: decoding an object body without it fails.
    pub fn with_required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Excludes the field from both encoding and decoding.
    pub fn with_excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// The declaring attribute name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The external name used on the wire.
    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// The declared order.
    #[inline]
    pub const fn order(&self) -> i32 {
        self.order
    }

    /// Whether the field must be present in a decoded object body.
    #[inline]
    pub const fn required(&self) -> bool {
        self.required
    }

    /// Whether the field is skipped in both directions.
    #[inline]
    pub const fn excluded(&self) -> bool {
        self.excluded
    }

    /// The field's declared kind.
    #[inline]
    pub fn kind(&self) -> &WireKind {
        &self.kind
    }
}
