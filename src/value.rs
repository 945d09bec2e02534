use core::any::{Any, TypeId};
use core::fmt;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::error::ValueError;
use crate::info::TypeDescriptor;
use crate::track::ObjectIdentity;

// -----------------------------------------------------------------------------
// Obj

/// The shared, mutable handle user code holds for a composite object.
///
/// Two fields holding clones of one `Obj<T>` *are* the same instance for
/// reference-tracking purposes: the codec keys identity on the shared
/// cell's address, never on structural equality.
pub type Obj<T> = Rc<RefCell<T>>;

/// Wraps a value into an [`Obj`] handle.
///
/// # Examples
///
/// ```
/// use knotwire::obj;
///
/// let shared = obj(String::from("hello"));
/// let alias = shared.clone();
/// alias.borrow_mut().push_str(", world");
/// assert_eq!(*shared.borrow(), "hello, world");
/// ```
#[inline]
pub fn obj<T>(value: T) -> Obj<T> {
    Rc::new(RefCell::new(value))
}

// -----------------------------------------------------------------------------
// Codable

/// Object access for a serializable composite type.
///
/// Automatically implemented by
/// [`#[derive(Codable)]`](crate::derive::Codable); manual implementations
/// must keep [`descriptor`](Codable::descriptor) and the field accessors
/// consistent with each other.
///
/// Field access is keyed by the declaring attribute name; the external
/// (wire) name exists only on the wire.
pub trait Codable: Any {
    /// The type's wire name.
    fn type_name(&self) -> &'static str;

    /// The concrete [`TypeId`], used for registry lookups and identity.
    fn ty_id(&self) -> TypeId;

    /// The type's static descriptor.
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Reads a field into the runtime value model.
    ///
    /// Returns `None` if no field with that name exists.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Writes a field from the runtime value model.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ValueError>;
}

// -----------------------------------------------------------------------------
// Handle

/// A type-erased view of an [`Obj<T>`].
///
/// Carries the `dyn Codable` cell for field access plus a typed token
/// that allows [`downcast`](Handle::downcast) back to the concrete
/// `Obj<T>` without unsafe code. Cloning a `Handle` aliases the same
/// underlying instance.
#[derive(Clone)]
pub struct Handle {
    cell: Rc<RefCell<dyn Codable>>,
    typed: Rc<dyn Any>,
}

impl Handle {
    /// Wraps a fresh value.
    pub fn new<T: Codable>(value: T) -> Self {
        Self::from_obj(obj(value))
    }

    /// Erases an existing [`Obj`] handle.
    ///
    /// The returned `Handle` aliases `value`: mutations through either
    /// side are visible to the other.
    pub fn from_obj<T: Codable>(value: Obj<T>) -> Self {
        Self {
            cell: value.clone(),
            typed: Rc::new(value),
        }
    }

    /// Recovers the concrete `Obj<T>`, or `None` if this handle wraps a
    /// different type.
    pub fn downcast<T: Codable>(&self) -> Option<Obj<T>> {
        self.typed.downcast_ref::<Obj<T>>().map(Obj::clone)
    }

    /// Whether two handles alias the same instance.
    #[inline]
    pub fn same_instance(a: &Handle, b: &Handle) -> bool {
        a.identity() == b.identity()
    }

    /// The identity key the reference tracker records this instance under.
    #[inline]
    pub(crate) fn identity(&self) -> ObjectIdentity {
        ObjectIdentity::of(&self.cell)
    }

    /// The wire name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.cell.borrow().type_name()
    }

    /// The concrete [`TypeId`] of the wrapped type.
    pub fn ty_id(&self) -> TypeId {
        self.cell.borrow().ty_id()
    }

    /// The wrapped type's static descriptor.
    pub fn descriptor(&self) -> &'static TypeDescriptor {
        self.cell.borrow().descriptor()
    }

    /// Borrows the wrapped object.
    pub fn borrow(&self) -> Ref<'_, dyn Codable> {
        self.cell.borrow()
    }

    /// Mutably borrows the wrapped object.
    pub fn borrow_mut(&self) -> RefMut<'_, dyn Codable> {
        self.cell.borrow_mut()
    }

    /// Reads a field by its declaring attribute name.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.cell.borrow().get_field(name)
    }

    /// Writes a field by its declaring attribute name.
    pub fn set(&self, name: &str, value: Value) -> Result<(), ValueError> {
        self.cell.borrow_mut().set_field(name, value)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.try_borrow() {
            Ok(inner) => write!(f, "Handle<{}>", inner.type_name()),
            Err(_) => f.write_str("Handle<borrowed>"),
        }
    }
}

// -----------------------------------------------------------------------------
// Value

/// The recursive runtime value model the codec manipulates.
///
/// `Int` and `Float` are distinct variants even though the wire carries
/// untagged numeric literals; the field's declared
/// [`WireKind`](crate::info::WireKind) decides which variant a literal
/// parses into.
#[derive(Clone, Debug)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(String),
    List(Vec<Value>),
    /// Ordered name/value entries. Keys are always text on the wire,
    /// whatever their native type was.
    Map(Vec<(String, Value)>),
    Object(Handle),
}

impl Value {
    /// A short human-readable name for the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Whether this is [`Value::Null`].
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Structural equality, except `Object`, which compares by identity to
/// match the reference tracker's view of the graph.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Handle::same_instance(a, b),
            _ => false,
        }
    }
}
