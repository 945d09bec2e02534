use core::any::TypeId;
use std::sync::OnceLock;

use crate::info::FieldDescriptor;
use crate::registry::TypeRegistry;
use crate::value::{Codable, Handle};

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Static metadata for one composite type: wire name, null policy,
/// optional default constructor, and the resolved field set in emission
/// order.
///
/// Built once per type and shared across sessions. Construction resolves
/// the emission order eagerly (declared `order` ascending, declaration
/// sequence on ties) so both codec directions walk the same sequence.
///
/// # Panics
///
/// Two non-excluded fields resolving to the same wire name within one
/// type is a configuration error; [`TypeDescriptor::new`] panics on it.
#[derive(Debug)]
pub struct TypeDescriptor {
    name: &'static str,
    ty_id: TypeId,
    include_nulls: bool,
    construct: Option<fn() -> Handle>,
    fields: Box<[FieldDescriptor]>,
}

impl TypeDescriptor {
    /// Creates a descriptor for type `T` with the given declared fields.
    ///
    /// `fields` is expected in declaration sequence; the resolved order is
    /// computed here.
    pub fn new<T: 'static>(name: &'static str, mut fields: Vec<FieldDescriptor>) -> Self {
        // Stable sort: ties keep declaration sequence.
        fields.sort_by_key(|field| field.order());

        for (index, field) in fields.iter().enumerate() {
            if field.excluded() {
                continue;
            }
            for other in &fields[index + 1..] {
                if !other.excluded() && other.wire_name() == field.wire_name() {
                    panic!(
                        "type `{name}` declares two fields with wire name `{}`",
                        field.wire_name()
                    );
                }
            }
        }

        Self {
            name,
            ty_id: TypeId::of::<T>(),
            include_nulls: false,
            construct: None,
            fields: fields.into_boxed_slice(),
        }
    }

    /// Emits null-valued fields instead of suppressing them.
    pub const fn with_include_nulls(mut self) -> Self {
        self.include_nulls = true;
        self
    }

    /// Registers the default constructor used when decoding this type.
    pub const fn with_construct(mut self, construct: fn() -> Handle) -> Self {
        self.construct = Some(construct);
        self
    }

    /// The type's wire name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The described type's [`TypeId`].
    #[inline]
    pub const fn ty_id(&self) -> TypeId {
        self.ty_id
    }

    /// Whether null-valued fields are emitted explicitly.
    #[inline]
    pub const fn include_nulls(&self) -> bool {
        self.include_nulls
    }

    /// The default constructor, if the type registered one.
    #[inline]
    pub const fn construct(&self) -> Option<fn() -> Handle> {
        self.construct
    }

    /// The resolved field set in emission order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// The number of declared fields, excluded ones included.
    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }
}

// -----------------------------------------------------------------------------
// DescriptorCell

/// Lazy one-shot storage for a type's [`TypeDescriptor`].
///
/// `#[derive(Codable)]` plants one of these in a `static` so the
/// descriptor is built on first access and borrowed for `'static`
/// afterwards.
pub struct DescriptorCell(OnceLock<TypeDescriptor>);

impl DescriptorCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, building it on first access.
    pub fn get_or_init(
        &'static self,
        init: impl FnOnce() -> TypeDescriptor,
    ) -> &'static TypeDescriptor {
        self.0.get_or_init(init)
    }
}

// -----------------------------------------------------------------------------
// Described

/// A static accessor to a type's descriptor.
///
/// Automatically implemented by
/// [`#[derive(Codable)]`](crate::derive::Codable); the derive also wires
/// [`register_dependencies`](Described::register_dependencies) so that
/// registering a type pulls in every object type reachable through its
/// fields.
pub trait Described: Codable {
    /// The type's static descriptor.
    fn type_descriptor() -> &'static TypeDescriptor;

    /// Registers the object types this type's fields reach.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::FieldDescriptor;

    struct Probe;

    #[test]
    fn fields_resolve_order_then_declaration() {
        let descriptor = TypeDescriptor::new::<Probe>(
            "Probe",
            vec![
                FieldDescriptor::new::<i32>("c", "c").with_order(1),
                FieldDescriptor::new::<i32>("a", "a"),
                FieldDescriptor::new::<i32>("b", "b"),
                FieldDescriptor::new::<i32>("d", "d").with_order(-1),
            ],
        );

        let names: Vec<_> = descriptor.fields().iter().map(|f| f.name()).collect();
        // `order` ascending; `a` and `b` tie at 0 and keep declaration
        // sequence.
        assert_eq!(names, ["d", "a", "b", "c"]);
    }

    #[test]
    #[should_panic(expected = "two fields with wire name")]
    fn duplicate_wire_names_panic() {
        TypeDescriptor::new::<Probe>(
            "Probe",
            vec![
                FieldDescriptor::new::<i32>("a", "same"),
                FieldDescriptor::new::<i32>("b", "same"),
            ],
        );
    }

    #[test]
    fn excluded_fields_do_not_collide() {
        let descriptor = TypeDescriptor::new::<Probe>(
            "Probe",
            vec![
                FieldDescriptor::new::<i32>("a", "same"),
                FieldDescriptor::new::<i32>("b", "same").with_excluded(),
            ],
        );
        assert_eq!(descriptor.field_len(), 2);
    }

    #[test]
    fn null_policy_defaults_off() {
        let descriptor = TypeDescriptor::new::<Probe>("Probe", Vec::new());
        assert!(!descriptor.include_nulls());
        assert!(descriptor.construct().is_none());
    }
}
