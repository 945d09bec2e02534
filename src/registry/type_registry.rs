use core::any::TypeId;

use hashbrown::HashMap;

use crate::info::{Described, TypeDescriptor};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of serializable types.
///
/// Holds one [`TypeDescriptor`] per registered type, indexed by
/// [`TypeId`] and by wire name. The encoder treats an unregistered
/// composite type as not serializable; the by-name entry points resolve
/// type names here.
///
/// # Example
///
/// ```
/// use knotwire::derive::Codable;
/// use knotwire::TypeRegistry;
///
/// #[derive(Codable, Default)]
/// #[codable(default)]
/// struct Sensor {
///     label: String,
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Sensor>();
///
/// let descriptor = registry.get_with_name("Sensor").unwrap();
/// assert_eq!(descriptor.name(), "Sensor");
/// ```
pub struct TypeRegistry {
    descriptors: HashMap<TypeId, &'static TypeDescriptor>,
    names: HashMap<&'static str, TypeId>,
}

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Creates a registry pre-populated with every auto-registered type.
    ///
    /// See [`auto_register`](Self::auto_register).
    pub fn with_registered() -> Self {
        let mut registry = Self::new();
        registry.auto_register();
        registry
    }

    /// Registers the type `T` if it has not been registered already.
    ///
    /// This also recursively registers the object types reachable through
    /// `T`'s fields, so one call covers a whole schema. Repeated calls
    /// are cheap and do nothing.
    ///
    /// # Panics
    ///
    /// Panics if a different type is already registered under `T`'s wire
    /// name; two types sharing one name is a configuration error.
    pub fn register<T: Described>(&mut self) {
        if self.insert(T::type_descriptor()) {
            T::register_dependencies(self);
        }
    }

    /// Registers every `#[derive(Codable)]` type submitted through
    /// `inventory`.
    ///
    /// Equivalent to calling [`register`](Self::register) for each such
    /// type. Repeated calls do not insert duplicates.
    pub fn auto_register(&mut self) {
        for entry in inventory::iter::<RegisteredType> {
            (entry.register)(self);
        }
    }

    fn insert(&mut self, descriptor: &'static TypeDescriptor) -> bool {
        if self.descriptors.contains_key(&descriptor.ty_id()) {
            return false;
        }
        if let Some(&existing) = self.names.get(descriptor.name()) {
            if existing != descriptor.ty_id() {
                panic!(
                    "two types registered under wire name `{}`",
                    descriptor.name()
                );
            }
        }
        self.names.insert(descriptor.name(), descriptor.ty_id());
        self.descriptors.insert(descriptor.ty_id(), descriptor);
        true
    }

    /// Whether the type with the given [`TypeId`] has been registered.
    #[inline]
    pub fn contains(&self, ty_id: TypeId) -> bool {
        self.descriptors.contains_key(&ty_id)
    }

    /// Returns the descriptor registered for the given [`TypeId`].
    #[inline]
    pub fn get(&self, ty_id: TypeId) -> Option<&'static TypeDescriptor> {
        self.descriptors.get(&ty_id).copied()
    }

    /// Returns the descriptor registered under the given wire name.
    pub fn get_with_name(&self, name: &str) -> Option<&'static TypeDescriptor> {
        self.names.get(name).and_then(|ty_id| self.get(*ty_id))
    }

    /// Iterates over the registered descriptors.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'static TypeDescriptor> + '_ {
        self.descriptors.values().copied()
    }

    /// The number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }
}

// -----------------------------------------------------------------------------
// RegisteredType

/// A startup registration submitted by `#[derive(Codable)]`.
///
/// Collected through `inventory`; consumed by
/// [`TypeRegistry::auto_register`].
pub struct RegisteredType {
    pub(crate) register: fn(&mut TypeRegistry),
}

impl RegisteredType {
    /// Creates a registration entry. Generated code only.
    pub const fn new(register: fn(&mut TypeRegistry)) -> Self {
        Self { register }
    }
}

inventory::collect!(RegisteredType);
