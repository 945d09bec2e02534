//! The central store for serializable-type descriptors.
//!
//! Codec sessions consult the registry to decide whether a composite
//! type is serializable and to resolve the by-name entry points. Types
//! register explicitly through [`TypeRegistry::register`] or are
//! collected at startup from `#[derive(Codable)]` submissions via
//! [`TypeRegistry::auto_register`].

mod type_registry;

pub use type_registry::{RegisteredType, TypeRegistry};
