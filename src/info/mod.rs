//! Static type metadata: descriptors, field records and the declared-kind
//! schema the decoder parses against.
//!
//! Descriptors are built once per type (lazily, inside a
//! [`DescriptorCell`]), are immutable, and are shared across codec
//! sessions; they are configuration, not session state.

mod descriptor;
mod field;

pub use descriptor::{Described, DescriptorCell, TypeDescriptor};
pub use field::{FieldDescriptor, WireKind};
