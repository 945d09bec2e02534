#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern Self

// Derive-generated code refers to this crate as `knotwire`; the alias keeps
// those paths valid inside the crate's own tests and doc tests.
extern crate self as knotwire;

// -----------------------------------------------------------------------------
// Modules

mod convert;
mod track;
mod value;

pub mod codec;
pub mod error;
pub mod info;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use codec::Codec;
pub use convert::Wire;
pub use error::{DecodeError, EncodeError, ValueError};
pub use info::Described;
pub use registry::TypeRegistry;
pub use value::{Codable, Handle, Obj, Value, obj};

pub use knotwire_derive as derive;

#[doc(hidden)]
pub mod __macro_exports {
    pub use inventory;
}
