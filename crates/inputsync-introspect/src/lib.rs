//! Structural discovery over opaque runtime objects
//!
//! The host exposes its object graph through [`OpaqueObject`]. Nothing about
//! a class is known at build time, so callers ask the [`StructuralResolver`]
//! for an abstract [`Capability`] ("readable text", "bounded int field") and
//! get back a cached accessor, or a cached absence.

pub mod capability;
pub mod diagnostics;
pub mod dynamic;
pub mod model;
pub mod resolver;
pub mod strategy;

pub use capability::{Accessor, Capability, PackedHandler, Resolved};
pub use dynamic::{ClassBuilder, DynClass, DynObject, Slots};
pub use model::{
    ClassDescriptor, ClassId, FieldDescriptor, MethodDescriptor, OpaqueObject, TypeRef, Value,
};
pub use resolver::{StructuralResolver, TextWrite};
pub use strategy::{strategies_for, Probe, Strategy};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntrospectError {
    #[error("{class} has no field {field}")]
    NoSuchField { class: ClassId, field: String },

    #[error("{class} has no method {method}")]
    NoSuchMethod { class: ClassId, method: String },

    #[error("Type mismatch on {member}: expected {expected}, got {actual}")]
    TypeMismatch {
        member: String,
        expected: String,
        actual: String,
    },

    #[error("Invocation of {method} failed: {reason}")]
    InvocationFailed { method: String, reason: String },

    #[error("{capability} not available on {class}")]
    Unsupported {
        class: ClassId,
        capability: Capability,
    },
}
