//! Capability requests and the accessors that satisfy them

use crate::model::{ClassId, FieldDescriptor, MethodDescriptor, TypeRef};
use std::fmt;
use std::ops::RangeInclusive;

/// An abstract operation a caller wants to perform on an opaque object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Read the object's text content
    ReadableText,
    /// Replace the object's text content wholesale
    WritableText,
    /// Text field holding the live buffer, used when no accessor method exists
    TextValueField,
    /// Move the caret / selection of a text widget
    CursorPlacement,
    /// Int field whose value lies in `min..=max`, conventionally called `name`
    BoundedInt { name: String, min: i32, max: i32 },
    /// First two int fields whose values lie in `min..=max`
    IntPair { min: i32, max: i32 },
    /// Field declared with the marker type
    TypedField { marker: ClassId },
    /// Generic two-argument event entry point (diagnostics only)
    PackedHandler,
    /// Field of a screen holding its embedded text-entry widget
    TextWidget,
}

impl Capability {
    pub fn bounded_int(name: impl Into<String>, range: RangeInclusive<i32>) -> Self {
        Capability::BoundedInt {
            name: name.into(),
            min: *range.start(),
            max: *range.end(),
        }
    }

    pub fn int_pair(range: RangeInclusive<i32>) -> Self {
        Capability::IntPair {
            min: *range.start(),
            max: *range.end(),
        }
    }

    pub fn typed_field(marker: impl Into<String>) -> Self {
        Capability::TypedField {
            marker: ClassId::new(marker.into()),
        }
    }

    /// Accepted value range for int capabilities
    pub fn int_range(&self) -> Option<RangeInclusive<i32>> {
        match self {
            Capability::BoundedInt { min, max, .. } | Capability::IntPair { min, max } => {
                Some(*min..=*max)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ReadableText => f.write_str("readable text"),
            Capability::WritableText => f.write_str("writable text"),
            Capability::TextValueField => f.write_str("text value field"),
            Capability::CursorPlacement => f.write_str("cursor placement"),
            Capability::BoundedInt { name, min, max } => {
                write!(f, "int field '{name}' in {min}..={max}")
            }
            Capability::IntPair { min, max } => write!(f, "int pair in {min}..={max}"),
            Capability::TypedField { marker } => write!(f, "field of type {marker}"),
            Capability::PackedHandler => f.write_str("packed event handler"),
            Capability::TextWidget => f.write_str("embedded text widget"),
        }
    }
}

/// Handle to the member(s) that satisfy a capability
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Method(MethodDescriptor),
    Methods(Vec<MethodDescriptor>),
    Field(FieldDescriptor),
    FieldPair {
        x: FieldDescriptor,
        y: FieldDescriptor,
    },
    Packed(PackedHandler),
}

/// A discovered `handle(packed, bool) -> bool` entry point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedHandler {
    pub method: MethodDescriptor,
    /// Type of the packed event argument
    pub payload: TypeRef,
}

/// Successful resolution, remembered per class
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub accessor: Accessor,
    /// Name of the strategy that produced the accessor
    pub strategy: &'static str,
}
